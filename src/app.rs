//! Rolling and rerolling with a persistent, replayable history.

use parking_lot::{Mutex, MutexGuard};
use tracing::debug;

use crate::{
	dice::{pool::DEFAULT_ROLL_LIMIT, roller::FastRand, Pool, RollOutcome, RollRequest, Roller},
	error::Error,
	log::{Reference, RollLog, Store},
};

/// Rolls dice for requests, records every roll in a [`RollLog`], and replays logged rolls by reference.
///
/// The randomness source and the log each sit behind their own lock, so a roller can be shared between threads;
/// every change to the log (append, evict, persist) happens while holding the log's lock.
///
/// # Examples
/// ```
/// use rollbot::{
/// 	app::DiceRoller,
/// 	dice::{roller::Iter as IterRoller, RollOutcome, RollRequest},
/// 	log::{store::Memory, RollLog},
/// };
///
/// let roller = DiceRoller::new(IterRoller::new([4, 2, 6, 1]), RollLog::open(Memory::default()));
///
/// let (outcome, reference) = roller.roll(RollRequest::new(2, 6))?;
/// assert_eq!(outcome, RollOutcome::from_values([4, 2], 0));
///
/// let (rerolled, new_reference) = roller.reroll(&reference)?;
/// assert_eq!(rerolled, RollOutcome::from_values([6, 1], 0));
/// assert_ne!(reference, new_reference);
/// # Ok::<(), rollbot::Error>(())
/// ```
#[derive(Debug)]
pub struct DiceRoller<R: Roller, S: Store> {
	/// Source of die values
	rng: Mutex<R>,

	/// History of every roll made
	log: Mutex<RollLog<S>>,

	/// Ceiling on additional dice from a single exploding roll
	roll_limit: usize,
}

impl<S: Store> DiceRoller<FastRand, S> {
	/// Creates a dice roller that uses a randomly seeded [`FastRand`] roller.
	pub fn with_log(log: RollLog<S>) -> Self {
		Self::new(FastRand::default(), log)
	}
}

impl<R: Roller, S: Store> DiceRoller<R, S> {
	/// Creates a dice roller from a source of die values and a log to record rolls in.
	pub fn new(rng: R, log: RollLog<S>) -> Self {
		Self {
			rng: Mutex::new(rng),
			log: Mutex::new(log),
			roll_limit: DEFAULT_ROLL_LIMIT,
		}
	}

	/// Replaces the ceiling on additional dice a single exploding roll may add.
	#[must_use]
	pub const fn with_roll_limit(mut self, roll_limit: usize) -> Self {
		self.roll_limit = roll_limit;
		self
	}

	/// Rolls the dice for a request and records the roll, returning the outcome and the reference to reroll it with.
	///
	/// # Errors
	/// If the request can't be rolled, [`Error::InvalidConfiguration`] is returned and nothing is recorded.
	/// If the log can't be saved, [`Error::Storage`] is returned.
	pub fn roll(&self, request: RollRequest) -> Result<(RollOutcome, Reference), Error> {
		let pool = Pool::for_request(&request)?.with_limit(self.roll_limit);
		let outcome = pool.roll(&mut *self.rng.lock(), &request)?;
		let reference = self.log.lock().record(request, &outcome)?;

		debug!(%request, total = outcome.total, %reference, "rolled");
		Ok((outcome, reference))
	}

	/// Rolls a previously logged request again with fresh dice. The reroll is logged as a new roll of its own.
	///
	/// # Errors
	/// If nothing was logged under the reference, [`Error::NotFound`] is returned.
	/// Otherwise, any error from [`Self::roll()`] is returned.
	pub fn reroll(&self, reference: impl AsRef<str>) -> Result<(RollOutcome, Reference), Error> {
		self.replay(reference).map(|(_request, outcome, new_reference)| (outcome, new_reference))
	}

	/// Same as [`Self::reroll()`], but also hands back the request that was replayed. The request comes from the lookup
	/// made before rolling, so it's available even if the new entry has since been evicted.
	///
	/// # Errors
	/// See [`Self::reroll()`].
	pub fn replay(&self, reference: impl AsRef<str>) -> Result<(RollRequest, RollOutcome, Reference), Error> {
		let reference = reference.as_ref();
		let request = self
			.lookup(reference)
			.ok_or_else(|| Error::NotFound(Reference::from(reference)))?;

		debug!(%reference, %request, "rerolling");
		let (outcome, new_reference) = self.roll(request)?;
		Ok((request, outcome, new_reference))
	}

	/// Finds the request that was logged under a reference.
	#[must_use]
	pub fn lookup(&self, reference: impl AsRef<str>) -> Option<RollRequest> {
		self.log.lock().lookup(reference)
	}

	/// Locks and returns the roll log.
	pub fn log(&self) -> MutexGuard<'_, RollLog<S>> {
		self.log.lock()
	}

	/// Saves the whole roll log to its store again.
	///
	/// # Errors
	/// If the store fails to save, [`Error::Storage`] is returned.
	pub fn flush(&self) -> Result<(), Error> {
		Ok(self.log.lock().flush()?)
	}
}
