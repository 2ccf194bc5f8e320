//! Roll strategies that combine a number of draws of the same [`Die`] into a [`RollOutcome`].

use super::{roller::Roller, Die, DieOutcome, Error, RollOutcome, RollRequest, RollType};

/// Default ceiling on the number of additional dice a single exploding roll may add
pub const DEFAULT_ROLL_LIMIT: usize = 10_000;

/// A fixed number of dice that are all the same [`Die`], ready to be rolled with any of the [`RollType`] strategies.
///
/// Every strategy starts from `count` independent draws (see [`Pool::normal()`]).
///
/// # Examples
/// ```
/// use rollbot::dice::{roller::Iter as IterRoller, DieOutcome, Pool};
///
/// let pool = Pool::new(4, 6)?;
/// let outcome = pool.drop_low(&mut IterRoller::new([3, 6, 1, 2]), 1)?;
/// assert_eq!(
/// 	outcome.die_results,
/// 	vec![DieOutcome::Numeric(3), DieOutcome::Numeric(6), DieOutcome::Dropped, DieOutcome::Numeric(2)]
/// );
/// assert_eq!(outcome.total, 12);
/// # Ok::<(), rollbot::dice::Error>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pool {
	/// Number of dice drawn to start every roll
	count: u16,

	/// Die every draw is made with
	die: Die,

	/// Ceiling on additional dice from explosions
	limit: usize,
}

impl Pool {
	/// Creates a new pool of `count` dice with `sides` sides each.
	///
	/// # Errors
	/// If `sides` is not valid for a [`Die`], an error variant is returned.
	pub fn new(count: u16, sides: u16) -> Result<Self, Error> {
		Ok(Self {
			count,
			die: Die::new(sides)?,
			limit: DEFAULT_ROLL_LIMIT,
		})
	}

	/// Replaces the ceiling on additional dice a single exploding roll may add.
	#[must_use]
	pub const fn with_limit(mut self, limit: usize) -> Self {
		self.limit = limit;
		self
	}

	/// Number of dice drawn to start every roll.
	#[must_use]
	#[inline]
	pub const fn count(&self) -> u16 {
		self.count
	}

	/// Die every draw is made with.
	#[must_use]
	#[inline]
	pub const fn die(&self) -> Die {
		self.die
	}

	/// Rolls the pool with the strategy, modifier, and threshold of a request.
	///
	/// The request's `num_dice` and `sides` are not consulted; build the pool from the request with
	/// [`Pool::for_request()`] to use them.
	///
	/// # Errors
	/// If the strategy cannot be applied to the pool (see the individual strategies), an error variant is returned.
	pub fn roll(&self, rng: &mut impl Roller, request: &RollRequest) -> Result<RollOutcome, Error> {
		let modifier = request.modifier;
		match request.roll_type {
			RollType::Normal => Ok(self.normal(rng, modifier)),
			RollType::Exploding => self.exploding(rng, request.threshold, modifier),
			RollType::Imploding => Ok(self.imploding(rng, request.threshold, modifier)),
			RollType::DropHigh => self.drop_high(rng, modifier),
			RollType::DropLow => self.drop_low(rng, modifier),
			RollType::KeepHigh => self.keep_high(rng, modifier),
			RollType::KeepLow => self.keep_low(rng, modifier),
		}
	}

	/// Creates a pool matching a request's dice.
	///
	/// # Errors
	/// If the request's `sides` is not valid for a [`Die`], an error variant is returned.
	pub fn for_request(request: &RollRequest) -> Result<Self, Error> {
		Self::new(request.num_dice, request.sides)
	}

	/// Rolls every die once and sums them.
	///
	/// # Examples
	/// ```
	/// use rollbot::dice::{roller::{Iter as IterRoller, Max as MaxRoller}, Pool, RollOutcome};
	///
	/// let outcome = Pool::new(3, 6)?.normal(&mut IterRoller::new([2, 5, 6]), -4);
	/// assert_eq!(outcome, RollOutcome::from_values([2, 5, 6], -4));
	/// assert_eq!(outcome.total, 9);
	///
	/// let outcome = Pool::new(0, 6)?.normal(&mut MaxRoller, 3);
	/// assert!(outcome.die_results.is_empty());
	/// assert_eq!(outcome.total, 3);
	/// # Ok::<(), rollbot::dice::Error>(())
	/// ```
	#[must_use]
	pub fn normal(&self, rng: &mut impl Roller, modifier: i16) -> RollOutcome {
		RollOutcome::from_values(self.draw(rng), modifier)
	}

	/// Rolls every die, then adds another die to the end for every die at or above `threshold`, including the added
	/// ones. The threshold defaults to the die's number of sides.
	///
	/// # Errors
	/// If the threshold is 1 or lower (every die would explode) and there are dice to roll, [`Error::InfiniteRolls`] is
	/// returned.
	/// If the explosions keep going past the pool's limit, [`Error::TooManyRolls`] is returned.
	///
	/// # Examples
	/// ```
	/// use rollbot::dice::{roller::Iter as IterRoller, Pool, RollOutcome};
	///
	/// // 6 explodes into another 6, which explodes into a 4
	/// let outcome = Pool::new(4, 6)?.exploding(&mut IterRoller::new([3, 6, 1, 2, 6, 4]), None, 0)?;
	/// assert_eq!(outcome, RollOutcome::from_values([3, 6, 1, 2, 6, 4], 0));
	/// # Ok::<(), rollbot::dice::Error>(())
	/// ```
	pub fn exploding(&self, rng: &mut impl Roller, threshold: Option<u16>, modifier: i16) -> Result<RollOutcome, Error> {
		let threshold = threshold.unwrap_or(self.die.sides());

		// Prevent exploding dice that would result in infinite explosions
		if self.count > 0 && threshold <= 1 {
			return Err(Error::InfiniteRolls(
				RollRequest::builder()
					.count(self.count)
					.sides(self.die.sides())
					.modifier(modifier)
					.exploding(Some(threshold))
					.build(),
			));
		}

		let mut rolls = self.draw(rng);
		let mut added: usize = 0;
		let mut idx = 0;
		while let Some(&roll) = rolls.get(idx) {
			if roll >= threshold {
				if added >= self.limit {
					return Err(Error::TooManyRolls { limit: self.limit });
				}
				rolls.push(self.die.roll(rng));
				added = added.saturating_add(1);
			}
			idx = idx.saturating_add(1);
		}

		Ok(RollOutcome::from_values(rolls, modifier))
	}

	/// Rolls every die, then adds another die to the end for every original die at or below `threshold`. Added dice
	/// never implode further. The threshold defaults to 1.
	///
	/// # Examples
	/// ```
	/// use rollbot::dice::{roller::Iter as IterRoller, Pool, RollOutcome};
	///
	/// // The 1 and 2 implode; the added 1 does not
	/// let outcome = Pool::new(4, 6)?.imploding(&mut IterRoller::new([3, 6, 1, 2, 1, 5]), Some(2), 0);
	/// assert_eq!(outcome, RollOutcome::from_values([3, 6, 1, 2, 1, 5], 0));
	/// # Ok::<(), rollbot::dice::Error>(())
	/// ```
	#[must_use]
	pub fn imploding(&self, rng: &mut impl Roller, threshold: Option<u16>, modifier: i16) -> RollOutcome {
		let threshold = threshold.unwrap_or(1);
		let mut rolls = self.draw(rng);

		let implosions = rolls.iter().filter(|&&roll| roll <= threshold).count();
		rolls.reserve(implosions);
		for _ in 0..implosions {
			rolls.push(self.die.roll(rng));
		}

		RollOutcome::from_values(rolls, modifier)
	}

	/// Rolls every die and drops the highest one (the first of them, on ties).
	///
	/// # Errors
	/// If the pool has no dice, [`Error::EmptyRoll`] is returned.
	pub fn drop_high(&self, rng: &mut impl Roller, modifier: i16) -> Result<RollOutcome, Error> {
		self.drop_one(rng, modifier, RollType::DropHigh, |candidate, best| candidate > best)
	}

	/// Rolls every die and drops the lowest one (the first of them, on ties).
	///
	/// # Errors
	/// If the pool has no dice, [`Error::EmptyRoll`] is returned.
	pub fn drop_low(&self, rng: &mut impl Roller, modifier: i16) -> Result<RollOutcome, Error> {
		self.drop_one(rng, modifier, RollType::DropLow, |candidate, best| candidate < best)
	}

	/// Rolls every die and keeps only the highest one (the first of them, on ties).
	///
	/// # Errors
	/// If the pool has no dice, [`Error::EmptyRoll`] is returned.
	///
	/// # Examples
	/// ```
	/// use rollbot::dice::{roller::Iter as IterRoller, DieOutcome, Pool};
	///
	/// let outcome = Pool::new(4, 6)?.keep_high(&mut IterRoller::new([3, 6, 1, 6]), 0)?;
	/// assert_eq!(
	/// 	outcome.die_results,
	/// 	vec![DieOutcome::KeptOut, DieOutcome::Numeric(6), DieOutcome::KeptOut, DieOutcome::KeptOut]
	/// );
	/// assert_eq!(outcome.total, 6);
	/// # Ok::<(), rollbot::dice::Error>(())
	/// ```
	pub fn keep_high(&self, rng: &mut impl Roller, modifier: i16) -> Result<RollOutcome, Error> {
		self.keep_one(rng, modifier, RollType::KeepHigh, |candidate, best| candidate > best)
	}

	/// Rolls every die and keeps only the lowest one (the first of them, on ties).
	///
	/// # Errors
	/// If the pool has no dice, [`Error::EmptyRoll`] is returned.
	pub fn keep_low(&self, rng: &mut impl Roller, modifier: i16) -> Result<RollOutcome, Error> {
		self.keep_one(rng, modifier, RollType::KeepLow, |candidate, best| candidate < best)
	}

	/// Draws `count` fresh values from the die.
	fn draw(&self, rng: &mut impl Roller) -> Vec<u16> {
		let mut rolls = Vec::with_capacity(usize::from(self.count));
		for _ in 0..self.count {
			rolls.push(self.die.roll(rng));
		}
		rolls
	}

	/// Rolls and replaces the single die picked by `beats` with [`DieOutcome::Dropped`].
	fn drop_one(
		&self,
		rng: &mut impl Roller,
		modifier: i16,
		roll_type: RollType,
		beats: impl Fn(u16, u16) -> bool,
	) -> Result<RollOutcome, Error> {
		let rolls = self.draw(rng);
		let picked = pick(&rolls, beats).ok_or(Error::EmptyRoll(roll_type))?;

		let dice = rolls
			.into_iter()
			.enumerate()
			.map(|(idx, roll)| {
				if idx == picked {
					DieOutcome::Dropped
				} else {
					DieOutcome::Numeric(roll)
				}
			})
			.collect();
		Ok(RollOutcome::new(dice, modifier))
	}

	/// Rolls and replaces every die except the single one picked by `beats` with [`DieOutcome::KeptOut`].
	fn keep_one(
		&self,
		rng: &mut impl Roller,
		modifier: i16,
		roll_type: RollType,
		beats: impl Fn(u16, u16) -> bool,
	) -> Result<RollOutcome, Error> {
		let rolls = self.draw(rng);
		let picked = pick(&rolls, beats).ok_or(Error::EmptyRoll(roll_type))?;

		let dice = rolls
			.into_iter()
			.enumerate()
			.map(|(idx, roll)| {
				if idx == picked {
					DieOutcome::Numeric(roll)
				} else {
					DieOutcome::KeptOut
				}
			})
			.collect();
		Ok(RollOutcome::new(dice, modifier))
	}
}

/// Finds the index of the first roll that no later roll beats.
fn pick(rolls: &[u16], beats: impl Fn(u16, u16) -> bool) -> Option<usize> {
	let (first, rest) = rolls.split_first()?;
	let mut best = (0, *first);
	for (idx, &roll) in rest.iter().enumerate() {
		if beats(roll, best.1) {
			best = (idx.saturating_add(1), roll);
		}
	}
	Some(best.0)
}
