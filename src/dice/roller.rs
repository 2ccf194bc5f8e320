//! Sources of die values: random, fixed, or predetermined.

use core::iter::Peekable;

use fastrand::Rng;

/// Rolls dice - what else is there to say?
pub trait Roller {
	/// Rolls a single die, producing a value in `1..=sides`.
	#[must_use]
	fn roll_die(&mut self, sides: u16) -> u16;
}

/// Generates rolls with random values using [fastrand].
///
/// # Examples
///
/// ## Default fastrand roller
/// ```
/// use rollbot::dice::{roller::FastRand as FastRandRoller, Pool};
///
/// let mut roller = FastRandRoller::default();
///
/// let pool = Pool::new(4, 6)?;
/// let _ = pool.normal(&mut roller, 0);
/// let _ = pool.normal(&mut roller, 0);
/// # Ok::<(), rollbot::dice::Error>(())
/// ```
///
/// ## Manually seeded fastrand roller
/// ```
/// use rollbot::dice::{roller::FastRand as FastRandRoller, Pool};
///
/// let pool = Pool::new(4, 6)?;
/// let first = pool.normal(&mut FastRandRoller::with_seed(0x750c38d574400), 0);
/// let second = pool.normal(&mut FastRandRoller::with_seed(0x750c38d574400), 0);
/// assert_eq!(first, second);
/// # Ok::<(), rollbot::dice::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct FastRand(Rng);

impl FastRand {
	/// Creates a new fastrand roller that uses the given RNG instance to generate rolls.
	#[must_use]
	#[inline]
	pub const fn new(rng: Rng) -> Self {
		Self(rng)
	}

	/// Creates a new fastrand roller that uses a pre-seeded RNG instance to generate rolls.
	#[must_use]
	#[inline]
	pub fn with_seed(seed: u64) -> Self {
		Self(Rng::with_seed(seed))
	}
}

impl Roller for FastRand {
	/// Rolls a single die using the [`fastrand::Rng`] the roller was created with.
	#[inline]
	fn roll_die(&mut self, sides: u16) -> u16 {
		if sides > 0 {
			self.0.u16(1..=sides)
		} else {
			0
		}
	}
}

/// Generates rolls that always have a specific value.
///
/// # Examples
/// ```
/// use rollbot::dice::{roller::Val as ValRoller, DieOutcome, Pool};
///
/// let mut roller = ValRoller(3);
///
/// let outcome = Pool::new(4, 6)?.normal(&mut roller, 0);
/// assert!(outcome.die_results.iter().all(|die| *die == DieOutcome::Numeric(3)));
/// assert_eq!(outcome.total, 12);
/// # Ok::<(), rollbot::dice::Error>(())
/// ```
#[derive(Debug, Default, Clone)]
#[expect(clippy::exhaustive_structs, reason = "Highly unlikely to change")]
pub struct Val(pub u16);

impl Roller for Val {
	/// Rolls a single die, always with one specific value.
	#[inline]
	fn roll_die(&mut self, _sides: u16) -> u16 {
		self.0
	}
}

/// Generates rolls that always have their max value.
///
/// # Examples
/// ```
/// use rollbot::dice::{roller::Max as MaxRoller, Pool};
///
/// let outcome = Pool::new(2, 20)?.normal(&mut MaxRoller, 0);
/// assert_eq!(outcome.total, 40);
/// # Ok::<(), rollbot::dice::Error>(())
/// ```
#[derive(Debug, Default, Clone)]
#[expect(clippy::exhaustive_structs, reason = "Highly unlikely to change")]
pub struct Max;

impl Roller for Max {
	/// Rolls a single die, always with the max value (same as the number of sides).
	#[inline]
	fn roll_die(&mut self, sides: u16) -> u16 {
		sides
	}
}

/// Generates rolls from an iterator of values. Mainly useful for testing purposes.
///
/// # Examples
/// ```
/// use rollbot::dice::{roller::Iter as IterRoller, Pool, RollOutcome};
///
/// let mut roller = IterRoller::new(vec![1, 2, 3, 4, 6]);
/// let outcome = Pool::new(5, 6)?.normal(&mut roller, 0);
/// assert_eq!(outcome, RollOutcome::from_values([1, 2, 3, 4, 6], 0));
/// assert!(!roller.can_roll());
/// # Ok::<(), rollbot::dice::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Iter<I: Iterator<Item = u16>>(Peekable<I>);

impl<I: Iterator<Item = u16>> Iter<I> {
	/// Checks whether the iterator still has values available.
	#[inline]
	pub fn can_roll(&mut self) -> bool {
		self.0.peek().is_some()
	}

	/// Creates a new roller that uses the given iterator to provide roll values.
	#[must_use]
	#[inline]
	pub fn new(iter: impl IntoIterator<IntoIter = I>) -> Self {
		Self(iter.into_iter().peekable())
	}
}

impl<I: Iterator<Item = u16>> Roller for Iter<I> {
	/// Rolls a die with the value from the next iteration.
	///
	/// # Panics
	/// If the iterator has finished, this will panic.
	#[inline]
	#[expect(
		clippy::expect_used,
		reason = "Mostly for testing, otherwise manual checking of can_roll() is expected"
	)]
	fn roll_die(&mut self, _sides: u16) -> u16 {
		self.0.next().expect("iterator is finished")
	}
}
