//! All functionality for describing dice rolls, rolling them, and working with their resulting outcomes.
//!
//! This is the home of the dice "primitives". For rolling with a persistent history, see [`DiceRoller`].
//!
//! [`DiceRoller`]: crate::app::DiceRoller

pub mod pool;
pub mod roller;

use core::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

pub use self::{pool::Pool, roller::Roller};
use crate::describe::Describe;

/// Lowest number of sides a [`Die`] may have
pub const MIN_SIDES: u16 = 2;

/// Highest number of sides a [`Die`] may have
pub const MAX_SIDES: u16 = 1000;

/// A single die with a validated number of sides.
///
/// # Examples
/// ```
/// use rollbot::dice::{roller::Max as MaxRoller, Die, Error};
///
/// let die = Die::new(20)?;
/// assert_eq!(die.roll(&mut MaxRoller), 20);
///
/// assert!(matches!(Die::new(1), Err(Error::InvalidSides(1))));
/// assert!(matches!(Die::new(1001), Err(Error::InvalidSides(1001))));
/// # Ok::<(), rollbot::dice::Error>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Die {
	/// Number of sides
	sides: u16,
}

impl Die {
	/// Creates a new die with the given number of sides.
	///
	/// # Errors
	/// If `sides` is outside of [`MIN_SIDES`]..=[`MAX_SIDES`], an error variant is returned.
	pub const fn new(sides: u16) -> Result<Self, Error> {
		if sides >= MIN_SIDES && sides <= MAX_SIDES {
			Ok(Self { sides })
		} else {
			Err(Error::InvalidSides(sides))
		}
	}

	/// Number of sides the die has.
	#[must_use]
	#[inline]
	pub const fn sides(&self) -> u16 {
		self.sides
	}

	/// Rolls the die with the given source of randomness, producing a value in `1..=sides`.
	#[must_use]
	#[inline]
	pub fn roll(&self, rng: &mut impl Roller) -> u16 {
		rng.roll_die(self.sides)
	}
}

/// Result of a single die within a [`RollOutcome`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "OutcomeRepr", into = "OutcomeRepr")]
#[expect(clippy::exhaustive_enums, reason = "A die is either counted or excluded, nothing else")]
pub enum DieOutcome {
	/// Face value that counts toward the total
	Numeric(u16),

	/// Die removed by a drop high/low roll
	Dropped,

	/// Die excluded by a keep high/low roll
	KeptOut,
}

impl DieOutcome {
	/// Gets the face value, if the die counts toward the total.
	#[must_use]
	#[inline]
	pub const fn value(&self) -> Option<u16> {
		match self {
			Self::Numeric(val) => Some(*val),
			Self::Dropped | Self::KeptOut => None,
		}
	}

	/// Indicates whether the die counts toward the total.
	#[must_use]
	#[inline]
	pub const fn is_numeric(&self) -> bool {
		matches!(self, Self::Numeric(..))
	}

	/// Indicates whether the die is a sentinel excluded from the total.
	/// This is the direct inverse of [`DieOutcome::is_numeric()`].
	#[must_use]
	#[inline]
	pub const fn is_sentinel(&self) -> bool {
		!self.is_numeric()
	}
}

impl fmt::Display for DieOutcome {
	/// Formats the value using the given formatter. [Read more][core::fmt::Debug::fmt()]
	///
	/// Numeric outcomes are the plain value, dropped dice are `(d)` and kept-out dice are `(k)`.
	///
	/// # Examples
	/// ```
	/// use rollbot::dice::DieOutcome;
	///
	/// assert_eq!(DieOutcome::Numeric(4).to_string(), "4");
	/// assert_eq!(DieOutcome::Dropped.to_string(), "(d)");
	/// assert_eq!(DieOutcome::KeptOut.to_string(), "(k)");
	/// ```
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Numeric(val) => write!(f, "{val}"),
			Self::Dropped => f.write_str("(d)"),
			Self::KeptOut => f.write_str("(k)"),
		}
	}
}

/// On-disk shape of a [`DieOutcome`]: a bare number, or a marker string for sentinels
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum OutcomeRepr {
	/// Counted face value
	Numeric(u16),

	/// Excluded die
	Marker(Marker),
}

/// Marker strings for sentinel outcomes
#[derive(Serialize, Deserialize)]
enum Marker {
	/// See [`DieOutcome::Dropped`]
	#[serde(rename = "dropped")]
	Dropped,

	/// See [`DieOutcome::KeptOut`]
	#[serde(rename = "kept-out")]
	KeptOut,
}

impl From<OutcomeRepr> for DieOutcome {
	fn from(repr: OutcomeRepr) -> Self {
		match repr {
			OutcomeRepr::Numeric(val) => Self::Numeric(val),
			OutcomeRepr::Marker(Marker::Dropped) => Self::Dropped,
			OutcomeRepr::Marker(Marker::KeptOut) => Self::KeptOut,
		}
	}
}

impl From<DieOutcome> for OutcomeRepr {
	fn from(outcome: DieOutcome) -> Self {
		match outcome {
			DieOutcome::Numeric(val) => Self::Numeric(val),
			DieOutcome::Dropped => Self::Marker(Marker::Dropped),
			DieOutcome::KeptOut => Self::Marker(Marker::KeptOut),
		}
	}
}

/// Strategy used to combine the dice of a roll
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[expect(clippy::exhaustive_enums, reason = "The command grammar only knows these")]
pub enum RollType {
	/// Plain sum of all dice
	#[default]
	#[serde(rename = "normal")]
	Normal,

	/// Dice at or above the threshold add another die, chaining. Suffix: `e`
	#[serde(rename = "e")]
	Exploding,

	/// Original dice at or below the threshold add another die. Suffix: `i`
	#[serde(rename = "i")]
	Imploding,

	/// Highest die is dropped. Suffix: `dh`
	#[serde(rename = "dh")]
	DropHigh,

	/// Lowest die is dropped. Suffix: `dl`
	#[serde(rename = "dl")]
	DropLow,

	/// Only the highest die is kept. Suffix: `kh`
	#[serde(rename = "kh")]
	KeepHigh,

	/// Only the lowest die is kept. Suffix: `kl`
	#[serde(rename = "kl")]
	KeepLow,
}

impl RollType {
	/// Gets the command suffix that selects this roll type (empty for [`Self::Normal`]).
	#[must_use]
	pub const fn suffix(&self) -> &'static str {
		match self {
			Self::Normal => "",
			Self::Exploding => "e",
			Self::Imploding => "i",
			Self::DropHigh => "dh",
			Self::DropLow => "dl",
			Self::KeepHigh => "kh",
			Self::KeepLow => "kl",
		}
	}

	/// Indicates whether a threshold has any meaning for this roll type.
	#[must_use]
	#[inline]
	pub const fn uses_threshold(&self) -> bool {
		matches!(self, Self::Exploding | Self::Imploding)
	}
}

impl FromStr for RollType {
	type Err = Error;

	/// Parses a roll type from its command suffix, or `normal`.
	///
	/// # Examples
	/// ```
	/// use rollbot::dice::{Error, RollType};
	///
	/// assert_eq!("dh".parse::<RollType>()?, RollType::DropHigh);
	/// assert_eq!("normal".parse::<RollType>()?, RollType::Normal);
	/// assert!(matches!("x".parse::<RollType>(), Err(Error::UnknownRollType(..))));
	/// # Ok::<(), rollbot::dice::Error>(())
	/// ```
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(match s.to_ascii_lowercase().as_str() {
			"" | "normal" => Self::Normal,
			"e" => Self::Exploding,
			"i" => Self::Imploding,
			"dh" => Self::DropHigh,
			"dl" => Self::DropLow,
			"kh" => Self::KeepHigh,
			"kl" => Self::KeepLow,
			_ => return Err(Error::UnknownRollType(s.to_owned())),
		})
	}
}

impl fmt::Display for RollType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Normal => f.write_str("normal"),
			_ => f.write_str(self.suffix()),
		}
	}
}

/// Everything needed to perform (and later replay) a roll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[expect(clippy::exhaustive_structs, reason = "Plain data, built by the parser and by hand")]
pub struct RollRequest {
	/// Strategy to combine the dice with
	#[serde(rename = "type")]
	pub roll_type: RollType,

	/// Number of dice to roll
	pub num_dice: u16,

	/// Number of sides for each die
	pub sides: u16,

	/// Flat amount added to the total
	pub modifier: i16,

	/// Explode/implode boundary, if overriding the roll type's default
	pub threshold: Option<u16>,
}

impl RollRequest {
	/// Creates a new normal roll request with a given count and number of sides.
	#[must_use]
	pub const fn new(num_dice: u16, sides: u16) -> Self {
		Self {
			roll_type: RollType::Normal,
			num_dice,
			sides,
			modifier: 0,
			threshold: None,
		}
	}

	/// Creates a new roll request builder.
	#[must_use]
	#[inline]
	pub fn builder() -> Builder {
		Builder::default()
	}
}

impl Default for RollRequest {
	/// Creates the default roll request (1d20).
	#[inline]
	fn default() -> Self {
		Self::new(1, 20)
	}
}

impl fmt::Display for RollRequest {
	/// Formats the request in command notation, such as `3d6+2dh` or `4d6e5`.
	///
	/// # Examples
	/// ```
	/// use rollbot::dice::{RollRequest, RollType};
	///
	/// let request = RollRequest::builder().count(3).sides(6).modifier(2).roll_type(RollType::DropHigh).build();
	/// assert_eq!(request.to_string(), "3d6+2dh");
	///
	/// let request = RollRequest::builder().count(4).sides(6).exploding(Some(5)).build();
	/// assert_eq!(request.to_string(), "4d6e5");
	/// ```
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}d{}", self.num_dice, self.sides)?;
		if self.modifier != 0 {
			write!(f, "{:+}", self.modifier)?;
		}
		f.write_str(self.roll_type.suffix())?;
		match self.threshold {
			Some(threshold) if self.roll_type.uses_threshold() => write!(f, "{threshold}"),
			_ => Ok(()),
		}
	}
}

/// Representation of the result from rolling a [`RollRequest`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[expect(clippy::exhaustive_structs, reason = "Plain data, built by the parser and by hand")]
pub struct RollOutcome {
	/// Each individual die, in the order it was rolled
	pub die_results: Vec<DieOutcome>,

	/// Sum of all numeric dice plus the modifier
	pub total: i64,

	/// Modifier that was applied to the total
	pub modifier: i16,
}

impl RollOutcome {
	/// Creates an outcome from a list of dice, computing the total from the numeric ones.
	///
	/// # Examples
	/// ```
	/// use rollbot::dice::{DieOutcome, RollOutcome};
	///
	/// let outcome = RollOutcome::new(vec![DieOutcome::Numeric(4), DieOutcome::Dropped, DieOutcome::Numeric(5)], 2);
	/// assert_eq!(outcome.total, 11);
	/// ```
	#[must_use]
	pub fn new(die_results: Vec<DieOutcome>, modifier: i16) -> Self {
		let sum: i64 = die_results
			.iter()
			.filter_map(DieOutcome::value)
			.map(i64::from)
			.sum();
		Self {
			total: sum.saturating_add(i64::from(modifier)),
			die_results,
			modifier,
		}
	}

	/// Creates an outcome where every die counts toward the total.
	#[must_use]
	pub fn from_values(values: impl IntoIterator<Item = u16>, modifier: i16) -> Self {
		Self::new(values.into_iter().map(DieOutcome::Numeric).collect(), modifier)
	}

	/// Iterates over the values of the dice that count toward the total.
	pub fn kept(&self) -> impl Iterator<Item = u16> + '_ {
		self.die_results.iter().filter_map(DieOutcome::value)
	}
}

impl Describe for RollOutcome {
	/// Builds a string of all of the individual dice (see [`DieOutcome::fmt()`]), the modifier and the total.
	///
	/// If `list_limit` is specified and there are more dice than it, the list of dice will be truncated and
	/// appended with "X more..." (where X is the remaining dice count past the max).
	///
	/// # Examples
	/// ```
	/// use rollbot::{dice::{DieOutcome, RollOutcome}, describe::Describe};
	///
	/// let outcome = RollOutcome::new(
	/// 	vec![DieOutcome::Numeric(6), DieOutcome::KeptOut, DieOutcome::KeptOut, DieOutcome::KeptOut],
	/// 	-1,
	/// );
	/// assert_eq!(outcome.describe(None), "[6, (k), (k), (k)] -1 = 5");
	/// assert_eq!(outcome.describe(Some(2)), "[6, (k), 2 more...] -1 = 5");
	/// ```
	///
	/// [`DieOutcome::fmt()`]: ./enum.DieOutcome.html#method.fmt
	fn describe(&self, list_limit: Option<usize>) -> String {
		let list_limit = list_limit.unwrap_or(usize::MAX);
		let truncated = self.die_results.len().saturating_sub(list_limit);

		format!(
			"[{}{}]{} = {}",
			self.die_results
				.iter()
				.take(list_limit)
				.map(ToString::to_string)
				.collect::<Vec<_>>()
				.join(", "),
			if truncated > 0 {
				format!(", {truncated} more...")
			} else {
				String::new()
			},
			if self.modifier == 0 {
				String::new()
			} else {
				format!(" {:+}", self.modifier)
			},
			self.total
		)
	}
}

impl fmt::Display for RollOutcome {
	/// Formats the value using the given formatter. [Read more][core::fmt::Debug::fmt()]
	///
	/// The output is equivalent to calling [`Self::describe(None)`].
	///
	/// [`Self::describe(None)`]: Self::describe()
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.describe(None))
	}
}

/// An error resulting from a dice operation. Every variant is a configuration problem with the roll itself.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
	/// A die was configured with an unsupported number of sides.
	#[error("dice must have between 2 and 1000 sides, not {0}")]
	InvalidSides(u16),

	/// A drop/keep roll had no dice to pick the highest or lowest from.
	///
	/// # Examples
	/// ```
	/// use rollbot::dice::{roller::Max as MaxRoller, Error, Pool};
	///
	/// let pool = Pool::new(0, 6)?;
	/// assert!(matches!(pool.drop_high(&mut MaxRoller, 0), Err(Error::EmptyRoll(..))));
	/// # Ok::<(), rollbot::dice::Error>(())
	/// ```
	#[error("a {0} roll needs at least one die")]
	EmptyRoll(RollType),

	/// Rolling the dice specified would result in infinite rolls.
	///
	/// # Examples
	/// ```
	/// use rollbot::dice::{roller::Max as MaxRoller, Error, Pool};
	///
	/// let pool = Pool::new(4, 6)?;
	/// assert!(matches!(pool.exploding(&mut MaxRoller, Some(1), 0), Err(Error::InfiniteRolls(..))));
	/// # Ok::<(), rollbot::dice::Error>(())
	/// ```
	#[error("{0} would result in infinite rolls")]
	InfiniteRolls(RollRequest),

	/// An exploding roll kept going past the ceiling on additional rolls.
	#[error("roll exceeded the limit of {limit} additional dice")]
	TooManyRolls {
		/// Ceiling that was hit
		limit: usize,
	},

	/// The provided text doesn't name a known roll type.
	#[error("unknown roll type: {0}")]
	UnknownRollType(String),
}

/// Builds a [`RollRequest`] with a fluent interface.
///
/// # Examples
///
/// ## Basic roll
/// ```
/// use rollbot::dice::RollRequest;
///
/// let request = RollRequest::builder().count(2).sides(6).build();
/// assert_eq!(request, RollRequest::new(2, 6));
/// ```
///
/// ## Exploding roll with a modifier
/// ```
/// use rollbot::dice::{RollRequest, RollType};
///
/// let request = RollRequest::builder().count(6).sides(8).modifier(-3).exploding(Some(7)).build();
/// assert_eq!(
/// 	request,
/// 	RollRequest {
/// 		roll_type: RollType::Exploding,
/// 		num_dice: 6,
/// 		sides: 8,
/// 		modifier: -3,
/// 		threshold: Some(7),
/// 	},
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct Builder(RollRequest);

impl Builder {
	/// Sets the number of dice to roll.
	#[must_use]
	pub const fn count(mut self, count: u16) -> Self {
		self.0.num_dice = count;
		self
	}

	/// Sets the number of sides per die.
	#[must_use]
	pub const fn sides(mut self, sides: u16) -> Self {
		self.0.sides = sides;
		self
	}

	/// Sets the flat modifier added to the total.
	#[must_use]
	pub const fn modifier(mut self, modifier: i16) -> Self {
		self.0.modifier = modifier;
		self
	}

	/// Sets the roll type.
	#[must_use]
	pub const fn roll_type(mut self, roll_type: RollType) -> Self {
		self.0.roll_type = roll_type;
		self
	}

	/// Makes the roll exploding, optionally overriding the threshold (defaults to the number of sides).
	#[must_use]
	pub const fn exploding(mut self, threshold: Option<u16>) -> Self {
		self.0.roll_type = RollType::Exploding;
		self.0.threshold = threshold;
		self
	}

	/// Makes the roll imploding, optionally overriding the threshold (defaults to 1).
	#[must_use]
	pub const fn imploding(mut self, threshold: Option<u16>) -> Self {
		self.0.roll_type = RollType::Imploding;
		self.0.threshold = threshold;
		self
	}

	/// Finalizes the request.
	#[must_use]
	pub const fn build(self) -> RollRequest {
		self.0
	}
}
