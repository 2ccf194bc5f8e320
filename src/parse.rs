//! Parsers for the `/roll` and `/reroll` chat commands.
//!
//! Parsing is two-staged: a cheap keyword check ([`is_roll_command()`], [`is_reroll_command()`]) decides which grammar
//! applies, then the full parse ([`parse_roll()`], [`parse_reroll()`]) either produces a value or reports no match.

use core::str::FromStr;

use chumsky::prelude::*;

use crate::{
	dice::{RollRequest, RollType},
	log::Reference,
};

/// Keyword that starts a roll command
pub const ROLL_KEYWORD: &str = "/roll";

/// Keyword that starts a reroll command
pub const REROLL_KEYWORD: &str = "/reroll";

/// Parser state and error type shared by every parser in this module
type Extra<'src> = extra::Err<Rich<'src, char>>;

/// Generates a parser for one or more whitespace characters.
fn whitespace<'src>() -> impl Parser<'src, &'src str, (), Extra<'src>> + Clone {
	any().filter(|c: &char| c.is_whitespace()).repeated().at_least(1)
}

/// Generates a parser for a number of one to three decimal digits.
fn number<'src>(what: &'static str) -> impl Parser<'src, &'src str, u16, Extra<'src>> + Clone {
	any()
		.filter(|c: &char| c.is_ascii_digit())
		.repeated()
		.at_least(1)
		.at_most(3)
		.collect::<String>()
		.try_map(move |digits, span| {
			digits
				.parse()
				.map_err(|err| Rich::custom(span, format!("{what}: {err}")))
		})
}

/// Generates a parser that specifically handles roll specifications like "3d6", "2d20+4kh", "8d6e5", etc.
pub fn roll_spec<'src>() -> impl Parser<'src, &'src str, RollRequest, Extra<'src>> + Clone {
	// Parser for signed modifiers (e.g. +2, -10)
	let modifier = one_of("+-").then(number("Modifier")).map(|(sign, val)| {
		let val = i16::try_from(val).unwrap_or(i16::MAX);
		if sign == '-' {
			val.saturating_neg()
		} else {
			val
		}
	});

	// Parser for roll type suffixes, with an optional threshold for exploding/imploding (e.g. dh, kl, e, e5, i2)
	let suffix = choice((
		just("dh").to((RollType::DropHigh, None)),
		just("dl").to((RollType::DropLow, None)),
		just("kh").to((RollType::KeepHigh, None)),
		just("kl").to((RollType::KeepLow, None)),
		just('e')
			.ignore_then(number("Explode threshold").or_not())
			.map(|threshold| (RollType::Exploding, threshold)),
		just('i')
			.ignore_then(number("Implode threshold").or_not())
			.map(|threshold| (RollType::Imploding, threshold)),
	));

	number("Dice count")
		.then_ignore(just('d'))
		.then(number("Dice sides"))
		.then(modifier.or_not())
		.then(suffix.or_not())
		.map(|(((num_dice, sides), modifier), suffix)| {
			let (roll_type, threshold) = suffix.unwrap_or((RollType::Normal, None));
			RollRequest {
				roll_type,
				num_dice,
				sides,
				modifier: modifier.unwrap_or(0),
				threshold,
			}
		})
}

/// Generates a parser for a full roll command like "/roll 3d6+2dh". Anything after the roll specification must be
/// separated from it by whitespace.
pub fn roll_command<'src>() -> impl Parser<'src, &'src str, RollRequest, Extra<'src>> + Clone {
	just(ROLL_KEYWORD)
		.ignore_then(whitespace())
		.ignore_then(roll_spec())
		.then_ignore(choice((end(), whitespace().then(any().repeated()).ignored())))
}

/// Generates a parser for a full reroll command like "/reroll a1b2c3".
pub fn reroll_command<'src>() -> impl Parser<'src, &'src str, Reference, Extra<'src>> + Clone {
	just(REROLL_KEYWORD)
		.ignore_then(whitespace())
		.ignore_then(
			any()
				.filter(|c: &char| c.is_ascii_alphanumeric())
				.repeated()
				.at_least(1)
				.collect::<String>(),
		)
		.then_ignore(whitespace().or_not())
		.then_ignore(end())
		.map(Reference::from)
}

/// Checks whether text starts with the roll keyword (in any case) followed by whitespace or nothing.
///
/// # Examples
/// ```
/// use rollbot::parse::is_roll_command;
///
/// assert!(is_roll_command("/roll 3d6"));
/// assert!(is_roll_command("/ROLL"));
/// assert!(!is_roll_command("/rolling 3d6"));
/// assert!(!is_roll_command("/reroll abc"));
/// ```
#[must_use]
pub fn is_roll_command(text: &str) -> bool {
	starts_with_keyword(text, ROLL_KEYWORD)
}

/// Checks whether text starts with the reroll keyword (in any case) followed by whitespace or nothing.
#[must_use]
pub fn is_reroll_command(text: &str) -> bool {
	starts_with_keyword(text, REROLL_KEYWORD)
}

/// Parses a roll command, returning `None` if the text doesn't match the grammar.
///
/// # Examples
/// ```
/// use rollbot::{dice::{RollRequest, RollType}, parse::parse_roll};
///
/// assert_eq!(
/// 	parse_roll("/roll 3d6+2dh"),
/// 	Some(RollRequest::builder().count(3).sides(6).modifier(2).roll_type(RollType::DropHigh).build())
/// );
/// assert_eq!(parse_roll("/roll 3d6"), Some(RollRequest::new(3, 6)));
/// assert_eq!(parse_roll("/roll"), None);
/// ```
#[must_use]
pub fn parse_roll(text: &str) -> Option<RollRequest> {
	let lowercase = text.to_lowercase();
	let request = roll_command().parse(&lowercase).into_result().ok();
	request
}

/// Parses a reroll command, returning `None` if the text doesn't match the grammar.
///
/// # Examples
/// ```
/// use rollbot::parse::parse_reroll;
///
/// assert_eq!(parse_reroll("/reroll a1b2c3").unwrap().as_str(), "a1b2c3");
/// assert_eq!(parse_reroll("/reroll a1-b2"), None);
/// ```
#[must_use]
pub fn parse_reroll(text: &str) -> Option<Reference> {
	let lowercase = text.to_lowercase();
	let reference = reroll_command().parse(&lowercase).into_result().ok();
	reference
}

/// Checks whether text starts with a keyword (ignoring case) that is followed by whitespace or the end of the text.
fn starts_with_keyword(text: &str, keyword: &str) -> bool {
	let (Some(head), Some(rest)) = (text.get(..keyword.len()), text.get(keyword.len()..)) else {
		return false;
	};
	head.eq_ignore_ascii_case(keyword) && rest.chars().next().map_or(true, char::is_whitespace)
}

/// Error from parsing a roll specification with [`FromStr`]
#[derive(thiserror::Error, Debug, Clone)]
#[error("{details}")]
pub struct Error {
	/// All parse errors, joined
	pub details: String,
}

impl FromStr for RollRequest {
	type Err = Error;

	/// Parses a bare roll specification (without the command keyword), such as `3d6+2dh`.
	///
	/// # Examples
	/// ```
	/// use rollbot::dice::RollRequest;
	///
	/// let request: RollRequest = "4D6E5".parse()?;
	/// assert_eq!(request, RollRequest::builder().count(4).sides(6).exploding(Some(5)).build());
	/// assert!("4d6 + 2".parse::<RollRequest>().is_err());
	/// # Ok::<(), rollbot::parse::Error>(())
	/// ```
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let lc = s.to_lowercase();
		let result = roll_spec().then_ignore(end()).parse(&lc).into_result().map_err(|errs| Error {
			details: errs.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "),
		});
		result
	}
}
