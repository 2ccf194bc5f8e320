//! Routing of incoming chat messages to commands, and the replies sent back for them.

use std::{fs, path::PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::{
	app::DiceRoller,
	config::{Config, DEFAULT_LIST_LIMIT},
	describe::Describe,
	dice::{roller::FastRand, RollOutcome, RollRequest, Roller},
	log::{store::JsonFile, Reference, RollLog, Store},
	parse::{is_reroll_command, is_roll_command, parse_reroll, parse_roll},
};

/// Reply to a `/roll` command that doesn't match the grammar
pub const ROLL_USAGE: &str = "usage: /roll <count>d<sides>[+/-modifier][dh|dl|kh|kl|e[threshold]|i[threshold]]";

/// Reply to a `/reroll` command that doesn't match the grammar
pub const REROLL_USAGE: &str = "usage: /reroll <reference>";

/// Reply to `/credits`
pub const CREDITS: &str = concat!(
	env!("CARGO_PKG_NAME"),
	" ",
	env!("CARGO_PKG_VERSION"),
	", licensed under ",
	env!("CARGO_PKG_LICENSE")
);

/// A text message received from the chat transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[expect(clippy::exhaustive_structs, reason = "Filled in by chat transports")]
pub struct Message<'a> {
	/// Text of the message
	pub body: &'a str,

	/// Identifier of whoever sent the message, such as `@alice:example.org`
	pub sender: &'a str,

	/// When the server received the message
	pub timestamp: DateTime<Utc>,
}

/// Gets the name to address a sender by: the localpart of a `@user:server` identifier, or the identifier itself.
///
/// # Examples
/// ```
/// use rollbot::bot::display_name;
///
/// assert_eq!(display_name("@alice:example.org"), "alice");
/// assert_eq!(display_name("bob"), "bob");
/// ```
#[must_use]
pub fn display_name(sender: &str) -> &str {
	sender
		.strip_prefix('@')
		.and_then(|rest| rest.split_once(':'))
		.map_or(sender, |(localpart, _server)| localpart)
}

/// Timestamp of the newest message handled so far, optionally persisted to a file so that messages replayed after a
/// restart aren't answered twice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Watermark {
	/// File the timestamp is persisted to
	path: Option<PathBuf>,

	/// Newest handled message timestamp
	last: Option<DateTime<Utc>>,
}

impl Watermark {
	/// Creates a watermark that isn't persisted anywhere.
	#[must_use]
	pub const fn in_memory() -> Self {
		Self { path: None, last: None }
	}

	/// Loads a watermark from a file. A missing or unparseable file means no message has been handled yet.
	#[must_use]
	pub fn load(path: impl Into<PathBuf>) -> Self {
		let path = path.into();
		let last = match fs::read_to_string(&path) {
			Ok(contents) => match DateTime::parse_from_rfc3339(contents.trim()) {
				Ok(time) => Some(time.with_timezone(&Utc)),
				Err(err) => {
					warn!(path = %path.display(), error = %err, "ignoring unparseable watermark");
					None
				}
			},
			Err(err) => {
				debug!(path = %path.display(), error = %err, "no watermark loaded");
				None
			}
		};

		Self { path: Some(path), last }
	}

	/// Newest handled message timestamp, if any.
	#[must_use]
	#[inline]
	pub const fn last(&self) -> Option<DateTime<Utc>> {
		self.last
	}

	/// Indicates whether a message with the given timestamp is newer than everything handled so far.
	#[must_use]
	pub fn is_fresh(&self, timestamp: DateTime<Utc>) -> bool {
		self.last.map_or(true, |last| timestamp > last)
	}

	/// Moves the watermark forward to a timestamp (never backward), persisting it if backed by a file.
	pub fn advance(&mut self, timestamp: DateTime<Utc>) {
		if !self.is_fresh(timestamp) {
			return;
		}
		self.last = Some(timestamp);

		if let Some(path) = &self.path {
			if let Err(err) = fs::write(path, timestamp.to_rfc3339()) {
				warn!(path = %path.display(), error = %err, "unable to persist watermark");
			}
		}
	}
}

/// Answers chat commands: `/ping`, `/credits`, `/roll` and `/reroll`.
///
/// # Examples
/// ```
/// use chrono::Utc;
/// use rollbot::{
/// 	app::DiceRoller,
/// 	bot::{Bot, Message, Watermark},
/// 	dice::roller::Val as ValRoller,
/// 	log::{store::Memory, RollLog},
/// };
///
/// let bot = Bot::new(DiceRoller::new(ValRoller(4), RollLog::open(Memory::default())), Watermark::in_memory());
/// let reply = bot.handle(&Message {
/// 	body: "/roll 2d6+1",
/// 	sender: "@alice:example.org",
/// 	timestamp: Utc::now(),
/// });
/// assert!(reply.unwrap().starts_with("alice rolled: 2d6+1 [4, 4] +1 = 9"));
/// ```
#[derive(Debug)]
pub struct Bot<R: Roller, S: Store> {
	/// Performs and logs the rolls
	roller: DiceRoller<R, S>,

	/// Guards against answering the same message twice
	watermark: Mutex<Watermark>,

	/// Maximum number of individual dice listed in a reply
	list_limit: usize,
}

impl Bot<FastRand, JsonFile> {
	/// Creates a bot with a randomly seeded roller, set up as described by the configuration.
	#[must_use]
	pub fn from_config(config: &Config) -> Self {
		let log = RollLog::with_capacity(JsonFile::new(&config.roll_log), config.log_capacity);
		let watermark = config.watermark.as_ref().map_or_else(Watermark::in_memory, Watermark::load);

		Self::new(DiceRoller::with_log(log).with_roll_limit(config.roll_limit), watermark)
			.with_list_limit(config.list_limit)
	}
}

impl<R: Roller, S: Store> Bot<R, S> {
	/// Creates a bot that rolls with the given roller.
	pub fn new(roller: DiceRoller<R, S>, watermark: Watermark) -> Self {
		Self {
			roller,
			watermark: Mutex::new(watermark),
			list_limit: DEFAULT_LIST_LIMIT,
		}
	}

	/// Replaces the maximum number of individual dice listed in a reply.
	#[must_use]
	pub const fn with_list_limit(mut self, list_limit: usize) -> Self {
		self.list_limit = list_limit;
		self
	}

	/// Dice roller the bot uses.
	#[must_use]
	#[inline]
	pub const fn roller(&self) -> &DiceRoller<R, S> {
		&self.roller
	}

	/// Handles a message, returning the reply to send, if any.
	///
	/// Messages that aren't newer than the last handled message are ignored, as is any text that isn't a command.
	pub fn handle(&self, message: &Message<'_>) -> Option<String> {
		{
			let mut watermark = self.watermark.lock();
			if !watermark.is_fresh(message.timestamp) {
				debug!(sender = message.sender, timestamp = %message.timestamp, "ignoring stale message");
				return None;
			}
			watermark.advance(message.timestamp);
		}

		let user = display_name(message.sender);
		let body = message.body.trim();

		let reply = if body == "/ping" {
			format!("pong! {user}")
		} else if body == "/credits" {
			CREDITS.to_owned()
		} else if is_roll_command(body) {
			info!(user, command = body, "handling roll");
			self.roll(user, body)
		} else if is_reroll_command(body) {
			info!(user, command = body, "handling reroll");
			self.reroll(user, body)
		} else {
			return None;
		};

		Some(reply)
	}

	/// Builds the reply to a `/roll` command.
	fn roll(&self, user: &str, body: &str) -> String {
		let Some(request) = parse_roll(body) else {
			return format!("{user}: {ROLL_USAGE}");
		};

		match self.roller.roll(request) {
			Ok((outcome, reference)) => format!("{user} rolled: {}", self.render(&request, &outcome, &reference)),
			Err(err) => {
				warn!(user, %request, error = %err, "roll failed");
				format!("{user}: {err}")
			}
		}
	}

	/// Builds the reply to a `/reroll` command.
	fn reroll(&self, user: &str, body: &str) -> String {
		let Some(reference) = parse_reroll(body) else {
			return format!("{user}: {REROLL_USAGE}");
		};

		match self.roller.replay(&reference) {
			Ok((request, outcome, new_reference)) => {
				format!("{user} rerolled: {}", self.render(&request, &outcome, &new_reference))
			}
			Err(err) => {
				warn!(user, %reference, error = %err, "reroll failed");
				format!("{user}: {err}")
			}
		}
	}

	/// Renders a roll for a reply, such as `3d6+2dh [4, (d), 5] +2 = 11 (ref 1f0c...)`.
	fn render(&self, request: &RollRequest, outcome: &RollOutcome, reference: &Reference) -> String {
		format!("{request} {} (ref {reference})", outcome.describe(Some(self.list_limit)))
	}
}
