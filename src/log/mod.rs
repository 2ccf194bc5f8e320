//! Size-bounded history of rolls, keyed by the reference handed out for each one so it can be replayed later.

pub mod store;

use std::{collections::VecDeque, fmt, io, path::PathBuf};

use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

pub use self::store::Store;
use crate::dice::{DieOutcome, RollOutcome, RollRequest};

/// Number of entries a log keeps unless told otherwise
pub const DEFAULT_CAPACITY: usize = 500;

/// Number of digest bytes used for a reference (two hex characters each)
const REFERENCE_BYTES: usize = 16;

/// Opaque token identifying one logged roll
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Reference(String);

impl Reference {
	/// Gets the token as a string slice.
	#[must_use]
	#[inline]
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl From<String> for Reference {
	#[inline]
	fn from(token: String) -> Self {
		Self(token)
	}
}

impl From<&str> for Reference {
	#[inline]
	fn from(token: &str) -> Self {
		Self(token.to_owned())
	}
}

impl AsRef<str> for Reference {
	#[inline]
	fn as_ref(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for Reference {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// Request and results of a logged roll
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[expect(clippy::exhaustive_structs, reason = "Mirrors the persisted JSON")]
pub struct RollData {
	/// Request that was rolled, replayed by rerolls
	#[serde(flatten)]
	pub request: RollRequest,

	/// What the roll produced
	#[serde(deserialize_with = "deserialize_results")]
	pub results: RollOutcome,
}

/// A single persisted record of a roll
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[expect(clippy::exhaustive_structs, reason = "Mirrors the persisted JSON")]
pub struct LogEntry {
	/// Reference handed out for the roll
	pub hash: Reference,

	/// When the roll was logged. Timestamps without an offset are read as UTC.
	#[serde(deserialize_with = "deserialize_time")]
	pub time: DateTime<Utc>,

	/// What was rolled
	pub roll_data: RollData,
}

/// Reads an ISO 8601 timestamp, with or without a UTC offset.
fn deserialize_time<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
	let text = String::deserialize(deserializer)?;
	if let Ok(time) = DateTime::parse_from_rfc3339(&text) {
		return Ok(time.with_timezone(&Utc));
	}

	text.parse::<NaiveDateTime>()
		.map(|naive| Utc.from_utc_datetime(&naive))
		.map_err(|err| de::Error::custom(format!("invalid timestamp {text:?}: {err}")))
}

/// Results as written by either this crate or the older Python bot
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredResults {
	/// Current shape: a [`RollOutcome`] object
	Current(RollOutcome),

	/// Older shape: `[[dice...], [total, modifier]]`, with marker strings for excluded dice
	Legacy((Vec<LegacyDie>, (i64, i16))),
}

/// One die in the older results shape
#[derive(Deserialize)]
#[serde(untagged)]
enum LegacyDie {
	/// Counted face value
	Numeric(u16),

	/// Excluded die
	Marker(LegacyMarker),
}

/// Marker strings the older bot wrote in place of excluded dice
#[derive(Deserialize)]
enum LegacyMarker {
	/// Dropped by drop high/low
	#[serde(rename = "DH", alias = "DL")]
	Dropped,

	/// Excluded by keep high/low
	#[serde(rename = "KH", alias = "KL")]
	KeptOut,
}

/// Reads roll results in either the current or the older shape.
fn deserialize_results<'de, D: Deserializer<'de>>(deserializer: D) -> Result<RollOutcome, D::Error> {
	Ok(match StoredResults::deserialize(deserializer)? {
		StoredResults::Current(outcome) => outcome,
		StoredResults::Legacy((dice, (total, modifier))) => RollOutcome {
			die_results: dice
				.into_iter()
				.map(|die| match die {
					LegacyDie::Numeric(val) => DieOutcome::Numeric(val),
					LegacyDie::Marker(LegacyMarker::Dropped) => DieOutcome::Dropped,
					LegacyDie::Marker(LegacyMarker::KeptOut) => DieOutcome::KeptOut,
				})
				.collect(),
			total,
			modifier,
		},
	})
}

/// Append-only, size-bounded roll history that persists itself to a [`Store`] after every insert.
///
/// Entries are kept in insertion order; once the log is full, the oldest entry is evicted for each new one.
///
/// # Examples
/// ```
/// use rollbot::{dice::{RollOutcome, RollRequest}, log::{store::Memory, RollLog}};
///
/// let mut log = RollLog::open(Memory::default());
/// let request = RollRequest::new(2, 6);
/// let reference = log.record(request, &RollOutcome::from_values([3, 4], 0))?;
///
/// assert_eq!(log.lookup(&reference), Some(request));
/// assert_eq!(log.lookup("not-a-reference"), None);
/// assert_eq!(log.store().snapshot().len(), 1);
/// # Ok::<(), rollbot::log::Error>(())
/// ```
#[derive(Debug)]
pub struct RollLog<S: Store> {
	/// Backend the entries are loaded from and saved to
	store: S,

	/// Entries, oldest first
	entries: VecDeque<LogEntry>,

	/// Maximum number of entries retained
	capacity: usize,

	/// Counter mixed into generated references so that equal timestamps still yield distinct ones
	sequence: u64,
}

impl<S: Store> RollLog<S> {
	/// Opens a log with the [default capacity](DEFAULT_CAPACITY), loading any existing entries from the store.
	pub fn open(store: S) -> Self {
		Self::with_capacity(store, DEFAULT_CAPACITY)
	}

	/// Opens a log that keeps at most `capacity` entries (at least one), loading any existing entries from the store.
	/// If the store holds more than that, only the newest are kept.
	pub fn with_capacity(store: S, capacity: usize) -> Self {
		let capacity = capacity.max(1);
		let mut entries = VecDeque::from(store.load());
		let excess = entries.len().saturating_sub(capacity);
		entries.drain(..excess);
		debug!(entries = entries.len(), capacity, "opened roll log");

		Self {
			store,
			entries,
			capacity,
			sequence: 0,
		}
	}

	/// Records a roll, evicting the oldest entry if the log is full, and persists the whole log.
	///
	/// # Errors
	/// If the store fails to save, the log is left as it was before the call and an error variant is returned.
	pub fn record(&mut self, request: RollRequest, results: &RollOutcome) -> Result<Reference, Error> {
		let time = Utc::now();
		let hash = self.next_reference(&time);

		let evicted = if self.entries.len() >= self.capacity {
			self.entries.pop_front()
		} else {
			None
		};
		self.entries.push_back(LogEntry {
			hash: hash.clone(),
			time,
			roll_data: RollData {
				request,
				results: results.clone(),
			},
		});

		if let Err(err) = self.store.save(self.entries.make_contiguous()) {
			self.entries.pop_back();
			if let Some(entry) = evicted {
				self.entries.push_front(entry);
			}
			return Err(err);
		}

		debug!(reference = %hash, %request, "recorded roll");
		Ok(hash)
	}

	/// Finds the request that was logged under a reference.
	#[must_use]
	pub fn lookup(&self, reference: impl AsRef<str>) -> Option<RollRequest> {
		self.get(reference).map(|entry| entry.roll_data.request)
	}

	/// Finds the full entry that was logged under a reference.
	#[must_use]
	pub fn get(&self, reference: impl AsRef<str>) -> Option<&LogEntry> {
		let reference = reference.as_ref();
		self.entries.iter().find(|entry| entry.hash.as_str() == reference)
	}

	/// Iterates over the entries, oldest first.
	pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
		self.entries.iter()
	}

	/// Number of entries in the log.
	#[must_use]
	#[inline]
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Indicates whether the log has no entries.
	#[must_use]
	#[inline]
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Maximum number of entries the log retains.
	#[must_use]
	#[inline]
	pub const fn capacity(&self) -> usize {
		self.capacity
	}

	/// Backend the log persists to.
	#[must_use]
	#[inline]
	pub const fn store(&self) -> &S {
		&self.store
	}

	/// Saves the whole log to its store again.
	///
	/// # Errors
	/// If the store fails to save, an error variant is returned.
	pub fn flush(&mut self) -> Result<(), Error> {
		self.store.save(self.entries.make_contiguous())
	}

	/// Generates a reference from a timestamp that no entry in the log is already using.
	fn next_reference(&mut self, time: &DateTime<Utc>) -> Reference {
		let stamp = time.to_rfc3339_opts(SecondsFormat::Nanos, true);
		loop {
			self.sequence = self.sequence.wrapping_add(1);
			let digest = Sha256::digest(format!("{stamp}#{}", self.sequence));
			let candidate = hex::encode(digest.get(..REFERENCE_BYTES).unwrap_or_default());
			if self.get(&candidate).is_none() {
				return Reference(candidate);
			}
		}
	}
}

/// An error resulting from persisting the roll log
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
	/// The log file couldn't be written.
	#[error("unable to write roll log to {}: {source}", .path.display())]
	Io {
		/// File that was being written
		path: PathBuf,

		/// Underlying I/O failure
		#[source]
		source: io::Error,
	},

	/// The log couldn't be serialized.
	#[error("unable to serialize roll log: {0}")]
	Serialize(#[from] serde_json::Error),
}
