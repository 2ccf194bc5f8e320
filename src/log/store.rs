//! Backends that a [`RollLog`](super::RollLog) loads its entries from and saves them to.

use std::{
	fs, io,
	path::{Path, PathBuf},
};

use parking_lot::Mutex;
use tracing::{debug, warn};

use super::{Error, LogEntry};

/// Persistent home of a roll log's entries.
///
/// Loading never fails: a store that is missing or unreadable loads as empty. Saving replaces everything that was
/// previously saved.
pub trait Store {
	/// Loads all saved entries, oldest first.
	fn load(&self) -> Vec<LogEntry>;

	/// Replaces all saved entries with the given ones.
	///
	/// # Errors
	/// If the entries couldn't be saved, an error variant is returned.
	fn save(&self, entries: &[LogEntry]) -> Result<(), Error>;
}

/// Stores entries as a JSON array in a single file, rewriting the whole file on every save.
///
/// # Examples
/// ```
/// use rollbot::{dice::{RollOutcome, RollRequest}, log::{store::JsonFile, RollLog}};
///
/// let dir = tempfile::tempdir()?;
/// let path = dir.path().join("dice_rolls.json");
///
/// let reference = RollLog::open(JsonFile::new(&path)).record(RollRequest::new(1, 20), &RollOutcome::from_values([17], 0))?;
///
/// // A fresh log over the same file sees the roll
/// let reopened = RollLog::open(JsonFile::new(&path));
/// assert_eq!(reopened.lookup(&reference), Some(RollRequest::new(1, 20)));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonFile {
	/// File the entries live in
	path: PathBuf,
}

impl JsonFile {
	/// Creates a store backed by the file at `path`. The file doesn't need to exist yet.
	#[must_use]
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	/// File the entries live in.
	#[must_use]
	#[inline]
	pub fn path(&self) -> &Path {
		&self.path
	}
}

impl Store for JsonFile {
	/// Reads the file, skipping any individual entries that can't be understood. A missing, unreadable, or
	/// malformed file loads as empty.
	fn load(&self) -> Vec<LogEntry> {
		let contents = match fs::read_to_string(&self.path) {
			Ok(contents) => contents,
			Err(err) if err.kind() == io::ErrorKind::NotFound => {
				debug!(path = %self.path.display(), "no roll log file yet, starting empty");
				return Vec::new();
			}
			Err(err) => {
				warn!(path = %self.path.display(), error = %err, "unable to read roll log, starting empty");
				return Vec::new();
			}
		};

		let values = match serde_json::from_str::<Vec<serde_json::Value>>(&contents) {
			Ok(values) => values,
			Err(err) => {
				warn!(path = %self.path.display(), error = %err, "roll log is not a JSON array, starting empty");
				return Vec::new();
			}
		};

		values
			.into_iter()
			.enumerate()
			.filter_map(|(idx, value)| match serde_json::from_value(value) {
				Ok(entry) => Some(entry),
				Err(err) => {
					warn!(path = %self.path.display(), index = idx, error = %err, "skipping malformed roll log entry");
					None
				}
			})
			.collect()
	}

	fn save(&self, entries: &[LogEntry]) -> Result<(), Error> {
		let json = serde_json::to_vec(entries)?;
		fs::write(&self.path, json).map_err(|source| Error::Io {
			path: self.path.clone(),
			source,
		})
	}
}

/// Keeps saved entries in memory only. Mainly useful for testing purposes.
///
/// # Examples
/// ```
/// use rollbot::{dice::{RollOutcome, RollRequest}, log::{store::Memory, RollLog}};
///
/// let mut log = RollLog::open(Memory::default());
/// log.record(RollRequest::new(3, 6), &RollOutcome::from_values([1, 2, 3], 0))?;
/// assert_eq!(log.store().snapshot().len(), 1);
/// assert_eq!(log.store().saves(), 1);
/// # Ok::<(), rollbot::log::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct Memory {
	/// Most recently saved entries and the number of saves so far
	inner: Mutex<(Vec<LogEntry>, usize)>,
}

impl Memory {
	/// Creates a store that loads the given entries.
	#[must_use]
	pub fn with_entries(entries: Vec<LogEntry>) -> Self {
		Self {
			inner: Mutex::new((entries, 0)),
		}
	}

	/// Gets a copy of the most recently saved entries.
	#[must_use]
	pub fn snapshot(&self) -> Vec<LogEntry> {
		self.inner.lock().0.clone()
	}

	/// Number of times the store has been saved to.
	#[must_use]
	pub fn saves(&self) -> usize {
		self.inner.lock().1
	}
}

impl Store for Memory {
	fn load(&self) -> Vec<LogEntry> {
		self.snapshot()
	}

	fn save(&self, entries: &[LogEntry]) -> Result<(), Error> {
		let mut inner = self.inner.lock();
		inner.0 = entries.to_vec();
		inner.1 = inner.1.saturating_add(1);
		Ok(())
	}
}
