mod app;
mod config;
mod log;

use std::{io, path::PathBuf};

use crate::log::{Error, LogEntry, Store};

/// Store that refuses every save
#[derive(Debug, Default)]
struct Failing(Vec<LogEntry>);

impl Store for Failing {
	fn load(&self) -> Vec<LogEntry> {
		self.0.clone()
	}

	fn save(&self, _entries: &[LogEntry]) -> Result<(), Error> {
		Err(Error::Io {
			path: PathBuf::from("/dev/full"),
			source: io::Error::other("disk full"),
		})
	}
}
