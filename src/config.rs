//! Configuration file loading.

use std::{
	fs, io,
	path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::{dice::pool::DEFAULT_ROLL_LIMIT, log::DEFAULT_CAPACITY};

/// Default number of individual dice listed in a reply
pub const DEFAULT_LIST_LIMIT: usize = 50;

/// Settings for the bot. Every field may be left out of the TOML file to use its default.
///
/// # Examples
/// ```
/// use rollbot::config::Config;
///
/// let config = Config::from_toml(r#"
/// roll_log = "/var/lib/rollbot/rolls.json"
/// log_capacity = 100
/// "#)?;
/// assert_eq!(config.log_capacity, 100);
/// assert_eq!(config.roll_limit, Config::default().roll_limit);
/// # Ok::<(), toml::de::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
#[expect(clippy::exhaustive_structs, reason = "Mirrors the config file")]
pub struct Config {
	/// JSON file the roll log is persisted to
	pub roll_log: PathBuf,

	/// Maximum number of rolls kept in the log
	pub log_capacity: usize,

	/// Ceiling on additional dice a single exploding roll may add
	pub roll_limit: usize,

	/// File the timestamp of the last handled message is persisted to, if any
	pub watermark: Option<PathBuf>,

	/// Maximum number of individual dice listed in a reply
	pub list_limit: usize,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			roll_log: PathBuf::from("dice_rolls.json"),
			log_capacity: DEFAULT_CAPACITY,
			roll_limit: DEFAULT_ROLL_LIMIT,
			watermark: None,
			list_limit: DEFAULT_LIST_LIMIT,
		}
	}
}

impl Config {
	/// Loads configuration from a TOML file. A missing file results in the default configuration.
	///
	/// # Errors
	/// If the file exists but can't be read or isn't valid configuration, an error variant is returned.
	pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
		let path = path.as_ref();
		let contents = match fs::read_to_string(path) {
			Ok(contents) => contents,
			Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
			Err(source) => {
				return Err(Error::Read {
					path: path.to_path_buf(),
					source,
				});
			}
		};

		Self::from_toml(&contents).map_err(|source| Error::Parse {
			path: path.to_path_buf(),
			source,
		})
	}

	/// Parses configuration from TOML text.
	///
	/// # Errors
	/// If the text isn't valid configuration, an error variant is returned.
	pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
		toml::from_str(contents)
	}
}

/// An error resulting from loading configuration
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
	/// The config file exists but couldn't be read.
	#[error("unable to read config file {}: {source}", .path.display())]
	Read {
		/// File that was being read
		path: PathBuf,

		/// Underlying I/O failure
		#[source]
		source: io::Error,
	},

	/// The config file isn't valid TOML or has unknown settings.
	#[error("invalid config file {}: {source}", .path.display())]
	Parse {
		/// File that was being parsed
		path: PathBuf,

		/// Underlying TOML failure
		#[source]
		source: toml::de::Error,
	},
}
