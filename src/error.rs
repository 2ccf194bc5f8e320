//! Errors surfaced by rolling and rerolling.

use crate::{dice, log};

/// An error resulting from a roll or reroll
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
	/// The roll itself can't be performed as requested.
	#[error(transparent)]
	InvalidConfiguration(#[from] dice::Error),

	/// No roll was logged under the given reference.
	#[error("no roll found for reference {0}")]
	NotFound(log::Reference),

	/// The roll log couldn't be saved.
	#[error(transparent)]
	Storage(#[from] log::Error),
}
