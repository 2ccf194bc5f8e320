//! Human-readable rendering of roll results for chat replies.

/// Renders a value as reply text, optionally capping how many individual dice are listed
pub trait Describe {
	/// Builds the description. When `list_limit` is set, dice past the limit are summarized instead of listed.
	#[must_use]
	fn describe(&self, list_limit: Option<usize>) -> String;
}
