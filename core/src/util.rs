//! Shared utility functions

use std::path::{Path, PathBuf};

/// Marker appended to values cut short by [`truncate_preview`]
pub const TRUNCATION_MARKER: &str = "...";

/// Shorten a value for listings
///
/// Counts characters, not bytes, so multi-byte text is never split
/// mid-codepoint.
///
/// # Arguments
/// * `value` - The full value
/// * `max_chars` - Characters kept before the marker
///
/// # Returns
/// `value` unchanged when it fits, otherwise its first `max_chars`
/// characters followed by [`TRUNCATION_MARKER`]
pub fn truncate_preview(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{}", &value[..cut], TRUNCATION_MARKER),
        None => value.to_string(),
    }
}

/// Expand a leading `~` to the user's home directory
///
/// Paths without a leading `~`, or hosts without a home directory, are
/// returned as given.
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}
