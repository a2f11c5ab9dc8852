//! Artist display names to tolerant billing patterns.
//!
//! Every punctuation character becomes a one-character wildcard and runs of
//! whitespace match any whitespace, so "Sleater-Kinney" also finds
//! "Sleater Kinney" and "SleaterKinney", and "Toast Test" finds a billing
//! that breaks the name across lines. The name is anchored with word
//! boundaries so it never matches inside a longer word.

use crate::common::error::{Result, ScraperError};
use regex::{Regex, RegexBuilder};

/// Builds the stored pattern for an artist name.
///
/// Leading and trailing punctuation is dropped before anchoring; a name with
/// no letters or digits is rejected.
pub fn build_pattern(display_name: &str) -> Result<String> {
    let start = display_name.find(char::is_alphanumeric);
    let end = display_name
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_alphanumeric())
        .map(|(idx, c)| idx + c.len_utf8());
    let core = match (start, end) {
        (Some(start), Some(end)) => &display_name[start..end],
        _ => return Err(ScraperError::InvalidArtistName(display_name.to_string())),
    };

    let mut pattern = String::from(r"\b");
    let mut in_space = false;
    for c in core.chars() {
        if c.is_whitespace() {
            if !in_space {
                pattern.push_str(r"\s+");
                in_space = true;
            }
            continue;
        }
        in_space = false;
        if c.is_alphanumeric() {
            pattern.push(c);
        } else {
            pattern.push_str(".?");
        }
    }
    pattern.push_str(r"\b");
    Ok(pattern)
}

/// Compiles a stored pattern: case-insensitive, `^`/`$` per line, `.` crossing newlines.
pub fn compile_pattern(pattern: &str) -> Result<Regex> {
    Ok(RegexBuilder::new(pattern)
        .case_insensitive(true)
        .multi_line(true)
        .dot_matches_new_line(true)
        .build()?)
}
