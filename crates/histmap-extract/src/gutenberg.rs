//! Project Gutenberg text preparation
//!
//! The fetch layer hands over raw Gutenberg files complete with license
//! boilerplate. Extraction should only see the work itself, and the raw
//! header carries the `Title:` and `Release date:` lines the book record
//! wants. Pure text shaping; no network involvement.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

const START_MARKER: &str = "*** START OF THE PROJECT GUTENBERG EBOOK";
const END_MARKER: &str = "*** END OF THE PROJECT GUTENBERG EBOOK";

static TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?mi)^Title:[ \t]*(\S.*?)[ \t]*$").unwrap());

static RELEASE_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?mi)^Release date:[ \t]*(\S.*?)[ \t]*$").unwrap());

/// Slice out the work between the Gutenberg START/END markers.
///
/// When either marker is missing the full text passes through unchanged
/// with a warning; plenty of mirrors strip the boilerplate themselves.
pub fn strip_boilerplate(text: &str) -> &str {
    let Some(start_index) = text.find(START_MARKER) else {
        warn!("Gutenberg start marker not found; using full text");
        return text;
    };
    let body = &text[start_index + START_MARKER.len()..];

    // The remainder of the marker line is part of the boilerplate
    let body = match body.find('\n') {
        Some(line_end) => &body[line_end + 1..],
        None => body,
    };

    match body.find(END_MARKER) {
        Some(end_index) => body[..end_index].trim_matches(|c: char| c.is_whitespace()),
        None => {
            warn!("Gutenberg end marker not found; using text after start marker");
            body.trim_matches(|c: char| c.is_whitespace())
        }
    }
}

/// The `Title:` header line, if present and plausibly a title
pub fn extract_title(text: &str) -> Option<String> {
    TITLE_RE
        .captures(text)
        .map(|captures| captures[1].trim().to_string())
        .filter(|title| title.len() > 3 && title.len() < 200)
}

/// The `Release date:` header line, if present
pub fn extract_release_date(text: &str) -> Option<String> {
    RELEASE_DATE_RE
        .captures(text)
        .map(|captures| captures[1].trim().to_string())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
The Project Gutenberg eBook of The Empire and the Papacy\n\
Title: The Empire and the Papacy, 918-1273\n\
Author: T. F. Tout\n\
Release date: August 1, 2015 [eBook #49266]\n\
\n\
*** START OF THE PROJECT GUTENBERG EBOOK THE EMPIRE AND THE PAPACY ***\n\
\n\
CHAPTER I\n\
\n\
The coronation at Aachen opened a new age.\n\
\n\
*** END OF THE PROJECT GUTENBERG EBOOK THE EMPIRE AND THE PAPACY ***\n\
Further license text here.\n";

    #[test]
    fn test_strip_boilerplate() {
        let body = strip_boilerplate(SAMPLE);
        assert!(body.starts_with("CHAPTER I"));
        assert!(body.ends_with("opened a new age."));
        assert!(!body.contains("Project Gutenberg"));
    }

    #[test]
    fn test_missing_markers_pass_through() {
        let plain = "Just a plain text with Aachen in it.";
        assert_eq!(strip_boilerplate(plain), plain);
    }

    #[test]
    fn test_missing_end_marker() {
        let text = format!("{START_MARKER} TITLE ***\nbody text here");
        assert_eq!(strip_boilerplate(&text), "body text here");
    }

    #[test]
    fn test_extract_title() {
        assert_eq!(
            extract_title(SAMPLE).as_deref(),
            Some("The Empire and the Papacy, 918-1273")
        );
    }

    #[test]
    fn test_extract_title_rejects_stubs() {
        assert_eq!(extract_title("Title: ok\n"), None);
        assert_eq!(extract_title("No header lines at all"), None);
    }

    #[test]
    fn test_extract_release_date() {
        assert_eq!(
            extract_release_date(SAMPLE).as_deref(),
            Some("August 1, 2015 [eBook #49266]")
        );
    }
}
