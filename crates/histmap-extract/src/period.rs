//! Historical period extraction from title metadata
//!
//! Works like "The Empire and the Papacy, 918-1273" carry their coverage
//! in the title; most do not. An ordered set of pattern rules is tried
//! against the title text and the first rule that matches wins. No rule
//! matching is the common case and yields `None`, not an error.

use once_cell::sync::Lazy;
use regex::Regex;

use histmap_core::HistoricalPeriod;

/// Explicit four-digit range: "918-1273", "1096 to 1291"
static RANGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([12]\d{3})\s*(?:-|–|—|to)\s*([12]\d{3})\b").unwrap());

/// Standalone four-digit years between 1000 and 2999
static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b([12]\d{3})\b").unwrap());

/// The century cue word; ordinals are collected separately so phrases
/// like "12th and 13th centuries" contribute both bounds
static CENTURY_CUE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bcentur(?:y|ies)\b").unwrap());

/// Century ordinals, numeric ("12th") or spelled ("ninth")
static ORDINAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(\d{1,2})(?:st|nd|rd|th)\b|\b(first|second|third|fourth|fifth|sixth|seventh|eighth|ninth|tenth|eleventh|twelfth|thirteenth|fourteenth|fifteenth|sixteenth|seventeenth|eighteenth|nineteenth|twentieth)\b",
    )
    .unwrap()
});

const SPELLED_ORDINALS: [&str; 20] = [
    "first",
    "second",
    "third",
    "fourth",
    "fifth",
    "sixth",
    "seventh",
    "eighth",
    "ninth",
    "tenth",
    "eleventh",
    "twelfth",
    "thirteenth",
    "fourteenth",
    "fifteenth",
    "sixteenth",
    "seventeenth",
    "eighteenth",
    "nineteenth",
    "twentieth",
];

/// Extract a year range from title text.
///
/// Rules, first match wins:
/// 1. explicit range - both bounds taken as written
/// 2. standalone years - min..max of everything found
/// 3. century phrases - the Nth century spans ((N-1)*100 + 1, N*100)
pub fn extract_period(title: &str) -> Option<HistoricalPeriod> {
    if let Some(captures) = RANGE_RE.captures(title) {
        let a: i32 = captures[1].parse().ok()?;
        let b: i32 = captures[2].parse().ok()?;
        let (start, end) = if a <= b { (a, b) } else { (b, a) };
        return Some(HistoricalPeriod::new(
            start,
            end,
            format!("Years mentioned: {start}-{end}"),
        ));
    }

    let years: Vec<i32> = YEAR_RE
        .captures_iter(title)
        .filter_map(|captures| captures[1].parse().ok())
        .collect();
    if let (Some(&start), Some(&end)) = (years.iter().min(), years.iter().max()) {
        let listed: Vec<String> = years.iter().map(i32::to_string).collect();
        return Some(HistoricalPeriod::new(
            start,
            end,
            format!("Years mentioned: {}", listed.join(", ")),
        ));
    }

    if CENTURY_CUE_RE.is_match(title) {
        let centuries: Vec<i32> = ORDINAL_RE
            .captures_iter(title)
            .filter_map(|captures| {
                captures
                    .get(1)
                    .and_then(|m| m.as_str().parse().ok())
                    .or_else(|| {
                        captures.get(2).and_then(|m| {
                            SPELLED_ORDINALS
                                .iter()
                                .position(|ordinal| ordinal.eq_ignore_ascii_case(m.as_str()))
                                .map(|index| index as i32 + 1)
                        })
                    })
            })
            .filter(|&century| (1..=30).contains(&century))
            .collect();
        if let (Some(&first), Some(&last)) = (centuries.iter().min(), centuries.iter().max()) {
            let listed: Vec<String> = centuries.iter().map(i32::to_string).collect();
            return Some(HistoricalPeriod::new(
                (first - 1) * 100 + 1,
                last * 100,
                format!("Centuries: {}", listed.join(", ")),
            ));
        }
    }

    None
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_range() {
        let period = extract_period("The Empire and the Papacy, 918-1273").unwrap();
        assert_eq!((period.start_year, period.end_year), (918, 1273));
    }

    #[test]
    fn test_range_with_to() {
        let period = extract_period("Europe from 1096 to 1291").unwrap();
        assert_eq!((period.start_year, period.end_year), (1096, 1291));
    }

    #[test]
    fn test_reversed_range_is_normalized() {
        let period = extract_period("A study, 1453-1204, of decline").unwrap();
        assert_eq!((period.start_year, period.end_year), (1204, 1453));
    }

    #[test]
    fn test_standalone_years_span_min_max() {
        let period = extract_period("Venice in 1204, Byzantium in 1453").unwrap();
        assert_eq!((period.start_year, period.end_year), (1204, 1453));
    }

    #[test]
    fn test_single_year_is_a_degenerate_range() {
        let period = extract_period("The Crisis of 1197").unwrap();
        assert_eq!((period.start_year, period.end_year), (1197, 1197));
    }

    #[test]
    fn test_numeric_century() {
        let period = extract_period("Monastic life in the 12th century").unwrap();
        assert_eq!((period.start_year, period.end_year), (1101, 1200));
    }

    #[test]
    fn test_spelled_century() {
        let period = extract_period("Trade in the Ninth Century").unwrap();
        assert_eq!((period.start_year, period.end_year), (801, 900));
    }

    #[test]
    fn test_century_range() {
        let period = extract_period("Art of the 12th and 13th centuries").unwrap();
        assert_eq!((period.start_year, period.end_year), (1101, 1300));
    }

    #[test]
    fn test_range_rule_beats_year_rule() {
        // The explicit range wins even with extra years present
        let period = extract_period("Printed 1895: The Empire, 918-1273").unwrap();
        assert_eq!((period.start_year, period.end_year), (918, 1273));
    }

    #[test]
    fn test_no_period_is_none() {
        assert!(extract_period("A General History of Europe").is_none());
        assert!(extract_period("").is_none());
    }

    #[test]
    fn test_three_digit_years_are_ignored() {
        // Years below 1000 are out of the recognized band
        assert!(extract_period("The Synod of 794").is_none());
    }
}
