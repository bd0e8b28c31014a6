//! Rule-based place-name recognition
//!
//! Produces candidate place-name spans per chunk. Spans are classified
//! into a closed set of location classes; anything shaped like a person,
//! a date or sentence furniture is filtered out here, before the
//! resolver ever sees it. Recognition is stateless per chunk.

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use histmap_core::RecognizerConfig;

use crate::Result;

// ============================================================================
// Entity classes
// ============================================================================

/// Location classes retained for resolution.
///
/// Mirrors the GPE/LOC/FAC split of the usual NER tag sets; non-location
/// classes never leave the recognizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityClass {
    /// Natural or unspecified place (rivers, mountains, settlements)
    GenericPlace,
    /// Political entity (kingdoms, duchies, states)
    Geopolitical,
    /// Constructed structure (castles, abbeys, bridges)
    Facility,
}

impl EntityClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GenericPlace => "GenericPlace",
            Self::Geopolitical => "Geopolitical",
            Self::Facility => "Facility",
        }
    }
}

impl std::fmt::Display for EntityClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A candidate place-name span with chunk-local byte offsets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognizedSpan {
    /// Span text exactly as it appears in the chunk
    pub text: String,

    /// Byte offset of the span start within the chunk
    pub start: usize,

    /// Byte offset one past the span end within the chunk
    pub end: usize,

    pub class: EntityClass,
}

/// Recognition seam; implementations must be stateless per chunk so
/// chunks can be processed independently and merged in order
pub trait EntityRecognizer: Send + Sync {
    fn recognize(&self, chunk_text: &str) -> Result<Vec<RecognizedSpan>>;
}

// ============================================================================
// Rule-based recognizer
// ============================================================================

/// Capitalized words that open a person reference, not a place
const PERSON_TITLES: [&str; 18] = [
    "king",
    "queen",
    "prince",
    "princess",
    "emperor",
    "empress",
    "pope",
    "duke",
    "duchess",
    "count",
    "countess",
    "bishop",
    "archbishop",
    "abbot",
    "lord",
    "lady",
    "sir",
    "father",
];

/// Single capitalized words that are sentence furniture, calendar terms
/// or honorifics rather than place names
const EXCLUDED_WORDS: [&str; 62] = [
    // Sentence-initial function words
    "the", "a", "an", "and", "but", "or", "nor", "for", "yet", "so", "if", "in", "on", "at",
    "by", "to", "from", "with", "of", "when", "while", "after", "before", "during", "since",
    "then", "there", "here", "now", "however", "thus", "though", "although", "he", "she", "it",
    "they", "we", "you", "his", "her", "their", "our", "this", "that", "these", "those",
    // Calendar terms
    "january", "february", "march", "april", "may", "june", "july", "august", "september",
    "october", "november", "december",
    // Honorifics and religious terms that open non-place spans
    "saint", "god", "christ",
];

/// Rule-based place-name recognizer.
///
/// Ordered patterns, highest priority first; overlapping matches keep
/// the higher-priority (then longer) span, so "Kingdom of Bohemia" wins
/// over a bare "Bohemia" at the same position.
pub struct RuleBasedRecognizer {
    /// (pattern, class, priority) - lower priority number wins overlaps
    patterns: Vec<(Regex, EntityClass, u8)>,
    min_span_len: usize,
}

impl RuleBasedRecognizer {
    pub fn new(config: &RecognizerConfig) -> Self {
        let mut recognizer = Self {
            patterns: Vec::new(),
            min_span_len: config.min_span_len,
        };
        recognizer.init_patterns(config.max_span_words.max(1));
        recognizer
    }

    fn init_patterns(&mut self, max_span_words: usize) {
        // A capitalized word, optionally chained through the lowercase
        // joiners found in historical toponyms ("Aix-la-Chapelle",
        // "Frankfurt am Main", "Stratford upon Avon")
        let joiner = "(?:of|the|le|la|les|de|du|des|da|di|am|an|der|von|van|upon|sur|en)";
        let word = r"\p{Lu}\p{Ll}+";
        let run = format!(
            r"{word}(?:[ -](?:{joiner}[ -])?{word}){{0,{}}}",
            max_span_words.saturating_sub(1)
        );

        // Constructed structures
        self.add_pattern(
            &format!(r"\b(?:Castle|Abbey|Cathedral|Monastery|Palace|Basilica|Bridge) of {run}\b"),
            EntityClass::Facility,
            0,
        );
        self.add_pattern(
            &format!(r"\b{run} (?:Castle|Abbey|Cathedral|Monastery|Palace|Basilica|Bridge)\b"),
            EntityClass::Facility,
            0,
        );

        // Political entities
        self.add_pattern(
            &format!(
                r"\b(?:Kingdom|Duchy|Empire|County|Republic|Principality|Bishopric|March) of {run}\b"
            ),
            EntityClass::Geopolitical,
            1,
        );

        // Plain capitalized toponym runs
        self.add_pattern(&format!(r"\b{run}\b"), EntityClass::GenericPlace, 2);
    }

    fn add_pattern(&mut self, pattern: &str, class: EntityClass, priority: u8) {
        match Regex::new(pattern) {
            Ok(regex) => self.patterns.push((regex, class, priority)),
            Err(e) => debug!(pattern, error = %e, "skipping unparseable recognizer pattern"),
        }
    }

    fn collect_matches(&self, text: &str) -> Vec<(RecognizedSpan, u8)> {
        let mut spans = Vec::new();

        for (regex, class, priority) in &self.patterns {
            for mat in regex.find_iter(text) {
                spans.push((
                    RecognizedSpan {
                        text: mat.as_str().to_string(),
                        start: mat.start(),
                        end: mat.end(),
                        class: *class,
                    },
                    *priority,
                ));
            }
        }

        spans
    }

    /// Drop spans that are person references, calendar terms or
    /// sentence furniture; strip leading furniture words from the rest
    fn filter_span(&self, mut span: RecognizedSpan) -> Option<RecognizedSpan> {
        // "The Rhine" -> "Rhine", "Then Rome" -> "Rome"
        while let Some((first, rest)) = span.text.split_once(' ') {
            if EXCLUDED_WORDS.contains(&first.to_lowercase().as_str())
                && rest.starts_with(char::is_uppercase)
            {
                span.start += first.len() + 1;
                span.text = rest.to_string();
            } else {
                break;
            }
        }

        if span.text.len() < self.min_span_len {
            return None;
        }

        let first_word = span
            .text
            .split([' ', '-'])
            .next()
            .unwrap_or_default()
            .to_lowercase();

        let word_count = span.text.split(' ').count();
        if word_count == 1 && EXCLUDED_WORDS.contains(&first_word.as_str()) {
            return None;
        }
        // "King Henry", "Pope Gregory": person-shaped, not a place
        if word_count > 1 && PERSON_TITLES.contains(&first_word.as_str()) {
            return None;
        }

        Some(span)
    }

    /// Keep the higher-priority (then longer, then earlier) span among
    /// overlapping matches
    fn deduplicate(&self, mut spans: Vec<(RecognizedSpan, u8)>) -> Vec<RecognizedSpan> {
        spans.sort_by(|(a, a_priority), (b, b_priority)| {
            a_priority
                .cmp(b_priority)
                .then((b.end - b.start).cmp(&(a.end - a.start)))
                .then(a.start.cmp(&b.start))
        });

        let mut accepted: Vec<RecognizedSpan> = Vec::new();
        for (span, _) in spans {
            let overlaps = accepted
                .iter()
                .any(|kept| span.start < kept.end && kept.start < span.end);
            if !overlaps {
                accepted.push(span);
            }
        }

        accepted.sort_by_key(|span| span.start);
        accepted
    }
}

impl EntityRecognizer for RuleBasedRecognizer {
    fn recognize(&self, chunk_text: &str) -> Result<Vec<RecognizedSpan>> {
        let matches = self.collect_matches(chunk_text);
        let deduplicated = self.deduplicate(matches);

        Ok(deduplicated
            .into_iter()
            .filter_map(|span| self.filter_span(span))
            .collect())
    }
}

impl Default for RuleBasedRecognizer {
    fn default() -> Self {
        Self::new(&RecognizerConfig::default())
    }
}

// ============================================================================
// Tests
// ============================================================================
