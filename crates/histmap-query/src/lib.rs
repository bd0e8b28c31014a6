//! histmap-query - Query-time views over stored extraction results
//!
//! - temporal tier classification of mentions against a year range
//! - relevance-ranked location search
//! - corpus statistics
//!
//! Everything here is a pure function over persisted records: no
//! mutation, safely recomputed on every query under arbitrary
//! concurrent load.

pub mod search;
pub mod stats;

pub use search::{search_locations, SearchHit};
pub use stats::{corpus_statistics, CorpusStatistics};

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use histmap_core::{Book, Mention};

// ============================================================================
// Query range
// ============================================================================

/// Inclusive year range requested by a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRange {
    pub start_year: i32,
    pub end_year: i32,
}

impl QueryRange {
    /// Build a range; a reversed pair is normalized
    pub fn new(start_year: i32, end_year: i32) -> Self {
        if start_year <= end_year {
            Self {
                start_year,
                end_year,
            }
        } else {
            Self {
                start_year: end_year,
                end_year: start_year,
            }
        }
    }
}

// ============================================================================
// Tiering
// ============================================================================

/// Why a mention landed in the secondary tier.
///
/// Display metadata only; placement is decided by the overlap test alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecondaryReason {
    /// The book has no known period
    UnknownPeriod,
    /// The book's period does not overlap the requested range
    OutsideRange,
}

impl SecondaryReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnknownPeriod => "unperiodized",
            Self::OutsideRange => "year_mismatched",
        }
    }
}

impl std::fmt::Display for SecondaryReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One classified mention with the book context a caller displays
#[derive(Debug, Clone, Serialize)]
pub struct TieredMention {
    pub book_title: String,
    pub book_period: Option<(i32, i32)>,
    pub mention: Mention,

    /// Present on secondary-tier mentions only
    pub reason: Option<SecondaryReason>,
}

/// Classification result: two ordered tiers plus counts
#[derive(Debug, Clone, Default, Serialize)]
pub struct TieredMentions {
    /// Mentions whose book period overlaps the requested range
    pub primary: Vec<TieredMention>,

    /// Everything else: unknown period or non-overlapping period
    pub secondary: Vec<TieredMention>,
}

impl TieredMentions {
    pub fn primary_count(&self) -> usize {
        self.primary.len()
    }

    pub fn secondary_count(&self) -> usize {
        self.secondary.len()
    }

    pub fn total(&self) -> usize {
        self.primary.len() + self.secondary.len()
    }
}

/// Partition mentions into primary/secondary tiers for a query range.
///
/// A mention is primary iff its book's period is fully known and
/// overlaps the range (`start <= range.end && end >= range.start`).
/// Within each tier, ordering is book title (alphabetical) then
/// ascending text position - an explicit sort, independent of input
/// order. Total: every input mention lands in exactly one tier.
pub fn classify(mentions: &[Mention], books: &[Book], range: QueryRange) -> TieredMentions {
    let books_by_id: HashMap<Uuid, &Book> = books.iter().map(|book| (book.id, book)).collect();

    let mut result = TieredMentions::default();
    for mention in mentions {
        let book = books_by_id.get(&mention.book_id);
        let book_title = book.map(|b| b.title.clone()).unwrap_or_default();
        let book_period = book.and_then(|b| b.period());

        let tiered = |reason| TieredMention {
            book_title: book_title.clone(),
            book_period,
            mention: mention.clone(),
            reason,
        };

        match book_period {
            Some((start, end)) if start <= range.end_year && end >= range.start_year => {
                result.primary.push(tiered(None));
            }
            Some(_) => {
                result
                    .secondary
                    .push(tiered(Some(SecondaryReason::OutsideRange)));
            }
            None => {
                result
                    .secondary
                    .push(tiered(Some(SecondaryReason::UnknownPeriod)));
            }
        }
    }

    let tier_order = |a: &TieredMention, b: &TieredMention| {
        a.book_title
            .cmp(&b.book_title)
            .then(a.mention.text_position.cmp(&b.mention.text_position))
    };
    result.primary.sort_by(tier_order);
    result.secondary.sort_by(tier_order);

    result
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use histmap_core::MatchStrategy;

    fn book(title: &str, period: Option<(i32, i32)>) -> Book {
        let mut book = Book::new(title, format!("http://example.org/{title}"));
        if let Some((start, end)) = period {
            book.historical_start_year = Some(start);
            book.historical_end_year = Some(end);
        }
        book
    }

    fn mention(book: &Book, position: usize) -> Mention {
        Mention::new(
            book.id,
            Uuid::new_v4(),
            "Aachen",
            position,
            "context",
            MatchStrategy::Exact,
            1.0,
        )
    }

    #[test]
    fn test_overlapping_period_is_primary() {
        let book = book("Chronicle", Some((1200, 1250)));
        let mentions = vec![mention(&book, 10)];

        let result = classify(&mentions, &[book], QueryRange::new(1100, 1300));

        assert_eq!(result.primary_count(), 1);
        assert_eq!(result.secondary_count(), 0);
        assert!(result.primary[0].reason.is_none());
    }

    #[test]
    fn test_partial_overlap_is_primary() {
        // Overlap at a single boundary year still counts
        let book = book("Chronicle", Some((1000, 1100)));
        let mentions = vec![mention(&book, 10)];

        let result = classify(&mentions, &[book], QueryRange::new(1100, 1300));
        assert_eq!(result.primary_count(), 1);
    }

    #[test]
    fn test_outside_range_is_secondary() {
        let book = book("Annals", Some((900, 950)));
        let mentions = vec![mention(&book, 10)];

        let result = classify(&mentions, &[book], QueryRange::new(1100, 1300));

        assert_eq!(result.primary_count(), 0);
        assert_eq!(result.secondary_count(), 1);
        assert_eq!(
            result.secondary[0].reason,
            Some(SecondaryReason::OutsideRange)
        );
    }

    #[test]
    fn test_unknown_period_is_secondary() {
        let book = book("Undated", None);
        let mentions = vec![mention(&book, 10)];

        let result = classify(&mentions, &[book], QueryRange::new(1100, 1300));

        assert_eq!(result.secondary_count(), 1);
        assert_eq!(
            result.secondary[0].reason,
            Some(SecondaryReason::UnknownPeriod)
        );
    }

    #[test]
    fn test_half_known_period_is_unknown() {
        let mut book = book("Half", None);
        book.historical_start_year = Some(1100);
        let mentions = vec![mention(&book, 10)];

        let result = classify(&mentions, &[book], QueryRange::new(1100, 1300));
        assert_eq!(
            result.secondary[0].reason,
            Some(SecondaryReason::UnknownPeriod)
        );
    }

    #[test]
    fn test_every_mention_lands_in_exactly_one_tier() {
        let books = vec![
            book("Alpha", Some((1200, 1250))),
            book("Beta", Some((900, 950))),
            book("Gamma", None),
        ];
        let mentions: Vec<Mention> = books
            .iter()
            .flat_map(|b| (0..3).map(|i| mention(b, i * 100)))
            .collect();

        let result = classify(&mentions, &books, QueryRange::new(1100, 1300));
        assert_eq!(result.total(), mentions.len());
        assert_eq!(result.primary_count(), 3);
        assert_eq!(result.secondary_count(), 6);
    }

    #[test]
    fn test_ordering_is_title_then_position() {
        let zeta = book("Zeta", Some((1200, 1250)));
        let alpha = book("Alpha", Some((1200, 1250)));
        let mentions = vec![
            mention(&zeta, 5),
            mention(&alpha, 300),
            mention(&alpha, 10),
            mention(&zeta, 700),
        ];

        let books = vec![zeta, alpha];
        let result = classify(&mentions, &books, QueryRange::new(1100, 1300));

        let order: Vec<(String, usize)> = result
            .primary
            .iter()
            .map(|t| (t.book_title.clone(), t.mention.text_position))
            .collect();
        assert_eq!(
            order,
            vec![
                ("Alpha".to_string(), 10),
                ("Alpha".to_string(), 300),
                ("Zeta".to_string(), 5),
                ("Zeta".to_string(), 700),
            ]
        );
    }

    #[test]
    fn test_classification_is_deterministic() {
        let books = vec![book("Alpha", Some((1200, 1250))), book("Beta", None)];
        let mentions: Vec<Mention> = books.iter().map(|b| mention(b, 42)).collect();

        let first = classify(&mentions, &books, QueryRange::new(1100, 1300));
        let second = classify(&mentions, &books, QueryRange::new(1100, 1300));

        let ids = |tiers: &TieredMentions| -> Vec<Uuid> {
            tiers
                .primary
                .iter()
                .chain(tiers.secondary.iter())
                .map(|t| t.mention.id)
                .collect()
        };
        assert_eq!(ids(&first), ids(&second));
    }

    #[test]
    fn test_dangling_book_reference_stays_total() {
        let book = book("Known", Some((1200, 1250)));
        let orphan = Mention::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "Aachen",
            7,
            "context",
            MatchStrategy::Exact,
            1.0,
        );

        let result = classify(&[orphan], &[book], QueryRange::new(1100, 1300));
        assert_eq!(result.total(), 1);
        assert_eq!(
            result.secondary[0].reason,
            Some(SecondaryReason::UnknownPeriod)
        );
    }

    #[test]
    fn test_reversed_query_range_is_normalized() {
        let range = QueryRange::new(1300, 1100);
        assert_eq!(range.start_year, 1100);
        assert_eq!(range.end_year, 1300);
    }
}
