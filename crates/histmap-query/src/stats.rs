//! Corpus statistics
//!
//! Aggregate view over stored books, locations and mentions, including
//! the historical year span the corpus covers.

use std::collections::HashSet;

use serde::Serialize;
use uuid::Uuid;

use histmap_core::{Book, Location, Mention};

/// Aggregate counts over the stored corpus
#[derive(Debug, Clone, Default, Serialize)]
pub struct CorpusStatistics {
    pub total_books: usize,
    pub total_locations: usize,
    pub total_mentions: usize,

    /// Books with at least one mention
    pub books_with_mentions: usize,

    /// Locations referenced by at least one mention
    pub locations_with_mentions: usize,

    /// Earliest known historical start year across books
    pub earliest_year: Option<i32>,

    /// Latest known historical end year across books
    pub latest_year: Option<i32>,

    /// Years between earliest and latest, when both are known
    pub span_years: Option<i32>,

    pub average_mentions_per_book: f64,
    pub average_mentions_per_location: f64,
}

/// Compute statistics over stored records
pub fn corpus_statistics(
    books: &[Book],
    locations: &[Location],
    mentions: &[Mention],
) -> CorpusStatistics {
    let books_with_mentions: HashSet<Uuid> =
        mentions.iter().map(|mention| mention.book_id).collect();
    let locations_with_mentions: HashSet<Uuid> =
        mentions.iter().map(|mention| mention.location_id).collect();

    let earliest_year = books.iter().filter_map(|b| b.historical_start_year).min();
    let latest_year = books.iter().filter_map(|b| b.historical_end_year).max();
    let span_years = match (earliest_year, latest_year) {
        (Some(earliest), Some(latest)) => Some(latest - earliest),
        _ => None,
    };

    CorpusStatistics {
        total_books: books.len(),
        total_locations: locations.len(),
        total_mentions: mentions.len(),
        books_with_mentions: books_with_mentions.len(),
        locations_with_mentions: locations_with_mentions.len(),
        earliest_year,
        latest_year,
        span_years,
        average_mentions_per_book: ratio(mentions.len(), books.len()),
        average_mentions_per_location: ratio(mentions.len(), locations.len()),
    }
}

/// Mentions-per-record average, rounded to two decimals; zero when the
/// denominator is empty
fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    (numerator as f64 / denominator as f64 * 100.0).round() / 100.0
}

// ============================================================================
// Tests
// ============================================================================
