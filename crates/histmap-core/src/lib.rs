//! histmap-core - Domain models, errors, and shared seams
//!
//! This crate defines the core abstractions used throughout the histmap
//! system:
//! - Domain models (books, locations, mentions, historical periods)
//! - Common error types
//! - Configuration management
//! - Storage collaborator traits and an in-memory reference store

pub mod config;
pub mod store;

pub use config::{
    AppConfig, BatchConfig, ChunkerConfig, ConfigError, ContextConfig, GazetteerSourcesConfig,
    RecognizerConfig, ResolverConfig,
};
pub use store::{BookStore, InMemoryStore, LocationStore, MentionStore};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for histmap operations
#[derive(Error, Debug)]
pub enum HistmapError {
    #[error("Book not found: {0}")]
    BookNotFound(Uuid),

    #[error("Location not found: {0}")]
    LocationNotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, HistmapError>;

// ============================================================================
// Geographic Types
// ============================================================================

/// A latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check the pair lies inside the valid coordinate space
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

// ============================================================================
// Matching Types
// ============================================================================

/// How a recognized span was matched against the gazetteer.
///
/// The resolution cascade tries these in order; the strategy that
/// succeeded fully determines the mention's confidence band
/// (exact > alias > fuzzy).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStrategy {
    /// Normalized span equals a canonical name or alias key
    Exact,
    /// Span is a substring/superstring of an alias after normalization
    Alias,
    /// Edit-distance similarity above the configured threshold
    Fuzzy,
}

impl MatchStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Alias => "alias",
            Self::Fuzzy => "fuzzy",
        }
    }
}

impl std::fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Historical Period
// ============================================================================

/// A year range extracted from document metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalPeriod {
    pub start_year: i32,
    pub end_year: i32,

    /// Human-readable summary of what was matched (years, centuries)
    pub description: String,
}

impl HistoricalPeriod {
    pub fn new(start_year: i32, end_year: i32, description: impl Into<String>) -> Self {
        Self {
            start_year,
            end_year,
            description: description.into(),
        }
    }

    /// Interval overlap against a query range (inclusive on both ends)
    pub fn overlaps(&self, query_start: i32, query_end: i32) -> bool {
        self.start_year <= query_end && self.end_year >= query_start
    }
}

// ============================================================================
// Book
// ============================================================================

/// A processed source document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    /// Unique identifier
    pub id: Uuid,

    /// Document title
    pub title: String,

    /// Source URL the text came from
    pub url: String,

    /// Author, when known
    pub author: Option<String>,

    /// Release/publication date string from the source metadata
    pub release_date: Option<String>,

    /// First year of the period the work covers (may stay null forever)
    pub historical_start_year: Option<i32>,

    /// Last year of the period the work covers (may stay null forever)
    pub historical_end_year: Option<i32>,

    /// Summary of the extracted period evidence
    pub period_description: Option<String>,

    /// When this book was processed
    pub processed_at: DateTime<Utc>,
}

impl Book {
    /// Create a new book record
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            url: url.into(),
            author: None,
            release_date: None,
            historical_start_year: None,
            historical_end_year: None,
            period_description: None,
            processed_at: Utc::now(),
        }
    }

    /// Set author
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Set release date
    pub fn with_release_date(mut self, date: impl Into<String>) -> Self {
        self.release_date = Some(date.into());
        self
    }

    /// Attach an extracted historical period
    pub fn set_period(&mut self, period: &HistoricalPeriod) {
        self.historical_start_year = Some(period.start_year);
        self.historical_end_year = Some(period.end_year);
        self.period_description = Some(period.description.clone());
    }

    /// The period as a pair, present only when both bounds are known
    pub fn period(&self) -> Option<(i32, i32)> {
        match (self.historical_start_year, self.historical_end_year) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }
}

// ============================================================================
// Location
// ============================================================================

/// A resolved, de-duplicated place.
///
/// At most one Location exists per normalized gazetteer identity; many
/// mentions across many books may point at the same Location. Mention
/// counts are derived at query time, never stored here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    /// Unique identifier
    pub id: Uuid,

    /// Canonical place name from the gazetteer
    pub name: String,

    /// Coordinates, absent for some historical entries
    pub point: Option<GeoPoint>,

    /// ISO country code, when the source carried one
    pub country_code: Option<String>,

    /// Population figure, when the source carried one
    pub population: Option<u64>,
}

impl Location {
    /// Create a new location
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            point: None,
            country_code: None,
            population: None,
        }
    }

    /// Set coordinates
    pub fn with_point(mut self, point: GeoPoint) -> Self {
        self.point = Some(point);
        self
    }

    /// Set country code
    pub fn with_country_code(mut self, code: impl Into<String>) -> Self {
        self.country_code = Some(code.into());
        self
    }

    /// Set population
    pub fn with_population(mut self, population: u64) -> Self {
        self.population = Some(population);
        self
    }
}

// ============================================================================
// Mention
// ============================================================================

/// One recognized-and-resolved occurrence of a place in a book.
///
/// Immutable once created; the extraction pipeline emits mentions in
/// ascending `text_position` order within a book.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mention {
    /// Unique identifier
    pub id: Uuid,

    /// Owning book
    pub book_id: Uuid,

    /// Resolved location
    pub location_id: Uuid,

    /// The span text exactly as it appeared in the document
    pub mentioned_as: String,

    /// Absolute byte offset of the span in the original, unchunked text
    pub text_position: usize,

    /// Bounded text window centered on the span
    pub context: String,

    /// Which cascade tier produced the match
    pub match_strategy: MatchStrategy,

    /// Confidence in [0, 1], fully determined by the match strategy
    pub confidence: f32,
}

impl Mention {
    pub fn new(
        book_id: Uuid,
        location_id: Uuid,
        mentioned_as: impl Into<String>,
        text_position: usize,
        context: impl Into<String>,
        match_strategy: MatchStrategy,
        confidence: f32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            book_id,
            location_id,
            mentioned_as: mentioned_as.into(),
            text_position,
            context: context.into(),
            match_strategy,
            confidence,
        }
    }
}

// ============================================================================
// Document Input
// ============================================================================

/// Decoded document text plus the metadata the fetch layer supplies
#[derive(Debug, Clone)]
pub struct DocumentInput {
    /// Document title (used for period extraction)
    pub title: String,

    /// Where the text came from
    pub url: String,

    /// Author, when the fetch layer knows it
    pub author: Option<String>,

    /// Release/publication date string, when known
    pub release_date: Option<String>,

    /// Full decoded text of the document
    pub text: String,
}

impl DocumentInput {
    pub fn new(title: impl Into<String>, url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            author: None,
            release_date: None,
            text: text.into(),
        }
    }

    /// Set author
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Set release date
    pub fn with_release_date(mut self, date: impl Into<String>) -> Self {
        self.release_date = Some(date.into());
        self
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_period_requires_both_bounds() {
        let mut book = Book::new("The Empire and the Papacy, 918-1273", "http://example.org");
        assert_eq!(book.period(), None);

        book.historical_start_year = Some(918);
        assert_eq!(book.period(), None);

        book.historical_end_year = Some(1273);
        assert_eq!(book.period(), Some((918, 1273)));
    }

    #[test]
    fn test_set_period() {
        let mut book = Book::new("Chronicles", "http://example.org");
        let period = HistoricalPeriod::new(1096, 1291, "Years mentioned: 1096, 1291");
        book.set_period(&period);

        assert_eq!(book.period(), Some((1096, 1291)));
        assert!(book.period_description.is_some());
    }

    #[test]
    fn test_period_overlap() {
        let period = HistoricalPeriod::new(1200, 1250, "test");
        assert!(period.overlaps(1100, 1300));
        assert!(period.overlaps(1250, 1400));
        assert!(period.overlaps(1000, 1200));
        assert!(!period.overlaps(1251, 1400));
        assert!(!period.overlaps(900, 1199));
    }

    #[test]
    fn test_match_strategy_display() {
        assert_eq!(MatchStrategy::Exact.to_string(), "exact");
        assert_eq!(MatchStrategy::Alias.as_str(), "alias");
        assert_eq!(MatchStrategy::Fuzzy.as_str(), "fuzzy");
    }

    #[test]
    fn test_geo_point_validity() {
        assert!(GeoPoint::new(50.77, 6.08).is_valid());
        assert!(!GeoPoint::new(91.0, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, 181.0).is_valid());
    }

    #[test]
    fn test_location_builder() {
        let location = Location::new("Aix-la-Chapelle")
            .with_point(GeoPoint::new(50.77, 6.08))
            .with_country_code("DE")
            .with_population(240_000);

        assert_eq!(location.name, "Aix-la-Chapelle");
        assert!(location.point.is_some());
        assert_eq!(location.country_code.as_deref(), Some("DE"));
    }
}
