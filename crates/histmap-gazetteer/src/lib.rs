//! histmap-gazetteer - Multi-source place-name reference index
//!
//! Builds an immutable, in-memory gazetteer from heterogeneous raw
//! sources and serves the resolution cascade with:
//! - O(1) exact lookup on normalized names and aliases
//! - trigram-backed approximate candidate retrieval (no full scans)
//!
//! Building is an offline batch step; the produced index is read-only
//! for the lifetime of a process and is shared across resolution
//! operations without locking.

pub mod index;
pub mod normalize;
pub mod source;

pub use index::{GazetteerBuilder, GazetteerEntry, GazetteerIndex};
pub use normalize::normalize_name;
pub use source::{
    parse_cities_tsv, parse_linked_places, parse_overrides_toml, RawPlace, SourceTag,
};

use thiserror::Error;

/// Errors from gazetteer building and source parsing
#[derive(Error, Debug)]
pub enum GazetteerError {
    /// No source row survived parsing; an empty index would make every
    /// resolution a miss, so this is fatal to the build
    #[error("gazetteer build produced zero usable entries")]
    EmptyIndex,

    #[error("failed to read gazetteer source {path}: {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse gazetteer source {path}: {message}")]
    ParseError { path: String, message: String },
}

pub type Result<T> = std::result::Result<T, GazetteerError>;
