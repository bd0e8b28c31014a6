//! histmap-extract - Place-mention extraction pipeline
//!
//! Implements the per-document extraction stages:
//! - offset-preserving text chunking
//! - rule-based place-name recognition
//! - gazetteer resolution (exact -> alias -> fuzzy cascade)
//! - historical period extraction from title metadata
//! - mention assembly with absolute positions and context windows
//!
//! plus the batch runner that drives documents through the stages with
//! bounded concurrency and per-document timeouts.

pub mod assembler;
pub mod chunker;
pub mod gutenberg;
pub mod period;
pub mod pipeline;
pub mod recognizer;
pub mod resolver;

pub use assembler::MentionAssembler;
pub use chunker::{chunk_text, Chunk, Chunker};
pub use period::extract_period;
pub use pipeline::{
    BatchRunner, BatchStats, DocumentOutcome, DocumentReport, DocumentStats, ExtractionPipeline,
    SkipReason,
};
pub use recognizer::{EntityClass, EntityRecognizer, RecognizedSpan, RuleBasedRecognizer};
pub use resolver::{LocationRegistry, Resolution, Resolver};

use thiserror::Error;

/// Errors raised inside the extraction stages.
///
/// Per-chunk and per-document failures are recovered by the pipeline and
/// surface only in batch statistics; these variants exist for the stage
/// boundaries themselves.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("recognizer failed: {0}")]
    RecognitionFailure(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] histmap_core::ConfigError),
}

pub type Result<T> = std::result::Result<T, ExtractError>;
