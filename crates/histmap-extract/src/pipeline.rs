//! Document pipeline and batch runner
//!
//! Per document: chunk -> recognize -> resolve -> assemble, with chunk
//! results merged in chunk order so mentions come out in ascending
//! text position. Period extraction runs once on the title. The batch
//! runner drives documents concurrently over the shared read-only index
//! with a per-document timeout; a timed-out or failed document is
//! abandoned whole, its partial mentions discarded.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use histmap_core::{AppConfig, BatchConfig, Book, ChunkerConfig, DocumentInput, Mention};
use histmap_gazetteer::GazetteerIndex;

use crate::assembler::MentionAssembler;
use crate::chunker::Chunker;
use crate::period::extract_period;
use crate::recognizer::{EntityRecognizer, RuleBasedRecognizer};
use crate::resolver::{LocationRegistry, Resolver};
use crate::Result;

// ============================================================================
// Outcomes and statistics
// ============================================================================

/// Per-document extraction counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DocumentStats {
    pub chunks: usize,
    pub failed_chunks: usize,
    pub spans_recognized: usize,
    pub unresolved_spans: usize,
    pub mentions: usize,
}

/// A successfully processed document: the book record and its complete
/// mention set, handed off together or not at all
#[derive(Debug, Clone)]
pub struct DocumentReport {
    pub book: Book,
    pub mentions: Vec<Mention>,
    pub stats: DocumentStats,
}

/// Why a document was abandoned
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No usable text after decoding/cleaning
    EmptyText,
    /// Exceeded the per-document wall-clock budget
    Timeout,
    /// The processing task itself failed
    Failed(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyText => write!(f, "document text is empty"),
            Self::Timeout => write!(f, "document timed out"),
            Self::Failed(message) => write!(f, "processing failed: {message}"),
        }
    }
}

/// Explicit per-document outcome; skipped documents surface here and in
/// the batch statistics, never as exceptions
#[derive(Debug, Clone)]
pub enum DocumentOutcome {
    Processed(DocumentReport),
    Skipped { title: String, reason: SkipReason },
}

impl DocumentOutcome {
    pub fn is_processed(&self) -> bool {
        matches!(self, Self::Processed(_))
    }
}

/// Batch-level aggregation of document outcomes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub documents_processed: usize,
    pub documents_skipped: usize,
    pub chunks: usize,
    pub failed_chunks: usize,
    pub spans_recognized: usize,
    pub unresolved_spans: usize,
    pub mentions: usize,
}

impl BatchStats {
    pub fn absorb(&mut self, outcome: &DocumentOutcome) {
        match outcome {
            DocumentOutcome::Processed(report) => {
                self.documents_processed += 1;
                self.chunks += report.stats.chunks;
                self.failed_chunks += report.stats.failed_chunks;
                self.spans_recognized += report.stats.spans_recognized;
                self.unresolved_spans += report.stats.unresolved_spans;
                self.mentions += report.stats.mentions;
            }
            DocumentOutcome::Skipped { .. } => {
                self.documents_skipped += 1;
            }
        }
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// The per-document extraction pipeline.
///
/// Holds the shared read-only index (through the resolver) and the
/// append-only location registry; everything else is per-call state, so
/// one pipeline value serves any number of concurrent documents.
pub struct ExtractionPipeline {
    chunker_config: ChunkerConfig,
    recognizer: Arc<dyn EntityRecognizer>,
    resolver: Resolver,
    assembler: MentionAssembler,
}

impl ExtractionPipeline {
    /// Build a pipeline with the default rule-based recognizer
    pub fn new(config: &AppConfig, index: Arc<GazetteerIndex>) -> Result<Self> {
        let recognizer: Arc<dyn EntityRecognizer> =
            Arc::new(RuleBasedRecognizer::new(&config.recognizer));
        Self::with_recognizer(config, index, recognizer)
    }

    /// Build a pipeline around a custom recognizer implementation
    pub fn with_recognizer(
        config: &AppConfig,
        index: Arc<GazetteerIndex>,
        recognizer: Arc<dyn EntityRecognizer>,
    ) -> Result<Self> {
        Ok(Self {
            chunker_config: config.chunker.clone(),
            recognizer,
            resolver: Resolver::new(index, config.resolver.clone())?,
            assembler: MentionAssembler::new(&config.context),
        })
    }

    /// The shared location registry, for the storage hand-off
    pub fn registry(&self) -> Arc<LocationRegistry> {
        self.resolver.registry()
    }

    /// Run one document through the extraction stages.
    ///
    /// Chunk-level recognizer failures are logged, counted and skipped;
    /// the document continues with its remaining chunks.
    pub fn process_document(&self, input: &DocumentInput) -> DocumentOutcome {
        if input.text.trim().is_empty() {
            warn!(title = %input.title, "skipping document with no usable text");
            return DocumentOutcome::Skipped {
                title: input.title.clone(),
                reason: SkipReason::EmptyText,
            };
        }

        let mut book = Book::new(&input.title, &input.url);
        book.author = input.author.clone();
        book.release_date = input.release_date.clone();
        if let Some(period) = extract_period(&input.title) {
            book.set_period(&period);
        }

        let mut stats = DocumentStats::default();
        let mut mentions = Vec::new();

        for chunk in Chunker::new(&input.text, self.chunker_config.max_chunk_bytes) {
            stats.chunks += 1;

            let spans = match self.recognizer.recognize(chunk.text) {
                Ok(spans) => spans,
                Err(e) => {
                    stats.failed_chunks += 1;
                    warn!(chunk = chunk.index, error = %e, "recognizer failed; skipping chunk");
                    continue;
                }
            };

            for span in spans {
                stats.spans_recognized += 1;
                match self.resolver.resolve(&span.text) {
                    Some(resolution) => {
                        mentions.push(self.assembler.assemble(
                            book.id,
                            &input.text,
                            chunk.start,
                            &span,
                            &resolution,
                        ));
                    }
                    None => stats.unresolved_spans += 1,
                }
            }
        }

        stats.mentions = mentions.len();
        info!(
            title = %book.title,
            chunks = stats.chunks,
            mentions = stats.mentions,
            unresolved = stats.unresolved_spans,
            "document processed"
        );

        DocumentOutcome::Processed(DocumentReport {
            book,
            mentions,
            stats,
        })
    }
}

// ============================================================================
// Batch runner
// ============================================================================

/// Drives a batch of independent documents through a shared pipeline
pub struct BatchRunner {
    pipeline: Arc<ExtractionPipeline>,
    config: BatchConfig,
}

impl BatchRunner {
    pub fn new(pipeline: Arc<ExtractionPipeline>, config: BatchConfig) -> Self {
        Self { pipeline, config }
    }

    /// Process every document, up to the configured concurrency.
    ///
    /// Outcomes come back in input order regardless of completion order.
    /// A document hitting the timeout is abandoned and the batch
    /// continues; its partial work is discarded, never handed off.
    pub async fn run(&self, documents: Vec<DocumentInput>) -> (Vec<DocumentOutcome>, BatchStats) {
        let concurrency = self.config.max_concurrent_documents.max(1);
        let budget = Duration::from_secs(self.config.document_timeout_secs);

        let outcomes: Vec<DocumentOutcome> = stream::iter(documents.into_iter().map(|input| {
            let pipeline = Arc::clone(&self.pipeline);
            async move {
                let title = input.title.clone();
                let task =
                    tokio::task::spawn_blocking(move || pipeline.process_document(&input));

                match tokio::time::timeout(budget, task).await {
                    Ok(Ok(outcome)) => outcome,
                    Ok(Err(join_error)) => {
                        warn!(title = %title, error = %join_error, "document task failed");
                        DocumentOutcome::Skipped {
                            title,
                            reason: SkipReason::Failed(join_error.to_string()),
                        }
                    }
                    Err(_) => {
                        warn!(title = %title, "document timed out; discarding partial result");
                        DocumentOutcome::Skipped {
                            title,
                            reason: SkipReason::Timeout,
                        }
                    }
                }
            }
        }))
        .buffered(concurrency)
        .collect()
        .await;

        let mut stats = BatchStats::default();
        for outcome in &outcomes {
            stats.absorb(outcome);
        }

        info!(
            processed = stats.documents_processed,
            skipped = stats.documents_skipped,
            mentions = stats.mentions,
            "batch complete"
        );

        (outcomes, stats)
    }
}

// ============================================================================
// Tests
// ============================================================================
