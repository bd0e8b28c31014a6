//! Mention assembly
//!
//! Combines a chunk-local recognition result, the chunk's absolute
//! offset and a resolution outcome into a Mention record. The context
//! window is drawn from the full document text, not the chunk, so spans
//! near a chunk edge still get their full surroundings.

use uuid::Uuid;

use histmap_core::{ContextConfig, Mention};

use crate::recognizer::RecognizedSpan;
use crate::resolver::Resolution;

/// Builds Mention records with absolute positions and context windows
#[derive(Debug, Clone)]
pub struct MentionAssembler {
    window_bytes: usize,
}

impl MentionAssembler {
    pub fn new(config: &ContextConfig) -> Self {
        Self {
            window_bytes: config.window_bytes,
        }
    }

    /// Assemble one mention.
    ///
    /// `text_position = chunk_start + span.start` is the span's absolute
    /// offset in the original text; the context window extends
    /// symmetrically from the span, clamped at the document bounds.
    pub fn assemble(
        &self,
        book_id: Uuid,
        full_text: &str,
        chunk_start: usize,
        span: &RecognizedSpan,
        resolution: &Resolution,
    ) -> Mention {
        let position = chunk_start + span.start;
        let span_end = chunk_start + span.end;
        let context = self.context_window(full_text, position, span_end);

        Mention::new(
            book_id,
            resolution.location.id,
            &span.text,
            position,
            context,
            resolution.strategy,
            resolution.confidence,
        )
    }

    fn context_window(&self, text: &str, span_start: usize, span_end: usize) -> String {
        let mut start = span_start.saturating_sub(self.window_bytes);
        let mut end = (span_end + self.window_bytes).min(text.len());

        // Snap inward to UTF-8 boundaries
        while start < text.len() && !text.is_char_boundary(start) {
            start += 1;
        }
        while end > start && !text.is_char_boundary(end) {
            end -= 1;
        }

        text[start..end].trim().to_string()
    }
}

// ============================================================================
// Tests
// ============================================================================
