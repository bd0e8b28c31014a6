//! Offset-preserving text chunking
//!
//! Long documents are fed to the recognizer in bounded segments. Each
//! chunk records the absolute byte offset of its first byte in the
//! original text, so chunk-local span offsets translate back to absolute
//! positions with a single addition. Boundaries land on whitespace only,
//! never inside a word; a word straddling the size bound is pushed whole
//! into the next chunk.

use histmap_core::ChunkerConfig;

/// A bounded slice of the original document text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    /// The chunk's text, borrowed from the original document
    pub text: &'a str,

    /// Absolute byte offset of `text` in the original document
    pub start: usize,

    /// Zero-based position of this chunk in the sequence
    pub index: u32,
}

/// Lazy, restartable chunk iterator.
///
/// Re-chunking the same text with the same bound is deterministic and
/// yields identical chunks.
pub struct Chunker<'a> {
    text: &'a str,
    max_chunk_bytes: usize,
    cursor: usize,
    index: u32,
}

impl<'a> Chunker<'a> {
    pub fn new(text: &'a str, max_chunk_bytes: usize) -> Self {
        Self {
            text,
            // A zero bound would never make progress
            max_chunk_bytes: max_chunk_bytes.max(1),
            cursor: 0,
            index: 0,
        }
    }
}

/// Chunk a document with the configured size bound
pub fn chunk_text<'a>(text: &'a str, config: &ChunkerConfig) -> Chunker<'a> {
    Chunker::new(text, config.max_chunk_bytes)
}

impl<'a> Iterator for Chunker<'a> {
    type Item = Chunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let bytes = self.text.as_bytes();

        // Chunks never start on whitespace
        while self.cursor < bytes.len() && bytes[self.cursor].is_ascii_whitespace() {
            self.cursor += 1;
        }
        if self.cursor >= bytes.len() {
            return None;
        }

        let start = self.cursor;
        let remaining = bytes.len() - start;

        let end = if remaining <= self.max_chunk_bytes {
            bytes.len()
        } else {
            let hard_limit = start + self.max_chunk_bytes;
            match last_whitespace(bytes, start, hard_limit) {
                // Break at the last whitespace at or before the bound
                Some(break_at) => break_at,
                // An entire chunk without whitespace: fall forward to the
                // next whitespace (or the end) rather than split the word
                None => next_whitespace(bytes, hard_limit).unwrap_or(bytes.len()),
            }
        };

        let chunk = Chunk {
            text: &self.text[start..end],
            start,
            index: self.index,
        };
        self.cursor = end;
        self.index += 1;
        Some(chunk)
    }
}

/// Last whitespace position in `bytes[start..=limit]`, exclusive of
/// `start` so a chunk is never empty
fn last_whitespace(bytes: &[u8], start: usize, limit: usize) -> Option<usize> {
    let limit = limit.min(bytes.len() - 1);
    (start + 1..=limit)
        .rev()
        .find(|&i| bytes[i].is_ascii_whitespace())
}

fn next_whitespace(bytes: &[u8], from: usize) -> Option<usize> {
    (from..bytes.len()).find(|&i| bytes[i].is_ascii_whitespace())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn chunks(text: &str, max: usize) -> Vec<Chunk<'_>> {
        Chunker::new(text, max).collect()
    }

    #[test]
    fn test_small_text_is_a_single_chunk() {
        let out = chunks("The court assembled at Aachen.", 1000);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].start, 0);
        assert_eq!(out[0].text, "The court assembled at Aachen.");
    }

    #[test]
    fn test_empty_text_yields_no_chunks() {
        assert!(chunks("", 100).is_empty());
        assert!(chunks("   \n\t  ", 100).is_empty());
    }

    #[test]
    fn test_offsets_point_into_original_text() {
        let text = "one two three four five six seven eight nine ten";
        for chunk in chunks(text, 10) {
            assert_eq!(&text[chunk.start..chunk.start + chunk.text.len()], chunk.text);
        }
    }

    #[test]
    fn test_no_word_is_ever_split() {
        let text = "Charlemagne wintered at Aachen before marching on Pavia and Verona";
        for max in 5..=text.len() {
            for chunk in chunks(text, max) {
                assert!(!chunk.text.starts_with(char::is_whitespace));
                assert!(!chunk.text.ends_with(char::is_whitespace));
                // Every chunk boundary falls on whitespace in the original
                let end = chunk.start + chunk.text.len();
                if chunk.start > 0 {
                    assert!(text.as_bytes()[chunk.start - 1].is_ascii_whitespace());
                }
                if end < text.len() {
                    assert!(text.as_bytes()[end].is_ascii_whitespace());
                }
            }
        }
    }

    #[test]
    fn test_oversized_word_falls_forward() {
        let long_word = "x".repeat(40);
        let text = format!("start {long_word} end");
        let out = chunks(&text, 10);

        assert!(out.iter().any(|c| c.text == long_word));
        let reassembled: Vec<&str> = out.iter().map(|c| c.text).collect();
        assert_eq!(reassembled, vec!["start", long_word.as_str(), "end"]);
    }

    #[test]
    fn test_rechunking_is_idempotent() {
        let text = "word ".repeat(5000);
        let first: Vec<(usize, String)> = chunks(&text, 997)
            .iter()
            .map(|c| (c.start, c.text.to_string()))
            .collect();
        let second: Vec<(usize, String)> = chunks(&text, 997)
            .iter()
            .map(|c| (c.start, c.text.to_string()))
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_large_document_chunk_count() {
        // 1,200,000 characters at a 500,000 bound: exactly 3 chunks,
        // none splitting a word
        let text = "word123 ".repeat(150_000);
        assert_eq!(text.len(), 1_200_000);

        let out = chunks(&text, 500_000);
        assert_eq!(out.len(), 3);
        for chunk in &out {
            assert!(chunk.text.len() <= 500_000);
            assert!(chunk.text.starts_with("word123"));
            assert!(chunk.text.trim_end().ends_with("word123"));
        }
    }

    #[test]
    fn test_straddling_word_stays_intact() {
        // Build a text where a place name straddles the 500,000 bound
        let filler = "a ".repeat(249_997);
        let mut text = filler;
        text.push_str("Regensburg and more text afterwards");
        let bound = 500_000;
        assert!(text.len() > bound);

        let name_start = text.find("Regensburg").unwrap();
        assert!(name_start < bound && name_start + "Regensburg".len() > bound - 6);

        let out = chunks(&text, bound);
        // The straddling name appears whole in exactly one chunk
        let containing: Vec<_> = out
            .iter()
            .filter(|c| c.text.contains("Regensburg"))
            .collect();
        assert_eq!(containing.len(), 1);
    }

    proptest! {
        #[test]
        fn prop_chunks_reassemble_and_offsets_hold(
            words in proptest::collection::vec("[a-zA-Z]{1,12}", 1..200),
            max in 4usize..64,
        ) {
            let text = words.join(" ");
            let out: Vec<Chunk<'_>> = Chunker::new(&text, max).collect();

            // Offset round-trip for every chunk
            for chunk in &out {
                prop_assert_eq!(
                    &text[chunk.start..chunk.start + chunk.text.len()],
                    chunk.text
                );
            }

            // Chunk indexes are sequential and starts strictly increase
            for (i, chunk) in out.iter().enumerate() {
                prop_assert_eq!(chunk.index as usize, i);
            }
            for pair in out.windows(2) {
                prop_assert!(pair[0].start + pair[0].text.len() <= pair[1].start);
            }

            // No word lost: concatenating chunks restores the word sequence
            let restored: Vec<&str> = out
                .iter()
                .flat_map(|c| c.text.split_ascii_whitespace())
                .collect();
            let original: Vec<&str> = text.split_ascii_whitespace().collect();
            prop_assert_eq!(restored, original);
        }
    }
}
