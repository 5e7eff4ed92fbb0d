//! Page-scoped overlapping chunker for paginated source text.

use crate::document::{Chunk, Page};
use crate::error::{RagError, Result};

/// Approximate number of characters per token; chunk sizes are configured
/// in tokens and converted to characters before windowing.
pub const APPROX_CHARS_PER_TOKEN: usize = 4;

/// Splits paginated text into overlapping fixed-size windows with stable ids.
///
/// Each page is windowed independently: a window of `size` characters slides
/// in steps of `size − overlap`. A window is emitted only when its trimmed
/// content is non-empty, and the emitted text is the trimmed window. Ids are
/// `{tag}_p{page:03}_c{counter:04}` where the counter is process-wide across
/// pages, so ids stay unique and re-chunking the same pages reproduces them
/// exactly.
#[derive(Debug, Clone)]
pub struct PageChunker {
    chunk_chars: usize,
    overlap_chars: usize,
    tag: String,
}

impl PageChunker {
    /// Create a chunker from sizes expressed in approximate tokens.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `overlap_tokens >= chunk_tokens`
    /// or `chunk_tokens == 0`: a zero or negative step would loop forever.
    pub fn new(chunk_tokens: usize, overlap_tokens: usize, tag: impl Into<String>) -> Result<Self> {
        if chunk_tokens == 0 {
            return Err(RagError::ConfigError("chunk size must be greater than zero".to_string()));
        }
        if overlap_tokens >= chunk_tokens {
            return Err(RagError::ConfigError(format!(
                "chunk overlap ({overlap_tokens}) must be less than chunk size ({chunk_tokens})"
            )));
        }
        Ok(Self {
            chunk_chars: chunk_tokens * APPROX_CHARS_PER_TOKEN,
            overlap_chars: overlap_tokens * APPROX_CHARS_PER_TOKEN,
            tag: tag.into(),
        })
    }

    /// Split the given pages into chunks, in page order.
    pub fn chunk_pages(&self, pages: &[Page]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let mut counter: usize = 0;
        let step = self.chunk_chars - self.overlap_chars;

        for page in pages {
            let chars: Vec<char> = page.text.chars().collect();
            let mut start = 0;

            while start < chars.len() {
                let end = (start + self.chunk_chars).min(chars.len());
                let window: String = chars[start..end].iter().collect();
                let trimmed = window.trim();

                if !trimmed.is_empty() {
                    chunks.push(Chunk {
                        id: format!("{}_p{:03}_c{:04}", self.tag, page.number, counter),
                        page: page.number,
                        text: trimmed.to_string(),
                        embedding: Vec::new(),
                    });
                    counter += 1;
                }

                start += step;
            }
        }

        chunks
    }
}
