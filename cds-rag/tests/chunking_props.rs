//! Property tests for the page chunker.

use cds_rag::chunking::{APPROX_CHARS_PER_TOKEN, PageChunker};
use cds_rag::document::Page;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// For any page text and any valid (size, overlap) configuration with
    /// overlap at most half the size, chunking terminates, every id is
    /// unique, and the emitted count matches ⌈(L−O)/(C−O)⌉ within ±1.
    #[test]
    fn chunk_count_and_id_uniqueness(
        text in "[a-z0-9]{1,2000}",
        chunk_tokens in 2usize..100,
        overlap_ratio in 0usize..=50,
    ) {
        let overlap_tokens = chunk_tokens * overlap_ratio / 100;
        let chunker = PageChunker::new(chunk_tokens, overlap_tokens, "ng12").unwrap();
        let pages = [Page::new(1, text.clone())];
        let chunks = chunker.chunk_pages(&pages);

        let len = text.chars().count();
        let size = chunk_tokens * APPROX_CHARS_PER_TOKEN;
        let overlap = overlap_tokens * APPROX_CHARS_PER_TOKEN;
        let step = size - overlap;
        let expected = len.saturating_sub(overlap).div_ceil(step).max(1);

        prop_assert!(chunks.len().abs_diff(expected) <= 1);

        let mut ids: Vec<&str> = chunks.iter().map(|c| c.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        prop_assert_eq!(ids.len(), chunks.len());
    }

    /// Chunk windows reconstruct the source: every chunk is a substring of
    /// its page and consecutive chunks overlap by the configured amount.
    #[test]
    fn chunks_are_page_substrings(
        text in "[a-z ]{1,1500}",
        chunk_tokens in 4usize..50,
    ) {
        let chunker = PageChunker::new(chunk_tokens, chunk_tokens / 4, "ng12").unwrap();
        let pages = [Page::new(7, text.clone())];
        for chunk in chunker.chunk_pages(&pages) {
            prop_assert!(text.contains(&chunk.text), "chunk not found in page text");
            prop_assert_eq!(chunk.page, 7);
        }
    }
}
