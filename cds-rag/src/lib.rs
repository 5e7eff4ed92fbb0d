//! # cds-rag
//!
//! Retrieval side of the clinical decision support workspace: chunking of
//! paginated guideline text, a self-building vector index, and evidence
//! gating for query-time sufficiency decisions.
//!
//! ## Overview
//!
//! - [`PageChunker`] — overlapping fixed-size windows with stable, page-scoped ids
//! - [`VectorStore`] — named collections of embedded chunks, cosine-distance search
//!   ([`InMemoryVectorStore`], [`FileVectorStore`])
//! - [`GuidelineIndex`] — lazy one-shot self-build from a [`SourceLoader`],
//!   idempotent staged rebuild
//! - [`EvidenceGate`] — minimum-distance sufficiency rule
//! - [`RetrievalPipeline`] — embed → search → gate, builder-constructed
//! - [`GeminiEmbeddings`] — [`EmbeddingProvider`] over the Gemini REST API

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod filestore;
pub mod gate;
pub mod gemini;
pub mod index;
pub mod inmemory;
pub mod pipeline;
pub mod source;
pub mod vectorstore;

pub use chunking::{APPROX_CHARS_PER_TOKEN, PageChunker};
pub use config::{DEFAULT_COLLECTION, DEFAULT_EVIDENCE_THRESHOLD, RagConfig, RagConfigBuilder};
pub use document::{Chunk, Page, RetrievalResult};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use filestore::FileVectorStore;
pub use gate::EvidenceGate;
pub use gemini::GeminiEmbeddings;
pub use index::GuidelineIndex;
pub use inmemory::InMemoryVectorStore;
pub use pipeline::{RetrievalPipeline, RetrievalPipelineBuilder, symptom_query};
pub use source::{PdfDirSource, SourceLoader, StaticSource};
pub use vectorstore::VectorStore;
