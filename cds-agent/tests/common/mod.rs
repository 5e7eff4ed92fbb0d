//! Shared harness for pipeline tests: a keyword-keyed embedder over a small
//! fixed guideline corpus, wired into a fully in-memory service.
#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use cds_agent::{CdsService, InMemoryRecordStore, PatientRecord};
use cds_core::GenerativeModel;
use cds_rag::chunking::PageChunker;
use cds_rag::document::Page;
use cds_rag::embedding::EmbeddingProvider;
use cds_rag::error::Result as RagResult;
use cds_rag::index::GuidelineIndex;
use cds_rag::inmemory::InMemoryVectorStore;
use cds_rag::pipeline::RetrievalPipeline;
use cds_rag::source::StaticSource;
use cds_rag::RagConfig;
use cds_session::SessionStore;

/// Deterministic embedder that maps text to a fixed direction by keyword.
///
/// "breast" queries land on the breast chunk (distance ~0), lung terms on
/// the lung chunk, and "vague discomfort" points away from both so the
/// minimum distance clears the 1.2 evidence threshold.
pub struct StubEmbeddings;

#[async_trait]
impl EmbeddingProvider for StubEmbeddings {
    async fn embed(&self, text: &str) -> RagResult<Vec<f32>> {
        let lower = text.to_lowercase();
        Ok(if lower.contains("vague discomfort") {
            vec![-0.8, -0.6]
        } else if lower.contains("breast") {
            vec![0.0, 1.0]
        } else {
            vec![1.0, 0.0]
        })
    }

    fn dimensions(&self) -> usize {
        2
    }
}

/// Two single-chunk guideline pages: lung (page 1) and breast (page 2).
pub fn guideline_pages() -> Vec<Page> {
    vec![
        Page::new(
            1,
            "Refer people aged 40 and over with unexplained haemoptysis using a \
             suspected cancer pathway referral for lung cancer.",
        ),
        Page::new(
            2,
            "Refer people using a suspected cancer pathway referral for breast \
             cancer if they are aged 30 and over and have an unexplained breast lump.",
        ),
    ]
}

pub fn patients() -> Vec<PatientRecord> {
    vec![PatientRecord {
        patient_id: "PT-101".to_string(),
        name: "John Doe".to_string(),
        age: 55,
        gender: "Male".to_string(),
        smoking_history: "Current Smoker".to_string(),
        symptoms: vec!["unexplained hemoptysis".to_string(), "persistent cough".to_string()],
        symptom_duration_days: 21,
    }]
}

/// Build the in-memory retrieval pipeline over the fixed corpus.
pub fn build_pipeline() -> Arc<RetrievalPipeline> {
    let config = RagConfig::default();
    let index = Arc::new(GuidelineIndex::new(
        Arc::new(InMemoryVectorStore::new()),
        Arc::new(StubEmbeddings),
        Arc::new(StaticSource::new(guideline_pages())),
        PageChunker::new(config.chunk_tokens, config.overlap_tokens, "ng12").unwrap(),
        config.collection.clone(),
    ));
    Arc::new(
        RetrievalPipeline::builder()
            .config(config)
            .embedder(Arc::new(StubEmbeddings))
            .index(index)
            .build()
            .unwrap(),
    )
}

/// The record store holding the test patients.
pub fn record_store() -> Arc<InMemoryRecordStore> {
    Arc::new(InMemoryRecordStore::new(patients()))
}

/// Assemble a fully in-memory service around the given model.
pub fn service_with(model: Arc<dyn GenerativeModel>) -> CdsService {
    CdsService::new(build_pipeline(), model, SessionStore::new(), record_store())
}
