//! # cds-agent
//!
//! The conversation and assessment pipeline over the retrieval layer:
//!
//! - [`ChatEngine`] — classify → retrieve → gate → generate → parse →
//!   reconcile → append
//! - [`Assessor`] — the bounded tool-invocation loop for one-shot risk
//!   assessments
//! - [`CitationReconciler`] — disclaimer override and citation back-fill
//! - [`GreetingClassifier`] / [`DisclaimerClassifier`] — cheap short-circuit
//!   heuristics
//! - [`CdsService`] — the four boundary operations with injected state

pub mod assess;
pub mod chat;
pub mod classify;
pub mod parser;
pub mod prompt;
pub mod reconcile;
pub mod records;
pub mod service;

pub use assess::{ASSESS_TOP_K, Assessor, MAX_TOOL_ROUNDS};
pub use chat::ChatEngine;
pub use classify::{DisclaimerClassifier, GreetingClassifier};
pub use parser::{AssessmentOutput, ChatOutput, extract_json, parse_assessment_output, parse_chat_output};
pub use prompt::{CHAT_SYSTEM_PROMPT, GREETING_RESPONSE, HISTORY_WINDOW, LOW_EVIDENCE_ANSWER};
pub use reconcile::CitationReconciler;
pub use records::{InMemoryRecordStore, JsonFileRecordStore, PatientRecord, RecordStore};
pub use service::CdsService;
