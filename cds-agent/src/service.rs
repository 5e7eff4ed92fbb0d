//! The service boundary: the four operations a transport layer maps onto.

use std::sync::Arc;

use cds_core::{AssessmentResult, CdsError, ChatMessage, ChatResponse, GenerativeModel, Result};
use cds_rag::RetrievalPipeline;
use cds_session::SessionStore;

use crate::assess::Assessor;
use crate::chat::ChatEngine;
use crate::records::{PatientRecord, RecordStore};

/// The clinical decision support service.
///
/// All state (index, model, sessions, records) is injected at
/// construction; there are no module-level singletons. A web layer maps
/// HTTP verbs onto these operations and [`CdsError`] onto status codes.
pub struct CdsService {
    engine: ChatEngine,
    assessor: Assessor,
    sessions: SessionStore,
    records: Arc<dyn RecordStore>,
}

impl CdsService {
    /// Assemble the service from its collaborators.
    pub fn new(
        pipeline: Arc<RetrievalPipeline>,
        model: Arc<dyn GenerativeModel>,
        sessions: SessionStore,
        records: Arc<dyn RecordStore>,
    ) -> Self {
        Self {
            engine: ChatEngine::new(pipeline.clone(), model.clone(), sessions.clone()),
            assessor: Assessor::new(pipeline, model, records.clone()),
            sessions,
            records,
        }
    }

    /// Produce a structured risk assessment for a patient.
    ///
    /// Always returns a well-formed [`AssessmentResult`] for model-output
    /// problems (the `Assessment Error` sentinel); errors are reserved for
    /// missing patients, validation, and upstream/index failures.
    pub async fn assess(&self, patient_id: &str) -> Result<AssessmentResult> {
        self.assessor.assess(patient_id).await
    }

    /// Run one conversational turn against a session.
    pub async fn chat(
        &self,
        session_id: &str,
        message: &str,
        top_k: Option<usize>,
    ) -> Result<ChatResponse> {
        self.engine.chat(session_id, message, top_k).await
    }

    /// The full ordered history of a session.
    ///
    /// # Errors
    ///
    /// Returns [`CdsError::NotFound`] if the session was never created.
    pub async fn history(&self, session_id: &str) -> Result<Vec<ChatMessage>> {
        self.sessions
            .history(session_id)
            .await
            .ok_or_else(|| CdsError::NotFound(format!("Session {session_id}")))
    }

    /// Delete a session. Returns whether one existed.
    pub async fn clear(&self, session_id: &str) -> bool {
        self.sessions.clear(session_id).await
    }

    /// All known patient ids, sorted.
    pub async fn patient_ids(&self) -> Result<Vec<String>> {
        self.records.ids().await
    }

    /// Look up a patient record.
    ///
    /// # Errors
    ///
    /// Returns [`CdsError::NotFound`] if no such patient exists.
    pub async fn patient(&self, patient_id: &str) -> Result<PatientRecord> {
        self.records
            .lookup(patient_id)
            .await?
            .ok_or_else(|| CdsError::NotFound(format!("Patient {patient_id}")))
    }
}
