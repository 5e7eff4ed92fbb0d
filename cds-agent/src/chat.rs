//! The conversational turn pipeline:
//! classify → retrieve → gate → generate → parse → reconcile → append.

use std::sync::Arc;

use cds_core::{CdsError, ChatMessage, ChatResponse, GenerativeModel, Result};
use cds_rag::RetrievalPipeline;
use cds_session::SessionStore;
use tracing::{debug, info};

use crate::classify::GreetingClassifier;
use crate::parser::parse_chat_output;
use crate::prompt::{GREETING_RESPONSE, LOW_EVIDENCE_ANSWER, build_chat_messages};
use crate::reconcile::CitationReconciler;

/// Drives one conversational turn end to end.
///
/// Greetings bypass retrieval and generation entirely. Weak evidence
/// short-circuits before the model is ever invoked, so no grounded-sounding
/// text is ever generated from poor matches.
pub struct ChatEngine {
    pipeline: Arc<RetrievalPipeline>,
    model: Arc<dyn GenerativeModel>,
    sessions: SessionStore,
    greetings: GreetingClassifier,
    reconciler: CitationReconciler,
}

impl ChatEngine {
    /// Create an engine over the given retrieval pipeline, model, and
    /// session store.
    pub fn new(
        pipeline: Arc<RetrievalPipeline>,
        model: Arc<dyn GenerativeModel>,
        sessions: SessionStore,
    ) -> Self {
        Self {
            pipeline,
            model,
            sessions,
            greetings: GreetingClassifier::default(),
            reconciler: CitationReconciler::default(),
        }
    }

    /// Replace the greeting classifier.
    pub fn with_greeting_classifier(mut self, greetings: GreetingClassifier) -> Self {
        self.greetings = greetings;
        self
    }

    /// Replace the citation reconciler.
    pub fn with_reconciler(mut self, reconciler: CitationReconciler) -> Self {
        self.reconciler = reconciler;
        self
    }

    /// The session store this engine appends to.
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Run one conversational turn.
    ///
    /// `top_k` overrides the configured retrieval depth when given.
    pub async fn chat(
        &self,
        session_id: &str,
        message: &str,
        top_k: Option<usize>,
    ) -> Result<ChatResponse> {
        if message.trim().is_empty() {
            return Err(CdsError::Validation("message must not be empty".to_string()));
        }
        if top_k == Some(0) {
            return Err(CdsError::Validation("top_k must be greater than zero".to_string()));
        }

        self.sessions.append(session_id, ChatMessage::user(message)).await;

        // Greetings never hit retrieval or the model.
        if self.greetings.is_greeting(message) {
            debug!(session_id, "greeting short-circuit");
            self.sessions
                .append(session_id, ChatMessage::assistant(GREETING_RESPONSE, Vec::new()))
                .await;
            return Ok(response(session_id, GREETING_RESPONSE, Vec::new()));
        }

        let retrieved = self.pipeline.retrieve(message, top_k).await.map_err(CdsError::from)?;

        if !self.pipeline.gate().adequate(&retrieved) {
            info!(session_id, result_count = retrieved.len(), "evidence too weak, skipping generation");
            self.sessions
                .append(session_id, ChatMessage::assistant(LOW_EVIDENCE_ANSWER, Vec::new()))
                .await;
            return Ok(response(session_id, LOW_EVIDENCE_ANSWER, Vec::new()));
        }

        let history = self.sessions.history(session_id).await.unwrap_or_default();
        let messages = build_chat_messages(&history, &retrieved, message);

        let raw = self.model.complete(&messages).await?;
        let output = parse_chat_output(&raw);
        if !output.parsed {
            info!(session_id, "model output was not JSON, using raw-text fallback");
        }

        let citations = self.reconciler.reconcile(&output.answer, output.citations, Some(&retrieved));
        self.sessions
            .append(session_id, ChatMessage::assistant(&output.answer, citations.clone()))
            .await;

        info!(session_id, citation_count = citations.len(), "chat turn completed");
        Ok(response(session_id, &output.answer, citations))
    }
}

fn response(session_id: &str, answer: &str, citations: Vec<cds_core::Citation>) -> ChatResponse {
    ChatResponse { session_id: session_id.to_string(), answer: answer.to_string(), citations }
}
