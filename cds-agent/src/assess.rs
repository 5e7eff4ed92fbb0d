//! One-shot risk assessment as a bounded tool-invocation loop.
//!
//! The generative model is an opaque `complete(messages) -> text` service,
//! so the two capabilities (record fetch, guideline search) are invoked via
//! a JSON action protocol in the model's output. The loop is an explicit
//! state machine over [`AgentAction`]: each round either dispatches one
//! capability and feeds the result back, or accepts the model's final
//! assessment. A fixed invocation budget makes runaway loops a terminal
//! failure instead of an unbounded recursion.

use std::sync::Arc;

use cds_core::{AssessmentResult, CdsError, GenerativeModel, ModelMessage, Result, RiskLevel};
use cds_rag::RetrievalPipeline;
use serde_json::Value;
use tracing::{info, warn};

use crate::parser::{extract_json, parse_assessment_output};
use crate::reconcile::CitationReconciler;
use crate::records::{PatientRecord, RecordStore};

/// Maximum number of capability invocations per assessment.
pub const MAX_TOOL_ROUNDS: usize = 10;

/// Retrieval depth for guideline searches issued by the loop.
pub const ASSESS_TOP_K: usize = 8;

/// The behavioral contract for the assessment loop.
const ASSESS_SYSTEM_PROMPT: &str = r#"You are a Clinical Decision Support Agent specializing in cancer risk assessment
using the NG12 guidelines ("Suspected cancer: recognition and referral").

Your task is to assess a patient's cancer risk based on their clinical data and the NG12 guidelines.

## Process:
1. First, retrieve the patient's data using the get_patient_data tool.
2. Then, search the NG12 guidelines for relevant sections using the search_guidelines tool,
   based on the patient's symptoms.
3. Analyze the patient's data against the retrieved guideline criteria.
4. Determine the appropriate risk level and recommendation.

## Tools:
To invoke a tool, your ENTIRE response must be a single JSON object of one of these shapes:
{"action": "get_patient_data", "patient_id": "<patient id>"}
{"action": "search_guidelines", "symptoms": ["<symptom>", "..."]}
The tool result arrives in the next message. You may invoke tools repeatedly, in any order.

## Risk Levels:
- "Urgent Referral (2-week wait)": Patient meets NG12 criteria for urgent suspected cancer referral.
- "Urgent Investigation": Patient meets criteria for urgent investigation (e.g. imaging, blood tests).
- "Non-Urgent Referral": Symptoms warrant further investigation but do not meet urgent criteria.
- "Low Risk - Routine Follow-up": Symptoms are present but do not meet NG12 thresholds for referral.

## Important Rules:
- ONLY base your assessment on the retrieved NG12 guideline text. Do not invent criteria.
- Always cite the specific guideline passages that support your assessment.
- Consider patient age, gender, smoking history, symptom duration, and symptom combination.
- If the guidelines do not clearly address the patient's presentation, state this explicitly.

## Output Format:
When you have enough information, respond with valid JSON in exactly this format (no tool call):
{
  "risk_level": "<one of the risk levels above>",
  "assessment": "<detailed clinical reasoning explaining why this risk level was assigned>",
  "citations": [
    {
      "source": "NG12 PDF",
      "page": <page number>,
      "chunk_id": "<chunk identifier>",
      "excerpt": "<relevant text excerpt from the guideline>"
    }
  ]
}"#;

/// One step of the assessment state machine, decoded from model output.
#[derive(Debug, Clone, PartialEq)]
enum AgentAction {
    /// Fetch a patient record by id.
    FetchRecord { patient_id: String },
    /// Search the guidelines for the given symptom terms.
    SearchGuidelines { symptoms: Vec<String> },
    /// The model named an action outside the protocol.
    Unknown { action: String },
    /// No action requested: the output is the final assessment.
    Final,
}

/// Decode the model's turn into an action. Output without a recognizable
/// `action` field is the final assessment.
fn parse_action(raw: &str) -> AgentAction {
    let Some(value) = extract_json(raw) else { return AgentAction::Final };
    let Some(action) = value.get("action").and_then(Value::as_str) else {
        return AgentAction::Final;
    };

    match action {
        "get_patient_data" => AgentAction::FetchRecord {
            patient_id: value
                .get("patient_id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        },
        "search_guidelines" => AgentAction::SearchGuidelines {
            symptoms: value
                .get("symptoms")
                .and_then(Value::as_array)
                .map(|items| {
                    items.iter().filter_map(Value::as_str).map(str::to_string).collect()
                })
                .unwrap_or_default(),
        },
        other => AgentAction::Unknown { action: other.to_string() },
    }
}

/// Runs the bounded assessment loop.
pub struct Assessor {
    pipeline: Arc<RetrievalPipeline>,
    model: Arc<dyn GenerativeModel>,
    records: Arc<dyn RecordStore>,
    reconciler: CitationReconciler,
    max_rounds: usize,
}

impl Assessor {
    /// Create an assessor over the given pipeline, model, and record store.
    pub fn new(
        pipeline: Arc<RetrievalPipeline>,
        model: Arc<dyn GenerativeModel>,
        records: Arc<dyn RecordStore>,
    ) -> Self {
        Self {
            pipeline,
            model,
            records,
            reconciler: CitationReconciler::default(),
            max_rounds: MAX_TOOL_ROUNDS,
        }
    }

    /// Override the tool invocation budget.
    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// Assess the cancer risk for a patient.
    ///
    /// # Errors
    ///
    /// Returns [`CdsError::NotFound`] when the patient does not exist, and
    /// propagates upstream embedding/generation failures. Malformed model
    /// output is NOT an error: it degrades to the
    /// [`RiskLevel::AssessmentError`] sentinel with the raw text preserved.
    pub async fn assess(&self, patient_id: &str) -> Result<AssessmentResult> {
        if patient_id.trim().is_empty() {
            return Err(CdsError::Validation("patient_id must not be empty".to_string()));
        }
        let patient = self
            .records
            .lookup(patient_id)
            .await?
            .ok_or_else(|| CdsError::NotFound(format!("Patient {patient_id}")))?;

        let mut messages = vec![
            ModelMessage::system(ASSESS_SYSTEM_PROMPT),
            ModelMessage::user(format!(
                "Assess the cancer risk for patient {patient_id}. \
                 Retrieve their data, search the NG12 guidelines for their symptoms, \
                 and provide a risk assessment with citations."
            )),
        ];

        let mut rounds = 0;
        loop {
            let raw = self.model.complete(&messages).await?;

            let action = parse_action(&raw);
            if action == AgentAction::Final {
                return Ok(self.finish(&patient, &raw));
            }

            rounds += 1;
            if rounds > self.max_rounds {
                warn!(patient_id, rounds, "tool budget exhausted");
                return Ok(degraded(
                    &patient,
                    format!(
                        "Tool budget exhausted after {} invocations without a final assessment. \
                         Last model output: {raw}",
                        self.max_rounds
                    ),
                ));
            }

            let observation = self.dispatch(&action).await?;
            info!(patient_id, round = rounds, ?action, "capability invoked");
            messages.push(ModelMessage::assistant(raw));
            messages.push(ModelMessage::user(observation));
        }
    }

    /// Execute one capability and render its observation for the model.
    async fn dispatch(&self, action: &AgentAction) -> Result<String> {
        match action {
            AgentAction::FetchRecord { patient_id } => {
                let body = match self.records.lookup(patient_id).await? {
                    Some(record) => serde_json::to_string_pretty(&record)
                        .map_err(|e| CdsError::Internal(e.to_string()))?,
                    None => format!("Patient {patient_id} not found."),
                };
                Ok(format!("TOOL RESULT (get_patient_data):\n{body}"))
            }
            AgentAction::SearchGuidelines { symptoms } => {
                let results = self
                    .pipeline
                    .retrieve_for_symptoms(symptoms, Some(ASSESS_TOP_K))
                    .await
                    .map_err(CdsError::from)?;
                let body = serde_json::to_string_pretty(&results)
                    .map_err(|e| CdsError::Internal(e.to_string()))?;
                Ok(format!("TOOL RESULT (search_guidelines):\n{body}"))
            }
            AgentAction::Unknown { action } => {
                Ok(format!("Unknown action '{action}'. Use get_patient_data or search_guidelines, or emit the final assessment JSON."))
            }
            AgentAction::Final => unreachable!("Final is handled by the loop"),
        }
    }

    /// Turn the model's final output into an [`AssessmentResult`].
    fn finish(&self, patient: &PatientRecord, raw: &str) -> AssessmentResult {
        let output = parse_assessment_output(raw);
        if !output.parsed {
            info!(patient_id = %patient.patient_id, "final output was not JSON, degrading");
            return degraded(patient, format!("Agent returned non-JSON response: {raw}"));
        }

        let citations = self.reconciler.reconcile(&output.assessment, output.citations, None);
        let risk_level = match output.risk_level {
            Some(level) => level,
            None => {
                info!(patient_id = %patient.patient_id, "unrecognized risk level, degrading");
                RiskLevel::AssessmentError
            }
        };

        AssessmentResult {
            patient_id: patient.patient_id.clone(),
            patient_name: patient.name.clone(),
            risk_level,
            assessment: output.assessment,
            citations,
        }
    }
}

/// A degraded result: the error sentinel with the raw text preserved for audit.
fn degraded(patient: &PatientRecord, assessment: String) -> AssessmentResult {
    AssessmentResult {
        patient_id: patient.patient_id.clone(),
        patient_name: patient.name.clone(),
        risk_level: RiskLevel::AssessmentError,
        assessment,
        citations: Vec::new(),
    }
}
