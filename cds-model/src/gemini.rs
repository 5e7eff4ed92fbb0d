//! Gemini generation client over the Generative Language REST API.

use async_trait::async_trait;
use cds_core::{CdsError, GenerativeModel, MessageRole, ModelMessage, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

/// Base URL of the Generative Language API.
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// The default generation model.
const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Low temperature: answers must stay close to the retrieved text.
const DEFAULT_TEMPERATURE: f32 = 0.1;

/// A [`GenerativeModel`] backed by the Gemini `generateContent` endpoint.
///
/// System messages are mapped to the request's `systemInstruction`; user and
/// assistant turns become `user`/`model` contents. One request per
/// [`complete`](GenerativeModel::complete) call, no retries.
pub struct GeminiModel {
    client: reqwest::Client,
    api_key: String,
    model: String,
    temperature: f32,
}

impl GeminiModel {
    /// Create a new client with the given API key and model name.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(CdsError::Upstream {
                service: "gemini".into(),
                message: "API key must not be empty".into(),
            });
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model: model.into(),
            temperature: DEFAULT_TEMPERATURE,
        })
    }

    /// Create a client from `GOOGLE_API_KEY`, with the model name taken from
    /// `GEMINI_MODEL` when set.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GOOGLE_API_KEY").map_err(|_| CdsError::Upstream {
            service: "gemini".into(),
            message: "GOOGLE_API_KEY environment variable not set".into(),
        })?;
        let model = std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Self::new(api_key, model)
    }

    /// Override the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    fn build_request(&self, messages: &[ModelMessage]) -> GenerateContentRequest {
        let mut system_parts: Vec<String> = Vec::new();
        let mut contents = Vec::new();

        for message in messages {
            match message.role {
                MessageRole::System => system_parts.push(message.content.clone()),
                MessageRole::User => contents.push(Content {
                    role: "user",
                    parts: vec![Part { text: message.content.clone() }],
                }),
                MessageRole::Assistant => contents.push(Content {
                    role: "model",
                    parts: vec![Part { text: message.content.clone() }],
                }),
            }
        }

        let system_instruction = if system_parts.is_empty() {
            None
        } else {
            Some(SystemInstruction { parts: vec![Part { text: system_parts.join("\n\n") }] })
        };

        GenerateContentRequest {
            system_instruction,
            contents,
            generation_config: GenerationConfig { temperature: self.temperature },
        }
    }
}

// ── Gemini API request/response types ──────────────────────────────

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Serialize)]
struct GenerateContentRequest {
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

fn upstream(message: impl Into<String>) -> CdsError {
    CdsError::Upstream { service: "gemini".into(), message: message.into() }
}

// ── GenerativeModel implementation ─────────────────────────────────

#[async_trait]
impl GenerativeModel for GeminiModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, messages: &[ModelMessage]) -> Result<String> {
        debug!(model = %self.model, turns = messages.len(), "generation request");

        let url = format!("{GEMINI_BASE_URL}/models/{}:generateContent", self.model);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&self.build_request(messages))
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "generation request failed");
                upstream(format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);

            error!(%status, "generation API error");
            return Err(upstream(format!("API returned {status}: {detail}")));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|e| {
            error!(error = %e, "failed to parse generation response");
            upstream(format!("failed to parse response: {e}"))
        })?;

        let candidate =
            parsed.candidates.into_iter().next().ok_or_else(|| upstream("no candidates returned"))?;
        let text: String =
            candidate.content.parts.into_iter().map(|p| p.text).collect::<Vec<_>>().join("");

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_api_key_is_rejected() {
        assert!(GeminiModel::new("", "gemini-1.5-flash").is_err());
    }

    #[test]
    fn request_maps_roles_and_system_instruction() {
        let model = GeminiModel::new("key", "gemini-1.5-flash").unwrap();
        let messages = [
            ModelMessage::system("Answer only from the provided context."),
            ModelMessage::user("What is the referral criterion?"),
            ModelMessage::assistant("{\"answer\": \"...\"}"),
            ModelMessage::user("And for haemoptysis?"),
        ];

        let body = serde_json::to_value(model.build_request(&messages)).unwrap();
        assert_eq!(
            body["systemInstruction"]["parts"][0]["text"],
            "Answer only from the provided context."
        );
        assert_eq!(body["contents"].as_array().unwrap().len(), 3);
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["contents"][2]["role"], "user");
        assert!((body["generationConfig"]["temperature"].as_f64().unwrap() - 0.1).abs() < 1e-6);
    }
}
