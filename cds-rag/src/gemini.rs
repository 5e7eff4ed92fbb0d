//! Gemini embedding provider over the Generative Language REST API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

/// Base URL of the Generative Language API.
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// The default embedding model.
const DEFAULT_MODEL: &str = "gemini-embedding-001";

/// Default dimensionality for `gemini-embedding-001`.
const DEFAULT_DIMENSIONS: usize = 3072;

/// An [`EmbeddingProvider`] backed by the Gemini embedding API.
///
/// Uses `reqwest` to call the `:embedContent` and `:batchEmbedContents`
/// endpoints directly.
///
/// # Configuration
///
/// - `model` – defaults to `gemini-embedding-001`.
/// - `output_dimensionality` – optional truncation of the output vector.
/// - `api_key` – from the constructor or the `GOOGLE_API_KEY` environment
///   variable.
pub struct GeminiEmbeddings {
    client: reqwest::Client,
    api_key: String,
    model: String,
    dimensions: usize,
    /// If set, passed to the API to truncate the output vector.
    output_dimensionality: Option<usize>,
}

impl GeminiEmbeddings {
    /// Create a new provider with the given API key and the default model.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(RagError::EmbeddingError {
                provider: "Gemini".into(),
                message: "API key must not be empty".into(),
            });
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model: DEFAULT_MODEL.into(),
            dimensions: DEFAULT_DIMENSIONS,
            output_dimensionality: None,
        })
    }

    /// Create a new provider using the `GOOGLE_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GOOGLE_API_KEY").map_err(|_| RagError::EmbeddingError {
            provider: "Gemini".into(),
            message: "GOOGLE_API_KEY environment variable not set".into(),
        })?;
        Self::new(api_key)
    }

    /// Set the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the output dimensionality (truncates the embedding vector).
    ///
    /// This also updates the value reported by
    /// [`dimensions()`](EmbeddingProvider::dimensions).
    pub fn with_output_dimensionality(mut self, dims: usize) -> Self {
        self.dimensions = dims;
        self.output_dimensionality = Some(dims);
        self
    }

    fn request_for<'a>(&'a self, text: &'a str) -> EmbedRequest<'a> {
        EmbedRequest {
            model: format!("models/{}", self.model),
            content: ContentPayload { parts: vec![TextPart { text }] },
            output_dimensionality: self.output_dimensionality,
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);

        error!(provider = "Gemini", %status, "embedding API error");
        Err(RagError::EmbeddingError {
            provider: "Gemini".into(),
            message: format!("API returned {status}: {detail}"),
        })
    }

    fn transport_err(e: reqwest::Error) -> RagError {
        error!(provider = "Gemini", error = %e, "embedding request failed");
        RagError::EmbeddingError { provider: "Gemini".into(), message: format!("request failed: {e}") }
    }

    fn decode_err(e: reqwest::Error) -> RagError {
        error!(provider = "Gemini", error = %e, "failed to parse embedding response");
        RagError::EmbeddingError {
            provider: "Gemini".into(),
            message: format!("failed to parse response: {e}"),
        }
    }
}

// ── Gemini API request/response types ──────────────────────────────

#[derive(Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct ContentPayload<'a> {
    parts: Vec<TextPart<'a>>,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: String,
    content: ContentPayload<'a>,
    #[serde(rename = "outputDimensionality", skip_serializing_if = "Option::is_none")]
    output_dimensionality: Option<usize>,
}

#[derive(Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<EmbedRequest<'a>>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: EmbeddingValues,
}

#[derive(Deserialize)]
struct BatchEmbedResponse {
    embeddings: Vec<EmbeddingValues>,
}

#[derive(Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

// ── EmbeddingProvider implementation ───────────────────────────────

#[async_trait]
impl EmbeddingProvider for GeminiEmbeddings {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(provider = "Gemini", text_len = text.len(), "embedding single text");

        let url = format!("{GEMINI_BASE_URL}/models/{}:embedContent", self.model);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&self.request_for(text))
            .send()
            .await
            .map_err(Self::transport_err)?;

        let response = Self::check_status(response).await?;
        let parsed: EmbedResponse = response.json().await.map_err(Self::decode_err)?;
        Ok(parsed.embedding.values)
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(provider = "Gemini", batch_size = texts.len(), model = %self.model, "embedding batch");

        let url = format!("{GEMINI_BASE_URL}/models/{}:batchEmbedContents", self.model);
        let body = BatchEmbedRequest {
            requests: texts.iter().map(|&text| self.request_for(text)).collect(),
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(Self::transport_err)?;

        let response = Self::check_status(response).await?;
        let parsed: BatchEmbedResponse = response.json().await.map_err(Self::decode_err)?;
        Ok(parsed.embeddings.into_iter().map(|e| e.values).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_api_key_is_rejected() {
        assert!(matches!(GeminiEmbeddings::new(""), Err(RagError::EmbeddingError { .. })));
    }

    #[test]
    fn output_dimensionality_updates_reported_dimensions() {
        let provider = GeminiEmbeddings::new("key").unwrap().with_output_dimensionality(768);
        assert_eq!(provider.dimensions(), 768);
    }

    #[test]
    fn embed_request_serializes_the_wire_shape() {
        let provider = GeminiEmbeddings::new("key").unwrap();
        let body = serde_json::to_value(provider.request_for("breast lump")).unwrap();
        assert_eq!(body["model"], "models/gemini-embedding-001");
        assert_eq!(body["content"]["parts"][0]["text"], "breast lump");
        assert!(body.get("outputDimensionality").is_none());
    }
}
