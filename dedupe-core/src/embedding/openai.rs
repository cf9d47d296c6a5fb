use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Embedding, EmbeddingProvider};
use crate::error::{DedupeError, Result};

const OPENAI_EMBEDDINGS_URL: &str = "https://api.openai.com/v1/embeddings";
const DEFAULT_MODEL: &str = "text-embedding-3-large";
const DEFAULT_DIMENSIONS: usize = 3072;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// OpenAI-backed embedding provider. The client is built once at
/// construction and reused for every call — a fresh client per request
/// would re-pay TLS/connection setup on every claim.
pub struct OpenAiEmbeddingProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    dimensions: usize,
}

impl OpenAiEmbeddingProvider {
    pub fn new(api_key: String) -> anyhow::Result<Self> {
        Self::with_model(api_key, DEFAULT_MODEL.to_string(), DEFAULT_DIMENSIONS)
    }

    pub fn with_model(api_key: String, model: String, dimensions: usize) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            api_key,
            model,
            dimensions,
        })
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Embedding> {
        let body = EmbeddingRequest {
            model: &self.model,
            input: text,
        };

        let response = self
            .client
            .post(OPENAI_EMBEDDINGS_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| DedupeError::EmbeddingFailure(format!("openai request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(DedupeError::EmbeddingFailure(format!(
                "openai returned {status}: {detail}"
            )));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| DedupeError::EmbeddingFailure(format!("openai response decode: {e}")))?;

        let vector = parsed
            .data
            .into_iter()
            .next()
            .ok_or_else(|| DedupeError::EmbeddingFailure("openai returned no embeddings".into()))?
            .embedding;

        if vector.len() != self.dimensions {
            return Err(DedupeError::EmbeddingFailure(format!(
                "openai returned {} dimensions, expected {}",
                vector.len(),
                self.dimensions
            )));
        }

        Ok(Embedding {
            vector,
            model: self.model.clone(),
            provider: "openai",
        })
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}
