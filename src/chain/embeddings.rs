use std::env;

use serde::{Deserialize, Serialize};

use crate::chain::http::{RequestPolicy, decode_json, send_json_request};
use crate::chain::provider::{Provider, ProviderError, api_key_env, embeddings_endpoint};

#[derive(Debug, Serialize)]
struct EmbeddingsRequest {
    model: String,
    input: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingPayload>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingPayload {
    embedding: Vec<f64>,
}

/// Embeddings client returning dense vectors for input texts.
#[derive(Debug, Clone)]
pub struct EmbeddingsClient {
    provider: Provider,
    model: String,
    dimensions: Option<u32>,
    timeout_secs: Option<u64>,
}

impl EmbeddingsClient {
    pub fn new(provider: Provider, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            dimensions: None,
            timeout_secs: None,
        }
    }

    pub fn with_dimensions(mut self, dimensions: Option<u32>) -> Self {
        self.dimensions = dimensions;
        self
    }

    pub fn with_timeout(mut self, timeout_secs: Option<u64>) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Embeds a single query string and returns its vector.
    pub async fn embed_query(&self, input: &str) -> Result<Vec<f64>, ProviderError> {
        let vectors = self.embed_documents(&[input.to_string()]).await?;
        vectors
            .into_iter()
            .next()
            .ok_or(ProviderError::EmptyResponse {
                provider: self.provider,
            })
    }

    /// Embeds every document and returns the vectors in input order.
    pub async fn embed_documents(
        &self,
        documents: &[String],
    ) -> Result<Vec<Vec<f64>>, ProviderError> {
        let provider = self.provider;
        let key_env = api_key_env(provider);
        let api_key =
            env::var(key_env).map_err(|_| ProviderError::MissingApiKey { key_env, provider })?;

        let payload = EmbeddingsRequest {
            model: self.model.clone(),
            input: documents.to_vec(),
            dimensions: self.dimensions,
        };

        let client = reqwest::Client::new();
        let response = send_json_request(
            &client,
            embeddings_endpoint(provider),
            &api_key,
            &payload,
            provider,
            RequestPolicy {
                timeout_secs: self.timeout_secs,
                ..RequestPolicy::default()
            },
        )
        .await?;

        let body: EmbeddingsResponse = decode_json(response, provider).await?;
        if body.data.len() != documents.len() {
            return Err(ProviderError::EmptyResponse { provider });
        }

        Ok(body.data.into_iter().map(|item| item.embedding).collect())
    }
}

/// Cosine similarity between two vectors. Mismatched lengths and zero
/// magnitudes score 0.0 rather than erroring.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let magnitude_b: f64 = b.iter().map(|y| y * y).sum::<f64>().sqrt();
    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }
    dot / (magnitude_a * magnitude_b)
}
