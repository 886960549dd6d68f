//! Embedding provider clients.
//!
//! Defines the [`EmbeddingClient`] trait and the concrete backends:
//!
//! - **[`OllamaEmbeddings`]** — calls a local Ollama server's
//!   `/api/embed` endpoint (batched `input`, vectors in input order).
//! - **[`OpenAIEmbeddings`]** — calls the OpenAI embeddings API with
//!   batching, retry, and exponential backoff.
//!
//! Use [`create_client`] to instantiate the configured backend;
//! `provider = "disabled"` yields `None` and the pipeline runs
//! lexical-only.
//!
//! # Retry Strategy (OpenAI)
//!
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)
//!
//! Every request carries the configured timeout, so no call can block
//! the indexing pipeline without a bounded deadline.

use async_trait::async_trait;
use std::time::Duration;
use tracing::warn;

use crate::config::EmbeddingConfig;
use crate::error::{Error, Result};

/// An embedding backend: opaque service turning text into vectors.
///
/// `embed_batch` must return one vector per input text, in input
/// order — positional correspondence downstream depends on it.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Returns the model identifier (e.g. `"nomic-embed-text"`).
    fn model_name(&self) -> &str;
    /// Returns the embedding vector dimensionality, if known.
    fn dims(&self) -> usize;
    /// Embed a single text (used for queries).
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
    /// Embed a batch of texts, vectors in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Create the configured [`EmbeddingClient`], or `None` when disabled.
pub fn create_client(config: &EmbeddingConfig) -> Result<Option<Box<dyn EmbeddingClient>>> {
    match config.provider.as_str() {
        "disabled" => Ok(None),
        "ollama" => Ok(Some(Box::new(OllamaEmbeddings::new(config)?))),
        "openai" => Ok(Some(Box::new(OpenAIEmbeddings::new(config)?))),
        other => Err(Error::Validation(format!(
            "unknown embedding provider: {}",
            other
        ))),
    }
}

fn http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| Error::Provider(format!("failed to build HTTP client: {}", e)))
}

// ============ Ollama ============

/// Embedding client for a local Ollama server.
pub struct OllamaEmbeddings {
    model: String,
    dims: usize,
    base_url: String,
    client: reqwest::Client,
}

impl OllamaEmbeddings {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| Error::Validation("embedding.model required for Ollama".into()))?;
        Ok(Self {
            model,
            dims: config.dims.unwrap_or(0),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client: http_client(config.timeout_secs)?,
        })
    }
}

#[async_trait]
impl EmbeddingClient for OllamaEmbeddings {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .into_iter()
            .next()
            .ok_or_else(|| Error::Provider("empty embedding response".into()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });

        let response = self
            .client
            .post(format!("{}/api/embed", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Provider(format!("Ollama request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(Error::Provider(format!(
                "Ollama API error {}: {}",
                status, body_text
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::Provider(format!("invalid Ollama response: {}", e)))?;

        parse_ollama_response(&json, texts.len())
    }
}

/// Parse the `/api/embed` response: `{"embeddings": [[f32, ...], ...]}`.
fn parse_ollama_response(json: &serde_json::Value, expected: usize) -> Result<Vec<Vec<f32>>> {
    let data = json
        .get("embeddings")
        .and_then(|d| d.as_array())
        .ok_or_else(|| Error::Provider("invalid Ollama response: missing embeddings".into()))?;

    if data.len() != expected {
        return Err(Error::Provider(format!(
            "Ollama returned {} embeddings for {} inputs",
            data.len(),
            expected
        )));
    }

    let mut embeddings = Vec::with_capacity(data.len());
    for item in data {
        let vector = item
            .as_array()
            .ok_or_else(|| Error::Provider("invalid Ollama response: non-array embedding".into()))?
            .iter()
            .map(|v| v.as_f64().unwrap_or(0.0) as f32)
            .collect();
        embeddings.push(vector);
    }
    Ok(embeddings)
}

// ============ OpenAI ============

/// Embedding client for the OpenAI embeddings API.
///
/// Requires the `OPENAI_API_KEY` environment variable.
pub struct OpenAIEmbeddings {
    model: String,
    dims: usize,
    max_retries: u32,
    client: reqwest::Client,
}

impl OpenAIEmbeddings {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| Error::Validation("embedding.model required for OpenAI".into()))?;
        if std::env::var("OPENAI_API_KEY").is_err() {
            return Err(Error::Validation(
                "OPENAI_API_KEY environment variable not set".into(),
            ));
        }
        Ok(Self {
            model,
            dims: config.dims.unwrap_or(0),
            max_retries: config.max_retries,
            client: http_client(config.timeout_secs)?,
        })
    }
}

#[async_trait]
impl EmbeddingClient for OpenAIEmbeddings {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .into_iter()
            .next()
            .ok_or_else(|| Error::Provider("empty embedding response".into()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| Error::Validation("OPENAI_API_KEY not set".into()))?;

        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s, 8s, ...
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let resp = self
                .client
                .post("https://api.openai.com/v1/embeddings")
                .header("Authorization", format!("Bearer {}", api_key))
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: serde_json::Value = response.json().await.map_err(|e| {
                            Error::Provider(format!("invalid OpenAI response: {}", e))
                        })?;
                        return parse_openai_response(&json);
                    }

                    // Rate limited or server error — retry
                    if status.as_u16() == 429 || status.is_server_error() {
                        let body_text = response.text().await.unwrap_or_default();
                        warn!(attempt, %status, "OpenAI embeddings call failed, retrying");
                        last_err = Some(Error::Provider(format!(
                            "OpenAI API error {}: {}",
                            status, body_text
                        )));
                        continue;
                    }

                    // Client error (not 429) — don't retry
                    let body_text = response.text().await.unwrap_or_default();
                    return Err(Error::Provider(format!(
                        "OpenAI API error {}: {}",
                        status, body_text
                    )));
                }
                Err(e) => {
                    last_err = Some(Error::Provider(format!("OpenAI request failed: {}", e)));
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| Error::Provider("embedding failed after retries".into())))
    }
}

/// Parse the OpenAI embeddings response, vectors in input order.
fn parse_openai_response(json: &serde_json::Value) -> Result<Vec<Vec<f32>>> {
    let data = json
        .get("data")
        .and_then(|d| d.as_array())
        .ok_or_else(|| Error::Provider("invalid OpenAI response: missing data array".into()))?;

    let mut embeddings = Vec::with_capacity(data.len());

    for item in data {
        let embedding = item
            .get("embedding")
            .and_then(|e| e.as_array())
            .ok_or_else(|| Error::Provider("invalid OpenAI response: missing embedding".into()))?;

        let vector: Vec<f32> = embedding
            .iter()
            .map(|v| v.as_f64().unwrap_or(0.0) as f32)
            .collect();

        embeddings.push(vector);
    }

    Ok(embeddings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_client_disabled() {
        let config = EmbeddingConfig::default();
        assert!(create_client(&config).unwrap().is_none());
    }

    #[test]
    fn test_create_client_unknown_provider() {
        let config = EmbeddingConfig {
            provider: "word2vec".to_string(),
            ..Default::default()
        };
        assert!(create_client(&config).is_err());
    }

    #[test]
    fn test_ollama_requires_model() {
        let config = EmbeddingConfig {
            provider: "ollama".to_string(),
            ..Default::default()
        };
        assert!(OllamaEmbeddings::new(&config).is_err());
    }

    #[test]
    fn test_parse_ollama_response() {
        let json = serde_json::json!({
            "embeddings": [[1.0, 2.0], [3.0, 4.0]]
        });
        let vectors = parse_ollama_response(&json, 2).unwrap();
        assert_eq!(vectors, vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
    }

    #[test]
    fn test_parse_ollama_response_count_mismatch() {
        let json = serde_json::json!({ "embeddings": [[1.0]] });
        assert!(parse_ollama_response(&json, 2).is_err());
    }

    #[test]
    fn test_parse_openai_response() {
        let json = serde_json::json!({
            "data": [
                { "embedding": [0.5, -0.5] },
                { "embedding": [1.5, 2.5] }
            ]
        });
        let vectors = parse_openai_response(&json).unwrap();
        assert_eq!(vectors, vec![vec![0.5, -0.5], vec![1.5, 2.5]]);
    }

    #[test]
    fn test_parse_openai_response_missing_data() {
        let json = serde_json::json!({ "error": "nope" });
        assert!(parse_openai_response(&json).is_err());
    }
}
