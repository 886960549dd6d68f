//! Generation provider client, strictly downstream of context assembly.
//!
//! The [`GenerationClient`] trait wraps an opaque text generator; the
//! concrete backend is a local Ollama server's `/api/generate`
//! endpoint (non-streaming). [`build_prompt`] formats the assembled
//! context and the user question into a single prompt string.

use async_trait::async_trait;
use std::time::Duration;

use crate::config::GenerationConfig;
use crate::error::{Error, Result};

/// An opaque text generator consuming a prompt and returning text.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Returns the model identifier (e.g. `"phi3"`).
    fn model_name(&self) -> &str;
    /// Generate a completion for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Create the configured [`GenerationClient`], or `None` when disabled.
pub fn create_client(config: &GenerationConfig) -> Result<Option<Box<dyn GenerationClient>>> {
    match config.provider.as_str() {
        "disabled" => Ok(None),
        "ollama" => Ok(Some(Box::new(OllamaGenerator::new(config)?))),
        other => Err(Error::Validation(format!(
            "unknown generation provider: {}",
            other
        ))),
    }
}

/// Format assembled context plus the user question for the model.
///
/// With empty context the question is passed through alone, so the
/// generator still answers (unassisted) when the corpus has nothing
/// relevant.
pub fn build_prompt(context: &str, question: &str) -> String {
    if context.is_empty() {
        return question.to_string();
    }
    format!(
        "Answer the question using the context below.\n\n\
         Context:\n{}\n\nQuestion: {}\nAnswer:",
        context, question
    )
}

/// Generation client for a local Ollama server.
pub struct OllamaGenerator {
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl OllamaGenerator {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| Error::Validation("generation.model required for Ollama".into()))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Provider(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            model,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl GenerationClient for OllamaGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
        });

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
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

        Ok(json
            .get("response")
            .and_then(|r| r.as_str())
            .unwrap_or_default()
            .trim()
            .to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_client_disabled() {
        assert!(create_client(&GenerationConfig::default()).unwrap().is_none());
    }

    #[test]
    fn test_ollama_requires_model() {
        let config = GenerationConfig {
            provider: "ollama".to_string(),
            ..Default::default()
        };
        assert!(OllamaGenerator::new(&config).is_err());
    }

    #[test]
    fn test_build_prompt_with_context() {
        let prompt = build_prompt("[From: notes]\nRust is fast.", "Is Rust fast?");
        assert!(prompt.contains("Context:"));
        assert!(prompt.contains("[From: notes]"));
        assert!(prompt.ends_with("Answer:"));
    }

    #[test]
    fn test_build_prompt_without_context() {
        assert_eq!(build_prompt("", "Is Rust fast?"), "Is Rust fast?");
    }
}
