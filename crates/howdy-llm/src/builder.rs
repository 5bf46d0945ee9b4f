//! Builder for configuring the Ollama client.

use crate::error::{LLMError, LLMResult};
use crate::ollama::{DEFAULT_BASE_URL, DEFAULT_MODEL, Ollama};
use std::time::Duration;

/// Builder for [`Ollama`].
///
/// ```
/// use howdy_llm::builder::OllamaBuilder;
///
/// let client = OllamaBuilder::new()
///     .base_url("http://localhost:11434/")
///     .model("tiny-cowboy")
///     .build()
///     .unwrap();
/// assert_eq!(client.base_url, "http://localhost:11434");
/// ```
#[derive(Debug, Default, Clone)]
pub struct OllamaBuilder {
    base_url: Option<String>,
    model: Option<String>,
    timeout_seconds: Option<u64>,
}

impl OllamaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Server root, e.g. `http://localhost:11434`
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Connect timeout. Streaming replies are never cut off by it.
    pub fn timeout_seconds(mut self, timeout_secs: u64) -> Self {
        self.timeout_seconds = Some(timeout_secs);
        self
    }

    pub fn build(self) -> LLMResult<Ollama> {
        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim()
            .trim_end_matches('/')
            .to_string();
        reqwest::Url::parse(&base_url)
            .map_err(|e| LLMError::InvalidConfig(format!("invalid host '{}': {}", base_url, e)))?;

        let model = self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string());
        if model.trim().is_empty() {
            return Err(LLMError::InvalidConfig("model name is empty".into()));
        }

        let mut client = reqwest::Client::builder();
        if let Some(secs) = self.timeout_seconds {
            client = client.connect_timeout(Duration::from_secs(secs));
        }
        let client = client
            .build()
            .map_err(|e| LLMError::InvalidConfig(e.to_string()))?;

        Ok(Ollama::from_parts(client, base_url, model))
    }
}
