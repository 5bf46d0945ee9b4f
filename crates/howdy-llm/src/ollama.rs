//! Ollama `/api/generate` client.
//!
//! Requests are JSON bodies of the form `{model, prompt, system?, stream}`.
//! Streaming replies are newline-delimited JSON objects whose `response`
//! field carries the next fragment of generated text.

use crate::error::{LLMError, LLMResult};
use crate::ndjson::{GenerateChunk, LineBuffer, parse_line};
use crate::source::{FragmentStream, ResponseSource};
use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::Serialize;
use std::collections::VecDeque;
use std::pin::Pin;

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "tiny-cowboy";
const NO_RESPONSE: &str = "No response generated";

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    stream: bool,
}

/// Client for a local Ollama server
#[derive(Debug, Clone)]
pub struct Ollama {
    client: reqwest::Client,
    pub base_url: String,
    pub model: String,
}

impl Ollama {
    pub(crate) fn from_parts(client: reqwest::Client, base_url: String, model: String) -> Self {
        Self {
            client,
            base_url,
            model,
        }
    }

    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.base_url)
    }

    async fn post_generate(
        &self,
        url: &str,
        prompt: &str,
        system: Option<&str>,
        stream: bool,
    ) -> LLMResult<reqwest::Response> {
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            system,
            stream,
        };

        log::debug!(
            "POST {} (model={}, stream={}, prompt_len={})",
            url,
            self.model,
            stream,
            prompt.len()
        );

        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| LLMError::transport(url, e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            return Err(LLMError::status(url, status, body));
        }

        Ok(response)
    }

    /// Single round trip with `stream: false`, returning the whole reply.
    pub async fn generate(&self, prompt: &str, system: Option<&str>) -> LLMResult<String> {
        let url = self.generate_url();
        let response = self.post_generate(&url, prompt, system, false).await?;
        let body = response
            .text()
            .await
            .map_err(|e| LLMError::transport(&url, e))?;

        let chunk: GenerateChunk =
            serde_json::from_str(&body).map_err(|e| LLMError::InvalidResponse(e.to_string()))?;
        Ok(chunk.response.unwrap_or_else(|| NO_RESPONSE.to_string()))
    }

    /// Streaming generation, one fragment per decoded NDJSON line.
    pub async fn generate_stream(
        &self,
        prompt: &str,
        system: Option<&str>,
    ) -> LLMResult<FragmentStream> {
        let url = self.generate_url();
        let response = self.post_generate(&url, prompt, system, true).await?;
        Ok(fragment_stream(Box::pin(response.bytes_stream()), url))
    }
}

#[async_trait]
impl ResponseSource for Ollama {
    async fn stream_response(
        &self,
        prompt: &str,
        system: Option<&str>,
    ) -> LLMResult<FragmentStream> {
        self.generate_stream(prompt, system).await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

type ByteStream = Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>>;

struct DecodeState {
    bytes: ByteStream,
    lines: LineBuffer,
    ready: VecDeque<String>,
    url: String,
    finished: bool,
}

fn fragment_stream(bytes: ByteStream, url: String) -> FragmentStream {
    let state = DecodeState {
        bytes,
        lines: LineBuffer::new(),
        ready: VecDeque::new(),
        url,
        finished: false,
    };

    let stream = futures::stream::unfold(state, |mut st| async move {
        loop {
            if let Some(fragment) = st.ready.pop_front() {
                return Some((Ok(fragment), st));
            }
            if st.finished {
                return None;
            }

            match st.bytes.next().await {
                Some(Ok(chunk)) => {
                    st.ready
                        .extend(st.lines.push(&chunk).iter().filter_map(|l| parse_line(l)));
                }
                Some(Err(e)) => {
                    st.finished = true;
                    log::warn!("Stream from {} broke off: {}", st.url, e);
                    let err = LLMError::transport(&st.url, e);
                    return Some((Err(err), st));
                }
                None => {
                    st.finished = true;
                    if let Some(fragment) = st.lines.finish().as_deref().and_then(parse_line) {
                        st.ready.push_back(fragment);
                    }
                }
            }
        }
    });

    Box::pin(stream)
}
