use crate::error::LLMResult;
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

/// Lazy, append-only sequence of text fragments for one reply.
///
/// The stream ends normally when the server finishes. An `Err` item means the
/// transport broke after the reply had started; no items follow it.
pub type FragmentStream = Pin<Box<dyn Stream<Item = LLMResult<String>> + Send>>;

/// Anything that can turn a prompt into a stream of generated text.
#[async_trait]
pub trait ResponseSource: Send + Sync {
    /// Open a streaming generation for `prompt`.
    ///
    /// Fails with `LLMError::UpstreamUnavailable` when the connection cannot
    /// be established or the server answers with a non-2xx status.
    async fn stream_response(&self, prompt: &str, system: Option<&str>)
    -> LLMResult<FragmentStream>;

    /// Human readable name of the model behind this source.
    fn model_name(&self) -> &str;
}
