//! # Howdy LLM
//!
//! Response source for tts-howdy: a thin client for a local Ollama server's
//! `/api/generate` endpoint that yields generated text as a lazy stream of
//! fragments.
//!
//! ```no_run
//! use futures::StreamExt;
//! use howdy_llm::{OllamaBuilder, ResponseSource};
//!
//! # async fn run() -> Result<(), howdy_llm::LLMError> {
//! let ollama = OllamaBuilder::new().model("tiny-cowboy").build()?;
//! let mut fragments = ollama.stream_response("Say howdy", None).await?;
//! while let Some(fragment) = fragments.next().await {
//!     print!("{}", fragment?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod error;
pub mod ndjson;
pub mod ollama;
mod source;

pub use builder::OllamaBuilder;
pub use error::{LLMError, LLMResult, UpstreamCause};
pub use ollama::Ollama;
pub use source::{FragmentStream, ResponseSource};
