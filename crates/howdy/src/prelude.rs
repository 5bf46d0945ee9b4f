//! tts-howdy prelude: the types most callers need.

pub use crate::config::HowdyConfig;
pub use crate::orchestrator::{Interrupt, Orchestrator};
pub use howdy_llm::{LLMError, Ollama, OllamaBuilder, ResponseSource};
pub use howdy_speech::{
    AudioCapabilities, OutputSink, Segmenter, SpeakOutcome, Speaker, SpeakerError,
    SpeechSynthesizer,
};
