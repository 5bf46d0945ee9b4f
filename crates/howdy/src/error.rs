use thiserror::Error;

#[derive(Error, Debug)]
pub enum HowdyError {
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("LLM error: {0}")]
    LLMError(#[from] howdy_llm::LLMError),

    #[error("Voice error: {0}")]
    VoiceError(#[from] howdy_speech::VoiceError),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, HowdyError>;
