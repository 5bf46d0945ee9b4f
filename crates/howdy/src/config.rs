//! Runtime configuration: defaults, optional TOML file, CLI overrides.
//!
//! ```toml
//! [ollama]
//! host = "http://localhost:11434"
//! model = "tiny-cowboy"
//! system = "You are a friendly cowboy."
//!
//! [voice]
//! model = "en_US-ryan-medium"
//! length_scale = 1.0
//! ```

use crate::error::{HowdyError, Result};
use howdy_llm::ollama::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use howdy_llm::{Ollama, OllamaBuilder};
use howdy_speech::synthesis::{DEFAULT_LENGTH_SCALE, DEFAULT_PIPER_BIN, DEFAULT_VOICE};
use howdy_speech::{AudioCapabilities, PiperConfig, Speaker, VoiceDirectory, VoiceIdentifier};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HowdyConfig {
    pub ollama: OllamaConfig,
    pub voice: VoiceConfig,
}

/// Model server settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    pub host: String,
    pub model: String,
    /// System prompt sent with every request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// Connect timeout in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// Speech engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Piper voice name or path to an `.onnx` model
    pub model: String,
    /// Speech rate; lower is faster
    pub length_scale: f32,
    pub piper_bin: String,
    /// Defaults to `~/.local/share/piper-tts/voices`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voices_dir: Option<PathBuf>,
    /// Where temporary WAV files go; defaults to the system temp dir
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_dir: Option<PathBuf>,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            system: None,
            timeout_secs: None,
        }
    }
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_VOICE.to_string(),
            length_scale: DEFAULT_LENGTH_SCALE,
            piper_bin: DEFAULT_PIPER_BIN.to_string(),
            voices_dir: None,
            artifact_dir: None,
        }
    }
}

impl HowdyConfig {
    pub fn validate(&self) -> Result<()> {
        let scale = self.voice.length_scale;
        if !scale.is_finite() || scale <= 0.0 {
            return Err(HowdyError::ConfigError(format!(
                "voice.length_scale must be a positive number, got {scale}"
            )));
        }
        if self.voice.piper_bin.trim().is_empty() {
            return Err(HowdyError::ConfigError("voice.piper_bin is empty".into()));
        }
        if self.voice.model.trim().is_empty() {
            return Err(HowdyError::ConfigError("voice.model is empty".into()));
        }
        Ok(())
    }

    pub fn build_source(&self) -> Result<Ollama> {
        let mut builder = OllamaBuilder::new()
            .base_url(&self.ollama.host)
            .model(&self.ollama.model);
        if let Some(secs) = self.ollama.timeout_secs {
            builder = builder.timeout_seconds(secs);
        }
        Ok(builder.build()?)
    }

    pub fn voice_directory(&self) -> Result<VoiceDirectory> {
        let root = match &self.voice.voices_dir {
            Some(dir) => dir.clone(),
            None => VoiceDirectory::default_root()?,
        };
        Ok(VoiceDirectory::new(root))
    }

    /// Piper settings with the voice resolved against installed models.
    pub fn piper_config(&self, voices: &VoiceDirectory) -> PiperConfig {
        PiperConfig {
            binary: self.voice.piper_bin.clone(),
            voice: VoiceIdentifier::new(voices.resolve(&self.voice.model)),
            length_scale: self.voice.length_scale,
        }
    }

    pub fn build_speaker(&self, capabilities: AudioCapabilities) -> Result<Speaker> {
        let voices = self.voice_directory()?;
        let mut speaker = Speaker::piper(self.piper_config(&voices), capabilities);
        if let Some(dir) = &self.voice.artifact_dir {
            speaker = speaker.with_artifact_dir(dir);
        }
        Ok(speaker)
    }
}

pub fn parse_toml_file<P: AsRef<Path>>(path: P) -> Result<HowdyConfig> {
    let content = std::fs::read_to_string(path)?;
    parse_toml_str(&content)
}

pub fn parse_toml_str(content: &str) -> Result<HowdyConfig> {
    let config: HowdyConfig = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}
