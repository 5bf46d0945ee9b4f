//! Text-to-speech through an external Piper process.

use crate::error::{SynthesisError, SynthesisResult};
use crate::types::VoiceIdentifier;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

pub const DEFAULT_PIPER_BIN: &str = "piper";
pub const DEFAULT_VOICE: &str = "en_US-ryan-medium";
pub const DEFAULT_LENGTH_SCALE: f32 = 1.0;

/// Converts text into a WAV file at a given path.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` into `output`. Returns once the file is complete.
    async fn synthesize(&self, text: &str, output: &Path) -> SynthesisResult<()>;

    fn name(&self) -> &str;
}

/// Settings for the Piper command line
#[derive(Clone, Debug)]
pub struct PiperConfig {
    /// Binary to execute
    pub binary: String,
    /// Voice name or `.onnx` path passed as `--model`
    pub voice: VoiceIdentifier,
    /// Passed as `--length-scale`; lower is faster speech
    pub length_scale: f32,
}

impl Default for PiperConfig {
    fn default() -> Self {
        Self {
            binary: DEFAULT_PIPER_BIN.to_string(),
            voice: VoiceIdentifier::new(DEFAULT_VOICE),
            length_scale: DEFAULT_LENGTH_SCALE,
        }
    }
}

/// Runs `piper --model <voice> --output_file <path> --length-scale <scale>`
/// with the text on stdin.
#[derive(Clone, Debug, Default)]
pub struct PiperSynthesizer {
    config: PiperConfig,
}

impl PiperSynthesizer {
    pub fn new(config: PiperConfig) -> Self {
        Self { config }
    }

    fn command(&self, output: &Path) -> Command {
        let mut cmd = Command::new(&self.config.binary);
        cmd.arg("--model")
            .arg(self.config.voice.name())
            .arg("--output_file")
            .arg(output)
            .arg("--length-scale")
            .arg(self.config.length_scale.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl SpeechSynthesizer for PiperSynthesizer {
    async fn synthesize(&self, text: &str, output: &Path) -> SynthesisResult<()> {
        let mut child = self.command(output).spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SynthesisError::EngineNotFound(self.config.binary.clone())
            } else {
                SynthesisError::Launch(self.config.binary.clone(), e)
            }
        })?;

        if let Some(mut stdin) = child.stdin.take() {
            let written = stdin.write_all(text.as_bytes()).await;
            // Close stdin so the engine sees end of input.
            drop(stdin);
            if let Err(e) = written {
                // Engine may have exited early; its status below says more.
                log::debug!("Writing to {} stdin failed: {}", self.config.binary, e);
                let output = child.wait_with_output().await.map_err(SynthesisError::Stdin)?;
                if output.status.success() {
                    return Err(SynthesisError::Stdin(e));
                }
                return Err(engine_failed(&output.status, &output.stderr));
            }
        }

        let result = child
            .wait_with_output()
            .await
            .map_err(|e| SynthesisError::Launch(self.config.binary.clone(), e))?;

        if !result.status.success() {
            return Err(engine_failed(&result.status, &result.stderr));
        }

        log::debug!(
            "Synthesized {} chars with voice {} into {}",
            text.chars().count(),
            self.config.voice,
            output.display()
        );
        Ok(())
    }

    fn name(&self) -> &str {
        &self.config.binary
    }
}

fn engine_failed(status: &std::process::ExitStatus, stderr: &[u8]) -> SynthesisError {
    SynthesisError::EngineFailed {
        code: status
            .code()
            .map(|c| format!("exit code {c}"))
            .unwrap_or_else(|| "a signal".to_string()),
        stderr: String::from_utf8_lossy(stderr).trim().to_string(),
    }
}
