//! Synthesis followed by playback through the first sink that works.

use crate::artifact::AudioArtifact;
use crate::error::{SpeakerError, SpeakerResult};
use crate::sink::{AudioCapabilities, OutputSink, default_sinks};
use crate::synthesis::{PiperConfig, PiperSynthesizer, SpeechSynthesizer};
use std::path::PathBuf;
use std::sync::Arc;

/// What `Speaker::speak` did with a segment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpeakOutcome {
    /// Blank text, nothing was synthesized
    Skipped,
    /// Audio was played by the named sink
    Played { sink: String },
}

/// Speaks one segment at a time.
///
/// `speak` only returns once playback has finished (or failed), so awaiting
/// it before the next call keeps audio strictly ordered and non-overlapping.
pub struct Speaker {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    sinks: Vec<Arc<dyn OutputSink>>,
    capabilities: AudioCapabilities,
    artifact_dir: Option<PathBuf>,
}

impl Speaker {
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>, capabilities: AudioCapabilities) -> Self {
        Self {
            synthesizer,
            sinks: default_sinks(),
            capabilities,
            artifact_dir: None,
        }
    }

    /// Piper synthesis with the default sink chain.
    pub fn piper(config: PiperConfig, capabilities: AudioCapabilities) -> Self {
        Self::new(Arc::new(PiperSynthesizer::new(config)), capabilities)
    }

    /// Replace the sink chain. Order is priority order.
    pub fn with_sinks(mut self, sinks: Vec<Arc<dyn OutputSink>>) -> Self {
        self.sinks = sinks;
        self
    }

    /// Create artifacts in `dir` instead of the system temp dir.
    pub fn with_artifact_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifact_dir = Some(dir.into());
        self
    }

    /// Names of the sinks that would be tried, in order.
    pub fn active_sinks(&self) -> Vec<&str> {
        self.sinks
            .iter()
            .filter(|s| s.supports(&self.capabilities))
            .map(|s| s.name())
            .collect()
    }

    /// Synthesize `text` and play it, blocking until playback completes.
    ///
    /// On `PlaybackUnavailable` the audio file is left on disk and its path
    /// is carried in the error.
    pub async fn speak(&self, text: &str) -> SpeakerResult<SpeakOutcome> {
        if text.trim().is_empty() {
            return Ok(SpeakOutcome::Skipped);
        }

        let artifact =
            AudioArtifact::create(self.artifact_dir.as_deref()).map_err(SpeakerError::Artifact)?;

        // On failure the artifact is dropped, which removes the partial file.
        self.synthesizer.synthesize(text, artifact.path()).await?;

        let mut attempts = Vec::new();
        for sink in self.sinks.iter().filter(|s| s.supports(&self.capabilities)) {
            match sink.play(artifact.path()).await {
                Ok(()) => {
                    let path = artifact.path().to_path_buf();
                    if let Err(e) = artifact.delete() {
                        log::warn!("Could not delete {}: {}", path.display(), e);
                    }
                    return Ok(SpeakOutcome::Played {
                        sink: sink.name().to_string(),
                    });
                }
                Err(e) => {
                    log::debug!("Sink '{}' failed: {}", sink.name(), e);
                    attempts.push((sink.name().to_string(), e));
                }
            }
        }

        let artifact = artifact.retain().map_err(SpeakerError::Artifact)?;
        Err(SpeakerError::PlaybackUnavailable { artifact, attempts })
    }
}
