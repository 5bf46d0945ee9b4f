use std::path::PathBuf;
use thiserror::Error;

/// Errors from the external synthesis engine
#[derive(Error, Debug)]
pub enum SynthesisError {
    /// Engine binary could not be found on PATH
    #[error(
        "Speech engine '{0}' not found\nSuggestion: install Piper (`pip install piper-tts`) or point voice.piper_bin at the binary"
    )]
    EngineNotFound(String),

    /// Engine could not be started
    #[error("Failed to launch speech engine '{0}': {1}")]
    Launch(String, #[source] std::io::Error),

    /// Writing the segment text to the engine failed
    #[error("Failed to send text to speech engine: {0}")]
    Stdin(#[source] std::io::Error),

    /// Engine exited with a non-zero status
    #[error("Speech engine exited with {code}: {stderr}")]
    EngineFailed { code: String, stderr: String },
}

/// Errors from a single output sink attempt
#[derive(Error, Debug)]
pub enum PlaybackError {
    /// Native audio is not compiled in or no output device was found
    #[error("Native audio output is unavailable")]
    NativeUnavailable,

    #[error("Failed to decode audio artifact: {0}")]
    Decode(#[from] hound::Error),

    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    #[error("Audio device error: {0}")]
    Device(String),

    /// Player binary is not installed
    #[error("Player '{0}' is not installed")]
    PlayerNotInstalled(String),

    /// Player ran but reported failure
    #[error("Player '{player}' exited with {code}: {stderr}")]
    PlayerFailed {
        player: String,
        code: String,
        stderr: String,
    },

    #[error("Playback task failed: {0}")]
    Join(String),

    #[error("IO error during playback: {0}")]
    Io(#[from] std::io::Error),
}

/// Outcome of a failed `Speaker::speak`
#[derive(Error, Debug)]
pub enum SpeakerError {
    /// Engine missing, bad exit or broken voice model. The segment is skipped.
    #[error("Speech synthesis failed: {0}")]
    SynthesisFailed(#[from] SynthesisError),

    /// Every sink failed. The artifact was kept on disk for the user.
    #[error("No audio output succeeded; audio kept at {}", .artifact.display())]
    PlaybackUnavailable {
        artifact: PathBuf,
        attempts: Vec<(String, PlaybackError)>,
    },

    /// Temporary audio file could not be created
    #[error("Failed to create audio artifact: {0}")]
    Artifact(#[source] std::io::Error),
}

/// Errors from voice model management
#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("Invalid Piper voice name '{0}' (expected <lang>_<REGION>-<speaker>-<quality>)")]
    InvalidVoiceName(String),

    #[error("Could not determine home directory for voice storage")]
    NoHomeDir,

    #[error("Download of {url} failed: {reason}")]
    Download { url: String, reason: String },

    #[error("IO error for {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type SynthesisResult<T> = Result<T, SynthesisError>;
pub type PlaybackResult<T> = Result<T, PlaybackError>;
pub type SpeakerResult<T> = Result<T, SpeakerError>;
pub type VoiceResult<T> = Result<T, VoiceError>;
