//! # Howdy Speech
//!
//! The speaking half of tts-howdy: it turns a stream of text fragments into
//! audio, one segment at a time.
//!
//! ## Pipeline
//!
//! - [`Segmenter`] buffers fragments and cuts a segment when the newest
//!   fragment carries a clause delimiter and the buffer is long enough.
//! - [`SpeechSynthesizer`] writes a WAV file for a segment. [`PiperSynthesizer`]
//!   runs the Piper command line with the text on stdin.
//! - [`OutputSink`]s are tried in priority order until one plays the file:
//!   native output through rodio (`playback` feature), then the platform's
//!   command line players.
//! - [`Speaker`] ties synthesis and playback together and owns the temporary
//!   [`AudioArtifact`]. If every sink fails the file is kept and its path
//!   reported.
//!
//! ## Example
//!
//! ```no_run
//! use howdy_speech::{AudioCapabilities, PiperConfig, Segmenter, Speaker};
//!
//! # async fn run() {
//! let speaker = Speaker::piper(PiperConfig::default(), AudioCapabilities::probe());
//! let mut segmenter = Segmenter::new();
//! for fragment in ["Howdy", " partner, ", "how are you today?"] {
//!     if let Some(segment) = segmenter.feed(fragment) {
//!         let _ = speaker.speak(segment.text()).await;
//!     }
//! }
//! if let Some(segment) = segmenter.flush() {
//!     let _ = speaker.speak(segment.text()).await;
//! }
//! # }
//! ```

pub mod artifact;
pub mod error;
pub mod segmenter;
pub mod sink;
mod speaker;
pub mod synthesis;
pub mod types;
pub mod voices;

#[cfg(feature = "playback")]
pub mod playback;

pub use artifact::AudioArtifact;
pub use error::{
    PlaybackError, PlaybackResult, SpeakerError, SpeakerResult, SynthesisError, SynthesisResult,
    VoiceError, VoiceResult,
};
pub use segmenter::{Segmenter, SpeechSegment};
pub use sink::{AudioCapabilities, CommandSink, OutputSink, Platform, default_sinks};
pub use speaker::{SpeakOutcome, Speaker};
pub use synthesis::{PiperConfig, PiperSynthesizer, SpeechSynthesizer};
pub use types::{AudioData, VoiceIdentifier};
pub use voices::{DownloadReport, PiperVoiceName, VoiceDirectory};

#[cfg(feature = "playback")]
pub use sink::NativeSink;
