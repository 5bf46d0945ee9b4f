use crate::types::AudioData;
use rodio::{OutputStream, OutputStreamBuilder, Sink};

#[derive(Debug, thiserror::Error)]
pub enum AudioPlayerError {
    #[error("Failed to initialize audio output stream")]
    InitFailed,
}

/// Blocking player on the default output device
pub struct AudioPlayer {
    _stream: OutputStream,
    sink: Sink,
}

impl AudioPlayer {
    /// Open the default output device.
    pub fn try_new() -> Result<Self, AudioPlayerError> {
        let stream = match OutputStreamBuilder::open_default_stream() {
            Ok(s) => s,
            Err(e) => {
                log::debug!("No default audio output: {}", e);
                return Err(AudioPlayerError::InitFailed);
            }
        };

        let sink = Sink::connect_new(stream.mixer());

        Ok(AudioPlayer {
            _stream: stream,
            sink,
        })
    }

    /// Queue decoded audio for playback
    pub fn play(&self, audio: AudioData) {
        let source = rodio::buffer::SamplesBuffer::new(
            audio.channels as u16,
            audio.sample_rate,
            audio.samples,
        );
        self.sink.append(source);
    }

    /// Block until everything queued has been played
    pub fn wait_until_end(&self) {
        self.sink.sleep_until_end();
    }
}

/// Whether a default output device can be opened right now.
pub fn native_output_available() -> bool {
    AudioPlayer::try_new().is_ok()
}
