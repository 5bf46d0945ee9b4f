//! Temporary WAV files produced by the synthesis engine.

use crate::error::{PlaybackError, PlaybackResult};
use crate::types::AudioData;
use std::path::{Path, PathBuf};
use tempfile::TempPath;

/// A synthesized audio file owned by the speaker.
///
/// Dropping the artifact deletes the file. [`AudioArtifact::retain`] hands
/// the file over to the user instead.
#[derive(Debug)]
pub struct AudioArtifact {
    path: TempPath,
}

impl AudioArtifact {
    /// Reserve a fresh `howdy-*.wav` path, in `dir` or the system temp dir.
    pub fn create(dir: Option<&Path>) -> std::io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("howdy-").suffix(".wav");
        let file = match dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        Ok(Self {
            path: file.into_temp_path(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file now, reporting failure.
    pub fn delete(self) -> std::io::Result<()> {
        self.path.close()
    }

    /// Keep the file on disk and return its location.
    pub fn retain(self) -> std::io::Result<PathBuf> {
        self.path.keep().map_err(|e| e.error)
    }
}

/// Decode a WAV file into normalized `f32` samples.
pub fn read_wav(path: &Path) -> PlaybackResult<AudioData> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Int => match spec.bits_per_sample {
            16 => reader
                .samples::<i16>()
                .map(|s| s.map(|v| v as f32 / i16::MAX as f32))
                .collect::<Result<_, _>>()?,
            32 => reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / i32::MAX as f32))
                .collect::<Result<_, _>>()?,
            bits => {
                return Err(PlaybackError::UnsupportedFormat(format!(
                    "unsupported bit depth: {bits}"
                )));
            }
        },
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
    };

    Ok(AudioData {
        samples,
        channels: spec.channels as usize,
        sample_rate: spec.sample_rate,
    })
}
