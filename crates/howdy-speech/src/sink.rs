//! Output sinks tried in order until one plays the artifact.
//!
//! The capability probe runs once at startup and is handed to the speaker,
//! so tests can inject any platform/device combination.

use crate::error::{PlaybackError, PlaybackResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;

/// Operating system family used to pick command line players.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Platform {
    MacOs,
    Linux,
    Windows,
    Other,
}

impl Platform {
    pub fn current() -> Self {
        match std::env::consts::OS {
            "macos" => Platform::MacOs,
            "linux" => Platform::Linux,
            "windows" => Platform::Windows,
            _ => Platform::Other,
        }
    }
}

/// What this process can use for audio output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudioCapabilities {
    pub platform: Platform,
    /// A native output device opened successfully during the probe
    pub native_output: bool,
}

impl AudioCapabilities {
    pub fn new(platform: Platform, native_output: bool) -> Self {
        Self {
            platform,
            native_output,
        }
    }

    /// Detect the platform and try to open the default output device.
    pub fn probe() -> Self {
        let caps = Self::new(Platform::current(), probe_native_output());
        log::debug!("Audio capabilities: {:?}", caps);
        caps
    }
}

#[cfg(feature = "playback")]
fn probe_native_output() -> bool {
    crate::playback::native_output_available()
}

#[cfg(not(feature = "playback"))]
fn probe_native_output() -> bool {
    false
}

/// A way of playing a WAV file to the user.
#[async_trait]
pub trait OutputSink: Send + Sync {
    fn name(&self) -> &str;

    /// Can this sink attempt playback given `caps`?
    fn supports(&self, caps: &AudioCapabilities) -> bool;

    /// Play the file at `path`, returning once playback has finished.
    async fn play(&self, path: &Path) -> PlaybackResult<()>;
}

/// Plays through the default device via rodio.
#[cfg(feature = "playback")]
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeSink;

#[cfg(feature = "playback")]
#[async_trait]
impl OutputSink for NativeSink {
    fn name(&self) -> &str {
        "native"
    }

    fn supports(&self, caps: &AudioCapabilities) -> bool {
        caps.native_output
    }

    async fn play(&self, path: &Path) -> PlaybackResult<()> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || {
            let audio = crate::artifact::read_wav(&path)?;
            log::debug!(
                "Playing {} ms of audio at {} Hz",
                audio.duration_ms(),
                audio.sample_rate
            );
            let player = crate::playback::AudioPlayer::try_new()
                .map_err(|e| PlaybackError::Device(e.to_string()))?;
            player.play(audio);
            player.wait_until_end();
            Ok(())
        })
        .await
        .map_err(|e| PlaybackError::Join(e.to_string()))?
    }
}

/// Plays by running an external player with the file path as last argument.
#[derive(Debug, Clone)]
pub struct CommandSink {
    name: String,
    program: String,
    args: Vec<String>,
    platform: Platform,
}

impl CommandSink {
    pub fn new(
        name: impl Into<String>,
        program: impl Into<String>,
        args: Vec<String>,
        platform: Platform,
    ) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args,
            platform,
        }
    }

    /// macOS built-in player
    pub fn afplay() -> Self {
        Self::new("afplay", "afplay", Vec::new(), Platform::MacOs)
    }

    /// ALSA player
    pub fn aplay() -> Self {
        Self::new("aplay", "aplay", vec!["-q".to_string()], Platform::Linux)
    }

    /// PulseAudio / PipeWire player
    pub fn paplay() -> Self {
        Self::new("paplay", "paplay", Vec::new(), Platform::Linux)
    }

    /// Windows default file association
    pub fn windows_start() -> Self {
        Self::new(
            "start",
            "cmd",
            vec!["/C".to_string(), "start".to_string(), String::new()],
            Platform::Windows,
        )
    }

    /// Location of the player binary on PATH, if any.
    pub fn installed_path(&self) -> Option<PathBuf> {
        find_on_path(&self.program)
    }
}

#[async_trait]
impl OutputSink for CommandSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports(&self, caps: &AudioCapabilities) -> bool {
        caps.platform == self.platform
    }

    async fn play(&self, path: &Path) -> PlaybackResult<()> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    PlaybackError::PlayerNotInstalled(self.program.clone())
                } else {
                    PlaybackError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(PlaybackError::PlayerFailed {
                player: self.name.clone(),
                code: output
                    .status
                    .code()
                    .map(|c| format!("exit code {c}"))
                    .unwrap_or_else(|| "a signal".to_string()),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

/// Command line players in priority order, for every platform.
pub fn command_sinks() -> Vec<CommandSink> {
    vec![
        CommandSink::afplay(),
        CommandSink::aplay(),
        CommandSink::paplay(),
        CommandSink::windows_start(),
    ]
}

/// Full fallback chain: native output first, then the platform players.
pub fn default_sinks() -> Vec<Arc<dyn OutputSink>> {
    let mut sinks: Vec<Arc<dyn OutputSink>> = Vec::new();
    #[cfg(feature = "playback")]
    sinks.push(Arc::new(NativeSink));
    for sink in command_sinks() {
        sinks.push(Arc::new(sink));
    }
    sinks
}

/// Search PATH for an executable named `program`.
pub fn find_on_path(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }

    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths).find_map(|dir| {
        let exact = dir.join(program);
        if exact.is_file() {
            return Some(exact);
        }
        let exe = dir.join(format!("{program}.exe"));
        (cfg!(windows) && exe.is_file()).then_some(exe)
    })
}
