//! `--check-deps`: is everything needed to speak installed?

use crate::config::HowdyConfig;
use howdy_speech::sink::command_sinks;
use howdy_speech::{AudioCapabilities, OutputSink, Platform};
use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineStatus {
    Ready,
    NotInstalled,
    /// Launched but exited unsuccessfully
    Broken(String),
}

#[derive(Clone, Debug)]
pub struct PlayerStatus {
    pub name: String,
    pub path: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct DependencyReport {
    pub piper_bin: String,
    pub engine: EngineStatus,
    pub platform: Platform,
    pub native_output: bool,
    /// Command line players for this platform
    pub players: Vec<PlayerStatus>,
    pub voice: String,
    /// Installed model file for the configured voice
    pub voice_model: Option<PathBuf>,
}

impl DependencyReport {
    /// Can a segment be both synthesized and heard?
    pub fn is_ready(&self) -> bool {
        self.engine == EngineStatus::Ready
            && (self.native_output || self.players.iter().any(|p| p.path.is_some()))
    }
}

pub async fn check_dependencies(
    config: &HowdyConfig,
    capabilities: &AudioCapabilities,
) -> DependencyReport {
    let piper_bin = config.voice.piper_bin.clone();
    let engine = probe_engine(&piper_bin).await;

    let players = command_sinks()
        .into_iter()
        .filter(|sink| sink.supports(capabilities))
        .map(|sink| PlayerStatus {
            name: sink.name().to_string(),
            path: sink.installed_path(),
        })
        .collect();

    let voice_model = config.voice_directory().ok().and_then(|voices| {
        let resolved = PathBuf::from(voices.resolve(&config.voice.model));
        resolved.is_file().then_some(resolved)
    });

    DependencyReport {
        piper_bin,
        engine,
        platform: capabilities.platform,
        native_output: capabilities.native_output,
        players,
        voice: config.voice.model.clone(),
        voice_model,
    }
}

async fn probe_engine(piper_bin: &str) -> EngineStatus {
    let result = Command::new(piper_bin)
        .arg("--help")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await;

    match result {
        Ok(output) if output.status.success() => EngineStatus::Ready,
        Ok(output) => {
            EngineStatus::Broken(String::from_utf8_lossy(&output.stderr).trim().to_string())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => EngineStatus::NotInstalled,
        Err(e) => EngineStatus::Broken(e.to_string()),
    }
}

fn mark(ok: bool) -> &'static str {
    if ok { "ok" } else { "missing" }
}

impl fmt::Display for DependencyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Checking dependencies...")?;
        match &self.engine {
            EngineStatus::Ready => writeln!(f, "  piper ({}): ok", self.piper_bin)?,
            EngineStatus::NotInstalled => {
                writeln!(f, "  piper ({}): missing", self.piper_bin)?;
                writeln!(f, "    Install it with: pip install piper-tts")?;
                writeln!(
                    f,
                    "    or follow the instructions at https://github.com/rhasspy/piper"
                )?;
            }
            EngineStatus::Broken(reason) => {
                writeln!(f, "  piper ({}): failed to run", self.piper_bin)?;
                if !reason.is_empty() {
                    writeln!(f, "    {reason}")?;
                }
            }
        }

        writeln!(f, "  native audio output: {}", mark(self.native_output))?;
        if self.players.is_empty() {
            writeln!(f, "  no command line players known for {:?}", self.platform)?;
        }
        for player in &self.players {
            match &player.path {
                Some(path) => writeln!(f, "  {}: ok ({})", player.name, path.display())?,
                None => writeln!(f, "  {}: missing", player.name)?,
            }
        }

        match &self.voice_model {
            Some(path) => writeln!(f, "  voice {}: ok ({})", self.voice, path.display())?,
            None => {
                writeln!(f, "  voice {}: not installed", self.voice)?;
                writeln!(f, "    Download it with: --download-voice {}", self.voice)?;
            }
        }

        if self.is_ready() {
            write!(f, "Ready to talk.")
        } else {
            write!(f, "Some dependencies are missing.")
        }
    }
}
