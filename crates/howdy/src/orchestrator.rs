//! Drives one conversation: prompt, stream, segment, speak.
//!
//! Every spoken segment is awaited before the next fragment is pulled from
//! the stream, and every turn is finished before the next prompt is read, so
//! audio never overlaps.

use crate::error::Result;
use futures::StreamExt;
use howdy_llm::{LLMError, ResponseSource};
use howdy_speech::{Segmenter, SpeakOutcome, Speaker, SpeakerError};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt};
use tokio::sync::watch;

const EXIT_HINT: &str = "Type 'exit' or 'quit' to leave. Use Ctrl+C to exit.";

/// What happened while speaking one turn.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TurnReport {
    /// Segments that reached a sink
    pub spoken: usize,
    pub synthesis_failures: usize,
    /// Audio files left on disk because no sink could play them
    pub retained: Vec<PathBuf>,
    /// The upstream error message, if the model server failed
    pub upstream_error: Option<String>,
}

/// Set once Ctrl+C (or a test) asks the interactive loop to stop.
#[derive(Clone, Debug)]
pub struct Interrupt {
    rx: watch::Receiver<bool>,
}

/// Triggers the paired [`Interrupt`].
#[derive(Debug)]
pub struct InterruptHandle {
    tx: watch::Sender<bool>,
}

impl InterruptHandle {
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }
}

impl Interrupt {
    /// A linked handle and interrupt.
    pub fn channel() -> (InterruptHandle, Interrupt) {
        let (tx, rx) = watch::channel(false);
        (InterruptHandle { tx }, Interrupt { rx })
    }

    /// Interrupt fired by the first Ctrl+C. Must be called inside a runtime.
    pub fn on_ctrl_c() -> Interrupt {
        let (handle, interrupt) = Self::channel();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => handle.trigger(),
                Err(e) => log::warn!("Unable to listen for Ctrl+C: {}", e),
            }
        });
        interrupt
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once triggered. Never resolves if the handle is dropped first.
    pub async fn triggered(&mut self) {
        if self.rx.wait_for(|fired| *fired).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

pub struct Orchestrator {
    source: Arc<dyn ResponseSource>,
    speaker: Speaker,
    system: Option<String>,
    voice: Option<String>,
    out: Box<dyn Write + Send>,
}

impl Orchestrator {
    pub fn new(source: Arc<dyn ResponseSource>, speaker: Speaker) -> Self {
        Self {
            source,
            speaker,
            system: None,
            voice: None,
            out: Box::new(std::io::stdout()),
        }
    }

    pub fn with_system(mut self, system: Option<String>) -> Self {
        self.system = system.filter(|s| !s.trim().is_empty());
        self
    }

    /// Voice name shown in the interactive banner.
    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = Some(voice.into());
        self
    }

    /// Send console echo somewhere other than stdout.
    pub fn with_output(mut self, out: Box<dyn Write + Send>) -> Self {
        self.out = out;
        self
    }

    /// Echo `text` and speak it as a single segment.
    pub async fn speak_text(&mut self, text: &str) -> TurnReport {
        let mut report = TurnReport::default();
        self.echo(&format!("{text}\n"));
        self.speak_segment(text, &mut report).await;
        report
    }

    /// Read everything from `input` and speak it as one segment.
    pub async fn speak_reader<R: AsyncRead + Unpin>(&mut self, mut input: R) -> Result<TurnReport> {
        let mut text = String::new();
        input.read_to_string(&mut text).await?;
        Ok(self.speak_text(text.trim_end()).await)
    }

    /// Stream a reply to `prompt`, speaking each segment as it is cut.
    pub async fn respond(&mut self, prompt: &str) -> TurnReport {
        let mut report = TurnReport::default();

        let source = self.source.clone();
        let started = source
            .stream_response(prompt, self.system.as_deref())
            .await;
        let mut fragments = match started {
            Ok(stream) => stream,
            Err(e) => {
                self.report_upstream(e, &mut report).await;
                return report;
            }
        };

        let mut segmenter = Segmenter::new();
        let mut failure = None;
        while let Some(item) = fragments.next().await {
            match item {
                Ok(fragment) => {
                    if let Some(segment) = segmenter.feed(&fragment) {
                        self.echo(segment.text());
                        self.speak_segment(segment.text(), &mut report).await;
                    }
                }
                Err(e) => {
                    log::debug!(
                        "Reply broke off with {} chars buffered",
                        segmenter.buffered().chars().count()
                    );
                    failure = Some(e);
                    break;
                }
            }
        }

        // Whatever is buffered is spoken before any error.
        if let Some(segment) = segmenter.flush() {
            self.echo(segment.text());
            self.speak_segment(segment.text(), &mut report).await;
        }
        self.echo("\n");

        if let Some(e) = failure {
            self.report_upstream(e, &mut report).await;
        }
        report
    }

    /// Prompt, respond, repeat until `exit`/`quit`, end of input, or interrupt.
    pub async fn run_interactive<R: AsyncBufRead + Unpin>(
        &mut self,
        input: R,
        mut interrupt: Interrupt,
    ) -> Result<()> {
        let model = self.source.model_name().to_string();
        self.echo(&format!("Howdy! Chatting with Ollama model '{model}'.\n"));
        if let Some(voice) = self.voice.clone() {
            self.echo(&format!("Voice: {voice}\n"));
        }
        self.echo(&format!("{EXIT_HINT}\n"));
        if let Some(system) = self.system.clone() {
            self.echo(&format!("System prompt: {system}\n"));
        }

        let mut lines = input.lines();
        loop {
            if interrupt.is_triggered() {
                break;
            }
            self.echo("\nYou: ");

            let line = tokio::select! {
                line = lines.next_line() => line?,
                _ = interrupt.triggered() => None,
            };
            let Some(line) = line else {
                break;
            };

            let prompt = line.trim();
            if prompt.eq_ignore_ascii_case("exit") || prompt.eq_ignore_ascii_case("quit") {
                break;
            }
            if prompt.is_empty() {
                continue;
            }

            self.echo("\nOllama: ");
            let report = self.respond(prompt).await;
            log::debug!("Turn finished: {:?}", report);
        }

        self.echo("\nExiting...\n");
        Ok(())
    }

    async fn speak_segment(&mut self, text: &str, report: &mut TurnReport) {
        match self.speaker.speak(text).await {
            Ok(SpeakOutcome::Played { sink }) => {
                log::debug!("Played segment via {}", sink);
                report.spoken += 1;
            }
            Ok(SpeakOutcome::Skipped) => {}
            Err(SpeakerError::SynthesisFailed(e)) => {
                log::error!("Error generating speech: {}", e);
                self.echo(&format!("\n[Error generating speech: {e}]\n"));
                report.synthesis_failures += 1;
            }
            Err(SpeakerError::PlaybackUnavailable { artifact, attempts }) => {
                for (sink, e) in &attempts {
                    log::warn!("{} could not play audio: {}", sink, e);
                }
                self.echo(&format!(
                    "\n[Could not play audio. Audio saved to: {}]\n",
                    artifact.display()
                ));
                report.retained.push(artifact);
            }
            Err(e @ SpeakerError::Artifact(_)) => {
                log::error!("{}", e);
                self.echo(&format!("\n[{e}]\n"));
                report.synthesis_failures += 1;
            }
        }
    }

    async fn report_upstream(&mut self, error: LLMError, report: &mut TurnReport) {
        let message = error.to_string();
        log::error!("{}", message);
        if error.is_upstream_unavailable() {
            self.echo(&format!("Error connecting to Ollama: {message}\n"));
        } else {
            self.echo(&format!("Error: {message}\n"));
        }
        self.speak_segment(&format!("Error: {message}"), report).await;
        report.upstream_error = Some(message);
    }

    fn echo(&mut self, text: &str) {
        if let Err(e) = self
            .out
            .write_all(text.as_bytes())
            .and_then(|_| self.out.flush())
        {
            log::debug!("Console write failed: {}", e);
        }
    }
}
