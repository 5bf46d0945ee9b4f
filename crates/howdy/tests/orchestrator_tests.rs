use async_trait::async_trait;
use futures::StreamExt;
use howdy::llm::{FragmentStream, LLMError, LLMResult, ResponseSource, UpstreamCause};
use howdy::speech::{
    AudioCapabilities, OutputSink, Platform, PlaybackError, PlaybackResult, Speaker,
    SpeechSynthesizer, SynthesisResult,
};
use howdy::{Interrupt, Orchestrator};
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Events = Arc<Mutex<Vec<String>>>;

enum Reply {
    Fragments(Vec<LLMResult<String>>),
    Unavailable,
}

struct FakeSource {
    prompts: Mutex<Vec<(String, Option<String>)>>,
    reply: fn(&str) -> Reply,
}

impl FakeSource {
    fn new(reply: fn(&str) -> Reply) -> Arc<Self> {
        Arc::new(Self {
            prompts: Mutex::new(Vec::new()),
            reply,
        })
    }
}

fn upstream_error() -> LLMError {
    LLMError::UpstreamUnavailable {
        url: "http://localhost:11434/api/generate".into(),
        cause: UpstreamCause::Status {
            status: 500,
            body: "boom".into(),
        },
    }
}

#[async_trait]
impl ResponseSource for FakeSource {
    async fn stream_response(
        &self,
        prompt: &str,
        system: Option<&str>,
    ) -> LLMResult<FragmentStream> {
        self.prompts
            .lock()
            .unwrap()
            .push((prompt.to_string(), system.map(str::to_string)));
        match (self.reply)(prompt) {
            Reply::Fragments(items) => Ok(futures::stream::iter(items).boxed()),
            Reply::Unavailable => Err(upstream_error()),
        }
    }

    fn model_name(&self) -> &str {
        "fake"
    }
}

struct RecordingSynth {
    events: Events,
    texts: Mutex<Vec<String>>,
}

#[async_trait]
impl SpeechSynthesizer for RecordingSynth {
    async fn synthesize(&self, text: &str, output: &Path) -> SynthesisResult<()> {
        self.events.lock().unwrap().push("synth".into());
        self.texts.lock().unwrap().push(text.to_string());
        std::fs::write(output, b"RIFF").unwrap();
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

struct SlowSink {
    events: Events,
    succeed: bool,
}

#[async_trait]
impl OutputSink for SlowSink {
    fn name(&self) -> &str {
        "slow"
    }

    fn supports(&self, _caps: &AudioCapabilities) -> bool {
        true
    }

    async fn play(&self, _path: &Path) -> PlaybackResult<()> {
        self.events.lock().unwrap().push("play-start".into());
        tokio::time::sleep(Duration::from_millis(10)).await;
        self.events.lock().unwrap().push("play-end".into());
        if self.succeed {
            Ok(())
        } else {
            Err(PlaybackError::NativeUnavailable)
        }
    }
}

#[derive(Clone, Default)]
struct SharedOutput(Arc<Mutex<Vec<u8>>>);

impl SharedOutput {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).to_string()
    }
}

impl Write for SharedOutput {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

struct Harness {
    orchestrator: Orchestrator,
    source: Arc<FakeSource>,
    synth: Arc<RecordingSynth>,
    events: Events,
    output: SharedOutput,
    dir: tempfile::TempDir,
}

impl Harness {
    fn new(reply: fn(&str) -> Reply, sink_works: bool) -> Self {
        let events: Events = Arc::default();
        let dir = tempfile::tempdir().unwrap();
        let source = FakeSource::new(reply);
        let synth = Arc::new(RecordingSynth {
            events: events.clone(),
            texts: Mutex::new(Vec::new()),
        });
        let sink = Arc::new(SlowSink {
            events: events.clone(),
            succeed: sink_works,
        });
        let speaker = Speaker::new(synth.clone(), AudioCapabilities::new(Platform::Linux, false))
            .with_sinks(vec![sink])
            .with_artifact_dir(dir.path());
        let output = SharedOutput::default();
        let orchestrator = Orchestrator::new(source.clone(), speaker)
            .with_output(Box::new(output.clone()));

        Self {
            orchestrator,
            source,
            synth,
            events,
            output,
            dir,
        }
    }

    fn spoken(&self) -> Vec<String> {
        self.synth
            .texts
            .lock()
            .unwrap()
            .iter()
            .map(|t| t.trim().to_string())
            .collect()
    }

    fn prompts(&self) -> Vec<String> {
        self.source
            .prompts
            .lock()
            .unwrap()
            .iter()
            .map(|(p, _)| p.clone())
            .collect()
    }
}

fn fragments(items: &[&str]) -> Reply {
    Reply::Fragments(items.iter().map(|s| Ok(s.to_string())).collect())
}

fn cowboy_reply(prompt: &str) -> Reply {
    match prompt {
        "first" => fragments(&["Howdy", " partner,", " how are", " you today?"]),
        _ => fragments(&["Mighty fine", " weather."]),
    }
}

#[tokio::test]
async fn test_turns_are_spoken_in_order_without_overlap() {
    let mut h = Harness::new(cowboy_reply, true);
    let input = tokio::io::BufReader::new(&b"first\nsecond\nEXIT\nnever sent\n"[..]);
    let (_handle, interrupt) = Interrupt::channel();

    h.orchestrator.run_interactive(input, interrupt).await.unwrap();

    assert_eq!(h.prompts(), vec!["first", "second"]);
    assert_eq!(
        h.spoken(),
        vec!["Howdy partner,", "how are you today?", "Mighty fine weather."]
    );

    // Each segment finishes playing before the next one is synthesized.
    let events = h.events.lock().unwrap().clone();
    let expected: Vec<String> = std::iter::repeat(["synth", "play-start", "play-end"])
        .take(3)
        .flatten()
        .map(String::from)
        .collect();
    assert_eq!(events, expected);

    let out = h.output.text();
    assert!(out.contains("You: "));
    assert!(out.contains("Ollama: Howdy partner, how are you today?"));
    assert!(out.contains("Exiting..."));
    assert_eq!(std::fs::read_dir(h.dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_blank_lines_are_not_sent() {
    let mut h = Harness::new(cowboy_reply, true);
    let input = tokio::io::BufReader::new(&b"\n   \nquit\n"[..]);
    let (_handle, interrupt) = Interrupt::channel();

    h.orchestrator.run_interactive(input, interrupt).await.unwrap();
    assert!(h.prompts().is_empty());
    assert!(h.spoken().is_empty());
}

#[tokio::test]
async fn test_interrupt_stops_before_next_prompt() {
    let mut h = Harness::new(cowboy_reply, true);
    let input = tokio::io::BufReader::new(&b"first\n"[..]);
    let (handle, interrupt) = Interrupt::channel();
    handle.trigger();

    h.orchestrator.run_interactive(input, interrupt).await.unwrap();
    assert!(h.prompts().is_empty());
    assert!(h.output.text().contains("Exiting..."));
}

#[tokio::test]
async fn test_unreachable_server_error_is_spoken() {
    let mut h = Harness::new(|_| Reply::Unavailable, true);
    let report = h.orchestrator.respond("hello").await;

    let message = upstream_error().to_string();
    assert_eq!(report.upstream_error.as_deref(), Some(message.as_str()));
    assert_eq!(h.spoken(), vec![format!("Error: {message}")]);
    assert!(h.output.text().contains("Error connecting to Ollama:"));
}

#[tokio::test]
async fn test_mid_stream_failure_flushes_buffer_first() {
    let mut h = Harness::new(
        |_| {
            Reply::Fragments(vec![
                Ok("Howdy there".to_string()),
                Ok(" partner".to_string()),
                Err(upstream_error()),
                Ok("never reached.".to_string()),
            ])
        },
        true,
    );
    let report = h.orchestrator.respond("hello").await;

    let spoken = h.spoken();
    assert_eq!(spoken.len(), 2);
    assert_eq!(spoken[0], "Howdy there partner");
    assert!(spoken[1].starts_with("Error: "));
    assert_eq!(report.spoken, 2);
    assert!(report.upstream_error.is_some());
}

#[tokio::test]
async fn test_unplayable_audio_is_kept_and_reported() {
    let mut h = Harness::new(cowboy_reply, false);
    let report = h.orchestrator.respond("first").await;

    assert_eq!(report.spoken, 0);
    assert_eq!(report.retained.len(), 2);
    for path in &report.retained {
        assert!(path.exists());
    }
    assert!(h.output.text().contains("Audio saved to"));
}

#[tokio::test]
async fn test_reader_text_is_spoken_as_one_segment() {
    let mut h = Harness::new(cowboy_reply, true);
    let report = h
        .orchestrator
        .speak_reader(&b"Hello from stdin. This is one piece.\n"[..])
        .await
        .unwrap();

    assert_eq!(report.spoken, 1);
    assert_eq!(h.spoken(), vec!["Hello from stdin. This is one piece."]);
    assert!(h.prompts().is_empty());
}

#[tokio::test]
async fn test_system_prompt_is_forwarded() {
    let mut h = Harness::new(cowboy_reply, true);
    h.orchestrator = h
        .orchestrator
        .with_system(Some("Talk like a cowboy.".into()));

    h.orchestrator.respond("second").await;
    let prompts = h.source.prompts.lock().unwrap().clone();
    assert_eq!(
        prompts,
        vec![("second".to_string(), Some("Talk like a cowboy.".to_string()))]
    );
}
