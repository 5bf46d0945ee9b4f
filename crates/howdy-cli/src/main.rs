use anyhow::{Context, Result};
use clap::Parser;
use howdy::config::{HowdyConfig, parse_toml_file};
use howdy::doctor::check_dependencies;
use howdy::speech::AudioCapabilities;
use howdy::speech::voices::list_engine_voices;
use howdy::{Interrupt, Orchestrator};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "tts-howdy")]
#[command(
    about = "Chat with a local Ollama model and hear the replies spoken by Piper",
    long_about = None
)]
struct Cli {
    /// Ollama server URL
    #[arg(long)]
    host: Option<String>,

    /// Ollama model to use
    #[arg(long)]
    model: Option<String>,

    /// Send one prompt, speak the reply and exit
    #[arg(short, long)]
    prompt: Option<String>,

    /// System prompt sent with every request
    #[arg(short, long)]
    system: Option<String>,

    /// Piper voice name or path to an .onnx model
    #[arg(long, value_name = "VOICE")]
    voice_model: Option<String>,

    /// Speech length scale (lower is faster)
    #[arg(long)]
    rate: Option<f32>,

    /// Speak this text directly, without asking the model
    #[arg(short, long)]
    text: Option<String>,

    /// Speak text read from stdin
    #[arg(long)]
    stdin: bool,

    /// List installed voice models
    #[arg(long)]
    list_voices: bool,

    /// Download a Piper voice, e.g. en_US-ryan-medium (defaults to the configured voice)
    #[arg(long, value_name = "VOICE", num_args = 0..=1)]
    download_voice: Option<Option<String>>,

    /// Check that the speech engine and an audio player are available
    #[arg(long)]
    check_deps: bool,

    /// TOML configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    howdy::init_logging();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    if let Some(voice) = voice_to_download(&cli, &config) {
        return download_voice(&config, &voice).await;
    }
    if cli.list_voices {
        return list_voices(&config).await;
    }

    let capabilities = AudioCapabilities::probe();
    if cli.check_deps {
        let report = check_dependencies(&config, &capabilities).await;
        println!("{report}");
        return Ok(());
    }

    let source = config
        .build_source()
        .context("Failed to configure the Ollama client")?;
    let speaker = config.build_speaker(capabilities)?;
    log::info!("Speaking through: {:?}", speaker.active_sinks());

    let mut orchestrator = Orchestrator::new(Arc::new(source), speaker)
        .with_system(config.ollama.system.clone())
        .with_voice(config.voice.model.clone());

    if let Some(text) = &cli.text {
        orchestrator.speak_text(text).await;
    } else if cli.stdin {
        orchestrator
            .speak_reader(tokio::io::stdin())
            .await
            .context("Failed to read stdin")?;
    } else if let Some(prompt) = &cli.prompt {
        println!("You: {prompt}");
        print!("Ollama: ");
        orchestrator.respond(prompt).await;
    } else {
        let input = tokio::io::BufReader::new(tokio::io::stdin());
        orchestrator
            .run_interactive(input, Interrupt::on_ctrl_c())
            .await?;
        drop(orchestrator);
        // A pending stdin read cannot be cancelled and would hold up runtime shutdown.
        std::process::exit(0);
    }

    Ok(())
}

/// Defaults, then the config file, then command line flags.
fn load_config(cli: &Cli) -> Result<HowdyConfig> {
    let mut config = match &cli.config {
        Some(path) => parse_toml_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => HowdyConfig::default(),
    };

    if let Some(host) = &cli.host {
        config.ollama.host = host.clone();
    }
    if let Some(model) = &cli.model {
        config.ollama.model = model.clone();
    }
    if let Some(system) = &cli.system {
        config.ollama.system = Some(system.clone());
    }
    if let Some(voice) = &cli.voice_model {
        config.voice.model = voice.clone();
    }
    if let Some(rate) = cli.rate {
        config.voice.length_scale = rate;
    }

    config.validate()?;
    log::debug!("Effective configuration: {:?}", config);
    Ok(config)
}

/// The voice named by `--download-voice`, or the configured one when no name follows it.
fn voice_to_download(cli: &Cli, config: &HowdyConfig) -> Option<String> {
    cli.download_voice
        .as_ref()
        .map(|voice| voice.clone().unwrap_or_else(|| config.voice.model.clone()))
}

async fn list_voices(config: &HowdyConfig) -> Result<()> {
    let voices = config.voice_directory()?;
    println!("Installed voices in {}:", voices.root().display());
    let installed = voices.list_installed();
    if installed.is_empty() {
        println!("  (none)");
    }
    for voice in installed {
        println!("  {voice}");
    }

    if let Some(listing) = list_engine_voices(&config.voice.piper_bin).await {
        println!("\nVoices reported by {}:", config.voice.piper_bin);
        println!("{}", listing.trim_end());
    }
    Ok(())
}

async fn download_voice(config: &HowdyConfig, voice: &str) -> Result<()> {
    let voices = config.voice_directory()?;
    println!("Downloading voice '{voice}' into {}", voices.root().display());

    let report = voices.download(voice).await?;
    for path in &report.downloaded {
        println!("  downloaded {}", path.display());
    }
    for path in &report.skipped {
        println!("  already present {}", path.display());
    }
    for error in &report.failed {
        eprintln!("  {error}");
    }

    if !report.is_complete() {
        anyhow::bail!("Voice '{}' was not fully downloaded", voice);
    }
    println!("Voice '{voice}' is ready. Use it with --voice-model {voice}");
    Ok(())
}
