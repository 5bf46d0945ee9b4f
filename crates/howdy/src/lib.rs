// Re-export for convenience
pub use async_trait::async_trait;
pub use howdy_llm::{self as llm, error as llm_error};
pub use howdy_speech::{self as speech, error as speech_error};

pub mod config;
pub mod doctor;
pub mod error;
pub mod orchestrator;
pub mod prelude;

pub use config::{HowdyConfig, parse_toml_file, parse_toml_str};
pub use error::HowdyError;
pub use orchestrator::{Interrupt, InterruptHandle, Orchestrator, TurnReport};

#[inline]
/// Initialize logging using env_logger if the "logging" feature is enabled.
/// Defaults to `warn` unless `RUST_LOG` says otherwise.
/// This is a no-op if the feature is not enabled.
pub fn init_logging() {
    #[cfg(feature = "logging")]
    {
        let env = env_logger::Env::default().default_filter_or("warn");
        let _ = env_logger::Builder::from_env(env).try_init();
    }
}
