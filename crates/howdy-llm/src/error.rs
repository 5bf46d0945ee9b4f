use thiserror::Error;

/// Underlying reason the model server could not be used.
#[derive(Error, Debug)]
pub enum UpstreamCause {
    /// DNS, connection refusal, timeout or a transport failure mid-stream
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-2xx status
    #[error("server returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

/// Errors raised while talking to the model server.
#[derive(Error, Debug)]
pub enum LLMError {
    /// Model server unreachable or erroring
    #[error("Model server unavailable at {url}: {cause}")]
    UpstreamUnavailable {
        url: String,
        #[source]
        cause: UpstreamCause,
    },

    /// A non-streaming reply that was not valid JSON
    #[error("Invalid response from model server: {0}")]
    InvalidResponse(String),

    /// Builder was given settings that cannot produce a client
    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),
}

impl LLMError {
    pub(crate) fn transport(url: &str, err: reqwest::Error) -> Self {
        LLMError::UpstreamUnavailable {
            url: url.to_string(),
            cause: UpstreamCause::Transport(err),
        }
    }

    pub(crate) fn status(url: &str, status: u16, body: String) -> Self {
        LLMError::UpstreamUnavailable {
            url: url.to_string(),
            cause: UpstreamCause::Status { status, body },
        }
    }

    /// True when the server could not be reached or refused the request.
    pub fn is_upstream_unavailable(&self) -> bool {
        matches!(self, LLMError::UpstreamUnavailable { .. })
    }
}

pub type LLMResult<T> = Result<T, LLMError>;
