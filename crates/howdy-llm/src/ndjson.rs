//! Newline-delimited JSON decoding for the `/api/generate` stream.
//!
//! Transport chunks do not line up with JSON lines, so bytes are buffered
//! until a `\n` arrives. Each complete line is decoded into a fragment; lines
//! that fail to parse are skipped so a single corrupt line never aborts the
//! stream.

use serde::Deserialize;

/// One line of a streamed generate reply.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct GenerateChunk {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// Accumulates raw bytes and hands back complete lines.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transport chunk and drain every line it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            lines.push(String::from_utf8_lossy(&line[..line.len() - 1]).into_owned());
        }
        lines
    }

    /// Return the unterminated tail left over at end-of-stream.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let tail = std::mem::take(&mut self.pending);
        Some(String::from_utf8_lossy(&tail).into_owned())
    }
}

/// Decode one transport line into a text fragment.
///
/// Returns `None` for blank or malformed lines. A line without a `response`
/// field yields an empty fragment.
pub fn parse_line(line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    match serde_json::from_str::<GenerateChunk>(line) {
        Ok(chunk) => {
            if let Some(err) = chunk.error.as_deref() {
                log::warn!("Model server reported an error mid-stream: {}", err);
            }
            if chunk.done {
                log::debug!("Model server signalled end of generation");
            }
            Some(chunk.response.unwrap_or_default())
        }
        Err(e) => {
            log::debug!("Skipping malformed stream line ({}): {}", e, line);
            None
        }
    }
}
