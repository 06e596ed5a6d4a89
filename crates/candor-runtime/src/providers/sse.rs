//! Server-Sent-Events line decoding shared by the streaming adapters.
//!
//! Vendor streams arrive as byte chunks that do not align with line
//! boundaries. [`SseLineBuffer`] reassembles complete lines;
//! [`data_payload`] strips the `data: ` framing.

/// The sentinel frame that terminates an OpenAI-style stream.
pub const DONE_FRAME: &str = "[DONE]";

/// Reassembles newline-delimited SSE lines from arbitrary byte chunks.
#[derive(Debug, Default)]
pub struct SseLineBuffer {
    buffer: String,
}

impl SseLineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and get back every complete line it finishes.
    ///
    /// Trailing bytes that do not yet end in `\n` stay buffered for the
    /// next chunk. Lines are trimmed of the carriage return but not of
    /// interior whitespace.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.push_str(&String::from_utf8_lossy(chunk));

        let mut lines = Vec::new();
        while let Some(newline) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=newline).collect();
            lines.push(line.trim_end_matches(['\n', '\r']).to_string());
        }
        lines
    }

    /// Whatever is still buffered after the stream ends.
    pub fn remainder(&self) -> &str {
        &self.buffer
    }
}

/// Extract the JSON payload of a `data: {...}` frame.
///
/// Returns `None` for blank lines, comments, and `event:` lines. The
/// `[DONE]` sentinel is returned as-is so callers can test for it.
pub fn data_payload(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    let payload = trimmed.strip_prefix("data:")?.trim_start();
    if payload.is_empty() {
        None
    } else {
        Some(payload)
    }
}
