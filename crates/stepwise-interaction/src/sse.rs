//! Decoder for the chat stream's `data: {...}` frames.
//!
//! Frames are newline-delimited; bytes may arrive split anywhere, including
//! inside a UTF-8 sequence, so undecoded bytes are carried between pushes.

use serde::Deserialize;
use stepwise_core::assistant::ChatEvent;
use stepwise_core::error::{Result, StepwiseError};

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Frame {
    Start {
        #[serde(default)]
        agent: Option<String>,
    },
    Content {
        #[serde(default)]
        content: String,
    },
    End,
    Error {
        #[serde(default, alias = "content")]
        message: String,
    },
}

#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk and returns every event completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Result<ChatEvent>> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(line_end) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=line_end).collect();
            let line = String::from_utf8_lossy(&line);
            if let Some(event) = decode_line(line.trim_end_matches(['\n', '\r'])) {
                events.push(event);
            }
        }
        events
    }

    /// Decodes a trailing frame that was not newline-terminated.
    pub fn finish(&mut self) -> Vec<Result<ChatEvent>> {
        if self.buffer.is_empty() {
            return Vec::new();
        }
        let rest = std::mem::take(&mut self.buffer);
        let line = String::from_utf8_lossy(&rest);
        decode_line(line.trim_end_matches('\r')).into_iter().collect()
    }
}

fn decode_line(line: &str) -> Option<Result<ChatEvent>> {
    if line.is_empty() || line.starts_with(':') {
        return None;
    }
    let data = line.strip_prefix("data:")?.trim_start();
    if data.trim() == "[DONE]" {
        return Some(Ok(ChatEvent::End));
    }

    let frame: Frame = match serde_json::from_str(data) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::debug!("[SseDecoder] Skipping unparseable frame: {} ({})", data, e);
            return None;
        }
    };

    Some(match frame {
        Frame::Start { agent } => Ok(ChatEvent::Start { agent }),
        Frame::Content { content } => Ok(ChatEvent::Content(content)),
        Frame::End => Ok(ChatEvent::End),
        Frame::Error { message } => Err(StepwiseError::backend(None, message)),
    })
}
