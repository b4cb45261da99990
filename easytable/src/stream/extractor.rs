// Copyright 2026 The EasyTable Project
// SPDX-License-Identifier: Apache-2.0

// Content extraction from `data:` lines of an OpenAI-compatible
// chat completion stream.

use serde::Deserialize;

/// Longest slice of a bad line quoted in logs.
const EXCERPT_CHARS: usize = 120;

/// The parts of an upstream stream record that are read. Everything else
/// in the JSON is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpstreamChunkRecord {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
    #[serde(default)]
    pub usage: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: Option<ChunkDelta>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkDelta {
    #[serde(default)]
    pub content: Option<String>,
}

impl UpstreamChunkRecord {
    /// `choices[0].delta.content`, if present.
    pub fn content(&self) -> Option<&str> {
        self.choices.first()?.delta.as_ref()?.content.as_deref()
    }

    /// The usage object of a summary record (one carrying `prompt_tokens`).
    pub fn usage_summary(&self) -> Option<&serde_json::Value> {
        let usage = self.usage.as_ref()?;
        match usage.get("prompt_tokens") {
            Some(v) if !v.is_null() => Some(usage),
            _ => None,
        }
    }
}

/// One decoded line of the upstream protocol.
#[derive(Debug, Clone)]
pub enum LineRecord {
    /// Blank, comment, heartbeat or any non-`data:` line.
    Ignored,
    /// The `data: [DONE]` terminator.
    Done,
    Chunk(UpstreamChunkRecord),
}

/// A `data:` line whose payload is not a valid record.
#[derive(Debug, thiserror::Error)]
pub enum LineError {
    #[error("malformed upstream line {excerpt:?}: {source}")]
    MalformedJson {
        excerpt: String,
        source: serde_json::Error,
    },
}

/// Decode one line without side effects.
pub fn decode_line(line: &[u8]) -> Result<LineRecord, LineError> {
    let text = String::from_utf8_lossy(line);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(LineRecord::Ignored);
    }
    let Some(payload) = trimmed.strip_prefix("data:") else {
        return Ok(LineRecord::Ignored);
    };
    let payload = payload.trim_start();
    if payload == "[DONE]" {
        return Ok(LineRecord::Done);
    }
    serde_json::from_str(payload)
        .map(LineRecord::Chunk)
        .map_err(|source| LineError::MalformedJson {
            excerpt: trimmed.chars().take(EXCERPT_CHARS).collect(),
            source,
        })
}

/// Turns upstream lines into content fragments.
///
/// Never fails: malformed lines are logged and yield an empty fragment so
/// one bad record cannot abort the stream. Usage summaries are logged.
#[derive(Debug, Clone, Copy, Default)]
pub struct SseContentExtractor;

impl SseContentExtractor {
    /// Return the content fragment carried by `line`, or `""`.
    pub fn parse_line(&self, line: &[u8]) -> String {
        match decode_line(line) {
            Ok(LineRecord::Chunk(record)) => {
                if let Some(usage) = record.usage_summary() {
                    tracing::info!(usage = %usage, "llm usage");
                }
                record.content().unwrap_or_default().to_string()
            }
            Ok(LineRecord::Done) => {
                tracing::debug!("upstream sent [DONE]");
                String::new()
            }
            Ok(LineRecord::Ignored) => String::new(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to parse llm response line");
                String::new()
            }
        }
    }
}
