// Copyright 2026 The EasyTable Project
// SPDX-License-Identifier: Apache-2.0

// Streaming decoder for the model API response body.
//
// Responsibilities:
// - Reassemble newline-delimited lines across arbitrary chunk boundaries
// - Extract `choices[0].delta.content` from each `data:` line
// - Log usage summaries; log and skip malformed lines
// - Forward each non-empty fragment as soon as its line is complete

mod extractor;
mod pipeline;
mod splitter;

pub use extractor::{
    decode_line, ChunkChoice, ChunkDelta, LineError, LineRecord, SseContentExtractor,
    UpstreamChunkRecord,
};
pub use pipeline::extract_fragments;
pub use splitter::LineSplitter;
