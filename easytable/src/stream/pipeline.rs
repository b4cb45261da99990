// Copyright 2026 The EasyTable Project
// SPDX-License-Identifier: Apache-2.0

// Upstream bytes -> content fragments.
//
// Pull-based: the next upstream chunk is read only when the consumer asks
// for a fragment and none are ready, so a slow consumer slows the upstream
// read instead of growing a buffer. Dropping the returned stream drops the
// upstream body.

use std::collections::VecDeque;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::stream::{self, Stream, StreamExt};

use super::extractor::SseContentExtractor;
use super::splitter::LineSplitter;

struct PipelineState<S> {
    input: Pin<Box<S>>,
    splitter: LineSplitter,
    extractor: SseContentExtractor,
    /// Complete lines not yet parsed.
    lines: VecDeque<Bytes>,
    fragments: usize,
    finished: bool,
}

impl<S> PipelineState<S> {
    /// Parse queued lines until one yields content.
    fn next_fragment(&mut self) -> Option<String> {
        while let Some(line) = self.lines.pop_front() {
            let fragment = self.extractor.parse_line(&line);
            if !fragment.is_empty() {
                self.fragments += 1;
                return Some(fragment);
            }
        }
        None
    }
}

/// Decode an upstream byte stream into an ordered stream of non-empty
/// content fragments.
///
/// An upstream error is yielded once and ends the stream; the partial line
/// held at that point is discarded. On a clean end the partial line is
/// parsed like any other.
pub fn extract_fragments<S, E>(input: S) -> impl Stream<Item = Result<String, E>> + Send
where
    S: Stream<Item = Result<Bytes, E>> + Send,
    E: Send,
{
    let state = PipelineState {
        input: Box::pin(input),
        splitter: LineSplitter::new(),
        extractor: SseContentExtractor,
        lines: VecDeque::new(),
        fragments: 0,
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(fragment) = state.next_fragment() {
                return Some((Ok(fragment), state));
            }
            if state.finished {
                return None;
            }
            match state.input.next().await {
                Some(Ok(chunk)) => {
                    let lines = state.splitter.feed(&chunk);
                    state.lines.extend(lines);
                }
                Some(Err(e)) => {
                    state.finished = true;
                    tracing::warn!(
                        fragments = state.fragments,
                        discarded_bytes = state.splitter.pending_len(),
                        "upstream stream failed"
                    );
                    state.splitter = LineSplitter::new();
                    return Some((Err(e), state));
                }
                None => {
                    state.finished = true;
                    state.lines.extend(state.splitter.flush());
                    tracing::debug!(fragments = state.fragments, "upstream stream finished");
                }
            }
        }
    })
}
