// Copyright 2026 The EasyTable Project
// SPDX-License-Identifier: Apache-2.0

// Newline reassembly for chunked upstream bodies.

use bytes::{Bytes, BytesMut};

/// Reassembles arbitrary byte chunks into `\n`-delimited lines.
///
/// Holds the incomplete trailing line of the previous chunk. Emitted lines
/// exclude the `\n` itself; any `\r` or other whitespace is left for the
/// caller to trim. Byte-exact: nothing is dropped or reordered, wherever
/// chunk boundaries fall.
#[derive(Debug, Default)]
pub struct LineSplitter {
    carry: BytesMut,
}

impl LineSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `chunk` and return every line it completes, in order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Bytes> {
        let mut lines = Vec::new();
        let mut rest = chunk;
        while let Some(pos) = rest.iter().position(|&b| b == b'\n') {
            self.carry.extend_from_slice(&rest[..pos]);
            lines.push(self.carry.split().freeze());
            rest = &rest[pos + 1..];
        }
        self.carry.extend_from_slice(rest);
        lines
    }

    /// Take the unterminated final line, if any. Call once the input ends.
    pub fn flush(&mut self) -> Option<Bytes> {
        if self.carry.is_empty() {
            return None;
        }
        Some(self.carry.split().freeze())
    }

    /// Bytes currently held waiting for a newline.
    pub fn pending_len(&self) -> usize {
        self.carry.len()
    }
}
