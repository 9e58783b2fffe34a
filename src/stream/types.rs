// Copyright 2026 The Chatrelay Project
// SPDX-License-Identifier: Apache-2.0

// Stream types
//
// Line classification, output events, per-relay counters and the
// recoverable errors raised inside the relay loop.

use bytes::Bytes;

/// Payload that marks the end of an SSE completion stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// The terminal event written to the downstream client.
pub const DONE_EVENT: &str = "data: [DONE]\n\n";

// ---------------------------------------------------------------------------
// Line classification
// ---------------------------------------------------------------------------

/// Classification of one complete upstream line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SseLine<'a> {
    /// `data:` line carrying a non-empty payload other than the sentinel.
    Data(&'a str),
    /// `data: [DONE]`, surrounding whitespace tolerated.
    Done,
    /// Blank separators, comments, `event:`/`id:` lines, empty `data:`.
    Ignored,
}

// ---------------------------------------------------------------------------
// Output events
// ---------------------------------------------------------------------------

/// A normalized event emitted by the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayEvent {
    /// A non-empty incremental text fragment.
    Content(String),
    /// Stream completion.
    Done,
}

impl RelayEvent {
    /// Render the event as an SSE frame, blank-line terminated.
    pub fn to_sse(&self) -> String {
        match self {
            RelayEvent::Content(fragment) => {
                // Display on a JSON string value performs the escaping.
                let encoded = serde_json::Value::String(fragment.clone());
                format!("data: {{\"content\": {encoded}}}\n\n")
            }
            RelayEvent::Done => DONE_EVENT.to_string(),
        }
    }

    pub fn into_bytes(self) -> Bytes {
        match self {
            RelayEvent::Done => Bytes::from_static(DONE_EVENT.as_bytes()),
            other => Bytes::from(other.to_sse()),
        }
    }
}

// ---------------------------------------------------------------------------
// Counters
// ---------------------------------------------------------------------------

/// Counters for one relay invocation, logged when the relay ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    pub chunks: usize,
    pub content_events: usize,
    pub skipped_chunks: usize,
    pub dropped_lines: usize,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Recoverable errors inside the relay loop. Never surfaced to the client.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("chunk is not valid UTF-8: {0}")]
    Decode(#[from] std::str::Utf8Error),

    #[error("malformed JSON payload: {0}")]
    Parse(#[from] serde_json::Error),
}
