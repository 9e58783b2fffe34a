// Copyright 2026 The Chatrelay Project
// SPDX-License-Identifier: Apache-2.0

// SSE relay
//
// Responsibilities:
// - Reassemble SSE lines across arbitrary upstream chunk boundaries
// - Carry incomplete UTF-8 sequences into the next chunk
// - Extract `choices[0].delta.content` from each `data:` payload
// - Re-emit `data: {"content": ...}` events
// - Terminate every relay with exactly one `data: [DONE]`
// - Drop malformed lines and undecodable chunks without ending the stream

mod decoder;
mod relay;
mod types;

pub use decoder::{parse_sse_line, SseLineDecoder};
pub use relay::relay;
pub use types::{RelayError, RelayEvent, RelayStats, SseLine, DONE_EVENT, DONE_SENTINEL};
