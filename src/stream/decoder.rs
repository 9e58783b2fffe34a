// Copyright 2026 The Chatrelay Project
// SPDX-License-Identifier: Apache-2.0

// SSE line decoder
//
// Synchronous core of the relay. Owns the line buffer and the pending
// UTF-8 tail for one invocation; turns raw chunks into relay events.

use super::types::{RelayError, RelayEvent, RelayStats, SseLine, DONE_SENTINEL};
use crate::completion::DeltaChunk;

/// Longest line kept while waiting for its newline. Longer lines are
/// dropped through the next newline.
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// Classify one complete SSE line.
///
/// Only lines starting with `data:` matter. The prefix may or may not be
/// followed by a space; the payload is trimmed before comparison with the
/// sentinel.
pub fn parse_sse_line(line: &str) -> SseLine<'_> {
    let Some(payload) = line.trim_end().strip_prefix("data:") else {
        return SseLine::Ignored;
    };
    let payload = payload.trim();
    if payload == DONE_SENTINEL {
        SseLine::Done
    } else if payload.is_empty() {
        SseLine::Ignored
    } else {
        SseLine::Data(payload)
    }
}

/// Extract the delta text from a `data:` payload.
///
/// `Ok(None)` covers payloads without a usable fragment: absent path,
/// `null`, or empty string.
fn extract_content(payload: &str) -> Result<Option<String>, RelayError> {
    let chunk: DeltaChunk = serde_json::from_str(payload)?;
    Ok(chunk
        .content()
        .filter(|fragment| !fragment.is_empty())
        .map(str::to_owned))
}

/// Stateful decoder for one relay invocation.
///
/// Invariants:
/// - A partial line is never emitted; it stays in the buffer until its
///   newline arrives or the upstream ends.
/// - At most one `RelayEvent::Done` is ever produced; `finish` produces it
///   if the upstream never did.
/// - Once `Done` has been produced, further input is ignored.
/// - `line_buffer` never holds a newline between calls and never grows past
///   `MAX_LINE_BYTES`.
#[derive(Debug, Default)]
pub struct SseLineDecoder {
    line_buffer: String,
    /// Trailing bytes of an incomplete UTF-8 sequence (at most 3).
    pending: Vec<u8>,
    /// Set after an oversized line was dropped; input is skipped through the
    /// next newline.
    discarding: bool,
    done: bool,
    stats: RelayStats,
}

impl SseLineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the sentinel has been produced.
    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn stats(&self) -> RelayStats {
        self.stats
    }

    /// Feed one raw upstream chunk and return the events it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<RelayEvent> {
        let mut out = Vec::new();
        if self.done {
            return out;
        }
        self.stats.chunks += 1;

        let text = match self.decode(chunk) {
            Ok(text) => text,
            Err(e) => {
                self.stats.skipped_chunks += 1;
                tracing::error!(error = %e, len = chunk.len(), "skipping undecodable chunk");
                return out;
            }
        };

        // The buffered prefix holds no newline, so scanning starts at the new text.
        let mut buffer = std::mem::take(&mut self.line_buffer);
        let mut scan_from = buffer.len();
        buffer.push_str(&text);

        if self.discarding {
            let Some(rel) = buffer[scan_from..].find('\n') else {
                return out;
            };
            self.discarding = false;
            buffer.drain(..scan_from + rel + 1);
            scan_from = 0;
        }

        let mut start = 0;
        while let Some(rel) = buffer[scan_from..].find('\n') {
            let end = scan_from + rel + 1;
            self.process_line(&buffer[start..end], &mut out);
            start = end;
            scan_from = end;
            if self.done {
                return out;
            }
        }
        buffer.drain(..start);

        if buffer.len() > MAX_LINE_BYTES {
            self.stats.dropped_lines += 1;
            self.discarding = true;
            tracing::warn!(
                len = buffer.len(),
                limit = MAX_LINE_BYTES,
                "dropping oversized SSE line"
            );
            buffer.clear();
        }
        self.line_buffer = buffer;
        out
    }

    /// Signal the end of the upstream stream.
    ///
    /// Processes the residual buffer as a final line, then guarantees the
    /// sentinel. Calling it again yields nothing.
    pub fn finish(&mut self) -> Vec<RelayEvent> {
        let mut out = Vec::new();
        if !self.done {
            if !self.pending.is_empty() {
                self.stats.skipped_chunks += 1;
                tracing::error!(
                    len = self.pending.len(),
                    "upstream ended inside a UTF-8 sequence, dropping trailing bytes"
                );
                self.pending.clear();
            }
            let residual = std::mem::take(&mut self.line_buffer);
            if !self.discarding && !residual.trim().is_empty() {
                self.process_line(&residual, &mut out);
            }
        }
        if !self.done {
            self.done = true;
            out.push(RelayEvent::Done);
        }
        out
    }

    /// Decode a chunk, prepending bytes carried over from the previous one.
    ///
    /// An incomplete sequence at the end of the input is carried forward.
    /// Any other invalid byte rejects the whole chunk.
    fn decode(&mut self, chunk: &[u8]) -> Result<String, RelayError> {
        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(chunk);

        match std::str::from_utf8(&bytes) {
            Ok(text) => Ok(text.to_owned()),
            Err(e) if e.error_len().is_none() => {
                let valid = e.valid_up_to();
                self.pending = bytes[valid..].to_vec();
                Ok(String::from_utf8_lossy(&bytes[..valid]).into_owned())
            }
            Err(e) => Err(RelayError::Decode(e)),
        }
    }

    fn process_line(&mut self, line: &str, out: &mut Vec<RelayEvent>) {
        match parse_sse_line(line) {
            SseLine::Data(payload) => match extract_content(payload) {
                Ok(Some(fragment)) => {
                    self.stats.content_events += 1;
                    out.push(RelayEvent::Content(fragment));
                }
                Ok(None) => {}
                Err(e) => {
                    self.stats.dropped_lines += 1;
                    tracing::warn!(
                        line = %line.trim_end(),
                        error = %e,
                        "dropping malformed SSE data line"
                    );
                }
            },
            SseLine::Done => {
                self.done = true;
                out.push(RelayEvent::Done);
            }
            SseLine::Ignored => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_data_line_with_and_without_space() {
        assert_eq!(parse_sse_line(r#"data: {"a":1}"#), SseLine::Data(r#"{"a":1}"#));
        assert_eq!(parse_sse_line(r#"data:{"a":1}"#), SseLine::Data(r#"{"a":1}"#));
    }

    #[test]
    fn parse_sentinel_variants() {
        assert_eq!(parse_sse_line("data: [DONE]"), SseLine::Done);
        assert_eq!(parse_sse_line("data:[DONE]"), SseLine::Done);
        assert_eq!(parse_sse_line("data: [DONE]  \r"), SseLine::Done);
    }

    #[test]
    fn parse_ignores_non_data_lines() {
        assert_eq!(parse_sse_line(""), SseLine::Ignored);
        assert_eq!(parse_sse_line(": OPENROUTER PROCESSING"), SseLine::Ignored);
        assert_eq!(parse_sse_line("event: message"), SseLine::Ignored);
        assert_eq!(parse_sse_line("id: 7"), SseLine::Ignored);
        assert_eq!(parse_sse_line("data:"), SseLine::Ignored);
        assert_eq!(parse_sse_line("data:    "), SseLine::Ignored);
    }

    #[test]
    fn parse_requires_prefix_at_line_start() {
        assert_eq!(parse_sse_line(r#"  data: {"a":1}"#), SseLine::Ignored);
        assert_eq!(parse_sse_line(" data: [DONE]"), SseLine::Ignored);
        assert_eq!(parse_sse_line("\tdata: x"), SseLine::Ignored);
    }

    #[test]
    fn extract_content_skips_empty_fragment() {
        let got = extract_content(r#"{"choices":[{"delta":{"content":""}}]}"#).unwrap();
        assert_eq!(got, None);
    }

    #[test]
    fn extract_content_rejects_bad_json() {
        assert!(matches!(
            extract_content("{not json"),
            Err(RelayError::Parse(_))
        ));
    }

    #[test]
    fn push_holds_partial_line() {
        let mut decoder = SseLineDecoder::new();
        let events = decoder.push(br#"data: {"choices":[{"delta":{"content":"x"}}]}"#);
        assert!(events.is_empty());
        let events = decoder.push(b"\n");
        assert_eq!(events, vec![RelayEvent::Content("x".to_string())]);
    }

    #[test]
    fn oversized_line_is_dropped_and_later_lines_relayed() {
        let mut decoder = SseLineDecoder::new();
        let filler = vec![b'x'; 64 * 1024];
        let mut line = b"data: {\"choices\":[{\"delta\":{\"content\":\"".to_vec();
        let mut events = decoder.push(&line);
        while line.len() <= MAX_LINE_BYTES {
            events.extend(decoder.push(&filler));
            line.extend_from_slice(&filler);
        }
        assert!(events.is_empty());
        assert_eq!(decoder.stats().dropped_lines, 1);

        // The tail of the dropped line is skipped through its newline.
        let events = decoder.push(
            b"data: [DONE]\"}}]}\ndata: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n",
        );
        assert_eq!(events, vec![RelayEvent::Content("ok".to_string())]);
        assert_eq!(decoder.finish(), vec![RelayEvent::Done]);
        assert_eq!(decoder.stats().dropped_lines, 1);
    }

    #[test]
    fn oversized_tail_at_end_of_stream_is_not_processed() {
        let mut decoder = SseLineDecoder::new();
        let line = vec![b'x'; MAX_LINE_BYTES + 1];
        assert!(decoder.push(&line).is_empty());
        assert!(decoder.push(b"data: [DONE]").is_empty());
        assert_eq!(decoder.finish(), vec![RelayEvent::Done]);
        assert_eq!(decoder.stats().dropped_lines, 1);
    }

    #[test]
    fn long_line_in_small_chunks_is_reassembled() {
        let content = "y".repeat(200_000);
        let line = format!("data: {{\"choices\":[{{\"delta\":{{\"content\":\"{content}\"}}}}]}}\n");

        let mut decoder = SseLineDecoder::new();
        let mut events = Vec::new();
        for chunk in line.as_bytes().chunks(7) {
            events.extend(decoder.push(chunk));
        }
        assert_eq!(events, vec![RelayEvent::Content(content)]);
        assert_eq!(decoder.stats().dropped_lines, 0);
    }

    #[test]
    fn finish_is_idempotent() {
        let mut decoder = SseLineDecoder::new();
        assert_eq!(decoder.finish(), vec![RelayEvent::Done]);
        assert!(decoder.finish().is_empty());
        assert!(decoder.push(b"data: [DONE]\n").is_empty());
    }

    #[test]
    fn split_utf8_sequence_is_carried() {
        let line = "data: {\"choices\":[{\"delta\":{\"content\":\"é\"}}]}\n".as_bytes();
        let split = line.iter().position(|&b| b == 0xC3).unwrap() + 1;

        let mut decoder = SseLineDecoder::new();
        assert!(decoder.push(&line[..split]).is_empty());
        let events = decoder.push(&line[split..]);
        assert_eq!(events, vec![RelayEvent::Content("é".to_string())]);
        assert_eq!(decoder.stats().skipped_chunks, 0);
    }

    #[test]
    fn invalid_utf8_chunk_is_skipped() {
        let mut decoder = SseLineDecoder::new();
        assert!(decoder.push(b"data: \xFF\xFE garbage\n").is_empty());
        assert_eq!(decoder.stats().skipped_chunks, 1);

        let events = decoder.push(b"data: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n");
        assert_eq!(events, vec![RelayEvent::Content("ok".to_string())]);
    }

    #[test]
    fn content_event_renders_with_escaping() {
        let event = RelayEvent::Content("say \"hi\"\n".to_string());
        assert_eq!(event.to_sse(), "data: {\"content\": \"say \\\"hi\\\"\\n\"}\n\n");
    }
}
