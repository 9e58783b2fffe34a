// Copyright 2026 The Chatrelay Project
// SPDX-License-Identifier: Apache-2.0

// Async relay adapter
//
// Wraps an upstream byte stream in a lazy stream of normalized SSE frames.
// Nothing is read from upstream until the output is polled. Dropping the
// output drops the upstream stream with it.

use super::decoder::SseLineDecoder;
use super::types::RelayEvent;
use bytes::Bytes;
use futures_util::stream::{Stream, StreamExt};
use std::collections::VecDeque;
use std::fmt::Display;
use std::pin::Pin;

struct RelayState<S> {
    input: Pin<Box<S>>,
    decoder: SseLineDecoder,
    ready: VecDeque<RelayEvent>,
    finished: bool,
}

/// Relay an upstream SSE byte stream as normalized events.
///
/// The output always ends with exactly one `data: [DONE]\n\n`. An error
/// item from upstream ends the read early, the same as end of stream.
pub fn relay<S, E>(input: S) -> impl Stream<Item = Bytes> + Send + 'static
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    let state = RelayState {
        input: Box::pin(input),
        decoder: SseLineDecoder::new(),
        ready: VecDeque::new(),
        finished: false,
    };

    futures_util::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(event) = state.ready.pop_front() {
                return Some((event.into_bytes(), state));
            }
            if state.finished {
                return None;
            }
            if state.decoder.is_done() {
                // Sentinel already emitted; stop reading upstream.
                finish(&mut state);
                continue;
            }

            match state.input.next().await {
                Some(Ok(chunk)) => {
                    let events = state.decoder.push(&chunk);
                    state.ready.extend(events);
                }
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "upstream stream failed, closing relay");
                    finish(&mut state);
                }
                None => finish(&mut state),
            }
        }
    })
}

fn finish<S>(state: &mut RelayState<S>) {
    let events = state.decoder.finish();
    state.ready.extend(events);
    state.finished = true;

    let stats = state.decoder.stats();
    tracing::debug!(
        chunks = stats.chunks,
        content_events = stats.content_events,
        skipped_chunks = stats.skipped_chunks,
        dropped_lines = stats.dropped_lines,
        "relay finished"
    );
}
