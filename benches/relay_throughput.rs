// Copyright 2026 The Chatrelay Project
// SPDX-License-Identifier: Apache-2.0

//! Relay throughput benchmarks.
//!
//! Measures:
//! - Line decoding of a typical transcript under different chunkings
//! - The full async relay over an in-memory upstream
//!
//! Run: cargo bench --bench relay_throughput

use std::convert::Infallible;

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use futures_util::StreamExt;

use chatrelay::stream::{relay, SseLineDecoder};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A transcript of `deltas` content events plus keep-alive comments.
fn transcript(deltas: usize) -> Vec<u8> {
    let mut out = String::new();
    for i in 0..deltas {
        if i % 50 == 0 {
            out.push_str(": OPENROUTER PROCESSING\n\n");
        }
        out.push_str(&format!(
            "data: {{\"id\":\"gen-1\",\"model\":\"m\",\"choices\":[{{\"index\":0,\"delta\":{{\"content\":\"token {i} \u{1F33E}\"}}}}]}}\n\n"
        ));
    }
    out.push_str("data: [DONE]\n\n");
    out.into_bytes()
}

fn bench_decoder(c: &mut Criterion) {
    let data = transcript(500);
    let mut group = c.benchmark_group("decoder");
    group.throughput(Throughput::Bytes(data.len() as u64));

    for chunk_size in [7usize, 64, 1024, data.len()] {
        group.bench_with_input(
            BenchmarkId::from_parameter(chunk_size),
            &chunk_size,
            |b, &chunk_size| {
                b.iter(|| {
                    let mut decoder = SseLineDecoder::new();
                    let mut events = 0usize;
                    for chunk in data.chunks(chunk_size) {
                        events += decoder.push(black_box(chunk)).len();
                    }
                    events += decoder.finish().len();
                    black_box(events)
                });
            },
        );
    }
    group.finish();
}

fn bench_relay(c: &mut Criterion) {
    let data = transcript(500);
    let chunks: Vec<Bytes> = data.chunks(256).map(Bytes::copy_from_slice).collect();
    let rt = tokio::runtime::Runtime::new().unwrap();

    let mut group = c.benchmark_group("relay");
    group.throughput(Throughput::Bytes(data.len() as u64));
    group.bench_function("transcript_500_chunk_256", |b| {
        b.to_async(&rt).iter(|| async {
            let input =
                futures_util::stream::iter(chunks.clone().into_iter().map(Ok::<_, Infallible>));
            let frames = relay(input).count().await;
            black_box(frames)
        });
    });
    group.finish();
}

criterion_group!(benches, bench_decoder, bench_relay);
criterion_main!(benches);
