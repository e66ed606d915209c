//! Performance benchmarks for the hospital admin client
//!
//! This benchmark suite measures the local work of a report download:
//! reassembling chunked bodies of various sizes and decoding the response
//! headers. No server is required.
//!
//! Run benchmarks with:
//! ```bash
//! cargo bench
//! ```

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use futures::stream;
use hospital_admin::protocol::{parse_content_disposition, progress_percent};
use hospital_admin::{assemble_chunks, ApiError};

/// Chunk size typical of an HTTP body stream
const CHUNK_SIZE: usize = 16 * 1024;

fn chunked_body(total: usize) -> Vec<Bytes> {
    let mut chunks = Vec::with_capacity(total / CHUNK_SIZE + 1);
    let mut remaining = total;
    while remaining > 0 {
        let size = remaining.min(CHUNK_SIZE);
        chunks.push(Bytes::from(vec![0x25u8; size]));
        remaining -= size;
    }
    chunks
}

/// Benchmark for reassembling report bodies
///
/// Sizes cover a one-page certificate up to a large scanned report.
fn bench_assemble_chunks(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("assemble_chunks");

    for size in [64 * 1024, 1024 * 1024, 8 * 1024 * 1024] {
        let chunks = chunked_body(size);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &chunks, |b, chunks| {
            b.to_async(&rt).iter(|| async {
                let body = stream::iter(chunks.iter().cloned().map(Ok::<_, ApiError>));
                let data = assemble_chunks(body, Some(size as u64), |p| {
                    black_box(p);
                })
                .await
                .unwrap();
                black_box(data);
            });
        });
    }

    group.finish();
}

/// Benchmark for Content-Disposition parsing
fn bench_parse_content_disposition(c: &mut Criterion) {
    let values = [
        "attachment; filename=\"sickleave-1029384756.pdf\"",
        "inline; filename=report.pdf",
        "attachment; filename*=UTF-8''medical-report.pdf",
        "attachment",
    ];

    c.bench_function("parse_content_disposition", |b| {
        b.iter(|| {
            for value in &values {
                black_box(parse_content_disposition(black_box(value)));
            }
        });
    });
}

/// Benchmark for progress arithmetic across a full download
fn bench_progress_percent(c: &mut Criterion) {
    let total = 8 * 1024 * 1024u64;

    c.bench_function("progress_percent_full_download", |b| {
        b.iter(|| {
            let mut received = 0u64;
            while received < total {
                received += CHUNK_SIZE as u64;
                black_box(progress_percent(received, total));
            }
        });
    });
}

criterion_group!(
    benches,
    bench_assemble_chunks,
    bench_parse_content_disposition,
    bench_progress_percent
);
criterion_main!(benches);
