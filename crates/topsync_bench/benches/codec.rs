//! Wire codec benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use topsync_bench::{ack_message, random_table};
use topsync_protocol::{decode_instructions, Action, Instruction};

/// Benchmark encoding outbound actions.
fn bench_encode_action(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_action");

    group.bench_function("update", |b| {
        let action = Action::update("name", "Alice Smith");
        b.iter(|| black_box(black_box(&action).encode().unwrap()));
    });

    group.bench_function("press", |b| {
        let action = Action::press("submit");
        b.iter(|| black_box(black_box(&action).encode().unwrap()));
    });

    group.finish();
}

/// Benchmark decoding single-instruction messages.
fn bench_decode_single(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_single");

    for rows in [1, 10, 100, 1000] {
        let message = Instruction::replace("panel", random_table(rows))
            .encode()
            .unwrap();
        group.throughput(Throughput::Bytes(message.len() as u64));
        group.bench_with_input(BenchmarkId::new("replace", rows), &message, |b, message| {
            b.iter(|| black_box(decode_instructions(black_box(message)).unwrap()));
        });
    }

    group.bench_function("alias_envelope", |b| {
        let message = r#"{"Ok":{"replaceContent":{"id":"panel","component":"<p>ok</p>"}}}"#;
        b.iter(|| black_box(decode_instructions(black_box(message)).unwrap()));
    });

    group.finish();
}

/// Benchmark decoding batches.
fn bench_decode_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_batch");

    for count in [10, 100, 1000] {
        let message = ack_message(50, count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &message, |b, message| {
            b.iter(|| black_box(decode_instructions(black_box(message)).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_encode_action,
    bench_decode_single,
    bench_decode_batch,
);

criterion_main!(benches);
