//! Patch application benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use topsync_bench::{ack_message, form_markup, random_table};
use topsync_client::{
    parse_fragment, ClientConfig, Endpoint, ManualTimer, MemoryDocument, MockTransport,
    PatchApplier, SyncClient,
};
use topsync_protocol::Instruction;

/// Benchmark markup parsing.
fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_fragment");

    for rows in [10, 100, 1000] {
        let markup = random_table(rows);
        group.bench_with_input(BenchmarkId::from_parameter(rows), &markup, |b, markup| {
            b.iter(|| black_box(parse_fragment(black_box(markup)).unwrap()));
        });
    }

    group.finish();
}

/// Benchmark structural patches against documents of growing size.
fn bench_replace(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply_replace");
    let applier = PatchApplier::default();
    let patch = Instruction::replace("panel", random_table(20));

    for fields in [10, 100, 1000] {
        let document = MemoryDocument::from_markup(&form_markup(fields)).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(fields), &document, |b, document| {
            b.iter_batched(
                || document.clone(),
                |mut doc| {
                    applier.apply(&mut doc, &patch).unwrap();
                    doc
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

/// Benchmark a client processing acknowledgment batches.
fn bench_client_acks(c: &mut Criterion) {
    let mut group = c.benchmark_group("client_acks");

    for fields in [10, 100] {
        let message = ack_message(fields, fields);
        group.bench_with_input(BenchmarkId::from_parameter(fields), &message, |b, message| {
            b.iter_batched(
                || {
                    let document = MemoryDocument::from_markup(&form_markup(fields)).unwrap();
                    let config = ClientConfig::new(Endpoint::new("ws://bench/"));
                    let mut client =
                        SyncClient::new(config, MockTransport::new(), document, ManualTimer::new());
                    let conn = client.connect();
                    client.on_open(conn);
                    (client, conn)
                },
                |(mut client, conn)| {
                    client.on_message(conn, black_box(message));
                    client
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_parse, bench_replace, bench_client_acks);

criterion_main!(benches);
