//! Benchmarks for scripting and replaying test streams

use chrono::Duration;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use test_stream::domain::{EventSequence, EventTime, TestStream, VarIntCoder};
use test_stream::replay::{attach, ChannelIntake, RecordingIntake};

fn script(batches: i64, batch_size: i64) -> EventSequence {
    let mut builder = TestStream::create(VarIntCoder);
    for batch in 0..batches {
        let ts = EventTime::from_millis(batch * 10);
        builder
            .add_elements_at(ts, batch, (1..batch_size).map(|n| batch * batch_size + n))
            .expect("on-time batch")
            .advance_processing_time(Duration::milliseconds(5))
            .expect("positive advance")
            .advance_watermark_to(ts)
            .expect("monotonic watermark");
    }
    builder.advance_watermark_to_infinity();
    builder.build().expect("non-empty script")
}

fn benchmark_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");
    for batches in [10, 100, 1_000] {
        group.throughput(Throughput::Elements(batches as u64 * 16));
        group.bench_with_input(BenchmarkId::from_parameter(batches), &batches, |b, &n| {
            b.iter(|| black_box(script(n, 16)))
        });
    }
    group.finish();
}

fn benchmark_replay(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
    let sequence = script(1_000, 16);

    let mut group = c.benchmark_group("replay");
    group.throughput(Throughput::Elements(sequence.element_count() as u64));

    group.bench_function("recording_intake", |b| {
        b.to_async(&runtime).iter(|| async {
            let report = attach(sequence.clone(), RecordingIntake::new())
                .run()
                .await
                .expect("replay");
            black_box(report)
        })
    });

    group.bench_function("channel_intake", |b| {
        b.to_async(&runtime).iter(|| async {
            let (intake, mut rx) = ChannelIntake::bounded(64);
            let drain = tokio::spawn(async move { while rx.recv().await.is_some() {} });
            let report = attach(sequence.clone(), intake)
                .run()
                .await
                .expect("replay");
            drain.await.expect("drain task");
            black_box(report)
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark_build, benchmark_replay);
criterion_main!(benches);
