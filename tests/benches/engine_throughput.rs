//! Samples per second of the portable output loops

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use dds_core::dds::{DdsTiming, SampleEngine, SoftwareEngine, SweepPlan};
use dds_core::waveform::{WaveBuffer, NOISE, SINE};
use dds_core::StopFlag;
use dds_tests::{CountingDac, StopAfter};

const SAMPLES: u32 = 100_000;

fn bench_phase_loop(c: &mut Criterion) {
    let mut buffer = WaveBuffer::new();
    buffer.load(&SINE);
    let increment = DdsTiming::REFERENCE.accumulator_for(1000.0, 1.0);

    let mut group = c.benchmark_group("engine");
    group.throughput(Throughput::Elements(SAMPLES as u64));

    group.bench_function("phase", |b| {
        b.iter(|| {
            let stop = StopFlag::new();
            let mut engine = SoftwareEngine::new(StopAfter::new(&stop, SAMPLES), DdsTiming::REFERENCE);
            engine.run_phase(&buffer, black_box(increment), &stop);
        })
    });

    group.bench_function("noise", |b| {
        b.iter(|| {
            let stop = StopFlag::new();
            let mut engine = SoftwareEngine::new(StopAfter::new(&stop, SAMPLES), DdsTiming::REFERENCE);
            black_box(engine.run_sequential(&NOISE, 0, &stop))
        })
    });
    group.finish();
}

fn bench_sweep(c: &mut Criterion) {
    let mut buffer = WaveBuffer::new();
    buffer.load(&SINE);
    let plan = SweepPlan::new(&DdsTiming::REFERENCE, 1000.0, 5000.0, 100.0, 1.0);

    c.bench_function("sweep 1k-5k", |b| {
        b.iter(|| {
            let stop = StopFlag::new();
            let mut engine = SoftwareEngine::new(CountingDac::default(), DdsTiming::REFERENCE);
            black_box(engine.run_sweep(&buffer, black_box(&plan), &stop))
        })
    });
}

fn bench_increment(c: &mut Criterion) {
    c.bench_function("accumulator_for", |b| {
        b.iter(|| DdsTiming::REFERENCE.accumulator_for(black_box(1234.5), black_box(1.0001)).raw())
    });
}

criterion_group!(benches, bench_phase_loop, bench_sweep, bench_increment);
criterion_main!(benches);
