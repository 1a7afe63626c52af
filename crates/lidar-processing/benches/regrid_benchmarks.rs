//! Benchmarks for time regridding.
//!
//! Run with: cargo bench --package lidar-processing --bench regrid_benchmarks

use chrono::Duration;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lidar_common::ChannelArray;
use lidar_processing::{regrid, regrid_plan};
use test_utils::{dataset_with_channels, minute_timestamps};

/// One day of minute profiles with every 7th profile missing.
fn gappy_timestamps(n: usize) -> Vec<chrono::DateTime<chrono::Utc>> {
    minute_timestamps(0, n)
        .into_iter()
        .enumerate()
        .filter(|(i, _)| i % 7 != 3)
        .map(|(_, t)| t)
        .collect()
}

fn bench_regrid_plan(c: &mut Criterion) {
    let mut group = c.benchmark_group("regrid_plan");

    for n in [360usize, 1440] {
        let uniform = minute_timestamps(0, n);
        group.bench_with_input(BenchmarkId::new("uniform", n), &uniform, |b, ts| {
            b.iter(|| black_box(regrid_plan(black_box(ts))))
        });

        let gappy = gappy_timestamps(n);
        group.bench_with_input(BenchmarkId::new("gappy", n), &gappy, |b, ts| {
            b.iter(|| black_box(regrid_plan(black_box(ts))))
        });

        let mut jittered = uniform.clone();
        for (i, t) in jittered.iter_mut().enumerate() {
            *t = *t + Duration::seconds((i % 5) as i64 * 7);
        }
        group.bench_with_input(BenchmarkId::new("jittered", n), &jittered, |b, ts| {
            b.iter(|| black_box(regrid_plan(black_box(ts))))
        });
    }

    group.finish();
}

fn bench_regrid_dataset(c: &mut Criterion) {
    let ts = gappy_timestamps(1440);
    let mut dataset = dataset_with_channels(&ts, 500, &[]);
    for name in ["p01 - Pr2 532nm NFOV", "p02 - Pr2 1064nm NFOV", "p03 - Pr2 532nm crosspol NFOV"] {
        dataset
            .insert_channel(name, ChannelArray::filled(ts.len(), 500, 1.0))
            .expect("channel shape");
    }

    c.bench_function("regrid_dataset_3x1440x500", |b| {
        b.iter(|| black_box(regrid(dataset.clone()).expect("regrid")))
    });
}

criterion_group!(benches, bench_regrid_plan, bench_regrid_dataset);
criterion_main!(benches);
