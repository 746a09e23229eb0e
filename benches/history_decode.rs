//! Benchmarks for ride history decoding
//!
//! Measures:
//! - Trackpoint chain decoding, including elevation smoothing
//! - Logpoint decoding along the trackpoint chain
//! - Full track decode with trailing-lap reconstruction
//!
//! Platform: Cross-platform (synthetic flash images, CI-safe)

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use ridelog::history::logpoints::read_logpoint_segments;
use ridelog::history::smoothing::smooth_elevation;
use ridelog::history::trackpoints::read_trackpoint_segments;
use ridelog::test_utils::{Delta, DumpBuilder, LogSegmentSpec, TrackSegmentSpec, synthetic_ride};
use ridelog::{DeviceModel, FlashDump, TrackPoint, read_history};
use std::hint::black_box;

/// Chain of `segments` contiguous segments with 100 deltas each.
fn long_ride(segments: u32) -> FlashDump {
    let mut builder = DumpBuilder::rider20();
    let deltas: Vec<Delta> = (0..100).map(|i| Delta::new(40, -25, (i % 7) as i8 - 3, 4)).collect();

    let mut track_at = 0;
    let mut log_at = 0;
    for n in 0..segments {
        let timestamp = 1_600_000_000 + n * 1000;
        let mut spec = TrackSegmentSpec::new(timestamp, deltas.clone());
        spec.logpoint_offset = log_at;
        if n + 1 < segments {
            spec.next = track_at + spec.len();
        }
        track_at = builder.trackpoint_segment(track_at, &spec);
        log_at = builder.logpoint_segment(log_at, &LogSegmentSpec::new(timestamp, vec![72; 100]));
    }

    builder.build()
}

fn bench_trackpoint_chain(c: &mut Criterion) {
    let layout = DeviceModel::Rider20.layout();
    let mut group = c.benchmark_group("trackpoint_chain");

    for segments in [10u32, 100, 500] {
        let dump = long_ride(segments);
        group.bench_with_input(BenchmarkId::from_parameter(segments), &dump, |b, dump| {
            b.iter(|| {
                let decoded = read_trackpoint_segments(dump, &layout, 0).unwrap();
                black_box(decoded)
            })
        });
    }

    group.finish();
}

fn bench_logpoints(c: &mut Criterion) {
    let layout = DeviceModel::Rider20.layout();
    let mut group = c.benchmark_group("logpoints");

    for segments in [10u32, 100, 500] {
        let dump = long_ride(segments);
        let trackpoints = read_trackpoint_segments(&dump, &layout, 0).unwrap().value;
        group.bench_with_input(BenchmarkId::from_parameter(segments), &dump, |b, dump| {
            b.iter(|| {
                let decoded = read_logpoint_segments(dump, &layout, &trackpoints).unwrap();
                black_box(decoded)
            })
        });
    }

    group.finish();
}

fn bench_smoothing(c: &mut Criterion) {
    let mut group = c.benchmark_group("elevation_smoothing");

    for len in [100usize, 10_000] {
        let points: Vec<TrackPoint> = (0..len)
            .map(|i| TrackPoint {
                timestamp: i as u32,
                longitude: 0.0,
                latitude: 0.0,
                elevation: (i % 50) as f64,
            })
            .collect();
        group.bench_with_input(BenchmarkId::from_parameter(len), &points, |b, points| {
            b.iter(|| {
                let mut points = points.clone();
                smooth_elevation(&mut points);
                black_box(points)
            })
        });
    }

    group.finish();
}

fn bench_full_track(c: &mut Criterion) {
    let dump = synthetic_ride();
    let layout = DeviceModel::Rider20.layout();

    c.bench_function("decode_synthetic_ride", |b| {
        b.iter(|| {
            let tracks = read_history(&dump, layout).unwrap();
            black_box(tracks[0].decode().unwrap())
        })
    });
}

criterion_group!(
    benches,
    bench_trackpoint_chain,
    bench_logpoints,
    bench_smoothing,
    bench_full_track
);
criterion_main!(benches);
