//! Benchmarks for harmonic fitting and Fourier composites.
//!
//! Run with: cargo bench --bench fit_bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use hts::all::*;

/// Create a noisy synthetic collection for benchmarking.
fn create_synthetic_collection(n_observations: usize, n_pixels: usize) -> ImageCollection {
    SyntheticSeries::new("ndvi")
        .with_observations(n_observations)
        .with_pixels(n_pixels)
        .with_offset(0.4)
        .with_harmonic(1, 0.2, -0.1)
        .with_harmonic(2, 0.05, 0.03)
        .with_noise(0.02)
        .with_mask_fraction(0.1)
        .with_seed(Seed::new(42))
        .generate()
        .expect("synthetic collection")
}

fn bench_harmonic_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("harmonic_fit");
    group.sample_size(20);

    for n_pixels in [64, 256, 1024].iter() {
        let collection = create_synthetic_collection(46, *n_pixels);
        group.bench_with_input(BenchmarkId::from_parameter(n_pixels), &collection, |b, collection| {
            b.iter(|| {
                let series = HarmonicTimeSeries::new(collection.clone(), "ndvi", ModeSet::first(3).unwrap())
                    .unwrap()
                    .process()
                    .unwrap();
                black_box(series)
            })
        });
    }

    group.finish();
}

fn bench_fourier_composite(c: &mut Criterion) {
    let mut group = c.benchmark_group("fourier_composite");
    group.sample_size(20);

    let collection = create_synthetic_collection(46, 256);
    group.bench_function("process_256px", |b| {
        b.iter(|| {
            let composite = FourierTransform::new(collection.clone(), "ndvi", ModeSet::first(3).unwrap())
                .unwrap()
                .process()
                .unwrap();
            black_box(composite)
        })
    });

    group.finish();
}

fn bench_median(c: &mut Criterion) {
    let collection = create_synthetic_collection(92, 1024);
    c.bench_function("median_1024px", |b| b.iter(|| black_box(collection.reduce(&Median).unwrap())));
}

criterion_group!(benches, bench_harmonic_fit, bench_fourier_composite, bench_median);
criterion_main!(benches);
