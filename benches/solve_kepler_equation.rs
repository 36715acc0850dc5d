use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use tyche::kepler::solve_kepler;

/// Uniform random in [0, 2π)
#[inline]
fn rand_angle(rng: &mut StdRng) -> f64 {
    rng.random::<f64>() * std::f64::consts::TAU
}

/// Typical regime: e ∈ [0.0, 0.7]
fn bench_typical(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0xDEADBEEF);
    let samples = 10_000usize;

    c.bench_function("solve_kepler_equation/typical_e<=0.7", |b| {
        b.iter_batched(
            || {
                // Pre-generate inputs to avoid RNG cost in the timed section
                (0..samples)
                    .map(|_| (rand_angle(&mut rng), rng.random_range(0.0..=0.7)))
                    .collect::<Vec<_>>()
            },
            |cases| {
                for (mean_anomaly, e) in cases {
                    let ecc_anomaly =
                        solve_kepler(black_box(mean_anomaly), black_box(e)).unwrap();
                    black_box(ecc_anomaly);
                }
            },
            BatchSize::LargeInput,
        )
    });
}

/// High-eccentricity (still elliptic): e ∈ [0.8, 0.95], the π initial guess path
fn bench_high_e(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0xBADF00D);
    let samples = 10_000usize;

    c.bench_function("solve_kepler_equation/high_e_0.8..0.95", |b| {
        b.iter_batched(
            || {
                (0..samples)
                    .map(|_| (rand_angle(&mut rng), rng.random_range(0.8..0.95)))
                    .collect::<Vec<_>>()
            },
            |cases| {
                for (mean_anomaly, e) in cases {
                    let _ = solve_kepler(black_box(mean_anomaly), black_box(e));
                }
            },
            BatchSize::LargeInput,
        )
    });
}

/// Near-circular regime: e ≈ 1e-12, converges in one iteration
fn bench_near_circular(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0xFEEDFACE);
    let samples = 10_000usize;
    let e = 1e-12;

    c.bench_function("solve_kepler_equation/near_circular_e=1e-12", |b| {
        b.iter_batched(
            || {
                (0..samples)
                    .map(|_| rand_angle(&mut rng))
                    .collect::<Vec<_>>()
            },
            |cases| {
                for mean_anomaly in cases {
                    let ecc_anomaly =
                        solve_kepler(black_box(mean_anomaly), black_box(e)).unwrap();
                    black_box(ecc_anomaly);
                }
            },
            BatchSize::LargeInput,
        )
    });
}

/// Fixed stress case near the stiff corner: high e, mean anomaly near perihelion
fn bench_fixed_stress(c: &mut Criterion) {
    let e = 0.95_f64;
    let mean_anomaly = 0.05_f64;

    c.bench_function("solve_kepler_equation/fixed_stress_case", |b| {
        b.iter(|| {
            let ecc_anomaly = solve_kepler(black_box(mean_anomaly), black_box(e));
            black_box(ecc_anomaly.ok());
        })
    });
}

criterion_group!(
    name = benches;
    config = Criterion::default();
    targets = bench_typical, bench_high_e, bench_near_circular, bench_fixed_stress
);
criterion_main!(benches);
