use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use tyche::constants::GAUSS_GRAV_SQUARED;
use tyche::{Body, System};

/// Sun plus `massive` planets on circular orbits plus `massless` particles
/// scattered between 100 and 500 AU.
fn build_system(rng: &mut StdRng, massive: usize, massless: usize) -> System {
    let mut bodies = vec![Body::new("Sun", 1.0, Vector3::zeros(), Vector3::zeros())];

    for i in 0..massive {
        let a = rng.random_range(5.0..40.0);
        let v = (GAUSS_GRAV_SQUARED / a).sqrt();
        let phase: f64 = rng.random_range(0.0..std::f64::consts::TAU);
        bodies.push(Body::new(
            format!("planet-{i}"),
            rng.random_range(1e-5..1e-3),
            Vector3::new(a * phase.cos(), a * phase.sin(), 0.0),
            Vector3::new(-v * phase.sin(), v * phase.cos(), 0.0),
        ));
    }

    for i in 0..massless {
        let a = rng.random_range(100.0..500.0);
        let v = (GAUSS_GRAV_SQUARED / a).sqrt();
        let phase: f64 = rng.random_range(0.0..std::f64::consts::TAU);
        bodies.push(Body::test_particle(
            format!("particle-{i}"),
            Vector3::new(a * phase.cos(), a * phase.sin(), 0.0),
            Vector3::new(-v * phase.sin(), v * phase.cos(), 0.0),
        ));
    }

    System::new(bodies)
}

/// The production shape: a handful of massive bodies, tens of particles.
fn bench_step_search_shape(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0x5EED);
    let system = build_system(&mut rng, 5, 30);

    c.bench_function("leapfrog_step/5_massive_30_particles", |b| {
        b.iter_batched(
            || system.clone(),
            |mut system| {
                for _ in 0..100 {
                    system.step(black_box(5.0));
                }
                black_box(system.time);
            },
            BatchSize::SmallInput,
        )
    });
}

/// Massive-only scaling, where every body is both source and sink.
fn bench_step_all_massive(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0x5EED2);
    let system = build_system(&mut rng, 20, 0);

    c.bench_function("leapfrog_step/20_massive", |b| {
        b.iter_batched(
            || system.clone(),
            |mut system| {
                for _ in 0..100 {
                    system.step(black_box(5.0));
                }
                black_box(system.time);
            },
            BatchSize::SmallInput,
        )
    });
}

/// Energy diagnostic cost, recomputed every 1000 steps during integration.
fn bench_total_energy(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0x5EED3);
    let system = build_system(&mut rng, 5, 30);

    c.bench_function("leapfrog_step/total_energy_5_massive_30_particles", |b| {
        b.iter(|| black_box(system.total_energy()))
    });
}

criterion_group!(
    name = benches;
    config = Criterion::default();
    targets = bench_step_search_shape, bench_step_all_massive, bench_total_energy
);
criterion_main!(benches);
