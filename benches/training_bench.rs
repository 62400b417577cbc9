//! Benchmarks for the Q-routing training pipeline.
//!
//! All benchmark inputs are constructed from fixed, deterministic data; no
//! OS entropy is used, and every training run is seeded. This ensures that
//! benchmark numbers are reproducible and that the benchmark harness itself
//! cannot introduce non-determinism.
//!
//! Run with:
//!
//! ```bash
//! cargo bench
//! ```
//!
//! Criterion HTML reports are written to `target/criterion/`.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::Array4;
use qtract_train::{
    config::TrainingConfig,
    cost::CostModel,
    lattice::OffsetCatalog,
    qtable::QTable,
    trainer::Trainer,
    NUM_ACTIONS,
};

/// Deterministic likelihood volume: smoothly varying, strictly positive.
fn sample_volume(nx: usize, ny: usize, nz: usize) -> Array4<f32> {
    Array4::from_shape_fn((nx, ny, nz, NUM_ACTIONS), |(x, y, z, a)| {
        0.05 + ((x + 2 * y + 3 * z + a) % 11) as f32 / 12.0
    })
}

fn sample_model(nx: usize, ny: usize, nz: usize) -> CostModel {
    CostModel::from_likelihoods(sample_volume(nx, ny, nz), OffsetCatalog::reference())
        .expect("benchmark volume must be valid")
}

// ─────────────────────────────────────────────────────────────────────────────
// Cost-model construction benchmarks
// ─────────────────────────────────────────────────────────────────────────────

/// Benchmark cost-model construction (log transform + boundary masking) for
/// varying lattice extents.
fn bench_cost_model_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("cost_model_build");

    for n in [8_usize, 16, 32] {
        let volume = sample_volume(n, n, n);

        group.bench_with_input(BenchmarkId::new("extent", n), &n, |b, _| {
            b.iter(|| {
                let _ = CostModel::from_likelihoods(
                    black_box(volume.clone()),
                    OffsetCatalog::reference(),
                );
            });
        });
    }

    group.finish();
}

// ─────────────────────────────────────────────────────────────────────────────
// Training-loop benchmarks
// ─────────────────────────────────────────────────────────────────────────────

/// Benchmark a complete seeded run of 10 000 value updates on an 8³ lattice.
///
/// The trainer consumes its cost model, so construction is part of the
/// measured routine; at this budget the updates dominate.
fn bench_train_10k_steps(c: &mut Criterion) {
    let volume = sample_volume(8, 8, 8);
    let mut config = TrainingConfig::default();
    config.iterations = 10_000;
    config.snapshot_interval = 10_000;
    config.log_interval = u64::MAX / 2;
    config.seed = 42;

    c.bench_function("train_10k_steps_8x8x8", |b| {
        b.iter(|| {
            let costs =
                CostModel::from_likelihoods(black_box(volume.clone()), OffsetCatalog::reference())
                    .expect("benchmark volume must be valid");
            let trainer =
                Trainer::new(costs, config.clone()).expect("benchmark config must be valid");
            let _ = trainer.run();
        });
    });
}

/// Benchmark full runs at varying iteration budgets to expose per-update
/// throughput.
fn bench_train_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("train_scaling");
    group.sample_size(10);

    for iterations in [1_000_u64, 10_000, 50_000] {
        let volume = sample_volume(8, 8, 8);
        let mut config = TrainingConfig::default();
        config.iterations = iterations;
        config.snapshot_interval = iterations;
        config.log_interval = u64::MAX / 2;
        config.seed = 42;

        group.bench_with_input(
            BenchmarkId::new("iterations", iterations),
            &iterations,
            |b, _| {
                b.iter(|| {
                    let costs = CostModel::from_likelihoods(
                        black_box(volume.clone()),
                        OffsetCatalog::reference(),
                    )
                    .expect("benchmark volume must be valid");
                    let trainer = Trainer::new(costs, config.clone())
                        .expect("benchmark config must be valid");
                    let _ = trainer.run();
                });
            },
        );
    }

    group.finish();
}

// ─────────────────────────────────────────────────────────────────────────────
// Q-table benchmarks
// ─────────────────────────────────────────────────────────────────────────────

/// Benchmark the feasible-entry sum over a 32³ table (the per-snapshot
/// convergence statistic).
fn bench_feasible_sum(c: &mut Criterion) {
    let qtable = QTable::from_costs(&sample_model(32, 32, 32));

    c.bench_function("feasible_sum_32x32x32", |b| {
        b.iter(|| {
            let _ = black_box(&qtable).feasible_sum();
        });
    });
}

/// Benchmark the feasible-action scan for a single interior voxel (the hot
/// path of every training step).
fn bench_feasible_actions(c: &mut Criterion) {
    let model = sample_model(16, 16, 16);
    let mut scratch = Vec::with_capacity(NUM_ACTIONS);

    c.bench_function("feasible_actions_interior", |b| {
        b.iter(|| {
            model.feasible_actions(black_box([8, 8, 8]), &mut scratch);
            let _ = scratch.len();
        });
    });
}

// ─────────────────────────────────────────────────────────────────────────────
// Config benchmarks
// ─────────────────────────────────────────────────────────────────────────────

/// Benchmark `TrainingConfig::validate()` to ensure it stays O(1).
fn bench_config_validate(c: &mut Criterion) {
    let config = TrainingConfig::default();
    c.bench_function("config_validate", |b| {
        b.iter(|| {
            let _ = black_box(&config).validate();
        });
    });
}

// ─────────────────────────────────────────────────────────────────────────────
// Criterion registration
// ─────────────────────────────────────────────────────────────────────────────

criterion_group!(
    benches,
    // Cost model
    bench_cost_model_build,
    // Training loop
    bench_train_10k_steps,
    bench_train_scaling,
    // Q-table
    bench_feasible_sum,
    bench_feasible_actions,
    // Config
    bench_config_validate,
);
criterion_main!(benches);
