//! Benchmarks comparing search strategies on random logistic chains.
//!
//! # Key Comparisons
//!
//! 1. **Exhaustive vs approximate**: cost of the optimum as depth grows
//! 2. **Beam width**: linear growth in estimator rows
//! 3. **Monte Carlo**: plain vs prefix-sharing batching
//! 4. **Sharding**: sequential vs rayon-sharded batches

use chainsearch_core::search::{
    BeamConfig, BeamSearchInferer, EpsilonApproximationInferer, EpsilonConfig,
    ExhaustiveSearchInferer, GreedyInferer, Inferer, Loss, MonteCarloConfig, MonteCarloInferer,
    Parallelism, SearchStrategy,
};
use chainsearch_core::testing::{random_features, random_logistic_chain};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ndarray::Array2;
use std::sync::Arc;

const NUM_FEATURES: usize = 16;
const ROWS: usize = 256;

fn setup(depth: usize) -> (Arc<chainsearch_core::chain::ChainModel>, Array2<f64>) {
    (
        Arc::new(random_logistic_chain(depth, NUM_FEATURES, 1)),
        random_features(ROWS, NUM_FEATURES, 2),
    )
}

fn run(inferer: &Inferer, x: &Array2<f64>) {
    black_box(inferer.infer(x.view()).unwrap());
}

fn bench_depth_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("depth_scaling");
    group.throughput(Throughput::Elements(ROWS as u64));

    for depth in [4, 8, 12].iter() {
        let (chain, x) = setup(*depth);
        let strategies: Vec<(&str, Box<dyn SearchStrategy>)> = vec![
            ("greedy", Box::new(GreedyInferer::new(Loss::ExactMatch))),
            ("exhaustive", Box::new(ExhaustiveSearchInferer::new(Loss::ExactMatch))),
            (
                "epsilon_0.1",
                Box::new(EpsilonApproximationInferer::new(Loss::ExactMatch, EpsilonConfig { epsilon: 0.1 }).unwrap()),
            ),
            (
                "beam_4",
                Box::new(BeamSearchInferer::new(Loss::ExactMatch, BeamConfig { beam_width: 4 }).unwrap()),
            ),
        ];

        for (name, strategy) in strategies {
            let inferer = Inferer::from_boxed(chain.clone(), strategy);
            group.bench_with_input(BenchmarkId::new(name, depth), depth, |b, _| {
                b.iter(|| run(&inferer, &x))
            });
        }
    }

    group.finish();
}

fn bench_beam_width(c: &mut Criterion) {
    let mut group = c.benchmark_group("beam_width");
    let (chain, x) = setup(10);

    for beam_width in [1, 4, 16, 64].iter() {
        let strategy = BeamSearchInferer::new(Loss::ExactMatch, BeamConfig { beam_width: *beam_width }).unwrap();
        let inferer = Inferer::new(chain.clone(), strategy);
        group.bench_with_input(BenchmarkId::new("beam", beam_width), beam_width, |b, _| {
            b.iter(|| run(&inferer, &x))
        });
    }

    group.finish();
}

fn bench_monte_carlo(c: &mut Criterion) {
    let mut group = c.benchmark_group("monte_carlo");
    let (chain, x) = setup(10);

    for num_samples in [10, 50, 200].iter() {
        let config = MonteCarloConfig {
            num_samples: *num_samples,
            random_seed: Some(7),
        };

        let plain = Inferer::new(chain.clone(), MonteCarloInferer::new(Loss::ExactMatch, config).unwrap());
        group.bench_with_input(BenchmarkId::new("plain", num_samples), num_samples, |b, _| {
            b.iter(|| run(&plain, &x))
        });

        let shared = Inferer::new(chain.clone(), MonteCarloInferer::efficient(Loss::ExactMatch, config).unwrap());
        group.bench_with_input(BenchmarkId::new("shared_prefix", num_samples), num_samples, |b, _| {
            b.iter(|| run(&shared, &x))
        });
    }

    group.finish();
}

fn bench_sharding(c: &mut Criterion) {
    let mut group = c.benchmark_group("sharding");
    let (chain, x) = setup(12);

    for (name, parallelism) in [
        ("sequential", Parallelism::Sequential),
        ("shards_32", Parallelism::Sharded { shard_size: 32 }),
    ] {
        let inferer = Inferer::new(chain.clone(), ExhaustiveSearchInferer::new(Loss::ExactMatch))
            .with_parallelism(parallelism);
        group.bench_function(name, |b| b.iter(|| run(&inferer, &x)));
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_depth_scaling,
    bench_beam_width,
    bench_monte_carlo,
    bench_sharding,
);
criterion_main!(benches);
