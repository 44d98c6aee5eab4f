//! Fixtures shared by unit tests, integration tests, benches and examples.

use crate::chain::{ChainModel, Estimator, FnEstimator, LogisticEstimator};
use ndarray::{Array1, Array2, ArrayView1};
use rand::prelude::*;

/// A depth-3 chain with fixed conditional probabilities.
///
/// Written as `[P(label = 0), P(label = 1)]` per node:
///
/// ```text
/// node(0)    = [0.7, 0.3]
/// node(1|0)  = [0.6, 0.4]    node(1|1)  = [0.2, 0.8]
/// node(2|00) = [0.9, 0.1]    node(2|01) = [0.5, 0.5]
/// node(2|10) = [0.4, 0.6]    node(2|11) = [0.3, 0.7]
/// ```
///
/// Under exact match the best path is `[0, 0, 0]` with 0.378, which is also
/// the greedy path. Rows have a single, ignored feature column.
pub fn toy_chain() -> ChainModel {
    let root = FnEstimator::new(|_: ArrayView1<'_, f64>| 0.3);
    let second = FnEstimator::new(|row: ArrayView1<'_, f64>| if row[1] > 0.5 { 0.8 } else { 0.4 });
    let third = FnEstimator::new(|row: ArrayView1<'_, f64>| match (row[1] > 0.5, row[2] > 0.5) {
        (false, false) => 0.1,
        (false, true) => 0.5,
        (true, false) => 0.6,
        (true, true) => 0.7,
    });

    ChainModel::in_label_order(vec![
        Box::new(root) as Box<dyn Estimator>,
        Box::new(second),
        Box::new(third),
    ])
    .expect("toy chain is well formed")
}

/// A chain of random logistic estimators with a random label order.
pub fn random_logistic_chain(depth: usize, num_features: usize, seed: u64) -> ChainModel {
    let mut rng = StdRng::seed_from_u64(seed);
    let estimators: Vec<Box<dyn Estimator>> = (0..depth)
        .map(|i| {
            let weights: Array1<f64> = (0..num_features + i).map(|_| rng.gen_range(-2.0..2.0)).collect();
            let intercept = rng.gen_range(-1.0..1.0);
            Box::new(LogisticEstimator::new(weights, intercept)) as Box<dyn Estimator>
        })
        .collect();

    let mut order: Vec<usize> = (0..depth).collect();
    order.shuffle(&mut rng);

    ChainModel::new(estimators, order).expect("random chain is well formed")
}

/// Uniform features in `[-1, 1)`.
pub fn random_features(rows: usize, cols: usize, seed: u64) -> Array2<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    Array2::from_shape_simple_fn((rows, cols), || rng.gen_range(-1.0..1.0))
}

/// `rows` copies of a single zero feature, for the toy chain.
pub fn toy_features(rows: usize) -> Array2<f64> {
    Array2::zeros((rows, 1))
}
