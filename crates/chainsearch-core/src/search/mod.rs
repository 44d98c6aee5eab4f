//! Tree search algorithms for classifier-chain inference.
//!
//! A chain of depth d defines a binary tree whose leaves are complete label
//! vectors. Every strategy here walks that tree for a batch of rows and picks
//! one leaf per row:
//! - **Greedy** takes the arg-max branch at every node
//! - **Exhaustive** visits every leaf and is optimal
//! - **Epsilon approximation** prunes low branches whose path score drops below epsilon
//! - **Beam search** keeps the best `b` partial paths per depth
//! - **Monte Carlo** samples paths from the chain, optionally sharing prefixes
//!
//! # Architecture
//!
//! | Component | Purpose |
//! |-----------|---------|
//! | [`ScoreAccumulator`] | Combines branch probabilities under a [`Loss`] |
//! | [`SearchStrategy`] | One traversal over a batch |
//! | [`Inferer`] | Sharding, reward replay, label reordering |
//! | [`StrategyConfig`] | Selects a strategy by name |
//!
//! # Example
//!
//! ```
//! use chainsearch_core::search::{BeamConfig, BeamSearchInferer, Inferer, Loss};
//! use chainsearch_core::testing::{toy_chain, toy_features};
//! use std::sync::Arc;
//!
//! let chain = Arc::new(toy_chain());
//! let beam = BeamSearchInferer::new(Loss::ExactMatch, BeamConfig { beam_width: 2 }).unwrap();
//! let inferer = Inferer::new(chain, beam);
//!
//! let x = toy_features(1);
//! let (prediction, visited) = inferer.infer(x.view()).unwrap();
//! assert_eq!(prediction.row(0).to_vec(), vec![false, false, false]);
//! assert_eq!(visited, 5.0);
//! ```
//!
//! # Cost
//!
//! | Strategy | Estimator rows per input row |
//! |----------|-----------------------------|
//! | [`GreedyInferer`] | `d` |
//! | [`ExhaustiveSearchInferer`] | `2^d - 1` |
//! | [`EpsilonApproximationInferer`] | `O(d / epsilon)` |
//! | [`BeamSearchInferer`] | `O(d * b)` |
//! | [`MonteCarloInferer`] | `d * q` (plain), fewer when sharing prefixes |

mod beam;
mod config;
mod epsilon;
mod exhaustive;
mod frontier;
mod greedy;
mod harness;
mod monte_carlo;
mod score;

pub use beam::{BeamConfig, BeamSearchInferer};
pub use config::{SearchConfig, StrategyConfig};
pub use epsilon::{EpsilonApproximationInferer, EpsilonConfig};
pub use exhaustive::{ExhaustiveConfig, ExhaustiveSearchInferer};
pub use frontier::{branch_probability, greedy_label, prefer, prefix_matrix, BestPaths, PathState};
pub use greedy::GreedyInferer;
pub use harness::{
    replay_rewards, reorder_columns, restore_label_order, Inference, Inferer, Parallelism,
    SearchStats, SearchStrategy, Traversal,
};
pub use monte_carlo::{trial_rng, MonteCarloConfig, MonteCarloInferer, Sampling};
pub use score::{Loss, PathScore, ScoreAccumulator};
