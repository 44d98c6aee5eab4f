//! # Chainsearch Core
//!
//! Core engine for tree-search inference over classifier chains.
//!
//! A classifier chain predicts `d` binary labels with `d` estimators, each
//! one seeing the input features plus the labels decided before it. Picking
//! the label vector that maximizes a loss is a search over a binary tree of
//! depth `d`. This crate provides:
//! - **Chain model** with validated, batched estimator queries
//! - **Search strategies**: greedy, exhaustive, epsilon approximation, beam
//!   search and Monte Carlo sampling
//! - **Inference harness** with reward replay, label reordering and sharding
//!   across rayon workers

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod chain;
pub mod error;
pub mod search;
pub mod testing;

pub use error::{ChainError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::chain::{ChainModel, Estimator, FeatureBatch, FnEstimator, LogisticEstimator};
    pub use crate::error::{ChainError, Result};
    pub use crate::search::{
        BeamConfig, BeamSearchInferer, EpsilonApproximationInferer, EpsilonConfig,
        ExhaustiveSearchInferer, GreedyInferer, Inference, Inferer, Loss, MonteCarloConfig,
        MonteCarloInferer, Parallelism, SearchConfig, SearchStrategy, StrategyConfig,
    };
}
