//! # Chainsearch
//!
//! Multi-label prediction over classifier chains with pluggable tree search.
//!
//! A fitted classifier chain is usually evaluated greedily, which can miss the
//! most probable label vector. Chainsearch treats prediction as a search over
//! the chain's binary tree:
//! - **Exact**: exhaustive search finds the optimum for small chains
//! - **Bounded**: epsilon approximation and beam search trade accuracy for cost
//! - **Stochastic**: Monte Carlo sampling with explicit, reproducible seeds
//! - **Parallel**: batches can be sharded across the rayon pool
//!
//! ## Quick Start
//!
//! ```rust
//! use chainsearch::prelude::*;
//! use chainsearch::testing::{toy_chain, toy_features};
//!
//! fn main() -> anyhow::Result<()> {
//!     let predictor = ChainPredictor::builder(toy_chain())
//!         .loss("exact_match")
//!         .method("epsilon_approximation")
//!         .epsilon(0.1)
//!         .build()?;
//!
//!     let (labels, visited) = predictor.infer(toy_features(4).view())?;
//!     assert_eq!(labels.ncols(), 3);
//!     assert!(visited < 14.0);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

// Re-export core crate
pub use chainsearch_core::*;

mod predictor;

pub use predictor::{ChainPredictor, PredictorBuilder, PredictorOptions};

/// Commonly used types.
pub mod prelude {
    pub use crate::predictor::{ChainPredictor, PredictorBuilder, PredictorOptions};
    pub use crate::{
        chain::{ChainModel, Estimator, FeatureBatch, FnEstimator, LogisticEstimator},
        error::{ChainError, Result},
        search::{
            Inference, Inferer, Loss, Parallelism, SearchConfig, SearchStrategy, StrategyConfig,
        },
    };

    // Re-export useful external types
    pub use anyhow;
    pub use tracing;
}
