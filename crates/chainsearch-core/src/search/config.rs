//! Strategy selection by name or from a serialized configuration.
//!
//! ```
//! use chainsearch_core::search::{SearchConfig, StrategyConfig};
//!
//! let config: SearchConfig = serde_json::from_str(
//!     r#"{ "loss": "hamming", "method": "beam_search", "beam_width": 8 }"#,
//! )
//! .unwrap();
//! assert_eq!(config.strategy.name(), "beam_search");
//! let strategy = config.build().unwrap();
//! assert_eq!(strategy.name(), "beam_search");
//! ```

use super::beam::{BeamConfig, BeamSearchInferer};
use super::epsilon::{EpsilonApproximationInferer, EpsilonConfig};
use super::exhaustive::{ExhaustiveConfig, ExhaustiveSearchInferer};
use super::greedy::GreedyInferer;
use super::harness::SearchStrategy;
use super::monte_carlo::{MonteCarloConfig, MonteCarloInferer};
use super::score::Loss;
use crate::error::{ChainError, Result};
use serde::{Deserialize, Serialize};

/// A strategy together with its parameters.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum StrategyConfig {
    /// Arg-max label at every node.
    #[default]
    Greedy,
    /// Every leaf, optimal.
    ExhaustiveSearch(ExhaustiveConfig),
    /// Prune unlikely low branches.
    EpsilonApproximation(EpsilonConfig),
    /// Keep the best few paths per depth.
    BeamSearch(BeamConfig),
    /// Sample paths, one query per trial.
    MonteCarlo(MonteCarloConfig),
    /// Sample paths, one query per distinct prefix.
    EfficientMonteCarlo(MonteCarloConfig),
}

impl StrategyConfig {
    /// All recognized method names.
    pub const NAMES: [&'static str; 6] = [
        "greedy",
        "exhaustive_search",
        "epsilon_approximation",
        "beam_search",
        "monte_carlo",
        "efficient_monte_carlo",
    ];

    /// Default parameters for a method name.
    pub fn from_name(name: &str) -> Result<Self> {
        Ok(match name {
            "greedy" => Self::Greedy,
            "exhaustive_search" => Self::ExhaustiveSearch(ExhaustiveConfig::default()),
            "epsilon_approximation" => Self::EpsilonApproximation(EpsilonConfig::default()),
            "beam_search" => Self::BeamSearch(BeamConfig::default()),
            "monte_carlo" => Self::MonteCarlo(MonteCarloConfig::default()),
            "efficient_monte_carlo" => Self::EfficientMonteCarlo(MonteCarloConfig::default()),
            other => return Err(ChainError::UnknownStrategy(other.to_string())),
        })
    }

    /// Method name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Greedy => "greedy",
            Self::ExhaustiveSearch(_) => "exhaustive_search",
            Self::EpsilonApproximation(_) => "epsilon_approximation",
            Self::BeamSearch(_) => "beam_search",
            Self::MonteCarlo(_) => "monte_carlo",
            Self::EfficientMonteCarlo(_) => "efficient_monte_carlo",
        }
    }

    /// Validate parameters and construct the strategy.
    pub fn build(&self, loss: Loss) -> Result<Box<dyn SearchStrategy>> {
        Ok(match *self {
            Self::Greedy => Box::new(GreedyInferer::new(loss)),
            Self::ExhaustiveSearch(config) => Box::new(ExhaustiveSearchInferer::with_config(loss, config)),
            Self::EpsilonApproximation(config) => Box::new(EpsilonApproximationInferer::new(loss, config)?),
            Self::BeamSearch(config) => Box::new(BeamSearchInferer::new(loss, config)?),
            Self::MonteCarlo(config) => Box::new(MonteCarloInferer::new(loss, config)?),
            Self::EfficientMonteCarlo(config) => Box::new(MonteCarloInferer::efficient(loss, config)?),
        })
    }
}

/// Loss plus strategy, as read from a configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Loss to optimize.
    #[serde(default)]
    pub loss: Loss,
    /// Strategy and its parameters.
    #[serde(flatten)]
    pub strategy: StrategyConfig,
}

impl SearchConfig {
    /// Construct the configured strategy.
    pub fn build(&self) -> Result<Box<dyn SearchStrategy>> {
        self.strategy.build(self.loss)
    }
}
