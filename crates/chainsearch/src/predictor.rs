//! High-level multi-label predictor.

use anyhow::{Context, Result};
use chainsearch_core::{
    chain::ChainModel,
    search::{
        Inference, Inferer, Loss, MonteCarloConfig, MonteCarloInferer, Parallelism, SearchConfig,
        StrategyConfig,
    },
};
use ndarray::{Array2, ArrayView2};
use std::sync::Arc;
use tracing::{debug, warn};

/// Options collected by [`PredictorBuilder`] before validation.
#[derive(Debug, Clone)]
pub struct PredictorOptions {
    /// Loss name, `exact_match` or `hamming`.
    pub loss: String,
    /// Strategy name, see [`StrategyConfig::NAMES`].
    pub method: String,
    /// Pruning threshold for `epsilon_approximation`.
    pub epsilon: Option<f64>,
    /// Beam width for `beam_search`.
    pub beam_width: Option<usize>,
    /// Samples per row for the Monte Carlo strategies.
    pub num_samples: Option<usize>,
    /// Seed for the Monte Carlo strategies.
    pub random_seed: Option<u64>,
    /// Depth limit for `exhaustive_search`.
    pub max_depth: Option<usize>,
    /// Rows per rayon shard; sequential when unset.
    pub shard_size: Option<usize>,
}

impl Default for PredictorOptions {
    fn default() -> Self {
        Self {
            loss: Loss::default().as_str().to_string(),
            method: "greedy".to_string(),
            epsilon: None,
            beam_width: None,
            num_samples: None,
            random_seed: None,
            max_depth: None,
            shard_size: None,
        }
    }
}

/// Builder for creating a [`ChainPredictor`].
pub struct PredictorBuilder {
    chain: Arc<ChainModel>,
    options: PredictorOptions,
}

impl PredictorBuilder {
    /// Create a builder for a fitted chain.
    pub fn new(chain: impl Into<Arc<ChainModel>>) -> Self {
        Self {
            chain: chain.into(),
            options: PredictorOptions::default(),
        }
    }

    /// Set the loss by name.
    pub fn loss(mut self, loss: impl Into<String>) -> Self {
        self.options.loss = loss.into();
        self
    }

    /// Set the search strategy by name.
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.options.method = method.into();
        self
    }

    /// Set epsilon.
    pub fn epsilon(mut self, epsilon: f64) -> Self {
        self.options.epsilon = Some(epsilon);
        self
    }

    /// Set beam width.
    pub fn beam_width(mut self, width: usize) -> Self {
        self.options.beam_width = Some(width);
        self
    }

    /// Set the number of Monte Carlo samples per row.
    pub fn num_samples(mut self, n: usize) -> Self {
        self.options.num_samples = Some(n);
        self
    }

    /// Set the Monte Carlo seed.
    pub fn random_seed(mut self, seed: u64) -> Self {
        self.options.random_seed = Some(seed);
        self
    }

    /// Set the exhaustive search depth limit.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.options.max_depth = Some(depth);
        self
    }

    /// Split batches into shards of `rows` rows, run on the rayon pool.
    pub fn shards(mut self, rows: usize) -> Self {
        self.options.shard_size = Some(rows);
        self
    }

    /// Validate the options and build the predictor.
    pub fn build(self) -> Result<ChainPredictor> {
        let options = self.options;
        let loss: Loss = options.loss.parse()?;
        let mut strategy = StrategyConfig::from_name(&options.method)?;

        let mut unused = Vec::new();
        match &mut strategy {
            StrategyConfig::EpsilonApproximation(config) => {
                if let Some(epsilon) = options.epsilon {
                    config.epsilon = epsilon;
                }
            }
            _ if options.epsilon.is_some() => unused.push("epsilon"),
            _ => {}
        }
        match &mut strategy {
            StrategyConfig::BeamSearch(config) => {
                if let Some(width) = options.beam_width {
                    config.beam_width = width;
                }
            }
            _ if options.beam_width.is_some() => unused.push("beam_width"),
            _ => {}
        }
        match &mut strategy {
            StrategyConfig::ExhaustiveSearch(config) => {
                if let Some(depth) = options.max_depth {
                    config.max_depth = depth;
                }
            }
            _ if options.max_depth.is_some() => unused.push("max_depth"),
            _ => {}
        }
        match &mut strategy {
            StrategyConfig::MonteCarlo(config) | StrategyConfig::EfficientMonteCarlo(config) => {
                if let Some(n) = options.num_samples {
                    config.num_samples = n;
                }
                config.random_seed = options.random_seed;
                *config = resolve_seed(loss, *config)?;
            }
            _ if options.num_samples.is_some() || options.random_seed.is_some() => {
                unused.push("num_samples/random_seed")
            }
            _ => {}
        }
        for parameter in unused {
            warn!(method = %options.method, parameter, "parameter ignored by strategy");
        }

        let config = SearchConfig { loss, strategy };
        let mut predictor = ChainPredictor::from_config(self.chain, config)?;
        if let Some(shard_size) = options.shard_size {
            anyhow::ensure!(shard_size > 0, "shard size must be at least 1");
            predictor.inferer = predictor
                .inferer
                .with_parallelism(Parallelism::Sharded { shard_size });
        }
        Ok(predictor)
    }
}

/// Fix the seed up front so the stored configuration reproduces the run.
fn resolve_seed(loss: Loss, config: MonteCarloConfig) -> Result<MonteCarloConfig> {
    let seed = MonteCarloInferer::new(loss, config)?.seed();
    Ok(MonteCarloConfig {
        random_seed: Some(seed),
        ..config
    })
}

/// Multi-label predictor: a fitted chain plus a search strategy.
pub struct ChainPredictor {
    config: SearchConfig,
    inferer: Inferer,
}

impl ChainPredictor {
    /// Create a new predictor builder.
    pub fn builder(chain: impl Into<Arc<ChainModel>>) -> PredictorBuilder {
        PredictorBuilder::new(chain)
    }

    /// Create from a deserialized configuration.
    pub fn from_config(chain: impl Into<Arc<ChainModel>>, config: SearchConfig) -> Result<Self> {
        let strategy = config
            .build()
            .with_context(|| format!("building {} strategy", config.strategy.name()))?;
        debug!(method = config.strategy.name(), loss = %config.loss, "predictor ready");
        Ok(Self {
            inferer: Inferer::from_boxed(chain.into(), strategy),
            config,
        })
    }

    /// Effective configuration, seeds resolved.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Get the chain.
    pub fn chain(&self) -> &ChainModel {
        self.inferer.chain()
    }

    /// Predict labels (original label order) for `features` (n × d1).
    pub fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Array2<bool>> {
        Ok(self.infer(features)?.0)
    }

    /// Predict labels and the mean number of visited nodes per row.
    pub fn infer(&self, features: ArrayView2<'_, f64>) -> Result<(Array2<bool>, f64)> {
        self.inferer
            .infer(features)
            .with_context(|| format!("{} inference failed", self.config.strategy.name()))
    }

    /// Predict with rewards and search counters.
    pub fn infer_with_reward(&self, features: ArrayView2<'_, f64>) -> Result<Inference> {
        self.inferer
            .infer_with_reward(features)
            .with_context(|| format!("{} inference failed", self.config.strategy.name()))
    }
}

impl std::fmt::Debug for ChainPredictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainPredictor")
            .field("config", &self.config)
            .field("chain", self.inferer.chain())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chainsearch_core::testing::{random_features, random_logistic_chain, toy_chain, toy_features};
    use chainsearch_core::ChainError;

    #[test]
    fn builds_from_names() {
        let predictor = ChainPredictor::builder(toy_chain())
            .loss("exact_match")
            .method("beam_search")
            .beam_width(2)
            .build()
            .unwrap();

        let (prediction, visited) = predictor.infer(toy_features(1).view()).unwrap();
        assert_eq!(prediction.row(0).to_vec(), vec![false, false, false]);
        assert_eq!(visited, 5.0);
    }

    #[test]
    fn hamming_reward_on_toy_chain() {
        let predictor = ChainPredictor::builder(toy_chain())
            .loss("hamming")
            .method("exhaustive_search")
            .build()
            .unwrap();
        let out = predictor.infer_with_reward(toy_features(2).view()).unwrap();
        assert_relative_eq!(out.reward, 2.2, epsilon = 1e-12);
        assert_eq!(out.visited_nodes, 14.0);
    }

    #[test]
    fn bad_names_surface_core_errors() {
        let err = ChainPredictor::builder(toy_chain()).loss("log_loss").build().unwrap_err();
        assert!(matches!(err.downcast_ref::<ChainError>(), Some(ChainError::InvalidLoss(_))));

        let err = ChainPredictor::builder(toy_chain()).method("dfs").build().unwrap_err();
        assert!(matches!(err.downcast_ref::<ChainError>(), Some(ChainError::UnknownStrategy(_))));

        let err = ChainPredictor::builder(toy_chain())
            .method("epsilon_approximation")
            .epsilon(0.9)
            .build()
            .unwrap_err();
        assert!(matches!(err.root_cause().downcast_ref::<ChainError>(), Some(ChainError::InvalidParameter(_))));
    }

    #[test]
    fn unseeded_monte_carlo_records_its_seed() {
        let chain = Arc::new(random_logistic_chain(5, 3, 1));
        let x = random_features(10, 3, 2);
        let first = ChainPredictor::builder(chain.clone())
            .method("efficient_monte_carlo")
            .num_samples(12)
            .build()
            .unwrap();

        let StrategyConfig::EfficientMonteCarlo(config) = first.config().strategy else {
            panic!("unexpected strategy {:?}", first.config().strategy);
        };
        let seed = config.random_seed.unwrap();

        let again = ChainPredictor::builder(chain)
            .method("monte_carlo")
            .num_samples(12)
            .random_seed(seed)
            .build()
            .unwrap();
        assert_eq!(first.predict(x.view()).unwrap(), again.predict(x.view()).unwrap());
    }

    #[test]
    fn sharded_predictor_matches_sequential() {
        let chain = Arc::new(random_logistic_chain(6, 4, 3));
        let x = random_features(33, 4, 4);
        let sequential = ChainPredictor::builder(chain.clone()).method("exhaustive_search").build().unwrap();
        let sharded = ChainPredictor::builder(chain)
            .method("exhaustive_search")
            .shards(8)
            .build()
            .unwrap();
        assert_eq!(sequential.predict(x.view()).unwrap(), sharded.predict(x.view()).unwrap());

        assert!(ChainPredictor::builder(toy_chain()).shards(0).build().is_err());
    }
}
