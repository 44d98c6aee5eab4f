//! Monte Carlo sampling of root-to-leaf paths.
//!
//! Every row runs `num_samples` trials. A trial walks the tree once, taking
//! label 1 at a node with the probability the estimator gives it, and the
//! best complete path over all trials is kept.
//!
//! Randomness is explicit. Each `(seed, global row, trial)` triple owns its
//! own [`StdRng`], drawing exactly one uniform per depth, so a trial samples
//! the same path however the batch is sharded and whichever variant runs it.
//!
//! Two variants share that policy:
//! - [`Sampling::Independent`] queries the estimator once per trial and depth.
//! - [`Sampling::SharedPrefix`] groups the trials of a row by their current
//!   prefix and queries each distinct prefix once. Trials quickly agree on
//!   likely prefixes, so this issues far fewer estimator rows while producing
//!   the same predictions.

use super::frontier::{branch_probability, prefix_matrix, BestPaths};
use super::harness::{SearchStats, SearchStrategy, Traversal};
use super::score::{Loss, PathScore, ScoreAccumulator};
use crate::chain::{ChainModel, FeatureBatch};
use crate::error::{ChainError, Result};
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::trace;

/// Configuration for Monte Carlo sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonteCarloConfig {
    /// Sampled paths per row.
    pub num_samples: usize,
    /// Seed for reproducible sampling. A random one is drawn when absent.
    pub random_seed: Option<u64>,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            num_samples: 100,
            random_seed: None,
        }
    }
}

impl MonteCarloConfig {
    /// Reject a zero sample count.
    pub fn validate(&self) -> Result<()> {
        if self.num_samples == 0 {
            return Err(ChainError::InvalidParameter(
                "num_samples must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// How trials are batched into estimator queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sampling {
    /// One estimator row per trial and depth.
    #[default]
    Independent,
    /// One estimator row per distinct prefix of a row.
    SharedPrefix,
}

/// Monte Carlo inference, plain or prefix-sharing.
#[derive(Debug, Clone, Copy)]
pub struct MonteCarloInferer {
    acc: ScoreAccumulator,
    num_samples: usize,
    seed: u64,
    sampling: Sampling,
}

impl MonteCarloInferer {
    /// Plain variant.
    pub fn new(loss: Loss, config: MonteCarloConfig) -> Result<Self> {
        Self::with_sampling(loss, config, Sampling::Independent)
    }

    /// Prefix-sharing variant.
    pub fn efficient(loss: Loss, config: MonteCarloConfig) -> Result<Self> {
        Self::with_sampling(loss, config, Sampling::SharedPrefix)
    }

    /// Create with an explicit batching mode.
    pub fn with_sampling(loss: Loss, config: MonteCarloConfig, sampling: Sampling) -> Result<Self> {
        config.validate()?;
        let seed = config.random_seed.unwrap_or_else(|| thread_rng().gen());
        Ok(Self {
            acc: ScoreAccumulator::new(loss),
            num_samples: config.num_samples,
            seed,
            sampling,
        })
    }

    /// Seed in use; pass it back through the config to reproduce a run.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Trials per row.
    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    /// Batching mode.
    pub fn sampling(&self) -> Sampling {
        self.sampling
    }
}

/// Random stream of one trial of one row.
pub fn trial_rng(seed: u64, global_row: usize, trial: usize) -> StdRng {
    let key = seed
        ^ (global_row as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (trial as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F);
    StdRng::seed_from_u64(splitmix64(key))
}

fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

struct Trial {
    row: usize,
    rng: StdRng,
    labels: Vec<bool>,
    score: PathScore,
}

impl MonteCarloInferer {
    /// One probability per trial, queried according to the batching mode.
    fn query_trials(
        &self,
        chain: &ChainModel,
        batch: &FeatureBatch<'_>,
        depth: usize,
        trials: &[Trial],
        stats: &mut SearchStats,
    ) -> Result<Vec<f64>> {
        match self.sampling {
            Sampling::Independent => {
                let rows: Vec<usize> = trials.iter().map(|t| t.row).collect();
                let prefixes = prefix_matrix(trials.iter().map(|t| t.labels.as_slice()), depth);
                let p1 = chain.query(depth, batch, &rows, prefixes.view())?;
                stats.record_query(rows.len());
                stats.visited_nodes += rows.len();
                Ok(p1.to_vec())
            }
            Sampling::SharedPrefix => {
                let mut unique: HashMap<(usize, &[bool]), usize> = HashMap::new();
                let mut rows = Vec::new();
                let mut prefixes: Vec<&[bool]> = Vec::new();
                let slots: Vec<usize> = trials
                    .iter()
                    .map(|t| {
                        *unique.entry((t.row, t.labels.as_slice())).or_insert_with(|| {
                            rows.push(t.row);
                            prefixes.push(t.labels.as_slice());
                            rows.len() - 1
                        })
                    })
                    .collect();

                let matrix = prefix_matrix(prefixes.into_iter(), depth);
                let p1 = chain.query(depth, batch, &rows, matrix.view())?;
                stats.record_query(rows.len());
                stats.visited_nodes += rows.len();
                Ok(slots.into_iter().map(|slot| p1[slot]).collect())
            }
        }
    }
}

impl SearchStrategy for MonteCarloInferer {
    fn name(&self) -> &'static str {
        match self.sampling {
            Sampling::Independent => "monte_carlo",
            Sampling::SharedPrefix => "efficient_monte_carlo",
        }
    }

    fn loss(&self) -> Loss {
        self.acc.loss()
    }

    fn traverse(&self, chain: &ChainModel, batch: &FeatureBatch<'_>) -> Result<Traversal> {
        let n = batch.len();
        let d = chain.depth();
        let mut stats = SearchStats::default();

        let mut trials: Vec<Trial> = (0..n)
            .flat_map(|row| {
                let global = batch.global_row(row);
                (0..self.num_samples).map(move |trial| (row, global, trial))
            })
            .map(|(row, global, trial)| Trial {
                row,
                rng: trial_rng(self.seed, global, trial),
                labels: Vec::with_capacity(d),
                score: self.acc.root(),
            })
            .collect();
        stats.max_frontier = if n > 0 { self.num_samples } else { 0 };

        for depth in 0..d {
            let p1 = self.query_trials(chain, batch, depth, &trials, &mut stats)?;
            for (trial, p) in trials.iter_mut().zip(p1) {
                let label = trial.rng.gen::<f64>() < p;
                trial.score = self.acc.extend(trial.score, branch_probability(p, label));
                trial.labels.push(label);
            }
            trace!(depth, trials = trials.len(), queried = stats.queried_rows, "sampling step");
        }

        let mut best = BestPaths::new(n, d);
        for trial in &trials {
            best.offer(trial.row, &trial.labels, trial.score);
        }
        let (paths, scores) = best.finish(&self.acc);
        Ok(Traversal { paths, scores, stats })
    }
}
