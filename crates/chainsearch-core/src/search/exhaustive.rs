//! Exhaustive depth-first search over every leaf of the chain tree.
//!
//! All rows share the same prefix at any point of the walk, so each internal
//! node costs one estimator call over the whole batch. The walk keeps an
//! explicit stack of frames; the `false` branch is always popped first.

use super::frontier::{branch_probability, BestPaths};
use super::harness::{SearchStats, SearchStrategy, Traversal};
use super::score::{Loss, PathScore, ScoreAccumulator};
use crate::chain::{ChainModel, FeatureBatch};
use crate::error::{ChainError, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Configuration for exhaustive search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExhaustiveConfig {
    /// Deepest chain accepted. Cost grows as `2^depth`.
    pub max_depth: usize,
}

impl Default for ExhaustiveConfig {
    fn default() -> Self {
        Self { max_depth: 24 }
    }
}

/// Reference oracle: the true optimum of the loss for every row.
#[derive(Debug, Clone, Copy)]
pub struct ExhaustiveSearchInferer {
    acc: ScoreAccumulator,
    config: ExhaustiveConfig,
}

impl ExhaustiveSearchInferer {
    /// Create with the default depth limit.
    pub fn new(loss: Loss) -> Self {
        Self::with_config(loss, ExhaustiveConfig::default())
    }

    /// Create with an explicit configuration.
    pub fn with_config(loss: Loss, config: ExhaustiveConfig) -> Self {
        Self {
            acc: ScoreAccumulator::new(loss),
            config,
        }
    }

    /// Configuration in use.
    pub fn config(&self) -> &ExhaustiveConfig {
        &self.config
    }
}

struct Frame {
    depth: usize,
    prefix: Vec<bool>,
    scores: Vec<PathScore>,
}

impl SearchStrategy for ExhaustiveSearchInferer {
    fn name(&self) -> &'static str {
        "exhaustive_search"
    }

    fn loss(&self) -> Loss {
        self.acc.loss()
    }

    fn check(&self, chain: &ChainModel) -> Result<()> {
        if chain.depth() > self.config.max_depth {
            return Err(ChainError::InvalidParameter(format!(
                "exhaustive search over depth {} exceeds max_depth {}",
                chain.depth(),
                self.config.max_depth
            )));
        }
        Ok(())
    }

    fn traverse(&self, chain: &ChainModel, batch: &FeatureBatch<'_>) -> Result<Traversal> {
        let n = batch.len();
        let d = chain.depth();
        let rows: Vec<usize> = (0..n).collect();
        let mut best = BestPaths::new(n, d);
        let mut stats = SearchStats::default();

        let mut stack = vec![Frame {
            depth: 0,
            prefix: Vec::with_capacity(d),
            scores: vec![self.acc.root(); n],
        }];

        while let Some(frame) = stack.pop() {
            if frame.depth == d {
                for (row, &score) in frame.scores.iter().enumerate() {
                    best.offer(row, &frame.prefix, score);
                }
                continue;
            }

            let prefixes = Array2::from_shape_fn((n, frame.depth), |(_, j)| frame.prefix[j]);
            let p1 = chain.query(frame.depth, batch, &rows, prefixes.view())?;
            stats.record_query(n);
            stats.visited_nodes += 2 * n;
            trace!(depth = frame.depth, prefix = ?frame.prefix, "expanding node");

            for label in [true, false] {
                let mut prefix = frame.prefix.clone();
                prefix.push(label);
                let scores = frame
                    .scores
                    .iter()
                    .zip(p1.iter())
                    .map(|(&s, &p)| self.acc.extend(s, branch_probability(p, label)))
                    .collect();
                stack.push(Frame {
                    depth: frame.depth + 1,
                    prefix,
                    scores,
                });
            }
            stats.max_frontier = stats.max_frontier.max(stack.len());
        }

        let (paths, scores) = best.finish(&self.acc);
        Ok(Traversal { paths, scores, stats })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{random_features, random_logistic_chain, toy_chain, toy_features};
    use approx::assert_relative_eq;

    #[test]
    fn finds_optimum_on_toy_chain() {
        let chain = toy_chain();
        let x = toy_features(1);
        let out = ExhaustiveSearchInferer::new(Loss::ExactMatch)
            .traverse(&chain, &FeatureBatch::new(x.view()))
            .unwrap();

        assert_eq!(out.paths.row(0).to_vec(), vec![false, false, false]);
        assert_relative_eq!(out.scores[0], 0.378, epsilon = 1e-12);
        // 2 + 4 + 8 nodes below the root.
        assert_eq!(out.stats.visited_nodes, 14);
        assert_eq!(out.stats.estimator_calls, 7);
    }

    #[test]
    fn hamming_optimum_on_toy_chain() {
        let chain = toy_chain();
        let x = toy_features(1);
        let out = ExhaustiveSearchInferer::new(Loss::Hamming)
            .traverse(&chain, &FeatureBatch::new(x.view()))
            .unwrap();

        assert_eq!(out.paths.row(0).to_vec(), vec![false, false, false]);
        assert_relative_eq!(out.scores[0], 2.2, epsilon = 1e-12);
    }

    #[test]
    fn beats_every_enumerated_leaf() {
        let chain = random_logistic_chain(4, 3, 11);
        let x = random_features(5, 3, 12);
        let batch = FeatureBatch::new(x.view());
        let acc = ScoreAccumulator::new(Loss::ExactMatch);
        let out = ExhaustiveSearchInferer::new(Loss::ExactMatch)
            .traverse(&chain, &batch)
            .unwrap();

        for leaf in 0..16u32 {
            let labels: Vec<bool> = (0..4).map(|j| (leaf >> (3 - j)) & 1 == 1).collect();
            let paths = Array2::from_shape_fn((5, 4), |(_, j)| labels[j]);
            let rewards =
                crate::search::harness::replay_rewards(&chain, &batch, paths.view(), &acc).unwrap();
            for row in 0..5 {
                assert!(out.scores[row] >= rewards[row] - 1e-12);
            }
        }
    }

    #[test]
    fn rejects_chains_deeper_than_limit() {
        let chain = random_logistic_chain(5, 2, 3);
        let inferer = ExhaustiveSearchInferer::with_config(Loss::ExactMatch, ExhaustiveConfig { max_depth: 4 });
        assert!(matches!(inferer.check(&chain), Err(ChainError::InvalidParameter(_))));
        assert!(ExhaustiveSearchInferer::new(Loss::ExactMatch).check(&chain).is_ok());
    }
}
