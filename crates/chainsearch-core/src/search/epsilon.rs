//! Epsilon-approximate search.
//!
//! The more probable branch of every node is always followed. The less
//! probable one is followed only for rows whose accumulated score after
//! taking it is still at least `epsilon`, so the active row set narrows as
//! the walk goes down. For exact match, `epsilon = 0` keeps every branch and
//! behaves like exhaustive search, while `epsilon = 0.5` prunes every low
//! branch below the root and reduces to greedy.

use super::frontier::{branch_probability, greedy_label, BestPaths};
use super::harness::{SearchStats, SearchStrategy, Traversal};
use super::score::{Loss, PathScore, ScoreAccumulator};
use crate::chain::{ChainModel, FeatureBatch};
use crate::error::{ChainError, Result};
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Configuration for epsilon-approximate search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpsilonConfig {
    /// Pruning threshold in `[0, 0.5]`.
    pub epsilon: f64,
}

impl Default for EpsilonConfig {
    fn default() -> Self {
        Self { epsilon: 0.1 }
    }
}

impl EpsilonConfig {
    /// Reject thresholds outside `[0, 0.5]`, NaN included.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=0.5).contains(&self.epsilon) {
            return Err(ChainError::InvalidParameter(format!(
                "epsilon must be in [0, 0.5], got {}",
                self.epsilon
            )));
        }
        Ok(())
    }
}

/// Search that expands low-probability branches only while they stay likely.
#[derive(Debug, Clone, Copy)]
pub struct EpsilonApproximationInferer {
    acc: ScoreAccumulator,
    config: EpsilonConfig,
}

impl EpsilonApproximationInferer {
    /// Create, validating `epsilon`.
    pub fn new(loss: Loss, config: EpsilonConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            acc: ScoreAccumulator::new(loss),
            config,
        })
    }

    /// Pruning threshold.
    pub fn epsilon(&self) -> f64 {
        self.config.epsilon
    }
}

/// Rows still following one subtree, with their paths so far.
struct Frame {
    depth: usize,
    rows: Vec<usize>,
    paths: Array2<bool>,
    scores: Vec<PathScore>,
}

impl SearchStrategy for EpsilonApproximationInferer {
    fn name(&self) -> &'static str {
        "epsilon_approximation"
    }

    fn loss(&self) -> Loss {
        self.acc.loss()
    }

    fn check(&self, _chain: &ChainModel) -> Result<()> {
        self.config.validate()
    }

    fn traverse(&self, chain: &ChainModel, batch: &FeatureBatch<'_>) -> Result<Traversal> {
        let n = batch.len();
        let d = chain.depth();
        let threshold = self.acc.threshold(self.config.epsilon);
        let mut best = BestPaths::new(n, d);
        let mut stats = SearchStats::default();

        let mut stack = vec![Frame {
            depth: 0,
            rows: (0..n).collect(),
            paths: Array2::default((n, d)),
            scores: vec![self.acc.root(); n],
        }];

        while let Some(mut frame) = stack.pop() {
            if frame.depth == d {
                for (k, &row) in frame.rows.iter().enumerate() {
                    let labels = frame.paths.row(k).to_vec();
                    best.offer(row, &labels, frame.scores[k]);
                }
                continue;
            }

            let depth = frame.depth;
            let p1 = chain.query(depth, batch, &frame.rows, frame.paths.view())?;
            stats.record_query(frame.rows.len());
            stats.visited_nodes += frame.rows.len();

            let mut low_paths = frame.paths.clone();
            let mut keep = Vec::new();
            let mut low_scores = Vec::new();
            for (k, &p) in p1.iter().enumerate() {
                let high = greedy_label(p);
                let low_score = self.acc.extend(frame.scores[k], branch_probability(p, !high));
                if low_score >= threshold {
                    low_paths[[k, depth]] = !high;
                    keep.push(k);
                    low_scores.push(low_score);
                }

                frame.paths[[k, depth]] = high;
                frame.scores[k] = self.acc.extend(frame.scores[k], branch_probability(p, high));
            }

            stats.pruned_branches += frame.rows.len() - keep.len();
            trace!(
                depth,
                active = frame.rows.len(),
                kept_low = keep.len(),
                "epsilon step"
            );

            if !keep.is_empty() {
                stack.push(Frame {
                    depth: depth + 1,
                    rows: keep.iter().map(|&k| frame.rows[k]).collect(),
                    paths: low_paths.select(Axis(0), &keep),
                    scores: low_scores,
                });
            }
            stack.push(Frame {
                depth: depth + 1,
                ..frame
            });
            stats.max_frontier = stats.max_frontier.max(stack.len());
        }

        let (paths, scores) = best.finish(&self.acc);
        Ok(Traversal { paths, scores, stats })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{ExhaustiveSearchInferer, GreedyInferer};
    use crate::testing::{random_features, random_logistic_chain, toy_chain, toy_features};
    use approx::assert_relative_eq;

    fn run(chain: &ChainModel, x: &Array2<f64>, epsilon: f64) -> Traversal {
        EpsilonApproximationInferer::new(Loss::ExactMatch, EpsilonConfig { epsilon })
            .unwrap()
            .traverse(chain, &FeatureBatch::new(x.view()))
            .unwrap()
    }

    #[test]
    fn half_epsilon_walks_only_the_greedy_path() {
        let chain = toy_chain();
        let out = run(&chain, &toy_features(1), 0.5);

        assert_eq!(out.paths.row(0).to_vec(), vec![false, false, false]);
        assert_relative_eq!(out.scores[0], 0.378, epsilon = 1e-12);
        assert_eq!(out.stats.visited_nodes, 3);
        assert_eq!(out.stats.pruned_branches, 3);
    }

    #[test]
    fn small_epsilon_explores_more() {
        let chain = toy_chain();
        let out = run(&chain, &toy_features(1), 0.1);

        assert_eq!(out.paths.row(0).to_vec(), vec![false, false, false]);
        assert_eq!(out.stats.visited_nodes, 6);
        assert_eq!(out.stats.pruned_branches, 3);
    }

    #[test]
    fn zero_epsilon_matches_exhaustive() {
        let chain = random_logistic_chain(5, 3, 21);
        let x = random_features(16, 3, 22);
        let batch = FeatureBatch::new(x.view());

        let eps = run(&chain, &x, 0.0);
        let full = ExhaustiveSearchInferer::new(Loss::ExactMatch)
            .traverse(&chain, &batch)
            .unwrap();
        assert_eq!(eps.paths, full.paths);
        assert_eq!(eps.stats.pruned_branches, 0);
    }

    #[test]
    fn half_epsilon_matches_greedy() {
        let chain = random_logistic_chain(6, 3, 31);
        let x = random_features(16, 3, 32);
        let greedy = GreedyInferer::new(Loss::ExactMatch)
            .traverse(&chain, &FeatureBatch::new(x.view()))
            .unwrap();
        assert_eq!(run(&chain, &x, 0.5).paths, greedy.paths);
    }

    #[test]
    fn rejects_out_of_range_epsilon() {
        for epsilon in [-0.1, 0.6, f64::NAN] {
            let err = EpsilonApproximationInferer::new(Loss::ExactMatch, EpsilonConfig { epsilon });
            assert!(matches!(err, Err(ChainError::InvalidParameter(_))));
        }
    }
}
