//! Beam Search over the chain tree.
//!
//! Beam search keeps, for every row, a fixed-size set of the best partial
//! paths and expands all of them at each depth.
//!
//! # Algorithm
//!
//! 1. Start every row with the empty path
//! 2. For each chain position:
//!    a. Query the estimator once for every candidate of every row
//!    b. Expand each candidate into both labels
//!    c. Keep the top-`beam_width` children per row
//! 3. Return the best complete path per row
//!
//! With `beam_width = 1` this is greedy inference; once `beam_width` reaches
//! `2^depth` nothing is ever dropped and it matches exhaustive search.

use super::frontier::{prefix_matrix, BestPaths, PathState};
use super::harness::{SearchStats, SearchStrategy, Traversal};
use super::score::{Loss, ScoreAccumulator};
use crate::chain::{ChainModel, FeatureBatch};
use crate::error::{ChainError, Result};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Configuration for beam search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeamConfig {
    /// Number of candidates to keep per row at each depth.
    pub beam_width: usize,
}

impl Default for BeamConfig {
    fn default() -> Self {
        Self { beam_width: 4 }
    }
}

impl BeamConfig {
    /// Reject an empty beam.
    pub fn validate(&self) -> Result<()> {
        if self.beam_width == 0 {
            return Err(ChainError::InvalidParameter(
                "beam_width must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Beam search inference.
#[derive(Debug, Clone, Copy)]
pub struct BeamSearchInferer {
    acc: ScoreAccumulator,
    config: BeamConfig,
}

impl BeamSearchInferer {
    /// Create, validating the beam width.
    pub fn new(loss: Loss, config: BeamConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            acc: ScoreAccumulator::new(loss),
            config,
        })
    }

    /// Beam width.
    pub fn beam_width(&self) -> usize {
        self.config.beam_width
    }

    fn expand(&self, beam: &[PathState], p1: &[f64]) -> Vec<PathState> {
        let mut children: Vec<PathState> = beam
            .iter()
            .zip(p1)
            .flat_map(|(candidate, &p)| {
                [
                    candidate.child(false, p, &self.acc),
                    candidate.child(true, p, &self.acc),
                ]
            })
            .collect();
        children.sort_by(PathState::rank);
        children.truncate(self.config.beam_width);
        children
    }
}

impl SearchStrategy for BeamSearchInferer {
    fn name(&self) -> &'static str {
        "beam_search"
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
        let mut stats = SearchStats::default();
        let mut beams: Vec<Vec<PathState>> = (0..n).map(|row| vec![PathState::root(row, &self.acc)]).collect();

        for depth in 0..d {
            let candidates: Vec<&PathState> = beams.iter().flatten().collect();
            let rows: Vec<usize> = candidates.iter().map(|c| c.row).collect();
            let prefixes = prefix_matrix(candidates.iter().map(|c| c.labels.as_slice()), depth);
            let p1 = chain.query(depth, batch, &rows, prefixes.view())?.to_vec();
            stats.record_query(rows.len());
            stats.visited_nodes += rows.len();

            let mut offset = 0;
            for beam in beams.iter_mut() {
                let width = beam.len();
                *beam = self.expand(beam, &p1[offset..offset + width]);
                offset += width;
                stats.max_frontier = stats.max_frontier.max(beam.len());
            }
            trace!(depth, candidates = rows.len(), "beam step");
        }

        let mut best = BestPaths::new(n, d);
        for candidate in beams.iter().flatten() {
            best.offer(candidate.row, &candidate.labels, candidate.score);
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
    use ndarray::Array2;

    fn run(chain: &ChainModel, x: &Array2<f64>, beam_width: usize) -> Traversal {
        BeamSearchInferer::new(Loss::ExactMatch, BeamConfig { beam_width })
            .unwrap()
            .traverse(chain, &FeatureBatch::new(x.view()))
            .unwrap()
    }

    #[test]
    fn beam_of_two_on_toy_chain() {
        let out = run(&toy_chain(), &toy_features(1), 2);
        assert_eq!(out.paths.row(0).to_vec(), vec![false, false, false]);
        assert_relative_eq!(out.scores[0], 0.378, epsilon = 1e-12);
        // 1 + 2 + 2 candidates queried.
        assert_eq!(out.stats.visited_nodes, 5);
        assert_eq!(out.stats.max_frontier, 2);
    }

    #[test]
    fn unit_beam_is_greedy() {
        let chain = random_logistic_chain(6, 4, 41);
        let x = random_features(20, 4, 42);
        let greedy = GreedyInferer::new(Loss::ExactMatch)
            .traverse(&chain, &FeatureBatch::new(x.view()))
            .unwrap();
        let beam = run(&chain, &x, 1);
        assert_eq!(beam.paths, greedy.paths);
        assert_eq!(beam.stats.visited_nodes, greedy.stats.visited_nodes);
    }

    #[test]
    fn full_width_beam_is_exhaustive() {
        let chain = random_logistic_chain(4, 2, 51);
        let x = random_features(20, 2, 52);
        let full = ExhaustiveSearchInferer::new(Loss::ExactMatch)
            .traverse(&chain, &FeatureBatch::new(x.view()))
            .unwrap();
        assert_eq!(run(&chain, &x, 16).paths, full.paths);
    }

    #[test]
    fn zero_width_is_rejected() {
        assert!(matches!(
            BeamSearchInferer::new(Loss::Hamming, BeamConfig { beam_width: 0 }),
            Err(ChainError::InvalidParameter(_))
        ));
    }
}
