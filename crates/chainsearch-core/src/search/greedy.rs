//! Greedy chain inference: follow the locally most probable label.

use super::frontier::{branch_probability, greedy_label};
use super::harness::{SearchStats, SearchStrategy, Traversal};
use super::score::{Loss, ScoreAccumulator};
use crate::chain::{ChainModel, FeatureBatch};
use crate::error::Result;
use ndarray::Array2;
use tracing::trace;

/// The standard classifier-chain prediction rule.
///
/// One estimator call per chain position; every row visits exactly `d` nodes.
#[derive(Debug, Clone, Copy)]
pub struct GreedyInferer {
    acc: ScoreAccumulator,
}

impl GreedyInferer {
    /// Create for a loss. The loss only affects the reported score.
    pub fn new(loss: Loss) -> Self {
        Self {
            acc: ScoreAccumulator::new(loss),
        }
    }
}

impl Default for GreedyInferer {
    fn default() -> Self {
        Self::new(Loss::default())
    }
}

impl SearchStrategy for GreedyInferer {
    fn name(&self) -> &'static str {
        "greedy"
    }

    fn loss(&self) -> Loss {
        self.acc.loss()
    }

    fn traverse(&self, chain: &ChainModel, batch: &FeatureBatch<'_>) -> Result<Traversal> {
        let n = batch.len();
        let rows: Vec<usize> = (0..n).collect();
        let mut paths = Array2::<bool>::default((n, chain.depth()));
        let mut scores = vec![self.acc.root(); n];
        let mut stats = SearchStats::default();

        for depth in 0..chain.depth() {
            let p1 = chain.query(depth, batch, &rows, paths.view())?;
            stats.record_query(n);
            stats.visited_nodes += n;

            for (row, &p) in p1.iter().enumerate() {
                let label = greedy_label(p);
                paths[[row, depth]] = label;
                scores[row] = self.acc.extend(scores[row], branch_probability(p, label));
            }
            trace!(depth, rows = n, "greedy step");
        }

        stats.max_frontier = usize::from(n > 0);
        Ok(Traversal {
            paths,
            scores: scores.into_iter().map(|s| self.acc.realize(s)).collect(),
            stats,
        })
    }
}
