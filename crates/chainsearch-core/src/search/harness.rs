//! The contract every strategy implements, and the harness around it.
//!
//! A [`SearchStrategy`] only walks the tree and reports the paths it chose.
//! [`Inferer`] owns everything else: parameter pre-checks, optional row
//! sharding, reward replay (an independent re-scoring of the chosen paths
//! straight from the chain) and restoring the original label order.

use super::frontier::branch_probability;
use super::score::{Loss, ScoreAccumulator};
use crate::chain::{ChainModel, FeatureBatch};
use crate::error::{ChainError, Result};
use ndarray::{concatenate, Array1, Array2, ArrayView2, Axis};
use rayon::prelude::*;
use std::sync::Arc;
use tracing::debug;

/// Diagnostic counters from one traversal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Tree nodes visited, in the strategy's own unit (summed over rows).
    pub visited_nodes: usize,
    /// Batched estimator invocations.
    pub estimator_calls: usize,
    /// Rows passed to estimators, summed over invocations.
    pub queried_rows: usize,
    /// Branches dropped by pruning.
    pub pruned_branches: usize,
    /// Widest per-row frontier held at once.
    pub max_frontier: usize,
}

impl SearchStats {
    /// Record one estimator invocation over `rows` rows.
    #[inline]
    pub fn record_query(&mut self, rows: usize) {
        self.estimator_calls += 1;
        self.queried_rows += rows;
    }

    /// Fold in the counters of another shard.
    pub fn merge(&mut self, other: &SearchStats) {
        self.visited_nodes += other.visited_nodes;
        self.estimator_calls += other.estimator_calls;
        self.queried_rows += other.queried_rows;
        self.pruned_branches += other.pruned_branches;
        self.max_frontier = self.max_frontier.max(other.max_frontier);
    }
}

/// What a strategy hands back for one batch.
#[derive(Debug, Clone)]
pub struct Traversal {
    /// Chosen path per row, chain order.
    pub paths: Array2<bool>,
    /// Probability-space score the strategy computed for each chosen path.
    pub scores: Array1<f64>,
    /// Counters.
    pub stats: SearchStats,
}

/// A tree-search policy over a classifier chain.
pub trait SearchStrategy: Send + Sync {
    /// Short name, as accepted by [`StrategyConfig::from_name`].
    ///
    /// [`StrategyConfig::from_name`]: super::StrategyConfig::from_name
    fn name(&self) -> &'static str;

    /// Loss the strategy optimizes.
    fn loss(&self) -> Loss;

    /// Reject a chain before any estimator is queried.
    fn check(&self, _chain: &ChainModel) -> Result<()> {
        Ok(())
    }

    /// Walk the tree for every row of `batch`.
    fn traverse(&self, chain: &ChainModel, batch: &FeatureBatch<'_>) -> Result<Traversal>;
}

/// How the harness spreads a batch over threads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Parallelism {
    /// One traversal over the whole batch.
    #[default]
    Sequential,
    /// Contiguous shards of `shard_size` rows, traversed on the rayon pool.
    ///
    /// Rows never influence each other, so results match [`Sequential`].
    ///
    /// [`Sequential`]: Parallelism::Sequential
    Sharded {
        /// Rows per shard.
        shard_size: usize,
    },
}

/// Final result of an inference run.
#[derive(Debug, Clone)]
pub struct Inference {
    /// Predicted labels, original label order.
    pub prediction: Array2<bool>,
    /// Visited nodes per row.
    pub visited_nodes: f64,
    /// Mean replayed reward over the batch.
    pub reward: f64,
    /// Replayed reward per row.
    pub rewards: Array1<f64>,
    /// Score the strategy computed per row.
    pub path_scores: Array1<f64>,
    /// Counters summed over the batch.
    pub stats: SearchStats,
}

/// Runs a strategy against a chain and finishes its results.
pub struct Inferer {
    chain: Arc<ChainModel>,
    strategy: Box<dyn SearchStrategy>,
    parallelism: Parallelism,
}

impl Inferer {
    /// Create a harness around `strategy`.
    pub fn new(chain: Arc<ChainModel>, strategy: impl SearchStrategy + 'static) -> Self {
        Self::from_boxed(chain, Box::new(strategy))
    }

    /// Create from an already boxed strategy.
    pub fn from_boxed(chain: Arc<ChainModel>, strategy: Box<dyn SearchStrategy>) -> Self {
        Self {
            chain,
            strategy,
            parallelism: Parallelism::Sequential,
        }
    }

    /// Set the parallelism mode.
    pub fn with_parallelism(mut self, parallelism: Parallelism) -> Self {
        self.parallelism = parallelism;
        self
    }

    /// The chain being searched.
    pub fn chain(&self) -> &ChainModel {
        &self.chain
    }

    /// The wrapped strategy.
    pub fn strategy(&self) -> &dyn SearchStrategy {
        self.strategy.as_ref()
    }

    /// Predict labels for `features` (n × d1).
    ///
    /// Returns the prediction in original label order and the mean number of
    /// visited nodes per row.
    pub fn infer(&self, features: ArrayView2<'_, f64>) -> Result<(Array2<bool>, f64)> {
        let inference = self.infer_with_reward(features)?;
        Ok((inference.prediction, inference.visited_nodes))
    }

    /// Like [`infer`](Self::infer), also returning replayed rewards and counters.
    pub fn infer_with_reward(&self, features: ArrayView2<'_, f64>) -> Result<Inference> {
        if let Parallelism::Sharded { shard_size: 0 } = self.parallelism {
            return Err(ChainError::InvalidParameter(
                "shard size must be at least 1".to_string(),
            ));
        }
        self.strategy.check(&self.chain)?;

        let batch = FeatureBatch::new(features);
        let n = batch.len();
        let depth = self.chain.depth();
        let acc = ScoreAccumulator::new(self.strategy.loss());

        if batch.is_empty() {
            return Ok(Inference {
                prediction: Array2::default((0, depth)),
                visited_nodes: 0.0,
                reward: 0.0,
                rewards: Array1::zeros(0),
                path_scores: Array1::zeros(0),
                stats: SearchStats::default(),
            });
        }

        let parts = match self.parallelism {
            Parallelism::Sequential => vec![self.run_shard(&batch, &acc)?],
            Parallelism::Sharded { shard_size } => batch
                .shards(shard_size)
                .par_iter()
                .map(|shard| self.run_shard(shard, &acc))
                .collect::<Result<Vec<_>>>()?,
        };

        let (paths, path_scores, rewards, stats) = join_shards(parts)?;
        let reward = rewards.mean().unwrap_or(0.0);
        let visited_nodes = stats.visited_nodes as f64 / n as f64;
        let prediction = restore_label_order(paths.view(), self.chain.order());

        debug!(
            strategy = self.strategy.name(),
            loss = %acc.loss(),
            rows = n,
            visited_nodes,
            reward,
            estimator_calls = stats.estimator_calls,
            "inference finished"
        );

        Ok(Inference {
            prediction,
            visited_nodes,
            reward,
            rewards,
            path_scores,
            stats,
        })
    }

    fn run_shard(&self, batch: &FeatureBatch<'_>, acc: &ScoreAccumulator) -> Result<ShardResult> {
        let traversal = self.strategy.traverse(&self.chain, batch)?;
        let rewards = replay_rewards(&self.chain, batch, traversal.paths.view(), acc)?;
        Ok((traversal.paths, traversal.scores, rewards, traversal.stats))
    }
}

type ShardResult = (Array2<bool>, Array1<f64>, Array1<f64>, SearchStats);

fn join_shards(mut parts: Vec<ShardResult>) -> Result<ShardResult> {
    if parts.len() == 1 {
        if let Some(only) = parts.pop() {
            return Ok(only);
        }
    }

    let mut stats = SearchStats::default();
    for part in &parts {
        stats.merge(&part.3);
    }
    let paths: Vec<_> = parts.iter().map(|p| p.0.view()).collect();
    let scores: Vec<_> = parts.iter().map(|p| p.1.view()).collect();
    let rewards: Vec<_> = parts.iter().map(|p| p.2.view()).collect();

    let shape_err = |e: ndarray::ShapeError| ChainError::ShapeMismatch(e.to_string());
    Ok((
        concatenate(Axis(0), &paths).map_err(shape_err)?,
        concatenate(Axis(0), &scores).map_err(shape_err)?,
        concatenate(Axis(0), &rewards).map_err(shape_err)?,
        stats,
    ))
}

/// Re-score chosen paths by querying the chain along them.
///
/// Each row starts from the loss identity and is combined in probability
/// space with the probability of the label it took at every depth. This is
/// independent of whatever bookkeeping the strategy did internally.
pub fn replay_rewards(
    chain: &ChainModel,
    batch: &FeatureBatch<'_>,
    paths: ArrayView2<'_, bool>,
    acc: &ScoreAccumulator,
) -> Result<Array1<f64>> {
    let rows: Vec<usize> = (0..batch.len()).collect();
    let mut reward = vec![acc.identity(); rows.len()];

    for depth in 0..chain.depth() {
        let p1 = chain.query(depth, batch, &rows, paths)?;
        let taken: Vec<f64> = rows
            .iter()
            .map(|&r| branch_probability(p1[r], paths[[r, depth]]))
            .collect();
        acc.combine_batch(&mut reward, &taken);
    }

    Ok(Array1::from(reward))
}

/// Move column `i` of `paths` to column `permutation[i]`.
pub fn reorder_columns(paths: ArrayView2<'_, bool>, permutation: &[usize]) -> Array2<bool> {
    let mut out = Array2::<bool>::default(paths.raw_dim());
    for (from, &to) in permutation.iter().enumerate() {
        out.column_mut(to).assign(&paths.column(from));
    }
    out
}

/// Map a chain-order prediction back to original label order.
pub fn restore_label_order(paths: ArrayView2<'_, bool>, order: &[usize]) -> Array2<bool> {
    reorder_columns(paths, order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::invert_permutation;
    use ndarray::array;

    #[test]
    fn reorder_round_trips_through_inverse() {
        let chain_order = array![
            [true, false, false, true],
            [false, false, true, true],
        ];
        let order = [2, 0, 3, 1];
        let inverse = invert_permutation(&order).unwrap();

        let original = restore_label_order(chain_order.view(), &order);
        // Chain position 0 decides label 2.
        assert_eq!(original.column(2).to_vec(), chain_order.column(0).to_vec());

        let back = reorder_columns(original.view(), &inverse);
        assert_eq!(back, chain_order);
    }

    #[test]
    fn stats_merge_sums_and_maxes() {
        let mut a = SearchStats {
            visited_nodes: 10,
            estimator_calls: 2,
            queried_rows: 7,
            pruned_branches: 1,
            max_frontier: 4,
        };
        let mut b = SearchStats::default();
        b.record_query(5);
        b.visited_nodes = 5;
        b.max_frontier = 2;

        a.merge(&b);
        assert_eq!(a.visited_nodes, 15);
        assert_eq!(a.estimator_calls, 3);
        assert_eq!(a.queried_rows, 12);
        assert_eq!(a.max_frontier, 4);
    }
}
