//! Partial paths and per-row bests.

use super::score::{PathScore, ScoreAccumulator};
use ndarray::{Array1, Array2};
use std::cmp::Ordering;

/// Probability of taking `label` at a node whose estimator said `p1`.
#[inline]
pub fn branch_probability(p1: f64, label: bool) -> f64 {
    if label {
        p1
    } else {
        1.0 - p1
    }
}

/// The arg-max branch at a node. Ties go to label 0.
#[inline]
pub fn greedy_label(p1: f64) -> bool {
    p1 > 0.5
}

/// Whether path `a` beats path `b`.
///
/// Higher score wins; equal scores go to the lexicographically smaller label
/// vector, so the winner never depends on the order paths were visited in.
#[inline]
pub fn prefer(a: PathScore, a_labels: &[bool], b: PathScore, b_labels: &[bool]) -> bool {
    match a.total_cmp(&b) {
        Ordering::Greater => true,
        Ordering::Less => false,
        Ordering::Equal => a_labels < b_labels,
    }
}

/// A partial path for one row.
#[derive(Debug, Clone, PartialEq)]
pub struct PathState {
    /// Local row index in the batch.
    pub row: usize,
    /// Labels decided so far, chain order.
    pub labels: Vec<bool>,
    /// Accumulated score.
    pub score: PathScore,
}

impl PathState {
    /// Empty path at the root.
    pub fn root(row: usize, acc: &ScoreAccumulator) -> Self {
        Self {
            row,
            labels: Vec::new(),
            score: acc.root(),
        }
    }

    /// Extend by one label, taken at a node whose estimator said `p1`.
    pub fn child(&self, label: bool, p1: f64, acc: &ScoreAccumulator) -> Self {
        let mut labels = Vec::with_capacity(self.labels.len() + 1);
        labels.extend_from_slice(&self.labels);
        labels.push(label);

        Self {
            row: self.row,
            labels,
            score: acc.extend(self.score, branch_probability(p1, label)),
        }
    }

    /// Number of labels decided.
    pub fn depth(&self) -> usize {
        self.labels.len()
    }

    /// Ranking used to keep the best paths first (see [`prefer`]).
    pub fn rank(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| self.labels.cmp(&other.labels))
    }
}

/// Pack paths into a prefix matrix for [`ChainModel::query`].
///
/// [`ChainModel::query`]: crate::chain::ChainModel::query
pub fn prefix_matrix<'p>(paths: impl ExactSizeIterator<Item = &'p [bool]>, depth: usize) -> Array2<bool> {
    let mut out = Array2::<bool>::default((paths.len(), depth));
    for (k, labels) in paths.enumerate() {
        for (j, &label) in labels.iter().take(depth).enumerate() {
            out[[k, j]] = label;
        }
    }
    out
}

/// Best complete path found so far for every row of a batch.
#[derive(Debug, Clone)]
pub struct BestPaths {
    labels: Array2<bool>,
    scores: Vec<Option<PathScore>>,
}

impl BestPaths {
    /// No paths yet for `rows` rows of a depth-`depth` chain.
    pub fn new(rows: usize, depth: usize) -> Self {
        Self {
            labels: Array2::default((rows, depth)),
            scores: vec![None; rows],
        }
    }

    /// Offer a complete path for `row`; keeps it if it beats the current best.
    pub fn offer(&mut self, row: usize, labels: &[bool], score: PathScore) -> bool {
        let better = match self.scores[row] {
            None => true,
            Some(best) => prefer(score, labels, best, &self.labels.row(row).to_vec()),
        };
        if better {
            for (j, &label) in labels.iter().enumerate() {
                self.labels[[row, j]] = label;
            }
            self.scores[row] = Some(score);
        }
        better
    }

    /// Current best score for `row`, if any path was offered.
    pub fn score(&self, row: usize) -> Option<PathScore> {
        self.scores[row]
    }

    /// Chosen paths (chain order) and their probability-space scores.
    pub fn finish(self, acc: &ScoreAccumulator) -> (Array2<bool>, Array1<f64>) {
        let scores = self
            .scores
            .iter()
            .map(|s| s.map_or(0.0, |s| acc.realize(s)))
            .collect();
        (self.labels, scores)
    }
}
