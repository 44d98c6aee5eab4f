//! The fitted classifier chain seen by the searches.

use super::batch::FeatureBatch;
use super::estimator::Estimator;
use crate::error::{ChainError, Result};
use ndarray::{s, Array1, Array2, ArrayView2};

/// An ordered sequence of fitted estimators plus the label permutation.
///
/// `order[i]` is the original label index decided at chain position `i`.
/// Immutable once built; every search only reads from it.
pub struct ChainModel {
    estimators: Vec<Box<dyn Estimator>>,
    order: Vec<usize>,
    inverse: Vec<usize>,
}

impl ChainModel {
    /// Create a chain from estimators (in chain order) and a label order.
    pub fn new(estimators: Vec<Box<dyn Estimator>>, order: Vec<usize>) -> Result<Self> {
        if estimators.is_empty() {
            return Err(ChainError::EmptyChain);
        }
        if order.len() != estimators.len() {
            return Err(ChainError::InvalidOrder(format!(
                "order has {} entries for {} estimators",
                order.len(),
                estimators.len()
            )));
        }

        let inverse = invert_permutation(&order)?;
        Ok(Self {
            estimators,
            order,
            inverse,
        })
    }

    /// Create a chain whose positions coincide with the label indices.
    pub fn in_label_order(estimators: Vec<Box<dyn Estimator>>) -> Result<Self> {
        let order = (0..estimators.len()).collect();
        Self::new(estimators, order)
    }

    /// Number of labels (tree depth).
    pub fn depth(&self) -> usize {
        self.estimators.len()
    }

    /// Chain position -> original label index.
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Original label index -> chain position.
    pub fn inverse_order(&self) -> &[usize] {
        &self.inverse
    }

    /// Estimator at chain position `depth`.
    pub fn estimator(&self, depth: usize) -> Option<&dyn Estimator> {
        self.estimators.get(depth).map(|e| e.as_ref())
    }

    /// Query the estimator at `depth` for a set of rows.
    ///
    /// `rows` are local indices into `batch`; row `k` of `prefixes` holds the
    /// labels already decided for `rows[k]` (only the first `depth` columns
    /// are read). Returns the probability of label 1 for each queried row.
    ///
    /// Every returned value is checked: anything outside `[0, 1]` (including
    /// NaN) aborts with [`ChainError::EstimatorFailure`] naming the global row.
    pub fn query(
        &self,
        depth: usize,
        batch: &FeatureBatch<'_>,
        rows: &[usize],
        prefixes: ArrayView2<'_, bool>,
    ) -> Result<Array1<f64>> {
        let estimator = self.estimator(depth).ok_or_else(|| {
            ChainError::InvalidParameter(format!(
                "chain position {depth} out of range for depth {}",
                self.depth()
            ))
        })?;
        if prefixes.nrows() != rows.len() || prefixes.ncols() < depth {
            return Err(ChainError::ShapeMismatch(format!(
                "prefix matrix {:?} does not cover {} rows at depth {depth}",
                prefixes.shape(),
                rows.len()
            )));
        }
        if rows.is_empty() {
            return Ok(Array1::zeros(0));
        }

        let width = batch.num_features();
        let mut augmented = Array2::<f64>::zeros((rows.len(), width + depth));
        for (k, &row) in rows.iter().enumerate() {
            augmented.slice_mut(s![k, ..width]).assign(&batch.row(row));
            for j in 0..depth {
                augmented[[k, width + j]] = if prefixes[[k, j]] { 1.0 } else { 0.0 };
            }
        }

        let proba = estimator
            .predict_proba(augmented.view())
            .map_err(|source| ChainError::EstimatorError { depth, source })?;

        if proba.len() != rows.len() {
            return Err(ChainError::ShapeMismatch(format!(
                "estimator {depth} ({}) returned {} probabilities for {} rows",
                estimator.name(),
                proba.len(),
                rows.len()
            )));
        }
        if let Some((k, &value)) = proba
            .iter()
            .enumerate()
            .find(|(_, p)| !(0.0..=1.0).contains(*p))
        {
            return Err(ChainError::EstimatorFailure {
                depth,
                row: batch.global_row(rows[k]),
                value,
            });
        }

        Ok(proba)
    }
}

/// Invert a permutation of `0..n`, rejecting anything that is not a bijection.
pub fn invert_permutation(order: &[usize]) -> Result<Vec<usize>> {
    let n = order.len();
    let mut inverse = vec![usize::MAX; n];
    for (position, &label) in order.iter().enumerate() {
        if label >= n {
            return Err(ChainError::InvalidOrder(format!(
                "label index {label} out of range for {n} labels"
            )));
        }
        if inverse[label] != usize::MAX {
            return Err(ChainError::InvalidOrder(format!(
                "label index {label} appears more than once"
            )));
        }
        inverse[label] = position;
    }
    Ok(inverse)
}

impl std::fmt::Debug for ChainModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.estimators.iter().map(|e| e.name()).collect();
        f.debug_struct("ChainModel")
            .field("order", &self.order)
            .field("estimators", &names)
            .finish()
    }
}
