//! Per-label probability estimators.
//!
//! An [`Estimator`] sits at one position of the chain and answers a single
//! question: given the row features plus the labels already decided for the
//! earlier chain positions, what is the probability that this label is 1?

use crate::error::{BoxError, ChainError};
use ndarray::{Array1, ArrayView1, ArrayView2};

/// A fitted binary classifier at one chain position.
///
/// Inputs are augmented rows: the original feature columns followed by one
/// 0.0/1.0 column per label decided so far, in chain order.
pub trait Estimator: Send + Sync {
    /// Probability of class 1 for every row of `features`.
    ///
    /// Must return exactly one value per row. Values outside `[0, 1]` are
    /// rejected by the chain before they reach any search.
    fn predict_proba(&self, features: ArrayView2<'_, f64>) -> Result<Array1<f64>, BoxError>;

    /// Human readable name, used in logs.
    fn name(&self) -> &str {
        "estimator"
    }
}

/// Fitted logistic regression: `sigmoid(w · x + b)`.
#[derive(Debug, Clone)]
pub struct LogisticEstimator {
    weights: Array1<f64>,
    intercept: f64,
}

impl LogisticEstimator {
    /// Create from fitted coefficients.
    pub fn new(weights: Array1<f64>, intercept: f64) -> Self {
        Self { weights, intercept }
    }

    /// Number of input columns this estimator expects.
    pub fn num_inputs(&self) -> usize {
        self.weights.len()
    }

    /// Fitted coefficients.
    pub fn weights(&self) -> &Array1<f64> {
        &self.weights
    }

    /// Fitted intercept.
    pub fn intercept(&self) -> f64 {
        self.intercept
    }
}

#[inline]
fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

impl Estimator for LogisticEstimator {
    fn predict_proba(&self, features: ArrayView2<'_, f64>) -> Result<Array1<f64>, BoxError> {
        if features.ncols() != self.weights.len() {
            return Err(Box::new(ChainError::ShapeMismatch(format!(
                "logistic estimator expects {} inputs, got {}",
                self.weights.len(),
                features.ncols()
            ))));
        }
        // Row by row, so a row's probability never depends on what it is batched with.
        Ok(features
            .rows()
            .into_iter()
            .map(|row| sigmoid(row.dot(&self.weights) + self.intercept))
            .collect())
    }

    fn name(&self) -> &str {
        "logistic"
    }
}

/// Estimator backed by a per-row closure.
///
/// Handy for hand-built trees: the closure sees the augmented row and can
/// read the partial path from its trailing columns.
pub struct FnEstimator<F> {
    f: F,
}

impl<F> FnEstimator<F>
where
    F: Fn(ArrayView1<'_, f64>) -> f64 + Send + Sync,
{
    /// Wrap a closure.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> Estimator for FnEstimator<F>
where
    F: Fn(ArrayView1<'_, f64>) -> f64 + Send + Sync,
{
    fn predict_proba(&self, features: ArrayView2<'_, f64>) -> Result<Array1<f64>, BoxError> {
        Ok(features.rows().into_iter().map(|row| (self.f)(row)).collect())
    }

    fn name(&self) -> &str {
        "fn"
    }
}

impl<F> std::fmt::Debug for FnEstimator<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnEstimator").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn logistic_matches_closed_form() {
        let est = LogisticEstimator::new(array![1.0, -2.0], 0.5);
        let x = array![[0.0, 0.0], [1.0, 1.0], [3.0, 0.0]];
        let p = est.predict_proba(x.view()).unwrap();

        assert_abs_diff_eq!(p[0], 1.0 / (1.0 + (-0.5f64).exp()), epsilon = 1e-12);
        assert_abs_diff_eq!(p[1], 1.0 / (1.0 + (0.5f64).exp()), epsilon = 1e-12);
        assert_abs_diff_eq!(p[2], 1.0 / (1.0 + (-3.5f64).exp()), epsilon = 1e-12);
    }

    #[test]
    fn logistic_saturates_without_nan() {
        let est = LogisticEstimator::new(array![1.0], 0.0);
        let x = array![[-1000.0], [1000.0]];
        let p = est.predict_proba(x.view()).unwrap();
        assert_eq!(p[0], 0.0);
        assert_eq!(p[1], 1.0);
    }

    #[test]
    fn logistic_rejects_wrong_width() {
        let est = LogisticEstimator::new(array![1.0, 2.0, 3.0], 0.0);
        let x = array![[1.0, 2.0]];
        let err = est.predict_proba(x.view()).unwrap_err();
        assert!(err.to_string().contains("expects 3 inputs"));
    }

    #[test]
    fn fn_estimator_sees_each_row() {
        let est = FnEstimator::new(|row: ArrayView1<'_, f64>| row.sum() / 10.0);
        let x = array![[1.0, 2.0], [3.0, 4.0]];
        let p = est.predict_proba(x.view()).unwrap();
        assert_eq!(p.to_vec(), vec![0.3, 0.7]);
    }
}
