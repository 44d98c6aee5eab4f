//! Error types for chain inference.

use thiserror::Error;

/// Result type alias for chain inference operations.
pub type Result<T> = std::result::Result<T, ChainError>;

/// Boxed error returned by estimators that fail outright.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while building or running chain inference.
#[derive(Error, Debug)]
pub enum ChainError {
    /// Loss name is neither `exact_match` nor `hamming`.
    #[error("invalid loss: {0:?} (expected \"exact_match\" or \"hamming\")")]
    InvalidLoss(String),

    /// Strategy parameter out of range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Requested search strategy does not exist.
    #[error("unknown search strategy: {0:?}")]
    UnknownStrategy(String),

    /// Label order is not a permutation of the chain positions.
    #[error("invalid label order: {0}")]
    InvalidOrder(String),

    /// Chain has no estimators.
    #[error("classifier chain has no estimators")]
    EmptyChain,

    /// Shape mismatch between inputs and what an estimator expects.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Estimator produced a value that is not a probability.
    #[error("estimator {depth} returned invalid probability {value} for row {row}")]
    EstimatorFailure {
        /// Chain position of the estimator.
        depth: usize,
        /// Global index of the offending row.
        row: usize,
        /// The value that was returned.
        value: f64,
    },

    /// Estimator raised an error of its own.
    #[error("estimator {depth} failed: {source}")]
    EstimatorError {
        /// Chain position of the estimator.
        depth: usize,
        /// Underlying failure.
        #[source]
        source: BoxError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimator_failure_names_row_and_depth() {
        let err = ChainError::EstimatorFailure {
            depth: 2,
            row: 17,
            value: f64::NAN,
        };
        let msg = err.to_string();
        assert!(msg.contains("estimator 2"));
        assert!(msg.contains("row 17"));
    }

    #[test]
    fn estimator_error_keeps_source() {
        use std::error::Error as _;
        let inner: BoxError = "backend offline".into();
        let err = ChainError::EstimatorError { depth: 0, source: inner };
        assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("backend offline"));
    }
}
