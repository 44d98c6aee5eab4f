//! Classifier chains as seen from inference.
//!
//! A chain of depth d is a binary tree: level `i` is decided by the estimator
//! at chain position `i`, and each edge is a label value. Searches walk this
//! tree through [`ChainModel::query`], which builds the augmented inputs
//! (`features ++ labels decided so far`) and validates what comes back.
//!
//! # Example
//!
//! ```
//! use chainsearch_core::chain::{ChainModel, Estimator, FeatureBatch, LogisticEstimator};
//! use ndarray::{array, Array2};
//!
//! // Two labels over one feature; the second label also sees the first.
//! let chain = ChainModel::new(
//!     vec![
//!         Box::new(LogisticEstimator::new(array![2.0], -1.0)) as Box<dyn Estimator>,
//!         Box::new(LogisticEstimator::new(array![0.5, 3.0], -2.0)),
//!     ],
//!     vec![1, 0],
//! )
//! .unwrap();
//!
//! let x = array![[0.3], [1.5]];
//! let batch = FeatureBatch::new(x.view());
//! let no_labels = Array2::<bool>::default((2, 0));
//! let p = chain.query(0, &batch, &[0, 1], no_labels.view()).unwrap();
//! assert!(p[1] > p[0]);
//! ```

mod batch;
mod estimator;
mod model;

pub use batch::FeatureBatch;
pub use estimator::{Estimator, FnEstimator, LogisticEstimator};
pub use model::{invert_permutation, ChainModel};
