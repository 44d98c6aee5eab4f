//! Path scoring shared by every search strategy.
//!
//! Two losses are supported:
//! - **Exact match**: a path is worth its joint probability, the product of
//!   the branch probabilities along it.
//! - **Hamming**: a path is worth the sum of its branch probabilities, the
//!   expected number of correct labels under the chain's approximation.
//!
//! [`ScoreAccumulator::combine`] is the probability-space contract used by
//! reward replay. During search the same accumulator works on [`PathScore`]s,
//! which keep exact-match scores as log-probabilities so deep chains do not
//! underflow to zero and every strategy compares paths with identical
//! arithmetic.

use crate::error::ChainError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Loss the prediction should minimize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Loss {
    /// Maximize the joint probability of the whole label vector.
    #[default]
    ExactMatch,
    /// Maximize the summed per-label probabilities.
    Hamming,
}

impl Loss {
    /// Canonical name.
    pub fn as_str(self) -> &'static str {
        match self {
            Loss::ExactMatch => "exact_match",
            Loss::Hamming => "hamming",
        }
    }
}

impl FromStr for Loss {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exact_match" => Ok(Loss::ExactMatch),
            "hamming" => Ok(Loss::Hamming),
            other => Err(ChainError::InvalidLoss(other.to_string())),
        }
    }
}

impl fmt::Display for Loss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accumulated score of a (partial) path in search space.
///
/// For exact match this is `ln` of the joint probability; for Hamming it is
/// the plain sum. Never NaN: probabilities are validated before they get here.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct PathScore(f64);

impl PathScore {
    /// Raw accumulated value.
    pub fn raw(self) -> f64 {
        self.0
    }

    /// Total order over scores.
    #[inline]
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Combines branch probabilities into path scores for one loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreAccumulator {
    loss: Loss,
}

impl ScoreAccumulator {
    /// Create for a loss.
    pub fn new(loss: Loss) -> Self {
        Self { loss }
    }

    /// Loss this accumulator scores for.
    pub fn loss(&self) -> Loss {
        self.loss
    }

    /// Probability-space score of the empty path.
    pub fn identity(&self) -> f64 {
        match self.loss {
            Loss::ExactMatch => 1.0,
            Loss::Hamming => 0.0,
        }
    }

    /// Probability-space update: `past * p` or `past + p`.
    #[inline]
    pub fn combine(&self, past: f64, p: f64) -> f64 {
        match self.loss {
            Loss::ExactMatch => past * p,
            Loss::Hamming => past + p,
        }
    }

    /// [`combine`](Self::combine) applied element-wise, in place.
    pub fn combine_batch(&self, past: &mut [f64], p: &[f64]) {
        debug_assert_eq!(past.len(), p.len());
        for (s, &q) in past.iter_mut().zip(p) {
            *s = self.combine(*s, q);
        }
    }

    /// Search-space score of the empty path.
    #[inline]
    pub fn root(&self) -> PathScore {
        PathScore(0.0)
    }

    /// Extend a path by a branch taken with probability `p`.
    #[inline]
    pub fn extend(&self, score: PathScore, p: f64) -> PathScore {
        match self.loss {
            Loss::ExactMatch => PathScore(score.0 + p.ln()),
            Loss::Hamming => PathScore(score.0 + p),
        }
    }

    /// Map a search-space score back to probability space.
    #[inline]
    pub fn realize(&self, score: PathScore) -> f64 {
        match self.loss {
            Loss::ExactMatch => score.0.exp(),
            Loss::Hamming => score.0,
        }
    }

    /// Map a probability-space threshold into search space.
    ///
    /// `realize(s) >= value` holds exactly when `s >= threshold(value)`.
    /// A zero threshold maps to negative infinity, which every score meets.
    pub fn threshold(&self, value: f64) -> PathScore {
        match self.loss {
            Loss::ExactMatch => PathScore(value.ln()),
            Loss::Hamming => PathScore(value),
        }
    }
}
