//! Borrowed feature batches.

use ndarray::{ArrayView1, ArrayView2, Axis, Slice};
use std::ops::Range;

/// A block of feature rows handed to a search.
///
/// `offset` is the global index of the first row, so a shard of a larger
/// batch still reports global row numbers in errors and derives the same
/// per-row random streams as the full batch would.
#[derive(Debug, Clone, Copy)]
pub struct FeatureBatch<'a> {
    features: ArrayView2<'a, f64>,
    offset: usize,
}

impl<'a> FeatureBatch<'a> {
    /// Wrap a full feature matrix (rows start at global index 0).
    pub fn new(features: ArrayView2<'a, f64>) -> Self {
        Self { features, offset: 0 }
    }

    /// Wrap rows that start at global index `offset`.
    pub fn with_offset(features: ArrayView2<'a, f64>, offset: usize) -> Self {
        Self { features, offset }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.features.nrows()
    }

    /// Whether the batch has no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of feature columns.
    pub fn num_features(&self) -> usize {
        self.features.ncols()
    }

    /// Global index of the first row.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Global index of local row `row`.
    #[inline]
    pub fn global_row(&self, row: usize) -> usize {
        self.offset + row
    }

    /// Features of local row `row`.
    #[inline]
    pub fn row(&self, row: usize) -> ArrayView1<'a, f64> {
        self.features.index_axis_move(Axis(0), row)
    }

    /// Underlying matrix.
    pub fn features(&self) -> ArrayView2<'a, f64> {
        self.features
    }

    /// Sub-batch over local rows `rows`, keeping global numbering.
    pub fn shard(&self, rows: Range<usize>) -> FeatureBatch<'a> {
        let start = rows.start;
        FeatureBatch {
            features: self.features.slice_axis_move(Axis(0), Slice::from(rows)),
            offset: self.offset + start,
        }
    }

    /// Split into contiguous shards of at most `size` rows.
    pub fn shards(&self, size: usize) -> Vec<FeatureBatch<'a>> {
        let size = size.max(1);
        (0..self.len())
            .step_by(size)
            .map(|start| self.shard(start..(start + size).min(self.len())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn shards_keep_global_numbering() {
        let x = Array2::from_shape_fn((7, 2), |(r, c)| (r * 10 + c) as f64);
        let batch = FeatureBatch::with_offset(x.view(), 100);
        let shards = batch.shards(3);

        assert_eq!(shards.len(), 3);
        assert_eq!(shards.iter().map(|s| s.len()).collect::<Vec<_>>(), vec![3, 3, 1]);
        assert_eq!(shards[1].offset(), 103);
        assert_eq!(shards[1].global_row(2), 105);
        assert_eq!(shards[2].row(0)[1], 61.0);
    }

    #[test]
    fn empty_batch_has_no_shards() {
        let x = Array2::<f64>::zeros((0, 4));
        let batch = FeatureBatch::new(x.view());
        assert!(batch.is_empty());
        assert!(batch.shards(8).is_empty());
        assert_eq!(batch.num_features(), 4);
    }
}
