//! Row-level operations: slicing and removal.

use arrow::{
    array::{BooleanArray, RecordBatch},
    compute::filter_record_batch,
};

use super::Transform;
use crate::error::{Error, Result};

/// A transform that takes the first N rows from a RecordBatch.
///
/// # Example
///
/// ```
/// use datasheet::{transform::Take, Table};
///
/// let head = Table::sample().unwrap().with_transform(&Take::new(2)).unwrap();
/// assert_eq!(head.row_count(), 2);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Take {
    count: usize,
}

impl Take {
    /// Creates a Take transform that keeps the first `count` rows.
    pub fn new(count: usize) -> Self {
        Self { count }
    }

    /// Returns the number of rows to take.
    pub fn count(&self) -> usize {
        self.count
    }
}

impl Transform for Take {
    fn apply(&self, batch: RecordBatch) -> Result<RecordBatch> {
        let num_rows = batch.num_rows();
        if self.count >= num_rows {
            return Ok(batch);
        }

        Ok(batch.slice(0, self.count))
    }
}

/// A transform that removes a single row by position.
#[derive(Debug, Clone, Copy)]
pub struct DropRow {
    index: usize,
}

impl DropRow {
    /// Creates a DropRow transform for the row at `index`.
    pub fn new(index: usize) -> Self {
        Self { index }
    }

    /// Returns the index of the row to remove.
    pub fn index(&self) -> usize {
        self.index
    }
}

impl Transform for DropRow {
    fn apply(&self, batch: RecordBatch) -> Result<RecordBatch> {
        let num_rows = batch.num_rows();
        if self.index >= num_rows {
            return Err(Error::IndexOutOfBounds {
                index: self.index,
                len: num_rows,
            });
        }

        let mask = BooleanArray::from_iter((0..num_rows).map(|i| Some(i != self.index)));
        filter_record_batch(&batch, &mask).map_err(Error::Arrow)
    }
}
