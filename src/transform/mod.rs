//! Batch transforms.
//!
//! Every table operation that derives a new table from an old one goes
//! through a [`Transform`]: row filters, column selection and row removal.
//! Transforms compose with [`Chain`].

use arrow::{
    array::{BooleanArray, RecordBatch},
    compute::filter_record_batch,
};

use crate::error::{Error, Result};

mod filter;
mod row_ops;
mod selection;

pub use filter::{Condition, Contains, Predicate, Range};
pub use row_ops::{DropRow, Take};
pub use selection::{DropColumns, Select};

/// A transform that can be applied to RecordBatches.
pub trait Transform: Send + Sync {
    /// Applies the transform to a RecordBatch.
    ///
    /// # Errors
    ///
    /// Returns an error if the transform cannot be applied to the batch.
    fn apply(&self, batch: RecordBatch) -> Result<RecordBatch>;
}

/// Keeps the rows selected by a boolean mask computed from the batch.
///
/// The row filters ([`Contains`], [`Range`], [`Predicate`]) are all mask
/// filters; wrap a closure to filter on anything else.
///
/// # Example
///
/// ```
/// use arrow::array::BooleanArray;
/// use datasheet::{MaskFilter, Table};
///
/// let table = Table::sample().unwrap();
/// let first_only = MaskFilter::new(|batch| {
///     Ok(BooleanArray::from_iter((0..batch.num_rows()).map(|i| Some(i == 0))))
/// });
/// assert_eq!(table.with_transform(&first_only).unwrap().row_count(), 1);
/// ```
pub struct MaskFilter<F>
where
    F: Fn(&RecordBatch) -> Result<BooleanArray> + Send + Sync,
{
    mask: F,
}

impl<F> MaskFilter<F>
where
    F: Fn(&RecordBatch) -> Result<BooleanArray> + Send + Sync,
{
    /// Wraps a mask function.
    pub fn new(mask: F) -> Self {
        Self { mask }
    }
}

impl<F> Transform for MaskFilter<F>
where
    F: Fn(&RecordBatch) -> Result<BooleanArray> + Send + Sync,
{
    fn apply(&self, batch: RecordBatch) -> Result<RecordBatch> {
        let mask = (self.mask)(&batch)?;
        let kept = filter_record_batch(&batch, &mask).map_err(Error::Arrow)?;
        tracing::trace!(rows = batch.num_rows(), kept = kept.num_rows(), "mask filter");
        Ok(kept)
    }
}

/// A chain of transforms applied in sequence.
///
/// A chain of filters is their conjunction: each one narrows the output of
/// the previous one.
pub struct Chain {
    transforms: Vec<Box<dyn Transform>>,
}

impl Chain {
    /// Creates a new empty transform chain.
    pub fn new() -> Self {
        Self {
            transforms: Vec::new(),
        }
    }

    /// Adds a transform to the chain.
    #[must_use]
    pub fn then<T: Transform + 'static>(mut self, transform: T) -> Self {
        self.transforms.push(Box::new(transform));
        self
    }

    /// Returns the number of transforms in the chain.
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    /// Returns true if the chain has no transforms.
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

impl Default for Chain {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform for Chain {
    fn apply(&self, batch: RecordBatch) -> Result<RecordBatch> {
        let mut result = batch;
        for transform in &self.transforms {
            result = transform.apply(result)?;
        }
        Ok(result)
    }
}
