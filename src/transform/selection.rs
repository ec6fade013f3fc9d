//! Column selection transforms.

use std::sync::Arc;

use arrow::{array::RecordBatch, datatypes::Field};

use super::Transform;
use crate::{
    error::{Error, Result},
    table::column::batch_from_parts,
};

/// Keeps the named columns, in the given order.
///
/// # Example
///
/// ```
/// use datasheet::{transform::Select, Table};
///
/// let table = Table::sample().unwrap();
/// let reordered = table.with_transform(&Select::new(["ville", "nom"])).unwrap();
/// assert_eq!(reordered.column_names(), vec!["ville", "nom"]);
/// ```
#[derive(Debug, Clone)]
pub struct Select {
    columns: Vec<String>,
}

impl Select {
    /// Creates a new Select transform for the given column names.
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the columns to be selected.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

impl Transform for Select {
    fn apply(&self, batch: RecordBatch) -> Result<RecordBatch> {
        let schema = batch.schema();
        let mut fields: Vec<Field> = Vec::with_capacity(self.columns.len());
        let mut arrays = Vec::with_capacity(self.columns.len());

        for col_name in &self.columns {
            let (idx, field) = schema
                .column_with_name(col_name)
                .ok_or_else(|| Error::column_not_found(col_name))?;

            fields.push(field.clone());
            arrays.push(Arc::clone(batch.column(idx)));
        }

        batch_from_parts(fields, arrays, batch.num_rows())
    }
}

/// Removes the named columns.
///
/// Unlike a projection this may remove every column; the row count is
/// kept.
#[derive(Debug, Clone)]
pub struct DropColumns {
    columns: Vec<String>,
}

impl DropColumns {
    /// Creates a new DropColumns transform for the given column names.
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }
}

impl Transform for DropColumns {
    fn apply(&self, batch: RecordBatch) -> Result<RecordBatch> {
        let schema = batch.schema();

        for col_name in &self.columns {
            if schema.index_of(col_name).is_err() {
                return Err(Error::column_not_found(col_name));
            }
        }

        let (fields, arrays): (Vec<Field>, Vec<_>) = schema
            .fields()
            .iter()
            .zip(batch.columns())
            .filter(|(field, _)| !self.columns.contains(field.name()))
            .map(|(field, array)| (field.as_ref().clone(), Arc::clone(array)))
            .unzip();

        batch_from_parts(fields, arrays, batch.num_rows())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Table;

    fn sample_batch() -> RecordBatch {
        Table::sample().unwrap().into_batch()
    }

    #[test]
    fn test_select_reorders() {
        let select = Select::new(["age", "nom"]);
        assert_eq!(select.columns(), ["age", "nom"]);

        let result = select.apply(sample_batch()).unwrap();
        assert_eq!(result.schema().field(0).name(), "age");
        assert_eq!(result.num_columns(), 2);
        assert_eq!(result.num_rows(), 3);
    }

    #[test]
    fn test_select_missing_column() {
        let result = Select::new(["pays"]).apply(sample_batch());
        assert!(matches!(result, Err(Error::ColumnNotFound { .. })));
    }

    #[test]
    fn test_drop_columns() {
        let result = DropColumns::new(["age"]).apply(sample_batch()).unwrap();
        assert_eq!(result.num_columns(), 2);
        assert!(result.schema().index_of("age").is_err());
    }

    #[test]
    fn test_drop_all_columns_keeps_row_count() {
        let result = DropColumns::new(["nom", "age", "ville"])
            .apply(sample_batch())
            .unwrap();
        assert_eq!(result.num_columns(), 0);
        assert_eq!(result.num_rows(), 3);
    }

    #[test]
    fn test_drop_missing_column() {
        let result = DropColumns::new(["pays"]).apply(sample_batch());
        assert!(matches!(result, Err(Error::ColumnNotFound { .. })));
    }
}
