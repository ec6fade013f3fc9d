//! Structural edits: adding and dropping columns and rows.
//!
//! Every operation here ends by moving the `Signature` column, if present,
//! to the last position.

use arrow::{
    array::{new_null_array, RecordBatch},
    compute::concat_batches,
    datatypes::Field,
};

use super::{column, Table, SIGNATURE_COLUMN};
use crate::{
    error::{Error, Result},
    transform::{DropColumns, DropRow, Select, Transform},
    value::ColumnType,
};

impl Table {
    /// Appends a column filled with the type's zero value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateColumn`] if `name` already exists.
    pub fn add_column(&self, name: &str, ty: ColumnType) -> Result<Self> {
        if self.has_column(name) {
            return Err(Error::duplicate_column(name));
        }

        let schema = self.schema();
        let mut fields: Vec<Field> = schema.fields().iter().map(|f| f.as_ref().clone()).collect();
        let mut arrays = self.batch.columns().to_vec();

        fields.push(Field::new(name, ty.data_type(), true));
        arrays.push(column::build_array(
            ty,
            &vec![ty.zero_value(); self.row_count()],
        ));

        let batch = column::batch_from_parts(fields, arrays, self.row_count())?;
        tracing::debug!(column = name, %ty, "added column");
        Self::from_normalized(batch).with_signature_last()
    }

    /// Removes a column.
    ///
    /// Dropping `Signature` is allowed here; front ends decide whether to
    /// offer it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ColumnNotFound`] if `name` is absent.
    pub fn drop_column(&self, name: &str) -> Result<Self> {
        self.field_index(name)?;
        let table = self.with_transform(&DropColumns::new([name]))?;
        tracing::debug!(column = name, "dropped column");
        table.with_signature_last()
    }

    /// Appends one row of nulls.
    ///
    /// # Errors
    ///
    /// Returns an error if Arrow cannot concatenate the row.
    pub fn add_row(&self) -> Result<Self> {
        let schema = self.schema();
        let nulls = schema
            .fields()
            .iter()
            .map(|f| new_null_array(f.data_type(), 1))
            .collect();
        let fields = schema.fields().iter().map(|f| f.as_ref().clone()).collect();
        let row = column::batch_from_parts(fields, nulls, 1)?;

        let batch = if self.column_count() == 0 {
            column::batch_from_parts(vec![], vec![], self.row_count() + 1)?
        } else {
            concat_batches(&schema, [&self.batch, &row])?
        };

        tracing::debug!(rows = batch.num_rows(), "added row");
        Self::from_normalized(batch).with_signature_last()
    }

    /// Removes the row at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfBounds`] if `index` is not in `[0, rows)`.
    pub fn drop_row(&self, index: usize) -> Result<Self> {
        self.check_row(index)?;
        let table = self.with_transform(&DropRow::new(index))?;
        tracing::debug!(index, rows = table.row_count(), "dropped row");
        table.with_signature_last()
    }

    /// Moves the `Signature` column to the end if it is elsewhere.
    ///
    /// # Errors
    ///
    /// Returns an error if Arrow rejects the reordered batch.
    pub fn with_signature_last(self) -> Result<Self> {
        let schema = self.schema();
        let Ok(idx) = schema.index_of(SIGNATURE_COLUMN) else {
            return Ok(self);
        };
        if idx + 1 == schema.fields().len() {
            return Ok(self);
        }

        let order = schema
            .fields()
            .iter()
            .map(|f| f.name().as_str())
            .filter(|name| *name != SIGNATURE_COLUMN)
            .chain(std::iter::once(SIGNATURE_COLUMN));
        let batch: RecordBatch = Select::new(order).apply(self.batch)?;
        Ok(Self::from_normalized(batch))
    }

    /// Returns true when `Signature` is absent or in the last position.
    pub fn signature_is_last(&self) -> bool {
        let schema = self.schema();
        schema
            .index_of(SIGNATURE_COLUMN)
            .map_or(true, |idx| idx + 1 == schema.fields().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn sample() -> Table {
        Table::sample().unwrap()
    }

    fn signed() -> Table {
        Table::builder()
            .text("nom", ["Alice", "Bob"])
            .text(SIGNATURE_COLUMN, ["stamp", ""])
            .build()
            .unwrap()
    }

    #[test]
    fn test_add_column_zero_filled() {
        let table = sample().add_column("score", ColumnType::Int).unwrap();
        assert_eq!(table.column_names(), vec!["nom", "age", "ville", "score"]);
        assert_eq!(table.column("score").unwrap(), vec![Value::Int(0); 3]);

        let table = table.add_column("note", ColumnType::Text).unwrap();
        assert_eq!(table.value(0, "note").unwrap(), Value::from(""));

        let table = table.add_column("ratio", ColumnType::Float).unwrap();
        assert_eq!(table.value(2, "ratio").unwrap(), Value::Float(0.0));
    }

    #[test]
    fn test_add_then_drop_restores_schema() {
        let original = sample();
        let roundtrip = original
            .add_column("score", ColumnType::Int)
            .unwrap()
            .drop_column("score")
            .unwrap();
        assert_eq!(roundtrip.schema(), original.schema());
        assert_eq!(roundtrip, original);
    }

    #[test]
    fn test_add_duplicate_column() {
        let err = sample().add_column("age", ColumnType::Float).unwrap_err();
        assert!(matches!(err, Error::DuplicateColumn { ref name } if name == "age"));
    }

    #[test]
    fn test_add_column_keeps_signature_last() {
        let table = signed().add_column("age", ColumnType::Int).unwrap();
        assert_eq!(table.column_names(), vec!["nom", "age", SIGNATURE_COLUMN]);
        assert_eq!(table.value(0, SIGNATURE_COLUMN).unwrap(), Value::from("stamp"));
    }

    #[test]
    fn test_drop_missing_column() {
        let err = sample().drop_column("pays").unwrap_err();
        assert!(matches!(err, Error::ColumnNotFound { .. }));
    }

    #[test]
    fn test_drop_signature_column_is_allowed() {
        let table = signed().drop_column(SIGNATURE_COLUMN).unwrap();
        assert!(!table.has_signature());
    }

    #[test]
    fn test_drop_every_column_keeps_rows() {
        let table = sample()
            .drop_column("nom")
            .unwrap()
            .drop_column("age")
            .unwrap()
            .drop_column("ville")
            .unwrap();
        assert_eq!(table.column_count(), 0);
        assert_eq!(table.row_count(), 3);
    }

    #[test]
    fn test_add_row_is_null() {
        let table = sample().add_row().unwrap();
        assert_eq!(table.row_count(), 4);
        assert_eq!(table.row(3).unwrap(), vec![Value::Null; 3]);
        assert_eq!(table.value(0, "nom").unwrap(), Value::from("Alice"));
    }

    #[test]
    fn test_add_row_leaves_signature_untouched() {
        let table = signed().add_row().unwrap();
        assert_eq!(table.value(0, SIGNATURE_COLUMN).unwrap(), Value::from("stamp"));
        assert_eq!(table.value(2, SIGNATURE_COLUMN).unwrap(), Value::Null);
        assert!(table.signature_is_last());
    }

    #[test]
    fn test_drop_row() {
        let table = sample().drop_row(1).unwrap();
        assert_eq!(
            table.column("nom").unwrap(),
            vec![Value::from("Alice"), Value::from("Charlie")]
        );
    }

    #[test]
    fn test_drop_row_out_of_range() {
        let err = sample().drop_row(3).unwrap_err();
        assert!(matches!(err, Error::IndexOutOfBounds { index: 3, len: 3 }));
    }

    #[test]
    fn test_signature_last_after_new() {
        use std::sync::Arc;

        use arrow::{
            array::StringArray,
            datatypes::{DataType, Schema},
        };

        let schema = Arc::new(Schema::new(vec![
            Field::new(SIGNATURE_COLUMN, DataType::Utf8, true),
            Field::new("nom", DataType::Utf8, true),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec![Some("s")])),
                Arc::new(StringArray::from(vec![Some("Alice")])),
            ],
        )
        .unwrap();

        let table = Table::new(batch).unwrap();
        assert_eq!(table.column_names(), vec!["nom", SIGNATURE_COLUMN]);
    }
}
