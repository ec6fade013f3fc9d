//! Conversions between Arrow arrays and [`Value`]s.
//!
//! Every table column is normalized to one of three Arrow types
//! (`Utf8`, `Int64`, `Float64`) and marked nullable.

use std::sync::Arc;

use arrow::{
    array::{
        Array, ArrayRef, Float64Array, Int64Array, RecordBatch, RecordBatchOptions, StringArray,
    },
    compute::cast,
    datatypes::{DataType, Field, Schema},
};

use crate::{
    error::{Error, Result},
    value::{ColumnType, Value},
};

/// Column type an arbitrary Arrow type is normalized to.
///
/// # Errors
///
/// Returns [`Error::Format`] for nested types that have no flat
/// representation.
pub(crate) fn normalized_type(name: &str, data_type: &DataType) -> Result<ColumnType> {
    match data_type {
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => Ok(ColumnType::Int),
        DataType::Float16
        | DataType::Float32
        | DataType::Float64
        | DataType::Decimal128(..)
        | DataType::Decimal256(..) => Ok(ColumnType::Float),
        DataType::Utf8
        | DataType::LargeUtf8
        | DataType::Utf8View
        | DataType::Boolean
        | DataType::Null
        | DataType::Date32
        | DataType::Date64
        | DataType::Time32(_)
        | DataType::Time64(_)
        | DataType::Timestamp(..)
        | DataType::Duration(_)
        | DataType::Binary
        | DataType::LargeBinary
        | DataType::Dictionary(..) => Ok(ColumnType::Text),
        other => Err(Error::format(format!(
            "column '{}' holds nested values ({}), only flat columns are supported",
            name, other
        ))),
    }
}

/// Casts every column of `batch` to its normalized type.
pub(crate) fn normalize_batch(batch: &RecordBatch) -> Result<RecordBatch> {
    let schema = batch.schema();
    let mut fields = Vec::with_capacity(schema.fields().len());
    let mut arrays = Vec::with_capacity(schema.fields().len());

    for (field, array) in schema.fields().iter().zip(batch.columns()) {
        let ty = normalized_type(field.name(), field.data_type())?;
        let target = ty.data_type();
        let array = if array.data_type() == &target {
            Arc::clone(array)
        } else {
            cast(array, &target).map_err(|e| {
                Error::format(format!("column '{}' cannot be read as {}: {}", field.name(), ty, e))
            })?
        };
        fields.push(Field::new(field.name(), target, true));
        arrays.push(array);
    }

    batch_from_parts(fields, arrays, batch.num_rows())
}

/// Builds a batch, keeping the row count even when there are no columns.
pub(crate) fn batch_from_parts(
    fields: Vec<Field>,
    arrays: Vec<ArrayRef>,
    row_count: usize,
) -> Result<RecordBatch> {
    let options = RecordBatchOptions::new().with_row_count(Some(row_count));
    RecordBatch::try_new_with_options(Arc::new(Schema::new(fields)), arrays, &options)
        .map_err(Error::Arrow)
}

/// Reads every cell of a normalized array.
pub(crate) fn column_values(array: &dyn Array, ty: ColumnType) -> Result<Vec<Value>> {
    let mismatch = || {
        Error::schema_mismatch(format!(
            "expected {} array, found {}",
            ty.data_type(),
            array.data_type()
        ))
    };

    let values = match ty {
        ColumnType::Text => array
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or_else(mismatch)?
            .iter()
            .map(|v| v.map_or(Value::Null, |s| Value::Text(s.to_string())))
            .collect(),
        ColumnType::Int => array
            .as_any()
            .downcast_ref::<Int64Array>()
            .ok_or_else(mismatch)?
            .iter()
            .map(|v| v.map_or(Value::Null, Value::Int))
            .collect(),
        ColumnType::Float => array
            .as_any()
            .downcast_ref::<Float64Array>()
            .ok_or_else(mismatch)?
            .iter()
            .map(|v| v.map_or(Value::Null, Value::Float))
            .collect(),
    };

    Ok(values)
}

/// Builds a normalized array from values already coerced to `ty`.
///
/// Values of any other variant become null.
pub(crate) fn build_array(ty: ColumnType, values: &[Value]) -> ArrayRef {
    match ty {
        ColumnType::Text => Arc::new(
            values
                .iter()
                .map(|v| match v {
                    Value::Text(s) => Some(s.as_str()),
                    _ => None,
                })
                .collect::<StringArray>(),
        ),
        ColumnType::Int => Arc::new(
            values
                .iter()
                .map(|v| match v {
                    Value::Int(i) => Some(*i),
                    _ => None,
                })
                .collect::<Int64Array>(),
        ),
        ColumnType::Float => Arc::new(
            values
                .iter()
                .map(|v| match v {
                    Value::Float(f) => Some(*f),
                    _ => None,
                })
                .collect::<Float64Array>(),
        ),
    }
}
