//! Parsing bytes into tables.

use std::sync::Arc;

use arrow::{array::RecordBatch, compute::concat_batches, datatypes::SchemaRef};
use arrow_csv::{reader::Format, ReaderBuilder as CsvReaderBuilder};
use arrow_json::{
    reader::{infer_json_schema, infer_json_schema_from_iterator},
    ReaderBuilder as JsonReaderBuilder,
};
use bytes::Bytes;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::FileFormat;
use crate::{
    config::CsvOptions,
    error::{Error, Result},
    Table,
};

/// Parses `data` as `format` into a normalized table.
///
/// # Errors
///
/// Returns [`Error::Format`] if the content is malformed, has no columns, or
/// holds nested values.
pub fn load(data: &[u8], format: FileFormat, csv: &CsvOptions) -> Result<Table> {
    let batch = match format {
        FileFormat::Csv => read_csv(data, csv)?,
        FileFormat::Json => read_json(data, csv.batch_size)?,
        FileFormat::JsonLines => read_json_lines(data, csv)?,
        FileFormat::Parquet => read_parquet(data)?,
    };

    if batch.num_columns() == 0 {
        return Err(Error::format(format!("{} content has no columns", format)));
    }

    let table = Table::new(batch)?;
    tracing::info!(
        %format,
        rows = table.row_count(),
        columns = table.column_count(),
        "loaded table"
    );
    Ok(table)
}

fn collect(schema: &SchemaRef, batches: &[RecordBatch]) -> Result<RecordBatch> {
    concat_batches(schema, batches).map_err(Error::Arrow)
}

/// Reads CSV content, inferring column types.
///
/// # Errors
///
/// Returns [`Error::Format`] if the content cannot be parsed.
pub fn read_csv(data: &[u8], options: &CsvOptions) -> Result<RecordBatch> {
    let invalid = |e| Error::format(format!("Invalid CSV: {}", e));

    let mut format = Format::default().with_header(options.has_header);
    if let Some(delim) = options.delimiter {
        format = format.with_delimiter(delim);
    }
    let (inferred, _) = format
        .infer_schema(data, Some(options.infer_records))
        .map_err(invalid)?;
    let schema = Arc::new(inferred);

    let mut builder = CsvReaderBuilder::new(Arc::clone(&schema))
        .with_batch_size(options.batch_size)
        .with_header(options.has_header);
    if let Some(delim) = options.delimiter {
        builder = builder.with_delimiter(delim);
    }

    let reader = builder.build(data).map_err(invalid)?;
    let batches = reader
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(invalid)?;

    collect(&schema, &batches)
}

/// Reads a JSON array of flat objects.
///
/// # Errors
///
/// Returns [`Error::Format`] if the content is not an array of objects.
pub fn read_json(data: &[u8], batch_size: usize) -> Result<RecordBatch> {
    let invalid = |e: &dyn std::fmt::Display| Error::format(format!("Invalid JSON: {}", e));

    let document: serde_json::Value = serde_json::from_slice(data).map_err(|e| invalid(&e))?;
    let serde_json::Value::Array(rows) = document else {
        return Err(Error::format("Invalid JSON: expected an array of records"));
    };
    if let Some(pos) = rows.iter().position(|row| !row.is_object()) {
        return Err(Error::format(format!(
            "Invalid JSON: element {} is not an object",
            pos
        )));
    }

    let inferred = infer_json_schema_from_iterator(rows.iter().map(Ok)).map_err(|e| invalid(&e))?;
    let schema = Arc::new(inferred);

    let mut decoder = JsonReaderBuilder::new(Arc::clone(&schema))
        .with_batch_size(batch_size)
        .build_decoder()
        .map_err(|e| invalid(&e))?;

    let mut batches = Vec::new();
    for chunk in rows.chunks(batch_size.max(1)) {
        decoder.serialize(chunk).map_err(|e| invalid(&e))?;
        if let Some(batch) = decoder.flush().map_err(|e| invalid(&e))? {
            batches.push(batch);
        }
    }

    collect(&schema, &batches)
}

/// Reads newline-delimited JSON objects.
///
/// # Errors
///
/// Returns [`Error::Format`] if a line is not a JSON object.
pub fn read_json_lines(data: &[u8], options: &CsvOptions) -> Result<RecordBatch> {
    let invalid = |e| Error::format(format!("Invalid JSON Lines: {}", e));

    let (inferred, _) = infer_json_schema(data, Some(options.infer_records)).map_err(invalid)?;
    let schema = Arc::new(inferred);

    let reader = JsonReaderBuilder::new(Arc::clone(&schema))
        .with_batch_size(options.batch_size)
        .build(data)
        .map_err(invalid)?;
    let batches = reader
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(invalid)?;

    collect(&schema, &batches)
}

/// Reads Parquet bytes held in memory.
///
/// # Errors
///
/// Returns [`Error::Format`] if the data is not valid Parquet.
pub fn read_parquet(data: &[u8]) -> Result<RecordBatch> {
    let invalid = |e: &dyn std::fmt::Display| Error::format(format!("Invalid Parquet: {}", e));

    let builder = ParquetRecordBatchReaderBuilder::try_new(Bytes::copy_from_slice(data))
        .map_err(|e| invalid(&e))?;
    let schema = Arc::clone(builder.schema());
    let reader = builder.build().map_err(|e| invalid(&e))?;

    let batches = reader
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| invalid(&e))?;

    collect(&schema, &batches)
}
