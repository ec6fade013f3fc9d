//! Serializing tables into bytes.

use arrow_csv::WriterBuilder;
use arrow_json::LineDelimitedWriter;
use parquet::{arrow::ArrowWriter, file::properties::WriterProperties};
use serde::Serialize;
use serde_json::{ser::PrettyFormatter, Map, Serializer};

use super::FileFormat;
use crate::{
    error::{Error, Result},
    Table,
};

/// Serializes `table` as `format`.
///
/// `json_indent` is the number of spaces per level for [`FileFormat::Json`];
/// zero writes compact JSON.
///
/// # Errors
///
/// Returns [`Error::Serialization`] if the writer fails.
pub fn export(table: &Table, format: FileFormat, json_indent: usize) -> Result<Vec<u8>> {
    let bytes = match format {
        FileFormat::Csv => to_csv(table)?,
        FileFormat::Json => to_json(table, json_indent)?,
        FileFormat::JsonLines => to_json_lines(table)?,
        FileFormat::Parquet => to_parquet(table)?,
    };
    tracing::info!(
        %format,
        rows = table.row_count(),
        bytes = bytes.len(),
        "exported table"
    );
    Ok(bytes)
}

/// CSV with a header row and no index column. Nulls are empty fields.
///
/// # Errors
///
/// Returns [`Error::Serialization`] if the writer fails.
pub fn to_csv(table: &Table) -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new().with_header(true).build(Vec::new());
    writer
        .write(table.batch())
        .map_err(|e| Error::serialization(format!("CSV: {}", e)))?;
    Ok(writer.into_inner())
}

/// A JSON array of records, one object per row, keys in column order.
///
/// # Errors
///
/// Returns [`Error::Serialization`] if a cell cannot be serialized.
pub fn to_json(table: &Table, indent: usize) -> Result<Vec<u8>> {
    let failed = |e: serde_json::Error| Error::serialization(format!("JSON: {}", e));

    let names = table.column_names();
    let columns = names
        .iter()
        .map(|name| table.column(name))
        .collect::<Result<Vec<_>>>()?;

    let mut records = Vec::with_capacity(table.row_count());
    for row in 0..table.row_count() {
        let mut record = Map::with_capacity(names.len());
        for (name, values) in names.iter().zip(&columns) {
            record.insert(name.clone(), serde_json::to_value(&values[row]).map_err(failed)?);
        }
        records.push(record);
    }

    if indent == 0 {
        return serde_json::to_vec(&records).map_err(failed);
    }

    let indent = " ".repeat(indent);
    let mut buffer = Vec::new();
    let mut serializer =
        Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(indent.as_bytes()));
    records.serialize(&mut serializer).map_err(failed)?;
    Ok(buffer)
}

/// One JSON object per line. Null cells are omitted.
///
/// # Errors
///
/// Returns [`Error::Serialization`] if the writer fails.
pub fn to_json_lines(table: &Table) -> Result<Vec<u8>> {
    let failed = |e| Error::serialization(format!("JSON Lines: {}", e));

    let mut writer = LineDelimitedWriter::new(Vec::new());
    writer.write(table.batch()).map_err(failed)?;
    writer.finish().map_err(failed)?;
    Ok(writer.into_inner())
}

/// Parquet bytes. Columns are already flat `Utf8`/`Int64`/`Float64`.
///
/// # Errors
///
/// Returns [`Error::Serialization`] if the writer fails.
pub fn to_parquet(table: &Table) -> Result<Vec<u8>> {
    let failed = |e: parquet::errors::ParquetError| Error::serialization(format!("Parquet: {}", e));

    let mut buffer = Vec::new();
    let props = WriterProperties::builder().build();
    let mut writer =
        ArrowWriter::try_new(&mut buffer, table.schema(), Some(props)).map_err(failed)?;
    writer.write(table.batch()).map_err(failed)?;
    writer.close().map_err(failed)?;
    Ok(buffer)
}
