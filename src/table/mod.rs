//! In-memory tables.
//!
//! A [`Table`] is a single Arrow `RecordBatch` whose columns are normalized to
//! text (`Utf8`), integer (`Int64`) or float (`Float64`). Operations never
//! mutate a table in place; each returns a new table, so a failed operation
//! leaves the caller's table usable.

use std::{fmt, path::Path};

use arrow::{
    array::{ArrayRef, RecordBatch},
    datatypes::{Field, SchemaRef},
};

use crate::{
    config::{CsvOptions, EditMode},
    edit::{apply_edits, EditQueue},
    error::{Error, Result},
    format::{self, FileFormat},
    signature::Signature,
    transform::{Chain, Contains, Predicate, Range, Take, Transform},
    value::{ColumnType, Value},
};

pub(crate) mod column;
mod structure;

/// Name of the audit column that is always kept last.
pub const SIGNATURE_COLUMN: &str = "Signature";

/// An in-memory table of named, typed columns.
///
/// # Example
///
/// ```
/// use datasheet::{ColumnType, Table};
///
/// let table = Table::builder()
///     .text("nom", ["Alice", "Bob"])
///     .int("age", [25, 30])
///     .build()
///     .unwrap();
///
/// assert_eq!(table.column_names(), vec!["nom", "age"]);
/// assert_eq!(table.column_type("age").unwrap(), ColumnType::Int);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    batch: RecordBatch,
}

impl Table {
    /// Creates a table from any flat RecordBatch.
    ///
    /// Columns are normalized and a `Signature` column is moved last.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Format`] if two columns share a name or a column
    /// holds nested values.
    pub fn new(batch: RecordBatch) -> Result<Self> {
        let schema = batch.schema();
        let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
        if let Some((i, name)) = names
            .iter()
            .enumerate()
            .find(|&(i, name)| names[..i].contains(name))
        {
            return Err(Error::format(format!(
                "duplicate column name '{}' at position {}",
                name, i
            )));
        }
        let batch = column::normalize_batch(&batch)?;
        Self { batch }.with_signature_last()
    }

    /// Wraps a batch that is already normalized.
    pub(crate) fn from_normalized(batch: RecordBatch) -> Self {
        Self { batch }
    }

    /// Starts building a table column by column.
    pub fn builder() -> TableBuilder {
        TableBuilder::default()
    }

    /// The table shown before anything is uploaded.
    ///
    /// # Errors
    ///
    /// Returns an error only if Arrow rejects the batch.
    pub fn sample() -> Result<Self> {
        Self::builder()
            .text("nom", ["Alice", "Bob", "Charlie"])
            .int("age", [25, 30, 35])
            .text("ville", ["Paris", "Lyon", "Marseille"])
            .build()
    }

    /// Parses raw bytes with default CSV options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Format`] if the content is malformed.
    pub fn load(data: &[u8], format: FileFormat) -> Result<Self> {
        format::load(data, format, &CsvOptions::default())
    }

    /// Reads a file, choosing the parser from its extension.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Format`] for unknown extensions or malformed content,
    /// and [`Error::Io`] if the file cannot be read.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_path_with_options(path, &CsvOptions::default())
    }

    /// Reads a file with explicit CSV options.
    ///
    /// # Errors
    ///
    /// See [`Table::from_path`].
    pub fn from_path_with_options(path: impl AsRef<Path>, csv: &CsvOptions) -> Result<Self> {
        let path = path.as_ref();
        let format = FileFormat::from_path(path)?;
        let data = std::fs::read(path).map_err(|e| Error::io(e, path))?;
        format::load(&data, format, csv)
    }

    /// Serializes the table (JSON uses a two-space indent).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] if the writer fails.
    pub fn export(&self, format: FileFormat) -> Result<Vec<u8>> {
        format::export(self, format, 2)
    }

    /// Writes the table to a file, choosing the writer from its extension.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.export(FileFormat::from_path(path)?)?;
        std::fs::write(path, bytes).map_err(|e| Error::io(e, path))
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.batch.num_rows()
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.batch.num_columns()
    }

    /// Returns true if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    /// Arrow schema of the table.
    pub fn schema(&self) -> SchemaRef {
        self.batch.schema()
    }

    /// The underlying batch.
    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    /// Consumes the table and returns the underlying batch.
    pub fn into_batch(self) -> RecordBatch {
        self.batch
    }

    /// Column names in order.
    pub fn column_names(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    /// Returns true if a column with this name exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.batch.schema().index_of(name).is_ok()
    }

    /// Returns true if the table carries a `Signature` column.
    pub fn has_signature(&self) -> bool {
        self.has_column(SIGNATURE_COLUMN)
    }

    pub(crate) fn field_index(&self, name: &str) -> Result<usize> {
        self.batch
            .schema()
            .index_of(name)
            .map_err(|_| Error::column_not_found(name))
    }

    /// Declared type of a column.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ColumnNotFound`] if the column is absent.
    pub fn column_type(&self, name: &str) -> Result<ColumnType> {
        let idx = self.field_index(name)?;
        self.type_at(idx)
    }

    pub(crate) fn type_at(&self, idx: usize) -> Result<ColumnType> {
        let schema = self.batch.schema();
        let field = schema.field(idx);
        ColumnType::from_data_type(field.data_type()).ok_or_else(|| {
            Error::schema_mismatch(format!(
                "column '{}' has unnormalized type {}",
                field.name(),
                field.data_type()
            ))
        })
    }

    /// All values of a column, in row order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ColumnNotFound`] if the column is absent.
    pub fn column(&self, name: &str) -> Result<Vec<Value>> {
        let idx = self.field_index(name)?;
        column::column_values(self.batch.column(idx).as_ref(), self.type_at(idx)?)
    }

    /// A single cell.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ColumnNotFound`] or [`Error::IndexOutOfBounds`].
    pub fn value(&self, row: usize, name: &str) -> Result<Value> {
        let idx = self.field_index(name)?;
        self.check_row(row)?;
        let cell = self.batch.column(idx).slice(row, 1);
        let mut values = column::column_values(cell.as_ref(), self.type_at(idx)?)?;
        Ok(values.pop().unwrap_or(Value::Null))
    }

    /// All cells of one row, in column order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfBounds`] if `index` is not a row.
    pub fn row(&self, index: usize) -> Result<Vec<Value>> {
        self.check_row(index)?;
        let row = self.batch.slice(index, 1);
        (0..row.num_columns())
            .map(|idx| {
                let ty = self.type_at(idx)?;
                let mut values = column::column_values(row.column(idx).as_ref(), ty)?;
                Ok(values.pop().unwrap_or(Value::Null))
            })
            .collect()
    }

    pub(crate) fn check_row(&self, index: usize) -> Result<()> {
        if index < self.row_count() {
            Ok(())
        } else {
            Err(Error::IndexOutOfBounds {
                index,
                len: self.row_count(),
            })
        }
    }

    /// Applies a transform to create a new table.
    ///
    /// # Errors
    ///
    /// Returns an error if the transform fails.
    pub fn with_transform<T: Transform>(&self, transform: &T) -> Result<Self> {
        let batch = transform.apply(self.batch.clone())?;
        Ok(Self::from_normalized(batch))
    }

    /// Keeps rows whose text representation of `column` contains `term`,
    /// ignoring case. Null cells never match.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ColumnNotFound`] if the column is absent.
    pub fn filter_simple(&self, column: &str, term: &str) -> Result<Self> {
        let filtered = self.with_transform(&Contains::case_insensitive(column, term))?;
        tracing::debug!(column, term, rows = filtered.row_count(), "simple filter");
        Ok(filtered)
    }

    /// Keeps rows whose numeric `column` lies in `[min, max]`.
    ///
    /// `min > max` yields an empty table rather than an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ColumnNotFound`], or [`Error::TypeCoercion`] if the
    /// column is text.
    pub fn filter_range(&self, column: &str, min: f64, max: f64) -> Result<Self> {
        let filtered = self.with_transform(&Range::new(column, min, max))?;
        tracing::debug!(column, min, max, rows = filtered.row_count(), "range filter");
        Ok(filtered)
    }

    /// Applies predicates in order, each narrowing the previous result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeCoercion`] naming the first predicate whose
    /// operand does not fit its column, or [`Error::ColumnNotFound`].
    pub fn filter_advanced(&self, predicates: &[Predicate]) -> Result<Self> {
        let chain = predicates
            .iter()
            .cloned()
            .fold(Chain::new(), |chain, predicate| chain.then(predicate));
        let filtered = self.with_transform(&chain)?;
        tracing::debug!(
            predicates = predicates.len(),
            rows = filtered.row_count(),
            "advanced filter"
        );
        Ok(filtered)
    }

    /// Applies queued edits in lenient mode.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ColumnNotFound`] if an edit names a missing column.
    pub fn apply_edits(&self, queue: &EditQueue) -> Result<Self> {
        apply_edits(self, queue, EditMode::Lenient).map(|(table, _)| table)
    }

    /// Writes a signature into row 0 of the `Signature` column.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfBounds`] if the table has no rows.
    pub fn stamp_signature(&self, signature: &Signature) -> Result<Self> {
        crate::signature::stamp(self, signature)
    }

    /// First `max_rows` rows rendered as an ASCII table.
    ///
    /// # Errors
    ///
    /// Returns an error if Arrow formatting fails.
    pub fn pretty(&self, max_rows: usize) -> Result<String> {
        let head = Take::new(max_rows).apply(self.batch.clone())?;
        let rendered = arrow::util::pretty::pretty_format_batches(&[head])?;
        Ok(rendered.to_string())
    }

    /// Replaces columns by index, keeping names and order.
    pub(crate) fn replace_columns(
        &self,
        replacements: Vec<(usize, ColumnType, ArrayRef)>,
    ) -> Result<Self> {
        let schema = self.batch.schema();
        let mut fields: Vec<Field> = schema.fields().iter().map(|f| f.as_ref().clone()).collect();
        let mut arrays: Vec<ArrayRef> = self.batch.columns().to_vec();

        for (idx, ty, array) in replacements {
            fields[idx] = Field::new(fields[idx].name(), ty.data_type(), true);
            arrays[idx] = array;
        }

        let batch = column::batch_from_parts(fields, arrays, self.row_count())?;
        Ok(Self::from_normalized(batch))
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match arrow::util::pretty::pretty_format_batches(&[self.batch.clone()]) {
            Ok(rendered) => write!(f, "{}", rendered),
            Err(_) => write!(f, "<{} rows x {} columns>", self.row_count(), self.column_count()),
        }
    }
}

/// Column-by-column table construction.
#[derive(Debug, Default, Clone)]
pub struct TableBuilder {
    columns: Vec<(String, ColumnType, Vec<Value>)>,
}

impl TableBuilder {
    /// Adds a column of the given type.
    #[must_use]
    pub fn column<V: Into<Value>>(
        mut self,
        name: impl Into<String>,
        ty: ColumnType,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.columns
            .push((name.into(), ty, values.into_iter().map(Into::into).collect()));
        self
    }

    /// Adds a text column.
    #[must_use]
    pub fn text<S: Into<String>>(
        self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = S>,
    ) -> Self {
        self.column(
            name,
            ColumnType::Text,
            values.into_iter().map(|s| Value::Text(s.into())),
        )
    }

    /// Adds an integer column.
    #[must_use]
    pub fn int(self, name: impl Into<String>, values: impl IntoIterator<Item = i64>) -> Self {
        self.column(name, ColumnType::Int, values)
    }

    /// Adds a float column.
    #[must_use]
    pub fn float(self, name: impl Into<String>, values: impl IntoIterator<Item = f64>) -> Self {
        self.column(name, ColumnType::Float, values)
    }

    /// Builds the table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateColumn`] for repeated names,
    /// [`Error::SchemaMismatch`] for columns of unequal length and
    /// [`Error::TypeCoercion`] for values that do not fit their column.
    pub fn build(self) -> Result<Table> {
        let row_count = self.columns.first().map_or(0, |(_, _, v)| v.len());
        let mut fields = Vec::with_capacity(self.columns.len());
        let mut arrays = Vec::with_capacity(self.columns.len());

        for (name, ty, values) in self.columns {
            if fields.iter().any(|f: &Field| f.name() == &name) {
                return Err(Error::duplicate_column(name));
            }
            if values.len() != row_count {
                return Err(Error::schema_mismatch(format!(
                    "column '{}' has {} values, expected {}",
                    name,
                    values.len(),
                    row_count
                )));
            }
            let coerced = values
                .iter()
                .map(|v| {
                    v.coerce_to(ty).ok_or_else(|| {
                        Error::type_coercion(
                            format!("column '{}'", name),
                            format!("'{}' is not a valid {}", v, ty),
                        )
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            arrays.push(column::build_array(ty, &coerced));
            fields.push(Field::new(name, ty.data_type(), true));
        }

        let batch = column::batch_from_parts(fields, arrays, row_count)?;
        Table::from_normalized(batch).with_signature_last()
    }
}

impl From<Table> for RecordBatch {
    fn from(table: Table) -> Self {
        table.batch
    }
}

impl TryFrom<RecordBatch> for Table {
    type Error = Error;

    fn try_from(batch: RecordBatch) -> Result<Self> {
        Self::new(batch)
    }
}

impl AsRef<RecordBatch> for Table {
    fn as_ref(&self) -> &RecordBatch {
        &self.batch
    }
}
