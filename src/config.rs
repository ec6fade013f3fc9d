//! Engine configuration.
//!
//! Options are plain structs with builder-style setters; the CLI maps its
//! flags onto them.

use crate::error::{Error, Result};

/// How [`apply_edits`](crate::edit::apply_edits) treats values that do not
/// fit the target column's type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EditMode {
    /// Convert the target column to text and store the value as text.
    #[default]
    Lenient,
    /// Reject the whole queue before anything is written.
    Strict,
}

/// Options for CSV parsing.
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Whether the CSV content has a header row.
    pub has_header: bool,
    /// Delimiter byte (comma when `None`).
    pub delimiter: Option<u8>,
    /// Number of records used for schema inference.
    pub infer_records: usize,
    /// Batch size for reading.
    pub batch_size: usize,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            has_header: true,
            delimiter: None,
            infer_records: 1000,
            batch_size: 8192,
        }
    }
}

impl CsvOptions {
    /// Creates new CSV options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether the content has a header row.
    #[must_use]
    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    /// Sets the delimiter byte.
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    /// Sets how many records schema inference looks at.
    #[must_use]
    pub fn with_infer_records(mut self, records: usize) -> Self {
        self.infer_records = records;
        self
    }

    /// Sets the batch size for reading.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }
}

/// Top-level configuration for a [`Session`](crate::Session).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// CSV parsing options.
    pub csv: CsvOptions,
    /// Edit coercion policy.
    pub edit_mode: EditMode,
    /// Spaces per indentation level in JSON exports.
    pub json_indent: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            csv: CsvOptions::default(),
            edit_mode: EditMode::Lenient,
            json_indent: 2,
        }
    }
}

impl EngineConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the CSV options.
    #[must_use]
    pub fn with_csv(mut self, csv: CsvOptions) -> Self {
        self.csv = csv;
        self
    }

    /// Sets the edit mode.
    #[must_use]
    pub fn with_edit_mode(mut self, mode: EditMode) -> Self {
        self.edit_mode = mode;
        self
    }

    /// Sets the JSON export indentation.
    #[must_use]
    pub fn with_json_indent(mut self, indent: usize) -> Self {
        self.json_indent = indent;
        self
    }

    /// Checks option combinations that would make every load or export fail.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] when a value is out of range.
    pub fn validate(&self) -> Result<()> {
        if self.csv.batch_size == 0 {
            return Err(Error::invalid_config("csv batch_size must be positive"));
        }
        if self.csv.infer_records == 0 {
            return Err(Error::invalid_config("csv infer_records must be positive"));
        }
        if matches!(self.csv.delimiter, Some(b'\n' | b'\r' | b'"')) {
            return Err(Error::invalid_config(
                "csv delimiter cannot be a newline or a quote",
            ));
        }
        if self.json_indent > 16 {
            return Err(Error::invalid_config("json_indent must be at most 16"));
        }
        Ok(())
    }
}
