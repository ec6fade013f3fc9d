//! Editing sessions.
//!
//! A [`Session`] owns everything one user works on: the table as loaded,
//! the working copy, an optional filtered view and the queues of pending
//! edits and filters. Failed operations leave the session as it was.
//!
//! # Example
//!
//! ```
//! use datasheet::{Error, Predicate, Session};
//!
//! let mut session = Session::new().unwrap();
//! session.queue_edit(0, "ville", "Nice");
//! assert!(matches!(session.stamp_signature("Alice"), Err(Error::PrecursorNotApplied)));
//!
//! session.apply_edits().unwrap();
//! session.stamp_signature("Alice").unwrap();
//!
//! session.queue_filter("age > 26".parse::<Predicate>().unwrap());
//! assert_eq!(session.apply_filters().unwrap().row_count(), 2);
//! ```

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::{
    config::EngineConfig,
    edit::{apply_edits, ApplyReport, EditQueue, PendingEdit},
    error::{Error, Result},
    format::{self, FileFormat},
    signature::Signature,
    transform::Predicate,
    value::{ColumnType, Value},
    Table,
};

/// One user's working state.
#[derive(Debug, Clone)]
pub struct Session {
    config: EngineConfig,
    original: Table,
    table: Table,
    view: Option<Table>,
    edits: EditQueue,
    filters: Vec<Predicate>,
    edits_applied: bool,
    last_signature: Option<Signature>,
    source: Option<PathBuf>,
}

impl Session {
    /// Starts a session on the sample table with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the sample table cannot be built.
    pub fn new() -> Result<Self> {
        Self::with_config(EngineConfig::default())
    }

    /// Starts a session on the sample table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `config` does not validate.
    pub fn with_config(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_parts(config, Table::sample()?))
    }

    /// Starts a session on an existing table.
    pub fn from_table(table: Table) -> Self {
        Self::from_parts(EngineConfig::default(), table)
    }

    fn from_parts(config: EngineConfig, table: Table) -> Self {
        Self {
            config,
            original: table.clone(),
            table,
            view: None,
            edits: EditQueue::new(),
            filters: Vec::new(),
            edits_applied: false,
            last_signature: None,
            source: None,
        }
    }

    /// Replaces the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `config` does not validate.
    pub fn set_config(&mut self, config: EngineConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Replaces the session table with parsed bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Format`] if the content cannot be parsed; the
    /// session is unchanged.
    pub fn load(&mut self, data: &[u8], format: FileFormat) -> Result<()> {
        let table = format::load(data, format, &self.config.csv)?;
        self.replace(table, None);
        Ok(())
    }

    /// Replaces the session table with a file's contents.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] or [`Error::Format`]; the session is unchanged.
    pub fn load_path(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let table = Table::from_path_with_options(path, &self.config.csv)?;
        self.replace(table, Some(path.to_path_buf()));
        Ok(())
    }

    /// Replaces the session table with an existing one.
    pub fn load_table(&mut self, table: Table) {
        self.replace(table, None);
    }

    fn replace(&mut self, table: Table, source: Option<PathBuf>) {
        self.original = table.clone();
        self.table = table;
        self.source = source;
        self.clear_state();
    }

    fn clear_state(&mut self) {
        self.view = None;
        self.edits.clear();
        self.filters.clear();
        self.edits_applied = false;
        self.last_signature = None;
    }

    /// Path the table was loaded from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// The table as it was loaded.
    pub fn original(&self) -> &Table {
        &self.original
    }

    /// The working table, with applied edits and structural changes.
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// The filtered view, if a filter has been applied since the last edit.
    pub fn view(&self) -> Option<&Table> {
        self.view.as_ref()
    }

    /// The filtered view if there is one, else the working table.
    pub fn current(&self) -> &Table {
        self.view.as_ref().unwrap_or(&self.table)
    }

    /// Queues a cell edit without validating it.
    pub fn queue_edit(&mut self, row: usize, column: impl Into<String>, value: impl Into<Value>) {
        self.edits.push(PendingEdit::new(row, column, value));
    }

    /// Edits waiting to be applied.
    pub fn pending_edits(&self) -> &EditQueue {
        &self.edits
    }

    /// Drops queued edits.
    pub fn clear_edits(&mut self) {
        self.edits.clear();
    }

    /// Writes queued edits into the working table and clears the queue.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ColumnNotFound`] or, in strict mode,
    /// [`Error::TypeCoercion`]; the table and queue are unchanged.
    pub fn apply_edits(&mut self) -> Result<ApplyReport> {
        let (table, report) = apply_edits(&self.table, &self.edits, self.config.edit_mode)?;
        self.table = table;
        self.edits.clear();
        if report.applied > 0 {
            self.edits_applied = true;
            self.view = None;
        }
        Ok(report)
    }

    /// Returns true once at least one edit has been written.
    pub fn edits_applied(&self) -> bool {
        self.edits_applied
    }

    /// Queues a filter predicate.
    pub fn queue_filter(&mut self, predicate: Predicate) {
        self.filters.push(predicate);
    }

    /// Predicates waiting to be applied.
    pub fn pending_filters(&self) -> &[Predicate] {
        &self.filters
    }

    /// Drops queued filters.
    pub fn clear_filters(&mut self) {
        self.filters.clear();
    }

    /// Filters the working table with every queued predicate.
    ///
    /// # Errors
    ///
    /// Returns the first predicate's error; the queue is kept.
    pub fn apply_filters(&mut self) -> Result<&Table> {
        let filtered = self.table.filter_advanced(&self.filters)?;
        self.filters.clear();
        Ok(self.view.insert(filtered))
    }

    /// Case-insensitive substring search on the working table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ColumnNotFound`] if the column is absent.
    pub fn filter_simple(&mut self, column: &str, term: &str) -> Result<&Table> {
        let filtered = self.table.filter_simple(column, term)?;
        Ok(self.view.insert(filtered))
    }

    /// Inclusive numeric range on the working table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ColumnNotFound`] or [`Error::TypeCoercion`].
    pub fn filter_range(&mut self, column: &str, min: f64, max: f64) -> Result<&Table> {
        let filtered = self.table.filter_range(column, min, max)?;
        Ok(self.view.insert(filtered))
    }

    /// Discards the filtered view.
    pub fn clear_view(&mut self) {
        self.view = None;
    }

    fn restructure(&mut self, op: impl FnOnce(&Table) -> Result<Table>) -> Result<()> {
        self.table = op(&self.table)?;
        self.view = None;
        Ok(())
    }

    /// Adds a zero-filled column to the working table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateColumn`] if the name is taken.
    pub fn add_column(&mut self, name: &str, ty: ColumnType) -> Result<()> {
        self.restructure(|t| t.add_column(name, ty))
    }

    /// Drops a column from the working table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ColumnNotFound`] if the column is absent.
    pub fn drop_column(&mut self, name: &str) -> Result<()> {
        self.restructure(|t| t.drop_column(name))
    }

    /// Appends a null row to the working table.
    ///
    /// # Errors
    ///
    /// Returns an error if Arrow cannot build the row.
    pub fn add_row(&mut self) -> Result<()> {
        self.restructure(Table::add_row)
    }

    /// Drops a row from the working table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfBounds`] if `index` is not a row.
    pub fn drop_row(&mut self, index: usize) -> Result<()> {
        self.restructure(|t| t.drop_row(index))
    }

    /// Signs the working table now.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingAuthor`] for a blank author, then
    /// [`Error::PrecursorNotApplied`] if no edit has been applied.
    pub fn stamp_signature(&mut self, author: &str) -> Result<&Signature> {
        self.stamp_signature_at(author, Utc::now())
    }

    /// Signs the working table at a fixed time.
    ///
    /// # Errors
    ///
    /// See [`Session::stamp_signature`].
    pub fn stamp_signature_at(
        &mut self,
        author: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<&Signature> {
        let signature = Signature::at(author, timestamp)?;
        if !self.edits_applied {
            return Err(Error::PrecursorNotApplied);
        }
        self.table = self.table.stamp_signature(&signature)?;
        self.view = None;
        Ok(self.last_signature.insert(signature))
    }

    /// The most recent signature, if the table has been signed.
    pub fn signature(&self) -> Option<&Signature> {
        self.last_signature.as_ref()
    }

    /// Restores the table as loaded and clears queues and view.
    pub fn reset(&mut self) {
        self.table = self.original.clone();
        self.clear_state();
        tracing::debug!(rows = self.table.row_count(), "session reset");
    }

    /// Serializes the current table (filtered view if present).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] if the writer fails.
    pub fn export(&self, format: FileFormat) -> Result<Vec<u8>> {
        format::export(self.current(), format, self.config.json_indent)
    }

    /// Writes the current table to a file, choosing the format from its
    /// extension.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Format`] for unknown extensions, otherwise
    /// serialization or I/O errors.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.export(FileFormat::from_path(path)?)?;
        std::fs::write(path, bytes).map_err(|e| Error::io(e, path))
    }
}
