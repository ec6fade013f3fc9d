//! Audit stamps.
//!
//! A signature records who last edited a table and when. It is written into
//! row 0 of the `Signature` column, which always stays last.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::{
    edit::{apply_edits, EditMode, EditQueue},
    error::{Error, Result},
    table::SIGNATURE_COLUMN,
    value::{ColumnType, Value},
    Table,
};

/// An author name and the moment the signature was made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    author: String,
    timestamp: DateTime<Utc>,
}

impl Signature {
    /// Signs now.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingAuthor`] if `author` is blank.
    pub fn new(author: &str) -> Result<Self> {
        Self::at(author, Utc::now())
    }

    /// Signs at a fixed time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingAuthor`] if `author` is blank.
    pub fn at(author: &str, timestamp: DateTime<Utc>) -> Result<Self> {
        let author = author.trim();
        if author.is_empty() {
            return Err(Error::MissingAuthor);
        }
        Ok(Self {
            author: author.to_string(),
            timestamp,
        })
    }

    /// The trimmed author name.
    pub fn author(&self) -> &str {
        &self.author
    }

    /// When the signature was made.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// The stamp written into the table.
    pub fn text(&self) -> String {
        format!(
            "Modifié par {} le {}",
            self.author,
            self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
        )
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

/// Writes `signature` into row 0 of the `Signature` column.
///
/// The column is created (filled with empty text) when absent and converted
/// to text when it holds another type. Other rows are left as they are.
///
/// # Errors
///
/// Returns [`Error::IndexOutOfBounds`] if the table has no rows.
pub fn stamp(table: &Table, signature: &Signature) -> Result<Table> {
    if table.is_empty() {
        return Err(Error::IndexOutOfBounds { index: 0, len: 0 });
    }

    let table = match table.column_type(SIGNATURE_COLUMN) {
        Err(Error::ColumnNotFound { .. }) => table.add_column(SIGNATURE_COLUMN, ColumnType::Text)?,
        Err(e) => return Err(e),
        Ok(ColumnType::Text) => table.clone(),
        Ok(_) => {
            let idx = table.field_index(SIGNATURE_COLUMN)?;
            let values: Vec<Value> = table
                .column(SIGNATURE_COLUMN)?
                .iter()
                .map(|v| v.as_text().map_or(Value::Null, Value::Text))
                .collect();
            let array = crate::table::column::build_array(ColumnType::Text, &values);
            table.replace_columns(vec![(idx, ColumnType::Text, array)])?
        }
    };

    let queue = EditQueue::new().queue(0, SIGNATURE_COLUMN, signature.text());
    let (stamped, _) = apply_edits(&table, &queue, EditMode::Lenient)?;

    tracing::info!(author = signature.author(), "signed table");
    stamped.with_signature_last()
}
