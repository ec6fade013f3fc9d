//! Error types for datasheet.

use std::path::PathBuf;

/// Result type alias for datasheet operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in datasheet operations.
///
/// Every variant is recoverable: the table a failed operation was called on
/// is never modified, so the caller can report the message and carry on.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// I/O error during file operations.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        /// The path where the error occurred, if known.
        path: Option<PathBuf>,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Arrow error during an in-memory table operation.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Uploaded content could not be parsed, or its format is not supported.
    #[error("Format error: {message}")]
    Format {
        /// Description of the format error.
        message: String,
    },

    /// Column not found in the table.
    #[error("Column '{name}' not found in table")]
    ColumnNotFound {
        /// The name of the missing column.
        name: String,
    },

    /// A column with this name already exists.
    #[error("Column '{name}' already exists")]
    DuplicateColumn {
        /// The name of the existing column.
        name: String,
    },

    /// Row index outside `[0, len)`.
    #[error("Index {index} out of bounds for table with {len} rows")]
    IndexOutOfBounds {
        /// The requested index.
        index: usize,
        /// The number of rows in the table.
        len: usize,
    },

    /// A value could not be converted to the type a column or operator needs.
    #[error("Cannot coerce {subject}: {message}")]
    TypeCoercion {
        /// What was being coerced (a predicate, an edit, a column).
        subject: String,
        /// Why the coercion failed.
        message: String,
    },

    /// Signing was requested without an author name.
    #[error("An author name is required to sign the table")]
    MissingAuthor,

    /// Signing was requested before any edit was applied.
    #[error("Edits must be applied before the table can be signed")]
    PrecursorNotApplied,

    /// The table could not be serialized to the requested format.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Description of the serialization error.
        message: String,
    },

    /// Columns of unequal length or otherwise inconsistent table shape.
    #[error("Schema mismatch: {message}")]
    SchemaMismatch {
        /// Description of the schema mismatch.
        message: String,
    },

    /// Command or expression parse error.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parse error.
        message: String,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the configuration error.
        message: String,
    },
}

impl Error {
    /// Create an I/O error with a path context.
    pub fn io(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        Self::Io {
            path: Some(path.into()),
            source,
        }
    }

    /// Create an I/O error without path context.
    pub fn io_no_path(source: std::io::Error) -> Self {
        Self::Io { path: None, source }
    }

    /// Create a format error.
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format {
            message: message.into(),
        }
    }

    /// Create a column not found error.
    pub fn column_not_found(name: impl Into<String>) -> Self {
        Self::ColumnNotFound { name: name.into() }
    }

    /// Create a duplicate column error.
    pub fn duplicate_column(name: impl Into<String>) -> Self {
        Self::DuplicateColumn { name: name.into() }
    }

    /// Create a type coercion error.
    pub fn type_coercion(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TypeCoercion {
            subject: subject.into(),
            message: message.into(),
        }
    }

    /// Create a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create a schema mismatch error.
    pub fn schema_mismatch(message: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            message: message.into(),
        }
    }

    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}
