//! File formats.
//!
//! Tables are read from and written to bytes; the file layer only picks the
//! format from the extension.
//!
//! # Example
//!
//! ```
//! use datasheet::{format::FileFormat, Table};
//!
//! let table = Table::load(b"nom,age\nAlice,25\nBob,30\n", FileFormat::Csv).unwrap();
//! let json = table.export(FileFormat::Json).unwrap();
//! let back = Table::load(&json, FileFormat::Json).unwrap();
//!
//! assert_eq!(back.column_names(), table.column_names());
//! ```

use std::{fmt, path::Path, str::FromStr};

use crate::error::{Error, Result};

pub mod read;
pub mod write;

pub use read::load;
pub use write::export;

/// Supported table formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFormat {
    /// Comma-separated values with a header row.
    Csv,
    /// A JSON array of flat objects.
    Json,
    /// One JSON object per line.
    JsonLines,
    /// Apache Parquet.
    Parquet,
}

impl FileFormat {
    /// Every supported format.
    pub const ALL: [Self; 4] = [Self::Csv, Self::Json, Self::JsonLines, Self::Parquet];

    /// Detects a format from a file extension (without the dot).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Format`] for unsupported extensions.
    pub fn from_extension(ext: &str) -> Result<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "jsonl" | "ndjson" => Ok(Self::JsonLines),
            "parquet" | "pq" => Ok(Self::Parquet),
            other => Err(Error::format(format!(
                "Unsupported file extension: '{}' (expected csv, json, jsonl or parquet)",
                other
            ))),
        }
    }

    /// Detects a format from a path's extension.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Format`] if the path has no supported extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| Error::format(format!("No file extension: {}", path.display())))?;
        Self::from_extension(ext)
    }

    /// Canonical file extension.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::JsonLines => "jsonl",
            Self::Parquet => "parquet",
        }
    }

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Csv => "CSV",
            Self::Json => "JSON",
            Self::JsonLines => "JSON Lines",
            Self::Parquet => "Parquet",
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FileFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_extension(s.trim().trim_start_matches('.'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_extension() {
        assert_eq!(FileFormat::from_extension("CSV").unwrap(), FileFormat::Csv);
        assert_eq!(FileFormat::from_extension("ndjson").unwrap(), FileFormat::JsonLines);
        assert_eq!(FileFormat::from_extension("pq").unwrap(), FileFormat::Parquet);
    }

    #[test]
    fn test_unsupported_extension_is_format_error() {
        let err = FileFormat::from_extension("xlsx").unwrap_err();
        assert!(matches!(err, Error::Format { .. }));
        assert!(err.to_string().contains("xlsx"));
    }

    #[test]
    fn test_from_path() {
        assert_eq!(FileFormat::from_path("data/people.json").unwrap(), FileFormat::Json);
        assert!(FileFormat::from_path("README").is_err());
    }

    #[test]
    fn test_extension_roundtrip() {
        for format in FileFormat::ALL {
            assert_eq!(format.extension().parse::<FileFormat>().unwrap(), format);
        }
    }

    #[test]
    fn test_from_str_accepts_leading_dot() {
        assert_eq!(".parquet".parse::<FileFormat>().unwrap(), FileFormat::Parquet);
    }
}
