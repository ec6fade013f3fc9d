//! datasheet - Filter and Edit Tables in Pure Rust
//!
//! Load a CSV, JSON or Parquet table, search and filter it, queue and apply
//! cell edits, add or drop rows and columns, sign the result and export it
//! again.
//!
//! # Design Principles
//!
//! 1. **Immutable tables** - every operation returns a new [`Table`]; a
//!    failed operation leaves the previous one usable
//! 2. **Arrow throughout** - a table is one `RecordBatch` with text,
//!    integer and float columns
//! 3. **Explicit sessions** - pending edits, filters and the filtered view
//!    live in a [`Session`] owned by the caller
//!
//! # Quick Start
//!
//! ```
//! use datasheet::{FileFormat, Predicate, Session};
//!
//! let mut session = Session::new().unwrap();
//! session
//!     .load(b"nom,age,ville\nAlice,25,Paris\nBob,30,Lyon\n", FileFormat::Csv)
//!     .unwrap();
//!
//! session.queue_edit(1, "ville", "Lille");
//! session.apply_edits().unwrap();
//! session.stamp_signature("Alice").unwrap();
//!
//! session.queue_filter(Predicate::greater_than("age", 26));
//! let view = session.apply_filters().unwrap();
//! assert_eq!(view.row_count(), 1);
//!
//! let json = session.export(FileFormat::Json).unwrap();
//! assert!(String::from_utf8(json).unwrap().contains("Lille"));
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
// Allow common test patterns
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::too_many_lines
    )
)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]
#![allow(clippy::map_unwrap_or)]

/// CLI module for command-line interface
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod edit;
pub mod error;
pub mod format;
#[cfg(feature = "repl")]
pub mod repl;
pub mod session;
pub mod signature;
pub mod table;
pub mod transform;
pub mod value;

// Re-export arrow types commonly needed
pub use arrow::{
    array::RecordBatch,
    datatypes::{Schema, SchemaRef},
};
pub use config::{CsvOptions, EngineConfig};
pub use edit::{apply_edits, ApplyReport, EditMode, EditQueue, PendingEdit};
pub use error::{Error, Result};
pub use format::FileFormat;
pub use session::Session;
pub use signature::Signature;
pub use table::{Table, TableBuilder, SIGNATURE_COLUMN};
pub use transform::{Chain, Condition, Contains, MaskFilter, Predicate, Range, Transform};
pub use value::{ColumnType, Value};
