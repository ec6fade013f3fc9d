//! Pending cell edits.
//!
//! Edits are queued without validation and written in one pass by
//! [`apply_edits`]. Row indices are checked against the table at apply time;
//! edits whose row no longer exists are skipped.
//!
//! # Example
//!
//! ```
//! use datasheet::{apply_edits, EditMode, EditQueue, Table, Value};
//!
//! let table = Table::sample().unwrap();
//! let queue = EditQueue::new()
//!     .queue(0, "age", 26)
//!     .queue(9, "age", 99);
//!
//! let (edited, report) = apply_edits(&table, &queue, EditMode::Lenient).unwrap();
//! assert_eq!(edited.value(0, "age").unwrap(), Value::Int(26));
//! assert_eq!((report.applied, report.skipped), (1, 1));
//! ```

use std::{collections::BTreeMap, fmt};

use serde::Serialize;

pub use crate::config::EditMode;
use crate::{
    error::{Error, Result},
    table::column,
    value::{ColumnType, Value},
    Table,
};

/// A cell write waiting to be applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingEdit {
    /// Zero-based row index.
    pub row: usize,
    /// Target column name.
    pub column: String,
    /// New cell value, coerced to the column type when applied.
    pub value: Value,
}

impl PendingEdit {
    /// Creates a pending edit.
    pub fn new(row: usize, column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            row,
            column: column.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for PendingEdit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value.is_null() {
            write!(f, "row {}, {} = null", self.row, self.column)
        } else {
            write!(f, "row {}, {} = {}", self.row, self.column, self.value)
        }
    }
}

/// Ordered queue of pending edits.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EditQueue {
    edits: Vec<PendingEdit>,
}

impl EditQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an edit, builder style.
    #[must_use]
    pub fn queue(mut self, row: usize, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(PendingEdit::new(row, column, value));
        self
    }

    /// Appends an edit.
    pub fn push(&mut self, edit: PendingEdit) {
        self.edits.push(edit);
    }

    /// Number of queued edits.
    pub fn len(&self) -> usize {
        self.edits.len()
    }

    /// Returns true if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Iterates over edits in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, PendingEdit> {
        self.edits.iter()
    }

    /// Removes every queued edit.
    pub fn clear(&mut self) {
        self.edits.clear();
    }
}

impl<'a> IntoIterator for &'a EditQueue {
    type Item = &'a PendingEdit;
    type IntoIter = std::slice::Iter<'a, PendingEdit>;

    fn into_iter(self) -> Self::IntoIter {
        self.edits.iter()
    }
}

impl FromIterator<PendingEdit> for EditQueue {
    fn from_iter<I: IntoIterator<Item = PendingEdit>>(iter: I) -> Self {
        Self {
            edits: iter.into_iter().collect(),
        }
    }
}

impl Extend<PendingEdit> for EditQueue {
    fn extend<I: IntoIterator<Item = PendingEdit>>(&mut self, iter: I) {
        self.edits.extend(iter);
    }
}

/// Outcome of [`apply_edits`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Edits written into the table.
    pub applied: usize,
    /// Edits dropped because their row was out of range.
    pub skipped: usize,
}

/// Working copy of one edited column.
struct ColumnBuffer {
    ty: ColumnType,
    values: Vec<Value>,
}

impl ColumnBuffer {
    fn into_text(self) -> Self {
        Self {
            ty: ColumnType::Text,
            values: self.values.iter().map(to_text).collect(),
        }
    }
}

fn to_text(value: &Value) -> Value {
    value.as_text().map_or(Value::Null, Value::Text)
}

/// Writes every queued edit, in insertion order, into a copy of `table`.
///
/// Later edits to the same cell overwrite earlier ones. Values are coerced
/// to the column type; what happens when that fails depends on `mode`.
///
/// # Errors
///
/// Returns [`Error::ColumnNotFound`] if any edit names a missing column, and
/// in [`EditMode::Strict`] [`Error::TypeCoercion`] for the first in-range
/// edit whose value does not fit. Both are raised before anything is written.
pub fn apply_edits(
    table: &Table,
    queue: &EditQueue,
    mode: EditMode,
) -> Result<(Table, ApplyReport)> {
    let rows = table.row_count();
    let targets = queue
        .iter()
        .map(|edit| table.field_index(&edit.column))
        .collect::<Result<Vec<_>>>()?;

    if mode == EditMode::Strict {
        for (edit, &idx) in queue.iter().zip(&targets) {
            if edit.row >= rows {
                continue;
            }
            let ty = table.type_at(idx)?;
            if edit.value.coerce_to(ty).is_none() {
                return Err(Error::type_coercion(
                    format!("edit '{}'", edit),
                    format!("'{}' is not a valid {}", edit.value, ty),
                ));
            }
        }
    }

    let mut report = ApplyReport::default();
    let mut buffers: BTreeMap<usize, ColumnBuffer> = BTreeMap::new();

    for (edit, &idx) in queue.iter().zip(&targets) {
        if edit.row >= rows {
            tracing::debug!(
                row = edit.row,
                rows,
                column = %edit.column,
                "skipping edit for out-of-range row"
            );
            report.skipped += 1;
            continue;
        }

        let buffer = match buffers.entry(idx) {
            std::collections::btree_map::Entry::Occupied(entry) => entry.into_mut(),
            std::collections::btree_map::Entry::Vacant(entry) => {
                let ty = table.type_at(idx)?;
                let values = column::column_values(table.batch().column(idx).as_ref(), ty)?;
                entry.insert(ColumnBuffer { ty, values })
            }
        };

        if let Some(value) = edit.value.coerce_to(buffer.ty) {
            buffer.values[edit.row] = value;
        } else {
            tracing::debug!(
                column = %edit.column,
                from = %buffer.ty,
                "converting column to text to hold edit"
            );
            let values = std::mem::take(&mut buffer.values);
            *buffer = ColumnBuffer { ty: buffer.ty, values }.into_text();
            buffer.values[edit.row] = to_text(&edit.value);
        }
        report.applied += 1;
    }

    if buffers.is_empty() {
        return Ok((table.clone(), report));
    }

    let replacements = buffers
        .into_iter()
        .map(|(idx, buffer)| (idx, buffer.ty, column::build_array(buffer.ty, &buffer.values)))
        .collect();
    let edited = table.replace_columns(replacements)?;

    tracing::debug!(applied = report.applied, skipped = report.skipped, "applied edits");
    Ok((edited, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::SIGNATURE_COLUMN;

    fn sample() -> Table {
        Table::sample().unwrap()
    }

    fn lenient(table: &Table, queue: &EditQueue) -> (Table, ApplyReport) {
        apply_edits(table, queue, EditMode::Lenient).unwrap()
    }

    #[test]
    fn test_queue_preserves_order() {
        let queue = EditQueue::new().queue(0, "nom", "A").queue(1, "age", 1);
        let rows: Vec<usize> = queue.iter().map(|e| e.row).collect();
        assert_eq!(rows, vec![0, 1]);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_queue_accepts_anything() {
        let mut queue = EditQueue::new();
        queue.push(PendingEdit::new(100, "missing", Value::Null));
        assert!(!queue.is_empty());
        queue.clear();
        assert!(queue.is_empty());
    }

    #[test]
    fn test_later_edit_wins() {
        let queue = EditQueue::new()
            .queue(1, "ville", "Nice")
            .queue(1, "ville", "Lille");
        let (table, report) = lenient(&sample(), &queue);
        assert_eq!(table.value(1, "ville").unwrap(), Value::from("Lille"));
        assert_eq!(report.applied, 2);
    }

    #[test]
    fn test_out_of_range_edit_is_skipped() {
        let original = sample();
        let queue = EditQueue::new().queue(3, "nom", "Dana");
        let (table, report) = lenient(&original, &queue);
        assert_eq!(table, original);
        assert_eq!(report, ApplyReport { applied: 0, skipped: 1 });
    }

    #[test]
    fn test_missing_column_fails_before_writing() {
        let queue = EditQueue::new()
            .queue(0, "nom", "Zoe")
            .queue(0, "pays", "France");
        let err = apply_edits(&sample(), &queue, EditMode::Lenient).unwrap_err();
        assert!(matches!(err, Error::ColumnNotFound { ref name } if name == "pays"));
    }

    #[test]
    fn test_text_value_coerced_to_int() {
        let queue = EditQueue::new().queue(2, "age", "40");
        let (table, _) = lenient(&sample(), &queue);
        assert_eq!(table.column_type("age").unwrap(), ColumnType::Int);
        assert_eq!(table.value(2, "age").unwrap(), Value::Int(40));
    }

    #[test]
    fn test_lenient_uncoercible_value_converts_column_to_text() {
        let queue = EditQueue::new().queue(0, "age", "vingt-cinq");
        let (table, report) = lenient(&sample(), &queue);
        assert_eq!(report.applied, 1);
        assert_eq!(table.column_type("age").unwrap(), ColumnType::Text);
        assert_eq!(
            table.column("age").unwrap(),
            vec![
                Value::from("vingt-cinq"),
                Value::from("30"),
                Value::from("35")
            ]
        );
    }

    #[test]
    fn test_strict_uncoercible_value_aborts() {
        let queue = EditQueue::new()
            .queue(0, "nom", "Zoe")
            .queue(1, "age", "trente");
        let err = apply_edits(&sample(), &queue, EditMode::Strict).unwrap_err();
        match err {
            Error::TypeCoercion { subject, .. } => assert!(subject.contains("row 1, age")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_strict_ignores_out_of_range_rows() {
        let queue = EditQueue::new().queue(7, "age", "trente");
        let (_, report) = apply_edits(&sample(), &queue, EditMode::Strict).unwrap();
        assert_eq!(report.skipped, 1);
    }

    #[test]
    fn test_null_edit_clears_cell() {
        let queue = EditQueue::new().queue(0, "ville", Value::Null);
        let (table, _) = lenient(&sample(), &queue);
        assert_eq!(table.value(0, "ville").unwrap(), Value::Null);
    }

    #[test]
    fn test_signature_column_stays_last() {
        let table = Table::builder()
            .text("nom", ["Alice"])
            .text(SIGNATURE_COLUMN, [""])
            .build()
            .unwrap();
        let queue = EditQueue::new().queue(0, SIGNATURE_COLUMN, "note");
        let (edited, _) = lenient(&table, &queue);
        assert!(edited.signature_is_last());
        assert_eq!(edited.value(0, SIGNATURE_COLUMN).unwrap(), Value::from("note"));
    }

    #[test]
    fn test_pending_edit_display() {
        assert_eq!(PendingEdit::new(2, "age", 40).to_string(), "row 2, age = 40");
        assert_eq!(PendingEdit::new(0, "nom", Value::Null).to_string(), "row 0, nom = null");
    }
}
