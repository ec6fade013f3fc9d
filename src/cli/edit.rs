//! Filter and edit commands.

use std::path::Path;

use super::basic::{load_table, save_table};
use crate::{ColumnType, EngineConfig, Error, Predicate, Session, Value};

/// Edit operations collected from the command line.
#[derive(Debug, Default)]
pub(crate) struct EditArgs {
    pub sets: Vec<String>,
    pub add_columns: Vec<String>,
    pub drop_columns: Vec<String>,
    pub add_rows: usize,
    pub drop_rows: Vec<usize>,
    pub sign: Option<String>,
}

/// Filter a table with a search, a range and predicates, in that order.
pub(crate) fn cmd_filter(
    config: &EngineConfig,
    input: &Path,
    output: Option<&Path>,
    search: Option<&[String]>,
    range: Option<&[String]>,
    predicates: &[String],
) -> crate::Result<()> {
    let table = load_table(config, input)?;
    let mut filtered = table.clone();

    if let Some([column, term]) = search {
        filtered = filtered.filter_simple(column, term)?;
    }
    if let Some([column, min, max]) = range {
        filtered = filtered.filter_range(column, parse_bound(min)?, parse_bound(max)?)?;
    }
    if !predicates.is_empty() {
        let predicates = predicates
            .iter()
            .map(|p| p.parse::<Predicate>())
            .collect::<crate::Result<Vec<_>>>()?;
        filtered = filtered.filter_advanced(&predicates)?;
    }

    match output {
        Some(path) => {
            save_table(config, &filtered, path)?;
            println!(
                "Wrote {} of {} rows to {}",
                filtered.row_count(),
                table.row_count(),
                path.display()
            );
        }
        None => {
            println!("{}", filtered.pretty(filtered.row_count())?);
            println!("{} of {} rows", filtered.row_count(), table.row_count());
        }
    }

    Ok(())
}

/// Apply structural changes and cell edits, optionally sign, then save.
///
/// Columns and rows are added first so edits can target them; drops run
/// after the edits, rows from the highest index down.
pub(crate) fn cmd_edit(
    config: EngineConfig,
    input: &Path,
    output: Option<&Path>,
    args: &EditArgs,
) -> crate::Result<()> {
    let mut session = Session::with_config(config)?;
    session.load_path(input)?;

    for spec in &args.add_columns {
        let (name, ty) = parse_column_spec(spec)?;
        session.add_column(name, ty)?;
    }
    for _ in 0..args.add_rows {
        session.add_row()?;
    }

    for spec in &args.sets {
        let (row, column, value) = parse_set(spec)?;
        session.queue_edit(row, column, value);
    }
    if !session.pending_edits().is_empty() {
        let report = session.apply_edits()?;
        if report.skipped > 0 {
            println!(
                "Applied {} edits ({} skipped: row out of range)",
                report.applied, report.skipped
            );
        } else {
            println!("Applied {} edits", report.applied);
        }
    }

    for name in &args.drop_columns {
        session.drop_column(name)?;
    }
    let mut drop_rows = args.drop_rows.clone();
    drop_rows.sort_unstable_by(|a, b| b.cmp(a));
    drop_rows.dedup();
    for index in drop_rows {
        session.drop_row(index)?;
    }

    if let Some(author) = &args.sign {
        println!("Signed: {}", session.stamp_signature(author)?);
    }

    let path = output.unwrap_or(input);
    session.save(path)?;
    println!(
        "Wrote {} rows, {} columns to {}",
        session.table().row_count(),
        session.table().column_count(),
        path.display()
    );

    Ok(())
}

fn parse_bound(s: &str) -> crate::Result<f64> {
    s.trim()
        .parse()
        .map_err(|_| Error::parse(format!("Invalid number: '{}'", s)))
}

/// Parses `ROW:COLUMN=VALUE`. The value `null` clears the cell.
fn parse_set(spec: &str) -> crate::Result<(usize, &str, Value)> {
    let invalid = || Error::parse(format!("Invalid edit '{}': expected ROW:COLUMN=VALUE", spec));

    let (row, rest) = spec.split_once(':').ok_or_else(invalid)?;
    let (column, value) = rest.split_once('=').ok_or_else(invalid)?;
    let row = row.trim().parse().map_err(|_| invalid())?;
    if column.is_empty() {
        return Err(invalid());
    }

    let value = if value == "null" {
        Value::Null
    } else {
        Value::from(value)
    };
    Ok((row, column, value))
}

/// Parses `NAME:TYPE`.
fn parse_column_spec(spec: &str) -> crate::Result<(&str, ColumnType)> {
    let (name, ty) = spec
        .rsplit_once(':')
        .ok_or_else(|| Error::parse(format!("Invalid column '{}': expected NAME:TYPE", spec)))?;
    Ok((name, ty.parse()?))
}
