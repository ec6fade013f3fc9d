//! Basic CLI commands for conversion and inspection.

use std::path::Path;

use crate::{EngineConfig, FileFormat, Table};

/// Load a table from a file path based on extension.
pub(crate) fn load_table(config: &EngineConfig, path: &Path) -> crate::Result<Table> {
    Table::from_path_with_options(path, &config.csv)
}

/// Save a table to a file path based on extension.
pub(crate) fn save_table(config: &EngineConfig, table: &Table, path: &Path) -> crate::Result<()> {
    let format = FileFormat::from_path(path)?;
    let bytes = crate::format::export(table, format, config.json_indent)?;
    std::fs::write(path, bytes).map_err(|e| crate::Error::io(e, path))
}

/// Convert between table formats.
pub(crate) fn cmd_convert(config: &EngineConfig, input: &Path, output: &Path) -> crate::Result<()> {
    let table = load_table(config, input)?;
    save_table(config, &table, output)?;

    println!(
        "Converted {} -> {} ({} rows)",
        input.display(),
        output.display(),
        table.row_count()
    );

    Ok(())
}

/// Display table information.
pub(crate) fn cmd_info(config: &EngineConfig, path: &Path) -> crate::Result<()> {
    let table = load_table(config, path)?;

    let file_size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);

    println!("File: {}", path.display());
    println!("Format: {}", FileFormat::from_path(path)?.name());
    println!("Rows: {}", table.row_count());
    println!("Columns: {}", table.column_count());
    println!("Signed: {}", if table.has_signature() { "yes" } else { "no" });
    println!("Size: {} bytes", file_size);

    Ok(())
}

/// Display first N rows of a table.
pub(crate) fn cmd_head(config: &EngineConfig, path: &Path, rows: usize) -> crate::Result<()> {
    let table = load_table(config, path)?;

    if table.is_empty() {
        println!("Table is empty");
        return Ok(());
    }

    println!("{}", table.pretty(rows)?);

    if rows < table.row_count() {
        println!("... showing {} of {} rows", rows, table.row_count());
    }

    Ok(())
}

/// List columns and their types.
pub(crate) fn cmd_columns(config: &EngineConfig, path: &Path) -> crate::Result<()> {
    let table = load_table(config, path)?;

    println!("Columns of {}:", path.display());
    println!();

    for (i, name) in table.column_names().iter().enumerate() {
        println!("  {}: {} ({})", i, name, table.column_type(name)?);
    }

    println!();
    println!("Total columns: {}", table.column_count());

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn write_sample(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        Table::sample()
            .and_then(|t| t.save(&path))
            .unwrap_or_else(|e| panic!("Should write sample: {e}"));
        path
    }

    #[test]
    fn test_cmd_info() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sample(dir.path(), "people.parquet");
        assert!(cmd_info(&EngineConfig::default(), &path).is_ok());
    }

    #[test]
    fn test_cmd_info_missing_file() {
        let result = cmd_info(&EngineConfig::default(), Path::new("/no/such/file.csv"));
        assert!(result.is_err());
    }

    #[test]
    fn test_cmd_head_and_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sample(dir.path(), "people.csv");
        let config = EngineConfig::default();
        assert!(cmd_head(&config, &path, 2).is_ok());
        assert!(cmd_columns(&config, &path).is_ok());
    }

    #[test]
    fn test_cmd_convert_all_formats() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::default();
        let input = write_sample(dir.path(), "people.csv");

        for ext in ["json", "jsonl", "parquet"] {
            let output = dir.path().join(format!("people.{ext}"));
            cmd_convert(&config, &input, &output).unwrap();
            let table = load_table(&config, &output).unwrap();
            assert_eq!(table.row_count(), 3);
            assert_eq!(table.column_names(), vec!["nom", "age", "ville"]);
        }
    }

    #[test]
    fn test_save_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let table = Table::sample().unwrap();
        let result = save_table(&EngineConfig::default(), &table, &dir.path().join("x.xlsx"));
        assert!(matches!(result, Err(crate::Error::Format { .. })));
    }
}
