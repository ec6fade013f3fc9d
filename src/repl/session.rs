//! REPL session state.
//!
//! Wraps an engine [`Session`] with command history and display settings.
//! Commands render their output into a `String` that the loop prints.

use std::fmt::Write;
use std::path::Path;

use chrono::{SecondsFormat, Utc};

use super::commands::ReplCommand;
use crate::{
    table::SIGNATURE_COLUMN, ColumnType, EngineConfig, Error, Predicate, Result, Session, Table,
};

/// Display configuration for REPL output
#[derive(Debug, Clone)]
pub struct DisplayConfig {
    /// Maximum rows shown after a command that changes the table
    pub max_rows: usize,
    /// Enable color output
    pub color_output: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            max_rows: 10,
            color_output: true,
        }
    }
}

impl DisplayConfig {
    /// Set maximum rows to display
    #[must_use]
    pub fn with_max_rows(mut self, rows: usize) -> Self {
        self.max_rows = rows;
        self
    }

    /// Enable/disable color output
    #[must_use]
    pub fn with_color(mut self, enabled: bool) -> Self {
        self.color_output = enabled;
        self
    }
}

/// Stateful REPL session
#[derive(Debug)]
pub struct ReplSession {
    session: Session,
    /// Command history
    history: Vec<String>,
    /// Display configuration
    pub config: DisplayConfig,
}

impl ReplSession {
    /// Create a session on the sample table
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is invalid.
    pub fn new(config: EngineConfig) -> Result<Self> {
        Ok(Self::with_session(Session::with_config(config)?))
    }

    /// Wrap an existing engine session
    #[must_use]
    pub fn with_session(session: Session) -> Self {
        Self {
            session,
            history: Vec::new(),
            config: DisplayConfig::default(),
        }
    }

    /// The engine session
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Short name of the table's source
    #[must_use]
    pub fn source_name(&self) -> String {
        self.session
            .source()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .unwrap_or("sample")
            .to_string()
    }

    /// Add a command to history
    pub fn add_history(&mut self, command: &str) {
        self.history.push(command.to_string());
    }

    /// Get command history
    #[must_use]
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Export history as a script that can be piped back into the REPL
    #[must_use]
    pub fn export_history(&self) -> String {
        let mut script = String::new();
        script.push_str("# datasheet session export\n");
        let _ = writeln!(
            script,
            "# Generated: {}",
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
        );
        script.push_str("# Replay with: datasheet repl < session.txt\n\n");

        for cmd in self.history.iter().filter(|c| !c.starts_with("history")) {
            let _ = writeln!(script, "{}", cmd);
        }

        script
    }

    /// Column names of the working table, for autocomplete
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        self.session.table().column_names()
    }

    /// Execute a REPL command and return its output
    ///
    /// # Errors
    ///
    /// Returns an error if the command execution fails; the session is
    /// left as it was.
    pub fn execute(&mut self, cmd: ReplCommand) -> Result<String> {
        match cmd {
            ReplCommand::Load { path } => self.cmd_load(&path),
            ReplCommand::Sample => self.cmd_sample(),
            ReplCommand::Info => Ok(self.cmd_info()),
            ReplCommand::Columns => self.cmd_columns(),
            ReplCommand::Column { name } => self.cmd_column(&name),
            ReplCommand::Head { n } => self.render(self.session.current(), n),
            ReplCommand::Search { column, term } => {
                self.session.filter_simple(&column, &term)?;
                self.render_view()
            }
            ReplCommand::Range { column, min, max } => {
                self.session.filter_range(&column, min, max)?;
                self.render_view()
            }
            ReplCommand::Find { column, args } => self.cmd_find(&column, &args),
            ReplCommand::Where { predicate } => Ok(self.cmd_where(predicate)),
            ReplCommand::Filters => Ok(self.cmd_filters()),
            ReplCommand::FilterApply => {
                self.session.apply_filters()?;
                self.render_view()
            }
            ReplCommand::FilterClear => {
                self.session.clear_filters();
                self.session.clear_view();
                Ok("Filters cleared".to_string())
            }
            ReplCommand::Set { row, column, value } => {
                self.session.queue_edit(row, column, value);
                Ok(format!(
                    "Queued ({} pending, 'apply' to write)",
                    self.session.pending_edits().len()
                ))
            }
            ReplCommand::Edits { clear } => Ok(self.cmd_edits(clear)),
            ReplCommand::Apply => self.cmd_apply(),
            ReplCommand::AddColumn { name, ty } => {
                self.session.add_column(&name, ty)?;
                Ok(format!("Added {} column '{}'", ty, name))
            }
            ReplCommand::AddRow => {
                self.session.add_row()?;
                Ok(format!("Added row {}", self.session.table().row_count() - 1))
            }
            ReplCommand::DropColumn { name } => self.cmd_drop_column(&name),
            ReplCommand::DropRow { index } => {
                self.session.drop_row(index)?;
                Ok(format!("Dropped row {}", index))
            }
            ReplCommand::Sign { author } => {
                let signature = self.session.stamp_signature(&author)?;
                Ok(format!("Signed: {}", signature))
            }
            ReplCommand::Reset => {
                self.session.reset();
                Ok(format!(
                    "Reset to the loaded table ({} rows)",
                    self.session.table().row_count()
                ))
            }
            ReplCommand::Save { path } => self.cmd_save(&path),
            ReplCommand::History { export } => Ok(self.cmd_history(export)),
            ReplCommand::Help { topic } => Ok(help(topic.as_deref())),
            ReplCommand::Quit => Ok(String::new()), // Handled in main loop
        }
    }

    fn cmd_load(&mut self, path: &str) -> Result<String> {
        self.session.load_path(path)?;
        let table = self.session.table();
        Ok(format!(
            "Loaded '{}' ({} rows, {} columns)",
            self.source_name(),
            table.row_count(),
            table.column_count()
        ))
    }

    fn cmd_sample(&mut self) -> Result<String> {
        self.session.load_table(Table::sample()?);
        Ok("Loaded the sample table".to_string())
    }

    fn cmd_info(&self) -> String {
        let session = &self.session;
        let table = session.table();
        let mut out = String::new();

        let _ = writeln!(out, "Source: {}", self.source_name());
        let _ = writeln!(out, "Rows: {}", table.row_count());
        let _ = writeln!(out, "Columns: {}", table.column_count());
        if let Some(view) = session.view() {
            let _ = writeln!(out, "Filtered view: {} rows", view.row_count());
        }
        let _ = writeln!(out, "Pending edits: {}", session.pending_edits().len());
        let _ = writeln!(out, "Pending filters: {}", session.pending_filters().len());
        let applied = if session.edits_applied() { "yes" } else { "no" };
        let _ = writeln!(out, "Edits applied: {}", applied);
        if let Some(signature) = session.signature() {
            let _ = writeln!(out, "Signature: {}", signature);
        }
        out.trim_end().to_string()
    }

    fn cmd_columns(&self) -> Result<String> {
        let table = self.session.table();
        let mut out = String::new();
        let _ = writeln!(out, "Columns ({}):", table.column_count());
        for name in table.column_names() {
            let _ = writeln!(out, "  {}: {}", name, table.column_type(&name)?);
        }
        Ok(out.trim_end().to_string())
    }

    fn cmd_column(&self, name: &str) -> Result<String> {
        let values = self.session.current().column(name)?;
        let mut out = String::new();
        for (row, value) in values.iter().enumerate() {
            if value.is_null() {
                let _ = writeln!(out, "{:4}  null", row);
            } else {
                let _ = writeln!(out, "{:4}  {}", row, value);
            }
        }
        Ok(out.trim_end().to_string())
    }

    fn cmd_find(&mut self, column: &str, args: &[String]) -> Result<String> {
        let ty = self.session.table().column_type(column)?;
        match (ty, args) {
            (ColumnType::Int | ColumnType::Float, [min, max]) => {
                let bound = |s: &str| {
                    s.parse::<f64>()
                        .map_err(|_| Error::parse(format!("Invalid number: '{}'", s)))
                };
                self.session.filter_range(column, bound(min.as_str())?, bound(max.as_str())?)?;
            }
            (ColumnType::Int | ColumnType::Float, _) => {
                return Err(Error::parse(format!(
                    "'{}' is numeric: find {} <min> <max>",
                    column, column
                )));
            }
            (ColumnType::Text, _) => {
                self.session.filter_simple(column, &args.join(" "))?;
            }
        }
        self.render_view()
    }

    fn cmd_where(&mut self, predicate: Predicate) -> String {
        let text = predicate.to_string();
        self.session.queue_filter(predicate);
        format!(
            "Queued filter '{}' ({} pending, 'filter apply' to run)",
            text,
            self.session.pending_filters().len()
        )
    }

    fn cmd_filters(&self) -> String {
        let filters = self.session.pending_filters();
        if filters.is_empty() {
            return "No pending filters".to_string();
        }
        let mut out = String::new();
        for (i, predicate) in filters.iter().enumerate() {
            let _ = writeln!(out, "{:4}  {}", i + 1, predicate);
        }
        out.trim_end().to_string()
    }

    fn cmd_edits(&mut self, clear: bool) -> String {
        if clear {
            let dropped = self.session.pending_edits().len();
            self.session.clear_edits();
            return format!("Dropped {} pending edits", dropped);
        }
        let edits = self.session.pending_edits();
        if edits.is_empty() {
            return "No pending edits".to_string();
        }
        let mut out = String::new();
        for (i, edit) in edits.iter().enumerate() {
            let _ = writeln!(out, "{:4}  {}", i + 1, edit);
        }
        out.trim_end().to_string()
    }

    fn cmd_apply(&mut self) -> Result<String> {
        let report = self.session.apply_edits()?;
        let mut out = format!("Applied {} edits", report.applied);
        if report.skipped > 0 {
            let _ = write!(out, " ({} skipped: row out of range)", report.skipped);
        }
        Ok(out)
    }

    fn cmd_drop_column(&mut self, name: &str) -> Result<String> {
        if name == SIGNATURE_COLUMN {
            return Err(Error::parse(format!(
                "The {} column cannot be dropped here",
                SIGNATURE_COLUMN
            )));
        }
        self.session.drop_column(name)?;
        Ok(format!("Dropped column '{}'", name))
    }

    fn cmd_save(&self, path: &str) -> Result<String> {
        self.session.save(path)?;
        let what = if self.session.view().is_some() {
            "filtered view"
        } else {
            "table"
        };
        Ok(format!(
            "Saved {} ({} rows) to {}",
            what,
            self.session.current().row_count(),
            Path::new(path).display()
        ))
    }

    fn cmd_history(&self, export: bool) -> String {
        if export {
            return self.export_history();
        }
        let mut out = String::new();
        for (i, cmd) in self.history.iter().enumerate() {
            let _ = writeln!(out, "{:4}  {}", i + 1, cmd);
        }
        out.trim_end().to_string()
    }

    fn render_view(&self) -> Result<String> {
        self.render(self.session.current(), self.config.max_rows)
    }

    fn render(&self, table: &Table, n: usize) -> Result<String> {
        let mut out = table.pretty(n)?;
        if table.row_count() > n {
            let _ = write!(out, "\n... showing {} of {} rows", n, table.row_count());
        } else {
            let _ = write!(out, "\n{} rows", table.row_count());
        }
        Ok(out)
    }
}

fn help(topic: Option<&str>) -> String {
    let text = match topic {
        None => {
            "datasheet REPL Commands:

Loading:
  load <file>               Load a table (csv, json, jsonl, parquet)
  sample                    Load the built-in sample table

Inspection:
  info                      Show session state
  columns                   List columns and types
  column <name>             Show every value of a column
  head [n]                  Show first n rows (default: 10)

Filtering (help filter):
  search <col> <term>       Case-insensitive substring search
  range <col> <min> <max>   Inclusive numeric range
  find <col> <args>         Search or range, by column type
  where <col> <op> <value>  Queue a filter
  filters                   List queued filters
  filter apply | clear      Apply queued filters, or drop the view

Editing (help edit):
  set <row> <col> <value>   Queue a cell edit
  edits [clear]             List or drop queued edits
  apply                     Write queued edits
  add column <name> <type>  Add a column (text, int, float)
  add row                   Add a row of nulls
  drop column <name>        Drop a column
  drop row <index>          Drop a row
  sign <author>             Sign the table (after apply)
  reset                     Restore the table as loaded

Session:
  save <file>               Save the current table or view
  history [--export]        Show command history
  help [topic]              Show help (topics: filter, edit)
  quit, exit                Exit REPL"
        }
        Some("filter") => {
            "Filtering:

  search and range filter the working table directly and show the result.
  where queues a predicate; 'filter apply' runs every queued predicate in
  order, each narrowing the previous result.

Operators for where:
  =, ==          equal after conversion to the column type
  contains, ~    substring of the text value (case-sensitive)
  >, <           strict numeric comparison
  between a b    inclusive numeric range (also a..b)

Examples:
  where age > 28
  where ville contains Ly
  where age between 25..35"
        }
        Some("edit") => {
            "Editing:

  set queues an edit; nothing changes until 'apply'. Edits whose row no
  longer exists are skipped. A value that does not fit an int or float
  column turns the column into text (unless started with --strict).

  sign writes 'Modifié par <author> le <timestamp>' into row 0 of the
  Signature column, which always stays last. At least one edit must be
  applied first.

  'set <row> <col> null' clears a cell."
        }
        Some(t) => return format!("Unknown help topic: '{}'. Try: filter, edit", t),
    };
    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repl::commands::CommandParser;

    fn session() -> ReplSession {
        ReplSession::new(EngineConfig::default()).unwrap()
    }

    fn run(session: &mut ReplSession, line: &str) -> Result<String> {
        session.add_history(line);
        session.execute(CommandParser::parse(line)?)
    }

    #[test]
    fn test_display_config() {
        let config = DisplayConfig::default().with_max_rows(5).with_color(false);
        assert_eq!(config.max_rows, 5);
        assert!(!config.color_output);
    }

    #[test]
    fn test_new_session_is_sample() {
        let session = session();
        assert_eq!(session.source_name(), "sample");
        assert_eq!(session.column_names(), vec!["nom", "age", "ville"]);
    }

    #[test]
    fn test_columns_lists_types() {
        let out = run(&mut session(), "columns").unwrap();
        assert!(out.contains("age: int"));
        assert!(out.contains("ville: text"));
    }

    #[test]
    fn test_search_and_range_render_view() {
        let mut session = session();
        let out = run(&mut session, "search ville PAR").unwrap();
        assert!(out.contains("Alice"));
        assert!(!out.contains("Bob"));

        let out = run(&mut session, "range age 28 40").unwrap();
        assert!(out.contains("Bob"));
        assert!(out.contains("Charlie"));
        assert!(out.ends_with("2 rows"));
    }

    #[test]
    fn test_find_picks_filter_by_type() {
        let mut session = session();
        let out = run(&mut session, "find age 30 40").unwrap();
        assert!(out.ends_with("2 rows"));

        let out = run(&mut session, "find nom li").unwrap();
        assert!(out.contains("Alice"));
        assert!(out.contains("Charlie"));

        assert!(run(&mut session, "find age 30").is_err());
    }

    #[test]
    fn test_where_then_apply() {
        let mut session = session();
        run(&mut session, "where age > 26").unwrap();
        run(&mut session, "where ville contains M").unwrap();
        assert!(run(&mut session, "filters").unwrap().contains("age > 26"));

        let out = run(&mut session, "filter apply").unwrap();
        assert!(out.contains("Charlie"));
        assert!(out.ends_with("1 rows"));
        assert_eq!(run(&mut session, "filters").unwrap(), "No pending filters");
    }

    #[test]
    fn test_edit_apply_sign_flow() {
        let mut session = session();
        assert!(matches!(
            run(&mut session, "sign Alice"),
            Err(Error::PrecursorNotApplied)
        ));

        run(&mut session, "set 1 ville Nice").unwrap();
        run(&mut session, "set 9 ville Nowhere").unwrap();
        assert!(run(&mut session, "edits").unwrap().contains("row 1, ville = Nice"));

        let out = run(&mut session, "apply").unwrap();
        assert_eq!(out, "Applied 1 edits (1 skipped: row out of range)");

        let out = run(&mut session, "sign Alice").unwrap();
        assert!(out.starts_with("Signed: Modifié par Alice le "));
        assert_eq!(
            session.column_names().last().map(String::as_str),
            Some(SIGNATURE_COLUMN)
        );
    }

    #[test]
    fn test_drop_signature_is_refused() {
        let mut session = session();
        run(&mut session, "set 0 age 1").unwrap();
        run(&mut session, "apply").unwrap();
        run(&mut session, "sign Bob").unwrap();
        assert!(run(&mut session, "drop column Signature").is_err());
        assert!(session.session().table().has_signature());
    }

    #[test]
    fn test_structural_commands() {
        let mut session = session();
        assert_eq!(
            run(&mut session, "add column score float").unwrap(),
            "Added float column 'score'"
        );
        assert_eq!(run(&mut session, "add row").unwrap(), "Added row 3");
        run(&mut session, "drop row 0").unwrap();
        run(&mut session, "drop column score").unwrap();
        assert_eq!(session.session().table().row_count(), 3);
        assert!(run(&mut session, "drop row 10").is_err());
    }

    #[test]
    fn test_errors_leave_state() {
        let mut session = session();
        assert!(run(&mut session, "load /no/such/file.csv").is_err());
        assert!(run(&mut session, "range ville 1 2").is_err());
        assert_eq!(session.session().table().row_count(), 3);
        assert!(session.session().view().is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let path = path.to_str().unwrap();

        let mut session = session();
        run(&mut session, "search nom bob").unwrap();
        let out = run(&mut session, &format!("save {}", path)).unwrap();
        assert!(out.starts_with("Saved filtered view (1 rows)"));

        let out = run(&mut session, &format!("load {}", path)).unwrap();
        assert_eq!(out, "Loaded 'out.csv' (1 rows, 3 columns)");
    }

    #[test]
    fn test_numeric_looking_text_survives_edit_and_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("codes.json");

        let mut session = session();
        run(&mut session, "add column code text").unwrap();
        run(&mut session, "set 0 code \"007\"").unwrap();
        run(&mut session, "set 1 code 1.50").unwrap();
        run(&mut session, "set 2 code 1e3").unwrap();
        run(&mut session, "apply").unwrap();
        run(&mut session, &format!("save {}", path.display())).unwrap();

        let json = std::fs::read_to_string(&path).unwrap();
        for code in ["\"007\"", "\"1.50\"", "\"1e3\""] {
            assert!(json.contains(code), "{code} missing from {json}");
        }

        run(&mut session, "where code = 007").unwrap();
        let out = run(&mut session, "filter apply").unwrap();
        assert!(out.contains("Alice"));
        assert!(out.ends_with("1 rows"));
    }

    #[test]
    fn test_reset_and_info() {
        let mut session = session();
        run(&mut session, "set 0 nom Zoe").unwrap();
        run(&mut session, "apply").unwrap();
        assert!(run(&mut session, "info").unwrap().contains("Edits applied: yes"));

        run(&mut session, "reset").unwrap();
        let info = run(&mut session, "info").unwrap();
        assert!(info.contains("Edits applied: no"));
        assert!(info.contains("Rows: 3"));
    }

    #[test]
    fn test_history_export_skips_history_commands() {
        let mut session = session();
        run(&mut session, "head 1").unwrap();
        run(&mut session, "history").unwrap();
        let script = session.export_history();
        assert!(script.contains("head 1"));
        assert!(!script.contains("\nhistory"));
    }

    #[test]
    fn test_help_topics() {
        assert!(help(None).contains("where <col> <op> <value>"));
        assert!(help(Some("edit")).contains("Modifié par"));
        assert!(help(Some("nope")).starts_with("Unknown help topic"));
    }
}
