//! REPL command parser.
//!
//! Parses one input line into a [`ReplCommand`]. Words are split on
//! whitespace; double quotes group words, so `search "code postal" 69`
//! names a column with a space in it.

use crate::{ColumnType, Error, Predicate, Result, Value};

/// REPL commands.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    // ─────────────────────────────────────────────────────────────────────────────
    // Loading
    // ─────────────────────────────────────────────────────────────────────────────
    /// Load a table from a file
    Load {
        /// Path to the file
        path: String,
    },

    /// Replace the table with the built-in sample
    Sample,

    // ─────────────────────────────────────────────────────────────────────────────
    // Inspection
    // ─────────────────────────────────────────────────────────────────────────────
    /// Display session state
    Info,

    /// List columns and their types
    Columns,

    /// Show every value of one column
    Column {
        /// Column name
        name: String,
    },

    /// Show the first n rows of the current table
    Head {
        /// Number of rows to display
        n: usize,
    },

    // ─────────────────────────────────────────────────────────────────────────────
    // Filtering
    // ─────────────────────────────────────────────────────────────────────────────
    /// Case-insensitive substring search
    Search {
        /// Column to search
        column: String,
        /// Substring to look for
        term: String,
    },

    /// Inclusive numeric range
    Range {
        /// Numeric column
        column: String,
        /// Lower bound
        min: f64,
        /// Upper bound
        max: f64,
    },

    /// Search or range, chosen by the column's type
    Find {
        /// Column to filter
        column: String,
        /// A search term, or two bounds for numeric columns
        args: Vec<String>,
    },

    /// Queue a filter predicate
    Where {
        /// The predicate to queue
        predicate: Predicate,
    },

    /// List queued filters
    Filters,

    /// Apply queued filters
    FilterApply,

    /// Drop the filtered view and queued filters
    FilterClear,

    // ─────────────────────────────────────────────────────────────────────────────
    // Editing
    // ─────────────────────────────────────────────────────────────────────────────
    /// Queue a cell edit
    Set {
        /// Row index
        row: usize,
        /// Column name
        column: String,
        /// New value
        value: Value,
    },

    /// List queued edits, or drop them
    Edits {
        /// Drop queued edits instead of listing them
        clear: bool,
    },

    /// Apply queued edits
    Apply,

    /// Add a zero-filled column
    AddColumn {
        /// Column name
        name: String,
        /// Column type
        ty: ColumnType,
    },

    /// Add a row of nulls
    AddRow,

    /// Drop a column
    DropColumn {
        /// Column name
        name: String,
    },

    /// Drop a row
    DropRow {
        /// Row index
        index: usize,
    },

    /// Sign the table
    Sign {
        /// Author name
        author: String,
    },

    /// Restore the table as loaded
    Reset,

    // ─────────────────────────────────────────────────────────────────────────────
    // Session
    // ─────────────────────────────────────────────────────────────────────────────
    /// Save the current table
    Save {
        /// Output path; the extension picks the format
        path: String,
    },

    /// Show command history
    History {
        /// Print as a replayable script
        export: bool,
    },

    /// Show help
    Help {
        /// Help topic (filter, edit)
        topic: Option<String>,
    },

    /// Exit REPL
    Quit,
}

/// Parser for REPL commands
pub struct CommandParser;

impl CommandParser {
    /// Parse a command string into a ReplCommand
    ///
    /// # Errors
    ///
    /// Returns an error if the command is invalid or unknown.
    pub fn parse(input: &str) -> Result<ReplCommand> {
        let input = input.trim();

        if input.is_empty() {
            return Err(Error::parse("Empty command"));
        }

        let parts = tokenize(input)?;
        let cmd = parts[0].to_lowercase();
        let args: Vec<&str> = parts[1..].iter().map(String::as_str).collect();

        match cmd.as_str() {
            // Loading
            "load" => Self::parse_load(&args),
            "sample" => Ok(ReplCommand::Sample),

            // Inspection
            "info" => Ok(ReplCommand::Info),
            "columns" | "schema" => Ok(ReplCommand::Columns),
            "column" => Self::parse_column(&args),
            "head" | "show" => Self::parse_head(&args),

            // Filtering
            "search" => Self::parse_search(&args),
            "range" => Self::parse_range(&args),
            "find" => Self::parse_find(&args),
            "where" => Self::parse_where(input),
            "filters" => Ok(ReplCommand::Filters),
            "filter" => Self::parse_filter(&args),

            // Editing
            "set" => Self::parse_set(&args),
            "edits" => Ok(ReplCommand::Edits {
                clear: args.first().is_some_and(|a| a.eq_ignore_ascii_case("clear")),
            }),
            "apply" => Ok(ReplCommand::Apply),
            "add" => Self::parse_add(&args),
            "drop" => Self::parse_drop(&args),
            "sign" => Self::parse_sign(&args),
            "reset" => Ok(ReplCommand::Reset),

            // Session
            "save" | "export" => Self::parse_save(&args),
            "history" => Ok(Self::parse_history(&args)),
            "help" | "?" => Ok(Self::parse_help(&args)),
            "quit" | "exit" | "q" => Ok(ReplCommand::Quit),

            _ => Err(Error::parse(format!("Unknown command: '{}'", cmd))),
        }
    }

    fn parse_load(args: &[&str]) -> Result<ReplCommand> {
        match args {
            [path] => Ok(ReplCommand::Load {
                path: (*path).to_string(),
            }),
            [] => Err(Error::parse("load requires a file path")),
            _ => Err(Error::parse("load takes a single path (quote paths with spaces)")),
        }
    }

    fn parse_column(args: &[&str]) -> Result<ReplCommand> {
        let name = required_name(args, "column requires a column name")?;
        Ok(ReplCommand::Column { name })
    }

    fn parse_head(args: &[&str]) -> Result<ReplCommand> {
        let n = match args.first() {
            None => 10,
            Some(arg) => parse_index(arg)?,
        };
        Ok(ReplCommand::Head { n })
    }

    fn parse_search(args: &[&str]) -> Result<ReplCommand> {
        match args {
            [column, term @ ..] if !term.is_empty() => Ok(ReplCommand::Search {
                column: (*column).to_string(),
                term: term.join(" "),
            }),
            _ => Err(Error::parse("search requires a column and a term")),
        }
    }

    fn parse_range(args: &[&str]) -> Result<ReplCommand> {
        match args {
            [column, min, max] => Ok(ReplCommand::Range {
                column: (*column).to_string(),
                min: parse_number(min)?,
                max: parse_number(max)?,
            }),
            _ => Err(Error::parse("range requires a column, a minimum and a maximum")),
        }
    }

    fn parse_find(args: &[&str]) -> Result<ReplCommand> {
        match args {
            [column, rest @ ..] if !rest.is_empty() => Ok(ReplCommand::Find {
                column: (*column).to_string(),
                args: rest.iter().map(|s| (*s).to_string()).collect(),
            }),
            _ => Err(Error::parse("find requires a column and a term or two bounds")),
        }
    }

    fn parse_where(input: &str) -> Result<ReplCommand> {
        let rest = input
            .split_once(char::is_whitespace)
            .map(|(_, rest)| rest.trim())
            .unwrap_or("");
        if rest.is_empty() {
            return Err(Error::parse("where requires a predicate, e.g. 'where age > 30'"));
        }
        Ok(ReplCommand::Where {
            predicate: rest.parse()?,
        })
    }

    fn parse_filter(args: &[&str]) -> Result<ReplCommand> {
        match args.first().map(|a| a.to_lowercase()).as_deref() {
            Some("apply") => Ok(ReplCommand::FilterApply),
            Some("clear") => Ok(ReplCommand::FilterClear),
            None | Some("list") => Ok(ReplCommand::Filters),
            Some(other) => Err(Error::parse(format!(
                "Unknown filter subcommand: '{}'. Use: apply, clear, list",
                other
            ))),
        }
    }

    fn parse_set(args: &[&str]) -> Result<ReplCommand> {
        match args {
            [row, column, value @ ..] if !value.is_empty() => {
                let value = value.join(" ");
                let value = if value.eq_ignore_ascii_case("null") {
                    Value::Null
                } else {
                    Value::Text(value)
                };
                Ok(ReplCommand::Set {
                    row: parse_index(row)?,
                    column: (*column).to_string(),
                    value,
                })
            }
            _ => Err(Error::parse("set requires a row, a column and a value")),
        }
    }

    fn parse_add(args: &[&str]) -> Result<ReplCommand> {
        match args {
            [what, name, ty] if what.eq_ignore_ascii_case("column") => Ok(ReplCommand::AddColumn {
                name: (*name).to_string(),
                ty: ty.parse()?,
            }),
            [what] if what.eq_ignore_ascii_case("row") => Ok(ReplCommand::AddRow),
            _ => Err(Error::parse(
                "Use: add column <name> <text|int|float>, or add row",
            )),
        }
    }

    fn parse_drop(args: &[&str]) -> Result<ReplCommand> {
        match args {
            [what, name] if what.eq_ignore_ascii_case("column") => Ok(ReplCommand::DropColumn {
                name: (*name).to_string(),
            }),
            [what, index] if what.eq_ignore_ascii_case("row") => Ok(ReplCommand::DropRow {
                index: parse_index(index)?,
            }),
            _ => Err(Error::parse("Use: drop column <name>, or drop row <index>")),
        }
    }

    fn parse_sign(args: &[&str]) -> Result<ReplCommand> {
        if args.is_empty() {
            return Err(Error::parse("sign requires an author name"));
        }
        Ok(ReplCommand::Sign {
            author: args.join(" "),
        })
    }

    fn parse_save(args: &[&str]) -> Result<ReplCommand> {
        match args {
            [path] => Ok(ReplCommand::Save {
                path: (*path).to_string(),
            }),
            _ => Err(Error::parse("save requires an output path")),
        }
    }

    fn parse_history(args: &[&str]) -> ReplCommand {
        let export = args.iter().any(|f| *f == "--export" || *f == "-e");
        ReplCommand::History { export }
    }

    fn parse_help(args: &[&str]) -> ReplCommand {
        let topic = args.first().map(|s| (*s).to_string());
        ReplCommand::Help { topic }
    }

    /// Get all valid command names for autocomplete
    #[must_use]
    pub fn command_names() -> Vec<&'static str> {
        vec![
            "load", "sample", "info", "columns", "column", "head", "show", "search", "range",
            "find", "where", "filters", "filter", "set", "edits", "apply", "add", "drop", "sign",
            "reset", "save", "history", "help", "quit", "exit",
        ]
    }

    /// Get subcommands for a given command
    #[must_use]
    pub fn subcommands(command: &str) -> Vec<&'static str> {
        match command {
            "filter" => vec!["apply", "clear", "list"],
            "add" => vec!["column", "row"],
            "drop" => vec!["column", "row"],
            "edits" => vec!["clear"],
            _ => vec![],
        }
    }

    /// Commands whose next argument is a column name
    #[must_use]
    pub fn takes_column(command: &str) -> bool {
        matches!(
            command,
            "column" | "search" | "range" | "find" | "where"
        )
    }
}

/// Splits on whitespace, keeping double-quoted groups together.
fn tokenize(input: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut quoted = false;

    for c in input.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                quoted = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() || quoted {
                    tokens.push(std::mem::take(&mut current));
                }
                quoted = false;
            }
            c => current.push(c),
        }
    }

    if in_quotes {
        return Err(Error::parse("Unterminated quote"));
    }
    if !current.is_empty() || quoted {
        tokens.push(current);
    }
    Ok(tokens)
}

fn required_name(args: &[&str], message: &str) -> Result<String> {
    match args {
        [name] => Ok((*name).to_string()),
        _ => Err(Error::parse(message)),
    }
}

fn parse_index(arg: &str) -> Result<usize> {
    arg.parse()
        .map_err(|_| Error::parse(format!("Invalid number: '{}'", arg)))
}

fn parse_number(arg: &str) -> Result<f64> {
    arg.parse()
        .map_err(|_| Error::parse(format!("Invalid number: '{}'", arg)))
}
