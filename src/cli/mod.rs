//! datasheet CLI - Filter and Edit Tables
//!
//! Command-line interface over the library: one-shot conversion, inspection,
//! filtering and editing, plus the interactive REPL.

use std::{path::PathBuf, process::ExitCode};

use clap::{Args, Parser, Subcommand};

mod basic;
mod edit;

use crate::{CsvOptions, EditMode, EngineConfig};

/// datasheet - Load, filter, edit and sign tables (CSV, JSON, Parquet)
#[derive(Parser)]
#[command(name = "datasheet")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    options: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every subcommand
#[derive(Args, Debug, Clone)]
struct GlobalOptions {
    /// CSV field delimiter: a single character, or "tab"
    #[arg(long, global = true, value_parser = parse_delimiter)]
    delimiter: Option<u8>,

    /// Treat the first CSV line as data
    #[arg(long, global = true)]
    no_header: bool,

    /// Reject edits whose value does not fit the column type
    #[arg(long, global = true)]
    strict: bool,

    /// Indentation of JSON output (0 for compact)
    #[arg(long, global = true, default_value = "2")]
    json_indent: usize,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl GlobalOptions {
    fn config(&self) -> crate::Result<EngineConfig> {
        let mut csv = CsvOptions::new().with_header(!self.no_header);
        if let Some(delimiter) = self.delimiter {
            csv = csv.with_delimiter(delimiter);
        }
        let mode = if self.strict {
            EditMode::Strict
        } else {
            EditMode::Lenient
        };
        let config = EngineConfig::new()
            .with_csv(csv)
            .with_edit_mode(mode)
            .with_json_indent(self.json_indent);
        config.validate()?;
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Convert between table formats
    Convert {
        /// Input file path
        input: PathBuf,
        /// Output file path
        output: PathBuf,
    },
    /// Display table information
    Info {
        /// Path to table file
        path: PathBuf,
    },
    /// Display first N rows of a table
    Head {
        /// Path to table file
        path: PathBuf,
        /// Number of rows to display
        #[arg(short = 'n', long, default_value = "10")]
        rows: usize,
    },
    /// List columns and their types
    Columns {
        /// Path to table file
        path: PathBuf,
    },
    /// Filter rows and print or save the result
    Filter {
        /// Input file path
        input: PathBuf,
        /// Output file path (prints the table when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Case-insensitive substring search
        #[arg(long, num_args = 2, value_names = ["COLUMN", "TERM"])]
        search: Option<Vec<String>>,
        /// Inclusive numeric range
        #[arg(long, num_args = 3, value_names = ["COLUMN", "MIN", "MAX"])]
        range: Option<Vec<String>>,
        /// Predicate such as "age > 30" (repeatable, applied in order)
        #[arg(long = "where", value_name = "PREDICATE")]
        predicates: Vec<String>,
    },
    /// Apply edits and structural changes, then save
    Edit {
        /// Input file path
        input: PathBuf,
        /// Output file path (defaults to overwriting the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Cell edit as ROW:COLUMN=VALUE (repeatable)
        #[arg(long = "set", value_name = "ROW:COLUMN=VALUE")]
        sets: Vec<String>,
        /// Add a column as NAME:TYPE (repeatable)
        #[arg(long = "add-column", value_name = "NAME:TYPE")]
        add_columns: Vec<String>,
        /// Drop a column (repeatable)
        #[arg(long = "drop-column", value_name = "NAME")]
        drop_columns: Vec<String>,
        /// Append N empty rows
        #[arg(long, default_value = "0")]
        add_rows: usize,
        /// Drop a row by index (repeatable, applied highest first)
        #[arg(long = "drop-row", value_name = "INDEX")]
        drop_rows: Vec<usize>,
        /// Sign the result after the edits are applied
        #[arg(long, value_name = "AUTHOR")]
        sign: Option<String>,
    },
    /// Interactive REPL
    #[cfg(feature = "repl")]
    Repl {
        /// Table to load at startup
        file: Option<PathBuf>,
    },
}

fn parse_delimiter(s: &str) -> Result<u8, String> {
    match s {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        _ => match s.as_bytes() {
            [b] if b.is_ascii() => Ok(*b),
            _ => Err(format!(
                "delimiter must be a single ASCII character or 'tab', got '{}'",
                s
            )),
        },
    }
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::EnvFilter;

    let filter = match verbose {
        0 => EnvFilter::try_from_env("DATASHEET_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Run the datasheet CLI.
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.options.verbose);

    let result = cli.options.config().and_then(|config| match cli.command {
        Commands::Convert { input, output } => basic::cmd_convert(&config, &input, &output),
        Commands::Info { path } => basic::cmd_info(&config, &path),
        Commands::Head { path, rows } => basic::cmd_head(&config, &path, rows),
        Commands::Columns { path } => basic::cmd_columns(&config, &path),
        Commands::Filter {
            input,
            output,
            search,
            range,
            predicates,
        } => edit::cmd_filter(
            &config,
            &input,
            output.as_deref(),
            search.as_deref(),
            range.as_deref(),
            &predicates,
        ),
        Commands::Edit {
            input,
            output,
            sets,
            add_columns,
            drop_columns,
            add_rows,
            drop_rows,
            sign,
        } => edit::cmd_edit(
            config,
            &input,
            output.as_deref(),
            &edit::EditArgs {
                sets,
                add_columns,
                drop_columns,
                add_rows,
                drop_rows,
                sign,
            },
        ),
        #[cfg(feature = "repl")]
        Commands::Repl { file } => crate::repl::run(config, file),
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
