//! Interactive REPL for datasheet
//!
//! A line-oriented shell over one [`Session`](crate::Session): load a table,
//! search and filter it, queue edits and apply them, sign and save.
//!
//! - Commands are parsed by [`CommandParser`] into [`ReplCommand`]s
//! - Column names, subcommands and types autocomplete from the live table
//! - The prompt shows row count, filtered view size and pending work
//! - `history --export` prints a script that replays the session
//!
//! When stdin is not a terminal the REPL reads one command per line without
//! line editing, so scripts can be piped in.

mod commands;
mod completer;
mod prompt;
mod session;

use std::io::IsTerminal;
use std::path::PathBuf;

pub use commands::{CommandParser, ReplCommand};
pub use completer::{ColumnList, SchemaAwareCompleter};
pub use prompt::{SessionPrompt, SheetStatus, StatusPrompt};
pub use session::{DisplayConfig, ReplSession};

use reedline::{Reedline, Signal};

use crate::{EngineConfig, Result};

/// Run the REPL, optionally starting from a file
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the initial file
/// cannot be loaded or the line editor cannot be created.
pub fn run(config: EngineConfig, file: Option<PathBuf>) -> Result<()> {
    let mut session = ReplSession::new(config)?;
    if let Some(path) = file {
        session.execute(ReplCommand::Load {
            path: path.display().to_string(),
        })?;
    }

    // Check if stdin is a terminal - use simple mode for piped input (testing)
    if std::io::stdin().is_terminal() {
        run_interactive(session)
    } else {
        session.config = session.config.clone().with_color(false);
        run_non_interactive(session);
        Ok(())
    }
}

fn print_banner() {
    println!(
        "datasheet {} - Table Filter and Editor",
        env!("CARGO_PKG_VERSION")
    );
    println!("Type 'help' for commands, 'quit' to exit\n");
}

/// Parse and execute one input line. Returns false when the user quits.
fn handle_line(session: &mut ReplSession, line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return true;
    }

    session.add_history(trimmed);

    match CommandParser::parse(trimmed) {
        Ok(ReplCommand::Quit) => {
            println!("Goodbye!");
            return false;
        }
        Ok(cmd) => match session.execute(cmd) {
            Ok(output) if output.is_empty() => {}
            Ok(output) => println!("{output}"),
            Err(e) => eprintln!("Error: {e}"),
        },
        Err(e) => eprintln!("{e}"),
    }
    true
}

/// Run REPL in interactive mode with reedline (full features)
fn run_interactive(mut session: ReplSession) -> Result<()> {
    // Clones share the column list, so the editor's copy sees updates
    let completer = SchemaAwareCompleter::with_columns(session.column_names());
    let mut line_editor = create_editor(completer.clone())?;

    print_banner();

    loop {
        let sig = {
            let prompt = SessionPrompt::new(&session);
            line_editor.read_line(&prompt)
        };
        match sig {
            Ok(Signal::Success(line)) => {
                if !handle_line(&mut session, &line) {
                    break;
                }
                completer.update_columns(session.column_names());
            }
            Ok(Signal::CtrlC) => {
                println!("^C");
            }
            Ok(Signal::CtrlD) => {
                println!("\nGoodbye!");
                break;
            }
            Err(e) => {
                eprintln!("Input error: {e}");
                break;
            }
        }
    }

    Ok(())
}

/// Run REPL in non-interactive mode (for testing and piped input)
fn run_non_interactive(mut session: ReplSession) {
    use std::io::BufRead;

    print_banner();

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else {
            break;
        };
        if !handle_line(&mut session, &line) {
            return;
        }
    }

    println!("Goodbye!");
}

fn create_editor(completer: SchemaAwareCompleter) -> Result<Reedline> {
    use reedline::FileBackedHistory;

    let history_path = dirs_home().join(".datasheet_history");
    let history = FileBackedHistory::with_file(1000, history_path)
        .map_err(|e| crate::Error::io_no_path(std::io::Error::other(e.to_string())))?;

    let editor = Reedline::create()
        .with_history(Box::new(history))
        .with_completer(Box::new(completer));

    Ok(editor)
}

fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}
