//! Schema-aware autocomplete.
//!
//! Completes command names, subcommands, column names of the working table,
//! column types for `add column`, operators for `where` and help topics.

use std::sync::{Arc, Mutex};

use reedline::{Completer, Span, Suggestion};

use super::commands::CommandParser;

const TYPES: &[&str] = &["text", "int", "float"];
const OPERATORS: &[&str] = &["=", "contains", ">", "<", "between"];
const HELP_TOPICS: &[&str] = &["filter", "edit"];

/// Shared list of column names, refreshed by the REPL loop after each command
pub type ColumnList = Arc<Mutex<Vec<String>>>;

/// Schema-aware completer
#[derive(Debug, Clone)]
pub struct SchemaAwareCompleter {
    commands: Vec<&'static str>,
    columns: ColumnList,
}

impl SchemaAwareCompleter {
    /// Create a completer over a shared column list
    #[must_use]
    pub fn new(columns: ColumnList) -> Self {
        Self {
            commands: CommandParser::command_names(),
            columns,
        }
    }

    /// Create a completer with a fixed column list
    #[must_use]
    pub fn with_columns(columns: Vec<String>) -> Self {
        Self::new(Arc::new(Mutex::new(columns)))
    }

    /// Replace the known column names
    pub fn update_columns(&self, columns: Vec<String>) {
        if let Ok(mut current) = self.columns.lock() {
            *current = columns;
        }
    }

    fn columns(&self) -> Vec<String> {
        self.columns
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    /// Get completions for the given input
    #[must_use]
    pub fn complete(&self, input: &str) -> Vec<String> {
        let parts: Vec<&str> = input.split_whitespace().collect();
        let new_word = input.is_empty() || input.ends_with(char::is_whitespace);

        // Position of the word being completed and its typed prefix
        let (position, prefix) = if new_word {
            (parts.len(), "")
        } else {
            (parts.len() - 1, parts[parts.len() - 1])
        };

        if position == 0 {
            let prefix = prefix.to_lowercase();
            return self
                .commands
                .iter()
                .filter(|cmd| cmd.starts_with(&prefix))
                .map(|cmd| (*cmd).to_string())
                .collect();
        }

        let cmd = parts[0].to_lowercase();
        let args = &parts[1..position];
        let candidates = self.context_candidates(&cmd, args);
        candidates
            .into_iter()
            .filter(|c| c.starts_with(prefix))
            .collect()
    }

    /// Candidates for the next word, given the command and completed args
    fn context_candidates(&self, cmd: &str, args: &[&str]) -> Vec<String> {
        match (cmd, args) {
            (c, []) if CommandParser::takes_column(c) => self.columns(),
            ("filter" | "add" | "drop" | "edits", []) => owned(&CommandParser::subcommands(cmd)),
            ("drop", ["column"]) => self.columns(),
            ("add", ["column", _]) => owned(TYPES),
            ("set", [_]) => self.columns(),
            ("where", [_]) => owned(OPERATORS),
            ("help", []) => owned(HELP_TOPICS),
            _ => vec![],
        }
    }
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

impl Completer for SchemaAwareCompleter {
    fn complete(&mut self, line: &str, pos: usize) -> Vec<Suggestion> {
        let input = &line[..pos];
        let completions = Self::complete(self, input);

        let word_start = input.rfind(' ').map_or(0, |i| i + 1);
        let span = Span::new(word_start, pos);

        completions
            .into_iter()
            .map(|value| Suggestion {
                value,
                description: None,
                style: None,
                extra: None,
                span,
                append_whitespace: true,
            })
            .collect()
    }
}
