//! Status prompt.
//!
//! The prompt shows the table source, its size and what is pending:
//!
//! ```text
//! datasheet [people.csv: 3 rows] >
//! datasheet [people.csv: 3 rows, view 1, 2 edits!] >
//! datasheet [people.csv: 3 rows, signed] >
//! ```

use std::fmt::Write;

use super::session::ReplSession;

use nu_ansi_term::{Color, Style};
use reedline::Prompt;

/// State of the working table, shown as the prompt color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetStatus {
    /// Nothing pending
    Clean,
    /// Edits or filters are queued but not applied
    Pending,
    /// Signed since the last load or reset
    Signed,
}

impl SheetStatus {
    /// Status of a REPL session
    #[must_use]
    pub fn of(session: &ReplSession) -> Self {
        let engine = session.session();
        if !engine.pending_edits().is_empty() || !engine.pending_filters().is_empty() {
            Self::Pending
        } else if engine.signature().is_some() {
            Self::Signed
        } else {
            Self::Clean
        }
    }

    /// Get ANSI color for this status
    #[must_use]
    pub fn color(&self) -> Color {
        match self {
            Self::Clean => Color::Default,
            Self::Pending => Color::Yellow,
            Self::Signed => Color::Green,
        }
    }

    /// Get plain text indicator
    #[must_use]
    pub fn indicator(&self) -> &'static str {
        match self {
            Self::Pending => "!",
            Self::Clean | Self::Signed => "",
        }
    }
}

/// Renders the prompt for a session
pub struct StatusPrompt;

impl StatusPrompt {
    /// Render prompt string from session state (plain text)
    #[must_use]
    pub fn render(session: &ReplSession) -> String {
        let status = SheetStatus::of(session);
        format!("datasheet [{}{}] > ", details(session), status.indicator())
    }

    /// Render prompt with colors for terminal
    #[must_use]
    pub fn render_colored(session: &ReplSession) -> String {
        let status = SheetStatus::of(session);
        let details = status
            .color()
            .paint(format!("{}{}", details(session), status.indicator()));
        format!("{} [{}] > ", Style::new().bold().paint("datasheet"), details)
    }
}

fn details(session: &ReplSession) -> String {
    let engine = session.session();
    let mut out = format!(
        "{}: {} rows",
        session.source_name(),
        engine.table().row_count()
    );
    if let Some(view) = engine.view() {
        let _ = write!(out, ", view {}", view.row_count());
    }
    let edits = engine.pending_edits().len();
    if edits > 0 {
        let _ = write!(out, ", {} edits", edits);
    }
    let filters = engine.pending_filters().len();
    if filters > 0 {
        let _ = write!(out, ", {} filters", filters);
    }
    if engine.signature().is_some() {
        out.push_str(", signed");
    }
    out
}

/// Session-aware prompt, rebuilt before each line is read
pub struct SessionPrompt<'a> {
    session: &'a ReplSession,
}

impl<'a> SessionPrompt<'a> {
    /// Create a new session-aware prompt
    #[must_use]
    pub fn new(session: &'a ReplSession) -> Self {
        Self { session }
    }
}

impl Prompt for SessionPrompt<'_> {
    fn render_prompt_left(&self) -> std::borrow::Cow<'_, str> {
        if self.session.config.color_output {
            std::borrow::Cow::Owned(StatusPrompt::render_colored(self.session))
        } else {
            std::borrow::Cow::Owned(StatusPrompt::render(self.session))
        }
    }

    fn render_prompt_right(&self) -> std::borrow::Cow<'_, str> {
        std::borrow::Cow::Borrowed("")
    }

    fn render_prompt_indicator(
        &self,
        _prompt_mode: reedline::PromptEditMode,
    ) -> std::borrow::Cow<'_, str> {
        std::borrow::Cow::Borrowed("")
    }

    fn render_prompt_multiline_indicator(&self) -> std::borrow::Cow<'_, str> {
        std::borrow::Cow::Borrowed("... ")
    }

    fn render_prompt_history_search_indicator(
        &self,
        _history_search: reedline::PromptHistorySearch,
    ) -> std::borrow::Cow<'_, str> {
        std::borrow::Cow::Borrowed("(search) ")
    }
}
