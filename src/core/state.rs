//! Input state machine and primary-panel log

use chrono::{DateTime, Utc};

/// Governs how keyboard events are routed.
///
/// `Normal` dispatches trigger keys to commands. `Typing` accumulates a
/// command line (entered through the configured line-entry key). `Subcommand`
/// is active only while a command blocks on [`crate::core::app::App::read_key`];
/// trigger dispatch is suspended and the next keystroke goes straight to the
/// caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputState {
    #[default]
    Normal,
    Typing,
    Subcommand,
}

/// One line of primary-panel output.
#[derive(Debug, Clone)]
pub struct LogLine {
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Append-only log backing the primary panel.
///
/// Storage is unbounded for the process lifetime; only the display is
/// windowed. Long-running embedders that care about memory should quit and
/// restart rather than expect truncation here.
#[derive(Debug, Clone, Default)]
pub struct MainLog {
    lines: Vec<LogLine>,
}

impl MainLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append text, splitting embedded newlines into separate lines.
    pub fn append(&mut self, text: &str) {
        let timestamp = Utc::now();
        for line in text.split('\n') {
            self.lines.push(LogLine {
                content: line.to_string(),
                timestamp,
            });
        }
    }

    pub fn lines(&self) -> &[LogLine] {
        &self.lines
    }

    /// The last `height` lines: what a panel with `height` text rows shows.
    pub fn window(&self, height: usize) -> &[LogLine] {
        let start = self.lines.len().saturating_sub(height);
        &self.lines[start..]
    }

    /// True if any line contains `needle`. Primarily for assertions in
    /// embedder tests.
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|l| l.content.contains(needle))
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
