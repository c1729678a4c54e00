//! Framework error taxonomy

use thiserror::Error;

/// Errors the framework returns to the embedding application.
///
/// Validation failures come back synchronously from the call that caused
/// them. Failures inside a command handler are a different channel entirely:
/// the dispatcher catches those, reports them on the primary panel, and keeps
/// running.
#[derive(Debug, Error)]
pub enum Error {
    /// A command declared an empty trigger string.
    #[error("command '{title}' has an empty trigger")]
    EmptyTrigger { title: String },

    /// Another command already owns this trigger character.
    #[error("command trigger '{0}' is already registered")]
    DuplicateTrigger(char),

    /// Widget weights must stay within 1..=10.
    #[error("widget weight must be between 1 and 10, got {0}")]
    InvalidWeight(u16),

    /// The given handle does not name a widget created by this application.
    #[error("unknown widget handle")]
    UnknownWidget,

    /// The event queue was dropped before the application asked to quit.
    #[error("event source closed before the application quit")]
    EventSourceClosed,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
