//! plinth - a minimal keyboard-driven terminal application framework
//!
//! The framework owns the event loop, a single-key command dispatch state
//! machine, and a weighted vertical layout for a stack of panels. Embedding
//! applications supply the interesting parts: [`Command`] implementations
//! bound to trigger keys, and [`Drawable`] panel content the commands show,
//! hide, and update.
//!
//! The primary panel (a windowed view over an append-only log) and a 3-row
//! command bar are always present; everything else is a widget created by a
//! command at runtime. Space above the command bar is divided by integer
//! weights: the primary panel carries a fixed weight, each visible widget
//! its own weight in 1..=10.

pub mod backend;
pub mod command;
pub mod config;
pub mod core;
pub mod error;
pub mod ui;
pub mod widget;

pub use backend::{CrosstermTerminal, TerminalBackend, TestTerminal};
pub use command::{Command, CommandKind, CommandRegistry, SharedCommand};
pub use config::AppConfig;
pub use core::app::App;
pub use core::events::{Event, EventHandler, EventResult};
pub use core::state::{InputState, LogLine, MainLog};
pub use error::Error;
pub use ui::layout::{
    weight_fractions, ComputedLayout, LayoutEngine, COMMAND_BAR_HEIGHT, MAIN_PANEL_WEIGHT,
};
pub use ui::theme::Theme;
pub use widget::{
    Drawable, SharedDrawable, Widget, WidgetId, WidgetSet, MAX_WEIGHT, MIN_WEIGHT,
};
