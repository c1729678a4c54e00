//! Demo application for the plinth framework
//!
//! Registers two commands on the framework: a streaming help panel toggled
//! with 'h' and a quit command on 'q' that waits for a confirming keypress.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use clap::Parser;
use crossterm::event::KeyCode;
use parking_lot::Mutex;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    widgets::{Paragraph, Widget as _, Wrap},
};
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use plinth::{
    App, AppConfig, Command, CommandKind, CrosstermTerminal, Drawable, SharedDrawable, WidgetId,
};

const HELP_WEIGHT: u16 = 4;

const HELP_TEXT: &str = "Press 'h' to toggle this panel.\n\
Press 'q' to quit; you will be asked to confirm with 'y'.\n\
Press '>' to open the command line.\n\
Ctrl-C quits immediately.";

#[derive(Parser)]
#[command(name = "plinth-demo")]
#[command(version = "0.1.0")]
#[command(about = "Help/quit demo for the plinth framework", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the primary panel title
    #[arg(short, long)]
    title: Option<String>,
}

/// Log to a file; stdout belongs to the alternate screen.
fn setup_logging(
    verbosity: u8,
    fallback_level: &str,
) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let level = match verbosity {
        0 => fallback_level.parse().unwrap_or(Level::WARN),
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    let log_dir = dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("plinth")
        .join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "plinth-demo.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(guard)
}

/// Wrapped text panel. Concrete drawables belong to the embedding
/// application; the framework only sees the `Drawable` trait.
struct TextBlock {
    text: String,
}

impl TextBlock {
    fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }
}

impl Drawable for TextBlock {
    fn preferred_size(&self) -> (u16, u16) {
        let width = self.text.lines().map(str::len).max().unwrap_or(0);
        (width as u16, self.text.lines().count() as u16)
    }

    fn draw(&self, area: Rect, buf: &mut Buffer) {
        Paragraph::new(self.text.as_str())
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}

/// Streaming command: lazily creates the help widget on first use, then
/// toggles its visibility. Refresh stamps the panel so the streaming path is
/// visible in the demo.
#[derive(Default)]
struct HelpCommand {
    widget: Option<WidgetId>,
    block: Option<Arc<Mutex<TextBlock>>>,
    visible: bool,
}

#[async_trait]
impl Command for HelpCommand {
    async fn handle(&mut self, app: &mut App) -> Result<()> {
        let id = match self.widget {
            Some(id) => id,
            None => {
                let block = Arc::new(Mutex::new(TextBlock::new(HELP_TEXT)));
                let id = app.create_widget(
                    self.title(),
                    Arc::clone(&block) as SharedDrawable,
                    HELP_WEIGHT,
                )?;
                self.block = Some(block);
                self.widget = Some(id);
                id
            }
        };

        if self.visible {
            app.hide_widget(id)?;
        } else {
            app.show_widget(id)?;
        }
        self.visible = !self.visible;
        Ok(())
    }

    fn kind(&self) -> CommandKind {
        CommandKind::Streaming
    }

    fn title(&self) -> &str {
        "Help"
    }

    fn trigger(&self) -> &str {
        "h"
    }

    fn description(&self) -> &str {
        "Show help information. Press 'h' to toggle visibility."
    }

    fn refresh(&mut self) {
        if !self.visible {
            return;
        }
        if let Some(block) = &self.block {
            let stamp = Utc::now().format("%H:%M:%S");
            block
                .lock()
                .set_text(format!("{HELP_TEXT}\n\nRefreshed at {stamp}"));
        }
    }
}

struct QuitCommand;

#[async_trait]
impl Command for QuitCommand {
    async fn handle(&mut self, app: &mut App) -> Result<()> {
        app.print("Quit? Press 'y' to confirm.");
        let key = app.read_key().await?;
        if matches!(key.code, KeyCode::Char('y' | 'Y')) {
            app.print("Quitting application...");
            app.request_quit();
        } else {
            app.print("Quit cancelled.");
        }
        Ok(())
    }

    fn kind(&self) -> CommandKind {
        CommandKind::OneShot
    }

    fn title(&self) -> &str {
        "Quit the application"
    }

    fn trigger(&self) -> &str {
        "q"
    }

    fn description(&self) -> &str {
        "Quit the application. Press 'y' to confirm."
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.or_else(|| {
        let default_config = AppConfig::default_path()?;
        default_config.exists().then_some(default_config)
    });
    let mut config = match config_path {
        Some(path) => AppConfig::load(&path)?,
        None => AppConfig::default(),
    };
    if let Some(title) = cli.title {
        config.general.title = title;
    }

    // Keep the guard alive for the duration of the program
    let _logging_guard = setup_logging(cli.verbose, &config.log.level)?;

    // A terminal that cannot be initialized is fatal; there is no fallback
    // rendering path.
    let terminal = CrosstermTerminal::init()?;
    let mut app = App::new(Box::new(terminal), config)?;

    app.register(HelpCommand::default())?;
    app.register(QuitCommand)?;
    app.print("Welcome! Press 'h' for help.");

    app.spawn_event_sources();
    app.run().await?;

    Ok(())
}
