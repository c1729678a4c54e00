//! Application orchestrator: command dispatch, widget lifecycle, event loop

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::Rect;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::backend::TerminalBackend;
use crate::command::{Command, CommandRegistry, SharedCommand};
use crate::config::AppConfig;
use crate::core::events::{self, Event, EventHandler, EventResult};
use crate::core::state::{InputState, MainLog};
use crate::error::Error;
use crate::ui::layout::{ComputedLayout, LayoutEngine};
use crate::ui::renderer::{RenderContext, Renderer};
use crate::ui::theme::Theme;
use crate::widget::{SharedDrawable, Widget, WidgetId, WidgetSet};

const PROMPT: &str = "> ";

/// The application: command registry, widget collection, input state, and
/// the event loop. One per process, constructed explicitly and passed by
/// reference into command handlers; there is no global instance.
pub struct App {
    terminal: Box<dyn TerminalBackend>,
    config: AppConfig,
    theme: Theme,
    commands: CommandRegistry,
    widgets: WidgetSet,
    state: InputState,
    size: (u16, u16),
    main_log: MainLog,
    command_line: String,
    quit: bool,
    layout: ComputedLayout,
    layout_generation: u64,
    events: EventHandler,
    event_tx: mpsc::UnboundedSender<Event>,
}

impl App {
    /// Build an application over an initialized terminal backend. The
    /// backend is owned exclusively until [`run`] releases it.
    ///
    /// [`run`]: App::run
    pub fn new(terminal: Box<dyn TerminalBackend>, config: AppConfig) -> Result<Self, Error> {
        let size = terminal.size()?;
        let (events, event_tx) = EventHandler::new();

        let mut app = Self {
            terminal,
            config,
            theme: Theme::default(),
            commands: CommandRegistry::new(),
            widgets: WidgetSet::new(),
            state: InputState::default(),
            size,
            main_log: MainLog::new(),
            command_line: String::new(),
            quit: false,
            layout: ComputedLayout::default(),
            layout_generation: 0,
            events,
            event_tx,
        };
        app.recalculate();
        Ok(app)
    }

    /// Register a command under the leading character of its trigger. See
    /// [`CommandRegistry::register`] for the validation contract.
    pub fn register<C: Command + 'static>(&mut self, command: C) -> Result<SharedCommand, Error> {
        match self.commands.register(command) {
            Ok(shared) => Ok(shared),
            Err(err) => {
                error!(error = %err, "command registration failed");
                Err(err)
            }
        }
    }

    /// Create a widget (initially hidden) and return its handle. Callers
    /// must retain the handle; show/hide identify the widget by it.
    pub fn create_widget(
        &mut self,
        title: impl Into<String>,
        drawable: SharedDrawable,
        weight: u16,
    ) -> Result<WidgetId, Error> {
        let widget = match Widget::new(drawable, title, weight) {
            Ok(widget) => widget,
            Err(err) => {
                error!(error = %err, "failed to create widget");
                return Err(err);
            }
        };

        info!(title = widget.title(), weight, "widget created");
        let id = self.widgets.insert(widget);
        self.recalculate();
        self.redraw()?;
        Ok(id)
    }

    pub fn show_widget(&mut self, id: WidgetId) -> Result<(), Error> {
        self.set_widget_visible(id, true)
    }

    pub fn hide_widget(&mut self, id: WidgetId) -> Result<(), Error> {
        self.set_widget_visible(id, false)
    }

    fn set_widget_visible(&mut self, id: WidgetId, visible: bool) -> Result<(), Error> {
        let changed = self.widgets.set_visible(id, visible)?;
        if !changed {
            warn!(visible, "widget already in requested state");
            return Ok(());
        }
        self.recalculate();
        self.redraw()
    }

    /// Append text to the primary panel and repaint. Embedded newlines
    /// become separate lines.
    pub fn print(&mut self, message: impl AsRef<str>) {
        let message = message.as_ref();
        self.main_log.append(message);
        info!(text = message, "printed to primary panel");
        if let Err(err) = self.redraw() {
            error!(error = %err, "repaint after print failed");
        }
    }

    /// Ask the loop to stop after the current event. The terminal is
    /// released once, when [`run`] returns.
    ///
    /// [`run`]: App::run
    pub fn request_quit(&mut self) {
        info!("quit requested");
        self.quit = true;
    }

    /// Block for a single keystroke, bypassing trigger dispatch.
    ///
    /// This is the nested event-consumption mode for commands that need a
    /// confirming keypress: the input state moves to `Subcommand`, resize
    /// events are still applied opportunistically, Ctrl-C still quits (the
    /// key is returned so the caller can finish), and the first other key
    /// event is handed to the caller.
    pub async fn read_key(&mut self) -> Result<KeyEvent, Error> {
        let previous = self.state;
        self.state = InputState::Subcommand;

        let key = loop {
            let Some(event) = self.events.next().await else {
                self.state = previous;
                return Err(Error::EventSourceClosed);
            };
            match event {
                Event::Key(key) if events::is_ctrl_c(&key) => {
                    self.print("Ctrl-C detected, quitting application...");
                    self.quit = true;
                    break key;
                }
                Event::Key(key) => break key,
                Event::Resize(width, height) => {
                    if let Err(err) = self.resize(width, height) {
                        self.state = previous;
                        return Err(err);
                    }
                }
                Event::Mouse(_) | Event::Tick => {}
            }
        };

        self.state = previous;
        Ok(key)
    }

    /// Run the event loop until quit, then release the terminal exactly
    /// once. Call [`spawn_event_sources`] first when running against a real
    /// terminal.
    ///
    /// [`spawn_event_sources`]: App::spawn_event_sources
    pub async fn run(&mut self) -> Result<(), Error> {
        info!("application loop starting");
        let result = self.event_loop().await;
        self.terminal.close()?;
        info!("terminal released");
        result
    }

    /// Start the production event sources (terminal input, render tick).
    /// Tests skip this and push events through [`event_sender`] instead.
    ///
    /// [`event_sender`]: App::event_sender
    pub fn spawn_event_sources(&self) {
        EventHandler::spawn_sources(self.event_tx.clone());
    }

    pub fn event_sender(&self) -> mpsc::UnboundedSender<Event> {
        self.event_tx.clone()
    }

    async fn event_loop(&mut self) -> Result<(), Error> {
        self.redraw()?;
        while !self.quit {
            let Some(event) = self.events.next().await else {
                return Err(Error::EventSourceClosed);
            };
            if self.handle_event(event).await? == EventResult::Quit {
                self.quit = true;
                break;
            }
            if self.quit {
                break;
            }
            self.refresh_commands().await;
            self.redraw()?;
        }
        Ok(())
    }

    async fn handle_event(&mut self, event: Event) -> Result<EventResult, Error> {
        match event {
            Event::Key(key) if events::is_ctrl_c(&key) => {
                self.print("Ctrl-C detected, quitting application...");
                Ok(EventResult::Quit)
            }
            Event::Key(key) => {
                self.handle_key(key).await;
                Ok(EventResult::Continue)
            }
            Event::Resize(width, height) => {
                self.resize(width, height)?;
                Ok(EventResult::Continue)
            }
            Event::Mouse(_) => Ok(EventResult::Continue),
            Event::Tick => Ok(EventResult::Continue),
        }
    }

    async fn handle_key(&mut self, key: KeyEvent) {
        match self.state {
            InputState::Normal => self.handle_key_normal(key).await,
            InputState::Typing => self.handle_key_typing(key),
            // Keys in subcommand state are consumed inside read_key; one
            // arriving here means no read is in flight anymore.
            InputState::Subcommand => {
                debug!(key = %events::key_name(&key), "key ignored in subcommand state");
            }
        }
    }

    async fn handle_key_normal(&mut self, key: KeyEvent) {
        let KeyCode::Char(c) = key.code else {
            self.print(format!(
                "key '{}' is not mapped to any command.",
                events::key_name(&key)
            ));
            return;
        };

        if c == self.config.keys.line_entry {
            debug!("entering command-line typing state");
            self.state = InputState::Typing;
            self.command_line = PROMPT.to_string();
            if let Err(err) = self.redraw() {
                error!(error = %err, "repaint after state change failed");
            }
            return;
        }

        match self.commands.get(c) {
            Some(command) => self.dispatch(command).await,
            None => self.print(format!("key '{c}' is not mapped to any command.")),
        }
    }

    fn handle_key_typing(&mut self, key: KeyEvent) {
        // Line editing is not built; report it and drop back to normal
        // dispatch instead of aborting.
        warn!(key = %events::key_name(&key), "command-line input is not implemented");
        self.command_line.clear();
        self.state = InputState::Normal;
        self.print("command-line input is not implemented yet.");
    }

    async fn dispatch(&mut self, command: SharedCommand) {
        let mut guard = command.lock().await;
        let title = guard.title().to_string();
        debug!(command = %title, "dispatching");

        if let Err(err) = guard.handle(self).await {
            error!(command = %title, error = %err, "command handler failed");
            self.print(format!("Error handling command '{title}': {err}"));
        }
    }

    fn resize(&mut self, width: u16, height: u16) -> Result<(), Error> {
        debug!(width, height, "terminal resized");
        self.size = (width, height);
        self.recalculate();
        self.redraw()
    }

    fn recalculate(&mut self) {
        let area = Rect::new(0, 0, self.size.0, self.size.1);
        self.layout = LayoutEngine::compute(area, &self.widgets);
        self.layout_generation += 1;
        debug!(generation = self.layout_generation, "layout recalculated");
    }

    fn redraw(&mut self) -> Result<(), Error> {
        let ctx = RenderContext {
            title: &self.config.general.title,
            log: &self.main_log,
            command_line: &self.command_line,
            widgets: &self.widgets,
            layout: &self.layout,
            theme: &self.theme,
        };
        self.terminal
            .draw(&mut |frame| Renderer::render(frame, &ctx))?;
        Ok(())
    }

    /// Let every command update its panel content. Runs between events on
    /// the loop, never while a handler holds its own lock.
    async fn refresh_commands(&mut self) {
        for command in self.commands.handles() {
            command.lock().await.refresh();
        }
    }

    pub fn input_state(&self) -> InputState {
        self.state
    }

    pub fn size(&self) -> (u16, u16) {
        self.size
    }

    pub fn main_log(&self) -> &MainLog {
        &self.main_log
    }

    pub fn command_line(&self) -> &str {
        &self.command_line
    }

    pub fn widgets(&self) -> &WidgetSet {
        &self.widgets
    }

    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    pub fn layout(&self) -> &ComputedLayout {
        &self.layout
    }

    /// Bumped on every layout recalculation; useful for debugging repaint
    /// storms and for assertions.
    pub fn layout_generation(&self) -> u64 {
        self.layout_generation
    }

    pub fn quit_requested(&self) -> bool {
        self.quit
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::TestTerminal;
    use crate::command::CommandKind;
    use crate::widget::Drawable;
    use async_trait::async_trait;
    use crossterm::event::KeyModifiers;
    use pretty_assertions::assert_eq;
    use ratatui::buffer::Buffer;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    struct Blank;

    impl Drawable for Blank {
        fn preferred_size(&self) -> (u16, u16) {
            (10, 3)
        }

        fn draw(&self, _area: Rect, _buf: &mut Buffer) {}
    }

    fn blank() -> SharedDrawable {
        Arc::new(parking_lot::Mutex::new(Blank))
    }

    fn key(c: char) -> Event {
        Event::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
    }

    fn ctrl_c() -> Event {
        Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL))
    }

    fn test_app(
        width: u16,
        height: u16,
    ) -> (App, mpsc::UnboundedSender<Event>, Arc<AtomicU32>) {
        let terminal = TestTerminal::new(width, height).unwrap();
        let closes = terminal.close_counter();
        let app = App::new(Box::new(terminal), AppConfig::default()).unwrap();
        let tx = app.event_sender();
        (app, tx, closes)
    }

    #[derive(Default)]
    struct ToggleCommand {
        widget: Option<WidgetId>,
        shown: bool,
    }

    #[async_trait]
    impl Command for ToggleCommand {
        async fn handle(&mut self, app: &mut App) -> anyhow::Result<()> {
            let id = match self.widget {
                Some(id) => id,
                None => {
                    let id = app.create_widget("Help", blank(), 4)?;
                    self.widget = Some(id);
                    id
                }
            };
            if self.shown {
                app.hide_widget(id)?;
            } else {
                app.show_widget(id)?;
            }
            self.shown = !self.shown;
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
            "toggle the help panel"
        }
    }

    struct ConfirmQuitCommand;

    #[async_trait]
    impl Command for ConfirmQuitCommand {
        async fn handle(&mut self, app: &mut App) -> anyhow::Result<()> {
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
            "Quit"
        }

        fn trigger(&self) -> &str {
            "q"
        }

        fn description(&self) -> &str {
            "quit after confirmation"
        }
    }

    struct FailingCommand;

    #[async_trait]
    impl Command for FailingCommand {
        async fn handle(&mut self, _app: &mut App) -> anyhow::Result<()> {
            Err(anyhow::anyhow!("boom"))
        }

        fn kind(&self) -> CommandKind {
            CommandKind::OneShot
        }

        fn title(&self) -> &str {
            "Fail"
        }

        fn trigger(&self) -> &str {
            "f"
        }

        fn description(&self) -> &str {
            "always fails"
        }
    }

    #[tokio::test]
    async fn unmapped_key_reports_and_stays_normal() {
        let (mut app, tx, _) = test_app(80, 24);
        app.register(ToggleCommand::default()).unwrap();
        app.register(ConfirmQuitCommand).unwrap();

        tx.send(key('x')).unwrap();
        tx.send(ctrl_c()).unwrap();
        app.run().await.unwrap();

        assert!(app.main_log().contains("key 'x' is not mapped to any command."));
        assert_eq!(app.input_state(), InputState::Normal);
    }

    #[tokio::test]
    async fn toggle_recalculates_layout_once_per_flip() {
        let (mut app, tx, _) = test_app(80, 24);
        app.register(ToggleCommand::default()).unwrap();
        let initial = app.layout_generation();

        // First press creates the widget (one recalculation) and shows it
        // (another); the second press hides it (one more).
        tx.send(key('h')).unwrap();
        tx.send(key('h')).unwrap();
        tx.send(ctrl_c()).unwrap();
        app.run().await.unwrap();

        assert_eq!(app.layout_generation(), initial + 3);
        assert_eq!(app.widgets().len(), 1);
        let (_, widget) = app.widgets().iter().next().unwrap();
        assert!(!widget.is_visible());
    }

    #[tokio::test]
    async fn quit_confirmation_releases_terminal_once() {
        let (mut app, tx, closes) = test_app(80, 24);
        app.register(ConfirmQuitCommand).unwrap();

        tx.send(key('q')).unwrap();
        tx.send(key('y')).unwrap();
        app.run().await.unwrap();

        assert!(app.quit_requested());
        assert!(app.main_log().contains("Quitting application..."));
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn declined_quit_keeps_running() {
        let (mut app, tx, closes) = test_app(80, 24);
        app.register(ConfirmQuitCommand).unwrap();

        tx.send(key('q')).unwrap();
        tx.send(key('n')).unwrap();
        tx.send(ctrl_c()).unwrap();
        app.run().await.unwrap();

        assert!(app.main_log().contains("Quit cancelled."));
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn handler_error_is_reported_and_loop_continues() {
        let (mut app, tx, _) = test_app(80, 24);
        app.register(FailingCommand).unwrap();

        tx.send(key('f')).unwrap();
        tx.send(key('x')).unwrap();
        tx.send(ctrl_c()).unwrap();
        app.run().await.unwrap();

        assert!(app.main_log().contains("Error handling command 'Fail': boom"));
        assert!(app.main_log().contains("key 'x' is not mapped"));
    }

    #[tokio::test]
    async fn resize_updates_size_and_display_window() {
        let (mut app, _tx, _) = test_app(80, 24);
        for i in 0..100 {
            app.print(format!("line {i}"));
        }

        app.handle_event(Event::Resize(60, 18)).await.unwrap();

        assert_eq!(app.size(), (60, 18));
        let main = app.layout().main;
        assert_eq!(main.height, 15); // height minus the 3-row command bar

        // Displayed lines fill the panel interior; storage keeps everything.
        let shown = app.main_log().window((main.height - 2) as usize);
        assert_eq!(shown.len(), 13);
        assert_eq!(shown.last().unwrap().content, "line 99");
        assert_eq!(app.main_log().len(), 100);
    }

    #[tokio::test]
    async fn resize_does_not_change_input_state() {
        let (mut app, _tx, _) = test_app(80, 24);
        app.handle_event(key('>')).await.unwrap();
        assert_eq!(app.input_state(), InputState::Typing);

        app.handle_event(Event::Resize(100, 40)).await.unwrap();
        assert_eq!(app.input_state(), InputState::Typing);
    }

    #[tokio::test]
    async fn typing_state_reports_unsupported_and_returns_to_normal() {
        let (mut app, _tx, _) = test_app(80, 24);

        app.handle_event(key('>')).await.unwrap();
        assert_eq!(app.input_state(), InputState::Typing);
        assert_eq!(app.command_line(), "> ");

        app.handle_event(key('a')).await.unwrap();
        assert_eq!(app.input_state(), InputState::Normal);
        assert_eq!(app.command_line(), "");
        assert!(app.main_log().contains("command-line input is not implemented"));
    }

    #[tokio::test]
    async fn ctrl_c_prints_a_notice_before_quitting() {
        let (mut app, tx, _) = test_app(80, 24);
        tx.send(ctrl_c()).unwrap();
        app.run().await.unwrap();

        assert!(app.main_log().contains("Ctrl-C detected"));
        assert!(app.quit_requested());
    }

    #[tokio::test]
    async fn invalid_weight_leaves_widget_set_unchanged() {
        let (mut app, _tx, _) = test_app(80, 24);

        assert!(matches!(
            app.create_widget("bad", blank(), 0),
            Err(Error::InvalidWeight(0))
        ));
        assert!(matches!(
            app.create_widget("bad", blank(), 11),
            Err(Error::InvalidWeight(11))
        ));
        assert!(app.widgets().is_empty());
    }

    #[tokio::test]
    async fn tiny_terminal_does_not_panic() {
        let (mut app, _tx, _) = test_app(10, 4);
        let id = app.create_widget("W", blank(), 10).unwrap();
        app.show_widget(id).unwrap();
        app.handle_event(Event::Resize(10, 4)).await.unwrap();
    }
}
