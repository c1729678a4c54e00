//! Terminal backend seam
//!
//! The application drives the terminal through [`TerminalBackend`] so the
//! production crossterm terminal and the headless test terminal are
//! interchangeable. The backend owns the terminal for the process lifetime:
//! construction puts it into the state the application needs, [`close`]
//! releases it, and releasing is idempotent so it happens at most once no
//! matter how the application shuts down.
//!
//! [`close`]: TerminalBackend::close

use std::io::{self, Stdout};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use ratatui::backend::CrosstermBackend;
use ratatui::{Frame, Terminal};

/// Rendering half of the terminal contract: dimensions, frame drawing, and
/// the release lifecycle. The input half (key and resize events) arrives
/// through the event queue in [`crate::core::events`].
pub trait TerminalBackend: Send {
    /// Current (width, height) in cells.
    fn size(&self) -> io::Result<(u16, u16)>;

    /// Run one full draw pass.
    fn draw(&mut self, render: &mut dyn FnMut(&mut Frame)) -> io::Result<()>;

    /// Release the terminal. Must be idempotent.
    fn close(&mut self) -> io::Result<()>;
}

/// Production backend: raw mode on the alternate screen via crossterm.
pub struct CrosstermTerminal {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    restored: bool,
}

impl CrosstermTerminal {
    /// Enter raw mode on the alternate screen with the cursor hidden. A
    /// failure here is fatal to the embedding application; there is no
    /// fallback rendering path.
    pub fn init() -> io::Result<Self> {
        crossterm::terminal::enable_raw_mode()?;
        crossterm::execute!(
            io::stdout(),
            crossterm::terminal::EnterAlternateScreen,
            crossterm::cursor::Hide,
        )?;
        let terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
        Ok(Self {
            terminal,
            restored: false,
        })
    }
}

impl TerminalBackend for CrosstermTerminal {
    fn size(&self) -> io::Result<(u16, u16)> {
        let size = self.terminal.size()?;
        Ok((size.width, size.height))
    }

    fn draw(&mut self, render: &mut dyn FnMut(&mut Frame)) -> io::Result<()> {
        self.terminal.draw(|frame| render(frame))?;
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        crossterm::terminal::disable_raw_mode()?;
        crossterm::execute!(
            io::stdout(),
            crossterm::terminal::LeaveAlternateScreen,
            crossterm::cursor::Show,
        )?;
        Ok(())
    }
}

impl Drop for CrosstermTerminal {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

/// Headless backend over ratatui's in-memory buffer. Counts `close` calls so
/// tests can assert the application releases the terminal exactly once.
pub struct TestTerminal {
    terminal: Terminal<ratatui::backend::TestBackend>,
    closes: Arc<AtomicU32>,
}

impl TestTerminal {
    pub fn new(width: u16, height: u16) -> io::Result<Self> {
        let terminal = Terminal::new(ratatui::backend::TestBackend::new(width, height))?;
        Ok(Self {
            terminal,
            closes: Arc::new(AtomicU32::new(0)),
        })
    }

    /// Shared counter of `close` calls; clone it before handing the backend
    /// to the application.
    pub fn close_counter(&self) -> Arc<AtomicU32> {
        Arc::clone(&self.closes)
    }
}

impl TerminalBackend for TestTerminal {
    fn size(&self) -> io::Result<(u16, u16)> {
        let size = self.terminal.size()?;
        Ok((size.width, size.height))
    }

    fn draw(&mut self, render: &mut dyn FnMut(&mut Frame)) -> io::Result<()> {
        self.terminal.draw(|frame| render(frame))?;
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
