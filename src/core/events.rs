//! Event queue shared by the application loop and its sources

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent};
use std::time::Duration;
use tokio::sync::mpsc;

/// All events the application loop consumes.
#[derive(Debug, Clone)]
pub enum Event {
    Key(KeyEvent),
    /// Received but ignored by the loop; mouse handling is out of scope.
    Mouse(MouseEvent),
    Resize(u16, u16),
    /// Repaint cadence for visible streaming commands.
    Tick,
}

/// Result of handling one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    Continue,
    Quit,
}

/// Single consumer over the unbounded event queue. Sources are spawned
/// tasks feeding the sender; tests feed it directly.
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
    tx: mpsc::UnboundedSender<Event>,
}

impl EventHandler {
    pub fn new() -> (Self, mpsc::UnboundedSender<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { rx, tx: tx.clone() }, tx)
    }

    pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
        self.tx.clone()
    }

    /// Start the production event sources: the crossterm input stream and
    /// the render tick.
    pub fn spawn_sources(event_tx: mpsc::UnboundedSender<Event>) {
        tokio::spawn(Self::terminal_events(event_tx.clone()));
        tokio::spawn(Self::tick_events(event_tx, Duration::from_millis(250)));
    }

    async fn terminal_events(tx: mpsc::UnboundedSender<Event>) {
        use crossterm::event::{self, Event as CrosstermEvent};
        use futures::StreamExt;

        let mut reader = event::EventStream::new();
        while let Some(event_result) = reader.next().await {
            let event = match event_result {
                Ok(CrosstermEvent::Key(key)) => Event::Key(key),
                Ok(CrosstermEvent::Mouse(mouse)) => Event::Mouse(mouse),
                Ok(CrosstermEvent::Resize(w, h)) => Event::Resize(w, h),
                _ => continue,
            };
            if tx.send(event).is_err() {
                break;
            }
        }
    }

    async fn tick_events(tx: mpsc::UnboundedSender<Event>, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            if tx.send(Event::Tick).is_err() {
                break;
            }
        }
    }

    /// Next event, awaiting until one arrives. `None` means every sender is
    /// gone.
    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}

/// The unconditional quit chord.
pub fn is_ctrl_c(key: &KeyEvent) -> bool {
    key.code == KeyCode::Char('c') && key.modifiers == KeyModifiers::CONTROL
}

/// Human-readable name of a key for "not mapped" reporting.
pub fn key_name(key: &KeyEvent) -> String {
    match key.code {
        KeyCode::Char(c) => c.to_string(),
        code => format!("{code:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn ctrl_c_requires_the_control_modifier() {
        let plain = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE);
        let chord = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);

        assert!(!is_ctrl_c(&plain));
        assert!(is_ctrl_c(&chord));
    }

    #[test]
    fn key_names_read_naturally() {
        let char_key = KeyEvent::new(KeyCode::Char('x'), KeyModifiers::NONE);
        let enter = KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE);

        assert_eq!(key_name(&char_key), "x");
        assert_eq!(key_name(&enter), "Enter");
    }

    #[tokio::test]
    async fn queue_preserves_send_order() {
        let (mut handler, tx) = EventHandler::new();
        tx.send(Event::Resize(80, 24)).unwrap();
        tx.send(Event::Tick).unwrap();

        assert!(matches!(handler.next().await, Some(Event::Resize(80, 24))));
        assert!(matches!(handler.next().await, Some(Event::Tick)));
    }
}
