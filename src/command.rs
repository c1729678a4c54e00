//! Command contract and trigger registry

use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::core::app::App;
use crate::error::Error;

/// How a command occupies the screen after its handler returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// Runs to completion per invocation; nothing of it stays on screen.
    OneShot,
    /// Keeps a visible panel alive and is asked to refresh it on every
    /// repaint.
    Streaming,
}

/// A unit of behavior bound to a single trigger key.
///
/// Concrete commands are supplied entirely by the embedding application; the
/// framework never enumerates them. A command receives the [`App`] as an
/// explicit parameter and talks back through its public surface: printing to
/// the primary panel, creating and toggling widgets, blocking on a single
/// key, requesting quit.
#[async_trait]
pub trait Command: Send {
    /// Invoked when the trigger key is pressed in normal state. An error
    /// return is reported on the primary panel; the application keeps
    /// running.
    async fn handle(&mut self, app: &mut App) -> anyhow::Result<()>;

    fn kind(&self) -> CommandKind;

    fn title(&self) -> &str;

    /// The trigger string. Only the leading character is significant; see
    /// [`CommandRegistry::register`].
    fn trigger(&self) -> &str;

    fn description(&self) -> &str;

    /// Called after every repaint so a visible streaming command can update
    /// its panel content. The default does nothing.
    fn refresh(&mut self) {}
}

/// A registered command, shared between the registry and the embedder.
pub type SharedCommand = Arc<Mutex<dyn Command>>;

/// Trigger-keyed command registry.
///
/// Keys are the first character of each command's trigger string. A
/// multi-character trigger is accepted, but only its leading character takes
/// part in dispatch; the remainder is logged at debug level and otherwise
/// ignored rather than rejected.
#[derive(Default)]
pub struct CommandRegistry {
    commands: IndexMap<char, SharedCommand>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            commands: IndexMap::new(),
        }
    }

    /// Register a command under the leading character of its trigger.
    ///
    /// Fails with a validation error when the trigger is empty or its
    /// leading character collides with an already-registered command. A
    /// failed call leaves the registry unchanged. On success the shared
    /// handle is returned; the caller may keep a clone.
    pub fn register<C: Command + 'static>(&mut self, command: C) -> Result<SharedCommand, Error> {
        let trigger = command.trigger();
        let Some(key) = trigger.chars().next() else {
            return Err(Error::EmptyTrigger {
                title: command.title().to_string(),
            });
        };
        if trigger.chars().count() > 1 {
            debug!(
                trigger,
                "multi-character trigger; only the leading character dispatches"
            );
        }
        if self.commands.contains_key(&key) {
            return Err(Error::DuplicateTrigger(key));
        }

        info!(trigger = %key, title = command.title(), "command registered");
        let shared: SharedCommand = Arc::new(Mutex::new(command));
        self.commands.insert(key, Arc::clone(&shared));
        Ok(shared)
    }

    /// Look up the command bound to a single input character.
    pub fn get(&self, trigger: char) -> Option<SharedCommand> {
        self.commands.get(&trigger).cloned()
    }

    /// All registered commands in registration order.
    pub fn handles(&self) -> Vec<SharedCommand> {
        self.commands.values().cloned().collect()
    }

    /// Registered trigger characters in registration order.
    pub fn triggers(&self) -> impl Iterator<Item = char> + '_ {
        self.commands.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
