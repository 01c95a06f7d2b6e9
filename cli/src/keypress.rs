//! Key-press listening while a statement is being waited on.
//!
//! A [`KeyListener`] polls an [`InputReader`] every [`POLL_INTERVAL`] and
//! cancels a [`CancellationToken`] as soon as it sees a key bound to one of
//! the actions it listens for. The reader never blocks, so the listener can be
//! stopped at any time without waiting for input.

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use log::{debug, warn};
use parking_lot::Mutex;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAction {
    /// Stop waiting and stop the statement on the server
    Cancel,
    /// Stop waiting, leave the statement running
    Detach,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBinding {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
    pub action: KeyAction,
}

impl KeyBinding {
    pub fn new(code: KeyCode, modifiers: KeyModifiers, action: KeyAction) -> Self {
        Self {
            code,
            modifiers,
            action,
        }
    }

    fn matches(&self, key: &KeyEvent) -> bool {
        let code_matches = match (self.code, key.code) {
            (KeyCode::Char(bound), KeyCode::Char(pressed)) => bound.eq_ignore_ascii_case(&pressed),
            (bound, pressed) => bound == pressed,
        };
        code_matches && key.modifiers.contains(self.modifiers)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBindings {
    bindings: Vec<KeyBinding>,
}

impl Default for KeyBindings {
    /// Ctrl-C, Ctrl-Q and Esc cancel; Enter detaches
    fn default() -> Self {
        Self::new(vec![
            KeyBinding::new(KeyCode::Char('c'), KeyModifiers::CONTROL, KeyAction::Cancel),
            KeyBinding::new(KeyCode::Char('q'), KeyModifiers::CONTROL, KeyAction::Cancel),
            KeyBinding::new(KeyCode::Esc, KeyModifiers::NONE, KeyAction::Cancel),
            KeyBinding::new(KeyCode::Enter, KeyModifiers::NONE, KeyAction::Detach),
        ])
    }
}

impl KeyBindings {
    pub fn new(bindings: Vec<KeyBinding>) -> Self {
        Self { bindings }
    }

    /// Subset of these bindings that trigger one of `actions`
    pub fn only(&self, actions: &[KeyAction]) -> Self {
        Self::new(
            self.bindings
                .iter()
                .filter(|binding| actions.contains(&binding.action))
                .copied()
                .collect(),
        )
    }

    pub fn action_for(&self, key: &KeyEvent) -> Option<KeyAction> {
        self.bindings
            .iter()
            .find(|binding| binding.matches(key))
            .map(|binding| binding.action)
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Non-blocking source of key presses.
pub trait InputReader: Send {
    /// Prepare the input for key-by-key reading
    fn start(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Next pending key press, or `None` if nothing was typed
    fn read_key(&mut self) -> io::Result<Option<KeyEvent>>;

    /// Restore the input to its normal mode
    fn stop(&mut self) {}
}

/// Shared handle to the input reader, reused across listeners
pub type SharedInputReader = Arc<Mutex<Box<dyn InputReader>>>;

pub fn shared_reader(reader: impl InputReader + 'static) -> SharedInputReader {
    Arc::new(Mutex::new(Box::new(reader)))
}

/// Reads keys from the controlling terminal in raw mode
#[derive(Debug, Default)]
pub struct TerminalInputReader {
    raw_mode: bool,
}

impl TerminalInputReader {
    pub fn new() -> Self {
        Self::default()
    }
}

impl InputReader for TerminalInputReader {
    fn start(&mut self) -> io::Result<()> {
        if !self.raw_mode {
            terminal::enable_raw_mode()?;
            self.raw_mode = true;
        }
        Ok(())
    }

    fn read_key(&mut self) -> io::Result<Option<KeyEvent>> {
        while event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    return Ok(Some(key));
                }
            }
        }
        Ok(None)
    }

    fn stop(&mut self) {
        if self.raw_mode {
            if let Err(err) = terminal::disable_raw_mode() {
                warn!("Failed to restore terminal mode: {}", err);
            }
            self.raw_mode = false;
        }
    }
}

impl Drop for TerminalInputReader {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Reader for non-interactive runs; never reports a key
#[derive(Debug, Default)]
pub struct NoInputReader;

impl InputReader for NoInputReader {
    fn read_key(&mut self) -> io::Result<Option<KeyEvent>> {
        Ok(None)
    }
}

/// Background task watching for bound keys
pub struct KeyListener {
    shutdown: CancellationToken,
    handle: JoinHandle<Option<KeyAction>>,
}

impl KeyListener {
    /// Start listening. When a bound key is pressed, `cancel` is cancelled and
    /// the listener ends, reporting the action from [`KeyListener::stop`].
    pub fn spawn(reader: SharedInputReader, bindings: KeyBindings, cancel: CancellationToken) -> Self {
        let shutdown = CancellationToken::new();
        let stopped = shutdown.clone();

        let handle = tokio::spawn(async move {
            if let Err(err) = reader.lock().start() {
                warn!("Key listener could not prepare input: {}", err);
                return None;
            }

            let mut ticker = tokio::time::interval(POLL_INTERVAL);
            let action = loop {
                tokio::select! {
                    _ = stopped.cancelled() => break None,
                    _ = cancel.cancelled() => break None,
                    _ = ticker.tick() => {}
                }

                let key = match reader.lock().read_key() {
                    Ok(Some(key)) => key,
                    Ok(None) => continue,
                    Err(err) => {
                        warn!("Key listener stopped reading input: {}", err);
                        break None;
                    },
                };
                if let Some(action) = bindings.action_for(&key) {
                    debug!("Key {:?} triggered {:?}", key.code, action);
                    cancel.cancel();
                    break Some(action);
                }
            };

            reader.lock().stop();
            action
        });

        Self { shutdown, handle }
    }

    /// Stop listening and return the action that fired, if any
    pub async fn stop(self) -> Option<KeyAction> {
        self.shutdown.cancel();
        match self.handle.await {
            Ok(action) => action,
            Err(err) => {
                warn!("Key listener task failed: {}", err);
                None
            },
        }
    }
}
