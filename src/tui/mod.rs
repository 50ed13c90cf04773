//! # TUI Runtime
//!
//! The ratatui/crossterm layer. Terminal input and async command results both
//! become [`message::Message`] values that the dispatch loop feeds to the
//! [`root::RootWindow`] one at a time.
//!
//! ## Loop
//!
//! ```text
//!   draw (if dirty) ─► poll terminal (50ms) ─► drain bus ─┐
//!        ▲                                                │
//!        └────────────────────────────────────────────────┘
//! ```
//!
//! Each message is dispatched to completion before the next one. Commands
//! returned by `update` are spawned on the tokio runtime; their messages come
//! back through the [`command::Scheduler`] channel. Envelopes produced inside
//! a sequence are acknowledged after their `update` returns.
//!
//! A `SteadyBlock` cursor style is used instead of a blinking cursor because
//! ratatui's `set_cursor_position` resets the terminal's blink timer on every
//! `draw()` call.

pub mod command;
pub mod component;
pub mod components;
pub mod controllers;
pub mod event;
pub mod keys;
pub mod message;
pub mod root;
mod ui;

use std::io::{self, stdout};
use std::time::Duration;

use crossterm::cursor::{Hide, SetCursorStyle, Show};
use crossterm::event::{
    DisableBracketedPaste, EnableBracketedPaste, KeyboardEnhancementFlags,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use log::{debug, info};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::core::config::ResolvedConfig;
use crate::core::engine::SharedEngine;

use command::{Command, Envelope, Scheduler};
use controllers::{AgentController, ControllerChain, InputController, SlashController};
use event::{poll_event_immediate, poll_event_timeout};
use message::Message;
use root::RootWindow;

const POLL_TIMEOUT: Duration = Duration::from_millis(50);

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> io::Result<Self> {
        // The Kitty protocol is ignored by terminals that lack it.
        execute!(
            stdout(),
            EnableBracketedPaste,
            Show,
            SetCursorStyle::SteadyBlock,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )?;
        info!("Terminal modes enabled (bracketed paste, steady block cursor, keyboard enhancement)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(
            stdout(),
            PopKeyboardEnhancementFlags,
            DisableBracketedPaste,
            Hide
        );
    }
}

/// What the process was asked to do at startup.
#[derive(Debug, Default, Clone)]
pub struct Startup {
    /// Conversation to open.
    pub context: Option<String>,
    /// Prompt to submit once the UI is up.
    pub prompt: Option<String>,
}

impl Startup {
    /// `Init`, then the optional conversation, then the optional prompt.
    pub fn command(&self) -> Option<Command> {
        Command::sequence([
            Some(Command::message(Message::Init)),
            self.context
                .clone()
                .map(|name| Command::message(Message::SelectConversation(name))),
            self.prompt
                .clone()
                .map(|text| Command::message(Message::InputSubmit(text))),
        ])
    }
}

pub fn build_root(config: &ResolvedConfig, engine: SharedEngine) -> RootWindow {
    let controllers = ControllerChain::new(vec![
        Box::new(InputController::new()),
        Box::new(AgentController::new(engine.clone())),
        Box::new(SlashController::new(engine)),
    ]);
    RootWindow::new(&config.keys, controllers)
}

/// Run the UI until a `Quit` message is dispatched.
///
/// Must be called from inside a tokio runtime; commands are spawned on it.
pub async fn run(
    config: &ResolvedConfig,
    engine: SharedEngine,
    scheduler: Scheduler,
    mut rx: UnboundedReceiver<Envelope>,
    startup: Startup,
) -> io::Result<()> {
    let mut root = build_root(config, engine);

    let mut terminal = ratatui::init();
    let _terminal_mode_guard = TerminalModeGuard::new();

    let size = terminal.size()?;
    scheduler.post(Message::Resize {
        width: size.width,
        height: size.height,
    });
    if let Some(command) = startup.command() {
        scheduler.spawn(command);
    }

    let mut dirty = true;
    let result = loop {
        if dirty {
            if let Err(e) = terminal.draw(|f| ui::draw(f, &mut root)) {
                break Err(e);
            }
            dirty = false;
        }

        let first = match poll_event_timeout(POLL_TIMEOUT) {
            Ok(event) => event,
            Err(e) => break Err(e),
        };
        let mut quit = false;
        for message in first.into_iter().chain(std::iter::from_fn(|| {
            poll_event_immediate().ok().flatten()
        })) {
            dirty = true;
            quit |= dispatch(&mut root, &scheduler, message);
        }

        while let Ok(mut envelope) = rx.try_recv() {
            dirty = true;
            quit |= dispatch(&mut root, &scheduler, envelope.message.clone());
            envelope.acknowledge();
        }

        if quit {
            info!("Quit requested");
            break Ok(());
        }
        // Let spawned commands make progress between frames.
        tokio::task::yield_now().await;
    };

    ratatui::restore();
    result
}

/// Run one message through the root window. Returns true on `Quit`.
fn dispatch(root: &mut RootWindow, scheduler: &Scheduler, message: Message) -> bool {
    if !matches!(message, Message::SpinnerTick) {
        debug!("Dispatch {message:?}");
    }
    if let Some(command) = root.update(&message) {
        scheduler.spawn(command);
    }
    matches!(message, Message::Quit)
}
