//! # Root Window
//!
//! Owns every component and the controller chain. Each message passes through
//! [`RootWindow::update`] exactly once:
//!
//! 1. Layout messages (`Resize`, `RegionSize`) are turned into addressed sizes.
//! 2. Keys are routed: an open overlay takes everything, then bound actions,
//!    then the active screen.
//! 3. Content messages update the viewport, history table and modals.
//! 4. The status bar and the controller chain see every message.
//!
//! All commands produced along the way are returned as one batch.

use crossterm::event::KeyEvent;
use log::debug;

use crate::core::config::KeyBindings;
use crate::core::layout::{
    Borders, REGION_BOTTOM, REGION_TOP, REGION_TOP_INNER, ScreenLayout, ViewNode,
};
use crate::core::followup::FollowupOption;

use super::command::Command;
use super::component::{EventHandler, Update};
use super::components::{FollowupModal, HelpModal, History, StatusBar, TextArea, Viewport};
use super::controllers::ControllerChain;
use super::controllers::slash::COMMANDS;
use super::keys::{KeyAction, KeyMap};
use super::message::{Message, Screen};

/// Which region receives arrow keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Top,
    Bottom,
}

pub struct RootWindow {
    pub(super) layout: ScreenLayout,
    pub(super) tree: ViewNode,
    pub(super) bottom: ViewNode,
    pub(super) screen: Screen,
    focus: Focus,
    pub(super) status: StatusBar,
    pub(super) viewport: Viewport,
    pub(super) history: History,
    pub(super) textarea: TextArea,
    pub(super) followup: Option<FollowupModal>,
    last_followups: Vec<FollowupOption>,
    pub(super) help: Option<HelpModal>,
    keymap: KeyMap,
    key_help: Vec<(&'static str, String)>,
    controllers: ControllerChain,
}

impl RootWindow {
    pub fn new(keys: &KeyBindings, controllers: ControllerChain) -> Self {
        let mut root = Self {
            layout: ScreenLayout::default(),
            tree: ViewNode::bordered(
                REGION_TOP,
                Borders::new(false, false, true, false),
                ViewNode::region(REGION_TOP_INNER),
            ),
            bottom: ViewNode::region(REGION_BOTTOM),
            screen: Screen::Log,
            focus: Focus::Bottom,
            status: StatusBar::new(),
            viewport: Viewport::new(),
            history: History::new(),
            textarea: TextArea::new(),
            followup: None,
            last_followups: Vec::new(),
            help: None,
            keymap: KeyMap::new(keys),
            key_help: KeyMap::describe(keys),
            controllers,
        };
        root.set_focus(Focus::Bottom);
        root
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    fn set_focus(&mut self, focus: Focus) {
        self.focus = focus;
        self.viewport.focused = focus == Focus::Top;
        self.history.focused = focus == Focus::Top;
        self.textarea.focused = focus == Focus::Bottom;
    }

    pub fn update(&mut self, message: &Message) -> Option<Command> {
        let mut commands: Vec<Option<Command>> = Vec::new();

        match message {
            Message::Resize { width, height } => {
                if let Some(sizes) = self.layout.resize(*width, *height) {
                    commands.extend(
                        sizes
                            .into_iter()
                            .map(|size| Some(Command::message(Message::RegionSize(size)))),
                    );
                }
            }
            Message::RegionSize(size) => {
                for forwarded in self.tree.apply(size) {
                    commands.push(Some(Command::message(Message::RegionSize(forwarded))));
                }
                self.bottom.apply(size);
                self.viewport.resize(size);
                self.textarea.resize(size);
            }
            Message::Key(key) => commands.push(self.handle_key(message, key)),
            Message::Paste(_) if self.overlay_open() => {}
            Message::Paste(_) => {
                self.textarea.handle_event(message);
            }
            Message::Transcript(entry) => self.viewport.add(entry.clone()),
            Message::ResetTranscript(entries) => self.viewport.reset(entries.clone()),
            Message::ConversationRows(rows) => self.history.set_rows(rows),
            Message::ShowFollowups(options) if !options.is_empty() => {
                self.last_followups = options.clone();
                self.followup = Some(FollowupModal::new(options.clone()));
            }
            Message::FollowupSelected(key) => {
                self.followup = None;
                if !key.is_empty() {
                    commands.push(Some(Command::message(Message::InputSubmit(key.clone()))));
                }
            }
            Message::SwitchScreen(screen) => {
                debug!("Screen -> {screen:?}");
                self.screen = *screen;
                self.set_focus(match screen {
                    Screen::History => Focus::Top,
                    Screen::Log => Focus::Bottom,
                });
            }
            _ => {}
        }

        commands.push(self.status.update(message));
        commands.push(self.controllers.update(message));
        Command::batch(commands)
    }

    fn overlay_open(&self) -> bool {
        self.help.is_some() || self.followup.is_some()
    }

    fn handle_key(&mut self, message: &Message, key: &KeyEvent) -> Option<Command> {
        let action = self.keymap.action(key);
        if action == Some(KeyAction::Quit) {
            return Some(Command::message(Message::Quit));
        }

        if let Some(help) = &mut self.help {
            if help.handle_event(message).is_some() || action == Some(KeyAction::Modal) {
                self.help = None;
            }
            return None;
        }
        if let Some(modal) = &mut self.followup {
            if action == Some(KeyAction::Followup) {
                return Some(Command::message(Message::FollowupSelected(String::new())));
            }
            return modal
                .handle_event(message)
                .map(|key| Command::message(Message::FollowupSelected(key)));
        }

        match action {
            Some(KeyAction::Submit) => {
                return self
                    .textarea
                    .take()
                    .map(|text| Command::message(Message::InputSubmit(text)));
            }
            Some(KeyAction::Switch) => {
                self.set_focus(match self.focus {
                    Focus::Top => Focus::Bottom,
                    Focus::Bottom => Focus::Top,
                });
                return None;
            }
            Some(KeyAction::History) => {
                return Some(Command::message(Message::SwitchScreen(Screen::History)));
            }
            Some(KeyAction::Log) => {
                return Some(Command::message(Message::SwitchScreen(Screen::Log)));
            }
            Some(KeyAction::Modal) => {
                self.help = Some(HelpModal::new(self.key_help.clone(), COMMANDS.to_vec()));
                return None;
            }
            Some(KeyAction::Followup) => {
                if !self.last_followups.is_empty() {
                    self.followup = Some(FollowupModal::new(self.last_followups.clone()));
                }
                return None;
            }
            Some(KeyAction::Quit) | None => {}
        }

        match self.screen {
            Screen::History => self
                .history
                .handle_event(message)
                .map(|name| Command::message(Message::SelectConversation(name))),
            Screen::Log => {
                if self.focus == Focus::Bottom {
                    self.textarea.handle_event(message);
                }
                self.viewport.handle_event(message);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::core::layout::RegionSize;
    use crate::test_support::{ScriptedProvider, shared_engine};
    use crate::tui::controllers::{AgentController, InputController, SlashController};
    use crate::tui::message::EntryKind;
    use crossterm::event::{KeyCode, KeyModifiers};

    fn root() -> RootWindow {
        root_with(ScriptedProvider::replies(&[]))
    }

    fn root_with(provider: std::sync::Arc<ScriptedProvider>) -> RootWindow {
        let engine = shared_engine(provider);
        let chain = ControllerChain::new(vec![
            Box::new(InputController::new()),
            Box::new(AgentController::new(engine.clone())),
            Box::new(SlashController::new(engine)),
        ]);
        RootWindow::new(&KeyBindings::default(), chain)
    }

    fn key(code: KeyCode) -> Message {
        Message::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn ctrl(c: char) -> Message {
        Message::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL))
    }

    /// Dispatch `message` and everything it leads to, breadth first.
    async fn pump(root: &mut RootWindow, message: Message) -> Vec<Message> {
        let mut seen = Vec::new();
        let mut queue = VecDeque::from([message]);
        while let Some(message) = queue.pop_front() {
            if let Some(command) = root.update(&message) {
                queue.extend(command.collect().await);
            }
            seen.push(message);
            assert!(seen.len() < 200, "message storm");
        }
        seen
    }

    async fn type_text(root: &mut RootWindow, text: &str) {
        for c in text.chars() {
            pump(root, key(KeyCode::Char(c))).await;
        }
    }

    #[tokio::test]
    async fn test_resize_reaches_regions() {
        let mut root = root();
        let seen = pump(&mut root, Message::Resize { width: 80, height: 40 }).await;

        let sizes: Vec<&RegionSize> = seen
            .iter()
            .filter_map(|m| match m {
                Message::RegionSize(size) => Some(size),
                _ => None,
            })
            .collect();
        assert!(sizes.contains(&&RegionSize::new(REGION_TOP, 80, 35)));
        assert!(sizes.contains(&&RegionSize::new(REGION_BOTTOM, 80, 4)));
        assert!(sizes.contains(&&RegionSize::new(REGION_TOP_INNER, 80, 34)));
        assert_eq!(root.viewport.wrap_width(), 75);

        // Same size again: nothing to do.
        let again = pump(&mut root, Message::Resize { width: 80, height: 40 }).await;
        assert_eq!(again.len(), 1);
    }

    #[tokio::test]
    async fn test_submit_sends_prompt_and_shows_response() {
        let mut root = root_with(ScriptedProvider::replies(&["pong"]));
        pump(&mut root, Message::Resize { width: 80, height: 40 }).await;
        type_text(&mut root, "ping").await;

        let seen = pump(&mut root, key(KeyCode::Tab)).await;

        assert!(seen.iter().any(|m| matches!(m, Message::InputSubmit(t) if t == "ping")));
        assert_eq!(root.textarea.buffer(), "");
        let texts: Vec<(EntryKind, &str)> = root
            .viewport
            .entries()
            .iter()
            .map(|e| (e.kind, e.text.as_str()))
            .collect();
        assert_eq!(
            texts,
            vec![(EntryKind::Prompt, "ping"), (EntryKind::Response, "pong\n")]
        );
    }

    #[tokio::test]
    async fn test_blank_submit_does_nothing() {
        let mut root = root();
        type_text(&mut root, "   ").await;
        let seen = pump(&mut root, key(KeyCode::Tab)).await;
        assert_eq!(seen.len(), 1);
    }

    #[tokio::test]
    async fn test_followups_open_modal_and_submit_key() {
        let reply = "Pick one <FOLLOWUP>(F1) more detail (F2) stop</FOLLOWUP>";
        let mut root = root_with(ScriptedProvider::replies(&[reply, "ok"]));
        type_text(&mut root, "go").await;
        pump(&mut root, key(KeyCode::Tab)).await;
        assert!(root.followup.is_some());

        // Keys go to the modal, not the text area.
        pump(&mut root, key(KeyCode::Down)).await;
        pump(&mut root, key(KeyCode::Char('x'))).await;
        assert_eq!(root.textarea.buffer(), "");

        let seen = pump(&mut root, key(KeyCode::Enter)).await;
        assert!(root.followup.is_none());
        assert!(seen.iter().any(|m| matches!(m, Message::PromptSubmitted(t) if t == "F2")));

        // The followup key brings the last options back; Esc dismisses.
        pump(&mut root, ctrl('n')).await;
        assert!(root.followup.is_some());
        let seen = pump(&mut root, key(KeyCode::Esc)).await;
        assert!(root.followup.is_none());
        assert!(!seen.iter().any(|m| matches!(m, Message::InputSubmit(_))));
    }

    #[tokio::test]
    async fn test_history_screen_takes_keys() {
        let mut root = root_with(ScriptedProvider::replies(&["hi"]));
        type_text(&mut root, "hello").await;
        pump(&mut root, key(KeyCode::Tab)).await;

        pump(&mut root, ctrl('h')).await;
        assert_eq!(root.screen(), Screen::History);
        assert_eq!(root.focus(), Focus::Top);
        assert_eq!(root.history.rows().len(), 1);

        pump(&mut root, key(KeyCode::Char('z'))).await;
        assert_eq!(root.textarea.buffer(), "");

        let seen = pump(&mut root, key(KeyCode::Enter)).await;
        assert!(seen.iter().any(|m| matches!(m, Message::SelectConversation(n) if n == "main")));
        assert_eq!(root.screen(), Screen::Log);
        assert_eq!(root.focus(), Focus::Bottom);
        assert_eq!(root.viewport.entries().len(), 2);
    }

    #[tokio::test]
    async fn test_switch_focus_and_help() {
        let mut root = root();
        let back_tab = Message::Key(KeyEvent::new(KeyCode::BackTab, KeyModifiers::SHIFT));
        pump(&mut root, back_tab.clone()).await;
        assert_eq!(root.focus(), Focus::Top);
        assert!(!root.textarea.focused);

        pump(&mut root, key(KeyCode::Char('a'))).await;
        assert_eq!(root.textarea.buffer(), "");

        pump(&mut root, back_tab).await;
        pump(&mut root, ctrl('k')).await;
        assert!(root.help.is_some());
        pump(&mut root, key(KeyCode::Char('a'))).await;
        assert_eq!(root.textarea.buffer(), "");
        pump(&mut root, ctrl('k')).await;
        assert!(root.help.is_none());
    }

    #[tokio::test]
    async fn test_quit_wins_over_overlays() {
        let mut root = root();
        pump(&mut root, ctrl('k')).await;
        let seen = pump(&mut root, ctrl('c')).await;
        assert!(matches!(seen.last(), Some(Message::Quit)));
    }
}
