//! # Messages
//!
//! Everything that happens reaches the UI as a [`Message`]: terminal input,
//! layout changes, and the results of async commands. The dispatch loop hands
//! each one to [`RootWindow::update`](super::root::RootWindow::update) exactly
//! once.

use crossterm::event::KeyEvent;

use crate::core::engine::{ConversationSummary, EngineEvent};
use crate::core::followup::FollowupOption;
use crate::core::layout::RegionSize;

/// How a transcript entry is styled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Prompt,
    Response,
    ToolLog,
    ToolResponse,
    Error,
    SlashResult,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub kind: EntryKind,
    pub text: String,
}

impl TranscriptEntry {
    pub fn new(kind: EntryKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// Which view fills the top box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    Log,
    History,
}

#[derive(Debug, Clone)]
pub enum Message {
    /// Posted once before anything else.
    Init,
    Key(KeyEvent),
    Paste(String),
    /// Terminal resized.
    Resize { width: u16, height: u16 },
    /// A size addressed to one region id.
    RegionSize(RegionSize),
    /// Text the user submitted (or a followup key they picked).
    InputSubmit(String),
    /// A prompt to send to the model.
    PromptSubmitted(String),
    Transcript(TranscriptEntry),
    ResetTranscript(Vec<TranscriptEntry>),
    ModelResponse(String),
    ModelError(String),
    Working(bool),
    Tool(EngineEvent),
    /// Context usage, 0.0 to 100.0.
    TokenUsage(f64),
    SwitchScreen(Screen),
    SelectConversation(String),
    ConversationRows(Vec<ConversationSummary>),
    ShowFollowups(Vec<FollowupOption>),
    /// The modal closed. Empty means dismissed without a choice.
    FollowupSelected(String),
    /// A `/command` split into words.
    SlashCommand(Vec<String>),
    SpinnerTick,
    Quit,
}

impl Message {
    pub fn transcript(kind: EntryKind, text: impl Into<String>) -> Self {
        Message::Transcript(TranscriptEntry::new(kind, text))
    }
}
