//! Bridge between the bus and the conversation engine.
//!
//! Every engine call happens inside a command, under the engine lock. The lock
//! is held for the whole model call, so a conversation switch issued while a
//! call is in flight waits for it to finish.

use log::{info, warn};

use crate::core::engine::{EngineEvent, Record, RecordSource, SharedEngine};
use crate::core::followup::parse_followups;
use crate::tui::command::Command;
use crate::tui::message::{EntryKind, Message, Screen, TranscriptEntry};

use super::Controller;

pub struct AgentController {
    engine: SharedEngine,
}

impl AgentController {
    pub fn new(engine: SharedEngine) -> Self {
        Self { engine }
    }

    fn call_model(&self, prompt: String) -> Command {
        let engine = self.engine.clone();
        Command::perform(async move {
            let mut engine = engine.lock().await;
            let result = match engine.submit_prompt(&prompt) {
                Ok(()) => engine.invoke_model().await,
                Err(e) => Err(e),
            };
            Some(match result {
                Ok(response) => Message::ModelResponse(response),
                Err(e) => {
                    warn!("Model call failed: {e}");
                    Message::ModelError(e.to_string())
                }
            })
        })
    }

    fn token_usage(&self) -> Command {
        let engine = self.engine.clone();
        Command::perform(async move {
            let engine = engine.lock().await;
            Some(Message::TokenUsage(engine.token_usage_percent()))
        })
    }

    fn refresh_rows(&self) -> Command {
        let engine = self.engine.clone();
        Command::perform(async move {
            let engine = engine.lock().await;
            Some(Message::ConversationRows(engine.list_conversations()))
        })
    }

    fn select(&self, name: String) -> Command {
        let engine = self.engine.clone();
        Command::perform(async move {
            let mut engine = engine.lock().await;
            if let Err(e) = engine.switch_conversation(&name) {
                warn!("Switch to {name} failed: {e}");
                return Some(Message::transcript(EntryKind::Error, format!("Error: {e}\n")));
            }
            info!("Switched to conversation {name}");
            let entries = engine.live_records().iter().map(record_entry).collect();
            Some(Message::ResetTranscript(entries))
        })
    }
}

/// How a stored record reads in the transcript.
pub fn record_entry(record: &Record) -> TranscriptEntry {
    match record.source {
        RecordSource::Prompt => TranscriptEntry::new(EntryKind::Prompt, record.content.clone()),
        RecordSource::ModelResponse => {
            TranscriptEntry::new(EntryKind::Response, format!("{}\n", record.content))
        }
        RecordSource::ToolCall => TranscriptEntry::new(EntryKind::ToolLog, record.content.clone()),
        RecordSource::ToolOutput => {
            TranscriptEntry::new(EntryKind::ToolResponse, record.content.clone())
        }
    }
}

/// Transcript line for a tool progress event.
pub fn tool_entry(event: &EngineEvent) -> TranscriptEntry {
    match event {
        EngineEvent::ToolCall { name, arguments } => {
            TranscriptEntry::new(EntryKind::ToolLog, format!("{name}({arguments})"))
        }
        EngineEvent::ToolResult {
            name,
            error: Some(error),
            ..
        } => TranscriptEntry::new(EntryKind::ToolResponse, format!("{name}: error: {error}")),
        EngineEvent::ToolResult { name, size, .. } => {
            TranscriptEntry::new(EntryKind::ToolResponse, format!("{name}: ({size} bytes)"))
        }
    }
}

impl Controller for AgentController {
    fn name(&self) -> &'static str {
        "agent"
    }

    fn update(&mut self, message: &Message) -> Option<Command> {
        match message {
            Message::PromptSubmitted(prompt) => Command::sequence([
                Some(Command::message(Message::Working(true))),
                Some(self.call_model(prompt.clone())),
                Some(self.token_usage()),
                Some(Command::message(Message::Working(false))),
            ]),
            Message::ModelResponse(response) => {
                let followups = parse_followups(response);
                Command::sequence([
                    Some(Command::message(Message::transcript(
                        EntryKind::Response,
                        format!("{response}\n"),
                    ))),
                    (!followups.is_empty())
                        .then(|| Command::message(Message::ShowFollowups(followups))),
                ])
            }
            Message::ModelError(error) => Some(Command::message(Message::transcript(
                EntryKind::Error,
                format!("{error}\n"),
            ))),
            Message::SelectConversation(name) => Command::sequence([
                Some(self.select(name.clone())),
                Some(self.token_usage()),
                Some(Command::message(Message::SwitchScreen(Screen::Log))),
            ]),
            Message::Init | Message::SwitchScreen(Screen::History) => Some(self.refresh_rows()),
            Message::Tool(event) => Some(Command::message(Message::Transcript(tool_entry(event)))),
            _ => None,
        }
    }
}
