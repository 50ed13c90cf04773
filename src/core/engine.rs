//! # Engine Interface
//!
//! The conversation engine owns prompts, model calls, token accounting and
//! the set of named conversations. The UI only talks to it through this trait,
//! always behind a [`SharedEngine`] lock, from inside async commands.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Local};

use super::tools::{ToolDefinition, ToolRunner};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordSource {
    Prompt,
    ModelResponse,
    ToolCall,
    ToolOutput,
}

/// One live entry in a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub source: RecordSource,
    pub content: String,
}

impl Record {
    pub fn new(source: RecordSource, content: impl Into<String>) -> Self {
        Self {
            source,
            content: content.into(),
        }
    }
}

/// A row in the history table.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationSummary {
    pub name: String,
    pub live_tokens: usize,
    pub started_at: DateTime<Local>,
    pub last_activity: DateTime<Local>,
}

/// Tool progress reported while a model call is in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    ToolCall {
        name: String,
        arguments: String,
    },
    ToolResult {
        name: String,
        size: usize,
        error: Option<String>,
    },
}

pub type EventSink = Arc<dyn Fn(EngineEvent) + Send + Sync>;

#[derive(Debug)]
pub enum EngineError {
    /// The model provider failed.
    Provider(String),
    /// A conversation name did not resolve.
    UnknownConversation(String),
    /// Nothing to send: the conversation has no pending prompt.
    NothingToSend,
    /// The model asked for tools more times than allowed in one turn.
    ToolRoundsExceeded(usize),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Provider(msg) => write!(f, "{msg}"),
            EngineError::UnknownConversation(name) => write!(f, "no conversation named {name}"),
            EngineError::NothingToSend => write!(f, "no prompt to send"),
            EngineError::ToolRoundsExceeded(n) => {
                write!(f, "gave up after {n} rounds of tool calls")
            }
        }
    }
}

impl std::error::Error for EngineError {}

#[async_trait]
pub trait Engine: Send {
    /// Append a user prompt to the current conversation.
    fn submit_prompt(&mut self, prompt: &str) -> Result<(), EngineError>;

    /// Run the model against the current conversation (including any tool
    /// calls it makes) and return its final text.
    async fn invoke_model(&mut self) -> Result<String, EngineError>;

    /// Make `name` current, creating it if it does not exist.
    fn switch_conversation(&mut self, name: &str) -> Result<(), EngineError>;

    fn current_conversation(&self) -> String;

    fn list_conversations(&self) -> Vec<ConversationSummary>;

    /// Records of the current conversation, oldest first.
    fn live_records(&self) -> Vec<Record>;

    /// Share of the context budget in use, 0.0 to 100.0.
    fn token_usage_percent(&self) -> f64;

    fn register_tool(&mut self, definition: ToolDefinition, runner: Arc<dyn ToolRunner>);

    fn set_event_sink(&mut self, sink: EventSink);
}

pub type SharedEngine = Arc<tokio::sync::Mutex<dyn Engine>>;
