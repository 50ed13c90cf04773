//! # Agent
//!
//! The in-memory conversation engine behind the UI.
//!
//! ```text
//!  submit_prompt ──► [user]
//!  invoke_model  ──► provider ──► text? ──► [assistant] ──► done
//!                        ▲            │
//!                        │       tool calls
//!                        │            ▼
//!                        └──── [tool outputs] (≤ max_tool_rounds)
//! ```
//!
//! Conversations live only as long as the process.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use log::{debug, info, warn};

use crate::core::engine::{
    ConversationSummary, Engine, EngineError, EngineEvent, EventSink, Record,
};
use crate::core::tools::{ToolDefinition, ToolRunner};
use crate::inference::{ChatMessage, CompletionProvider, CompletionRequest, ToolCall};

/// Name of the conversation the agent starts in.
pub const DEFAULT_CONVERSATION: &str = "main";

/// Rough bytes-per-token ratio used when the provider reports no usage.
const BYTES_PER_TOKEN: usize = 4;

struct Conversation {
    name: String,
    messages: Vec<ChatMessage>,
    started_at: DateTime<Local>,
    last_activity: DateTime<Local>,
    live_tokens: usize,
}

impl Conversation {
    fn new(name: &str) -> Self {
        let now = Local::now();
        Self {
            name: name.to_string(),
            messages: Vec::new(),
            started_at: now,
            last_activity: now,
            live_tokens: 0,
        }
    }

    fn estimate_tokens(&self, system_prompt: &str) -> usize {
        let bytes: usize = system_prompt.len()
            + self
                .messages
                .iter()
                .map(|m| {
                    m.content.len()
                        + m.tool_calls
                            .iter()
                            .map(|c| c.name.len() + c.arguments.len())
                            .sum::<usize>()
                })
                .sum::<usize>();
        bytes.div_ceil(BYTES_PER_TOKEN)
    }

    fn touch(&mut self) {
        self.last_activity = Local::now();
    }
}

struct RegisteredTool {
    definition: ToolDefinition,
    runner: Arc<dyn ToolRunner>,
}

pub struct AgentSettings {
    pub model: String,
    pub system_prompt: String,
    pub max_context_tokens: usize,
    pub max_tool_rounds: usize,
}

pub struct Agent {
    provider: Arc<dyn CompletionProvider>,
    settings: AgentSettings,
    conversations: Vec<Conversation>,
    current: usize,
    tools: Vec<RegisteredTool>,
    events: Option<EventSink>,
}

impl Agent {
    pub fn new(provider: Arc<dyn CompletionProvider>, settings: AgentSettings) -> Self {
        info!(
            "Agent: provider={}, model={}, max_context_tokens={}",
            provider.name(),
            settings.model,
            settings.max_context_tokens
        );
        Self {
            provider,
            settings,
            conversations: vec![Conversation::new(DEFAULT_CONVERSATION)],
            current: 0,
            tools: Vec::new(),
            events: None,
        }
    }

    fn conversation(&self) -> &Conversation {
        &self.conversations[self.current]
    }

    fn conversation_mut(&mut self) -> &mut Conversation {
        &mut self.conversations[self.current]
    }

    fn emit(&self, event: EngineEvent) {
        if let Some(sink) = &self.events {
            sink(event);
        }
    }

    /// The full request: system prompt followed by the live conversation.
    fn request_messages(&self) -> Vec<ChatMessage> {
        std::iter::once(ChatMessage::system(&self.settings.system_prompt))
            .chain(self.conversation().messages.iter().cloned())
            .collect()
    }

    async fn run_tool(&self, call: &ToolCall) -> String {
        self.emit(EngineEvent::ToolCall {
            name: call.name.clone(),
            arguments: call.arguments.clone(),
        });

        let result = match self.tools.iter().find(|t| t.definition.name == call.name) {
            Some(tool) => Arc::clone(&tool.runner).run(&call.arguments).await,
            None => Err(crate::core::tools::ToolError::Builtin(format!(
                "unknown tool {}",
                call.name
            ))),
        };

        match result {
            Ok(output) => {
                debug!("Tool {} returned {} bytes", call.name, output.len());
                self.emit(EngineEvent::ToolResult {
                    name: call.name.clone(),
                    size: output.len(),
                    error: None,
                });
                output
            }
            Err(e) => {
                warn!("Tool {} failed: {}", call.name, e);
                self.emit(EngineEvent::ToolResult {
                    name: call.name.clone(),
                    size: 0,
                    error: Some(e.to_string()),
                });
                format!("error: {e}")
            }
        }
    }
}

#[async_trait]
impl Engine for Agent {
    fn submit_prompt(&mut self, prompt: &str) -> Result<(), EngineError> {
        let conversation = self.conversation_mut();
        conversation.messages.push(ChatMessage::user(prompt));
        conversation.touch();
        Ok(())
    }

    async fn invoke_model(&mut self) -> Result<String, EngineError> {
        if self.conversation().messages.is_empty() {
            return Err(EngineError::NothingToSend);
        }

        let definitions: Vec<ToolDefinition> =
            self.tools.iter().map(|t| t.definition.clone()).collect();

        for round in 0..=self.settings.max_tool_rounds {
            let messages = self.request_messages();
            let completion = self
                .provider
                .complete(CompletionRequest {
                    messages: &messages,
                    model: &self.settings.model,
                    tools: &definitions,
                })
                .await
                .map_err(|e| EngineError::Provider(e.to_string()))?;

            let tool_calls = completion.tool_calls;
            let last_round = round == self.settings.max_tool_rounds;
            let system_prompt = self.settings.system_prompt.clone();
            let conversation = self.conversation_mut();
            conversation.touch();

            if tool_calls.is_empty() {
                conversation
                    .messages
                    .push(ChatMessage::assistant(completion.content.clone()));
                let estimate = conversation.estimate_tokens(&system_prompt);
                conversation.live_tokens = completion.total_tokens.unwrap_or(estimate);
                return Ok(completion.content);
            }

            if last_round {
                break;
            }

            let mut message = ChatMessage::tool_calls(tool_calls.clone());
            message.content = completion.content;
            conversation.messages.push(message);

            for call in &tool_calls {
                let output = self.run_tool(call).await;
                self.conversation_mut()
                    .messages
                    .push(ChatMessage::tool_output(&call.id, output));
            }

            let conversation = self.conversation_mut();
            conversation.live_tokens = conversation.estimate_tokens(&system_prompt);
        }

        Err(EngineError::ToolRoundsExceeded(self.settings.max_tool_rounds))
    }

    fn switch_conversation(&mut self, name: &str) -> Result<(), EngineError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EngineError::UnknownConversation(name.to_string()));
        }

        self.current = match self.conversations.iter().position(|c| c.name == name) {
            Some(index) => index,
            None => {
                info!("Creating conversation {}", name);
                self.conversations.push(Conversation::new(name));
                self.conversations.len() - 1
            }
        };
        Ok(())
    }

    fn current_conversation(&self) -> String {
        self.conversation().name.clone()
    }

    fn list_conversations(&self) -> Vec<ConversationSummary> {
        self.conversations
            .iter()
            .map(|c| ConversationSummary {
                name: c.name.clone(),
                live_tokens: c.live_tokens,
                started_at: c.started_at,
                last_activity: c.last_activity,
            })
            .collect()
    }

    fn live_records(&self) -> Vec<Record> {
        self.conversation()
            .messages
            .iter()
            .flat_map(ChatMessage::records)
            .collect()
    }

    fn token_usage_percent(&self) -> f64 {
        let used = self.conversation().live_tokens as f64;
        let budget = self.settings.max_context_tokens.max(1) as f64;
        (used * 100.0 / budget).min(100.0)
    }

    fn register_tool(&mut self, definition: ToolDefinition, runner: Arc<dyn ToolRunner>) {
        info!("Registering tool {}", definition.name);
        self.tools.retain(|t| t.definition.name != definition.name);
        self.tools.push(RegisteredTool { definition, runner });
    }

    fn set_event_sink(&mut self, sink: EventSink) {
        self.events = Some(sink);
    }
}
