//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::core::engine::SharedEngine;
use crate::inference::{
    Agent, AgentSettings, ChatMessage, Completion, CompletionProvider, CompletionRequest,
    ProviderError, ToolCall,
};

/// A provider that replays canned completions and records what it was sent.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<Completion, ProviderError>>>,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Result<Completion, ProviderError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// A provider that answers every prompt with the same texts, in order.
    pub fn replies(texts: &[&str]) -> Arc<Self> {
        Self::new(
            texts
                .iter()
                .map(|t| {
                    Ok(Completion {
                        content: t.to_string(),
                        ..Default::default()
                    })
                })
                .collect(),
        )
    }

    /// Every request's messages, in the order they were sent.
    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: CompletionRequest<'_>) -> Result<Completion, ProviderError> {
        self.requests.lock().unwrap().push(request.messages.to_vec());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::Network("script exhausted".into())))
    }
}

pub fn tool_call(id: &str, name: &str, arguments: &str) -> ToolCall {
    ToolCall {
        id: id.into(),
        name: name.into(),
        arguments: arguments.into(),
    }
}

/// An agent with a short system prompt and no tools.
pub fn test_agent(provider: Arc<ScriptedProvider>, max_context_tokens: usize) -> Agent {
    Agent::new(
        provider,
        AgentSettings {
            model: "test-model".into(),
            system_prompt: "be brief".into(),
            max_context_tokens,
            max_tool_rounds: 4,
        },
    )
}

/// The same agent behind the lock the UI uses.
pub fn shared_engine(provider: Arc<ScriptedProvider>) -> SharedEngine {
    Arc::new(tokio::sync::Mutex::new(test_agent(provider, 1000)))
}
