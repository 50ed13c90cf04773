use serde::{Deserialize, Serialize};

use crate::core::engine::{Record, RecordSource};

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCall {
    /// Correlation id; the tool's output must echo it back.
    pub id: String,
    pub name: String,
    /// Raw JSON arguments as the model produced them.
    pub arguments: String,
}

impl ToolCall {
    /// `name(arguments)`, the form shown in the transcript.
    pub fn display(&self) -> String {
        format!("{}({})", self.name, self.arguments)
    }
}

/// One message of the conversation as the model sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    /// Set on assistant messages that call tools.
    pub tool_calls: Vec<ToolCall>,
    /// Set on tool messages.
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self::text(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::text(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::text(Role::Assistant, content)
    }

    pub fn tool_calls(calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content: String::new(),
            tool_calls: calls,
            tool_call_id: None,
        }
    }

    pub fn tool_output(call_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: output.into(),
            tool_calls: Vec::new(),
            tool_call_id: Some(call_id.into()),
        }
    }

    fn text(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// The transcript records this message contributes.
    pub fn records(&self) -> Vec<Record> {
        match self.role {
            Role::System => Vec::new(),
            Role::User => vec![Record::new(RecordSource::Prompt, &self.content)],
            Role::Tool => vec![Record::new(RecordSource::ToolOutput, &self.content)],
            Role::Assistant => {
                let mut records = Vec::new();
                if !self.content.is_empty() {
                    records.push(Record::new(RecordSource::ModelResponse, &self.content));
                }
                records.extend(
                    self.tool_calls
                        .iter()
                        .map(|call| Record::new(RecordSource::ToolCall, call.display())),
                );
                records
            }
        }
    }
}

/// The model's answer to one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
    /// Prompt plus completion tokens, when the provider reports usage.
    pub total_tokens: Option<usize>,
}
