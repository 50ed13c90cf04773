//! OpenAI-compatible provider using the Chat Completions API.
//!
//! Works against api.openai.com and the many servers that mimic
//! `POST {base_url}/chat/completions`. Requests are not streamed; the whole
//! reply (text and/or tool calls) arrives in one response body.

use async_trait::async_trait;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::core::tools::ToolDefinition;
use crate::inference::{
    ChatMessage, Completion, CompletionProvider, CompletionRequest, ProviderError, Role, ToolCall,
};

// ============================================================================
// Chat Completions API Types
// ============================================================================

#[derive(Serialize, Debug)]
struct ApiFunctionCall<'a> {
    name: &'a str,
    arguments: &'a str,
}

#[derive(Serialize, Debug)]
struct ApiToolCall<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    call_type: &'static str, // always "function"
    function: ApiFunctionCall<'a>,
}

#[derive(Serialize, Debug)]
struct ApiMessage<'a> {
    role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<ApiToolCall<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<&'a str>,
}

#[derive(Serialize, Debug)]
struct ApiFunction<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a serde_json::Value,
}

#[derive(Serialize, Debug)]
struct ApiTool<'a> {
    #[serde(rename = "type")]
    tool_type: &'static str,
    function: ApiFunction<'a>,
}

#[derive(Serialize, Debug)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ApiMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ApiTool<'a>>>,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize, Debug)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize, Debug)]
struct ResponseMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ResponseToolCall>,
}

#[derive(Deserialize, Debug)]
struct ResponseToolCall {
    id: String,
    function: ResponseFunction,
}

#[derive(Deserialize, Debug)]
struct ResponseFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Deserialize, Debug)]
struct Usage {
    total_tokens: usize,
}

// ============================================================================
// Translation Layer
// ============================================================================

fn messages_to_api(messages: &[ChatMessage]) -> Vec<ApiMessage<'_>> {
    messages
        .iter()
        .map(|m| ApiMessage {
            role: m.role,
            // Assistant messages that only call tools carry no content.
            content: if m.content.is_empty() && !m.tool_calls.is_empty() {
                None
            } else {
                Some(m.content.as_str())
            },
            tool_calls: m
                .tool_calls
                .iter()
                .map(|tc| ApiToolCall {
                    id: &tc.id,
                    call_type: "function",
                    function: ApiFunctionCall {
                        name: &tc.name,
                        arguments: &tc.arguments,
                    },
                })
                .collect(),
            tool_call_id: m.tool_call_id.as_deref(),
        })
        .collect()
}

/// `None` for an empty list so the field is left out of the body.
fn tools_to_api(tools: &[ToolDefinition]) -> Option<Vec<ApiTool<'_>>> {
    if tools.is_empty() {
        return None;
    }
    Some(
        tools
            .iter()
            .map(|t| ApiTool {
                tool_type: "function",
                function: ApiFunction {
                    name: &t.name,
                    description: &t.description,
                    parameters: &t.parameters,
                },
            })
            .collect(),
    )
}

// ============================================================================
// HTTP
// ============================================================================

pub struct OpenAiProvider {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiProvider {
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: CompletionRequest<'_>) -> Result<Completion, ProviderError> {
        if self.api_key.trim().is_empty() {
            return Err(ProviderError::Config("empty API key".to_string()));
        }

        let body = ChatRequest {
            model: request.model,
            messages: messages_to_api(request.messages),
            tools: tools_to_api(request.tools),
        };

        info!(
            "Chat completions request: model={}, messages={}, tools={}",
            request.model,
            body.messages.len(),
            request.tools.len()
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        debug!("Chat completions response status: {}", response.status());

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let err_body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            warn!("Chat completions API error: {} - {}", status, err_body);
            return Err(ProviderError::Api {
                status,
                message: err_body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        let total_tokens = parsed.usage.map(|u| u.total_tokens);
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Parse("response has no choices".to_string()))?;

        let completion = Completion {
            content: choice.message.content.unwrap_or_default(),
            tool_calls: choice
                .message
                .tool_calls
                .into_iter()
                .map(|tc| ToolCall {
                    id: tc.id,
                    name: tc.function.name,
                    arguments: tc.function.arguments,
                })
                .collect(),
            total_tokens,
        };

        info!(
            "Chat completion: {} content bytes, {} tool calls, tokens={:?}",
            completion.content.len(),
            completion.tool_calls.len(),
            completion.total_tokens
        );
        Ok(completion)
    }
}
