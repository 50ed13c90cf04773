use std::io::Write;
use std::sync::{Arc, Mutex};

use ctxagent::core::engine::{Engine, EngineEvent, RecordSource};
use ctxagent::core::tools::BuiltinRegistry;
use ctxagent::core::tools::loader::load_tools;
use ctxagent::inference::{
    Agent, AgentSettings, ChatMessage, CompletionProvider, CompletionRequest, OpenAiProvider,
    ProviderError,
};
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, header, method, path},
};

// ============================================================================
// Helper Functions
// ============================================================================

fn text_reply(content: &str, total_tokens: usize) -> serde_json::Value {
    json!({
        "choices": [{ "message": { "role": "assistant", "content": content } }],
        "usage": { "total_tokens": total_tokens }
    })
}

fn tool_reply(id: &str, name: &str, arguments: &str) -> serde_json::Value {
    json!({
        "choices": [{
            "message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": id,
                    "type": "function",
                    "function": { "name": name, "arguments": arguments }
                }]
            }
        }]
    })
}

async fn complete(
    provider: &OpenAiProvider,
    messages: &[ChatMessage],
) -> Result<ctxagent::inference::Completion, ProviderError> {
    provider
        .complete(CompletionRequest {
            messages,
            model: "test-model",
            tools: &[],
        })
        .await
}

// ============================================================================
// OpenAI Provider Tests
// ============================================================================

#[tokio::test]
async fn test_openai_text_completion() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({ "model": "test-model" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_reply("Hello world", 42)))
        .expect(1)
        .mount(&mock_server)
        .await;

    // Trailing slash is tolerated.
    let provider = OpenAiProvider::new("test-key".into(), format!("{}/", mock_server.uri()));
    let completion = complete(&provider, &[ChatMessage::user("Hello")])
        .await
        .unwrap();

    assert_eq!(completion.content, "Hello world");
    assert!(completion.tool_calls.is_empty());
    assert_eq!(completion.total_tokens, Some(42));
}

#[tokio::test]
async fn test_openai_tool_call_completion() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(tool_reply("call_1", "ls", r#"{"dir":"."}"#)),
        )
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new("test-key".into(), mock_server.uri());
    let completion = complete(&provider, &[ChatMessage::user("list")])
        .await
        .unwrap();

    assert_eq!(completion.content, "");
    assert_eq!(completion.tool_calls.len(), 1);
    assert_eq!(completion.tool_calls[0].id, "call_1");
    assert_eq!(completion.tool_calls[0].name, "ls");
    assert_eq!(completion.tool_calls[0].arguments, r#"{"dir":"."}"#);
    assert_eq!(completion.total_tokens, None);
}

#[tokio::test]
async fn test_openai_api_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new("wrong".into(), mock_server.uri());
    let err = complete(&provider, &[ChatMessage::user("Hello")])
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ProviderError::Api { status: 401, ref message } if message == "bad key"
    ));
}

#[tokio::test]
async fn test_openai_malformed_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new("test-key".into(), mock_server.uri());
    let err = complete(&provider, &[ChatMessage::user("Hello")])
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Parse(_)));

    let empty = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&empty)
        .await;
    let provider = OpenAiProvider::new("test-key".into(), empty.uri());
    let err = complete(&provider, &[ChatMessage::user("Hello")])
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Parse(ref m) if m.contains("no choices")));
}

#[tokio::test]
async fn test_openai_connection_refused() {
    // Port 9 (discard) is almost never listening.
    let provider = OpenAiProvider::new("test-key".into(), "http://127.0.0.1:9".into());
    let err = complete(&provider, &[ChatMessage::user("Hello")])
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Network(_)));
}

#[tokio::test]
async fn test_openai_empty_key_is_config_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_reply("unused", 1)))
        .expect(0)
        .mount(&mock_server)
        .await;

    let provider = OpenAiProvider::new("  ".into(), mock_server.uri());
    let err = complete(&provider, &[ChatMessage::user("Hello")])
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Config(_)));
}

// ============================================================================
// Agent + Provider + Tools
// ============================================================================

#[tokio::test]
async fn test_agent_runs_declared_tool_between_model_calls() {
    let mock_server = MockServer::start().await;

    // First call asks for the tool; the second sees its output and answers.
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(tool_reply("call_1", "say", r#"{"message":"hey"}"#)),
        )
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({
            "messages": [{ "role": "system" }, { "role": "user" }, { "role": "assistant" }, {
                "role": "tool",
                "tool_call_id": "call_1",
                "content": "hey\n"
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_reply("It said hey.", 120)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut tools_file = tempfile::NamedTempFile::new().unwrap();
    write!(
        tools_file,
        r#"
[[tool]]
name = "say"
description = "echo a message"
command = "echo {{message}}"
parameters = {{ message = {{ required = true }} }}
"#
    )
    .unwrap();

    let provider = Arc::new(OpenAiProvider::new("test-key".into(), mock_server.uri()));
    let mut agent = Agent::new(
        provider,
        AgentSettings {
            model: "test-model".into(),
            system_prompt: "be brief".into(),
            max_context_tokens: 1000,
            max_tool_rounds: 4,
        },
    );
    for tool in load_tools(tools_file.path(), &BuiltinRegistry::new()).unwrap() {
        agent.register_tool(tool.definition, tool.runner);
    }

    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    agent.set_event_sink(Arc::new(move |event: EngineEvent| {
        sink.lock().unwrap().push(event)
    }));

    agent.submit_prompt("what does say say?").unwrap();
    let answer = agent.invoke_model().await.unwrap();

    assert_eq!(answer, "It said hey.");
    let sources: Vec<RecordSource> = agent.live_records().iter().map(|r| r.source).collect();
    assert_eq!(
        sources,
        vec![
            RecordSource::Prompt,
            RecordSource::ToolCall,
            RecordSource::ToolOutput,
            RecordSource::ModelResponse,
        ]
    );
    assert!((agent.token_usage_percent() - 12.0).abs() < f64::EPSILON);

    let events = events.lock().unwrap();
    assert!(matches!(
        events.as_slice(),
        [
            EngineEvent::ToolCall { name, .. },
            EngineEvent::ToolResult { error: None, .. },
        ] if name == "say"
    ));
}
