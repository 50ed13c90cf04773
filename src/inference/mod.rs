//! # Inference
//!
//! The reference engine: an in-memory [`Agent`] that talks to a model through
//! a [`CompletionProvider`] and runs the tools the model asks for.

pub mod agent;
pub mod provider;
pub mod providers;
pub mod types;

pub use agent::{Agent, AgentSettings};
pub use provider::{CompletionProvider, CompletionRequest, ProviderError};
pub use providers::OpenAiProvider;
pub use types::{ChatMessage, Completion, Role, ToolCall};
