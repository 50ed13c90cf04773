//! # Tools
//!
//! Tools the model can call. Most are external commands described by a
//! declaration file; a few are builtins implemented in Rust.
//!
//! - [`template`]: compiles a command template plus JSON arguments into argv
//!   and runs it
//! - [`loader`]: reads `[[tool]]` declarations and resolves builtins
//! - [`todo`]: the `todo` builtin
//!
//! Every tool reaches the engine as a [`ToolDefinition`] (what the model sees)
//! and a [`ToolRunner`] (what runs when the model calls it).

pub mod loader;
pub mod template;
pub mod todo;

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

// ── Parameters ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    String,
    Number,
}

impl ParameterType {
    /// Parse a declared type. An absent or empty type means `string`.
    pub fn parse(kind: Option<&str>) -> Option<Self> {
        match kind.unwrap_or("") {
            "" | "string" => Some(ParameterType::String),
            "number" => Some(ParameterType::Number),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterType::String => "string",
            ParameterType::Number => "number",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolParameter {
    pub kind: ParameterType,
    pub description: String,
    pub required: bool,
}

/// Parameters keyed by name. Sorted so validation order is stable.
pub type Parameters = BTreeMap<String, ToolParameter>;

/// A declared external-command tool, immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolTemplate {
    pub name: String,
    pub description: String,
    pub command: String,
    pub parameters: Parameters,
}

/// What the model is told about a tool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON schema of the arguments object.
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    pub fn new(name: &str, description: &str, parameters: &Parameters) -> Self {
        Self {
            name: name.to_string(),
            description: description.trim().to_string(),
            parameters: parameter_schema(parameters),
        }
    }
}

/// Build the JSON schema object for a parameter table.
pub fn parameter_schema(parameters: &Parameters) -> serde_json::Value {
    let mut properties = serde_json::Map::new();
    let mut required = Vec::new();

    for (name, param) in parameters {
        properties.insert(
            name.clone(),
            serde_json::json!({
                "type": param.kind.as_str(),
                "description": param.description,
            }),
        );
        if param.required {
            required.push(serde_json::Value::String(name.clone()));
        }
    }

    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

// ── Errors ──────────────────────────────────────────────────────────────────

/// Failures while compiling or running a tool.
///
/// These are ordinary outcomes: the engine hands the rendered error back to
/// the model as the tool's result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    /// The arguments were not a JSON object.
    InvalidArguments(String),
    /// A required parameter was absent or null.
    MissingParameter(String),
    /// The template compiled to nothing.
    EmptyCommand,
    /// The program could not be started.
    Launch { program: String, message: String },
    /// The program ran and exited unsuccessfully.
    Failed { status: String, output: String },
    /// A builtin rejected its input.
    Builtin(String),
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolError::InvalidArguments(msg) => write!(f, "failed to parse arguments: {msg}"),
            ToolError::MissingParameter(name) => {
                write!(f, "required parameter {name} not provided")
            }
            ToolError::EmptyCommand => write!(f, "empty command"),
            ToolError::Launch { program, message } => {
                write!(f, "command failed: {program}: {message}")
            }
            ToolError::Failed { status, output } => {
                write!(f, "command failed: {status}\nOutput: {output}")
            }
            ToolError::Builtin(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ToolError {}

// ── Runners ─────────────────────────────────────────────────────────────────

/// Executes one tool call. `arguments` is the raw JSON the model produced.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    async fn run(&self, arguments: &str) -> Result<String, ToolError>;
}

/// Decode a model-supplied argument string into a JSON object.
///
/// Models sometimes send an empty string for a call without arguments; that
/// is treated as `{}`.
pub fn decode_arguments(arguments: &str) -> Result<serde_json::Map<String, serde_json::Value>, ToolError> {
    if arguments.trim().is_empty() {
        return Ok(serde_json::Map::new());
    }

    match serde_json::from_str::<serde_json::Value>(arguments) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(other) => Err(ToolError::InvalidArguments(format!(
            "expected an object, got {other}"
        ))),
        Err(e) => Err(ToolError::InvalidArguments(e.to_string())),
    }
}

// ── Builtins ────────────────────────────────────────────────────────────────

/// A tool implemented in-process. The declaration is TOML in the same shape
/// as a `[[tool]]` table.
#[derive(Clone)]
pub struct BuiltinTool {
    pub declaration: &'static str,
    pub runner: Arc<dyn ToolRunner>,
}

/// The builtins a declaration file may reference with `builtin = true`.
///
/// Built once at startup and handed to the loader.
#[derive(Clone, Default)]
pub struct BuiltinRegistry {
    tools: HashMap<String, BuiltinTool>,
}

impl BuiltinRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every builtin this crate ships.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(todo::NAME, todo::DECLARATION, Arc::new(todo::Todo::default()));
        registry
    }

    pub fn register(&mut self, name: &str, declaration: &'static str, runner: Arc<dyn ToolRunner>) {
        self.tools.insert(
            name.to_string(),
            BuiltinTool {
                declaration,
                runner,
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<&BuiltinTool> {
        self.tools.get(name)
    }
}
