//! # Tool Loader
//!
//! Reads the tool declaration file:
//!
//! ```toml
//! [[tool]]
//! name = "grep"
//! description = "Search files for a pattern"
//! command = "grep -rn [-m {max}] {pattern} {path}"
//!
//! [tool.parameters]
//! pattern = { type = "string", description = "regex", required = true }
//! path = { description = "where to look", required = true }
//! max = { type = "number", description = "stop after N matches" }
//!
//! [[tool]]
//! name = "todo"
//! builtin = true
//!
//! [[tool]]
//! info_command = "my-tool --describe"
//! ```
//!
//! A missing file means no tools. Every other problem is fatal at startup.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;

use super::template::TemplateTool;
use super::{
    BuiltinRegistry, ParameterType, Parameters, ToolDefinition, ToolParameter, ToolRunner,
    ToolTemplate,
};

#[derive(Debug)]
pub enum LoadError {
    Io { path: PathBuf, message: String },
    Parse { path: PathBuf, message: String },
    InfoCommand { command: String, message: String },
    EmptyName,
    InvalidName(String),
    MissingDescription(String),
    MissingCommand(String),
    UnknownParameterType { tool: String, kind: String },
    UnknownBuiltin(String),
    BuiltinDeclaration { name: String, message: String },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io { path, message } => {
                write!(f, "read tool config {}: {message}", path.display())
            }
            LoadError::Parse { path, message } => {
                write!(f, "parse tool config {}: {message}", path.display())
            }
            LoadError::InfoCommand { command, message } => {
                write!(f, "parse tool info from \"{command}\": {message}")
            }
            LoadError::EmptyName => write!(f, "tool name cannot be empty"),
            LoadError::InvalidName(name) => write!(
                f,
                "tool name '{name}' contains invalid characters, must match [a-zA-Z0-9_-]"
            ),
            LoadError::MissingDescription(name) => {
                write!(f, "tool '{name}' must have a description")
            }
            LoadError::MissingCommand(name) => write!(f, "tool '{name}' must have a command"),
            LoadError::UnknownParameterType { tool, kind } => {
                write!(f, "unknown parameter type \"{kind}\" for {tool}")
            }
            LoadError::UnknownBuiltin(name) => write!(f, "builtin {name}: not found"),
            LoadError::BuiltinDeclaration { name, message } => {
                write!(f, "parse builtin tool description for {name}: {message}")
            }
        }
    }
}

impl std::error::Error for LoadError {}

#[derive(Debug, Default, Deserialize)]
struct ToolsFile {
    #[serde(default)]
    tool: Vec<ToolDeclaration>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ParameterDeclaration {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub description: String,
    pub required: bool,
}

/// One `[[tool]]` table as written.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    pub command: String,
    pub info_command: String,
    pub builtin: bool,
    pub parameters: BTreeMap<String, ParameterDeclaration>,
}

impl ToolDeclaration {
    fn validate(&self) -> Result<(), LoadError> {
        if self.name.is_empty() {
            return Err(LoadError::EmptyName);
        }
        if !self
            .name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(LoadError::InvalidName(self.name.clone()));
        }
        if self.description.is_empty() && !self.builtin {
            return Err(LoadError::MissingDescription(self.name.clone()));
        }
        if self.command.is_empty() && !self.builtin {
            return Err(LoadError::MissingCommand(self.name.clone()));
        }
        Ok(())
    }

    /// Typed parameters. Unknown types are an error; absent types are strings.
    pub fn typed_parameters(&self) -> Result<Parameters, LoadError> {
        self.parameters
            .iter()
            .map(|(name, decl)| {
                let kind = ParameterType::parse(decl.kind.as_deref()).ok_or_else(|| {
                    LoadError::UnknownParameterType {
                        tool: self.name.clone(),
                        kind: decl.kind.clone().unwrap_or_default(),
                    }
                })?;
                Ok((
                    name.clone(),
                    ToolParameter {
                        kind,
                        description: decl.description.clone(),
                        required: decl.required,
                    },
                ))
            })
            .collect()
    }
}

/// A tool ready to register with the engine.
pub struct LoadedTool {
    pub definition: ToolDefinition,
    pub runner: Arc<dyn ToolRunner>,
}

/// Read and validate declarations. `info_command` entries are replaced by the
/// declaration their command prints.
pub fn load_declarations(path: &Path) -> Result<Vec<ToolDeclaration>, LoadError> {
    if !path.exists() {
        log::info!("No tool config at {}", path.display());
        return Ok(Vec::new());
    }

    let content = std::fs::read_to_string(path).map_err(|e| LoadError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let file: ToolsFile = toml::from_str(&content).map_err(|e| LoadError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut declarations = Vec::with_capacity(file.tool.len());
    for declaration in file.tool {
        let declaration = if declaration.info_command.is_empty() {
            declaration
        } else {
            declaration_from_info_command(&declaration.info_command)?
        };
        declaration.validate()?;
        declarations.push(declaration);
    }

    Ok(declarations)
}

fn declaration_from_info_command(command: &str) -> Result<ToolDeclaration, LoadError> {
    let info_error = |message: String| LoadError::InfoCommand {
        command: command.to_string(),
        message,
    };

    let parts: Vec<&str> = command.split_whitespace().collect();
    let Some((program, args)) = parts.split_first() else {
        return Err(info_error("empty command".into()));
    };

    let output = std::process::Command::new(program)
        .args(args)
        .output()
        .map_err(|e| info_error(e.to_string()))?;
    let stdout = String::from_utf8_lossy(&output.stdout);

    if !output.status.success() {
        return Err(info_error(format!(
            "command failed: {}\nOutput: {stdout}",
            output.status
        )));
    }

    toml::from_str(&stdout).map_err(|e| info_error(format!("{e}\nOutput: {stdout}")))
}

/// Load every declared tool, resolving builtins through `builtins`.
pub fn load_tools(path: &Path, builtins: &BuiltinRegistry) -> Result<Vec<LoadedTool>, LoadError> {
    let mut tools = Vec::new();

    for declaration in load_declarations(path)? {
        let tool = if declaration.builtin {
            load_builtin(&declaration.name, builtins)?
        } else {
            let template = ToolTemplate {
                parameters: declaration.typed_parameters()?,
                name: declaration.name,
                description: declaration.description,
                command: declaration.command,
            };
            LoadedTool {
                definition: ToolDefinition::new(
                    &template.name,
                    &template.description,
                    &template.parameters,
                ),
                runner: Arc::new(TemplateTool::new(&template)),
            }
        };

        log::info!("Loaded tool: {}", tool.definition.name);
        tools.push(tool);
    }

    Ok(tools)
}

fn load_builtin(name: &str, builtins: &BuiltinRegistry) -> Result<LoadedTool, LoadError> {
    let builtin = builtins
        .get(name)
        .ok_or_else(|| LoadError::UnknownBuiltin(name.to_string()))?;

    let declaration: ToolDeclaration =
        toml::from_str(builtin.declaration).map_err(|e| LoadError::BuiltinDeclaration {
            name: name.to_string(),
            message: e.to_string(),
        })?;
    let parameters = declaration.typed_parameters()?;

    Ok(LoadedTool {
        definition: ToolDefinition::new(&declaration.name, &declaration.description, &parameters),
        runner: Arc::clone(&builtin.runner),
    })
}
