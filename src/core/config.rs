//! # Settings
//!
//! Every setting is resolved from four layers, later ones winning:
//! built-in default, `~/.ctxagent/config.toml`, environment, command line.
//!
//! The file is optional. The first run writes a fully commented template so
//! the available keys can be looked up in place.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

// ============================================================================
// File layer (every field optional)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct AgentConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub openai: OpenAiConfig,
    #[serde(default)]
    pub keys: KeysConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub model: Option<String>,
    pub system_prompt: Option<String>,
    pub max_context_tokens: Option<usize>,
    pub max_tool_rounds: Option<usize>,
    pub tools_file: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

/// Each action maps to a list of key names such as `"ctrl+j"`.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct KeysConfig {
    pub submit: Option<Vec<String>>,
    pub switch: Option<Vec<String>>,
    pub history: Option<Vec<String>>,
    pub log: Option<Vec<String>>,
    pub quit: Option<Vec<String>>,
    pub modal: Option<Vec<String>>,
    pub followup: Option<Vec<String>>,
}

// ============================================================================
// Built-in values
// ============================================================================

pub const DEFAULT_MODEL: &str = "gpt-5-mini";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MAX_CONTEXT_TOKENS: usize = 128_000;
pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 20;
pub const DEFAULT_TOOLS_FILE: &str = "tools.toml";

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant working in a terminal. \
    Use the registered tools when they can answer a question better than you can. \
    When it would help the user, end your reply with up to nine short suggested next steps, \
    written as <FOLLOWUP>(F1) first step (F2) second step</FOLLOWUP>.";

// ============================================================================
// Effective settings
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBindings {
    pub submit: Vec<String>,
    pub switch: Vec<String>,
    pub history: Vec<String>,
    pub log: Vec<String>,
    pub quit: Vec<String>,
    pub modal: Vec<String>,
    pub followup: Vec<String>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let keys = |names: &[&str]| names.iter().map(|n| n.to_string()).collect();
        Self {
            submit: keys(&["tab", "ctrl+j"]),
            switch: keys(&["shift+tab"]),
            history: keys(&["ctrl+h"]),
            log: keys(&["ctrl+l"]),
            quit: keys(&["ctrl+c"]),
            modal: keys(&["ctrl+k"]),
            followup: keys(&["ctrl+n"]),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub model_name: String,
    pub system_prompt: String,
    pub max_context_tokens: usize,
    pub max_tool_rounds: usize,
    pub tools_file: PathBuf,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub keys: KeyBindings,
}

/// Values given on the command line. `None` means not specified.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub model: Option<String>,
    pub tools_file: Option<PathBuf>,
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "cannot read config file: {e}"),
            ConfigError::Parse(e) => write!(f, "invalid config file: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// File layer
// ============================================================================

/// `~/.ctxagent`, home of the config file, tool file and log.
pub fn agent_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".ctxagent"))
}

pub fn config_path() -> Option<PathBuf> {
    agent_dir().map(|d| d.join("config.toml"))
}

/// Read the file layer from [`config_path`]. Without a home directory the
/// layer is empty.
pub fn load_config() -> Result<AgentConfig, ConfigError> {
    let Some(path) = config_path() else {
        warn!("No home directory; config file layer skipped");
        return Ok(AgentConfig::default());
    };
    load_config_from(&path)
}

/// A missing file is written as a template and read as empty; a file that
/// does not parse is an error.
pub fn load_config_from(path: &Path) -> Result<AgentConfig, ConfigError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("Writing config template to {}", path.display());
            write_template(path);
            return Ok(AgentConfig::default());
        }
        Err(e) => return Err(ConfigError::Io(e)),
    };

    let config: AgentConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Read config file {}", path.display());
    debug!("{config:?}");
    Ok(config)
}

fn write_template(path: &Path) {
    let template = r#"# ctxagent settings. Uncomment a line to change it.
# Precedence: built-in < this file < environment < command line.

# [general]
# model = "gpt-5-mini"                 # Or set CTXAGENT_MODEL
# system_prompt = "You are a helpful assistant."
# max_context_tokens = 128000
# max_tool_rounds = 20
# tools_file = "tools.toml"            # Relative to ~/.ctxagent/

# [openai]
# api_key = "sk-..."                   # Or set OPENAI_API_KEY
# base_url = "https://api.openai.com/v1"

# [keys]
# submit = ["tab", "ctrl+j"]
# switch = ["shift+tab"]
# history = ["ctrl+h"]
# log = ["ctrl+l"]
# quit = ["ctrl+c"]
# modal = ["ctrl+k"]
# followup = ["ctrl+n"]
"#;

    let written = path
        .parent()
        .map_or(Ok(()), fs::create_dir_all)
        .and_then(|()| fs::write(path, template));
    if let Err(e) = written {
        warn!("Config template not written to {}: {e}", path.display());
    }
}

// ============================================================================
// Layering
// ============================================================================

/// Merge the file layer with the process environment and `cli`.
pub fn resolve(config: &AgentConfig, cli: &CliOverrides) -> ResolvedConfig {
    resolve_with_env(config, cli, |name| std::env::var(name).ok())
}

/// [`resolve`] with an explicit environment lookup.
pub fn resolve_with_env(
    config: &AgentConfig,
    cli: &CliOverrides,
    env: impl Fn(&str) -> Option<String>,
) -> ResolvedConfig {
    // Model: CLI → env → config → default
    let model_name = cli
        .model
        .clone()
        .or_else(|| env("CTXAGENT_MODEL"))
        .or_else(|| config.general.model.clone())
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());

    // API key: env → config
    let openai_api_key = env("OPENAI_API_KEY")
        .filter(|k| !k.is_empty())
        .or_else(|| config.openai.api_key.clone());

    // Base URL: env → config → default
    let openai_base_url = env("OPENAI_BASE_URL")
        .or_else(|| config.openai.base_url.clone())
        .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string());

    // Tools file: CLI → config (relative to ~/.ctxagent/) → default
    let tools_file = cli.tools_file.clone().unwrap_or_else(|| {
        let name = config
            .general
            .tools_file
            .as_deref()
            .unwrap_or(DEFAULT_TOOLS_FILE);
        match agent_dir() {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        }
    });

    ResolvedConfig {
        model_name,
        system_prompt: config
            .general
            .system_prompt
            .clone()
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
        max_context_tokens: config
            .general
            .max_context_tokens
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_MAX_CONTEXT_TOKENS),
        max_tool_rounds: config
            .general
            .max_tool_rounds
            .unwrap_or(DEFAULT_MAX_TOOL_ROUNDS),
        tools_file,
        openai_api_key,
        openai_base_url,
        keys: resolve_keys(&config.keys),
    }
}

fn resolve_keys(keys: &KeysConfig) -> KeyBindings {
    let defaults = KeyBindings::default();
    let pick = |configured: &Option<Vec<String>>, default: Vec<String>| {
        configured.clone().unwrap_or(default)
    };

    KeyBindings {
        submit: pick(&keys.submit, defaults.submit),
        switch: pick(&keys.switch, defaults.switch),
        history: pick(&keys.history, defaults.history),
        log: pick(&keys.log, defaults.log),
        quit: pick(&keys.quit, defaults.quit),
        modal: pick(&keys.modal, defaults.modal),
        followup: pick(&keys.followup, defaults.followup),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_empty_layers_give_builtins() {
        let resolved = resolve_with_env(&AgentConfig::default(), &CliOverrides::default(), no_env);
        assert_eq!(resolved.model_name, DEFAULT_MODEL);
        assert_eq!(resolved.max_tool_rounds, DEFAULT_MAX_TOOL_ROUNDS);
        assert_eq!(resolved.max_context_tokens, DEFAULT_MAX_CONTEXT_TOKENS);
        assert_eq!(resolved.openai_base_url, DEFAULT_OPENAI_BASE_URL);
        assert!(resolved.openai_api_key.is_none());
        assert!(resolved.tools_file.ends_with(DEFAULT_TOOLS_FILE));
        assert_eq!(resolved.keys, KeyBindings::default());
        assert!(resolved.system_prompt.contains("<FOLLOWUP>"));
    }

    #[test]
    fn test_override_hierarchy() {
        let config = AgentConfig {
            general: GeneralConfig {
                model: Some("from-file".to_string()),
                ..Default::default()
            },
            openai: OpenAiConfig {
                api_key: Some("file-key".to_string()),
                base_url: Some("http://file".to_string()),
            },
            ..Default::default()
        };
        let env = |name: &str| match name {
            "CTXAGENT_MODEL" => Some("from-env".to_string()),
            "OPENAI_API_KEY" => Some("env-key".to_string()),
            _ => None,
        };

        let resolved = resolve_with_env(&config, &CliOverrides::default(), env);
        assert_eq!(resolved.model_name, "from-env");
        assert_eq!(resolved.openai_api_key.as_deref(), Some("env-key"));
        assert_eq!(resolved.openai_base_url, "http://file");

        let cli = CliOverrides {
            model: Some("from-cli".to_string()),
            tools_file: Some(PathBuf::from("/tmp/t.toml")),
        };
        let resolved = resolve_with_env(&config, &cli, env);
        assert_eq!(resolved.model_name, "from-cli");
        assert_eq!(resolved.tools_file, PathBuf::from("/tmp/t.toml"));
    }

    #[test]
    fn test_partial_file() {
        let toml_str = r#"
[general]
model = "my-model"

[keys]
quit = ["ctrl+q"]
"#;
        let config: AgentConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.model.as_deref(), Some("my-model"));
        assert!(config.general.max_tool_rounds.is_none());
        assert!(config.openai.api_key.is_none());

        let resolved = resolve_with_env(&config, &CliOverrides::default(), no_env);
        assert_eq!(resolved.keys.quit, vec!["ctrl+q"]);
        assert_eq!(resolved.keys.submit, vec!["tab", "ctrl+j"]);
    }

    #[test]
    fn test_missing_file_generates_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = load_config_from(&path).unwrap();
        assert!(config.general.model.is_none());

        // Template is comments only.
        let generated = fs::read_to_string(&path).unwrap();
        assert!(generated.contains("# [keys]"));
        assert!(load_config_from(&path).unwrap().general.model.is_none());
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[general\nmodel = ").unwrap();

        assert!(matches!(load_config_from(&path), Err(ConfigError::Parse(_))));
    }
}
