use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use tokio::sync::Mutex;

use ctxagent::core::config::{self, CliOverrides, ResolvedConfig};
use ctxagent::core::engine::{Engine, EngineEvent, SharedEngine};
use ctxagent::core::tools::BuiltinRegistry;
use ctxagent::core::tools::loader::load_tools;
use ctxagent::inference::{Agent, AgentSettings, OpenAiProvider};
use ctxagent::tui::{self, Startup, command::Scheduler, message::Message};

#[derive(Parser)]
#[command(name = "ctxagent", about = "Terminal chat agent with shell tools")]
struct Args {
    /// Conversation to open at startup
    #[arg(long)]
    context: Option<String>,

    /// Tool declaration file (TOML)
    #[arg(long)]
    tools: Option<PathBuf>,

    /// Model name
    #[arg(long)]
    model: Option<String>,

    /// Initial prompt, submitted once the UI is up
    prompt: Vec<String>,
}

fn init_logging() {
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    let path = config::agent_dir()
        .filter(|dir| std::fs::create_dir_all(dir).is_ok())
        .map(|dir| dir.join("ctxagent.log"))
        .unwrap_or_else(|| PathBuf::from("ctxagent.log"));

    if let Ok(log_file) = File::create(&path) {
        let _ = WriteLogger::init(LevelFilter::Debug, log_config, log_file);
    }
}

/// Build the engine and register the declared tools.
fn build_engine(config: &ResolvedConfig) -> Result<Agent, String> {
    let api_key = config.openai_api_key.clone().ok_or_else(|| {
        "no OpenAI API key (set OPENAI_API_KEY or [openai] api_key in the config file)".to_string()
    })?;
    let provider = Arc::new(OpenAiProvider::new(api_key, config.openai_base_url.clone()));

    let mut agent = Agent::new(
        provider,
        AgentSettings {
            model: config.model_name.clone(),
            system_prompt: config.system_prompt.clone(),
            max_context_tokens: config.max_context_tokens,
            max_tool_rounds: config.max_tool_rounds,
        },
    );

    let builtins = BuiltinRegistry::with_defaults();
    let tools = load_tools(&config.tools_file, &builtins).map_err(|e| e.to_string())?;
    log::info!("Loaded {} tools from {}", tools.len(), config.tools_file.display());
    for tool in tools {
        agent.register_tool(tool.definition, tool.runner);
    }
    Ok(agent)
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    dotenv::dotenv().ok();
    init_logging();

    let file_config = match config::load_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("ctxagent: {e}");
            return ExitCode::FAILURE;
        }
    };
    let cli = CliOverrides {
        model: args.model,
        tools_file: args.tools,
    };
    let config = config::resolve(&file_config, &cli);
    log::info!(
        "ctxagent starting: model={}, tools={}",
        config.model_name,
        config.tools_file.display()
    );

    let mut agent = match build_engine(&config) {
        Ok(agent) => agent,
        Err(e) => {
            eprintln!("ctxagent: {e}");
            return ExitCode::FAILURE;
        }
    };

    let (scheduler, rx) = Scheduler::new();
    let sink = scheduler.clone();
    agent.set_event_sink(Arc::new(move |event: EngineEvent| {
        sink.post(Message::Tool(event))
    }));
    let engine: SharedEngine = Arc::new(Mutex::new(agent));

    let startup = Startup {
        context: args.context,
        prompt: (!args.prompt.is_empty()).then(|| args.prompt.join(" ")),
    };

    match tui::run(&config, engine, scheduler, rx, startup).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("UI error: {e}");
            eprintln!("ctxagent: {e}");
            ExitCode::FAILURE
        }
    }
}
