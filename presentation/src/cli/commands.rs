//! CLI command definitions

use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for mcp-mediator
#[derive(Parser, Debug)]
#[command(name = "mcp-mediator")]
#[command(author, version, about = "Answer questions with Claude and the tools of an MCP server")]
#[command(long_about = r#"
mcp-mediator connects to an MCP tool server, then answers your questions with
Claude. Whenever the model asks for a tool, the mediator runs it on the server
and hands the result back until the model produces a final answer.

Server locators:
  ./server.py                  Spawned with python3
  ./server.js                  Spawned with node
  https://host/mcp             Streamable HTTP endpoint

Configuration files are loaded from (in priority order):
1. MEDIATOR_* environment variables
2. --config <path>           Explicit config file
3. ./mediator.toml           Project-level config
4. ~/.config/mcp-mediator/config.toml   Global config

Example:
  mcp-mediator ./weather.py
  mcp-mediator ./weather.py --query "Any weather alerts in CA?"
  mcp-mediator https://tools.example.com/mcp --model claude-3-5-haiku-20241022
"#)]
pub struct Cli {
    /// Tool server to connect to (falls back to server.locator from config)
    pub server: Option<String>,

    /// Answer a single query and exit instead of starting the REPL
    #[arg(short = 'Q', long, value_name = "TEXT")]
    pub query: Option<String>,

    /// Anthropic API key (overrides config and environment)
    #[arg(long, value_name = "KEY")]
    pub api_key: Option<String>,

    /// Model to use
    #[arg(short, long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Maximum output tokens per model call
    #[arg(long, value_name = "N")]
    pub max_tokens: Option<u32>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,

    /// Print the default configuration as TOML and exit
    #[arg(long)]
    pub print_default_config: bool,
}
