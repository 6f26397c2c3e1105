//! CLI entrypoint for mcp-mediator
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use mediator_application::MediatorClient;
use mediator_infrastructure::{
    AnthropicGateway, ConfigLoader, FileConfig, FileLoggingConfig, JsonlConversationLogger,
    McpConnector,
};
use mediator_presentation::{ChatRepl, Cli, ConsoleFormatter, ProgressMode, answer_query};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // .env must be loaded before the credential is resolved
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    if cli.print_default_config {
        print!("{}", FileConfig::default_toml()?);
        return Ok(ExitCode::SUCCESS);
    }
    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_deref());
        return Ok(ExitCode::SUCCESS);
    }

    let mut config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref())?
    };
    config.apply_cli_overrides(cli.model.as_deref(), cli.max_tokens);
    config.validate()?;

    let _log_guard = init_logging(cli.verbose, &config.logging)?;
    info!("Starting mcp-mediator");

    let api_key = config.resolve_api_key(cli.api_key.as_deref())?;

    let Some(server) = cli.server.clone().or_else(|| config.server.locator.clone()) else {
        bail!("No tool server given. Usage: mcp-mediator <path_to_server_script | url>");
    };

    // === Dependency Injection ===
    let gateway = AnthropicGateway::with_endpoint(
        api_key,
        &config.model.base_url,
        config.model.api_version.clone(),
        Duration::from_secs(config.model.request_timeout_seconds),
    )?;
    let transport = McpConnector::new().with_server_env(config.server.env.clone());

    let mut client = MediatorClient::new(
        Arc::new(gateway),
        Box::new(transport),
        config.to_mediator_config(),
    );
    if let Some(path) = &config.logging.conversation_log {
        match JsonlConversationLogger::new(path) {
            Some(logger) => client = client.with_conversation_logger(Arc::new(logger)),
            None => warn!("Conversation logging disabled"),
        }
    }

    let progress = if cli.quiet {
        ProgressMode::Off
    } else {
        ProgressMode::Auto
    };

    let outcome = run(&mut client, &server, cli.query.as_deref(), progress).await;
    client.cleanup().await;

    match outcome {
        Ok(code) => Ok(code),
        Err(e) => {
            eprintln!("{}", ConsoleFormatter::format_error(&format!("{:#}", e)));
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Connect, then answer one query or hand over to the REPL.
async fn run(
    client: &mut MediatorClient,
    server: &str,
    query: Option<&str>,
    progress: ProgressMode,
) -> Result<ExitCode> {
    let catalog = client
        .connect(server)
        .await
        .with_context(|| format!("could not connect to {}", server))?;

    if query.is_none() {
        println!("{}", ConsoleFormatter::format_connected(server, &catalog));
    }

    match query {
        Some(query) => match answer_query(client, query, progress).await {
            Ok(answer) => {
                println!("{}", ConsoleFormatter::format_answer(&answer));
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => {
                eprintln!("{}", ConsoleFormatter::format_error(&e));
                Ok(ExitCode::FAILURE)
            }
        },
        None => {
            ChatRepl::new(client).with_progress(progress).run().await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Install the diagnostic subscriber.
///
/// `RUST_LOG` wins when set. Otherwise the level comes from `-v` count, with
/// `logging.debug` raising the floor to `debug`. The returned guard must be
/// held until exit so the file writer flushes.
fn init_logging(verbose: u8, logging: &FileLoggingConfig) -> Result<Option<WorkerGuard>> {
    let level = match verbose {
        0 if logging.debug => "debug",
        1 if logging.debug => "debug",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let Some(path) = &logging.file else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
        return Ok(None);
    };

    let file_name = path
        .file_name()
        .with_context(|| format!("logging.file has no file name: {}", path.display()))?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| std::path::Path::new("."));
    std::fs::create_dir_all(dir)
        .with_context(|| format!("could not create log directory {}", dir.display()))?;

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(
        dir, file_name,
    ));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(writer)
        .init();
    Ok(Some(guard))
}
