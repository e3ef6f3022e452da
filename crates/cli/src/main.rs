//! Nyaya CLI
//!
//! Answers questions about Indian law from a local statute index, with a
//! web-search fallback, and builds that index from scraped section data.

mod commands;
mod services;

use clap::{Parser, Subcommand};
use commands::{AskCommand, HealthCommand, IndexCommand};
use nyaya_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// Nyaya - Indian law question answering over statutes
#[derive(Parser, Debug)]
#[command(name = "nyaya")]
#[command(about = "Indian law question answering over statutes", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "NYAYA_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "NYAYA_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// LLM provider (local, cloud, multiprovider)
    #[arg(short, long, global = true, env = "NYAYA_LLM_PROVIDER")]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true, env = "NYAYA_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask a legal question
    Ask(AskCommand),

    /// Report index and model status
    Health(HealthCommand),

    /// Build or update the statute index
    Index(IndexCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load()?.with_overrides(
        cli.workspace,
        cli.config,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );
    config.log_json |= cli.log_json;

    logging::init_logging(config.log_level.as_deref(), config.no_color, config.log_json)?;

    tracing::info!("Nyaya CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.llm.provider);
    tracing::debug!("Model: {}", config.llm.active_model());

    config.ensure_nyaya_dir()?;

    let command_name = match &cli.command {
        Commands::Ask(_) => "ask",
        Commands::Health(_) => "health",
        Commands::Index(_) => "index",
    };
    let span = tracing::info_span!("command", name = command_name);

    let result = tracing::Instrument::instrument(
        async {
            match &cli.command {
                Commands::Ask(cmd) => cmd.execute(&config).await,
                Commands::Health(cmd) => cmd.execute(&config).await,
                Commands::Index(cmd) => cmd.execute(&config).await,
            }
        },
        span,
    )
    .await;

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
