use anyhow::{Context, Result};
use clap::Parser;
use followgraph_core::config::Config;
use followgraph_core::logging::{init_logging_with_config, LogConfig, LogLevel};
use std::path::PathBuf;
use tracing::info;

mod commands;

use commands::{Command, Workspace};

#[derive(Parser, Debug)]
#[command(name = "followgraph")]
#[command(author, version, about = "Operate on a local follow graph database", long_about = None)]
struct Args {
    /// SQLite database file (created if missing)
    #[arg(short, long, default_value = "~/.followgraph/followgraph.db")]
    database: String,

    /// TOML configuration file; FOLLOWGRAPH_* variables override it
    #[arg(short, long, env = "FOLLOWGRAPH_CONFIG")]
    config: Option<PathBuf>,

    /// Host used in actor ids (defaults to `server.hostname`)
    #[arg(long)]
    hostname: Option<String>,

    /// Base URL used for collection ids and links
    #[arg(long, default_value = "http://localhost:4815")]
    base_url: String,

    /// Set the log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    /// Enable JSON formatted logging
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = args.log_level.parse::<LogLevel>().unwrap_or_else(|e| {
        eprintln!("{}, using 'warn'", e);
        LogLevel::Warn
    });
    init_logging_with_config(LogConfig::new(log_level).json_format(args.json_logs))?;

    let database = PathBuf::from(shellexpand::tilde(&args.database).into_owned());
    if let Some(parent) = database.parent() {
        std::fs::create_dir_all(parent)?;
    }
    info!(database = %database.display(), "Opening follow graph");

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => Config::default(),
    };
    config.apply_env()?;
    if let Some(hostname) = args.hostname {
        config.server.hostname = hostname;
    }
    config.validate()?;

    let workspace = Workspace::open(&database, &args.base_url, &config)?;
    let output = workspace.run(args.command).await;
    workspace.close().await?;

    println!("{}", serde_json::to_string_pretty(&output?)?);
    Ok(())
}
