use anyhow::{Context, Result};
use clap::Parser;
use followgraph_api::{ApiServer, AppState};
use followgraph_core::config::{Config, StoreBackend};
use followgraph_core::core_graph::open_store;
use followgraph_core::logging::{init_logging_with_config, LogConfig};
use followgraph_core::shutdown::{install_signal_handlers, ShutdownCoordinator};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Follow graph HTTP API server
#[derive(Parser, Debug)]
#[command(name = "followgraph-api", version, about)]
struct Args {
    /// TOML configuration file; FOLLOWGRAPH_* variables override it
    #[arg(short, long, env = "FOLLOWGRAPH_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(short, long)]
    bind: Option<SocketAddr>,

    /// Edge store backend (memory, sqlite)
    #[arg(long)]
    backend: Option<StoreBackend>,

    /// SQLite database path
    #[arg(long)]
    database: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => Config::default(),
    };
    config.apply_env()?;

    if let Some(bind) = args.bind {
        config.server.bind_address = bind;
    }
    if let Some(backend) = args.backend {
        config.store.backend = backend;
    }
    if let Some(database) = &args.database {
        config.store.database_path = database.clone();
    }
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }

    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    init_logging_with_config(LogConfig::try_from(&config.logging)?)?;
    info!("Follow graph API starting");

    let mut state_metrics = None;
    if config.metrics.enabled {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("installing Prometheus recorder")?;
        followgraph_core::metrics::init_metrics();
        state_metrics = Some(handle);
    }

    if config.store.backend == StoreBackend::Sqlite {
        if let Some(parent) = config.store.database_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    let store = open_store(&config.store, &config.server.hostname)?;

    let mut state = AppState::new(&config, store)?;
    if let Some(handle) = state_metrics {
        state = state.with_metrics(handle);
    }

    let shutdown = Arc::new(ShutdownCoordinator::new(config.server.shutdown_timeout));
    install_signal_handlers(shutdown.clone());

    ApiServer::new(state, config.server.bind_address, shutdown)
        .run()
        .await?;

    info!("Follow graph API stopped");
    Ok(())
}
