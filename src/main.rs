use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mgaide_sync_server::config::{self, DbPoolSettings};
use mgaide_sync_server::server::{metrics, run_server, RequestsLoggingLevel, ServerConfig};
use mgaide_sync_server::sync_store::{SqliteSyncStore, SyncStore};

fn parse_path(s: &str) -> Result<PathBuf, String> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(format!("Error resolving path '{}': {}", s, msg));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir().map_err(|e| format!("Failed to get current dir: {}", e))?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to TOML configuration file. Values in the file override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Path to the SQLite sync database, created if missing.
    /// Defaults to mgaide-sync.db in the working directory.
    #[clap(long, value_parser = parse_path)]
    pub db_path: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3000)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, default_value_t = 9091)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Prefix to mount the sync routes under. Repeat for several; "" or "/"
    /// is the root. Defaults to the root and /mgaide-api.
    #[clap(long = "mount-prefix")]
    pub mount_prefixes: Vec<String>,

    /// Largest request body accepted, in bytes. Defaults to 64 MiB.
    #[clap(long)]
    pub max_body_bytes: Option<usize>,

    /// Maximum number of open database connections.
    #[clap(long, default_value_t = 10)]
    pub db_max_open_connections: u32,

    /// Maximum number of idle database connections kept open.
    #[clap(long, default_value_t = 5)]
    pub db_max_idle_connections: u32,

    /// Seconds after which a database connection is recycled.
    #[clap(long, default_value_t = 300)]
    pub db_connection_max_lifetime_secs: u64,

    /// Milliseconds a connection waits on a locked database before failing.
    #[clap(long, default_value_t = 5000)]
    pub db_busy_timeout_ms: u64,
}

/// Convert CLI args to CliConfig for config resolution
impl From<&CliArgs> for config::CliConfig {
    fn from(args: &CliArgs) -> Self {
        config::CliConfig {
            db_path: args.db_path.clone(),
            port: args.port,
            metrics_port: args.metrics_port,
            logging_level: args.logging_level.clone(),
            mount_prefixes: args.mount_prefixes.clone(),
            max_body_bytes: args.max_body_bytes,
            db_pool: DbPoolSettings {
                max_open_connections: args.db_max_open_connections,
                max_idle_connections: args.db_max_idle_connections,
                connection_max_lifetime_secs: args.db_connection_max_lifetime_secs,
                busy_timeout_ms: args.db_busy_timeout_ms,
                ..DbPoolSettings::default()
            },
        }
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, initiating graceful shutdown"),
        Err(err) => tracing::error!("Failed to listen for Ctrl+C: {}", err),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    // Load TOML config if provided
    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            Some(config::FileConfig::load(path)?)
        }
        None => None,
    };

    // Resolve final configuration (TOML overrides CLI)
    let cli_config: config::CliConfig = (&cli_args).into();
    let app_config = config::AppConfig::resolve(&cli_config, file_config)?;

    info!("Configuration loaded:");
    info!("  db_path: {:?}", app_config.db_path);
    info!("  port: {}", app_config.port);
    info!("  mount_prefixes: {:?}", app_config.mount_prefixes);
    info!("  max_body_bytes: {}", app_config.max_body_bytes);
    info!("  db_pool: {:?}", app_config.db_pool);

    if !app_config.db_path.exists() {
        info!("Creating new sync database at {:?}", app_config.db_path);
    }
    let store = Arc::new(SqliteSyncStore::new(
        &app_config.db_path,
        &app_config.db_pool,
    )?);
    store.ping().context("Sync database is not usable")?;

    info!("Initializing metrics...");
    metrics::init_metrics();

    let server_config = ServerConfig {
        requests_logging_level: app_config.logging_level.clone(),
        port: app_config.port,
        metrics_port: app_config.metrics_port,
        mount_prefixes: app_config.mount_prefixes.clone(),
        max_body_bytes: app_config.max_body_bytes,
    };

    info!("Ready to serve at port {}!", app_config.port);
    info!("Metrics available at port {}!", app_config.metrics_port);

    let result = run_server(server_config, store.clone(), shutdown_signal()).await;

    // Last handle, dropping it closes the pool.
    drop(store);
    result
}
