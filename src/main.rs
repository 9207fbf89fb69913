use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use modelhub::config::{LoggingConfig, Overrides, Settings, StorageBackend};
use modelhub::registry::{FsStore, MemoryStore, ModelRegistry, ModelStore};
use modelhub::server::ApiServer;

/// Model registry backend
#[derive(Parser, Debug)]
#[command(name = "modelhub", version, about)]
struct Cli {
    /// Directory holding default.toml and local.toml
    #[arg(long, default_value = "config")]
    config_dir: PathBuf,

    /// Host address to bind to
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(long)]
    port: Option<u16>,

    /// Storage backend
    #[arg(long, value_parser = ["memory", "filesystem"])]
    backend: Option<String>,

    /// Root directory for the filesystem backend
    #[arg(long)]
    storage_dir: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            host: self.host.clone(),
            port: self.port,
            backend: self.backend.clone(),
            storage_dir: self.storage_dir.clone(),
            log_level: self.log_level.clone(),
        }
    }
}

/// Installs the global subscriber: stdout always, plus a daily rolling file
/// when `logging.file` is set. The returned guard must live until exit so
/// buffered lines are flushed.
fn init_tracing(logging: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.to_lowercase()));

    let (file_layer, guard) = match &logging.file {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::RollingFileAppender::new(
                tracing_appender::rolling::Rotation::DAILY,
                dir,
                "modelhub",
            );
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer()
                .with_writer(non_blocking)
                // Disable ANSI colors for cleaner log files
                .with_ansi(false)
                .with_line_number(true)
                .with_file(true)
                .with_thread_ids(true)
                .with_target(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(file_layer)
        .init();

    guard
}

fn build_store(settings: &Settings) -> Result<Arc<dyn ModelStore>> {
    let store: Arc<dyn ModelStore> = match settings.storage.backend {
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
        StorageBackend::Filesystem => {
            let store = FsStore::open(&settings.storage.directory).with_context(|| {
                format!("opening storage at {}", settings.storage.directory.display())
            })?;
            info!("Storage directory: {}", store.root().display());
            Arc::new(store)
        }
    };
    Ok(store)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load settings first
    let settings = Settings::load(&cli.config_dir, &cli.overrides())
        .context("loading configuration")?;

    let _guard = init_tracing(&settings.logging);
    info!("modelhub starting up...");
    if let Some(dir) = &settings.logging.file {
        info!("Log directory: {}", dir.display());
    }

    let store = build_store(&settings)?;
    let registry = ModelRegistry::new(store);
    info!("Registry ready on the {} backend", registry.backend_name());

    let server = ApiServer::new(registry, settings.server.clone());
    server
        .start()
        .await
        .map_err(|e| anyhow::anyhow!(e))
        .context("running API server")?;

    Ok(())
}
