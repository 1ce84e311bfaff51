use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use fleetwatch::{
    alerts::AlertEngine,
    checker::DeviceChecker,
    config::{Config, StorageConfig, read_config_file},
    probes::{ping::PingProber, snmp::SnmpProber},
    registry::StaticRegistry,
    scheduler::SchedulerHandle,
    storage::{MemoryBackend, StorageBackend},
};
use tracing::{info, level_filters::LevelFilter, trace};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Config file
    #[arg(short)]
    file: String,
}

fn init() {
    let filter = filter::Targets::new().with_targets(vec![
        ("fleetwatch", LevelFilter::TRACE),
        ("fleetwatchd", LevelFilter::TRACE),
    ]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

async fn build_store(config: &Config) -> anyhow::Result<Arc<dyn StorageBackend>> {
    match config.storage.clone().unwrap_or_default() {
        StorageConfig::None => {
            info!("using in-memory storage (no persistence)");
            Ok(Arc::new(MemoryBackend::new()))
        }
        #[cfg(feature = "storage-sqlite")]
        StorageConfig::Sqlite { path } => {
            Ok(Arc::new(fleetwatch::storage::SqliteBackend::new(path).await?))
        }
        #[cfg(not(feature = "storage-sqlite"))]
        StorageConfig::Sqlite { .. } => {
            tracing::warn!("built without storage-sqlite, falling back to in-memory storage");
            Ok(Arc::new(MemoryBackend::new()))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init();
    let args = Args::parse();
    trace!("started with args: {args:?}");

    let config = read_config_file(&args.file)?;

    let store = build_store(&config).await?;
    let registry = Arc::new(StaticRegistry::new(config.devices.clone()));

    let checker = DeviceChecker::new(
        registry.clone(),
        store.clone(),
        Arc::new(AlertEngine::new(store.clone())),
        Arc::new(PingProber::new(
            config.probe.ping_count,
            config.probe.ping_timeout(),
        )),
        Arc::new(SnmpProber::new(config.probe.snmp_timeout())),
    );

    let scheduler = SchedulerHandle::spawn(
        registry,
        checker,
        Duration::from_secs(config.interval),
    );

    info!(
        "fleetwatch running, {} devices configured, cycle every {}s",
        config.devices.len(),
        config.interval
    );

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");

    scheduler.shutdown().await?;
    store.close().await?;

    Ok(())
}
