use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};

use reelcast_core::config::ReelcastConfig;
use reelcast_publish::{
    AccountRegistry, FacebookPublisher, InstagramPublisher, PlatformPublisher, PublishDispatcher,
};
use reelcast_scheduler::ScheduleStore;
use reelcast_worker::PublishWorker;

/// Auto-publish daemon: sweeps the schedule and publishes due reels.
#[derive(Parser, Debug)]
#[command(name = "reelcastd", version, about)]
struct Args {
    /// Path to the config file (default: ~/.reelcast/reelcast.toml).
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reelcast=info,reelcastd=info".into()),
        )
        .init();

    let args = Args::parse();
    let config = ReelcastConfig::load(args.config.as_deref()).unwrap_or_else(|e| {
        warn!("config load failed ({e}), using defaults");
        ReelcastConfig::default()
    });

    let db_path = &config.database.path;
    ensure_parent_dir(db_path);
    info!(path = %db_path, "opening SQLite database");
    let conn = rusqlite::Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    let store = Arc::new(ScheduleStore::new(conn)?);

    let registry = Arc::new(AccountRegistry::from_config(&config.accounts));
    info!(brands = ?registry.brands(), "account registry loaded");

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.graph.request_timeout_secs))
        .build()?;
    let publishers: Vec<Arc<dyn PlatformPublisher>> = vec![
        Arc::new(InstagramPublisher::new(client.clone(), &config.graph)),
        Arc::new(FacebookPublisher::new(client, &config.graph)),
    ];
    let dispatcher = Arc::new(PublishDispatcher::new(
        Arc::clone(&store),
        registry,
        publishers,
    ));

    let worker = PublishWorker::new(store, dispatcher, &config.worker);
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let worker_task = tokio::spawn(async move { worker.run(shutdown_rx).await });

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");
    let _ = shutdown_tx.send(true);
    let _ = worker_task.await;

    Ok(())
}

/// Ensure the parent directory for a file path exists.
fn ensure_parent_dir(path: &str) {
    if let Some(parent) = std::path::Path::new(path).parent() {
        let _ = std::fs::create_dir_all(parent);
    }
}
