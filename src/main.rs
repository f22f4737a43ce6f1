mod api;
mod config;
mod core;
mod error;
mod store;

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use api::AppState;
use config::Config;
use crate::core::video::YtDlp;
use poem::{listener::TcpListener, Server};
use store::{sweeper, FileStore};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if config.production {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();

    let config = Config::from_env()?;
    init_tracing(&config);

    let store = FileStore::open(&config.temp_dir)
        .with_context(|| format!("cannot open {}", config.temp_dir.display()))?;

    info!(
        version = VERSION,
        addr = %config.bind_addr(),
        temp_dir = %store.root().display(),
        environment = config.environment_name(),
        "starting Simple Tools API"
    );

    let cancel = CancellationToken::new();
    let sweeper = sweeper::spawn(
        store.clone(),
        config.cleanup_interval,
        config.max_file_age,
        cancel.clone(),
    );

    let state = AppState {
        store,
        extractor: Arc::new(YtDlp::new(config.yt_dlp_path.clone())),
        max_file_age: config.max_file_age,
    };
    let app = api::build_app(state, &config.cors_origins);

    Server::new(TcpListener::bind(config.bind_addr()))
        .run_with_graceful_shutdown(app, shutdown_signal(), Some(Duration::from_secs(10)))
        .await?;

    cancel.cancel();
    if let Some(handle) = sweeper {
        handle.await?;
    }

    Ok(())
}
