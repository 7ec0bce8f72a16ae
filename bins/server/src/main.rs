//! filerelay server
//!
//! Main entry point for the file relay service.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use filerelay_api::{AppState, create_router};
use filerelay_core::host::{FileHost, MemoryHost, TelegramHost};
use filerelay_core::relay::{RelayService, RelaySettings};
use filerelay_core::store::{CloudflareKvStore, MappingStore, MemoryStore};
use filerelay_shared::AppConfig;
use filerelay_shared::config::{HostBackend, LogConfig, StoreBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;

    init_tracing(&config.log);

    let host = build_host(&config)?;
    let store = build_store(&config)?;

    let relay = RelayService::new(host, store, RelaySettings::from(&config.upload));
    info!(
        host = relay.host_name(),
        store = relay.store_name(),
        max_file_size_mb = relay.settings().max_file_size_mb(),
        "Relay service ready"
    );

    // Create application state and router
    let state = AppState::new(Arc::new(relay), &config.server);
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

fn init_tracing(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "filerelay=debug,tower_http=debug".into());

    if log.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn build_host(config: &AppConfig) -> anyhow::Result<Arc<dyn FileHost>> {
    match config.host.backend {
        HostBackend::Telegram => {
            let telegram = config
                .telegram
                .as_ref()
                .context("telegram section is required for the telegram host")?;
            Ok(Arc::new(TelegramHost::new(telegram)?))
        }
        HostBackend::Memory => {
            tracing::warn!("Using in-memory document host; content is lost on restart");
            Ok(Arc::new(MemoryHost::new()))
        }
    }
}

fn build_store(config: &AppConfig) -> anyhow::Result<Arc<dyn MappingStore>> {
    let store = &config.store;
    match store.backend {
        StoreBackend::Memory => {
            tracing::warn!(
                "Using in-memory mapping store; download links stop resolving after a restart"
            );
            Ok(Arc::new(MemoryStore::new(
                store.memory_max_entries,
                store.memory_ttl_secs.map(Duration::from_secs),
            )))
        }
        StoreBackend::Cloudflare => {
            let cloudflare = store
                .cloudflare
                .as_ref()
                .context("store.cloudflare section is required for the cloudflare store")?;
            Ok(Arc::new(CloudflareKvStore::new(cloudflare)?))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}
