//! Prism HTTP server entrypoint.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tokio::signal;

use prism::config::{Config, StartupMode};
use prism::embedding::CapabilityRegistry;
use prism::gateway::{AppState, create_router_with_state};
use prism::index::QdrantIndex;
use prism::storage::{FsObjectStore, HttpObjectStore, ObjectStore};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::args().any(|arg| arg == "--health-check") {
        std::process::exit(run_health_check());
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    config.validate()?;
    let addr: SocketAddr = config.socket_addr().parse()?;

    tracing::info!(
        bind_addr = %config.bind_addr,
        port = config.port,
        startup_mode = ?config.startup_mode,
        "Prism starting"
    );

    let registry = Arc::new(CapabilityRegistry::from_config(&config)?);
    registry.verify_classifier_coverage()?;
    if config.startup_mode == StartupMode::Eager {
        tracing::info!("All capabilities constructed eagerly");
    }

    let index = Arc::new(QdrantIndex::connect(&config.qdrant_url).await?);
    tracing::info!(qdrant_url = %config.qdrant_url, "Connected to vector index");

    let store: Arc<dyn ObjectStore> = match &config.store_url {
        Some(url) => {
            tracing::info!(store_url = %url, "Using HTTP object store");
            Arc::new(HttpObjectStore::new(url))
        }
        None => {
            tracing::info!(store_path = %config.store_path.display(), "Using filesystem object store");
            Arc::new(FsObjectStore::new(config.store_path.clone()))
        }
    };

    let state = AppState::new(index, store, registry, &config);
    let app = create_router_with_state(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Prism shutdown complete");
    Ok(())
}

fn run_health_check() -> i32 {
    let port = std::env::var("PRISM_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(8080);

    let url = format!("http://127.0.0.1:{}/healthz", port);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to build runtime");

    rt.block_on(async {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(1))
            .build()
            .expect("failed to build client");

        match client.get(&url).send().await {
            Ok(res) if res.status().is_success() => 0,
            _ => 1,
        }
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
