//! API Gateway - pattern routing with an LRU+TTL response cache

use anyhow::Context;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_gateway::{Config, Gateway, RouteTable};

/// Main entry point for the gateway.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Load the route table (fatal on failure)
/// 4. Create the gateway: cache, reaper, backend client
/// 5. Start HTTP server on the configured address
/// 6. On SIGINT/SIGTERM/SIGQUIT: stop accepting, drain in-flight requests,
///    then stop the reaper
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api_gateway=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting API Gateway");

    let config = Config::from_env();
    info!(
        "Configuration loaded: listen={}, routes={}, cache_max_entries={}, cache_ttl={}s, cleanup_interval={}s",
        config.listen_addr,
        config.routes_file.display(),
        config.cache_max_entries,
        config.cache_ttl,
        config.cleanup_interval
    );

    let routes = RouteTable::from_file(&config.routes_file)
        .inspect_err(|e| error!("Failed to load routes: {}", e))
        .with_context(|| format!("loading routes from {}", config.routes_file.display()))?;

    let gateway = Gateway::new(&config, routes).context("initializing gateway")?;

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    info!("Gateway listening on http://{}", config.listen_addr);

    axum::serve(listener, gateway.app())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving requests")?;

    gateway.shutdown().await;
    info!("Gateway shutdown complete");
    Ok(())
}

/// Waits for a termination signal (Ctrl+C, SIGTERM or SIGQUIT).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate()).expect("Failed to install SIGTERM handler");
        let mut sigquit = signal(SignalKind::quit()).expect("Failed to install SIGQUIT handler");
        tokio::select! {
            _ = sigterm.recv() => {}
            _ = sigquit.recv() => {}
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received termination signal, initiating shutdown...");
        }
    }
}
