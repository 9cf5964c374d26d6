//! Startup orchestration.
//!
//! # Responsibilities
//! - Load the static extension list (bootstrapping it if missing)
//! - Start the metrics exporter when configured
//! - Bind the listener and run the server until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener binds last (traffic only when ready)

use std::net::SocketAddr;
use std::path::Path;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::extensions::ExtensionError;
use crate::config::{ExtensionSet, ProxyConfig};
use crate::http::origin::OriginError;
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Extensions(#[from] ExtensionError),
    #[error(transparent)]
    Origin(#[from] OriginError),
    #[error("invalid metrics address '{0}'")]
    MetricsAddress(String),
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Bring the proxy up and serve until `shutdown` fires.
pub async fn run(config: ProxyConfig, shutdown: &Shutdown) -> Result<(), StartupError> {
    let extensions = ExtensionSet::load_or_bootstrap(Path::new(&config.mirror.extensions_file))?;

    tracing::info!(
        origin = %config.origin.url,
        save_dir = %config.mirror.save_dir,
        static_extensions = extensions.len(),
        debug = config.observability.debug,
        "Configuration loaded"
    );

    if !config.observability.metrics_address.is_empty() {
        let addr: SocketAddr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|_| StartupError::MetricsAddress(config.observability.metrics_address.clone()))?;
        metrics::init_metrics(addr);
    }

    let server = HttpServer::new(config, extensions)?;

    let address = server.config().listener.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind { address, source })?;

    server
        .run(listener, shutdown.subscribe())
        .await
        .map_err(StartupError::Serve)
}
