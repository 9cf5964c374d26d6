//! Single-origin reverse proxy with static asset mirroring.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client ──▶ http server ──▶ request router
//!                                 │
//!                                 ├── WebSocket upgrade ──▶ websocket bridge ◀──▶ Origin (ws/wss)
//!                                 │
//!                                 ├── static suffix? ──▶ mirror (detached 2nd GET) ──▶ save_dir/<path>
//!                                 │
//!                                 └── forward ──▶ Origin
//!                                        │
//!   Client ◀── capture (copy of bytes) ◀─┘
//!                 │
//!                 └──▶ decode ──▶ logs
//! ```

use clap::Parser;

use mirror_proxy::cli::Cli;
use mirror_proxy::lifecycle::{startup, Shutdown};
use mirror_proxy::observability::logging;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init_tracing(cli.debug);

    tracing::info!("mirror-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    let config = cli.into_config()?;

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    startup::run(config, &shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
