//! Command-line interface.
//!
//! Every flag is optional so that values from `--config` survive unless a
//! flag overrides them. Unset flags fall back to `ProxyConfig::default()`.

use std::path::PathBuf;

use clap::Parser;

use crate::config::loader::{load_config, ConfigError};
use crate::config::ProxyConfig;

#[derive(Debug, Parser)]
#[command(name = "mirror-proxy")]
#[command(about = "Single-origin reverse proxy with static asset mirroring", long_about = None)]
pub struct Cli {
    /// Port to run the server on [default: 3000]
    #[arg(long)]
    pub port: Option<u16>,

    /// Context path the proxy is mounted under [default: /]
    #[arg(long)]
    pub context_path: Option<String>,

    /// URL of the origin server
    #[arg(long)]
    pub proxy_url: Option<String>,

    /// Directory to save static files in; empty disables mirroring [default: ./saved_files]
    #[arg(long)]
    pub save_dir: Option<String>,

    /// File listing static suffixes, one per line [default: static_file.txt]
    #[arg(long)]
    pub extensions_file: Option<String>,

    /// Log request/response headers and bodies
    #[arg(short, long)]
    pub debug: bool,

    /// Decoded response bodies above this many bytes are logged by size only
    #[arg(long)]
    pub response_log_limit: Option<usize>,

    /// Request bodies above this many bytes are logged by size only
    #[arg(long)]
    pub request_log_limit: Option<usize>,

    /// Serve Prometheus metrics on this address (e.g. 127.0.0.1:9090)
    #[arg(long)]
    pub metrics_address: Option<String>,

    /// Optional TOML config file; flags override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Merge the config file (if any) with the flags and validate the result.
    pub fn into_config(self) -> Result<ProxyConfig, ConfigError> {
        let path = self.config.clone();
        load_config(path.as_deref(), |config| self.apply(config))
    }

    fn apply(self, config: &mut ProxyConfig) {
        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if let Some(context_path) = self.context_path {
            config.listener.context_path = context_path;
        }
        if let Some(url) = self.proxy_url {
            config.origin.url = url;
        }
        if let Some(save_dir) = self.save_dir {
            config.mirror.save_dir = save_dir;
        }
        if let Some(extensions_file) = self.extensions_file {
            config.mirror.extensions_file = extensions_file;
        }
        if self.debug {
            config.observability.debug = true;
        }
        if let Some(limit) = self.response_log_limit {
            config.observability.response_body_limit = limit;
        }
        if let Some(limit) = self.request_log_limit {
            config.observability.request_body_limit = limit;
        }
        if let Some(addr) = self.metrics_address {
            config.observability.metrics_address = addr;
        }
    }
}
