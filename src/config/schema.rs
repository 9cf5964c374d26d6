//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Root configuration for the proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (port, context path).
    pub listener: ListenerConfig,

    /// The single upstream all traffic is forwarded to.
    pub origin: OriginConfig,

    /// Static asset mirroring.
    pub mirror: MirrorConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind IP (e.g., "0.0.0.0").
    pub bind_ip: String,

    /// Listen port.
    pub port: u16,

    /// URL prefix the proxy is mounted under.
    pub context_path: String,
}

impl ListenerConfig {
    /// Socket address string for `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_ip, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_ip: "0.0.0.0".to_string(),
            port: 3000,
            context_path: "/".to_string(),
        }
    }
}

/// Origin (upstream) configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct OriginConfig {
    /// Base URL of the origin, e.g. "http://origin.example".
    pub url: String,
}

/// Static asset mirroring configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MirrorConfig {
    /// Root directory mirrored files are written under. Empty disables mirroring.
    pub save_dir: String,

    /// File holding the static suffix list, one per line.
    pub extensions_file: String,
}

impl MirrorConfig {
    /// The mirror root, or `None` when mirroring is disabled.
    pub fn mirror_root(&self) -> Option<&Path> {
        if self.save_dir.is_empty() {
            None
        } else {
            Some(Path::new(&self.save_dir))
        }
    }
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            save_dir: "./saved_files".to_string(),
            extensions_file: "static_file.txt".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log headers and bodies of every request.
    pub debug: bool,

    /// Decoded response bodies larger than this are logged by size only.
    pub response_body_limit: usize,

    /// Request bodies larger than this are logged by size only.
    pub request_body_limit: usize,

    /// Prometheus endpoint bind address. Empty disables the exporter.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            debug: false,
            response_body_limit: 100 * 1024,
            request_body_limit: 4000 * 1024,
            metrics_address: String::new(),
        }
    }
}
