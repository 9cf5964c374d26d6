//! Single-origin reverse proxy library.
//!
//! Forwards HTTP and WebSocket traffic to one origin, mirrors static assets
//! to disk, and captures bodies for diagnostic logging.

pub mod cli;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod mirror;
pub mod observability;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
