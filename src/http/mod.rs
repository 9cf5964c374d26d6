//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request classification)
//!     ├─ websocket.rs (upgrade, dial origin, relay)
//!     └─ forward.rs (rewrite onto origin.rs, send)
//!          → capture.rs (copy response bytes while streaming)
//!          → decode.rs (decompress copy for logs)
//!     → Send to client
//! ```

pub mod capture;
pub mod decode;
pub mod forward;
pub mod origin;
pub mod server;
pub mod websocket;

pub use origin::Origin;
pub use server::HttpServer;
