//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! CLI flags (+ optional TOML file)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//!
//! static_file.txt
//!     → extensions.rs (bootstrap default list if missing)
//!     → ExtensionSet (immutable, shared via Arc)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod extensions;
pub mod loader;
pub mod schema;
pub mod validation;

pub use extensions::ExtensionSet;
pub use schema::ProxyConfig;
pub use schema::ListenerConfig;
pub use schema::OriginConfig;
pub use schema::MirrorConfig;
pub use schema::ObservabilityConfig;
