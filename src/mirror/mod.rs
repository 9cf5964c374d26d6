//! Static asset mirroring subsystem.
//!
//! # Data Flow
//! ```text
//! GET /img/logo.png (static suffix, mirroring enabled)
//!     → request router spawns StaticMirror::mirror (detached)
//!     → second, independent GET to the origin
//!     → <save_dir>/img/logo.png (overwritten)
//! ```
//!
//! # Design Decisions
//! - Best effort: every failure is logged and dropped
//! - The client response never waits on, or depends on, the mirror
//! - No locking: concurrent mirrors of one path race, last writer wins
//! - Files are never revalidated or expired

pub mod store;

pub use store::{MirrorError, StaticMirror};
