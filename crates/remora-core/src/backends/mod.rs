//! # Backends
//!
//! Concrete [`crate::bridge::DebugBackend`] implementations.
//!
//! - [`SnapshotBackend`]: in-memory debuggee, the dump-file analogue
//! - [`ProcfsBackend`]: live Linux process (Linux only)

#[cfg(target_os = "linux")]
pub mod procfs;
pub mod snapshot;

#[cfg(target_os = "linux")]
pub use procfs::ProcfsBackend;
pub use snapshot::{ResourceStats, SnapshotBackend, SnapshotBuilder};
