//! # Remora Utilities
//!
//! Logging setup shared by the Remora CLI and anything embedding the engine.

pub mod logging;

pub use logging::{build_filter, init_logging, LogFormat, LogLevel, LoggingError, LoggingGuard, LoggingOptions};
pub use tracing::{debug, error, info, trace, warn};
