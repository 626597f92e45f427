//! services/web/src/error.rs
//!
//! Defines the primary error type for the web service.

use crate::config::ConfigError;
use nebulearn_core::ports::PortError;
use std::path::PathBuf;

/// The primary error type for the `web` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The storage file named by `STORAGE_PATH` could not be opened at startup.
    #[error("Cannot open storage at {}: {source}", path.display())]
    StorageOpen {
        path: PathBuf,
        #[source]
        source: PortError,
    },
}
