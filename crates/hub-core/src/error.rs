//! Error types for hub-core

use std::path::PathBuf;

/// Result type for hub-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in hub-core operations
///
/// Resolution itself never fails; these surface from configuration loading
/// and from the explicit, fallible store operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Engine configuration file not found at expected path
    #[error("Configuration not found at {path}")]
    ConfigNotFound { path: PathBuf },

    /// Engine configuration parsed but holds unusable values
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Filesystem error from hub-fs
    #[error(transparent)]
    Fs(#[from] hub_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// TOML deserialization error
    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),
}

/// Failures reported by a [`SnapshotProvider`](crate::provider::SnapshotProvider).
///
/// These are always recovered inside the fetcher and never reach callers of
/// the engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// The provider could not be reached or has no namespace for the context
    #[error("Provider unavailable for {context}: {message}")]
    Unavailable { context: String, message: String },

    /// The remote answered with an error
    #[error("Remote error for {context}: {message}")]
    Remote { context: String, message: String },

    /// The fetch exceeded its deadline
    #[error("Fetch for {context} timed out after {deadline_ms} ms")]
    TimedOut { context: String, deadline_ms: u64 },
}

impl ProviderError {
    pub fn unavailable(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unavailable {
            context: context.into(),
            message: message.into(),
        }
    }

    pub fn remote(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Remote {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Short machine-readable label used in telemetry parameters.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unavailable { .. } => "unavailable",
            Self::Remote { .. } => "remote",
            Self::TimedOut { .. } => "timeout",
        }
    }
}
