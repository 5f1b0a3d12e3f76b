//! Error types for voxsync-core

use thiserror::Error;

/// Result type alias using voxsync-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in voxsync-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Network failure or timeout talking to the service
    #[error("Network request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Structured `error: true` payload or non-success response from the service
    #[error("{0}")]
    Application(String),

    /// Operation attempted without its required preceding state
    #[error("{0}")]
    InvalidState(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A note with the requested name already exists
    #[error("Note already exists: {0}")]
    StorageConflict(String),

    /// Note storage could not be read or written
    #[error("Note storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Settings could not be loaded, validated or saved
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the failure came from the network layer rather than the service.
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
