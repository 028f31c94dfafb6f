//! # Error Types
//!
//! Custom error types for NOVA Bridge using `thiserror`.

use thiserror::Error;

/// Main error type for NOVA Bridge
#[derive(Debug, Error)]
pub enum NovaError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Channel registry defects (duplicate keys, malformed descriptors)
    #[error("Channel registry error: {0}")]
    Registry(String),

    /// Inbound frame could not be turned into a message
    #[error("Decode error: {0}")]
    Decode(String),

    /// WebSocket transport errors
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Handshake did not complete in time
    #[error("Timed out connecting to {0}")]
    ConnectTimeout(String),

    /// Connection task panicked or was aborted
    #[error("Connection task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for NOVA Bridge
pub type Result<T> = std::result::Result<T, NovaError>;
