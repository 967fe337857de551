//! Error types for the MateBot stack

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types shared across the stack
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed external message, rejected at the interface boundary
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// Map buffer with the wrong length for the configured grid
    #[error("Map buffer size mismatch: expected {expected} bytes, got {actual}")]
    MapSize {
        /// Expected buffer length in bytes
        expected: usize,
        /// Length of the rejected buffer
        actual: usize,
    },
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::InvalidCommand(e.to_string())
    }
}
