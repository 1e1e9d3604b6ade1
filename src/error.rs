//! Error types for the Colloquy chat server
//!
//! Structured error definitions via thiserror, with anyhow reserved for the
//! binary boundary.

use thiserror::Error;

/// Main error type for Colloquy operations
#[derive(Error, Debug)]
pub enum ColloquyError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Invalid listen address
    #[error("Invalid address: {0}")]
    InvalidAddress(#[from] std::net::AddrParseError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The agent collaborator failed
    #[error("Agent error: {0}")]
    Agent(String),

    /// The agent emitted an event the translator cannot act on
    #[error("Malformed agent event: {0}")]
    MalformedEvent(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

/// Result type alias for Colloquy operations
pub type Result<T> = std::result::Result<T, ColloquyError>;

/// Convert anyhow::Error to ColloquyError
impl From<anyhow::Error> for ColloquyError {
    fn from(err: anyhow::Error) -> Self {
        ColloquyError::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ColloquyError::Agent("runner unavailable".to_string());
        assert_eq!(err.to_string(), "Agent error: runner unavailable");
    }

    #[test]
    fn test_anyhow_conversion() {
        let err: ColloquyError = anyhow::anyhow!("boom").into();
        assert!(matches!(err, ColloquyError::Other(_)));
    }
}
