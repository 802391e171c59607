//! Error types for SanketaCNC

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// SanketaCNC error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No matching-peer datagram arrived within the read budget
    #[error("Read timeout")]
    ReadTimeout,

    /// Wire envelope encode/decode failure
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration file parse error
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration file write error
    #[error("Config write error: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    /// Actuator operation attempted without an established link
    #[error("Hub is not connected")]
    NotConnected,

    /// Unknown driver type in configuration
    #[error("Unknown driver type: {0}")]
    UnknownDriver(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}
