//! Error types for the mesh gateway

use thiserror::Error;

/// Main error type for gateway operations
#[derive(Debug, Error)]
pub enum GatewayError {
    /// CoAP engine handle could not be constructed (fatal to init)
    #[error("engine allocation failed: {0}")]
    EngineAllocation(String),

    /// CoAP engine could not bind its transport socket (fatal to init)
    #[error("engine bind failed: {0}")]
    EngineBind(#[source] std::io::Error),

    /// No IPv4/IPv6 address could be resolved for a host
    #[error("address resolution failed for host: {0}")]
    Resolution(String),

    /// URI could not be parsed
    #[error("URI parse error: {0}")]
    UriParse(String),

    /// Decoded path/query exceeds the staging buffer limit
    #[error("URI component too long: {actual} bytes exceeds limit of {limit}")]
    UriTooLong { limit: usize, actual: usize },

    /// Engine could not allocate or encode a PDU
    #[error("PDU allocation error: {0}")]
    PduAllocation(String),

    /// IO error (socket operations, config file reads)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file parsing error
    #[error("config error: {0}")]
    Config(String),
}

impl From<coap_lite::error::MessageError> for GatewayError {
    fn from(e: coap_lite::error::MessageError) -> Self {
        GatewayError::PduAllocation(e.to_string())
    }
}

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;
