//! # Real-Time Errors
//!
//! Error types for the real-time module.
//!
//! Only resource acquisition fails loudly. Message processing problems are
//! logged and dropped by the dispatcher and never become a `RealtimeError`.

use thiserror::Error;

/// Result type for real-time operations
pub type RealtimeResult<T> = Result<T, RealtimeError>;

/// Real-time errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RealtimeError {
    // ==================
    // Subscription Errors
    // ==================
    /// Database or collection id rejected before touching the transport
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    // ==================
    // Transport Errors
    // ==================
    /// Endpoint cannot be turned into a realtime URL
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Transport could not open the subscription
    #[error("Transport unavailable: {0}")]
    TransportUnavailable(String),

    /// Connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),

    // ==================
    // Configuration Errors
    // ==================
    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl RealtimeError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            RealtimeError::InvalidIdentifier(_) => "REALTIME_INVALID_IDENTIFIER",
            RealtimeError::InvalidEndpoint(_) => "REALTIME_INVALID_ENDPOINT",
            RealtimeError::TransportUnavailable(_) => "REALTIME_TRANSPORT_UNAVAILABLE",
            RealtimeError::ConnectionError(_) => "REALTIME_CONNECTION_ERROR",
            RealtimeError::ConfigError(_) => "REALTIME_CONFIG_ERROR",
        }
    }
}
