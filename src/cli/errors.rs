//! CLI-specific error types
//!
//! All CLI errors end the process with a non-zero exit code.

use std::fmt;
use std::io;

use crate::realtime::RealtimeError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration missing or invalid
    ConfigError,
    /// I/O error (stdout, runtime setup, signals)
    IoError,
    /// Subscription could not be opened
    SubscribeFailed,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "REALTIME_CLI_CONFIG_ERROR",
            Self::IoError => "REALTIME_CLI_IO_ERROR",
            Self::SubscribeFailed => "REALTIME_CLI_SUBSCRIBE_FAILED",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Config error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    /// I/O error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    /// Subscription failed
    pub fn subscribe_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::SubscribeFailed, msg)
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<RealtimeError> for CliError {
    fn from(e: RealtimeError) -> Self {
        match e {
            RealtimeError::ConfigError(_) => Self::config_error(e.to_string()),
            other => Self::subscribe_failed(other.to_string()),
        }
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_code() {
        let err = CliError::config_error("Endpoint is not defined");
        assert_eq!(err.to_string(), "REALTIME_CLI_CONFIG_ERROR: Endpoint is not defined");
    }

    #[test]
    fn test_from_realtime_error() {
        let err: CliError = RealtimeError::ConfigError("x".into()).into();
        assert_eq!(err.code(), &CliErrorCode::ConfigError);

        let err: CliError = RealtimeError::InvalidIdentifier("a.b".into()).into();
        assert_eq!(err.code(), &CliErrorCode::SubscribeFailed);
        assert!(err.message().contains("a.b"));
    }
}
