//! Error types for Toolgate
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.
//!
//! Note that the gate itself never surfaces these to MCP clients: every
//! branch of a tool call is rendered as a well-formed tool result. These
//! errors are for configuration, collaborators, and the login web flow.

use thiserror::Error;

/// Main error type for Toolgate operations
#[derive(Error, Debug)]
pub enum ToolgateError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The identity is not on the allowlist
    #[error("Identity not allowed: {0}")]
    IdentityNotAllowed(String),

    /// A session is already bound to a different identity
    #[error("Session {session} is already bound to {existing}")]
    SessionConflict {
        /// The session whose binding was refused
        session: String,
        /// The identity the session is already bound to
        existing: String,
    },

    /// The data provider could not produce a payload for the call
    #[error("Data unavailable for {identity}/{tool}: {message}")]
    DataUnavailable {
        /// Identity the call was attributed to
        identity: String,
        /// Tool that was invoked
        tool: String,
        /// Underlying cause
        message: String,
    },

    /// A path component supplied by a caller is unsafe to join onto a directory
    #[error("Invalid path component: {0}")]
    InvalidPathComponent(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for Toolgate operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let error = ToolgateError::Config("invalid format".to_string());
        assert_eq!(error.to_string(), "Configuration error: invalid format");
    }

    #[test]
    fn test_identity_not_allowed_display() {
        let error = ToolgateError::IdentityNotAllowed("+15550001111".to_string());
        assert_eq!(error.to_string(), "Identity not allowed: +15550001111");
    }

    #[test]
    fn test_session_conflict_display() {
        let error = ToolgateError::SessionConflict {
            session: "sess-1".to_string(),
            existing: "+1555".to_string(),
        };
        assert_eq!(error.to_string(), "Session sess-1 is already bound to +1555");
    }

    #[test]
    fn test_data_unavailable_display() {
        let error = ToolgateError::DataUnavailable {
            identity: "+1555".to_string(),
            tool: "fetch_net_worth".to_string(),
            message: "No such file or directory".to_string(),
        };
        let s = error.to_string();
        assert!(s.contains("+1555/fetch_net_worth"));
        assert!(s.contains("No such file"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: ToolgateError = io_error.into();
        assert!(matches!(error, ToolgateError::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("{invalid json}").unwrap_err();
        let error: ToolgateError = json_error.into();
        assert!(matches!(error, ToolgateError::Serialization(_)));
    }

    #[test]
    fn test_yaml_error_conversion() {
        let yaml_error = serde_yaml::from_str::<serde_yaml::Value>("invalid: : yaml").unwrap_err();
        let error: ToolgateError = yaml_error.into();
        assert!(matches!(error, ToolgateError::Yaml(_)));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ToolgateError>();
    }
}
