//! Error types for the DDNS updater
//!
//! This module defines all error types used throughout the workspace.

use thiserror::Error;

/// Result type alias for DDNS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the DDNS updater
#[derive(Error, Debug)]
pub enum Error {
    /// Settings missing, unreadable or invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// The provider answered with an error message
    #[error("Provider error ({provider}): {}{message}", code_prefix(.code))]
    Provider {
        /// Provider name
        provider: String,
        /// Provider error code, when the response carries one
        code: Option<String>,
        /// Error message
        message: String,
    },

    /// Transport failure talking to a remote service
    #[error("Network error: {0}")]
    Network(String),

    /// IP source-related errors
    #[error("IP source error: {0}")]
    IpSource(String),

    /// State store-related errors
    #[error("State store error: {0}")]
    StateStore(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a provider error without an error code
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            code: None,
            message: message.into(),
        }
    }

    /// Create a provider error carrying the provider's error code
    pub fn provider_with_code(
        provider: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Provider {
            provider: provider.into(),
            code: Some(code.into()),
            message: message.into(),
        }
    }

    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create an IP source error
    pub fn ip_source(msg: impl Into<String>) -> Self {
        Self::IpSource(msg.into())
    }

    /// Create a state store error
    pub fn state_store(msg: impl Into<String>) -> Self {
        Self::StateStore(msg.into())
    }

    /// Whether the provider rejected a single request
    ///
    /// Rejections are reported per record during the update phase.
    /// Every other error terminates the run.
    pub fn is_provider_rejection(&self) -> bool {
        matches!(self, Self::Provider { .. })
    }

    /// Whether this error should be reported as a configuration problem
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

fn code_prefix(code: &Option<String>) -> String {
    code.as_deref().map(|c| format!("{c}: ")).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_display_includes_code() {
        let err = Error::provider_with_code(
            "aliyun",
            "InvalidAccessKeyId.NotFound",
            "Specified access key is not found.",
        );
        assert_eq!(
            err.to_string(),
            "Provider error (aliyun): InvalidAccessKeyId.NotFound: Specified access key is not found."
        );

        let err = Error::provider("aliyun", "boom");
        assert_eq!(err.to_string(), "Provider error (aliyun): boom");
    }

    #[test]
    fn test_error_categories_display() {
        assert_eq!(
            Error::config("missing domain").to_string(),
            "Configuration error: missing domain"
        );
        assert_eq!(
            Error::network("connection reset").to_string(),
            "Network error: connection reset"
        );
        assert_eq!(
            Error::ip_source("timeout").to_string(),
            "IP source error: timeout"
        );
        assert_eq!(
            Error::state_store("read-only file system").to_string(),
            "State store error: read-only file system"
        );
    }

    #[test]
    fn test_rejection_classification() {
        assert!(Error::provider("aliyun", "denied").is_provider_rejection());
        assert!(!Error::network("connection reset").is_provider_rejection());
        assert!(Error::config("missing domain").is_config());
    }
}
