//! Error types for oauth-consent
//!
//! This module defines the error taxonomy of the consent flow, using
//! `thiserror` for ergonomic error handling.
//!
//! The first three variants are the ones the consent controller branches
//! on: validation problems are shown inline, while service and network
//! failures are routed back to the requesting application once a redirect
//! target is known. The remaining variants cover startup concerns
//! (configuration, files, HTTP client construction).

use thiserror::Error;

/// Main error type for oauth-consent operations
#[derive(Error, Debug)]
pub enum ConsentError {
    /// One or more authorization request parameters were invalid
    ///
    /// Always carries at least one message, in field order.
    #[error("Invalid authorization request: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// The authorization server answered with a non-success response
    #[error("{message}")]
    Service {
        /// Server supplied description, or a generic fallback
        message: String,
        /// HTTP status of the failed response, when one was received
        status: Option<u16>,
        /// Server supplied OAuth error code (e.g. `invalid_client`)
        code: Option<String>,
    },

    /// The authorization server could not be reached
    #[error("{0}")]
    Network(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP client construction errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl ConsentError {
    /// Messages suitable for inline display on the error screen.
    pub fn messages(&self) -> Vec<String> {
        match self {
            ConsentError::Validation(messages) => messages.clone(),
            other => vec![other.to_string()],
        }
    }

    /// HTTP status reported by the authorization server, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ConsentError::Service { status, .. } => *status,
            _ => None,
        }
    }
}

/// Result type for the consent pipeline, where callers match on the variant
pub type ConsentResult<T> = std::result::Result<T, ConsentError>;

/// Result type alias for startup and command code
///
/// Uses `anyhow::Error` so configuration and CLI paths can attach context
/// freely.
pub type Result<T> = anyhow::Result<T>;
