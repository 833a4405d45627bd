//! oauth-consent - OAuth 2.0 PKCE consent service library
//!
//! This library implements the user-facing consent step of the OAuth 2.0
//! Authorization Code flow with PKCE: it validates an incoming
//! authorization request, shows the user which application asks for which
//! permissions, and sends the user agent back to the application with an
//! authorization code or an error.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `oauth`: Request validation, client metadata, redirect construction,
//!   and the authorization server client
//! - `consent`: The consent state machine, its async driver, session
//!   registry, and HTML rendering
//! - `server`: axum routes exposing the consent flow over HTTP
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use oauth_consent::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     oauth_consent::commands::serve::run_serve(config).await
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod consent;
pub mod error;
pub mod oauth;
pub mod server;

// Re-export commonly used types
pub use config::Config;
pub use consent::{ConsentController, ConsentFlow, ConsentState, SessionStore};
pub use error::{ConsentError, ConsentResult, Result};
pub use oauth::{AuthorizationRequest, AuthorizationServer, HttpAuthorizationServer, RawParams};
