//! Configuration management for oauth-consent
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.
//!
//! Configuration is loaded once at startup and treated as immutable for the
//! lifetime of the process. The authorization server credential lives here
//! rather than in code; how it is provisioned and rotated is the operator's
//! concern.

use crate::cli::{Cli, Commands};
use crate::error::{ConsentError, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

/// Main configuration structure for oauth-consent
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Authorization server connection settings
    #[serde(default)]
    pub authorization_server: AuthorizationServerConfig,
    /// Consent HTTP service settings
    #[serde(default)]
    pub server: ServerConfig,
}

/// Authorization server connection settings
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthorizationServerConfig {
    /// Base URL the `/oauth/scopes` and `/oauth/authorize` paths are joined onto
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Pre-provisioned credential sent on every request
    #[serde(default)]
    pub access_token: Option<String>,

    /// Scheme prefixed to the credential in the `Authorization` header
    ///
    /// An empty scheme sends the raw credential.
    #[serde(default = "default_auth_scheme")]
    pub auth_scheme: String,

    /// Per-request timeout (seconds)
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_auth_scheme() -> String {
    "Bearer".to_string()
}

fn default_timeout_seconds() -> u64 {
    10
}

impl Default for AuthorizationServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            access_token: None,
            auth_scheme: default_auth_scheme(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

// Keeps the credential out of `{:?}` output and therefore out of logs.
impl std::fmt::Debug for AuthorizationServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationServerConfig")
            .field("base_url", &self.base_url)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "<redacted>"),
            )
            .field("auth_scheme", &self.auth_scheme)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl AuthorizationServerConfig {
    /// Request timeout as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Value of the `Authorization` header, if a credential is configured
    pub fn authorization_header(&self) -> Option<String> {
        let token = self.access_token.as_deref()?;
        if self.auth_scheme.trim().is_empty() {
            Some(token.to_string())
        } else {
            Some(format!("{} {}", self.auth_scheme.trim(), token))
        }
    }
}

/// Consent HTTP service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the consent service listens on
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// How long an unfinished consent session stays valid (seconds)
    #[serde(default = "default_session_ttl_seconds")]
    pub session_ttl_seconds: u64,

    /// Upper bound on concurrently live consent sessions
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

fn default_bind_address() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_session_ttl_seconds() -> u64 {
    600
}

/// Longest accepted consent session lifetime (one day)
pub const MAX_SESSION_TTL_SECONDS: u64 = 86_400;

fn default_max_sessions() -> usize {
    10_000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            session_ttl_seconds: default_session_ttl_seconds(),
            max_sessions: default_max_sessions(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// A missing file is not an error; defaults are used instead.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConsentError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| ConsentError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(base_url) = std::env::var("OAUTH_CONSENT_BASE_URL") {
            tracing::debug!(base_url = %base_url, "Env override: OAUTH_CONSENT_BASE_URL");
            self.authorization_server.base_url = base_url;
        }

        if let Ok(token) = std::env::var("OAUTH_CONSENT_ACCESS_TOKEN") {
            tracing::debug!("Env override: OAUTH_CONSENT_ACCESS_TOKEN");
            self.authorization_server.access_token = Some(token);
        }

        if let Ok(scheme) = std::env::var("OAUTH_CONSENT_AUTH_SCHEME") {
            tracing::debug!(scheme = %scheme, "Env override: OAUTH_CONSENT_AUTH_SCHEME");
            self.authorization_server.auth_scheme = scheme;
        }

        if let Ok(timeout) = std::env::var("OAUTH_CONSENT_TIMEOUT_SECONDS") {
            match timeout.parse::<u64>() {
                Ok(v) => self.authorization_server.timeout_seconds = v,
                Err(_) => tracing::warn!("Invalid OAUTH_CONSENT_TIMEOUT_SECONDS: {}", timeout),
            }
        }

        if let Ok(bind) = std::env::var("OAUTH_CONSENT_BIND_ADDRESS") {
            tracing::debug!(bind = %bind, "Env override: OAUTH_CONSENT_BIND_ADDRESS");
            self.server.bind_address = bind;
        }

        if let Ok(ttl) = std::env::var("OAUTH_CONSENT_SESSION_TTL_SECONDS") {
            match ttl.parse::<u64>() {
                Ok(v) => self.server.session_ttl_seconds = v,
                Err(_) => tracing::warn!("Invalid OAUTH_CONSENT_SESSION_TTL_SECONDS: {}", ttl),
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &Cli) {
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }

        if let Commands::Serve {
            bind: Some(bind), ..
        } = &cli.command
        {
            self.server.bind_address = bind.clone();
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        let base = url::Url::parse(&self.authorization_server.base_url).map_err(|e| {
            ConsentError::Config(format!(
                "authorization_server.base_url is not a valid URL: {}",
                e
            ))
        })?;
        if base.cannot_be_a_base() {
            return Err(ConsentError::Config(
                "authorization_server.base_url cannot be used as a base URL".to_string(),
            )
            .into());
        }

        if self.authorization_server.timeout_seconds == 0 {
            return Err(ConsentError::Config(
                "authorization_server.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.server.bind_address.parse::<SocketAddr>().is_err() {
            return Err(ConsentError::Config(format!(
                "server.bind_address is not a socket address: {}",
                self.server.bind_address
            ))
            .into());
        }

        if self.server.session_ttl_seconds == 0 {
            return Err(ConsentError::Config(
                "server.session_ttl_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.server.session_ttl_seconds > MAX_SESSION_TTL_SECONDS {
            return Err(ConsentError::Config(format!(
                "server.session_ttl_seconds must be at most {}",
                MAX_SESSION_TTL_SECONDS
            ))
            .into());
        }

        if self.server.max_sessions == 0 {
            return Err(ConsentError::Config(
                "server.max_sessions must be greater than 0".to_string(),
            )
            .into());
        }

        Ok(())
    }

    /// Ensure a credential is configured before talking to the authorization server
    ///
    /// # Errors
    ///
    /// Returns error if no non-empty access token is set
    pub fn require_credential(&self) -> Result<()> {
        match self.authorization_server.access_token.as_deref() {
            Some(token) if !token.trim().is_empty() => Ok(()),
            _ => Err(ConsentError::Config(
                "authorization_server.access_token must be set (or OAUTH_CONSENT_ACCESS_TOKEN)"
                    .to_string(),
            )
            .into()),
        }
    }
}
