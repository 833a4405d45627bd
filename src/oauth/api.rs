//! Authorization server client
//!
//! The consent service talks to the authorization server over exactly two
//! endpoints:
//!
//! - `GET /oauth/scopes` resolves what the consent screen shows about an
//!   application ([`AuthorizationServer::client_metadata`]).
//! - `POST /oauth/authorize` exchanges an approved request for an
//!   authorization code ([`AuthorizationServer::authorize`]).
//!
//! Both carry the configured credential. Each call is made once; retrying
//! is left to the user re-navigating.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::AuthorizationServerConfig;
use crate::error::{ConsentError, ConsentResult};
use crate::oauth::metadata::{ClientMetadata, ScopesResponse};
use crate::oauth::params::AuthorizationRequest;

const SCOPES_PATH: &str = "/oauth/scopes";
const AUTHORIZE_PATH: &str = "/oauth/authorize";

/// Message used when a failed response carries no description.
pub const GENERIC_API_FAILURE: &str = "API request failed";

/// Network failure message for metadata resolution.
pub const RESOLVE_NETWORK_FAILURE: &str = "Failed to fetch OAuth client information";

/// Network failure message for code issuance.
pub const AUTHORIZE_NETWORK_FAILURE: &str = "Failed to authorize OAuth request";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Successful answer of `POST /oauth/authorize`.
///
/// `state` is whatever the server chose to echo. It is not authoritative
/// and must not be used to build the redirect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationResult {
    pub code: String,
    #[serde(default)]
    pub state: Option<String>,
}

/// Error body the authorization server returns on non-success responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiErrorBody {
    /// Converts the body into a service error for `status`.
    ///
    /// Prefers `error_description`, then `message`, then a generic text.
    pub fn into_error(self, status: u16) -> ConsentError {
        let message = self
            .error_description
            .filter(|s| !s.is_empty())
            .or(self.message.filter(|s| !s.is_empty()))
            .unwrap_or_else(|| GENERIC_API_FAILURE.to_string());
        ConsentError::Service {
            message,
            status: Some(status),
            code: self.error.filter(|s| !s.is_empty()),
        }
    }
}

// ---------------------------------------------------------------------------
// AuthorizationServer
// ---------------------------------------------------------------------------

/// The two authorization server operations the consent flow depends on.
#[async_trait]
pub trait AuthorizationServer: Send + Sync {
    /// Resolves display metadata for `client_id` requesting `scope`.
    async fn client_metadata(&self, client_id: &str, scope: &str) -> ConsentResult<ClientMetadata>;

    /// Exchanges an approved request for an authorization code.
    ///
    /// Every field of `request` is forwarded verbatim, including the
    /// caller's `code_challenge`.
    async fn authorize(&self, request: &AuthorizationRequest) -> ConsentResult<AuthorizationResult>;
}

/// [`AuthorizationServer`] backed by HTTP.
///
/// # Examples
///
/// ```no_run
/// use oauth_consent::config::AuthorizationServerConfig;
/// use oauth_consent::oauth::api::{AuthorizationServer, HttpAuthorizationServer};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = AuthorizationServerConfig {
///     base_url: "https://auth.example.com".to_string(),
///     access_token: Some("token".to_string()),
///     ..Default::default()
/// };
/// let server = HttpAuthorizationServer::new(&config)?;
/// let metadata = server.client_metadata("client-1", "conversion").await?;
/// println!("{}", metadata.name);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpAuthorizationServer {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpAuthorizationServer {
    /// Builds a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConsentError::Config`] if the base URL or credential cannot
    /// be used, or [`ConsentError::Http`] if the HTTP client fails to build.
    pub fn new(config: &AuthorizationServerConfig) -> ConsentResult<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            ConsentError::Config(format!("invalid authorization server URL: {e}"))
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(value) = config.authorization_header() {
            let mut value = HeaderValue::from_str(&value).map_err(|_| {
                ConsentError::Config(
                    "authorization_server.access_token is not a valid header value".to_string(),
                )
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .build()?;

        Ok(Self { http, base_url })
    }

    fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        let joined = format!("{}{}", self.base_url.path().trim_end_matches('/'), path);
        url.set_path(&joined);
        url.set_query(None);
        url
    }

    async fn read_failure(resp: reqwest::Response) -> ConsentError {
        let status = resp.status().as_u16();
        let body = resp.json::<ApiErrorBody>().await.unwrap_or_default();
        body.into_error(status)
    }
}

#[async_trait]
impl AuthorizationServer for HttpAuthorizationServer {
    async fn client_metadata(&self, client_id: &str, scope: &str) -> ConsentResult<ClientMetadata> {
        let mut url = self.endpoint(SCOPES_PATH);
        url.query_pairs_mut()
            .append_pair("client_id", client_id)
            .append_pair("scope", scope);

        tracing::debug!(client_id = %client_id, scope = %scope, "Resolving client metadata");

        let resp = self.http.get(url).send().await.map_err(|e| {
            tracing::warn!(client_id = %client_id, error = %e, "Scopes request failed");
            ConsentError::Network(RESOLVE_NETWORK_FAILURE.to_string())
        })?;

        if !resp.status().is_success() {
            let error = Self::read_failure(resp).await;
            tracing::warn!(
                client_id = %client_id,
                status = ?error.status(),
                "Scopes endpoint returned an error: {}",
                error
            );
            return Err(error);
        }

        let status = resp.status().as_u16();
        let body: ScopesResponse = resp.json().await.map_err(|e| {
            tracing::warn!(client_id = %client_id, error = %e, "Malformed scopes response");
            ConsentError::Service {
                message: RESOLVE_NETWORK_FAILURE.to_string(),
                status: Some(status),
                code: None,
            }
        })?;

        Ok(body.data.into_metadata(client_id, scope))
    }

    async fn authorize(&self, request: &AuthorizationRequest) -> ConsentResult<AuthorizationResult> {
        let mut url = self.endpoint(AUTHORIZE_PATH);
        url.query_pairs_mut().extend_pairs(request.query_pairs());

        tracing::debug!(client_id = %request.client_id(), "Requesting authorization code");

        let resp = self.http.post(url).send().await.map_err(|e| {
            tracing::warn!(client_id = %request.client_id(), error = %e, "Authorize request failed");
            ConsentError::Network(AUTHORIZE_NETWORK_FAILURE.to_string())
        })?;

        if !resp.status().is_success() {
            let error = Self::read_failure(resp).await;
            tracing::warn!(
                client_id = %request.client_id(),
                status = ?error.status(),
                "Authorize endpoint returned an error: {}",
                error
            );
            return Err(error);
        }

        let status = resp.status().as_u16();
        resp.json::<AuthorizationResult>().await.map_err(|e| {
            tracing::warn!(client_id = %request.client_id(), error = %e, "Malformed authorize response");
            ConsentError::Service {
                message: AUTHORIZE_NETWORK_FAILURE.to_string(),
                status: Some(status),
                code: None,
            }
        })
    }
}
