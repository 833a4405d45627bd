//! Authorization server client integration tests using wiremock
//!
//! Verifies the wire behavior of `src/oauth/api.rs`:
//!
//! - The scopes response is mapped into display metadata with defaults.
//! - Every call carries the configured credential.
//! - Error bodies are decoded into service errors, preferring
//!   `error_description` over `message`.
//! - Transport failures become network errors with a fixed message.
//! - The authorize call forwards all seven request fields verbatim and
//!   exposes the server's code.

mod common;

use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use oauth_consent::config::AuthorizationServerConfig;
use oauth_consent::error::ConsentError;
use oauth_consent::oauth::api::{
    AUTHORIZE_NETWORK_FAILURE, GENERIC_API_FAILURE, RESOLVE_NETWORK_FAILURE,
};
use oauth_consent::oauth::metadata::{FALLBACK_SCOPE_DESCRIPTION, NO_DESCRIPTION, UNKNOWN_APPLICATION};
use oauth_consent::oauth::params::{validate, RawParams};
use oauth_consent::oauth::{AuthorizationServer, HttpAuthorizationServer};

// ---------------------------------------------------------------------------
// Scopes endpoint
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_client_metadata_maps_scopes_response() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/oauth/scopes"))
        .and(query_param("client_id", "client-abc"))
        .and(query_param("scope", "conversion"))
        .and(header("authorization", "Bearer test-token-123"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::scopes_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = common::http_server(&server);
    let metadata = client
        .client_metadata("client-abc", "conversion")
        .await
        .expect("scopes lookup should succeed");

    assert_eq!(metadata.id, "client-abc");
    assert_eq!(metadata.name, "Zapier");
    assert_eq!(metadata.description, "Automate your conversion workflows");
    assert_eq!(
        metadata.logo.as_deref(),
        Some("https://cdn.example.com/zapier.png")
    );
    assert!(!metadata.previously_consented);

    let names: Vec<&str> = metadata.scopes.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["read_conversion_data", "create_conversions"]);
    assert_eq!(metadata.scopes[0].description, "Read conversion data");
}

#[tokio::test]
async fn test_client_metadata_fills_defaults_for_sparse_response() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/oauth/scopes"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"data": {"client_id": "other-id"}})),
        )
        .mount(&server)
        .await;

    let metadata = common::http_server(&server)
        .client_metadata("client-abc", "conversion")
        .await
        .expect("scopes lookup should succeed");

    assert_eq!(metadata.id, "client-abc", "server echo must not replace the request's client id");
    assert_eq!(metadata.name, UNKNOWN_APPLICATION);
    assert_eq!(metadata.description, NO_DESCRIPTION);
    assert!(metadata.logo.is_none());
    assert_eq!(metadata.scopes.len(), 1);
    assert_eq!(metadata.scopes[0].name, "conversion");
    assert_eq!(metadata.scopes[0].description, FALLBACK_SCOPE_DESCRIPTION);
}

#[tokio::test]
async fn test_client_metadata_respects_base_path() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/oauth/scopes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::scopes_body()))
        .expect(1)
        .mount(&server)
        .await;

    let config = AuthorizationServerConfig {
        base_url: format!("{}/api/v1/", server.uri()),
        access_token: Some(common::TEST_TOKEN.to_string()),
        ..Default::default()
    };
    let client = HttpAuthorizationServer::new(&config).expect("client builds");

    assert!(client.client_metadata("client-abc", "conversion").await.is_ok());
}

#[tokio::test]
async fn test_raw_credential_when_scheme_is_empty() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/oauth/scopes"))
        .and(header("authorization", "raw-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::scopes_body()))
        .expect(1)
        .mount(&server)
        .await;

    let config = AuthorizationServerConfig {
        base_url: server.uri(),
        access_token: Some("raw-secret".to_string()),
        auth_scheme: String::new(),
        ..Default::default()
    };
    let client = HttpAuthorizationServer::new(&config).expect("client builds");

    assert!(client.client_metadata("client-abc", "conversion").await.is_ok());
}

#[tokio::test]
async fn test_client_metadata_decodes_error_description() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/oauth/scopes"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "error": "invalid_client",
            "error_description": "Unknown client",
            "message": "ignored"
        })))
        .mount(&server)
        .await;

    let err = common::http_server(&server)
        .client_metadata("client-abc", "conversion")
        .await
        .expect_err("401 must fail");

    match err {
        ConsentError::Service {
            message,
            status,
            code,
        } => {
            assert_eq!(message, "Unknown client");
            assert_eq!(status, Some(401));
            assert_eq!(code.as_deref(), Some("invalid_client"));
        }
        other => panic!("expected service error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_client_metadata_falls_back_to_message_then_generic() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/oauth/scopes"))
        .and(query_param("client_id", "with-message"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(serde_json::json!({"message": "Not found"})),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/oauth/scopes"))
        .and(query_param("client_id", "no-body"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let client = common::http_server(&server);

    let err = client
        .client_metadata("with-message", "conversion")
        .await
        .expect_err("404 must fail");
    assert_eq!(err.to_string(), "Not found");
    assert_eq!(err.status(), Some(404));

    let err = client
        .client_metadata("no-body", "conversion")
        .await
        .expect_err("500 must fail");
    assert_eq!(err.to_string(), GENERIC_API_FAILURE);
    assert_eq!(err.status(), Some(500));
}

#[tokio::test]
async fn test_client_metadata_network_failure() {
    // Nothing listens on the reserved discard port.
    let config = AuthorizationServerConfig {
        base_url: "http://127.0.0.1:9".to_string(),
        access_token: Some(common::TEST_TOKEN.to_string()),
        timeout_seconds: 2,
        ..Default::default()
    };
    let client = HttpAuthorizationServer::new(&config).expect("client builds");

    let err = client
        .client_metadata("client-abc", "conversion")
        .await
        .expect_err("connection must fail");
    assert!(matches!(err, ConsentError::Network(_)), "got {err:?}");
    assert_eq!(err.to_string(), RESOLVE_NETWORK_FAILURE);
}

// ---------------------------------------------------------------------------
// Authorize endpoint
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_authorize_forwards_all_seven_fields() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/authorize"))
        .and(query_param("client_id", "client-abc"))
        .and(query_param("scope", "conversion"))
        .and(query_param("state", common::STATE))
        .and(query_param("redirect_uri", common::REDIRECT_URI))
        .and(query_param("response_type", "code"))
        .and(query_param("code_challenge", common::CHALLENGE))
        .and(query_param("code_challenge_method", "S256"))
        .and(header("authorization", "Bearer test-token-123"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"code": "abc123", "state": "server-state"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let request = validate(&RawParams::from_query(&common::authorize_query(&[])))
        .expect("request should be valid");

    let result = common::http_server(&server)
        .authorize(&request)
        .await
        .expect("authorize should succeed");

    assert_eq!(result.code, "abc123");
    assert_eq!(result.state.as_deref(), Some("server-state"));
}

#[tokio::test]
async fn test_authorize_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/authorize"))
        .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
            "error": "server_error",
            "error_description": "Database unavailable"
        })))
        .mount(&server)
        .await;

    let request = validate(&RawParams::from_query(&common::authorize_query(&[])))
        .expect("request should be valid");

    let err = common::http_server(&server)
        .authorize(&request)
        .await
        .expect_err("500 must fail");
    assert_eq!(err.to_string(), "Database unavailable");
    assert_eq!(err.status(), Some(500));
}

#[tokio::test]
async fn test_authorize_malformed_success_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/authorize"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"nope": 1})))
        .mount(&server)
        .await;

    let request = validate(&RawParams::from_query(&common::authorize_query(&[])))
        .expect("request should be valid");

    let err = common::http_server(&server)
        .authorize(&request)
        .await
        .expect_err("body without a code must fail");
    assert_eq!(err.to_string(), AUTHORIZE_NETWORK_FAILURE);
    assert_eq!(err.status(), Some(200));
}
