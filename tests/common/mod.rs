use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;
use wiremock::MockServer;

use oauth_consent::config::AuthorizationServerConfig;
use oauth_consent::oauth::HttpAuthorizationServer;

#[allow(dead_code)]
pub const TEST_TOKEN: &str = "test-token-123";
#[allow(dead_code)]
pub const REDIRECT_URI: &str = "https://app.example.com/callback";
#[allow(dead_code)]
pub const STATE: &str = "st4te-xyz";
#[allow(dead_code)]
pub const CHALLENGE: &str = "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM";

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Authorization server client pointed at a wiremock instance.
#[allow(dead_code)]
pub fn http_server(mock: &MockServer) -> Arc<HttpAuthorizationServer> {
    let config = AuthorizationServerConfig {
        base_url: mock.uri(),
        access_token: Some(TEST_TOKEN.to_string()),
        ..Default::default()
    };
    Arc::new(HttpAuthorizationServer::new(&config).expect("failed to build client"))
}

/// Query string of a valid authorization request, with `overrides`
/// replacing (or, with an empty value, removing) individual fields.
#[allow(dead_code)]
pub fn authorize_query(overrides: &[(&str, &str)]) -> String {
    let defaults = [
        ("client_id", "client-abc"),
        ("scope", "conversion"),
        ("state", STATE),
        ("redirect_uri", REDIRECT_URI),
        ("response_type", "code"),
        ("code_challenge", CHALLENGE),
        ("code_challenge_method", "S256"),
    ];

    let mut query = url::form_urlencoded::Serializer::new(String::new());
    for (name, default) in defaults {
        let value = overrides
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| *v)
            .unwrap_or(default);
        if !value.is_empty() {
            query.append_pair(name, value);
        }
    }
    query.finish()
}

/// Success body of the scopes endpoint.
#[allow(dead_code)]
pub fn scopes_body() -> serde_json::Value {
    serde_json::json!({
        "data": {
            "client_id": "client-abc",
            "name": "Zapier",
            "display_description": "Automate your conversion workflows",
            "logo_uri": "https://cdn.example.com/zapier.png",
            "scope_description": ["Read conversion data", "Create conversions"],
            "previous_consented": false
        }
    })
}
