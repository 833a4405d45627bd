//! Client display metadata shown on the consent screen
//!
//! The authorization server describes an application and the permissions
//! it asks for through `GET /oauth/scopes`. This module holds the wire
//! shape of that response and maps it into [`ClientMetadata`], filling in
//! display defaults where the server is silent.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Display name used when the server does not name the application.
pub const UNKNOWN_APPLICATION: &str = "Unknown Application";

/// Description used when the server does not describe the application.
pub const NO_DESCRIPTION: &str = "No description available";

/// Description of the synthesized scope when the server lists none.
pub const FALLBACK_SCOPE_DESCRIPTION: &str = "Access to conversion data";

/// One requested permission, as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeDescriptor {
    /// Machine slug, `[a-z0-9_]` only
    pub name: String,
    /// Human readable text
    pub description: String,
}

/// Everything the consent screen shows about the requesting application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientMetadata {
    /// The client identifier the request was made with
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    /// Requested permissions, in server order; never empty
    pub scopes: Vec<ScopeDescriptor>,
    /// The user already granted this application access before
    #[serde(default)]
    pub previously_consented: bool,
}

impl ClientMetadata {
    /// Letter shown in place of a logo, if the application has none.
    pub fn initial(&self) -> char {
        self.name
            .chars()
            .next()
            .map(|c| c.to_uppercase().next().unwrap_or(c))
            .unwrap_or('?')
    }
}

/// Success body of `GET /oauth/scopes`.
#[derive(Debug, Clone, Deserialize)]
pub struct ScopesResponse {
    pub data: ScopesData,
}

/// The `data` object of [`ScopesResponse`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScopesData {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display_description: Option<String>,
    #[serde(default)]
    pub logo_uri: Option<String>,
    #[serde(default)]
    pub scope_description: Option<Vec<String>>,
    #[serde(default)]
    pub previous_consented: Option<bool>,
}

impl ScopesData {
    /// Maps the server payload into display metadata.
    ///
    /// `client_id` and `scope` are the values of the validated request; the
    /// server's own `client_id` echo is not used.
    pub fn into_metadata(self, client_id: &str, scope: &str) -> ClientMetadata {
        let scopes = match self.scope_description {
            Some(descriptions) if !descriptions.is_empty() => descriptions
                .into_iter()
                .map(|description| ScopeDescriptor {
                    name: scope_slug(&description),
                    description,
                })
                .collect(),
            _ => vec![ScopeDescriptor {
                name: scope.to_string(),
                description: FALLBACK_SCOPE_DESCRIPTION.to_string(),
            }],
        };

        ClientMetadata {
            id: client_id.to_string(),
            name: non_empty(self.name).unwrap_or_else(|| UNKNOWN_APPLICATION.to_string()),
            description: non_empty(self.display_description)
                .unwrap_or_else(|| NO_DESCRIPTION.to_string()),
            logo: non_empty(self.logo_uri),
            scopes,
            previously_consented: self.previous_consented.unwrap_or(false),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn separator_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("static pattern is valid"))
}

/// Derives a machine slug from a scope description.
///
/// Lowercases, collapses every run of characters outside `[a-z0-9]` into a
/// single `_`, and strips leading and trailing `_`.
///
/// # Examples
///
/// ```
/// use oauth_consent::oauth::metadata::scope_slug;
///
/// assert_eq!(scope_slug("Read your conversion data!"), "read_your_conversion_data");
/// ```
pub fn scope_slug(description: &str) -> String {
    let lowered = description.to_lowercase();
    separator_runs()
        .replace_all(&lowered, "_")
        .trim_matches('_')
        .to_string()
}
