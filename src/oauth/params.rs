//! Authorization request parsing and validation
//!
//! Turns the raw query parameters of an incoming `/oauth/authorize` request
//! into an [`AuthorizationRequest`]. Only the authorization code grant with
//! PKCE `S256` is accepted.
//!
//! Validation never stops at the first problem: every violated constraint is
//! reported, in a fixed field order, so a developer integrating with the
//! flow sees everything that is wrong with their request at once.

use std::collections::HashMap;
use std::fmt;

use url::Url;

use crate::error::ConsentError;

/// The only supported `response_type`.
pub const RESPONSE_TYPE_CODE: &str = "code";

/// The only supported `code_challenge_method`.
pub const CHALLENGE_METHOD_S256: &str = "S256";

// ---------------------------------------------------------------------------
// Fields
// ---------------------------------------------------------------------------

/// One of the seven query parameters of an authorization request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamField {
    ClientId,
    Scope,
    State,
    RedirectUri,
    ResponseType,
    CodeChallenge,
    CodeChallengeMethod,
}

impl ParamField {
    /// All fields, in validation and wire order.
    pub const ALL: [ParamField; 7] = [
        ParamField::ClientId,
        ParamField::Scope,
        ParamField::State,
        ParamField::RedirectUri,
        ParamField::ResponseType,
        ParamField::CodeChallenge,
        ParamField::CodeChallengeMethod,
    ];

    /// Query parameter name.
    pub fn name(self) -> &'static str {
        match self {
            ParamField::ClientId => "client_id",
            ParamField::Scope => "scope",
            ParamField::State => "state",
            ParamField::RedirectUri => "redirect_uri",
            ParamField::ResponseType => "response_type",
            ParamField::CodeChallenge => "code_challenge",
            ParamField::CodeChallengeMethod => "code_challenge_method",
        }
    }

    /// Message reported when this field is invalid.
    pub fn violation_message(self) -> &'static str {
        match self {
            ParamField::ClientId => "Client ID is required",
            ParamField::Scope => "Scope is required",
            ParamField::State => "State is required",
            ParamField::RedirectUri => "Invalid redirect URI",
            ParamField::ResponseType => "Response type must be \"code\"",
            ParamField::CodeChallenge => "Code challenge is required",
            ParamField::CodeChallengeMethod => "Code challenge method must be \"S256\"",
        }
    }
}

impl fmt::Display for ParamField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Raw parameters
// ---------------------------------------------------------------------------

/// Raw query parameters as received, before validation.
///
/// Lookups of absent keys yield the empty string. When a key appears more
/// than once, the first occurrence wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawParams {
    values: HashMap<String, String>,
}

impl RawParams {
    /// Builds raw parameters from an already-decoded map.
    pub fn new(values: HashMap<String, String>) -> Self {
        Self { values }
    }

    /// Parses a form-urlencoded query string (without the leading `?`).
    pub fn from_query(query: &str) -> Self {
        let mut values = HashMap::new();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            values
                .entry(key.into_owned())
                .or_insert_with(|| value.into_owned());
        }
        Self { values }
    }

    /// Accepts either a full authorization URL or a bare query string.
    pub fn from_url_or_query(input: &str) -> Self {
        let input = input.trim();
        match Url::parse(input) {
            Ok(url) => Self::from_query(url.query().unwrap_or_default()),
            Err(_) => Self::from_query(input.trim_start_matches('?')),
        }
    }

    /// Value for `field`, or `""` when absent.
    pub fn get(&self, field: ParamField) -> &str {
        self.values
            .get(field.name())
            .map(String::as_str)
            .unwrap_or_default()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = HashMap::new();
        for (k, v) in iter {
            values.entry(k.into()).or_insert_with(|| v.into());
        }
        Self { values }
    }
}

// ---------------------------------------------------------------------------
// Validated request
// ---------------------------------------------------------------------------

/// A validated authorization request.
///
/// Can only be obtained through [`validate`]; every field is read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    client_id: String,
    scope: String,
    state: String,
    redirect_uri: String,
    redirect_target: Url,
    code_challenge: String,
}

impl AuthorizationRequest {
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// The caller's opaque `state`, exactly as received.
    pub fn state(&self) -> &str {
        &self.state
    }

    /// The `redirect_uri` exactly as received.
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// The parsed `redirect_uri` that outcomes are delivered to.
    pub fn redirect_target(&self) -> &Url {
        &self.redirect_target
    }

    pub fn response_type(&self) -> &'static str {
        RESPONSE_TYPE_CODE
    }

    pub fn code_challenge(&self) -> &str {
        &self.code_challenge
    }

    pub fn code_challenge_method(&self) -> &'static str {
        CHALLENGE_METHOD_S256
    }

    /// All seven fields as `(name, value)` pairs, in wire order.
    pub fn query_pairs(&self) -> [(&'static str, &str); 7] {
        [
            (ParamField::ClientId.name(), self.client_id()),
            (ParamField::Scope.name(), self.scope()),
            (ParamField::State.name(), self.state()),
            (ParamField::RedirectUri.name(), self.redirect_uri()),
            (ParamField::ResponseType.name(), self.response_type()),
            (ParamField::CodeChallenge.name(), self.code_challenge()),
            (
                ParamField::CodeChallengeMethod.name(),
                self.code_challenge_method(),
            ),
        ]
    }
}

// ---------------------------------------------------------------------------
// Violations
// ---------------------------------------------------------------------------

/// Every constraint an authorization request failed, in field order.
///
/// Never empty when returned from [`validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violations {
    fields: Vec<ParamField>,
}

impl Violations {
    /// The invalid fields, in field order.
    pub fn fields(&self) -> &[ParamField] {
        &self.fields
    }

    /// Whether `field` is among the invalid ones.
    pub fn contains(&self, field: ParamField) -> bool {
        self.fields.contains(&field)
    }

    /// Human-readable messages, one per invalid field.
    pub fn messages(&self) -> Vec<String> {
        self.fields
            .iter()
            .map(|f| f.violation_message().to_string())
            .collect()
    }
}

impl From<Violations> for ConsentError {
    fn from(violations: Violations) -> Self {
        ConsentError::Validation(violations.messages())
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validates raw parameters into an [`AuthorizationRequest`].
///
/// Returns either a complete request or every violation; never a partial
/// request alongside messages.
///
/// # Examples
///
/// ```
/// use oauth_consent::oauth::params::{validate, RawParams};
///
/// let raw = RawParams::from_query("client_id=app&response_type=token");
/// let violations = validate(&raw).unwrap_err();
/// assert!(violations
///     .messages()
///     .contains(&"Response type must be \"code\"".to_string()));
/// ```
pub fn validate(raw: &RawParams) -> Result<AuthorizationRequest, Violations> {
    let mut fields = Vec::new();

    let client_id = raw.get(ParamField::ClientId);
    if client_id.is_empty() {
        fields.push(ParamField::ClientId);
    }

    let scope = raw.get(ParamField::Scope);
    if scope.is_empty() {
        fields.push(ParamField::Scope);
    }

    let state = raw.get(ParamField::State);
    if state.is_empty() {
        fields.push(ParamField::State);
    }

    let redirect_uri = raw.get(ParamField::RedirectUri);
    let redirect_target = Url::parse(redirect_uri).ok();
    if redirect_target.is_none() {
        fields.push(ParamField::RedirectUri);
    }

    if raw.get(ParamField::ResponseType) != RESPONSE_TYPE_CODE {
        fields.push(ParamField::ResponseType);
    }

    let code_challenge = raw.get(ParamField::CodeChallenge);
    if code_challenge.is_empty() {
        fields.push(ParamField::CodeChallenge);
    }

    if raw.get(ParamField::CodeChallengeMethod) != CHALLENGE_METHOD_S256 {
        fields.push(ParamField::CodeChallengeMethod);
    }

    match redirect_target {
        Some(redirect_target) if fields.is_empty() => Ok(AuthorizationRequest {
            client_id: client_id.to_string(),
            scope: scope.to_string(),
            state: state.to_string(),
            redirect_uri: redirect_uri.to_string(),
            redirect_target,
            code_challenge: code_challenge.to_string(),
        }),
        _ => Err(Violations { fields }),
    }
}
