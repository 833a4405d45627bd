//! Redirect URL construction
//!
//! Builds the URL the user agent is sent back to once the consent flow
//! finishes. Outcome parameters are merged into the caller's
//! `redirect_uri`: existing parameters with the same name are overwritten in
//! place, every other parameter is kept as it was.

use std::fmt;

use url::Url;

/// OAuth error codes delivered to the requesting application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectError {
    /// The user declined the request
    AccessDenied,
    /// The authorization server failed or could not be reached
    ServerError,
}

impl RedirectError {
    /// Canonical token placed in the `error` parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            RedirectError::AccessDenied => "access_denied",
            RedirectError::ServerError => "server_error",
        }
    }
}

impl fmt::Display for RedirectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Success redirect: `redirect_uri` with `code` and `state` set.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use oauth_consent::oauth::redirect::build_success;
///
/// let base = Url::parse("https://app.example.com/cb?tenant=7").unwrap();
/// let url = build_success(&base, "abc123", "xyz");
/// assert_eq!(url.as_str(), "https://app.example.com/cb?tenant=7&code=abc123&state=xyz");
/// ```
pub fn build_success(redirect_uri: &Url, code: &str, state: &str) -> Url {
    with_params(redirect_uri, &[("code", code), ("state", state)])
}

/// Error redirect: `redirect_uri` with `error` set, and `state` /
/// `error_description` set only when given.
pub fn build_error(
    redirect_uri: &Url,
    error: RedirectError,
    state: Option<&str>,
    description: Option<&str>,
) -> Url {
    let mut params = vec![("error", error.as_str())];
    if let Some(state) = state.filter(|s| !s.is_empty()) {
        params.push(("state", state));
    }
    if let Some(description) = description.filter(|d| !d.is_empty()) {
        params.push(("error_description", description));
    }
    with_params(redirect_uri, &params)
}

/// Sets each `(name, value)` on the query of `base`.
///
/// Mirrors `URLSearchParams.set`: the first existing occurrence of a name
/// takes the new value, later duplicates are removed, and new names are
/// appended at the end.
fn with_params(base: &Url, params: &[(&str, &str)]) -> Url {
    let mut pairs: Vec<(String, String)> = base
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    for (name, value) in params {
        match pairs.iter().position(|(k, _)| k == name) {
            Some(first) => {
                pairs[first].1 = value.to_string();
                let mut index = 0;
                pairs.retain(|(k, _)| {
                    let keep = index <= first || k != name;
                    index += 1;
                    keep
                });
            }
            None => pairs.push((name.to_string(), value.to_string())),
        }
    }

    let mut url = base.clone();
    url.query_pairs_mut().clear().extend_pairs(&pairs);
    url
}
