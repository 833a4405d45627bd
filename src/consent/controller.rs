//! Consent state machine
//!
//! [`ConsentController`] owns the single [`ConsentState`] value of one
//! consent session. Everything the user sees is a projection of that value.
//!
//! ```text
//! Loading ──▶ Error
//!    │
//!    ▼
//!  Ready ──deny──────────────▶ Redirected
//!    │
//!  approve
//!    ▼
//! Authorizing ──ok / failure─▶ Redirected
//! ```
//!
//! The controller performs no I/O. Network work happens between
//! [`ConsentController::navigate`] and [`ConsentController::resolve`] (and
//! between [`ConsentController::approve`] and
//! [`ConsentController::authorized`]); the ticket handed out in between
//! carries the navigation generation it belongs to, so a completion that
//! arrives after a newer navigation started is discarded instead of
//! overwriting the newer state.

use url::Url;

use crate::error::{ConsentError, ConsentResult};
use crate::oauth::api::AuthorizationResult;
use crate::oauth::metadata::ClientMetadata;
use crate::oauth::params::{self, AuthorizationRequest, RawParams};
use crate::oauth::redirect::{self, RedirectError};

/// `error_description` sent when the user declines.
pub const DENIED_DESCRIPTION: &str = "User denied the authorization request";

/// A validated request together with what the consent screen shows about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Consent {
    pub request: AuthorizationRequest,
    pub client: ClientMetadata,
}

/// Why the flow stopped on the inline error screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCause {
    /// The incoming parameters were invalid; no redirect target is trusted
    InvalidRequest,
    /// The authorization server failed or could not be reached
    Upstream,
}

/// Contents of the inline error screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub cause: FailureCause,
    /// Never empty
    pub messages: Vec<String>,
}

/// How the flow ended when it navigated back to the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// An authorization code was issued
    Approved,
    /// The user declined (`access_denied`)
    Denied,
    /// Issuing the code failed (`server_error`)
    Failed,
}

/// Final navigation target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub location: Url,
    pub outcome: Outcome,
}

/// The state of one consent session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsentState {
    Loading,
    /// Waiting for the user's decision
    Ready(Consent),
    /// Approve was submitted; further input is ignored
    Authorizing(Consent),
    /// Terminal: the user agent is sent to `location`
    Redirected(Redirect),
    /// Terminal: shown inline
    Error(Failure),
}

impl ConsentState {
    /// Whether no further transition is possible for this navigation.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConsentState::Redirected(_) | ConsentState::Error(_))
    }

    pub fn name(&self) -> &'static str {
        match self {
            ConsentState::Loading => "loading",
            ConsentState::Ready(_) => "ready",
            ConsentState::Authorizing(_) => "authorizing",
            ConsentState::Redirected(_) => "redirected",
            ConsentState::Error(_) => "error",
        }
    }
}

/// Result of feeding a completion back into the controller.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied,
    /// The completion belonged to an older navigation or an unexpected state
    Discarded,
}

/// Ticket for an in-flight metadata resolution.
#[derive(Debug)]
pub struct PendingResolution {
    generation: u64,
    request: AuthorizationRequest,
}

impl PendingResolution {
    pub fn request(&self) -> &AuthorizationRequest {
        &self.request
    }
}

/// Ticket for an in-flight authorization code request.
#[derive(Debug)]
pub struct PendingAuthorization {
    generation: u64,
    request: AuthorizationRequest,
}

impl PendingAuthorization {
    pub fn request(&self) -> &AuthorizationRequest {
        &self.request
    }
}

/// Drives one consent session through its states.
#[derive(Debug)]
pub struct ConsentController {
    state: ConsentState,
    generation: u64,
}

impl Default for ConsentController {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsentController {
    pub fn new() -> Self {
        Self {
            state: ConsentState::Loading,
            generation: 0,
        }
    }

    pub fn state(&self) -> &ConsentState {
        &self.state
    }

    /// Number of navigations seen so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Starts over with a new parameter set.
    ///
    /// Validates `raw`. On failure the state becomes [`ConsentState::Error`]
    /// and `None` is returned. On success the state is
    /// [`ConsentState::Loading`] and the returned ticket must be completed
    /// with [`Self::resolve`] once metadata resolution finishes.
    pub fn navigate(&mut self, raw: &RawParams) -> Option<PendingResolution> {
        self.generation += 1;
        self.state = ConsentState::Loading;

        match params::validate(raw) {
            Ok(request) => {
                tracing::debug!(
                    generation = self.generation,
                    client_id = %request.client_id(),
                    "Authorization request accepted"
                );
                Some(PendingResolution {
                    generation: self.generation,
                    request,
                })
            }
            Err(violations) => {
                tracing::info!(
                    generation = self.generation,
                    violations = violations.fields().len(),
                    "Authorization request rejected"
                );
                self.state = ConsentState::Error(Failure {
                    cause: FailureCause::InvalidRequest,
                    messages: violations.messages(),
                });
                None
            }
        }
    }

    /// Completes metadata resolution.
    ///
    /// Failures are shown inline even though the redirect target is already
    /// known at this point.
    pub fn resolve(
        &mut self,
        pending: PendingResolution,
        outcome: ConsentResult<ClientMetadata>,
    ) -> Transition {
        if pending.generation != self.generation || self.state != ConsentState::Loading {
            tracing::debug!(
                stale = pending.generation,
                current = self.generation,
                "Discarding stale client metadata"
            );
            return Transition::Discarded;
        }

        self.state = match outcome {
            Ok(client) => ConsentState::Ready(Consent {
                request: pending.request,
                client,
            }),
            Err(error) => ConsentState::Error(Failure {
                cause: cause_of(&error),
                messages: error.messages(),
            }),
        };
        Transition::Applied
    }

    /// The user approved.
    ///
    /// Only valid from [`ConsentState::Ready`]; anywhere else (including a
    /// second click while authorizing) this is a no-op returning `None`.
    pub fn approve(&mut self) -> Option<PendingAuthorization> {
        let consent = match &self.state {
            ConsentState::Ready(consent) => consent.clone(),
            _ => return None,
        };
        let pending = PendingAuthorization {
            generation: self.generation,
            request: consent.request.clone(),
        };
        self.state = ConsentState::Authorizing(consent);
        Some(pending)
    }

    /// Completes the authorization code request.
    ///
    /// The redirect always carries the `state` of the original request; any
    /// `state` echoed by the authorization server is ignored.
    pub fn authorized(
        &mut self,
        pending: PendingAuthorization,
        outcome: ConsentResult<AuthorizationResult>,
    ) -> Transition {
        if pending.generation != self.generation
            || !matches!(self.state, ConsentState::Authorizing(_))
        {
            return Transition::Discarded;
        }

        let request = &pending.request;
        self.state = ConsentState::Redirected(match outcome {
            Ok(result) => {
                if result.state.as_deref() != Some(request.state()) {
                    tracing::debug!(
                        client_id = %request.client_id(),
                        "Authorization server state echo differs from request; using request state"
                    );
                }
                Redirect {
                    location: redirect::build_success(
                        request.redirect_target(),
                        &result.code,
                        request.state(),
                    ),
                    outcome: Outcome::Approved,
                }
            }
            Err(error) => {
                tracing::warn!(client_id = %request.client_id(), "Authorization failed: {}", error);
                Redirect {
                    location: redirect::build_error(
                        request.redirect_target(),
                        RedirectError::ServerError,
                        Some(request.state()),
                        Some(&error.to_string()),
                    ),
                    outcome: Outcome::Failed,
                }
            }
        });
        Transition::Applied
    }

    /// The user declined.
    ///
    /// Only valid from [`ConsentState::Ready`]; returns the redirect target
    /// on success.
    pub fn deny(&mut self) -> Option<&Url> {
        let location = match &self.state {
            ConsentState::Ready(consent) => redirect::build_error(
                consent.request.redirect_target(),
                RedirectError::AccessDenied,
                Some(consent.request.state()),
                Some(DENIED_DESCRIPTION),
            ),
            _ => return None,
        };
        self.state = ConsentState::Redirected(Redirect {
            location,
            outcome: Outcome::Denied,
        });
        match &self.state {
            ConsentState::Redirected(redirect) => Some(&redirect.location),
            _ => None,
        }
    }
}

fn cause_of(error: &ConsentError) -> FailureCause {
    match error {
        ConsentError::Validation(_) => FailureCause::InvalidRequest,
        _ => FailureCause::Upstream,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::metadata::ScopesData;

    const STATE: &str = "-G2EoDooYcrJ5p8EF1AM677T8BvnSMxQMU4HtUjoQ4Y";

    fn raw() -> RawParams {
        RawParams::from_query(&format!(
            "client_id=client-1&scope=conversion&state={STATE}\
             &redirect_uri=https%3A%2F%2Fapp.example.com%2Fcb\
             &response_type=code&code_challenge=abc&code_challenge_method=S256"
        ))
    }

    fn metadata() -> ClientMetadata {
        ScopesData {
            name: Some("Example".to_string()),
            ..Default::default()
        }
        .into_metadata("client-1", "conversion")
    }

    fn ready() -> ConsentController {
        let mut controller = ConsentController::new();
        let pending = controller.navigate(&raw()).expect("valid request");
        assert_eq!(controller.resolve(pending, Ok(metadata())), Transition::Applied);
        controller
    }

    fn location(controller: &ConsentController) -> &str {
        match controller.state() {
            ConsentState::Redirected(redirect) => redirect.location.as_str(),
            other => panic!("expected redirect, got {}", other.name()),
        }
    }

    #[test]
    fn test_initial_state_is_loading() {
        let controller = ConsentController::new();
        assert_eq!(controller.state(), &ConsentState::Loading);
        assert_eq!(controller.generation(), 0);
    }

    #[test]
    fn test_invalid_request_goes_to_inline_error() {
        let mut controller = ConsentController::new();
        let pending = controller.navigate(&RawParams::from_query("client_id=abc"));
        assert!(pending.is_none());
        match controller.state() {
            ConsentState::Error(failure) => {
                assert_eq!(failure.cause, FailureCause::InvalidRequest);
                assert_eq!(failure.messages.len(), 6);
                assert_eq!(failure.messages[0], "Scope is required");
            }
            other => panic!("expected error, got {}", other.name()),
        }
        assert!(controller.state().is_terminal());
    }

    #[test]
    fn test_resolution_success_is_ready() {
        let controller = ready();
        match controller.state() {
            ConsentState::Ready(consent) => {
                assert_eq!(consent.client.name, "Example");
                assert_eq!(consent.request.state(), STATE);
            }
            other => panic!("expected ready, got {}", other.name()),
        }
    }

    #[test]
    fn test_resolution_failure_is_inline_error() {
        let mut controller = ConsentController::new();
        let pending = controller.navigate(&raw()).unwrap();
        let error = ConsentError::Service {
            message: "Client not found".to_string(),
            status: Some(404),
            code: None,
        };
        assert_eq!(controller.resolve(pending, Err(error)), Transition::Applied);
        assert_eq!(
            controller.state(),
            &ConsentState::Error(Failure {
                cause: FailureCause::Upstream,
                messages: vec!["Client not found".to_string()],
            })
        );
    }

    #[test]
    fn test_stale_resolution_is_discarded() {
        let mut controller = ConsentController::new();
        let first = controller.navigate(&raw()).unwrap();
        let second = controller.navigate(&raw()).unwrap();

        let failure = Err(ConsentError::Network("late".to_string()));
        assert_eq!(controller.resolve(first, failure), Transition::Discarded);
        assert_eq!(controller.state(), &ConsentState::Loading);

        assert_eq!(controller.resolve(second, Ok(metadata())), Transition::Applied);
        assert!(matches!(controller.state(), ConsentState::Ready(_)));
    }

    #[test]
    fn test_approve_success_uses_original_state() {
        let mut controller = ready();
        let pending = controller.approve().unwrap();
        assert!(matches!(controller.state(), ConsentState::Authorizing(_)));

        let result = AuthorizationResult {
            code: "abc123".to_string(),
            state: Some("tampered".to_string()),
        };
        assert_eq!(controller.authorized(pending, Ok(result)), Transition::Applied);
        assert_eq!(
            location(&controller),
            format!("https://app.example.com/cb?code=abc123&state={STATE}")
        );
    }

    #[test]
    fn test_approve_success_without_state_echo() {
        let mut controller = ready();
        let pending = controller.approve().unwrap();
        let result = AuthorizationResult {
            code: "abc123".to_string(),
            state: None,
        };
        let _ = controller.authorized(pending, Ok(result));
        assert!(location(&controller).ends_with(&format!("state={STATE}")));
    }

    #[test]
    fn test_approve_twice_is_noop() {
        let mut controller = ready();
        assert!(controller.approve().is_some());
        assert!(controller.approve().is_none());
        assert!(controller.deny().is_none());
        assert!(matches!(controller.state(), ConsentState::Authorizing(_)));
    }

    #[test]
    fn test_authorization_failure_redirects_with_server_error() {
        let mut controller = ready();
        let pending = controller.approve().unwrap();
        let error = ConsentError::Service {
            message: "Internal failure".to_string(),
            status: Some(500),
            code: None,
        };
        let _ = controller.authorized(pending, Err(error));
        assert_eq!(
            location(&controller),
            format!(
                "https://app.example.com/cb?error=server_error&state={STATE}\
                 &error_description=Internal+failure"
            )
        );
        assert!(matches!(
            controller.state(),
            ConsentState::Redirected(Redirect {
                outcome: Outcome::Failed,
                ..
            })
        ));
    }

    #[test]
    fn test_deny_redirects_with_access_denied() {
        let mut controller = ready();
        let url = controller.deny().unwrap().clone();
        assert_eq!(
            url.as_str(),
            format!(
                "https://app.example.com/cb?error=access_denied&state={STATE}\
                 &error_description=User+denied+the+authorization+request"
            )
        );
        assert!(controller.state().is_terminal());
    }

    #[test]
    fn test_no_transitions_out_of_terminal_states() {
        let mut controller = ready();
        let _ = controller.deny();
        assert!(controller.approve().is_none());
        assert!(controller.deny().is_none());

        let mut controller = ConsentController::new();
        let _ = controller.navigate(&RawParams::default());
        assert!(controller.approve().is_none());
        assert!(controller.deny().is_none());
    }

    #[test]
    fn test_authorization_after_renavigation_is_discarded() {
        let mut controller = ready();
        let pending = controller.approve().unwrap();
        let _ = controller.navigate(&raw());
        let result = AuthorizationResult {
            code: "abc".to_string(),
            state: None,
        };
        assert_eq!(controller.authorized(pending, Ok(result)), Transition::Discarded);
        assert_eq!(controller.state(), &ConsentState::Loading);
    }

    #[test]
    fn test_approve_before_ready_is_noop() {
        let mut controller = ConsentController::new();
        assert!(controller.approve().is_none());
        let _pending = controller.navigate(&raw());
        assert!(controller.approve().is_none());
        assert_eq!(controller.state(), &ConsentState::Loading);
    }
}
