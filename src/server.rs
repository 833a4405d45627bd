//! Consent HTTP service
//!
//! Routes:
//! - GET /oauth/authorize - Validate the request and show the consent screen
//! - POST /oauth/authorize/:session_id/approve - Approve and redirect with a code
//! - POST /oauth/authorize/:session_id/deny - Decline and redirect with `access_denied`
//! - GET /healthz - Liveness probe
//!
//! Invalid requests and authorization server failures during the initial
//! page load are shown inline. Once the user has decided, the outcome is
//! always delivered to the application's `redirect_uri` with a
//! `303 See Other`. Decided sessions stay registered until they expire, so
//! a repeated or concurrent submission receives the same redirect.

use std::sync::Arc;

use axum::{
    extract::{Path, RawQuery, State},
    http::{header, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Router,
};
use uuid::Uuid;

use crate::consent::controller::{ConsentState, FailureCause};
use crate::consent::flow::ConsentFlow;
use crate::consent::render;
use crate::consent::session::SessionStore;
use crate::oauth::api::AuthorizationServer;
use crate::oauth::params::RawParams;

/// Shared state of the consent routes.
#[derive(Clone)]
pub struct AppState {
    /// Authorization server every new session talks to
    pub server: Arc<dyn AuthorizationServer>,
    /// Live consent sessions, decided or not
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(server: Arc<dyn AuthorizationServer>, sessions: SessionStore) -> Self {
        Self {
            server,
            sessions: Arc::new(sessions),
        }
    }
}

/// Builds the consent router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/oauth/authorize", get(authorize_page_handler))
        .route(
            "/oauth/authorize/:session_id/approve",
            post(approve_handler),
        )
        .route("/oauth/authorize/:session_id/deny", post(deny_handler))
        .route("/healthz", get(|| async { "ok" }))
        .with_state(state)
}

/// Show the consent screen.
///
/// GET /oauth/authorize?client_id=..&scope=..&state=..&redirect_uri=..
///     &response_type=code&code_challenge=..&code_challenge_method=S256
async fn authorize_page_handler(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Response {
    let raw = RawParams::from_query(query.as_deref().unwrap_or_default());
    let flow = Arc::new(ConsentFlow::new(Arc::clone(&state.server)));

    match flow.load(&raw).await {
        ConsentState::Ready(consent) => match state.sessions.insert(Arc::clone(&flow)) {
            Ok(session_id) => {
                tracing::info!(
                    session_id = %session_id,
                    client_id = %consent.request.client_id(),
                    "Consent screen rendered"
                );
                page(
                    StatusCode::OK,
                    render::render_consent_page(&consent, session_id),
                )
            }
            Err(e) => page(
                StatusCode::SERVICE_UNAVAILABLE,
                render::render_message_page("Authorization Error", &e.to_string()),
            ),
        },
        other => state_response(&other),
    }
}

/// Approve a pending consent.
///
/// POST /oauth/authorize/:session_id/approve
async fn approve_handler(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Response {
    let Some(flow) = state.sessions.get(&session_id) else {
        return session_not_found(session_id);
    };

    match flow.approve().await {
        Some(settled) => state_response(&settled),
        None => repeated_decision(&flow, session_id).await,
    }
}

/// Deny a pending consent.
///
/// POST /oauth/authorize/:session_id/deny
async fn deny_handler(State(state): State<AppState>, Path(session_id): Path<Uuid>) -> Response {
    let Some(flow) = state.sessions.get(&session_id) else {
        return session_not_found(session_id);
    };

    match flow.deny().await {
        Some(settled) => state_response(&settled),
        None => repeated_decision(&flow, session_id).await,
    }
}

/// Maps a settled state to its HTTP response.
fn state_response(consent_state: &ConsentState) -> Response {
    match consent_state {
        ConsentState::Redirected(redirect) => {
            tracing::info!(outcome = ?redirect.outcome, "Redirecting to application");
            Redirect::to(redirect.location.as_str()).into_response()
        }
        ConsentState::Error(failure) => {
            let status = match failure.cause {
                FailureCause::InvalidRequest => StatusCode::BAD_REQUEST,
                FailureCause::Upstream => StatusCode::BAD_GATEWAY,
            };
            page(status, render::render_error_page(failure))
        }
        other => page(
            StatusCode::CONFLICT,
            render::render_message_page(
                "Authorization in progress",
                &format!(
                    "This authorization request is not awaiting a decision ({}).",
                    other.name()
                ),
            ),
        ),
    }
}

/// A decision for a session that already has one.
///
/// Waits for an in-flight authorization to finish, then answers with the
/// outcome of the first decision.
async fn repeated_decision(flow: &ConsentFlow, session_id: Uuid) -> Response {
    let settled = flow.settled().await;
    tracing::debug!(
        session_id = %session_id,
        state = settled.name(),
        "Repeated decision answered with the settled outcome"
    );
    state_response(&settled)
}

fn session_not_found(session_id: Uuid) -> Response {
    tracing::debug!(session_id = %session_id, "Unknown or expired consent session");
    page(
        StatusCode::NOT_FOUND,
        render::render_message_page(
            "Authorization Error",
            "This authorization request has expired. Return to the application and try again.",
        ),
    )
}

fn page(status: StatusCode, html: String) -> Response {
    let mut response = (status, Html(html)).into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}
