//! Async driver around [`ConsentController`]
//!
//! [`ConsentFlow`] pairs one controller with the authorization server and
//! performs the network calls the state machine asks for. The controller
//! lock is never held across a network call, so a re-navigation can start
//! while an older resolution is still in flight; the controller's
//! generation check then drops the older result.
//!
//! Every state change is also published on a `watch` channel, so a repeated
//! decision can wait for the first one to settle and report its outcome.

use std::sync::Arc;

use tokio::sync::{watch, Mutex};

use crate::consent::controller::{ConsentController, ConsentState};
use crate::oauth::api::AuthorizationServer;
use crate::oauth::params::RawParams;

/// One consent session bound to an authorization server.
pub struct ConsentFlow {
    server: Arc<dyn AuthorizationServer>,
    controller: Mutex<ConsentController>,
    published: watch::Sender<ConsentState>,
}

impl std::fmt::Debug for ConsentFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsentFlow").finish_non_exhaustive()
    }
}

impl ConsentFlow {
    pub fn new(server: Arc<dyn AuthorizationServer>) -> Self {
        let controller = ConsentController::new();
        let (published, _) = watch::channel(controller.state().clone());
        Self {
            server,
            controller: Mutex::new(controller),
            published,
        }
    }

    fn publish(&self, controller: &ConsentController) -> ConsentState {
        let state = controller.state().clone();
        self.published.send_replace(state.clone());
        state
    }

    /// Current state.
    pub async fn state(&self) -> ConsentState {
        self.controller.lock().await.state().clone()
    }

    /// Validates `raw` and, if it is valid, resolves client metadata.
    ///
    /// Returns the state after this navigation settled. If a newer
    /// navigation started meanwhile, that navigation's state is returned.
    pub async fn load(&self, raw: &RawParams) -> ConsentState {
        let pending = {
            let mut controller = self.controller.lock().await;
            let pending = controller.navigate(raw);
            self.publish(&controller);
            pending
        };

        if let Some(pending) = pending {
            let request = pending.request();
            let outcome = self
                .server
                .client_metadata(request.client_id(), request.scope())
                .await;
            let mut controller = self.controller.lock().await;
            let _ = controller.resolve(pending, outcome);
            return self.publish(&controller);
        }

        self.state().await
    }

    /// Approve: requests a code and settles on the redirect.
    ///
    /// Returns `None` without contacting the server when the session is not
    /// waiting for a decision (already authorizing, finished, or failed).
    pub async fn approve(&self) -> Option<ConsentState> {
        let pending = {
            let mut controller = self.controller.lock().await;
            let pending = controller.approve()?;
            self.publish(&controller);
            pending
        };

        tracing::info!(client_id = %pending.request().client_id(), "Consent approved");
        let outcome = self.server.authorize(pending.request()).await;

        let mut controller = self.controller.lock().await;
        let _ = controller.authorized(pending, outcome);
        Some(self.publish(&controller))
    }

    /// Deny: settles on the `access_denied` redirect.
    ///
    /// Returns `None` when the session is not waiting for a decision.
    pub async fn deny(&self) -> Option<ConsentState> {
        let mut controller = self.controller.lock().await;
        controller.deny()?;
        tracing::info!("Consent denied");
        Some(self.publish(&controller))
    }

    /// Waits until no authorization request is in flight and returns the
    /// resulting state.
    ///
    /// Returns immediately unless the session is `Authorizing`.
    pub async fn settled(&self) -> ConsentState {
        let mut published = self.published.subscribe();
        let settled = published
            .wait_for(|state| !matches!(state, ConsentState::Authorizing(_)))
            .await
            .map(|state| state.clone());
        match settled {
            Ok(state) => state,
            Err(_) => self.state().await,
        }
    }
}
