//! In-memory registry of live consent sessions
//!
//! The consent page and the Approve/Deny submission arrive as separate HTTP
//! requests, so the [`ConsentFlow`] of a rendered page is kept here between
//! them, keyed by a random session id. Sessions expire after a fixed TTL and
//! nothing survives a restart.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::consent::flow::ConsentFlow;

/// Returned when the registry already holds its maximum number of sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("too many active consent sessions")]
pub struct SessionLimitReached;

#[derive(Debug)]
struct SessionEntry {
    flow: Arc<ConsentFlow>,
    expires_at: DateTime<Utc>,
}

/// Live consent sessions.
#[derive(Debug)]
pub struct SessionStore {
    ttl: Duration,
    max_sessions: usize,
    sessions: RwLock<HashMap<Uuid, SessionEntry>>,
}

impl SessionStore {
    pub fn new(ttl: std::time::Duration, max_sessions: usize) -> Self {
        Self {
            ttl: Duration::from_std(ttl).unwrap_or_else(|_| Duration::days(1)),
            max_sessions,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Registers `flow` and returns its session id.
    ///
    /// Expired sessions are evicted first.
    pub fn insert(&self, flow: Arc<ConsentFlow>) -> Result<Uuid, SessionLimitReached> {
        self.insert_at(flow, Utc::now())
    }

    fn insert_at(
        &self,
        flow: Arc<ConsentFlow>,
        now: DateTime<Utc>,
    ) -> Result<Uuid, SessionLimitReached> {
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        sessions.retain(|_, entry| entry.expires_at > now);

        if sessions.len() >= self.max_sessions {
            tracing::warn!(active = sessions.len(), "Consent session limit reached");
            return Err(SessionLimitReached);
        }

        let id = Uuid::new_v4();
        sessions.insert(
            id,
            SessionEntry {
                flow,
                expires_at: now
                    .checked_add_signed(self.ttl)
                    .unwrap_or(DateTime::<Utc>::MAX_UTC),
            },
        );
        Ok(id)
    }

    /// Looks up a live session.
    pub fn get(&self, id: &Uuid) -> Option<Arc<ConsentFlow>> {
        self.get_at(id, Utc::now())
    }

    fn get_at(&self, id: &Uuid, now: DateTime<Utc>) -> Option<Arc<ConsentFlow>> {
        let sessions = self.sessions.read().unwrap_or_else(|e| e.into_inner());
        sessions
            .get(id)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| Arc::clone(&entry.flow))
    }

    /// Number of stored sessions, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
