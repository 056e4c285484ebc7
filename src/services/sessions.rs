//! In-memory session tokens for API clients

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::sync::RwLock;
use uuid::Uuid;

use super::identity::Session;

struct Entry {
    session: Session,
    /// `None` when the lifetime runs past what `Instant` can represent
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

/// Maps bearer tokens to sessions. Nothing here is persisted.
///
/// Tokens expire `ttl` after login; expired entries are dropped on lookup
/// and swept whenever a new session is opened.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Entry>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Store a session and hand out its token
    pub async fn open(&self, session: Session) -> Uuid {
        let now = Instant::now();
        let token = Uuid::new_v4();
        let entry = Entry {
            session,
            expires_at: now.checked_add(self.ttl),
        };

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| entry.is_live(now));
        if sessions.len() < before {
            tracing::debug!("Pruned {} expired sessions", before - sessions.len());
        }
        sessions.insert(token, entry);
        token
    }

    /// Live session for `token`; an expired token is removed and refused
    pub async fn get(&self, token: &Uuid) -> Option<Session> {
        let now = Instant::now();
        {
            let sessions = self.sessions.read().await;
            match sessions.get(token) {
                Some(entry) if entry.is_live(now) => return Some(entry.session.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        self.sessions.write().await.remove(token);
        tracing::debug!(%token, "Session expired");
        None
    }

    /// Forget a token, returning the session it pointed to if still live
    pub async fn close(&self, token: &Uuid) -> Option<Session> {
        let now = Instant::now();
        self.sessions
            .write()
            .await
            .remove(token)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.session)
    }

    /// Number of stored tokens, expired ones not yet swept included
    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
