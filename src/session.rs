//! Server-side sessions
//!
//! A browser is identified by a random cookie; its state lives in a bounded
//! LRU cache. The state remembers which edge the user last opened so the
//! experiment page can drill into it without re-reading the edge document.

use crate::report::EdgeSession;
use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::COOKIE;
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue};
use lru::LruCache;
use std::convert::Infallible;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "pathcore_session";

/// Per-browser state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    /// Pages visited in this session
    pub counter: u64,
    /// Edge currently being viewed
    pub edge: Option<EdgeSession>,
}

impl Session {
    /// Start a fresh navigation: forget the viewed edge and count the visit
    pub fn start_visit(&mut self) {
        self.edge = None;
        self.counter += 1;
    }

    pub fn count_visit(&mut self) {
        self.counter += 1;
    }

    /// Cached edge if it is the one being asked for
    pub fn edge_for(&self, edge_name: &crate::model::EdgeName) -> Option<&EdgeSession> {
        self.edge.as_ref().filter(|e| &e.edge_name == edge_name)
    }
}

/// Bounded session cache shared by all handlers
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<Mutex<LruCache<Uuid, Session>>>,
}

impl SessionStore {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            sessions: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    /// Snapshot of a session; unknown ids read as an empty session
    pub async fn get(&self, id: &SessionId) -> Session {
        let mut sessions = self.sessions.lock().await;
        sessions.get(&id.id).cloned().unwrap_or_default()
    }

    /// Run `f` against the session, creating it if needed
    pub async fn update<F, R>(&self, id: &SessionId, f: F) -> R
    where
        F: FnOnce(&mut Session) -> R,
    {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.get_or_insert_mut(id.id, Session::default);
        f(session)
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Session id taken from the request cookie, or a fresh one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionId {
    pub id: Uuid,
    pub is_new: bool,
}

impl SessionId {
    pub fn generate() -> Self {
        Self {
            id: Uuid::new_v4(),
            is_new: true,
        }
    }

    pub fn from_headers(headers: &HeaderMap) -> Self {
        let existing = headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == SESSION_COOKIE)
            .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok());

        match existing {
            Some(id) => Self { id, is_new: false },
            None => Self::generate(),
        }
    }

    /// `Set-Cookie` value for a session the browser does not know yet
    pub fn set_cookie(&self) -> Option<HeaderValue> {
        if !self.is_new {
            return None;
        }
        let cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, self.id);
        HeaderValue::from_str(&cookie).ok()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for SessionId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = Self::from_headers(&parts.headers);
        if id.is_new {
            debug!("Starting session {}", id.id);
        }
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EdgeName;
    use crate::report::HeatmapExperiments;
    use indexmap::IndexMap;

    fn edge_session(pw0: &str, pw1: &str) -> EdgeSession {
        EdgeSession {
            edge_name: EdgeName::new(pw0, pw1),
            experiments: HeatmapExperiments::default(),
            genes: vec![],
            odds_ratios: IndexMap::new(),
            ownership: vec![],
        }
    }

    #[test]
    fn test_session_id_from_cookie() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("theme=dark; {}={}", SESSION_COOKIE, id)).unwrap(),
        );
        let session_id = SessionId::from_headers(&headers);
        assert_eq!(session_id.id, id);
        assert!(!session_id.is_new);
        assert!(session_id.set_cookie().is_none());
    }

    #[test]
    fn test_session_id_without_cookie() {
        let session_id = SessionId::from_headers(&HeaderMap::new());
        assert!(session_id.is_new);
        let cookie = session_id.set_cookie().unwrap();
        assert!(cookie.to_str().unwrap().starts_with("pathcore_session="));
    }

    #[test]
    fn test_invalid_cookie_starts_new_session() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("pathcore_session=garbage"));
        assert!(SessionId::from_headers(&headers).is_new);
    }

    #[test]
    fn test_edge_for_matches_name() {
        let mut session = Session::default();
        session.edge = Some(edge_session("A", "B"));
        assert!(session.edge_for(&EdgeName::new("A", "B")).is_some());
        assert!(session.edge_for(&EdgeName::new("B", "A")).is_none());

        session.start_visit();
        assert!(session.edge.is_none());
        assert_eq!(session.counter, 1);
    }

    #[tokio::test]
    async fn test_store_update_and_eviction() {
        let store = SessionStore::new(1);
        let first = SessionId::generate();
        let second = SessionId::generate();

        store.update(&first, |s| s.count_visit()).await;
        store.update(&first, |s| s.count_visit()).await;
        assert_eq!(store.get(&first).await.counter, 2);

        store.update(&second, |s| s.edge = Some(edge_session("A", "B"))).await;
        assert_eq!(store.len().await, 1);
        assert_eq!(store.get(&first).await, Session::default());
        assert!(store.get(&second).await.edge.is_some());
    }
}
