//! In-memory store of operator selection state, keyed by session id.

use std::collections::HashMap;
use std::time::Duration;

use herald_core::extraction::ExtractionResult;
use herald_core::selection::OperatorSelection;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// Idle time after which a session is dropped (default: one hour).
pub const DEFAULT_SESSION_IDLE_TTL_SECS: u64 = 3600;

/// Most sessions held at once (default).
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

struct SessionEntry {
    selection: OperatorSelection,
    last_seen: Instant,
}

/// Holds one [`OperatorSelection`] per operator session.
///
/// Sessions are created lazily on first write. Every read or write of a
/// session refreshes it. Sessions idle longer than the TTL are dropped by
/// [`SessionStore::evict_idle`], and creating a session while the store is
/// full evicts the least recently seen one.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SessionEntry>>,
    idle_ttl: Duration,
    max_sessions: usize,
}

impl SessionStore {
    pub fn new(idle_ttl: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            idle_ttl,
            max_sessions: max_sessions.max(1),
        }
    }

    /// Copy of the session's state, empty if the session is unknown.
    pub async fn snapshot(&self, session_id: &str) -> OperatorSelection {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(session_id) {
            Some(entry) => {
                entry.last_seen = Instant::now();
                entry.selection.clone()
            }
            None => OperatorSelection::default(),
        }
    }

    /// Store a fresh extraction for the session, resetting its selection.
    pub async fn record_extraction(&self, session_id: &str, extraction: ExtractionResult) {
        self.update(session_id, |sel| sel.record_extraction(extraction))
            .await;
    }

    /// Apply `f` to the session's state, creating it if needed.
    pub async fn update<F, R>(&self, session_id: &str, f: F) -> R
    where
        F: FnOnce(&mut OperatorSelection) -> R,
    {
        let mut sessions = self.sessions.write().await;
        let now = Instant::now();

        if !sessions.contains_key(session_id) && sessions.len() >= self.max_sessions {
            self.make_room(&mut sessions, now);
        }

        let entry = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| SessionEntry {
                selection: OperatorSelection::default(),
                last_seen: now,
            });
        entry.last_seen = now;
        f(&mut entry.selection)
    }

    /// Drop sessions idle for longer than the TTL. Returns how many went.
    pub async fn evict_idle(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        let now = Instant::now();
        sessions.retain(|_, entry| now.duration_since(entry.last_seen) < self.idle_ttl);
        before - sessions.len()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    // ---- private helpers ----

    fn make_room(&self, sessions: &mut HashMap<String, SessionEntry>, now: Instant) {
        sessions.retain(|_, entry| now.duration_since(entry.last_seen) < self.idle_ttl);
        if sessions.len() < self.max_sessions {
            return;
        }

        let oldest = sessions
            .iter()
            .min_by_key(|(_, entry)| entry.last_seen)
            .map(|(id, _)| id.clone());
        if let Some(id) = oldest {
            tracing::debug!(session_id = %id, "Session store full, evicting oldest session");
            sessions.remove(&id);
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(
            Duration::from_secs(DEFAULT_SESSION_IDLE_TTL_SECS),
            DEFAULT_MAX_SESSIONS,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn select(sel: &mut OperatorSelection, name: &str) {
        sel.select(name);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_sessions_are_evicted_after_ttl() {
        let store = SessionStore::new(Duration::from_secs(60), 100);
        store.update("stale", |sel| select(sel, "a")).await;
        tokio::time::advance(Duration::from_secs(30)).await;
        store.update("fresh", |sel| select(sel, "b")).await;

        tokio::time::advance(Duration::from_secs(31)).await;
        assert_eq!(store.evict_idle().await, 1);

        assert_eq!(store.session_count().await, 1);
        assert!(store.snapshot("stale").await.selected().is_empty());
        assert_eq!(store.snapshot("fresh").await.selected(), ["b"]);
    }

    #[tokio::test(start_paused = true)]
    async fn reading_a_session_keeps_it_alive() {
        let store = SessionStore::new(Duration::from_secs(60), 100);
        store.update("op", |sel| select(sel, "a")).await;

        tokio::time::advance(Duration::from_secs(50)).await;
        store.snapshot("op").await;
        tokio::time::advance(Duration::from_secs(50)).await;

        assert_eq!(store.evict_idle().await, 0);
        assert_eq!(store.session_count().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn full_store_evicts_least_recently_seen() {
        let store = SessionStore::new(Duration::from_secs(3600), 2);
        store.update("first", |sel| select(sel, "a")).await;
        tokio::time::advance(Duration::from_secs(1)).await;
        store.update("second", |sel| select(sel, "b")).await;
        tokio::time::advance(Duration::from_secs(1)).await;
        store.snapshot("first").await;
        tokio::time::advance(Duration::from_secs(1)).await;

        store.update("third", |sel| select(sel, "c")).await;

        assert_eq!(store.session_count().await, 2);
        assert!(store.snapshot("second").await.selected().is_empty());
        assert_eq!(store.snapshot("first").await.selected(), ["a"]);
        assert_eq!(store.snapshot("third").await.selected(), ["c"]);
    }

    #[tokio::test]
    async fn unknown_session_snapshot_creates_nothing() {
        let store = SessionStore::default();
        assert!(store.snapshot("nobody").await.selected().is_empty());
        assert_eq!(store.session_count().await, 0);
    }
}
