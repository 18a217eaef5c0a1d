//! In-process session storage keyed by session id.
//!
//! # Design Decisions
//! - Entries carry a version; a commit from a copy loaded at an older
//!   version is discarded instead of overwriting newer state
//! - A commit for an id that is no longer stored (logout, renewal, expiry)
//!   is discarded unless the session is new or was just renewed
//! - Idle entries expire lazily on load and in bulk via `sweep`

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::session::{generate_id, Session};

/// Idle lifetime used unless configured otherwise.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(1440);

struct StoredSession {
    session: Session,
    version: u64,
    last_seen: Instant,
}

impl StoredSession {
    fn is_expired(&self, idle_timeout: Duration) -> bool {
        self.last_seen.elapsed() >= idle_timeout
    }
}

/// A thread-safe session store shared by all requests.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<DashMap<String, StoredSession>>,
    idle_timeout: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self {
            inner: Arc::default(),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Load the session named by the cookie, or start a fresh one.
    pub fn load(&self, id: Option<&str>) -> Session {
        if let Some(id) = id {
            if let Some(mut stored) = self.inner.get_mut(id) {
                if !stored.is_expired(self.idle_timeout) {
                    stored.last_seen = Instant::now();
                    let mut session = stored.session.clone();
                    session.version = stored.version;
                    return session;
                }
            }
            if self
                .inner
                .remove_if(id, |_, stored| stored.is_expired(self.idle_timeout))
                .is_some()
            {
                tracing::debug!(session_id = %id, "Session expired");
            }
        }

        let session = Session::fresh(generate_id());
        tracing::debug!(session_id = %session.id(), "Session started");
        session
    }

    /// Write back the session after the request.
    ///
    /// Returns whether the session is stored under its current id afterwards.
    pub fn commit(&self, mut session: Session) -> bool {
        let renewed = match session.previous_id.take() {
            Some(previous) => {
                self.inner.remove(&previous);
                tracing::debug!(session_id = %session.id(), previous_id = %previous, "Session id renewed");
                true
            }
            None => false,
        };

        if session.is_destroyed() {
            self.inner.remove(session.id());
            tracing::debug!(session_id = %session.id(), "Session destroyed");
            return false;
        }

        let fresh = std::mem::take(&mut session.fresh);
        let modified = std::mem::take(&mut session.dirty);
        let now = Instant::now();

        match self.inner.entry(session.id().to_string()) {
            Entry::Occupied(mut slot) => {
                let stored = slot.get_mut();
                stored.last_seen = now;
                if !modified {
                    return true;
                }
                if stored.version != session.version {
                    tracing::debug!(
                        session_id = %session.id(),
                        loaded = session.version,
                        current = stored.version,
                        "Stale session commit discarded"
                    );
                    return true;
                }
                stored.version += 1;
                stored.session = session;
                true
            }
            Entry::Vacant(slot) => {
                if !fresh && !renewed {
                    tracing::debug!(session_id = %session.id(), "Session gone before commit; discarded");
                    return false;
                }
                if !modified {
                    return false;
                }
                slot.insert(StoredSession {
                    version: session.version + 1,
                    session,
                    last_seen: now,
                });
                true
            }
        }
    }

    /// Drop every entry idle for longer than the timeout.
    pub fn sweep(&self) -> usize {
        let before = self.inner.len();
        self.inner.retain(|_, stored| !stored.is_expired(self.idle_timeout));
        before.saturating_sub(self.inner.len())
    }

    /// Run `sweep` every `every` until `shutdown` fires.
    pub fn spawn_sweeper(&self, every: Duration, mut shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = store.sweep();
                        if removed > 0 {
                            tracing::debug!(removed, remaining = store.len(), "Expired sessions swept");
                        }
                    }
                    _ = shutdown.recv() => break,
                }
            }
        })
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::Shutdown;

    fn signed_in(store: &SessionStore) -> String {
        let mut session = store.load(None);
        session.sign_in(3, "a@b.c", "A");
        let id = session.id().to_string();
        assert!(store.commit(session));
        id
    }

    #[test]
    fn test_unknown_id_starts_fresh_session() {
        let store = SessionStore::new();
        let session = store.load(Some("nope"));
        assert!(session.is_fresh());
        assert_ne!(session.id(), "nope");
    }

    #[test]
    fn test_commit_and_reload() {
        let store = SessionStore::new();
        let id = signed_in(&store);

        let reloaded = store.load(Some(&id));
        assert!(!reloaded.is_fresh());
        assert!(!reloaded.is_modified());
        assert_eq!(reloaded.user_id(), Some(3));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_untouched_fresh_sessions_are_not_stored() {
        let store = SessionStore::new();
        for _ in 0..100 {
            let mut session = store.load(None);
            assert!(session.take_flashes().is_empty());
            assert!(!store.commit(session));
        }
        assert!(store.is_empty());

        let mut session = store.load(None);
        session.flash("register_success", "You are registered and can log in");
        assert!(store.commit(session));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_destroyed_session_is_removed() {
        let store = SessionStore::new();
        let id = signed_in(&store);

        let mut session = store.load(Some(&id));
        session.destroy();
        assert!(!store.commit(session));
        assert!(store.is_empty());
        assert!(store.load(Some(&id)).is_fresh());
    }

    #[test]
    fn test_concurrent_commit_cannot_undo_logout() {
        let store = SessionStore::new();
        let id = signed_in(&store);

        let mut a = store.load(Some(&id));
        let mut b = store.load(Some(&id));
        b.flash("post_message", "Post has been added.");

        a.destroy();
        assert!(!store.commit(a));
        assert!(!store.commit(b));

        let reloaded = store.load(Some(&id));
        assert!(reloaded.is_fresh());
        assert!(!reloaded.is_logged_in());
        assert!(store.is_empty());
    }

    #[test]
    fn test_stale_commit_does_not_overwrite_newer_state() {
        let store = SessionStore::new();
        let id = signed_in(&store);

        let mut a = store.load(Some(&id));
        let mut b = store.load(Some(&id));
        a.flash("post_message", "Post has been added.");
        b.set("theme", "dark");

        assert!(store.commit(a));
        assert!(store.commit(b));

        let mut reloaded = store.load(Some(&id));
        assert_eq!(reloaded.get("theme"), None);
        assert_eq!(reloaded.take_flashes()["post_message"].message, "Post has been added.");
    }

    #[test]
    fn test_untouched_commit_never_conflicts() {
        let store = SessionStore::new();
        let id = signed_in(&store);

        let reader = store.load(Some(&id));
        let mut writer = store.load(Some(&id));
        writer.flash("x", "y");
        assert!(store.commit(reader));
        assert!(store.commit(writer));

        assert!(store.load(Some(&id)).has_flashes());
    }

    #[test]
    fn test_renewed_id_replaces_old_entry() {
        let store = SessionStore::new();
        let old_id = signed_in(&store);

        let mut session = store.load(Some(&old_id));
        session.sign_in(4, "b@c.d", "B");
        let new_id = session.id().to_string();
        assert_ne!(new_id, old_id);
        assert!(store.commit(session));

        assert!(store.load(Some(&old_id)).is_fresh());
        assert_eq!(store.load(Some(&new_id)).user_id(), Some(4));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_idle_sessions_expire() {
        let store = SessionStore::new().with_idle_timeout(Duration::ZERO);
        let id = signed_in(&store);
        signed_in(&store);
        assert_eq!(store.len(), 2);

        let reloaded = store.load(Some(&id));
        assert!(reloaded.is_fresh());
        assert_eq!(store.len(), 1);

        assert_eq!(store.sweep(), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn test_active_sessions_survive_sweep() {
        let store = SessionStore::new();
        let id = signed_in(&store);
        assert_eq!(store.sweep(), 0);
        assert_eq!(store.load(Some(&id)).user_id(), Some(3));
    }

    #[tokio::test]
    async fn test_sweeper_runs_until_shutdown() {
        let store = SessionStore::new().with_idle_timeout(Duration::ZERO);
        signed_in(&store);

        let shutdown = Shutdown::new();
        let handle = store.spawn_sweeper(Duration::from_millis(10), shutdown.subscribe());
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(store.is_empty());

        shutdown.trigger();
        let result = tokio::time::timeout(Duration::from_secs(5), handle).await;
        assert!(matches!(result, Ok(Ok(()))));
    }
}
