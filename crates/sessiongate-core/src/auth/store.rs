use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::models::Session;

type Listener = Box<dyn Fn(Option<&Session>) + Send + Sync>;

/// The single holder of the current session.
///
/// Shared as `Arc<SessionStore>`. Every content change is published twice:
/// synchronously to listeners registered with [`SessionStore::on_change`],
/// and to async observers holding a [`SessionStore::subscribe`] receiver.
pub struct SessionStore {
    tx: watch::Sender<Option<Session>>,
    listeners: Mutex<Vec<Listener>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            tx,
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Current session, if any.
    pub fn current(&self) -> Option<Session> {
        self.tx.borrow().clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// Replace any stored session. Storing an identical session is a no-op.
    pub fn add(&self, session: Session) {
        let username = session.username().to_string();
        let changed = self.tx.send_if_modified(|current| {
            if current.as_ref() == Some(&session) {
                false
            } else {
                *current = Some(session);
                true
            }
        });

        if changed {
            info!(username = %username, "Session stored");
            self.notify();
        } else {
            debug!(username = %username, "Session unchanged");
        }
    }

    /// Clear the stored session. Safe to call when already empty.
    pub fn remove(&self) {
        let changed = self.tx.send_if_modified(|current| current.take().is_some());
        if changed {
            info!("Session removed");
            self.notify();
        }
    }

    /// Receiver for async observers; always holds the latest content.
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.tx.subscribe()
    }

    /// Register a listener called inline after every content change.
    ///
    /// Listeners run on the writer's thread and must not write to the store.
    pub fn on_change(&self, listener: impl Fn(Option<&Session>) + Send + Sync + 'static) {
        self.listeners().push(Box::new(listener));
    }

    fn notify(&self) {
        // Snapshot first so no channel lock is held while listeners run
        let snapshot = self.current();
        for listener in self.listeners().iter() {
            listener(snapshot.as_ref());
        }
    }

    /// A listener that panicked poisons the lock; the list itself is still
    /// intact, so later changes keep reaching every listener.
    fn listeners(&self) -> MutexGuard<'_, Vec<Listener>> {
        self.listeners.lock().unwrap_or_else(|poisoned| {
            warn!("Session listener panicked earlier, continuing with remaining listeners");
            PoisonError::into_inner(poisoned)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn session(user_id: &str, username: &str) -> Session {
        Session::new(user_id, "t1", "2099-01-01", username).unwrap()
    }

    #[test]
    fn test_add_then_current_round_trip() {
        let store = SessionStore::new();
        let s = session("1", "alice");
        store.add(s.clone());
        assert_eq!(store.current(), Some(s));
        assert!(store.is_logged_in());
    }

    #[test]
    fn test_add_replaces_existing() {
        let store = SessionStore::new();
        store.add(session("1", "alice"));
        store.add(session("2", "bob"));
        assert_eq!(store.current().map(|s| s.username().to_string()), Some("bob".to_string()));
    }

    #[test]
    fn test_remove_twice_on_empty_store() {
        let store = SessionStore::new();
        store.remove();
        store.remove();
        assert_eq!(store.current(), None);
        assert!(!store.is_logged_in());
    }

    #[test]
    fn test_listeners_see_each_change_once() {
        let store = SessionStore::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(Mutex::new(Vec::new()));

        let calls_in = Arc::clone(&calls);
        let seen_in = Arc::clone(&seen);
        store.on_change(move |current| {
            calls_in.fetch_add(1, Ordering::SeqCst);
            seen_in.lock().unwrap().push(current.is_some());
        });

        let s = session("1", "alice");
        store.add(s.clone());
        store.add(s); // identical, no notification
        store.remove();
        store.remove(); // already empty, no notification

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(*seen.lock().unwrap(), vec![true, false]);
    }

    #[test]
    fn test_listener_can_read_store() {
        let store = Arc::new(SessionStore::new());
        let observed = Arc::new(Mutex::new(None));

        let store_in = Arc::clone(&store);
        let observed_in = Arc::clone(&observed);
        store.on_change(move |_| {
            *observed_in.lock().unwrap() = Some(store_in.is_logged_in());
        });

        store.add(session("1", "alice"));
        assert_eq!(*observed.lock().unwrap(), Some(true));
    }

    #[test]
    fn test_panicking_listener_does_not_silence_others() {
        let store = SessionStore::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let calls_in = Arc::clone(&calls);
        store.on_change(move |_| {
            calls_in.fetch_add(1, Ordering::SeqCst);
        });
        store.on_change(|current| {
            if current.is_some() {
                panic!("listener failure");
            }
        });

        let added = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            store.add(session("1", "alice"));
        }));
        assert!(added.is_err());
        assert!(store.is_logged_in());

        // Lock is poisoned now; removal must still reach the counting listener
        store.remove();
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let late = Arc::new(AtomicUsize::new(0));
        let late_in = Arc::clone(&late);
        store.on_change(move |_| {
            late_in.fetch_add(1, Ordering::SeqCst);
        });
        store.remove(); // already empty, no notification
        assert_eq!(late.load(Ordering::SeqCst), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_subscribers_observe_changes() {
        let store = SessionStore::new();
        let mut rx = store.subscribe();
        assert!(rx.borrow_and_update().is_none());

        store.add(session("1", "alice"));
        assert!(rx.has_changed().unwrap());
        let user_id = rx.borrow_and_update().as_ref().map(|s| s.user_id().to_string());
        assert_eq!(user_id.as_deref(), Some("1"));

        store.remove();
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_none());
    }
}
