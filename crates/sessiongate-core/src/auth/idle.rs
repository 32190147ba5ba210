use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info};

use super::SessionStore;

/// Logs the user out after a period without activity.
///
/// The timer is armed only while the store holds a session; arming starts a
/// fresh idle period. Must be spawned from within a tokio runtime. Dropping
/// the handle stops the background task.
pub struct IdleTimer {
    activity: watch::Sender<Instant>,
    task: JoinHandle<()>,
}

impl IdleTimer {
    pub fn spawn(store: Arc<SessionStore>, timeout: Duration) -> Self {
        let (activity, activity_rx) = watch::channel(Instant::now());
        let task = tokio::spawn(run(store, timeout, activity_rx));
        Self { activity, task }
    }

    /// Record user activity, postponing the timeout.
    pub fn touch(&self) {
        self.activity.send_replace(Instant::now());
    }

    pub fn stop(self) {
        self.task.abort();
    }
}

impl Drop for IdleTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(store: Arc<SessionStore>, timeout: Duration, mut activity: watch::Receiver<Instant>) {
    let mut sessions = store.subscribe();
    let mut armed = false;
    let mut last_activity = Instant::now();

    loop {
        let logged_in = sessions.borrow_and_update().is_some();
        if logged_in && !armed {
            last_activity = Instant::now();
            debug!(timeout_secs = timeout.as_secs(), "Idle timer armed");
        } else if !logged_in && armed {
            debug!("Idle timer disarmed");
        }
        armed = logged_in;

        if !armed {
            tokio::select! {
                res = sessions.changed() => {
                    if res.is_err() {
                        return;
                    }
                }
                res = activity.changed() => {
                    if res.is_err() {
                        return;
                    }
                    // Activity while logged out does not carry over
                    let _ = activity.borrow_and_update();
                }
            }
            continue;
        }

        tokio::select! {
            _ = sleep_until(last_activity + timeout) => {
                info!(idle_secs = timeout.as_secs(), "Idle timeout reached, removing session");
                store.remove();
            }
            res = activity.changed() => {
                if res.is_err() {
                    return;
                }
                last_activity = *activity.borrow_and_update();
            }
            res = sessions.changed() => {
                if res.is_err() {
                    return;
                }
            }
        }
    }
}
