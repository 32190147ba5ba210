use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::Session;

use super::SessionStore;

/// Session file name in cache directory
const SESSION_FILE: &str = "session.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredSession {
    session: Session,
    saved_at: DateTime<Utc>,
}

/// On-disk copy of the current session, so a login survives restarts.
#[derive(Debug, Clone)]
pub struct SessionFile {
    cache_dir: PathBuf,
}

impl SessionFile {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.cache_dir.join(SESSION_FILE)
    }

    /// Load session from disk. Expired sessions are ignored.
    pub fn load(&self) -> Result<Option<Session>> {
        let path = self.path();
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path).context("Failed to read session file")?;
        let stored: StoredSession =
            serde_json::from_str(&contents).context("Failed to parse session file")?;

        if stored.session.is_expired() {
            debug!(saved_at = %stored.saved_at, "Stored session has expired");
            return Ok(None);
        }
        Ok(Some(stored.session))
    }

    /// Save session to disk
    pub fn save(&self, session: &Session) -> Result<()> {
        let path = self.path();
        write_json(
            &path,
            &StoredSession {
                session: session.clone(),
                saved_at: Utc::now(),
            },
        )
    }

    /// Remove the session file if present
    pub fn clear(&self) -> Result<()> {
        let path = self.path();
        if path.exists() {
            std::fs::remove_file(path).context("Failed to remove session file")?;
        }
        Ok(())
    }

    /// Put the saved session (if any) into `store`. Returns whether one was restored.
    pub fn restore_into(&self, store: &SessionStore) -> Result<bool> {
        match self.load()? {
            Some(session) => {
                store.add(session);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Keep the file in step with `store`: saved on add, removed on remove.
    pub fn attach(self, store: &SessionStore) {
        store.on_change(move |current| {
            let result = match current {
                Some(session) => self.save(session),
                None => self.clear(),
            };
            if let Err(e) = result {
                warn!(error = %e, "Failed to persist session change");
            }
        });
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let contents = serde_json::to_string_pretty(value)?;
    std::fs::write(path, contents)?;
    Ok(())
}
