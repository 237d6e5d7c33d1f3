use std::path::PathBuf;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Token file name in the cache directory
const TOKEN_FILE: &str = "token.json";

#[derive(Debug, Serialize, Deserialize)]
struct StoredToken {
    token: String,
    saved_at: DateTime<Utc>,
}

/// Holds the current short-lived access token.
///
/// Clone is cheap and all clones share the same slot, so the client, the
/// refresh task, and the caller observe a single token. The slot is
/// mutated only by login, a successful refresh, or logout; a failed
/// refresh clears it.
#[derive(Clone, Default)]
pub struct TokenStore {
    slot: Arc<RwLock<Option<String>>>,
    path: Option<PathBuf>,
}

impl TokenStore {
    /// A purely in-memory store. Dropping the last clone forgets the token.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// A store that mirrors the token to `cache_dir/token.json` so a
    /// restart can resume the session without logging in again. Loads any
    /// previously persisted token on open.
    pub fn persistent(cache_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&cache_dir).with_context(|| {
            format!("Failed to create cache directory: {}", cache_dir.display())
        })?;

        let path = cache_dir.join(TOKEN_FILE);
        let initial = if path.exists() {
            let contents =
                std::fs::read_to_string(&path).context("Failed to read token file")?;
            let stored: StoredToken =
                serde_json::from_str(&contents).context("Failed to parse token file")?;
            Some(stored.token)
        } else {
            None
        };

        Ok(Self {
            slot: Arc::new(RwLock::new(initial)),
            path: Some(path),
        })
    }

    pub fn set(&self, token: String) {
        if let Some(ref path) = self.path {
            if let Err(error) = Self::save_file(path, &token) {
                warn!(%error, "Failed to persist access token");
            }
        }
        *self.write_slot() = Some(token);
    }

    pub fn get(&self) -> Option<String> {
        self.read_slot().clone()
    }

    pub fn clear(&self) {
        if let Some(ref path) = self.path {
            if path.exists() {
                if let Err(error) = std::fs::remove_file(path) {
                    warn!(%error, "Failed to remove persisted token");
                }
            }
        }
        *self.write_slot() = None;
    }

    pub fn is_empty(&self) -> bool {
        self.read_slot().is_none()
    }

    fn save_file(path: &PathBuf, token: &str) -> Result<()> {
        let stored = StoredToken {
            token: token.to_string(),
            saved_at: Utc::now(),
        };
        let contents = serde_json::to_string_pretty(&stored)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    // A poisoned lock still holds a valid Option, so recover the guard.
    fn read_slot(&self) -> RwLockReadGuard<'_, Option<String>> {
        self.slot.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_slot(&self) -> RwLockWriteGuard<'_, Option<String>> {
        self.slot.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_one_slot() {
        let store = TokenStore::in_memory();
        let other = store.clone();

        assert!(store.is_empty());
        store.set("abc".to_string());
        assert_eq!(other.get().as_deref(), Some("abc"));

        other.clear();
        assert!(store.is_empty());
        assert_eq!(store.get(), None);
    }

    #[test]
    fn persistent_store_survives_reopen() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");

        let store = TokenStore::persistent(dir.path().to_path_buf())
            .expect("Failed to open persistent store");
        store.set("persisted-token".to_string());

        let reopened = TokenStore::persistent(dir.path().to_path_buf())
            .expect("Failed to reopen persistent store");
        assert_eq!(reopened.get().as_deref(), Some("persisted-token"));

        reopened.clear();
        let reopened_again = TokenStore::persistent(dir.path().to_path_buf())
            .expect("Failed to reopen cleared store");
        assert!(reopened_again.is_empty());
    }
}
