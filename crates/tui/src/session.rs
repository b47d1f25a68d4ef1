//! Session store: the bearer token, persisted so it survives restarts.
//!
//! The token is the only gate for authenticated requests. It is written by
//! login, logout and session-expiry recovery, nothing else.

use std::{
    fmt, fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError, RwLock},
};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Durable storage for the token. `None` means logged out.
pub trait TokenStore: Send + Sync + fmt::Debug {
    fn load(&self) -> Result<Option<String>>;
    fn save(&self, token: Option<&str>) -> Result<()>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionFile {
    token: Option<String>,
}

/// JSON file store. A missing file is an empty session.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let file: SessionFile = serde_json::from_str(&content)?;
        Ok(file.token.filter(|token| !token.is_empty()))
    }

    fn save(&self, token: Option<&str>) -> Result<()> {
        let Some(token) = token else {
            return match fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(err) => Err(err.into()),
            };
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let payload = serde_json::to_string_pretty(&SessionFile {
            token: Some(token.to_string()),
        })?;
        fs::write(&self.path, payload)?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self
            .token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, token: Option<&str>) -> Result<()> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = token.map(str::to_string);
        Ok(())
    }
}

#[derive(Debug)]
struct Inner {
    store: Box<dyn TokenStore>,
    token: RwLock<Option<String>>,
}

/// Process-wide session handle. Clones share the same token.
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<Inner>,
}

impl Session {
    /// Opens the session from `store`. An unreadable store starts logged out.
    pub fn open(store: impl TokenStore + 'static) -> Self {
        let token = match store.load() {
            Ok(token) => token,
            Err(err) => {
                tracing::warn!("unreadable session store, starting logged out: {err}");
                None
            }
        };
        Self {
            inner: Arc::new(Inner {
                store: Box::new(store),
                token: RwLock::new(token),
            }),
        }
    }

    pub fn in_memory() -> Self {
        Self::open(MemoryTokenStore::default())
    }

    pub fn get(&self) -> Option<String> {
        self.inner
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.get().is_some()
    }

    /// Stores `token`; an empty or absent token clears the session.
    ///
    /// A storage failure is logged: the in-memory value still changes, so the
    /// running process stays consistent.
    pub fn set(&self, token: Option<&str>) {
        let token = token.filter(|token| !token.is_empty());
        *self
            .inner
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = token.map(str::to_string);

        if let Err(err) = self.inner.store.save(token) {
            tracing::error!("failed to persist session token: {err}");
        }
    }

    pub fn clear(&self) {
        self.set(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../../target/test_state")
            .join(format!("session_{}.json", uuid::Uuid::new_v4()))
    }

    #[test]
    fn last_set_wins_and_absent_clears() {
        let session = Session::in_memory();
        assert_eq!(session.get(), None);

        for token in ["a", "b", "c"] {
            session.set(Some(token));
            assert_eq!(session.get().as_deref(), Some(token));
        }

        session.set(None);
        assert_eq!(session.get(), None);
        assert!(!session.is_authenticated());
    }

    #[test]
    fn empty_token_is_absent() {
        let session = Session::in_memory();
        session.set(Some("abc"));
        session.set(Some(""));
        assert_eq!(session.get(), None);
    }

    #[test]
    fn clones_share_the_token() {
        let session = Session::in_memory();
        let other = session.clone();
        session.set(Some("shared"));
        assert_eq!(other.get().as_deref(), Some("shared"));
        other.clear();
        assert_eq!(session.get(), None);
    }

    #[test]
    fn file_store_survives_reopen() {
        let path = temp_path();

        let session = Session::open(FileTokenStore::new(&path));
        assert_eq!(session.get(), None);
        session.set(Some("persisted"));

        let reopened = Session::open(FileTokenStore::new(&path));
        assert_eq!(reopened.get().as_deref(), Some("persisted"));

        reopened.clear();
        assert!(!path.exists());
        assert_eq!(Session::open(FileTokenStore::new(&path)).get(), None);
    }

    #[test]
    fn corrupt_file_starts_logged_out() {
        let path = temp_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "not json").unwrap();

        let session = Session::open(FileTokenStore::new(&path));
        assert_eq!(session.get(), None);
        fs::remove_file(&path).unwrap();
    }
}
