//! Persistent key-value storage for the session mirror.
//!
//! Only two values ever leave memory: the expiry timestamp and the user
//! profile, each under its own fixed key, each as a JSON string:
//!
//! ```text
//! "expires_at" → 1718000000000
//! "user"       → {"sub":"abc","name":"Ada"}
//! ```
//!
//! There's no version tag and no envelope. A browser host backs
//! [`SessionStorage`] with `localStorage`; native hosts can use
//! [`FileStorage`]; server rendering uses [`NoStorage`].

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use authsync_identity::UserProfile;

use crate::SessionError;

/// Key holding the session expiry (epoch milliseconds, JSON number).
pub const EXPIRES_AT_KEY: &str = "expires_at";

/// Key holding the user profile (JSON object, or `null`).
pub const USER_KEY: &str = "user";

/// A string-to-string store that survives a reload.
///
/// Modeled on the browser's storage API: three calls, string values, no
/// transactions. Writes are last-write-wins; the reducer is the only
/// writer, so no coordination is needed.
pub trait SessionStorage: Send + Sync {
    /// Reads a value. `Ok(None)` if the key was never set.
    fn get_item(&self, key: &str) -> Result<Option<String>, SessionError>;

    /// Writes a value, replacing any previous one.
    fn set_item(&self, key: &str, value: &str) -> Result<(), SessionError>;

    /// Deletes a value. Removing a missing key is not an error.
    fn remove_item(&self, key: &str) -> Result<(), SessionError>;
}

/// Sharing a store (e.g. between the controller and a bootstrap reader)
/// is just wrapping it in an `Arc`.
impl<S: SessionStorage + ?Sized> SessionStorage for Arc<S> {
    fn get_item(&self, key: &str) -> Result<Option<String>, SessionError> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), SessionError> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), SessionError> {
        (**self).remove_item(key)
    }
}

// ---------------------------------------------------------------------------
// MemoryStorage
// ---------------------------------------------------------------------------

/// A process-local store. Values survive for the life of the process only.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys. A poisoned lock reads as empty.
    pub fn len(&self) -> usize {
        self.items.lock().map(|items| items.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, SessionError> {
        let items = self.items.lock().map_err(poisoned)?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), SessionError> {
        let mut items = self.items.lock().map_err(poisoned)?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), SessionError> {
        let mut items = self.items.lock().map_err(poisoned)?;
        items.remove(key);
        Ok(())
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> SessionError {
    SessionError::Storage("storage lock poisoned".into())
}

// ---------------------------------------------------------------------------
// FileStorage
// ---------------------------------------------------------------------------

/// A store backed by one JSON object on disk.
///
/// Every write rewrites the whole file. That's fine for two small keys and
/// keeps the file human-readable. A missing file reads as an empty store.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, SessionError> {
        match std::fs::read(&self.path) {
            Ok(bytes) if bytes.is_empty() => Ok(BTreeMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(BTreeMap::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(
        &self,
        items: &BTreeMap<String, String>,
    ) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let bytes = serde_json::to_vec_pretty(items)?;
        std::fs::write(&self.path, bytes)?;
        Ok(())
    }
}

impl SessionStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, SessionError> {
        let _guard = self.lock.lock().map_err(poisoned)?;
        Ok(self.read_all()?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), SessionError> {
        let _guard = self.lock.lock().map_err(poisoned)?;
        let mut items = self.read_all()?;
        items.insert(key.to_string(), value.to_string());
        self.write_all(&items)
    }

    fn remove_item(&self, key: &str) -> Result<(), SessionError> {
        let _guard = self.lock.lock().map_err(poisoned)?;
        let mut items = self.read_all()?;
        if items.remove(key).is_some() {
            self.write_all(&items)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// NoStorage
// ---------------------------------------------------------------------------

/// Used when the host has no persistent storage (server rendering).
/// Writes are dropped, reads find nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoStorage;

impl SessionStorage for NoStorage {
    fn get_item(&self, _key: &str) -> Result<Option<String>, SessionError> {
        Ok(None)
    }

    fn set_item(&self, _key: &str, _value: &str) -> Result<(), SessionError> {
        Ok(())
    }

    fn remove_item(&self, _key: &str) -> Result<(), SessionError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// PersistedSession
// ---------------------------------------------------------------------------

/// The two mirrored values, read back from storage.
///
/// The reducer never reads this. It exists for a host's bootstrap path,
/// e.g. to render a "welcome back" shell before the silent check resolves.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PersistedSession {
    pub expires_at: Option<u64>,
    pub user: Option<UserProfile>,
}

impl PersistedSession {
    /// Reads both keys.
    ///
    /// # Errors
    /// - [`SessionError::Malformed`] if a stored value isn't valid JSON of
    ///   the expected shape.
    /// - Whatever the backend reports for a failed read.
    pub fn load<S: SessionStorage + ?Sized>(
        storage: &S,
    ) -> Result<Self, SessionError> {
        let expires_at = match storage.get_item(EXPIRES_AT_KEY)? {
            Some(raw) => serde_json::from_str::<Option<u64>>(&raw)?,
            None => None,
        };
        let user = match storage.get_item(USER_KEY)? {
            Some(raw) => serde_json::from_str::<Option<UserProfile>>(&raw)?,
            None => None,
        };
        Ok(Self { expires_at, user })
    }

    /// Returns `true` if nothing is persisted.
    pub fn is_empty(&self) -> bool {
        self.expires_at.is_none() && self.user.is_none()
    }

    /// Same boundary rule as the live state: equal counts as expired.
    pub fn is_live_at(&self, now_ms: u64) -> bool {
        self.expires_at.is_some_and(|expires_at| now_ms < expires_at)
    }
}
