//! Bearer token persistence.
//!
//! The token lives under a single named key in one of two key-value
//! backends, selected by [`StorageScope`]:
//!
//! - [`StorageScope::Session`] dies with the process (a browser tab's
//!   `sessionStorage`, natively an in-memory [`MemoryStore`]).
//! - [`StorageScope::Persistent`] survives restarts (`localStorage`,
//!   natively a JSON file via [`FileStore`]).
//!
//! Switching scope does NOT move or delete a token already written to the
//! other scope. A token saved under the persistent scope keeps sitting on
//! disk after a switch to the session scope, and `clear()` only ever
//! touches the scope that is active when it is called.

use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::SessionError;

/// Key the token is stored under unless configured otherwise.
pub const DEFAULT_TOKEN_KEY: &str = "auth_token";

// ---------------------------------------------------------------------------
// StorageScope
// ---------------------------------------------------------------------------

/// How long a stored token survives.
///
/// Deserializes from `"session"` / `"persistent"`, and also from the
/// browser names `"sessionStorage"` / `"localStorage"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageScope {
    /// Lives as long as the tab (or process).
    #[serde(alias = "sessionStorage")]
    Session,
    /// Lives until explicitly cleared.
    #[default]
    #[serde(alias = "localStorage")]
    Persistent,
}

/// Accepts the same names as deserialization.
impl FromStr for StorageScope {
    type Err = serde_json::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_value(serde_json::Value::String(s.to_string()))
    }
}

impl fmt::Display for StorageScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Session => f.write_str("session"),
            Self::Persistent => f.write_str("persistent"),
        }
    }
}

// ---------------------------------------------------------------------------
// KeyValueStore
// ---------------------------------------------------------------------------

/// A string-to-string store, the shape of browser web storage.
///
/// Methods take `&self`; implementations handle their own locking.
pub trait KeyValueStore: Send + Sync + 'static {
    /// Returns `Ok(None)` for a missing key.
    fn get(&self, key: &str) -> Result<Option<String>, SessionError>;

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError>;

    /// Removing a missing key succeeds.
    fn remove(&self, key: &str) -> Result<(), SessionError>;
}

impl<T: KeyValueStore> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        (**self).remove(key)
    }
}

/// In-memory store. Everything is gone when it is dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        let mut entries =
            self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        let mut entries =
            self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

/// A JSON object on disk (`{"auth_token": "..."}`).
///
/// Every operation re-reads the file, so two processes sharing the file see
/// each other's writes. Writes go to a sibling temp file first and are then
/// renamed into place.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FileStore {
    /// The file does not have to exist yet; it is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<HashMap<String, String>, SessionError> {
        let data = match std::fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(HashMap::new());
            }
            Err(e) => return Err(SessionError::Io(e)),
        };
        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(HashMap::new());
        }
        serde_json::from_slice(&data).map_err(SessionError::Corrupt)
    }

    fn save(&self, entries: &HashMap<String, String>) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let data = serde_json::to_vec_pretty(entries).map_err(SessionError::Corrupt)?;
        let tmp = self.path.with_extension("tmp");
        write_private(&tmp, &data)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Writes `data` to `path`, readable by the owner only on unix.
fn write_private(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    std::os::unix::fs::OpenOptionsExt::mode(&mut options, 0o600);

    let mut file = options.open(path)?;
    // `mode` only applies on creation; a leftover temp file keeps its bits.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(data)?;
    file.sync_all()
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.load()?;
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.save(&entries)
    }
}

// ---------------------------------------------------------------------------
// TokenStore
// ---------------------------------------------------------------------------

/// Holds at most one bearer token, in whichever scope is active.
///
/// ```text
///   get() ──→ active backend[key]        (None if missing or empty)
///   set(t) ─→ active backend[key] = t    (empty t behaves like clear)
///   clear() → remove active backend[key] (other scope untouched)
/// ```
pub struct TokenStore {
    key: String,
    scope: Mutex<StorageScope>,
    session: Box<dyn KeyValueStore>,
    persistent: Box<dyn KeyValueStore>,
}

impl TokenStore {
    /// Creates a token store over one backend per scope.
    pub fn new(
        key: impl Into<String>,
        scope: StorageScope,
        session: impl KeyValueStore,
        persistent: impl KeyValueStore,
    ) -> Self {
        Self {
            key: key.into(),
            scope: Mutex::new(scope),
            session: Box::new(session),
            persistent: Box::new(persistent),
        }
    }

    /// Both scopes in memory. Handy for tests and short-lived tools.
    pub fn in_memory(key: impl Into<String>, scope: StorageScope) -> Self {
        Self::new(key, scope, MemoryStore::new(), MemoryStore::new())
    }

    /// The key the token is stored under.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The active scope.
    pub fn scope(&self) -> StorageScope {
        *self.scope.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Switches the active scope. The token in the previous scope, if any,
    /// is neither moved nor cleared.
    pub fn set_scope(&self, scope: StorageScope) {
        let mut current = self.scope.lock().unwrap_or_else(PoisonError::into_inner);
        let from = *current;
        if from != scope {
            tracing::info!(%from, to = %scope, "token storage scope switched");
            *current = scope;
        }
    }

    /// The backend serving `scope`.
    pub fn backend(&self, scope: StorageScope) -> &dyn KeyValueStore {
        match scope {
            StorageScope::Session => self.session.as_ref(),
            StorageScope::Persistent => self.persistent.as_ref(),
        }
    }

    /// The token in the active scope.
    ///
    /// An unreadable backend is logged and reported as no token: a client
    /// that can't read its storage is, for all purposes, logged out.
    pub fn get(&self) -> Option<String> {
        self.get_in(self.scope())
    }

    /// The token in a specific scope, active or not.
    pub fn get_in(&self, scope: StorageScope) -> Option<String> {
        match self.backend(scope).get(&self.key) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::warn!(%scope, error = %e, "failed to read token storage");
                None
            }
        }
    }

    /// `true` when the active scope holds a token.
    pub fn is_present(&self) -> bool {
        self.get().is_some()
    }

    /// Writes `token` into the active scope. An empty token clears instead,
    /// so the store never holds an empty string.
    pub fn set(&self, token: &str) -> Result<(), SessionError> {
        if token.is_empty() {
            return self.clear();
        }
        let scope = self.scope();
        self.backend(scope).set(&self.key, token)?;
        tracing::debug!(%scope, "token stored");
        Ok(())
    }

    /// Removes the token from the active scope only.
    pub fn clear(&self) -> Result<(), SessionError> {
        let scope = self.scope();
        self.backend(scope).remove(&self.key)?;
        tracing::debug!(%scope, "token cleared");
        Ok(())
    }
}

impl fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenStore")
            .field("key", &self.key)
            .field("scope", &self.scope())
            .finish_non_exhaustive()
    }
}
