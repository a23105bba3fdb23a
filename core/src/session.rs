//! Session token state and durable token storage.
//!
//! # Design
//! `Session` is the in-memory half: an explicit value handed to every request
//! builder, so building a request never reads hidden state. `TokenStore` is
//! the durable half: a single key-value entry that survives restarts. The
//! driver keeps the two in step on sign-in, sign-out and restore.

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::config::ClientConfig;
use crate::error::ApiError;

/// Storage key the session token is persisted under.
pub const TOKEN_KEY: &str = "gameHubToken";

/// The caller's current authentication state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    token: Option<String>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self { token: None }
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    pub fn clear(&mut self) {
        self.token = None;
    }

    /// Value for the `authorization` header: `Bearer <token>`, or empty when
    /// no token is held.
    pub fn authorization(&self) -> String {
        match &self.token {
            Some(token) => format!("Bearer {token}"),
            None => String::new(),
        }
    }
}

/// Durable storage for the session token.
pub trait TokenStore {
    /// Read the stored token, if any.
    fn load(&self) -> Result<Option<String>, ApiError>;

    /// Persist `token`, replacing any previous value.
    fn save(&mut self, token: &str) -> Result<(), ApiError>;

    /// Remove the stored token. Clearing an empty store is not an error.
    fn clear(&mut self) -> Result<(), ApiError>;
}

/// Process-local store. Nothing survives the process.
#[derive(Debug, Clone)]
pub struct MemoryTokenStore {
    entries: HashMap<String, String>,
    key: String,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::with_key(TOKEN_KEY)
    }

    pub fn with_key(key: &str) -> Self {
        Self {
            entries: HashMap::new(),
            key: key.to_string(),
        }
    }

    /// A store that already holds `token`, as if a previous run had signed in.
    pub fn seeded(token: &str) -> Self {
        let mut store = Self::new();
        store.entries.insert(store.key.clone(), token.to_string());
        store
    }
}

impl Default for MemoryTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>, ApiError> {
        Ok(self.entries.get(&self.key).cloned())
    }

    fn save(&mut self, token: &str) -> Result<(), ApiError> {
        self.entries.insert(self.key.clone(), token.to_string());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), ApiError> {
        self.entries.remove(&self.key);
        Ok(())
    }
}

/// JSON key-value file on disk, e.g. `{"gameHubToken": "..."}`.
///
/// Other keys in the file are left untouched. The file is written with 0600
/// permissions on Unix and removed once its last key is cleared.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
    key: String,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_key(path, TOKEN_KEY)
    }

    pub fn with_key(path: impl Into<PathBuf>, key: &str) -> Self {
        Self {
            path: path.into(),
            key: key.to_string(),
        }
    }

    /// `<config dir>/gamehub/storage.json`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|c| c.join("gamehub/storage.json"))
    }

    /// Store at the default location, keyed by `config.token_key`.
    pub fn for_config(config: &ClientConfig) -> Option<Self> {
        Self::default_path().map(|path| Self::with_key(path, &config.token_key))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<Map<String, Value>, ApiError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(ApiError::Storage(format!("failed to read {}: {e}", self.path.display()))),
        };
        match serde_json::from_str::<Map<String, Value>>(&contents) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring unreadable token store");
                Ok(Map::new())
            }
        }
    }

    fn write_entries(&self, entries: &Map<String, Value>) -> Result<(), ApiError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ApiError::Storage(format!("failed to create {}: {e}", parent.display())))?;
        }

        let contents =
            serde_json::to_string_pretty(entries).map_err(|e| ApiError::Serialization(e.to_string()))?;
        let write_err = |e: std::io::Error| ApiError::Storage(format!("failed to write {}: {e}", self.path.display()));

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            // A new file is owner-only from the moment it exists.
            options.mode(0o600);
        }
        let mut file = options.open(&self.path).map_err(write_err)?;

        // `mode` only applies on create; tighten a file left by an older run.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(0o600))
                .map_err(|e| ApiError::Storage(format!("failed to set permissions: {e}")))?;
        }

        file.write_all(contents.as_bytes()).map_err(write_err)?;
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>, ApiError> {
        let entries = self.read_entries()?;
        Ok(entries.get(&self.key).and_then(Value::as_str).map(str::to_string))
    }

    fn save(&mut self, token: &str) -> Result<(), ApiError> {
        let mut entries = self.read_entries()?;
        entries.insert(self.key.clone(), Value::String(token.to_string()));
        self.write_entries(&entries)
    }

    fn clear(&mut self) -> Result<(), ApiError> {
        let mut entries = self.read_entries()?;
        if entries.remove(&self.key).is_none() {
            return Ok(());
        }
        if entries.is_empty() {
            return fs::remove_file(&self.path)
                .map_err(|e| ApiError::Storage(format!("failed to remove {}: {e}", self.path.display())));
        }
        self.write_entries(&entries)
    }
}
