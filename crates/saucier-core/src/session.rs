//! Auth session: the current web auth token and its lifecycle.
//!
//! The token is persisted in `<base>/session.json` with restricted
//! permissions (0600). Tokens are never logged in full.
//!
//! Listeners are told about transitions between logged out and logged in.
//! A rotation that replaces one token with another is not a transition.

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::location::{self, AUTH_CALLBACK_PARAMS, History, WEB_AUTH_TOKEN_PARAM};

/// Durable storage for the single session token key.
pub trait TokenStore: Send + Sync {
    /// # Errors
    /// Returns an error if the storage exists but cannot be read.
    fn load(&self) -> Result<Option<String>>;
    /// # Errors
    /// Returns an error if the token cannot be written.
    fn save(&self, token: &str) -> Result<()>;
    /// # Errors
    /// Returns an error if the token cannot be removed.
    fn clear(&self) -> Result<()>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredSession {
    #[serde(rename = "ckWebAuthToken", skip_serializing_if = "Option::is_none")]
    web_auth_token: Option<String>,
}

/// Token file on disk.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default session path.
    pub fn default_location() -> Self {
        Self::new(crate::config::paths::session_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, contents: &str) -> Result<()> {
        let path = &self.path;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(path)
                .with_context(|| format!("Failed to open {} for writing", path.display()))?;
            file.write_all(contents.as_bytes())
                .with_context(|| format!("Failed to write to {}", path.display()))?;
        }

        #[cfg(not(unix))]
        {
            fs::write(path, contents)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
        }

        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read session from {}", self.path.display()))?;
        let stored: StoredSession = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse session from {}", self.path.display()))?;
        Ok(stored.web_auth_token.filter(|token| !token.is_empty()))
    }

    fn save(&self, token: &str) -> Result<()> {
        let stored = StoredSession {
            web_auth_token: Some(token.to_string()),
        };
        let contents =
            serde_json::to_string_pretty(&stored).context("Failed to serialize session")?;
        self.write(&contents)
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err)
                .with_context(|| format!("Failed to remove {}", self.path.display())),
        }
    }
}

/// In-memory store, for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(token.to_string())),
        }
    }

    pub fn stored(&self) -> Option<String> {
        self.token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.stored())
    }

    fn save(&self, token: &str) -> Result<()> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

impl<T: TokenStore + ?Sized> TokenStore for Arc<T> {
    fn load(&self) -> Result<Option<String>> {
        (**self).load()
    }

    fn save(&self, token: &str) -> Result<()> {
        (**self).save(token)
    }

    fn clear(&self) -> Result<()> {
        (**self).clear()
    }
}

/// Receives the new authenticated flag on every transition.
pub type AuthListener = Arc<dyn Fn(bool) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Owns the session token.
///
/// Listeners run while the transition lock is held, after the new token is
/// visible; they must not call back into mutating methods.
pub struct AuthSession {
    token: RwLock<Option<String>>,
    store: Box<dyn TokenStore>,
    listeners: Mutex<HashMap<ListenerId, AuthListener>>,
    next_listener: AtomicU64,
    transition: Mutex<()>,
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}

impl AuthSession {
    /// Creates a session with an explicit starting token. Nothing is
    /// persisted.
    pub fn new(store: impl TokenStore + 'static, token: Option<String>) -> Self {
        Self {
            token: RwLock::new(token.filter(|t| !t.is_empty())),
            store: Box::new(store),
            listeners: Mutex::new(HashMap::new()),
            next_listener: AtomicU64::new(0),
            transition: Mutex::new(()),
        }
    }

    /// Builds the startup session.
    ///
    /// A `ckWebAuthToken` in the current location wins and is persisted;
    /// otherwise the stored token is used. When the location carries
    /// redirect parameters they are stripped with a history replace before
    /// this returns.
    ///
    /// # Errors
    /// Returns an error if the stored token cannot be read or the URL token
    /// cannot be persisted.
    pub fn bootstrap(store: impl TokenStore + 'static, history: &dyn History) -> Result<Self> {
        let current = history.location();
        let url_token = location::query_value(&current, WEB_AUTH_TOKEN_PARAM)
            .filter(|token| !token.is_empty());

        if AUTH_CALLBACK_PARAMS
            .iter()
            .any(|name| location::has_param(&current, name))
        {
            history.replace(location::without_params(&current, &AUTH_CALLBACK_PARAMS));
        }

        let token = match url_token {
            Some(token) => {
                store
                    .save(&token)
                    .context("Failed to persist session token from sign-in redirect")?;
                tracing::info!(token = %mask_token(&token), "session token received from redirect");
                Some(token)
            }
            None => store.load()?,
        };

        Ok(Self::new(store, token))
    }

    pub fn is_authenticated(&self) -> bool {
        self.read_token().is_some()
    }

    /// Current token, if any.
    pub fn token(&self) -> Option<String> {
        self.read_token().clone()
    }

    fn read_token(&self) -> std::sync::RwLockReadGuard<'_, Option<String>> {
        self.token.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the token, persists it and reports a login transition.
    ///
    /// The in-memory value is replaced even when persisting fails.
    ///
    /// # Errors
    /// Returns an error if the token could not be persisted.
    pub fn update_token(&self, token: &str) -> Result<()> {
        let _transition = self.transition.lock().unwrap_or_else(PoisonError::into_inner);
        let was_authenticated = {
            let mut current = self.token.write().unwrap_or_else(PoisonError::into_inner);
            current.replace(token.to_string()).is_some()
        };
        let persisted = self.store.save(token);

        if !was_authenticated {
            tracing::info!("session signed in");
            self.notify(true);
        }
        persisted
    }

    /// Erases the token and reports a logout transition.
    ///
    /// # Errors
    /// Returns an error if the stored token could not be removed.
    pub fn clear(&self) -> Result<()> {
        let _transition = self.transition.lock().unwrap_or_else(PoisonError::into_inner);
        self.clear_locked()
    }

    /// Clears the session only if `expected` is still the current token.
    ///
    /// Returns whether the session was cleared. A response that arrives
    /// after a newer token was issued must not discard that token.
    ///
    /// # Errors
    /// Returns an error if the stored token could not be removed.
    pub fn expire(&self, expected: &str) -> Result<bool> {
        let _transition = self.transition.lock().unwrap_or_else(PoisonError::into_inner);
        if self.read_token().as_deref() != Some(expected) {
            return Ok(false);
        }
        self.clear_locked().map(|()| true)
    }

    fn clear_locked(&self) -> Result<()> {
        let was_authenticated = self
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some();
        let cleared = self.store.clear();

        if was_authenticated {
            tracing::info!("session signed out");
            self.notify(false);
        }
        cleared
    }

    /// Registers a listener for future transitions. Past transitions are not
    /// replayed.
    pub fn subscribe(&self, listener: AuthListener) -> ListenerId {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, listener);
        id
    }

    /// Returns whether the listener was registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some()
    }

    fn notify(&self, authenticated: bool) {
        let listeners: Vec<AuthListener> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        for listener in listeners {
            listener(authenticated);
        }
    }
}

/// Masks a token for display, keeping only its edges.
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 12 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}
