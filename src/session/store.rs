use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::RwLock;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::{Error, StorageError};

/// Access/refresh token pair for an authenticated session.
///
/// Serialized field names match the storage keys the console has always
/// persisted, so an existing session file keeps working.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    #[serde(rename = "accessToken")]
    pub access_token: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
}

/// Derived authentication state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    /// Storage has not been read yet; guards should not redirect on this.
    Unknown,
    Authenticated,
    Unauthenticated,
}

/// Durable backend for the token pair.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenStorage: Send + Sync {
    async fn load(&self) -> Result<Option<TokenPair>, Error>;
    async fn store(&self, pair: &TokenPair) -> Result<(), Error>;
    async fn clear(&self) -> Result<(), Error>;
}

/// Token pair persisted as a JSON file, the console equivalent of the
/// browser's localStorage entries.
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TokenStorage for FileStorage {
    async fn load(&self) -> Result<Option<TokenPair>, Error> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::Io(e.to_string()).into()),
        };

        let pair: TokenPair = serde_json::from_slice(&bytes)
            .map_err(|e| StorageError::Corrupt(e.to_string()))?;
        Ok(Some(pair))
    }

    async fn store(&self, pair: &TokenPair) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| StorageError::Io(e.to_string()))?;
            }
        }

        let json = serde_json::to_vec_pretty(pair)
            .map_err(|e| StorageError::Io(e.to_string()))?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), Error> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e.to_string()).into()),
        }
    }
}

/// In-memory backend for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStorage {
    pair: RwLock<Option<TokenPair>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStorage for MemoryStorage {
    async fn load(&self) -> Result<Option<TokenPair>, Error> {
        Ok(self.pair.read().unwrap().clone())
    }

    async fn store(&self, pair: &TokenPair) -> Result<(), Error> {
        *self.pair.write().unwrap() = Some(pair.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), Error> {
        *self.pair.write().unwrap() = None;
        Ok(())
    }
}

/// Single source of truth for the current token pair.
///
/// Holds the pair in memory, mirrors it to the durable backend and
/// publishes every auth-state change on a watch channel so consumers
/// (route guards, the CLI) can react without polling.
pub struct TokenStore {
    storage: Box<dyn TokenStorage>,
    state: RwLock<Option<TokenPair>>,
    status_tx: watch::Sender<AuthStatus>,
}

impl TokenStore {
    pub fn new(storage: Box<dyn TokenStorage>) -> Self {
        let (status_tx, _) = watch::channel(AuthStatus::Unknown);
        Self {
            storage,
            state: RwLock::new(None),
            status_tx,
        }
    }

    /// Read the persisted pair into memory. Idempotent: once the state
    /// has been resolved, further calls do nothing.
    pub async fn load(&self) -> Result<(), Error> {
        if *self.status_tx.borrow() != AuthStatus::Unknown {
            return Ok(());
        }

        let loaded = match self.storage.load().await {
            Ok(pair) => pair,
            Err(Error::Storage(StorageError::Corrupt(reason))) => {
                // An unreadable session file means logging in again, not a dead console.
                warn!(%reason, "session storage is corrupt, discarding it");
                self.storage.clear().await?;
                None
            }
            Err(e) => return Err(e),
        };

        let status = match &loaded {
            Some(_) => AuthStatus::Authenticated,
            None => AuthStatus::Unauthenticated,
        };
        *self.state.write().unwrap() = loaded;
        self.status_tx.send_replace(status);
        debug!(?status, "session storage loaded");
        Ok(())
    }

    /// Persist and publish a new pair. Both fields are swapped together;
    /// readers never observe one half of an update.
    pub async fn set_tokens(&self, pair: TokenPair) -> Result<(), Error> {
        self.storage.store(&pair).await?;
        *self.state.write().unwrap() = Some(pair);
        self.status_tx.send_replace(AuthStatus::Authenticated);
        Ok(())
    }

    /// Drop the pair locally and from storage. A storage failure is logged
    /// but does not keep the session alive: logout always completes.
    pub async fn clear(&self) -> Result<(), Error> {
        *self.state.write().unwrap() = None;
        self.status_tx.send_replace(AuthStatus::Unauthenticated);
        if let Err(e) = self.storage.clear().await {
            warn!(error = %e, "failed to clear session storage");
        }
        Ok(())
    }

    pub fn tokens(&self) -> Option<TokenPair> {
        self.state.read().unwrap().clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.state
            .read()
            .unwrap()
            .as_ref()
            .map(|p| p.access_token.clone())
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.state
            .read()
            .unwrap()
            .as_ref()
            .map(|p| p.refresh_token.clone())
    }

    pub fn auth_status(&self) -> AuthStatus {
        *self.status_tx.borrow()
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth_status() == AuthStatus::Authenticated
    }

    /// Watch feed of auth-state changes, starting from the current value.
    pub fn subscribe(&self) -> watch::Receiver<AuthStatus> {
        self.status_tx.subscribe()
    }
}
