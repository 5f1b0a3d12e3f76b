//! Credential store with write-through persistence.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::config::{normalize_text_option, Settings};
use crate::error::{Error, Result};
use crate::models::Credential;

/// Durable backing for the credential store.
pub trait CredentialPersistence: Send + Sync + 'static {
    fn load(&self) -> Result<Credential>;
    fn save(&self, credential: &Credential) -> Result<()>;
}

/// Persists the credential into the `jwt_token` / `pending_auth_request_id`
/// fields of the settings file, leaving every other setting untouched.
#[derive(Debug, Clone)]
pub struct SettingsCredentialPersistence {
    path: PathBuf,
}

impl SettingsCredentialPersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialPersistence for SettingsCredentialPersistence {
    fn load(&self) -> Result<Credential> {
        Ok(Settings::load_from_path(&self.path)?.credential())
    }

    fn save(&self, credential: &Credential) -> Result<()> {
        let mut settings = Settings::load_from_path(&self.path)?;
        settings.jwt_token.clone_from(&credential.token);
        settings
            .pending_auth_request_id
            .clone_from(&credential.pending_auth_request_id);
        settings.save_to_path(&self.path)
    }
}

/// Process-local persistence, for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryCredentialPersistence {
    stored: Mutex<Credential>,
}

impl MemoryCredentialPersistence {
    pub fn with_credential(credential: Credential) -> Self {
        Self {
            stored: Mutex::new(credential),
        }
    }
}

impl CredentialPersistence for MemoryCredentialPersistence {
    fn load(&self) -> Result<Credential> {
        Ok(self
            .stored
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, credential: &Credential) -> Result<()> {
        *self.stored.lock().unwrap_or_else(PoisonError::into_inner) = credential.clone();
        Ok(())
    }
}

/// Holds the bearer token and pending auth request id.
///
/// Every mutation is persisted before the in-memory copy changes, so a failed
/// write leaves both the durable and the observable state as they were.
pub struct CredentialStore {
    persistence: Box<dyn CredentialPersistence>,
    current: Mutex<Credential>,
}

impl CredentialStore {
    /// Restore the last persisted credential.
    pub fn open(persistence: impl CredentialPersistence) -> Result<Self> {
        let credential = persistence.load()?;
        Ok(Self {
            persistence: Box::new(persistence),
            current: Mutex::new(credential),
        })
    }

    /// Empty in-memory store.
    pub fn in_memory() -> Self {
        Self {
            persistence: Box::new(MemoryCredentialPersistence::default()),
            current: Mutex::new(Credential::default()),
        }
    }

    pub fn get(&self) -> Credential {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.get().is_authenticated()
    }

    /// Record a new pending request, replacing any earlier one.
    pub fn set_pending_auth_request(&self, id: &str) -> Result<()> {
        let id = normalize_text_option(Some(id.to_string())).ok_or_else(|| {
            Error::InvalidInput("auth request id must not be empty".to_string())
        })?;
        self.update(|credential| credential.pending_auth_request_id = Some(id))
    }

    /// Record the bearer token and drop the pending request.
    pub fn set_token(&self, token: &str) -> Result<()> {
        let token = normalize_text_option(Some(token.to_string()))
            .ok_or_else(|| Error::InvalidInput("token must not be empty".to_string()))?;
        self.update(|credential| {
            credential.token = Some(token);
            credential.pending_auth_request_id = None;
        })
    }

    pub fn clear_pending_auth_request(&self) -> Result<()> {
        self.update(|credential| credential.pending_auth_request_id = None)
    }

    fn update(&self, mutate: impl FnOnce(&mut Credential)) -> Result<()> {
        let mut guard = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = guard.clone();
        mutate(&mut next);
        if next == *guard {
            return Ok(());
        }
        self.persistence.save(&next)?;
        *guard = next;
        Ok(())
    }
}
