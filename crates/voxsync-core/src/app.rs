//! Application lifecycle: wiring and scheduler ownership.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::{AuthFlow, CredentialStore, SettingsCredentialPersistence};
use crate::config::{ledger_path_for, Settings};
use crate::error::{Error, Result};
use crate::presenter::Presenter;
use crate::remote::{HttpRemoteClient, RemoteService};
use crate::storage::{NoteStorage, VaultStorage};
use crate::sync::{AckLedger, SyncEngine, SyncOptions, SyncScheduler};

pub struct App<R, S, P> {
    auth: Arc<AuthFlow<R, P>>,
    engine: Arc<SyncEngine<R, S, P>>,
    sync_interval: Duration,
    scheduler: Option<SyncScheduler>,
}

impl<P: Presenter> App<HttpRemoteClient, VaultStorage, P> {
    /// Wire the HTTP client and the vault from a settings file.
    ///
    /// `settings` may carry overrides that are not meant to be written back;
    /// credential changes are persisted into the file at `settings_path`.
    pub fn open(settings_path: &Path, settings: &Settings, presenter: Arc<P>) -> Result<Self> {
        let vault = settings.vault_path.clone().ok_or_else(|| {
            Error::Config(
                "vault path is not set; run `voxsync config set vault-path <dir>`".to_string(),
            )
        })?;

        let store = Arc::new(CredentialStore::open(SettingsCredentialPersistence::new(
            settings_path,
        ))?);
        let remote = Arc::new(HttpRemoteClient::from_settings(settings)?);
        let ledger = AckLedger::load(ledger_path_for(settings_path));

        Ok(Self::new(
            store,
            remote,
            Arc::new(VaultStorage::new(vault)),
            presenter,
            SyncOptions::from(settings),
            ledger,
            settings.sync_interval(),
        ))
    }
}

impl<R: RemoteService, S: NoteStorage, P: Presenter> App<R, S, P> {
    pub fn new(
        store: Arc<CredentialStore>,
        remote: Arc<R>,
        storage: Arc<S>,
        presenter: Arc<P>,
        options: SyncOptions,
        ledger: AckLedger,
        sync_interval: Duration,
    ) -> Self {
        let auth = Arc::new(AuthFlow::new(
            store,
            Arc::clone(&remote),
            Arc::clone(&presenter),
        ));
        let engine = Arc::new(SyncEngine::new(
            Arc::clone(&auth),
            remote,
            storage,
            presenter,
            options,
            ledger,
        ));

        Self {
            auth,
            engine,
            sync_interval,
            scheduler: None,
        }
    }

    pub fn auth(&self) -> &Arc<AuthFlow<R, P>> {
        &self.auth
    }

    pub fn engine(&self) -> &Arc<SyncEngine<R, S, P>> {
        &self.engine
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_some()
    }

    /// Reopen login if needed and start the recurring sync. Must be called
    /// from within a tokio runtime.
    pub fn load(&mut self) {
        if !self.auth.is_authenticated() {
            self.auth.resume_login();
        }
        if self.scheduler.is_none() {
            self.scheduler = Some(SyncScheduler::start(
                Arc::clone(&self.engine),
                self.sync_interval,
            ));
            tracing::info!(
                interval_secs = self.sync_interval.as_secs(),
                "voice note sync started"
            );
        }
    }

    /// Run a cycle now. Ignored when the app is not loaded.
    pub fn sync_now(&self) {
        match &self.scheduler {
            Some(scheduler) => scheduler.sync_now(),
            None => tracing::debug!("sync requested before load; ignoring"),
        }
    }

    /// Stop the scheduler; no cycle starts after this returns.
    pub async fn unload(&mut self) {
        if let Some(scheduler) = self.scheduler.take() {
            scheduler.shutdown().await;
            tracing::info!("voice note sync stopped");
        }
    }
}
