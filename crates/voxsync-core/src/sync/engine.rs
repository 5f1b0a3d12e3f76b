//! Poll → materialize → acknowledge.

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, PoisonError};

use super::ledger::AckLedger;
use super::materializer::{
    combined_section_for, disambiguated_note_name, fallback_note_name, note_body_for,
    note_name_for, NoteMaterializer,
};
use crate::auth::AuthFlow;
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::guard::InFlightGuard;
use crate::models::Upload;
use crate::presenter::Presenter;
use crate::remote::RemoteService;
use crate::storage::NoteStorage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    pub create_separate_notes: bool,
    pub combined_note_path: String,
}

impl From<&Settings> for SyncOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            create_separate_notes: settings.create_separate_notes,
            combined_note_path: settings.combined_note_path.clone(),
        }
    }
}

/// Counts for one completed cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub fetched: usize,
    pub materialized: usize,
    pub acknowledged: usize,
    /// Uploads the ledger had already seen; re-acknowledged, not rewritten.
    pub duplicates: usize,
    pub failures: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Another cycle was still running.
    Skipped,
    /// Not authenticated; the email prompt was opened.
    LoginRequested,
    /// Not authenticated and a login prompt is already open.
    LoginPending,
    Completed(SyncReport),
}

pub struct SyncEngine<R, S, P> {
    auth: Arc<AuthFlow<R, P>>,
    remote: Arc<R>,
    presenter: Arc<P>,
    materializer: NoteMaterializer<S>,
    create_separate_notes: bool,
    ledger: Mutex<AckLedger>,
    in_flight: AtomicBool,
}

impl<R: RemoteService, S: NoteStorage, P: Presenter> SyncEngine<R, S, P> {
    pub fn new(
        auth: Arc<AuthFlow<R, P>>,
        remote: Arc<R>,
        storage: Arc<S>,
        presenter: Arc<P>,
        options: SyncOptions,
        ledger: AckLedger,
    ) -> Self {
        Self {
            auth,
            remote,
            presenter,
            materializer: NoteMaterializer::new(storage, options.combined_note_path),
            create_separate_notes: options.create_separate_notes,
            ledger: Mutex::new(ledger),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn auth(&self) -> &Arc<AuthFlow<R, P>> {
        &self.auth
    }

    /// Run one cycle, surfacing a failed fetch through the presenter.
    pub async fn tick(&self) -> Option<CycleOutcome> {
        match self.run_cycle().await {
            Ok(outcome) => Some(outcome),
            Err(error) => {
                tracing::warn!("Sync failed: {}", error);
                self.presenter.notify(&format!("Sync failed: {error}"));
                None
            }
        }
    }

    /// Run one fetch-materialize-acknowledge cycle unless one is already running.
    pub async fn run_cycle(&self) -> Result<CycleOutcome> {
        let Some(_in_flight) = InFlightGuard::try_acquire(&self.in_flight) else {
            tracing::debug!("sync cycle already in flight; skipping");
            return Ok(CycleOutcome::Skipped);
        };

        let credential = self.auth.store().get();
        let token = match credential.token {
            Some(token) if credential.is_authenticated() => token,
            _ => {
                return Ok(if self.auth.begin_login() {
                    CycleOutcome::LoginRequested
                } else {
                    CycleOutcome::LoginPending
                });
            }
        };

        let uploads = self.remote.list_uploads(&token).await?;
        if uploads.is_empty() {
            tracing::debug!("no pending uploads");
            return Ok(CycleOutcome::Completed(SyncReport::default()));
        }

        let mut report = SyncReport {
            fetched: uploads.len(),
            ..SyncReport::default()
        };

        let (seen, fresh): (Vec<&Upload>, Vec<&Upload>) = {
            let ledger = self.ledger.lock().unwrap_or_else(PoisonError::into_inner);
            uploads.iter().partition(|upload| ledger.contains(&upload.id))
        };
        report.duplicates = seen.len();

        let mut materialized = if self.create_separate_notes {
            self.materialize_separately(&fresh, &mut report).await
        } else {
            self.materialize_combined(&fresh, &mut report).await
        };
        report.materialized = materialized.len();
        self.remember(&materialized).await;

        materialized.extend(seen);
        for upload in materialized {
            match self.remote.acknowledge(&token, &upload.id).await {
                Ok(()) => report.acknowledged += 1,
                Err(error) => {
                    tracing::warn!(upload_id = %upload.id, "acknowledge failed: {}", error);
                    report
                        .failures
                        .push(format!("Failed to acknowledge \"{}\": {error}", upload.title()));
                }
            }
        }

        for failure in &report.failures {
            self.presenter.notify(failure);
        }
        if report.materialized > 0 {
            self.presenter.notify(&format!(
                "Synced {} voice note{}.",
                report.materialized,
                if report.materialized == 1 { "" } else { "s" }
            ));
        }
        tracing::info!(
            fetched = report.fetched,
            materialized = report.materialized,
            acknowledged = report.acknowledged,
            duplicates = report.duplicates,
            failures = report.failures.len(),
            "sync cycle completed"
        );
        Ok(CycleOutcome::Completed(report))
    }

    async fn materialize_separately<'a>(
        &self,
        uploads: &[&'a Upload],
        report: &mut SyncReport,
    ) -> Vec<&'a Upload> {
        let mut written = Vec::with_capacity(uploads.len());
        for &upload in uploads {
            let body = note_body_for(upload);
            let preferred = note_name_for(upload);
            let fallback = fallback_note_name(upload);
            let result = match self.materializer.create_note(&preferred, &body).await {
                Err(Error::StorageConflict(_)) => {
                    self.materializer
                        .create_note(&disambiguated_note_name(upload), &body)
                        .await
                }
                Err(error) if preferred != fallback => {
                    tracing::debug!(
                        upload_id = %upload.id,
                        "retrying under default note name: {}",
                        error
                    );
                    self.materializer.create_note(&fallback, &body).await
                }
                other => other,
            };

            match result {
                Ok(handle) => {
                    tracing::debug!(upload_id = %upload.id, path = handle.path(), "note written");
                    written.push(upload);
                }
                Err(error) => {
                    tracing::warn!(upload_id = %upload.id, "failed to write note: {}", error);
                    report
                        .failures
                        .push(format!("Failed to save \"{}\": {error}", upload.title()));
                }
            }
        }
        written
    }

    async fn materialize_combined<'a>(
        &self,
        uploads: &[&'a Upload],
        report: &mut SyncReport,
    ) -> Vec<&'a Upload> {
        if uploads.is_empty() {
            return Vec::new();
        }

        let sections = uploads
            .iter()
            .map(|upload| combined_section_for(upload))
            .collect::<Vec<_>>();
        match self.materializer.append_to_combined_note(&sections).await {
            Ok(()) => uploads.to_vec(),
            Err(error) => {
                tracing::warn!(
                    path = self.materializer.combined_note_path(),
                    "failed to append to combined note: {}",
                    error
                );
                report.failures.push(format!(
                    "Failed to update {}: {error}",
                    self.materializer.combined_note_path()
                ));
                Vec::new()
            }
        }
    }

    async fn remember(&self, uploads: &[&Upload]) {
        if uploads.is_empty() {
            return;
        }
        let pending = {
            let mut ledger = self.ledger.lock().unwrap_or_else(PoisonError::into_inner);
            for upload in uploads {
                ledger.record(&upload.id);
            }
            ledger.take_pending_write()
        };
        let Some(pending) = pending else {
            return;
        };

        let written = tokio::task::spawn_blocking(move || pending.commit())
            .await
            .unwrap_or_else(|error| {
                Err(Error::InvalidState(format!(
                    "ledger write did not finish: {error}"
                )))
            });
        if let Err(error) = written {
            tracing::warn!("Failed to persist acknowledgement ledger: {}", error);
            self.ledger
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .mark_unsaved();
        }
    }
}
