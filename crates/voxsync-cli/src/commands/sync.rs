use std::path::Path;
use std::sync::Arc;

use voxsync_core::app::App;
use voxsync_core::sync::{CycleOutcome, SyncReport};

use crate::error::CliError;
use crate::presenter::TerminalPresenter;
use crate::settings::load_effective_settings;

pub async fn run_sync(settings_path: &Path) -> Result<(), CliError> {
    let settings = load_effective_settings(settings_path)?;
    let app = App::open(
        settings_path,
        &settings,
        Arc::new(TerminalPresenter::default()),
    )?;
    if !app.auth().is_authenticated() {
        return Err(CliError::NotAuthenticated);
    }

    match app.engine().run_cycle().await? {
        CycleOutcome::Completed(report) => {
            println!("{}", summarize_report(&report));
            Ok(())
        }
        CycleOutcome::LoginRequested | CycleOutcome::LoginPending => {
            Err(CliError::NotAuthenticated)
        }
        CycleOutcome::Skipped => {
            println!("Another sync is already running.");
            Ok(())
        }
    }
}

pub fn summarize_report(report: &SyncReport) -> String {
    if report.fetched == 0 {
        return "No new voice notes.".to_string();
    }

    let mut summary = format!(
        "Fetched {}, saved {}, acknowledged {}",
        report.fetched, report.materialized, report.acknowledged
    );
    if report.duplicates > 0 {
        summary.push_str(&format!(", {} already saved", report.duplicates));
    }
    if !report.failures.is_empty() {
        summary.push_str(&format!(", {} failed", report.failures.len()));
    }
    summary
}
