//! Settings file location and environment overrides.

use std::env;
use std::path::{Path, PathBuf};

use voxsync_core::config::{normalize_text_option, Settings};

use crate::error::CliError;

const SETTINGS_FILE_NAME: &str = "settings.json";

pub const BASE_URL_ENV: &str = "VOXSYNC_BASE_URL";
pub const VAULT_ENV: &str = "VOXSYNC_VAULT";

pub fn default_settings_path() -> Result<PathBuf, CliError> {
    dirs::config_dir()
        .map(|dir| dir.join("voxsync").join(SETTINGS_FILE_NAME))
        .ok_or_else(|| CliError::Config("Failed to resolve config directory".to_string()))
}

pub fn resolve_settings_path(explicit: Option<PathBuf>) -> Result<PathBuf, CliError> {
    match explicit {
        Some(path) => Ok(path),
        None => default_settings_path(),
    }
}

/// Settings as stored on disk, without environment overrides.
pub fn load_file_settings(path: &Path) -> Result<Settings, CliError> {
    Ok(Settings::load_from_path(path)?)
}

/// Settings with `VOXSYNC_BASE_URL` / `VOXSYNC_VAULT` applied on top.
pub fn load_effective_settings(path: &Path) -> Result<Settings, CliError> {
    let mut settings = load_file_settings(path)?;
    apply_overrides(
        &mut settings,
        env::var(BASE_URL_ENV).ok(),
        env::var(VAULT_ENV).ok(),
    );
    Ok(settings)
}

pub fn apply_overrides(settings: &mut Settings, base_url: Option<String>, vault: Option<String>) {
    if let Some(base_url) = normalize_text_option(base_url) {
        tracing::debug!("base URL overridden from environment");
        settings.base_url = base_url;
    }
    if let Some(vault) = normalize_text_option(vault) {
        settings.vault_path = Some(PathBuf::from(vault));
    }
}
