//! Persistent settings.
//!
//! A single JSON document holds the service host, the cached bearer token,
//! the pending login request and the note materialization policy. The
//! credential store writes back into the same file so a restart picks up
//! where the previous process left off.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::Credential;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_COMBINED_NOTE_PATH: &str = "Voice Notes.md";
pub const DEFAULT_SYNC_INTERVAL_SECS: u64 = 5 * 60;
pub const MIN_SYNC_INTERVAL_SECS: u64 = 10;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

const LEDGER_FILE_NAME: &str = "acknowledged.json";

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Service host for every remote call
    pub base_url: String,
    /// Cached bearer credential
    pub jwt_token: Option<String>,
    /// Login request awaiting code verification
    pub pending_auth_request_id: Option<String>,
    /// One note per upload instead of the combined log
    pub create_separate_notes: bool,
    /// Vault-relative path of the combined log note
    pub combined_note_path: String,
    /// Root directory notes are written into
    pub vault_path: Option<PathBuf>,
    pub sync_interval_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            jwt_token: None,
            pending_auth_request_id: None,
            create_separate_notes: false,
            combined_note_path: DEFAULT_COMBINED_NOTE_PATH.to_string(),
            vault_path: None,
            sync_interval_secs: DEFAULT_SYNC_INTERVAL_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Settings")
            .field("base_url", &self.base_url)
            .field("jwt_token", &self.jwt_token.as_ref().map(|_| "[REDACTED]"))
            .field(
                "pending_auth_request_id",
                &self.pending_auth_request_id.as_ref().map(|_| "[REDACTED]"),
            )
            .field("create_separate_notes", &self.create_separate_notes)
            .field("combined_note_path", &self.combined_note_path)
            .field("vault_path", &self.vault_path)
            .field("sync_interval_secs", &self.sync_interval_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl Settings {
    /// Load settings, returning defaults when the file does not exist yet.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path).map_err(|error| {
            Error::Config(format!(
                "Failed to read settings at {}: {}",
                path.display(),
                error
            ))
        })?;
        let mut settings = serde_json::from_str::<Self>(&raw).map_err(|error| {
            Error::Config(format!(
                "Failed to parse settings at {}: {}",
                path.display(),
                error
            ))
        })?;
        settings.normalize();
        Ok(settings)
    }

    /// Write settings atomically (temp file, then rename over the target).
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|error| {
                Error::Config(format!(
                    "Failed to create settings directory {}: {}",
                    parent.display(),
                    error
                ))
            })?;
        }

        let mut normalized = self.clone();
        normalized.normalize();
        let serialized = serde_json::to_string_pretty(&normalized)?;
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, serialized).map_err(|error| {
            Error::Config(format!(
                "Failed to write settings at {}: {}",
                tmp_path.display(),
                error
            ))
        })?;
        fs::rename(&tmp_path, path).map_err(|error| {
            Error::Config(format!(
                "Failed to replace settings at {}: {}",
                path.display(),
                error
            ))
        })
    }

    /// Base URL without a trailing slash; must be http(s).
    pub fn validated_base_url(&self) -> Result<String> {
        normalize_base_url(&self.base_url)
    }

    pub fn credential(&self) -> Credential {
        Credential {
            token: normalize_text_option(self.jwt_token.clone()),
            pending_auth_request_id: normalize_text_option(self.pending_auth_request_id.clone()),
        }
    }

    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_secs.max(MIN_SYNC_INTERVAL_SECS))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    fn normalize(&mut self) {
        self.base_url = self.base_url.trim().trim_end_matches('/').to_string();
        if self.base_url.is_empty() {
            DEFAULT_BASE_URL.clone_into(&mut self.base_url);
        }
        self.jwt_token = normalize_text_option(self.jwt_token.take());
        self.pending_auth_request_id = normalize_text_option(self.pending_auth_request_id.take());
        self.combined_note_path =
            normalize_text_option(Some(std::mem::take(&mut self.combined_note_path)))
                .unwrap_or_else(|| DEFAULT_COMBINED_NOTE_PATH.to_string());
    }
}

/// Location of the acknowledgement ledger kept beside a settings file.
pub fn ledger_path_for(settings_path: &Path) -> PathBuf {
    settings_path
        .parent()
        .map_or_else(|| PathBuf::from(LEDGER_FILE_NAME), |dir| dir.join(LEDGER_FILE_NAME))
}

/// Normalize optional text by trimming whitespace and removing empties.
pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    let value = value?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

pub fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(Error::Config("base URL must not be empty".to_string()));
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(Error::Config(
            "base URL must include http:// or https://".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from_path(&dir.path().join("settings.json")).unwrap();
        assert_eq!(settings, Settings::default());
        assert!(!settings.create_separate_notes);
    }

    #[test]
    fn settings_roundtrip_normalizes_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let settings = Settings {
            base_url: " https://api.example.com/ ".to_string(),
            jwt_token: Some(" t1 ".to_string()),
            pending_auth_request_id: Some("   ".to_string()),
            combined_note_path: String::new(),
            ..Settings::default()
        };
        settings.save_to_path(&path).unwrap();

        let loaded = Settings::load_from_path(&path).unwrap();
        assert_eq!(loaded.base_url, "https://api.example.com");
        assert_eq!(loaded.jwt_token.as_deref(), Some("t1"));
        assert_eq!(loaded.pending_auth_request_id, None);
        assert_eq!(loaded.combined_note_path, DEFAULT_COMBINED_NOTE_PATH);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"create_separate_notes": true}"#).unwrap();

        let loaded = Settings::load_from_path(&path).unwrap();
        assert!(loaded.create_separate_notes);
        assert_eq!(loaded.base_url, DEFAULT_BASE_URL);
        assert_eq!(loaded.sync_interval_secs, DEFAULT_SYNC_INTERVAL_SECS);
    }

    #[test]
    fn invalid_json_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            Settings::load_from_path(&path),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn sync_interval_is_clamped() {
        let settings = Settings {
            sync_interval_secs: 1,
            ..Settings::default()
        };
        assert_eq!(
            settings.sync_interval(),
            Duration::from_secs(MIN_SYNC_INTERVAL_SECS)
        );
    }

    #[test]
    fn normalize_base_url_requires_http_scheme() {
        assert!(normalize_base_url("").is_err());
        assert!(normalize_base_url("api.example.com").is_err());
        assert_eq!(
            normalize_base_url("https://api.example.com//").unwrap(),
            "https://api.example.com"
        );
    }

    #[test]
    fn ledger_lives_next_to_settings() {
        let path = Path::new("/tmp/voxsync/settings.json");
        assert_eq!(
            ledger_path_for(path),
            PathBuf::from("/tmp/voxsync/acknowledged.json")
        );
    }

    #[test]
    fn settings_debug_redacts_token() {
        let settings = Settings {
            jwt_token: Some("secret-jwt".to_string()),
            ..Settings::default()
        };
        let rendered = format!("{settings:?}");
        assert!(!rendered.contains("secret-jwt"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
