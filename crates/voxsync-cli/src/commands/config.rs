use std::path::{Path, PathBuf};

use voxsync_core::config::{normalize_base_url, normalize_text_option, Settings};

use crate::cli::{ConfigCommands, SettingKey};
use crate::error::CliError;
use crate::settings::load_file_settings;

const REDACTED: &str = "[REDACTED]";

pub fn run_config(command: ConfigCommands, settings_path: &Path) -> Result<(), CliError> {
    match command {
        ConfigCommands::Show => {
            let settings = load_file_settings(settings_path)?;
            println!("# {}", settings_path.display());
            println!("{}", render_settings(&settings)?);
            Ok(())
        }
        ConfigCommands::Set { key, value } => {
            let mut settings = load_file_settings(settings_path)?;
            apply_setting(&mut settings, key, &value)?;
            settings.save_to_path(settings_path)?;
            println!("Updated {}", settings_path.display());
            Ok(())
        }
    }
}

/// Pretty JSON with credentials masked.
pub fn render_settings(settings: &Settings) -> Result<String, CliError> {
    let mut shown = settings.clone();
    if shown.jwt_token.is_some() {
        shown.jwt_token = Some(REDACTED.to_string());
    }
    if shown.pending_auth_request_id.is_some() {
        shown.pending_auth_request_id = Some(REDACTED.to_string());
    }
    Ok(serde_json::to_string_pretty(&shown)?)
}

pub fn apply_setting(settings: &mut Settings, key: SettingKey, value: &str) -> Result<(), CliError> {
    let value = value.trim();
    match key {
        SettingKey::BaseUrl => settings.base_url = normalize_base_url(value)?,
        SettingKey::VaultPath => {
            settings.vault_path = normalize_text_option(Some(value.to_string())).map(PathBuf::from);
        }
        SettingKey::CombinedNotePath => {
            settings.combined_note_path = normalize_text_option(Some(value.to_string()))
                .ok_or_else(|| {
                    CliError::Config("combined note path must not be empty".to_string())
                })?;
        }
        SettingKey::CreateSeparateNotes => {
            settings.create_separate_notes = parse_bool(value)?;
        }
        SettingKey::SyncInterval => settings.sync_interval_secs = parse_secs(key, value)?,
        SettingKey::RequestTimeout => settings.request_timeout_secs = parse_secs(key, value)?,
    }
    Ok(())
}

fn parse_bool(value: &str) -> Result<bool, CliError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(CliError::Config(format!(
            "expected true or false, got '{value}'"
        ))),
    }
}

fn parse_secs(key: SettingKey, value: &str) -> Result<u64, CliError> {
    match value.parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(CliError::Config(format!(
            "{key:?} must be a positive number of seconds, got '{value}'"
        ))),
    }
}
