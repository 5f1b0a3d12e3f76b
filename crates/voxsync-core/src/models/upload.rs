//! Transcribed voice upload as returned by the service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Title used when an upload carries no label.
pub const DEFAULT_UPLOAD_TITLE: &str = "Untitled recording";

/// A transcribed recording waiting to be pulled into the vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Upload {
    /// Stable identifier, used for acknowledgement and de-duplication
    pub id: String,
    /// Owning user
    #[serde(default, alias = "userId")]
    pub user_id: String,
    /// Human-readable title
    #[serde(default)]
    pub label: Option<String>,
    /// Link to the source audio
    pub url: String,
    /// Transcribed text
    #[serde(default)]
    pub transcription: String,
    /// Upload time
    #[serde(default, alias = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Upload {
    /// Label with surrounding whitespace removed, `None` when blank.
    pub fn label(&self) -> Option<&str> {
        self.label
            .as_deref()
            .map(str::trim)
            .filter(|label| !label.is_empty())
    }

    /// Display title, falling back to [`DEFAULT_UPLOAD_TITLE`].
    pub fn title(&self) -> &str {
        self.label().unwrap_or(DEFAULT_UPLOAD_TITLE)
    }
}
