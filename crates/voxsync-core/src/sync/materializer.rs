//! Turns uploads into note content.

use std::sync::{Arc, OnceLock};

use regex::Regex;

use crate::error::{Error, Result};
use crate::models::{Upload, DEFAULT_UPLOAD_TITLE};
use crate::storage::{NoteHandle, NoteStorage};

const NOTE_EXTENSION: &str = ".md";
// Leaves room for the ` (<id>)` suffix and the extension under the
// common 255-byte file name limit.
const MAX_NOTE_NAME_BYTES: usize = 200;
const MAX_ID_SUFFIX_BYTES: usize = 40;

pub struct NoteMaterializer<S> {
    storage: Arc<S>,
    combined_note_path: String,
}

impl<S: NoteStorage> NoteMaterializer<S> {
    pub fn new(storage: Arc<S>, combined_note_path: impl Into<String>) -> Self {
        Self {
            storage,
            combined_note_path: combined_note_path.into(),
        }
    }

    pub fn combined_note_path(&self) -> &str {
        &self.combined_note_path
    }

    /// Create `<name>.md`; `StorageConflict` when it already exists.
    pub async fn create_note(&self, name: &str, body: &str) -> Result<NoteHandle> {
        self.storage.create(&note_path(name), body).await
    }

    /// Append every section, in order, to the combined note with a single write.
    pub async fn append_to_combined_note(&self, sections: &[String]) -> Result<()> {
        if sections.is_empty() {
            return Ok(());
        }

        let path = self.combined_note_path.as_str();
        let existing = match self.storage.read_by_path(path).await? {
            Some(note) => note,
            None => {
                // Another writer may have created it between the read and the create.
                match self.storage.create(path, "").await {
                    Ok(_) | Err(Error::StorageConflict(_)) => {}
                    Err(error) => return Err(error),
                }
                self.storage.read_by_path(path).await?.ok_or_else(|| {
                    Error::StorageUnavailable(format!("{path} vanished after creation"))
                })?
            }
        };

        let content = append_sections(&existing.content, sections);
        self.storage.modify(&existing.handle, &content).await
    }
}

fn note_path(name: &str) -> String {
    if name.ends_with(NOTE_EXTENSION) {
        name.to_string()
    } else {
        format!("{name}{NOTE_EXTENSION}")
    }
}

/// Join sections onto existing content, separated by a blank line.
pub fn append_sections(existing: &str, sections: &[String]) -> String {
    let mut content = existing.to_string();
    for section in sections {
        if !content.is_empty() {
            let trailing = content.len() - content.trim_end_matches('\n').len();
            for _ in trailing..2 {
                content.push('\n');
            }
        }
        content.push_str(section);
    }
    content
}

/// File-system safe note name for a separate note.
pub fn note_name_for(upload: &Upload) -> String {
    upload
        .label()
        .map(sanitize_note_name)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| fallback_note_name(upload))
}

/// Name used when the preferred one is taken.
pub fn disambiguated_note_name(upload: &Upload) -> String {
    format!("{} ({})", note_name_for(upload), id_suffix(upload))
}

/// Default name, used when the label is unusable or rejected by storage.
pub fn fallback_note_name(upload: &Upload) -> String {
    format!("{DEFAULT_UPLOAD_TITLE} {}", id_suffix(upload))
        .trim()
        .to_string()
}

fn id_suffix(upload: &Upload) -> String {
    truncate_to_bytes(&sanitize_note_name(&upload.id), MAX_ID_SUFFIX_BYTES)
        .trim_end()
        .to_string()
}

fn truncate_to_bytes(value: &str, max_bytes: usize) -> &str {
    if value.len() <= max_bytes {
        return value;
    }
    let mut end = max_bytes;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}

/// Body of a separate note: transcription, then the audio link.
pub fn note_body_for(upload: &Upload) -> String {
    let mut body = String::new();
    let transcription = upload.transcription.trim();
    if !transcription.is_empty() {
        body.push_str(transcription);
        body.push_str("\n\n");
    }
    body.push_str(&audio_link(upload));
    body.push('\n');
    body
}

/// Section of the combined note for one upload.
pub fn combined_section_for(upload: &Upload) -> String {
    let mut section = format!("## {}\n\n", upload.title());
    if let Some(created_at) = upload.created_at {
        section.push_str(&format!(
            "*Recorded {}*\n\n",
            created_at.format("%Y-%m-%d %H:%M UTC")
        ));
    }
    let transcription = upload.transcription.trim();
    if !transcription.is_empty() {
        section.push_str(transcription);
        section.push_str("\n\n");
    }
    section.push_str(&audio_link(upload));
    section.push('\n');
    section
}

fn audio_link(upload: &Upload) -> String {
    format!("[Audio]({})", upload.url.trim())
}

fn forbidden_characters() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"[\\/:*?"<>|#^\[\]\x00-\x1f]+"#).unwrap_or_else(|error| {
            panic!("invalid note name pattern: {error}");
        })
    })
}

/// Strip characters that are illegal in file names or break wiki links.
pub fn sanitize_note_name(raw: &str) -> String {
    let replaced = forbidden_characters().replace_all(raw, " ");
    let collapsed = replaced.split_whitespace().collect::<Vec<_>>().join(" ");
    let trimmed = collapsed.trim_matches(|c: char| c == '.' || c.is_whitespace());
    truncate_to_bytes(trimmed, MAX_NOTE_NAME_BYTES)
        .trim_end()
        .to_string()
}
