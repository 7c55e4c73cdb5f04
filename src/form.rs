//! Form controller of the todo/notes board.
//!
//! A [`NoteForm`] is the raw input for one submission. The selected
//! [`NoteType`] decides which fields are required; `submit` validates them
//! and yields a new [`NoteItem`] or a [`DeckError`] explaining the
//! rejection. No record is created on any error path.
use std::path::PathBuf;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use log::{debug, error, info};

use crate::{
    helper::{mime_from_path, non_empty, parse_date},
    AttachmentNote, Config, DeckError, MediaNote, NoteBody, NoteItem, NoteType, Repetition,
    Result, TaskNote, DEFAULT_MAX_ATTACHMENT_BYTES,
};

/// Limits applied while building a record.
#[derive(Debug, Clone, Copy)]
pub struct FormLimits {
    pub max_attachment_bytes: u64,
}

impl Default for FormLimits {
    fn default() -> Self {
        Self {
            max_attachment_bytes: DEFAULT_MAX_ATTACHMENT_BYTES,
        }
    }
}

impl From<&Config> for FormLimits {
    fn from(config: &Config) -> Self {
        Self {
            max_attachment_bytes: config.max_attachment_bytes,
        }
    }
}

/// Raw user input of the note form.
#[derive(Debug, Clone)]
pub struct NoteForm {
    pub note_type: NoteType,
    pub title: Option<String>,
    pub content: Option<String>,
    pub due_date: Option<String>,
    pub reminder_date: Option<String>,
    pub repetition: Repetition,
    pub file: Option<PathBuf>,
}

impl NoteForm {
    /// An empty form for the given kind.
    pub fn new(note_type: NoteType) -> Self {
        Self {
            note_type,
            title: None,
            content: None,
            due_date: None,
            reminder_date: None,
            repetition: Repetition::None,
            file: None,
        }
    }

    /// Validates the input and builds the record.
    ///
    /// Attachments are read and encoded asynchronously; this is the only
    /// suspend point of a submission.
    pub async fn submit(self, limits: &FormLimits) -> Result<NoteItem> {
        debug!("Submitting {} form", self.note_type);

        let body = match self.note_type {
            NoteType::Task => {
                let content = non_empty(self.content).ok_or(DeckError::EmptyContent)?;
                NoteBody::Task(TaskNote {
                    content,
                    due_date: parse_date(self.due_date.as_deref())?,
                    reminder_date: parse_date(self.reminder_date.as_deref())?,
                    repetition: self.repetition,
                })
            }
            NoteType::Image | NoteType::Video | NoteType::Audio => {
                let media = MediaNote {
                    title: required(self.title, "title")?,
                    content: required(self.content, "url")?,
                };
                match self.note_type {
                    NoteType::Image => NoteBody::Image(media),
                    NoteType::Video => NoteBody::Video(media),
                    _ => NoteBody::Audio(media),
                }
            }
            NoteType::Attachment => {
                let title = required(self.title, "title")?;
                let path = self.file.ok_or_else(|| DeckError::MissingField {
                    field: "file".to_string(),
                })?;
                NoteBody::Attachment(encode_attachment(title, path, limits).await?)
            }
        };

        let item = NoteItem::new(body);
        info!("Built {} note {}", item.note_type(), item.id);
        Ok(item)
    }
}

fn required(value: Option<String>, field: &str) -> Result<String> {
    non_empty(value).ok_or_else(|| DeckError::MissingField {
        field: field.to_string(),
    })
}

/// Checks the size ceiling, then reads the file into a data URI.
async fn encode_attachment(
    title: String,
    path: PathBuf,
    limits: &FormLimits,
) -> Result<AttachmentNote> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    let metadata = tokio::fs::metadata(&path).await.map_err(|e| {
        error!("Error reading file {}: {}", path.display(), e);
        DeckError::FileRead {
            path: path.clone(),
            source: e,
        }
    })?;

    if metadata.len() > limits.max_attachment_bytes {
        return Err(DeckError::FileTooLarge {
            file_name,
            size: metadata.len(),
            limit: limits.max_attachment_bytes,
        });
    }

    let bytes = tokio::fs::read(&path).await.map_err(|e| {
        error!("Error reading file {}: {}", path.display(), e);
        DeckError::FileRead {
            path: path.clone(),
            source: e,
        }
    })?;

    let file_type = mime_from_path(&path).to_string();
    let content = format!("data:{};base64,{}", file_type, BASE64.encode(&bytes));
    debug!("Encoded {} ({} bytes) as {}", file_name, bytes.len(), file_type);

    Ok(AttachmentNote {
        title,
        file_name,
        file_type,
        content,
    })
}
