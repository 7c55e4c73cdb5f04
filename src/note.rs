//! Records of the todo/notes board.
//!
//! Every item carries a stable id and a [`NoteBody`] holding exactly the
//! fields its kind needs.
use std::fmt;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Recurrence class of a task, also the grouping key of the board.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Repetition {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
    Ongoing,
}

impl Repetition {
    /// All classes in board order.
    pub const ALL: [Repetition; 5] = [
        Repetition::None,
        Repetition::Daily,
        Repetition::Weekly,
        Repetition::Monthly,
        Repetition::Ongoing,
    ];

    /// Heading shown above the bucket.
    pub fn heading(self) -> &'static str {
        match self {
            Repetition::None => "One-Time",
            Repetition::Daily => "Daily",
            Repetition::Weekly => "Weekly",
            Repetition::Monthly => "Monthly",
            Repetition::Ongoing => "Ongoing",
        }
    }
}

/// The kind selector of the note form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum NoteType {
    Task,
    Image,
    Video,
    Audio,
    Attachment,
}

impl fmt::Display for NoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NoteType::Task => "task",
            NoteType::Image => "image",
            NoteType::Video => "video",
            NoteType::Audio => "audio",
            NoteType::Attachment => "attachment",
        };
        f.write_str(label)
    }
}

/// A task with optional dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskNote {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_date: Option<NaiveDate>,
    #[serde(default)]
    pub repetition: Repetition,
}

/// An image, video or audio link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaNote {
    pub title: String,
    /// The media URL
    pub content: String,
}

/// A file embedded as a data URI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentNote {
    pub title: String,
    pub file_name: String,
    /// MIME type of the file
    pub file_type: String,
    /// `data:<mime>;base64,...`
    pub content: String,
}

/// Kind-specific payload of a note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NoteBody {
    Task(TaskNote),
    Image(MediaNote),
    Video(MediaNote),
    Audio(MediaNote),
    Attachment(AttachmentNote),
}

/// Represents a single item on the board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteItem {
    /// Unique identifier assigned at creation
    pub id: Uuid,
    #[serde(default)]
    pub completed: bool,
    #[serde(flatten)]
    pub body: NoteBody,
}

impl NoteItem {
    /// Creates a new, not yet completed item with a fresh id.
    pub fn new(body: NoteBody) -> Self {
        Self {
            id: Uuid::new_v4(),
            completed: false,
            body,
        }
    }

    pub fn note_type(&self) -> NoteType {
        match self.body {
            NoteBody::Task(_) => NoteType::Task,
            NoteBody::Image(_) => NoteType::Image,
            NoteBody::Video(_) => NoteType::Video,
            NoteBody::Audio(_) => NoteType::Audio,
            NoteBody::Attachment(_) => NoteType::Attachment,
        }
    }

    /// Grouping key; everything but a task falls in the one-time bucket.
    pub fn repetition(&self) -> Repetition {
        match &self.body {
            NoteBody::Task(task) => task.repetition,
            _ => Repetition::None,
        }
    }

    /// The title, or the content for kinds without one.
    pub fn display_title(&self) -> &str {
        match &self.body {
            NoteBody::Task(task) => &task.content,
            NoteBody::Image(media) | NoteBody::Video(media) | NoteBody::Audio(media) => {
                &media.title
            }
            NoteBody::Attachment(file) => &file.title,
        }
    }

    pub fn as_task(&self) -> Option<&TaskNote> {
        match &self.body {
            NoteBody::Task(task) => Some(task),
            _ => None,
        }
    }

    /// Short id used on screen.
    pub fn short_id(&self) -> String {
        self.id.simple().to_string()[..8].to_string()
    }
}
