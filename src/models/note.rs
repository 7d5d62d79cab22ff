use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{NoteFile, NoteFileInput};

/// Title used when a note is created without one.
pub const DEFAULT_NOTE_TITLE: &str = "New note";

/// Content used when a note is created without any.
pub const DEFAULT_NOTE_CONTENT: &str = "<p>Start writing...</p>";

/// A rich-text note with embedded file attachments.
///
/// `folder_id` is not checked against existing folders. A note whose folder
/// is gone is still returned by queries on that id and by the full listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: Uuid,
    pub folder_id: Uuid,
    pub title: String,
    /// HTML content.
    pub content: String,
    /// Attachments in display order.
    pub files: Vec<NoteFile>,
    pub created_at: DateTime<Utc>,
    /// Refreshed on every mutation, never behind `created_at`.
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new note.
///
/// Empty or missing `title`/`content` fall back to [`DEFAULT_NOTE_TITLE`] and
/// [`DEFAULT_NOTE_CONTENT`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNoteInput {
    pub folder_id: Uuid,
    pub title: Option<String>,
    pub content: Option<String>,
}

/// Input for updating a note.
///
/// This is a full replace of all three fields: a field left out (or sent as
/// `null`) is written as its empty value rather than kept.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNoteInput {
    pub title: Option<String>,
    pub content: Option<String>,
    pub files: Option<Vec<NoteFileInput>>,
}
