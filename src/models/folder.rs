use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name given to the folder created when the store starts out empty.
pub const DEFAULT_FOLDER_NAME: &str = "My Notes";

/// A named container for notes.
///
/// Folders are listed oldest first. The oldest folder doubles as the
/// adoption target for notes whose folder is deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: Uuid,
    pub name: String,
    /// UI expand/collapse state. Not changed by any endpoint.
    pub is_open: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFolderInput {
    pub name: String,
}

/// Result of deleting a folder and moving its notes.
#[derive(Debug, Clone, PartialEq)]
pub struct FolderDeletion {
    /// Whether a folder row actually matched the id.
    pub deleted: bool,
    /// The oldest remaining folder, if any survived the delete.
    pub reassigned_to: Option<Uuid>,
    /// How many notes were moved to `reassigned_to`.
    pub notes_moved: usize,
}
