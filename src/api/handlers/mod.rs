use axum::{extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::extractors::{ApiJson, ApiPath};
use super::ApiError;
use crate::db::Database;
use crate::models::*;

/// `{ "success": true }` acknowledgment returned by the delete endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ack {
    pub success: bool,
}

impl Ack {
    fn ok() -> Json<Self> {
        Json(Self { success: true })
    }
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Folders
// ============================================================

pub async fn list_folders(State(db): State<Database>) -> Result<Json<Vec<Folder>>, ApiError> {
    Ok(Json(db.get_all_folders()?))
}

pub async fn create_folder(
    State(db): State<Database>,
    ApiJson(input): ApiJson<CreateFolderInput>,
) -> Result<Json<Folder>, ApiError> {
    let folder = db.create_folder(input)?;
    tracing::debug!("Created folder {} ({})", folder.name, folder.id);
    Ok(Json(folder))
}

/// Always acknowledges, whether or not the folder existed.
pub async fn delete_folder(
    State(db): State<Database>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Ack>, ApiError> {
    let outcome = db.delete_folder(id)?;

    match outcome.reassigned_to {
        Some(target) => tracing::info!(
            "Deleted folder {} (found: {}), moved {} note(s) to {}",
            id,
            outcome.deleted,
            outcome.notes_moved,
            target
        ),
        None => tracing::info!(
            "Deleted folder {} (found: {}), no folder left to adopt its notes",
            id,
            outcome.deleted
        ),
    }

    Ok(Ack::ok())
}

pub async fn list_folder_notes(
    State(db): State<Database>,
    ApiPath(folder_id): ApiPath<Uuid>,
) -> Result<Json<Vec<Note>>, ApiError> {
    Ok(Json(db.get_notes_by_folder(folder_id)?))
}

// ============================================================
// Notes
// ============================================================

pub async fn list_notes(State(db): State<Database>) -> Result<Json<Vec<Note>>, ApiError> {
    Ok(Json(db.get_all_notes()?))
}

pub async fn create_note(
    State(db): State<Database>,
    ApiJson(input): ApiJson<CreateNoteInput>,
) -> Result<Json<Note>, ApiError> {
    Ok(Json(db.create_note(input)?))
}

pub async fn update_note(
    State(db): State<Database>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<UpdateNoteInput>,
) -> Result<Json<Note>, ApiError> {
    db.update_note(id, input)?
        .map(Json)
        .ok_or_else(ApiError::note_not_found)
}

/// Always acknowledges, whether or not the note existed.
pub async fn delete_note(
    State(db): State<Database>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Ack>, ApiError> {
    if !db.delete_note(id)? {
        tracing::debug!("Delete of unknown note {}", id);
    }
    Ok(Ack::ok())
}

// ============================================================
// Attachments
// ============================================================

pub async fn add_file(
    State(db): State<Database>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<AddFileInput>,
) -> Result<Json<Note>, ApiError> {
    db.add_file(id, input.file)?
        .map(Json)
        .ok_or_else(ApiError::note_not_found)
}

pub async fn remove_file(
    State(db): State<Database>,
    ApiPath((note_id, file_id)): ApiPath<(Uuid, Uuid)>,
) -> Result<Json<Note>, ApiError> {
    db.remove_file(note_id, file_id)?
        .map(Json)
        .ok_or_else(ApiError::note_not_found)
}
