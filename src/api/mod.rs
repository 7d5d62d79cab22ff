mod error;
mod extractors;
mod handlers;

pub use error::{ApiError, ErrorBody};

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::db::Database;

/// Largest accepted request body. Attachments travel inline as base64.
pub const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

pub fn create_router(db: Database) -> Router {
    let api = Router::new()
        // Folders
        .route("/folders", get(handlers::list_folders))
        .route("/folders", post(handlers::create_folder))
        .route("/folders/{id}", delete(handlers::delete_folder))
        .route("/folders/{id}/notes", get(handlers::list_folder_notes))
        // Notes
        .route("/notes", get(handlers::list_notes))
        .route("/notes", post(handlers::create_note))
        .route("/notes/{id}", put(handlers::update_note))
        .route("/notes/{id}", delete(handlers::delete_note))
        // Attachments
        .route("/notes/{id}/files", post(handlers::add_file))
        .route("/notes/{id}/files/{file_id}", delete(handlers::remove_file));

    Router::new()
        .nest("/api", api)
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(db)
}
