//! Note API routes
//!
//! The filterable paginated listing is served through the note TTL
//! cache, keyed by page, limit and the filter text verbatim. Every
//! mutation (including uploads) clears the listing prefix after the
//! store write settles and before the handler returns.
//!
//! Route shape note: GET on the id segment addresses a *patient*
//! (all notes for that patient), while PUT/DELETE address a note id.

use axum::{
    extract::{Multipart, Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::db::{CreateNote, Note, NoteRepository, NoteType, Page, UpdateNote};
use crate::error::{AppError, Result};
use crate::extract::{DocumentKind, UploadedDocument};
use crate::state::AppState;

/// Key prefix for cached note listing pages
pub const NOTES_CACHE_PREFIX: &str = "notes_page_";

/// Encodes every parameter that affects the result set, filter verbatim
fn cache_key(page: u32, limit: u32, filter: Option<&str>) -> String {
    format!(
        "{NOTES_CACHE_PREFIX}{page}_limit_{limit}_filter_{}",
        filter.unwrap_or("")
    )
}

#[derive(Debug, Deserialize)]
pub struct NotesQuery {
    page: Option<u32>,
    limit: Option<u32>,
    filter: Option<String>,
}

/// Listing page plus cache-hit flag
#[derive(Serialize)]
struct ListResponse<T> {
    #[serde(flatten)]
    page: Page<T>,
    cached: bool,
}

/// Create the notes router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_notes).post(create_note))
        .route("/upload", post(upload_note))
        .route(
            "/:id",
            get(list_patient_notes).put(update_note).delete(delete_note),
        )
}

async fn clear_notes_cache(state: &AppState) {
    state
        .notes_cache()
        .clear_by_prefix(Some(NOTES_CACHE_PREFIX))
        .await;
}

/// GET /api/notes?page&limit&filter
async fn list_notes(
    State(state): State<AppState>,
    Query(query): Query<NotesQuery>,
) -> Result<Json<ListResponse<Note>>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(5).max(1);
    let filter = query.filter.as_deref();

    let key = cache_key(page, limit, filter);
    if let Some(cached) = state.notes_cache().get(&key).await {
        tracing::debug!(key = %key, "Serving notes from cache");
        return Ok(Json(ListResponse {
            page: cached,
            cached: true,
        }));
    }

    let offset = i64::from((page - 1) * limit);
    let result = NoteRepository::new(state.db())
        .list_paginated(i64::from(limit), offset, filter)
        .await?;

    state.notes_cache().set(key, result.clone()).await;

    Ok(Json(ListResponse {
        page: result,
        cached: false,
    }))
}

/// GET /api/notes/:patientId — all notes for a patient
async fn list_patient_notes(
    State(state): State<AppState>,
    Path(patient_id): Path<String>,
) -> Result<Json<Vec<Note>>> {
    let notes = NoteRepository::new(state.db())
        .list_for_patient(&patient_id)
        .await?;
    Ok(Json(notes))
}

/// POST /api/notes
async fn create_note(
    State(state): State<AppState>,
    Json(data): Json<CreateNote>,
) -> Result<Json<Note>> {
    let note = NoteRepository::new(state.db()).create(&data).await?;

    clear_notes_cache(&state).await;

    Ok(Json(note))
}

/// PUT /api/notes/:id
async fn update_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(data): Json<UpdateNote>,
) -> Result<Json<Note>> {
    let updated = NoteRepository::new(state.db()).update(&id, &data).await?;

    clear_notes_cache(&state).await;

    let note = updated.ok_or_else(|| AppError::NotFound(format!("Note not found: {}", id)))?;
    Ok(Json(note))
}

/// DELETE /api/notes/:id
///
/// Returns the deleted row.
async fn delete_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Note>> {
    let deleted = NoteRepository::new(state.db()).delete(&id).await?;

    clear_notes_cache(&state).await;

    let note = deleted.ok_or_else(|| AppError::NotFound(format!("Note not found: {}", id)))?;
    Ok(Json(note))
}

/// Collected multipart fields for an upload
#[derive(Default)]
struct UploadForm {
    file: Option<(Vec<u8>, String)>,
    patient_id: Option<String>,
    patient_name: Option<String>,
    note_type: Option<String>,
    title: Option<String>,
}

/// POST /api/notes/upload
///
/// Multipart upload of a scanned document: extract text (PDF text
/// layer, then OCR), optionally reformat it through the external
/// cleanup service, store the note and invalidate the listing cache.
async fn upload_note(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Note>> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let mime = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await?;
                form.file = Some((data.to_vec(), mime));
            }
            "patientId" => form.patient_id = Some(field.text().await?),
            "patientName" => form.patient_name = Some(field.text().await?),
            "noteType" => form.note_type = Some(field.text().await?),
            "title" => form.title = Some(field.text().await?),
            _ => {}
        }
    }

    let extracted = match form.file {
        Some((bytes, mime)) => {
            let kind = DocumentKind::from_mime(&mime)
                .ok_or(AppError::UnsupportedFileType(mime))?;
            state
                .extractor()
                .extract(&UploadedDocument::new(bytes, kind))
                .await?
        }
        None => String::new(),
    };

    if extracted.is_empty() {
        return Err(AppError::BadRequest(
            "Unable to extract text from the provided file. Try again with a different file."
                .to_string(),
        ));
    }

    // Cleanup-service failures fall back to the raw text inside the
    // formatter; the upload itself never fails on formatting.
    let content = state.formatter().format_note(&extracted).await;

    let (Some(patient_id), Some(title)) = (form.patient_id, form.title) else {
        return Err(AppError::BadRequest("Missing required fields".to_string()));
    };

    let note_type = match form.note_type.as_deref() {
        Some("typed") => NoteType::Typed,
        _ => NoteType::Scanned,
    };

    let note = NoteRepository::new(state.db())
        .create(&CreateNote {
            patient_id,
            patient_name: form.patient_name,
            note_type,
            title,
            content,
        })
        .await?;

    clear_notes_cache(&state).await;

    Ok(Json(note))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_encodes_filter_verbatim() {
        assert_eq!(cache_key(1, 5, None), "notes_page_1_limit_5_filter_");
        assert_eq!(
            cache_key(2, 10, Some("cardio")),
            "notes_page_2_limit_10_filter_cardio"
        );
        // Distinct filter strings never collide
        assert_ne!(cache_key(1, 5, Some("a")), cache_key(1, 5, Some("b")));
        assert!(cache_key(1, 5, None).starts_with(NOTES_CACHE_PREFIX));
    }
}
