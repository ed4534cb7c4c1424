//! Patient API routes
//!
//! The paginated listing is served through the patient TTL cache;
//! every mutation clears the listing prefix after the store write
//! settles and before the handler returns, so the next read always
//! observes fresh data.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::db::{CreatePatient, Page, Patient, PatientRepository, UpdatePatient};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Key prefix for cached patient listing pages
pub const PATIENTS_CACHE_PREFIX: &str = "patients_page_";

/// Encodes every parameter that affects the result set
fn cache_key(page: u32, limit: u32) -> String {
    format!("{PATIENTS_CACHE_PREFIX}{page}_limit_{limit}")
}

#[derive(Debug, Deserialize)]
pub struct PaginationQuery {
    page: Option<u32>,
    limit: Option<u32>,
}

/// Listing page plus cache-hit flag
#[derive(Serialize)]
struct ListResponse<T> {
    #[serde(flatten)]
    page: Page<T>,
    cached: bool,
}

/// Create the patients router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_patients).post(create_patient))
        .route("/paginated", get(list_patients_paginated))
        .route(
            "/:id",
            get(get_patient).put(update_patient).delete(delete_patient),
        )
}

/// GET /api/patients
async fn list_patients(State(state): State<AppState>) -> Result<Json<Vec<Patient>>> {
    let patients = PatientRepository::new(state.db()).list_all().await?;
    Ok(Json(patients))
}

/// GET /api/patients/paginated?page&limit
async fn list_patients_paginated(
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<ListResponse<Patient>>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(5).max(1);

    let key = cache_key(page, limit);
    if let Some(cached) = state.patients_cache().get(&key).await {
        tracing::debug!(key = %key, "Serving patients from cache");
        return Ok(Json(ListResponse {
            page: cached,
            cached: true,
        }));
    }

    let offset = i64::from((page - 1) * limit);
    let result = PatientRepository::new(state.db())
        .list_paginated(i64::from(limit), offset)
        .await?;

    state.patients_cache().set(key, result.clone()).await;

    Ok(Json(ListResponse {
        page: result,
        cached: false,
    }))
}

/// GET /api/patients/:id
async fn get_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Patient>> {
    let patient = PatientRepository::new(state.db())
        .get(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Patient not found: {}", id)))?;
    Ok(Json(patient))
}

/// POST /api/patients
async fn create_patient(
    State(state): State<AppState>,
    Json(data): Json<CreatePatient>,
) -> Result<Json<Patient>> {
    let patient = PatientRepository::new(state.db()).create(&data).await?;

    state
        .patients_cache()
        .clear_by_prefix(Some(PATIENTS_CACHE_PREFIX))
        .await;

    Ok(Json(patient))
}

/// PUT /api/patients/:id
async fn update_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(data): Json<UpdatePatient>,
) -> Result<Json<Patient>> {
    let updated = PatientRepository::new(state.db()).update(&id, &data).await?;

    state
        .patients_cache()
        .clear_by_prefix(Some(PATIENTS_CACHE_PREFIX))
        .await;

    let patient =
        updated.ok_or_else(|| AppError::NotFound(format!("Patient not found: {}", id)))?;
    Ok(Json(patient))
}

/// DELETE /api/patients/:id
///
/// Returns the deleted row.
async fn delete_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Patient>> {
    let deleted = PatientRepository::new(state.db()).delete(&id).await?;

    state
        .patients_cache()
        .clear_by_prefix(Some(PATIENTS_CACHE_PREFIX))
        .await;

    let patient =
        deleted.ok_or_else(|| AppError::NotFound(format!("Patient not found: {}", id)))?;
    Ok(Json(patient))
}
