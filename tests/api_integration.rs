//! End-to-end tests for the API router
//!
//! Drives the real router over an in-memory SQLite database, covering
//! the cache hit/miss lifecycle, write-through invalidation,
//! pagination totals and the upload rejection paths.

use std::str::FromStr;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tower::ServiceExt;

use clinical_notes_server::config::Config;
use clinical_notes_server::db::initialize_schema;
use clinical_notes_server::routes::api_router;
use clinical_notes_server::state::AppState;

async fn test_app() -> Router {
    // A single connection keeps every statement on the same in-memory
    // database.
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();

    initialize_schema(&pool).await.unwrap();

    api_router(AppState::new(Config::default(), pool))
}

async fn request(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, value)
}

async fn create_patient(app: &Router, first_name: &str) -> String {
    let (status, body) = request(
        app,
        Method::POST,
        "/api/patients",
        Some(json!({
            "firstName": first_name,
            "lastName": "Test",
            "dob": "1980-01-01",
            "gender": "other",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    body["id"].as_str().unwrap().to_string()
}

async fn create_note(app: &Router, patient_id: &str, title: &str, content: &str) {
    let (status, _) = request(
        app,
        Method::POST,
        "/api/notes",
        Some(json!({
            "patientId": patient_id,
            "patientName": "Test Patient",
            "noteType": "typed",
            "title": title,
            "content": content,
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_health_and_root() {
    let app = test_app().await;

    let (status, body) = request(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = request(&app, Method::GET, "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_patients_paginated_cache_lifecycle() {
    let app = test_app().await;
    let id = create_patient(&app, "Ada").await;

    // First read misses the cache and populates it
    let (status, body) =
        request(&app, Method::GET, "/api/patients/paginated?page=1&limit=5", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cached"], false);
    assert_eq!(body["total"], 1);

    // Second read is a hit
    let (_, body) =
        request(&app, Method::GET, "/api/patients/paginated?page=1&limit=5", None).await;
    assert_eq!(body["cached"], true);

    // A write invalidates the listing; the next read misses and
    // reflects the mutation
    let (status, _) = request(
        &app,
        Method::PUT,
        &format!("/api/patients/{id}"),
        Some(json!({ "lastName": "Byron" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) =
        request(&app, Method::GET, "/api/patients/paginated?page=1&limit=5", None).await;
    assert_eq!(body["cached"], false);
    assert_eq!(body["data"][0]["lastName"], "Byron");
}

#[tokio::test]
async fn test_notes_pagination_totals() {
    let app = test_app().await;
    let patient_id = create_patient(&app, "Jo").await;

    for i in 0..12 {
        create_note(&app, &patient_id, &format!("Visit {i}"), "routine").await;
    }

    let (_, body) = request(&app, Method::GET, "/api/notes?page=2&limit=5", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 5);
    assert_eq!(body["total"], 12);
    assert_eq!(body["cached"], false);

    let (_, body) = request(&app, Method::GET, "/api/notes?page=3&limit=5", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["total"], 12);

    // Same query shape again is a cache hit
    let (_, body) = request(&app, Method::GET, "/api/notes?page=2&limit=5", None).await;
    assert_eq!(body["cached"], true);
}

#[tokio::test]
async fn test_distinct_filters_use_distinct_cache_entries() {
    let app = test_app().await;
    let patient_id = create_patient(&app, "Jo").await;
    create_note(&app, &patient_id, "Cardiology", "ECG reviewed").await;

    let (_, body) = request(&app, Method::GET, "/api/notes?page=1&limit=5", None).await;
    assert_eq!(body["cached"], false);

    // A filtered request never collides with the unfiltered entry
    let (_, body) =
        request(&app, Method::GET, "/api/notes?page=1&limit=5&filter=cardio", None).await;
    assert_eq!(body["cached"], false);
    assert_eq!(body["total"], 1);

    let (_, body) =
        request(&app, Method::GET, "/api/notes?page=1&limit=5&filter=cardio", None).await;
    assert_eq!(body["cached"], true);
}

#[tokio::test]
async fn test_note_mutations_invalidate_listing() {
    let app = test_app().await;
    let patient_id = create_patient(&app, "Jo").await;
    create_note(&app, &patient_id, "First", "text").await;

    let (_, body) = request(&app, Method::GET, "/api/notes", None).await;
    assert_eq!(body["cached"], false);
    let note_id = body["data"][0]["id"].as_str().unwrap().to_string();

    let (_, body) = request(&app, Method::GET, "/api/notes", None).await;
    assert_eq!(body["cached"], true);

    // Delete returns the deleted row and clears the listing cache
    let (status, body) =
        request(&app, Method::DELETE, &format!("/api/notes/{note_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], note_id.as_str());

    let (_, body) = request(&app, Method::GET, "/api/notes", None).await;
    assert_eq!(body["cached"], false);
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn test_patient_notes_lookup() {
    let app = test_app().await;
    let first = create_patient(&app, "Jo").await;
    let second = create_patient(&app, "Sam").await;
    create_note(&app, &first, "A", "a").await;
    create_note(&app, &second, "B", "b").await;

    let (status, body) = request(&app, Method::GET, &format!("/api/notes/{first}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let notes = body.as_array().unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0]["title"], "A");
}

#[tokio::test]
async fn test_delete_patient_returns_row_then_404() {
    let app = test_app().await;
    let id = create_patient(&app, "Ada").await;

    let (status, body) =
        request(&app, Method::DELETE, &format!("/api/patients/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id.as_str());

    let (status, body) = request(&app, Method::GET, &format!("/api/patients/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

fn multipart_request(uri: &str, parts: &[(&str, Option<(&str, &str)>, &str)]) -> Request<Body> {
    const BOUNDARY: &str = "test-boundary-7MA4YWxkTrZu0gW";

    let mut body = String::new();
    for (name, file, value) in parts {
        body.push_str(&format!("--{BOUNDARY}\r\n"));
        match file {
            Some((filename, content_type)) => {
                body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                     Content-Type: {content_type}\r\n\r\n"
                ));
            }
            None => {
                body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"\r\n\r\n"
                ));
            }
        }
        body.push_str(value);
        body.push_str("\r\n");
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));

    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_upload_rejects_unsupported_file_type() {
    let app = test_app().await;
    let patient_id = create_patient(&app, "Jo").await;

    let request = multipart_request(
        "/api/notes/upload",
        &[
            ("file", Some(("note.txt", "text/plain")), "plain text note"),
            ("patientId", None, &patient_id),
            ("title", None, "Scanned note"),
        ],
    );

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "Unsupported file type");
}

#[tokio::test]
async fn test_upload_without_file_is_rejected() {
    let app = test_app().await;
    let patient_id = create_patient(&app, "Jo").await;

    let request = multipart_request(
        "/api/notes/upload",
        &[
            ("patientId", None, &patient_id),
            ("title", None, "Scanned note"),
        ],
    );

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(
        body["error"],
        "Unable to extract text from the provided file. Try again with a different file."
    );
}

#[tokio::test]
async fn test_login_demo_credentials() {
    let app = test_app().await;

    let (status, _) = request(
        &app,
        Method::POST,
        "/api/auth/login",
        Some(json!({ "email": "wrong@example.com", "password": "nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = request(
        &app,
        Method::POST,
        "/api/auth/login",
        Some(json!({ "email": "sharmil@gmail.com", "password": "123456" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
}
