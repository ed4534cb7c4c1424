//! Clinical note database operations
//!
//! The paginated listing here is the query the notes cache fronts: a
//! case-insensitive substring filter over patient name, title and
//! content, ordered newest first, with the total count computed under
//! the same predicate.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use super::Page;
use crate::error::{AppError, Result};

/// Note kind, stored as lowercase TEXT
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum NoteType {
    Typed,
    Scanned,
}

impl NoteType {
    fn as_str(&self) -> &'static str {
        match self {
            NoteType::Typed => "typed",
            NoteType::Scanned => "scanned",
        }
    }
}

/// Clinical note record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub patient_id: String,
    pub patient_name: Option<String>,
    pub note_type: NoteType,
    pub title: String,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Create note request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNote {
    pub patient_id: String,
    pub patient_name: Option<String>,
    pub note_type: NoteType,
    pub title: String,
    pub content: String,
}

/// Update note request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNote {
    pub patient_name: Option<String>,
    pub note_type: Option<NoteType>,
    pub title: Option<String>,
    pub content: Option<String>,
}

const NOTE_COLUMNS: &str =
    "id, patient_id, patient_name, note_type, title, content, created_at, updated_at";

/// Note repository
pub struct NoteRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> NoteRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a specific note
    pub async fn get(&self, id: &str) -> Result<Option<Note>> {
        let note = sqlx::query_as::<_, Note>(&format!(
            "SELECT {NOTE_COLUMNS} FROM notes WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(note)
    }

    /// List all notes for a patient
    pub async fn list_for_patient(&self, patient_id: &str) -> Result<Vec<Note>> {
        let notes = sqlx::query_as::<_, Note>(&format!(
            "SELECT {NOTE_COLUMNS} FROM notes WHERE patient_id = ? ORDER BY created_at DESC"
        ))
        .bind(patient_id)
        .fetch_all(self.pool)
        .await?;

        Ok(notes)
    }

    /// List one page of notes with the total count
    ///
    /// `filter` is matched case-insensitively as a substring of the
    /// patient name, title or content; a blank filter lists everything.
    pub async fn list_paginated(
        &self,
        limit: i64,
        offset: i64,
        filter: Option<&str>,
    ) -> Result<Page<Note>> {
        match filter.map(str::trim).filter(|f| !f.is_empty()) {
            Some(filter) => {
                let pattern = format!("%{}%", filter.to_lowercase());

                let total: (i64,) = sqlx::query_as(
                    r#"
                    SELECT COUNT(*) FROM notes
                    WHERE lower(coalesce(patient_name, '')) LIKE ?
                       OR lower(title) LIKE ?
                       OR lower(content) LIKE ?
                    "#,
                )
                .bind(&pattern)
                .bind(&pattern)
                .bind(&pattern)
                .fetch_one(self.pool)
                .await?;

                let data = sqlx::query_as::<_, Note>(&format!(
                    r#"
                    SELECT {NOTE_COLUMNS} FROM notes
                    WHERE lower(coalesce(patient_name, '')) LIKE ?
                       OR lower(title) LIKE ?
                       OR lower(content) LIKE ?
                    ORDER BY created_at DESC
                    LIMIT ? OFFSET ?
                    "#
                ))
                .bind(&pattern)
                .bind(&pattern)
                .bind(&pattern)
                .bind(limit)
                .bind(offset)
                .fetch_all(self.pool)
                .await?;

                Ok(Page {
                    data,
                    total: total.0,
                })
            }
            None => {
                let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM notes")
                    .fetch_one(self.pool)
                    .await?;

                let data = sqlx::query_as::<_, Note>(&format!(
                    "SELECT {NOTE_COLUMNS} FROM notes ORDER BY created_at DESC LIMIT ? OFFSET ?"
                ))
                .bind(limit)
                .bind(offset)
                .fetch_all(self.pool)
                .await?;

                Ok(Page {
                    data,
                    total: total.0,
                })
            }
        }
    }

    /// Create a new note, returning the created row
    pub async fn create(&self, data: &CreateNote) -> Result<Note> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO notes (id, patient_id, patient_name, note_type, title, content, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&data.patient_id)
        .bind(&data.patient_name)
        .bind(data.note_type.as_str())
        .bind(&data.title)
        .bind(&data.content)
        .bind(&now)
        .bind(&now)
        .execute(self.pool)
        .await?;

        self.get(&id)
            .await?
            .ok_or_else(|| AppError::Internal("Failed to fetch created note".to_string()))
    }

    /// Update a note, returning the updated row
    pub async fn update(&self, id: &str, data: &UpdateNote) -> Result<Option<Note>> {
        let now = Utc::now().to_rfc3339();

        // Build dynamic update query
        let mut set_clauses = vec!["updated_at = ?".to_string()];
        let mut binds: Vec<String> = vec![now];

        if let Some(ref patient_name) = data.patient_name {
            set_clauses.push("patient_name = ?".to_string());
            binds.push(patient_name.clone());
        }

        if let Some(note_type) = data.note_type {
            set_clauses.push("note_type = ?".to_string());
            binds.push(note_type.as_str().to_string());
        }

        if let Some(ref title) = data.title {
            set_clauses.push("title = ?".to_string());
            binds.push(title.clone());
        }

        if let Some(ref content) = data.content {
            set_clauses.push("content = ?".to_string());
            binds.push(content.clone());
        }

        let query = format!("UPDATE notes SET {} WHERE id = ?", set_clauses.join(", "));

        let mut sql_query = sqlx::query(&query);
        for bind in binds {
            sql_query = sql_query.bind(bind);
        }
        sql_query = sql_query.bind(id);

        sql_query.execute(self.pool).await?;

        self.get(id).await
    }

    /// Delete a note, returning the deleted row
    pub async fn delete(&self, id: &str) -> Result<Option<Note>> {
        let note = self.get(id).await?;

        if note.is_some() {
            sqlx::query("DELETE FROM notes WHERE id = ?")
                .bind(id)
                .execute(self.pool)
                .await?;
        }

        Ok(note)
    }
}
