//! Patient database operations

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use super::Page;
use crate::error::{AppError, Result};

/// Patient gender, stored as lowercase TEXT
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
    Unknown,
}

impl Gender {
    fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
            Gender::Unknown => "unknown",
        }
    }
}

/// Patient record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub dob: String,
    pub gender: Gender,
    pub created_at: String,
    pub updated_at: String,
}

/// Create patient request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePatient {
    pub first_name: String,
    pub last_name: String,
    pub dob: String,
    #[serde(default)]
    pub gender: Option<Gender>,
}

/// Update patient request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePatient {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub dob: Option<String>,
    pub gender: Option<Gender>,
}

const PATIENT_COLUMNS: &str =
    "id, first_name, last_name, dob, gender, created_at, updated_at";

/// Patient repository
pub struct PatientRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> PatientRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a specific patient
    pub async fn get(&self, id: &str) -> Result<Option<Patient>> {
        let patient = sqlx::query_as::<_, Patient>(&format!(
            "SELECT {PATIENT_COLUMNS} FROM patients WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(patient)
    }

    /// List all patients
    pub async fn list_all(&self) -> Result<Vec<Patient>> {
        let patients = sqlx::query_as::<_, Patient>(&format!(
            "SELECT {PATIENT_COLUMNS} FROM patients ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(patients)
    }

    /// List one page of patients with the total count
    pub async fn list_paginated(&self, limit: i64, offset: i64) -> Result<Page<Patient>> {
        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM patients")
            .fetch_one(self.pool)
            .await?;

        let data = sqlx::query_as::<_, Patient>(&format!(
            "SELECT {PATIENT_COLUMNS} FROM patients ORDER BY created_at DESC LIMIT ? OFFSET ?"
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

    /// Create a new patient, returning the created row
    pub async fn create(&self, data: &CreatePatient) -> Result<Patient> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let gender = data.gender.unwrap_or(Gender::Unknown);

        sqlx::query(
            r#"
            INSERT INTO patients (id, first_name, last_name, dob, gender, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&data.first_name)
        .bind(&data.last_name)
        .bind(&data.dob)
        .bind(gender.as_str())
        .bind(&now)
        .bind(&now)
        .execute(self.pool)
        .await?;

        self.get(&id)
            .await?
            .ok_or_else(|| AppError::Internal("Failed to fetch created patient".to_string()))
    }

    /// Update a patient, returning the updated row
    pub async fn update(&self, id: &str, data: &UpdatePatient) -> Result<Option<Patient>> {
        let now = Utc::now().to_rfc3339();

        // Build dynamic update query
        let mut set_clauses = vec!["updated_at = ?".to_string()];
        let mut binds: Vec<String> = vec![now];

        if let Some(ref first_name) = data.first_name {
            set_clauses.push("first_name = ?".to_string());
            binds.push(first_name.clone());
        }

        if let Some(ref last_name) = data.last_name {
            set_clauses.push("last_name = ?".to_string());
            binds.push(last_name.clone());
        }

        if let Some(ref dob) = data.dob {
            set_clauses.push("dob = ?".to_string());
            binds.push(dob.clone());
        }

        if let Some(gender) = data.gender {
            set_clauses.push("gender = ?".to_string());
            binds.push(gender.as_str().to_string());
        }

        let query = format!(
            "UPDATE patients SET {} WHERE id = ?",
            set_clauses.join(", ")
        );

        let mut sql_query = sqlx::query(&query);
        for bind in binds {
            sql_query = sql_query.bind(bind);
        }
        sql_query = sql_query.bind(id);

        sql_query.execute(self.pool).await?;

        self.get(id).await
    }

    /// Delete a patient, returning the deleted row
    pub async fn delete(&self, id: &str) -> Result<Option<Patient>> {
        let patient = self.get(id).await?;

        if patient.is_some() {
            sqlx::query("DELETE FROM patients WHERE id = ?")
                .bind(id)
                .execute(self.pool)
                .await?;
        }

        Ok(patient)
    }
}
