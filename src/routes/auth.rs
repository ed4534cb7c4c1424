//! Authentication routes
//!
//! A single hardcoded demo credential issuing a short-lived JWT
//! cookie. This is deliberately not a real authentication model; no
//! route enforces the token.

use axum::{
    extract::State,
    http::header::SET_COOKIE,
    response::{AppendHeaders, IntoResponse},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::state::AppState;

const DEMO_EMAIL: &str = "sharmil@gmail.com";
const DEMO_PASSWORD: &str = "123456";
const DEMO_USER_ID: &str = "user-123";

/// Token lifetime in seconds (one hour)
const TOKEN_TTL_SECS: i64 = 60 * 60;

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Serialize)]
struct LoginResponse {
    message: &'static str,
    token: String,
}

#[derive(Serialize)]
struct Claims {
    sub: String,
    email: String,
    exp: i64,
}

/// Create the auth router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
}

/// POST /api/auth/login
async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    if request.email != DEMO_EMAIL || request.password != DEMO_PASSWORD {
        return Err(AppError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    let claims = Claims {
        sub: DEMO_USER_ID.to_string(),
        email: request.email,
        exp: chrono::Utc::now().timestamp() + TOKEN_TTL_SECS,
    };

    let token = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(state.config().auth.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))?;

    let cookie = format!(
        "token={token}; HttpOnly; Path=/; Max-Age={TOKEN_TTL_SECS}; SameSite=Lax"
    );

    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(LoginResponse {
            message: "Logged in successfully",
            token,
        }),
    ))
}

/// POST /api/auth/logout
async fn logout() -> impl IntoResponse {
    let cookie = "token=; HttpOnly; Path=/; Max-Age=0; SameSite=Lax".to_string();

    (
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(serde_json::json!({ "message": "Logged out successfully" })),
    )
}
