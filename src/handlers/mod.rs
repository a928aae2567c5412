pub mod auth;
pub mod geo;
pub mod offers;
pub mod payments;
pub mod requests;


use actix_web::{HttpRequest, HttpResponse};
use chrono::Utc;
use serde_json::json;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::Profile;

const SESSION_TTL_DAYS: i64 = 30;

pub async fn index() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "service": "sila-backend",
        "status": "OK",
    }))
}

pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "OK",
        "timestamp": Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Resolves the bearer session token to the calling profile. Expired or
/// unknown sessions read as unauthenticated.
pub async fn authenticate(req: &HttpRequest, pool: &SqlitePool) -> Result<Profile, ServiceError> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(ServiceError::Unauthenticated)?;

    let row = sqlx::query(
        "SELECT p.id, p.email, p.phone, p.user_type, p.created_at \
         FROM sessions s JOIN profiles p ON p.id = s.user_id \
         WHERE s.token = ? \
           AND (s.expires_at IS NULL OR datetime(s.expires_at) > datetime('now'))",
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => Ok(Profile::from_row(&row)?),
        None => Err(ServiceError::Unauthenticated),
    }
}

pub async fn issue_session(pool: &SqlitePool, user_id: &str) -> Result<String, ServiceError> {
    let token = Uuid::new_v4().to_string();
    let created_at = Utc::now();
    let expires_at = created_at + chrono::Duration::days(SESSION_TTL_DAYS);

    sqlx::query("INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)")
        .bind(&token)
        .bind(user_id)
        .bind(created_at.to_rfc3339())
        .bind(expires_at.to_rfc3339())
        .execute(pool)
        .await?;

    Ok(token)
}
