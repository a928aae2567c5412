use actix_web::{web, HttpRequest, HttpResponse};
use bcrypt;
use serde::Deserialize;
use serde_json::json;
use sqlx::Row;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::i18n::{self, Locale};
use crate::models::{Contact, Profile, Role};
use crate::services::intents;
use crate::state::AppState;

use super::{authenticate, issue_session};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub user_type: Role,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub user_type: Role,
}

#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct OauthIntentRequest {
    pub user_type: Role,
}

#[derive(Debug, Deserialize)]
pub struct OauthCompleteRequest {
    pub intent_token: String,
    pub email: String,
}

pub async fn register(
    req: HttpRequest,
    data: web::Json<RegisterRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let body = data.into_inner();
    let pool = &state.pool;
    let locale = i18n::detect_locale(&req);

    let email = body.email.trim().to_ascii_lowercase();
    if email.is_empty() || !email.contains('@') || body.password.len() < 6 {
        return Err(ServiceError::Validation(match locale {
            Locale::Fr => "Email invalide ou mot de passe trop court (6 caractères minimum)".to_string(),
            Locale::En => "invalid email or password shorter than 6 characters".to_string(),
        }));
    }

    let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(1) FROM profiles WHERE email = ?")
        .bind(&email)
        .fetch_one(pool)
        .await?;
    if existing > 0 {
        return Err(ServiceError::State(match locale {
            Locale::Fr => "Un compte existe déjà avec cet email".to_string(),
            Locale::En => "an account already exists for this email".to_string(),
        }));
    }

    let hashed = bcrypt::hash(&body.password, bcrypt::DEFAULT_COST)
        .map_err(|err| ServiceError::Internal(format!("password hashing failed: {err}")))?;

    let profile = Profile {
        id: Uuid::new_v4().to_string(),
        email,
        phone: body.phone,
        user_type: body.user_type,
        created_at: chrono::Utc::now(),
    };
    sqlx::query(
        "INSERT INTO profiles (id, email, password, phone, user_type, created_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&profile.id)
    .bind(&profile.email)
    .bind(&hashed)
    .bind(&profile.phone)
    .bind(profile.user_type.as_str())
    .bind(profile.created_at.to_rfc3339())
    .execute(pool)
    .await?;

    let token = issue_session(pool, &profile.id).await?;
    tracing::info!(user_id = %profile.id, role = profile.user_type.as_str(), "user registered");

    Ok(HttpResponse::Created().json(json!({
        "user": profile,
        "token": token,
    })))
}

pub async fn login(
    req: HttpRequest,
    data: web::Json<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let body = data.into_inner();
    let pool = &state.pool;
    let locale = i18n::detect_locale(&req);

    let invalid_credentials = match locale {
        Locale::Fr => "Identifiants invalides",
        Locale::En => "invalid credentials",
    };

    let email = body.email.trim().to_ascii_lowercase();
    let row = sqlx::query(
        "SELECT id, email, phone, user_type, created_at, password \
         FROM profiles WHERE email = ? LIMIT 1",
    )
    .bind(&email)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(HttpResponse::Unauthorized().json(json!({ "error": invalid_credentials })));
    };

    // OAuth-created accounts carry no password hash and cannot log in here.
    let stored_hash = row.try_get::<Option<String>, _>("password").unwrap_or(None);
    let Some(stored_hash) = stored_hash else {
        return Ok(HttpResponse::Unauthorized().json(json!({ "error": invalid_credentials })));
    };
    if !bcrypt::verify(&body.password, &stored_hash).unwrap_or(false) {
        return Ok(HttpResponse::Unauthorized().json(json!({ "error": invalid_credentials })));
    }

    let profile = Profile::from_row(&row)?;
    if profile.user_type != body.user_type {
        return Err(ServiceError::State(match locale {
            Locale::Fr => match profile.user_type {
                Role::Transporter => "Ce compte est un compte transporteur".to_string(),
                Role::Client => "Ce compte est un compte client".to_string(),
            },
            Locale::En => format!("this account is registered as {}", profile.user_type.as_str()),
        }));
    }

    let token = issue_session(pool, &profile.id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "user": profile,
        "token": token,
    })))
}

pub async fn email_exists(
    query: web::Query<EmailQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let email = query.into_inner().email.trim().to_ascii_lowercase();
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(1) FROM profiles WHERE email = ?")
        .bind(&email)
        .fetch_one(&state.pool)
        .await?;

    Ok(HttpResponse::Ok().json(json!({ "exists": count > 0 })))
}

pub async fn check_token(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let profile = authenticate(&req, &state.pool).await?;
    Ok(HttpResponse::Ok().json(json!({ "user": profile })))
}

/// Public contact card, shown to the counterparty of a matched request.
pub async fn get_profile(
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = path.into_inner();
    let row = sqlx::query("SELECT email, phone, user_type FROM profiles WHERE id = ?")
        .bind(&user_id)
        .fetch_optional(&state.pool)
        .await?;
    let Some(row) = row else {
        return Err(ServiceError::NotFound("profile"));
    };

    let contact = Contact {
        email: row.get::<String, _>("email"),
        phone: row.try_get::<Option<String>, _>("phone").unwrap_or(None),
    };
    Ok(HttpResponse::Ok().json(json!({
        "email": contact.email,
        "phone": contact.phone,
        "user_type": row.get::<String, _>("user_type"),
    })))
}

pub async fn oauth_intent(
    data: web::Json<OauthIntentRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let intent = intents::create_intent(&state.pool, data.into_inner().user_type).await?;
    Ok(HttpResponse::Created().json(intent))
}

pub async fn oauth_complete(
    data: web::Json<OauthCompleteRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let body = data.into_inner();
    let profile = intents::complete_intent(&state.pool, &body.intent_token, &body.email).await?;
    let token = issue_session(&state.pool, &profile.id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "user": profile,
        "token": token,
    })))
}
