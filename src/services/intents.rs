use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::{Profile, Role};

/// A signup intent only has to survive one OAuth redirect round trip.
const INTENT_TTL_MINUTES: i64 = 15;

const INVALID_INTENT: &str = "invalid or expired intent token";

#[derive(Debug, Serialize, Deserialize)]
struct IntentClaims {
    sub: String,
    exp: usize,
}

fn signing_secret() -> String {
    std::env::var("INTENT_SIGNING_SECRET").unwrap_or_else(|_| "sila-dev-intent-secret".to_string())
}

#[derive(Debug, Serialize)]
pub struct SignupIntent {
    pub intent_token: String,
    pub expires_at: DateTime<Utc>,
}

/// Records the role chosen before the OAuth redirect and hands back a signed,
/// time-boxed token for the client to carry through it. The server-side row,
/// not the client, is the source of truth for the pending role.
pub async fn create_intent(pool: &SqlitePool, user_type: Role) -> Result<SignupIntent, ServiceError> {
    let id = Uuid::new_v4().to_string();
    let created_at = Utc::now();
    let expires_at = created_at + Duration::minutes(INTENT_TTL_MINUTES);

    sqlx::query(
        "INSERT INTO signup_intents (id, user_type, created_at, expires_at) VALUES (?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(user_type.as_str())
    .bind(created_at.to_rfc3339())
    .bind(expires_at.to_rfc3339())
    .execute(pool)
    .await?;

    let claims = IntentClaims {
        sub: id,
        exp: expires_at.timestamp() as usize,
    };
    let intent_token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(signing_secret().as_bytes()),
    )
    .map_err(|err| ServiceError::Internal(format!("could not sign intent token: {err}")))?;

    Ok(SignupIntent {
        intent_token,
        expires_at,
    })
}

/// Consumes a signup intent after the OAuth redirect completes and resolves
/// the account's role exactly once. A second completion of the same intent
/// fails, as does completing against an account that already holds the other
/// role.
pub async fn complete_intent(
    pool: &SqlitePool,
    intent_token: &str,
    email: &str,
) -> Result<Profile, ServiceError> {
    let email = email.trim().to_ascii_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(ServiceError::Validation("a valid email is required".to_string()));
    }

    let claims = decode::<IntentClaims>(
        intent_token,
        &DecodingKey::from_secret(signing_secret().as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ServiceError::Validation(INVALID_INTENT.to_string()))?
    .claims;

    let row = sqlx::query("SELECT user_type, expires_at, consumed_at FROM signup_intents WHERE id = ?")
        .bind(&claims.sub)
        .fetch_optional(pool)
        .await?;
    let Some(row) = row else {
        return Err(ServiceError::Validation(INVALID_INTENT.to_string()));
    };

    if row
        .try_get::<Option<String>, _>("consumed_at")
        .unwrap_or(None)
        .is_some()
    {
        return Err(ServiceError::State("signup intent already used".to_string()));
    }
    let expires_at = crate::models::parse_timestamp(&row.get::<String, _>("expires_at"))?;
    if expires_at < Utc::now() {
        return Err(ServiceError::Validation(INVALID_INTENT.to_string()));
    }
    let user_type_raw = row.get::<String, _>("user_type");
    let role = Role::parse(&user_type_raw)
        .ok_or_else(|| ServiceError::Internal(format!("unknown intent role '{user_type_raw}'")))?;

    let consumed =
        sqlx::query("UPDATE signup_intents SET consumed_at = ? WHERE id = ? AND consumed_at IS NULL")
            .bind(Utc::now().to_rfc3339())
            .bind(&claims.sub)
            .execute(pool)
            .await?;
    if consumed.rows_affected() != 1 {
        return Err(ServiceError::State("signup intent already used".to_string()));
    }

    // First completion creates the profile with the intent's role; later
    // logins through OAuth land here too and must present the same role.
    let existing = sqlx::query("SELECT id, email, phone, user_type, created_at FROM profiles WHERE email = ?")
        .bind(&email)
        .fetch_optional(pool)
        .await?;
    if let Some(row) = existing {
        let profile = Profile::from_row(&row)?;
        if profile.user_type != role {
            return Err(ServiceError::State(
                "account already registered with a different role".to_string(),
            ));
        }
        tracing::info!(user_id = %profile.id, "oauth signup intent resolved to existing profile");
        return Ok(profile);
    }

    let profile = Profile {
        id: Uuid::new_v4().to_string(),
        email,
        phone: None,
        user_type: role,
        created_at: Utc::now(),
    };
    sqlx::query("INSERT INTO profiles (id, email, user_type, created_at) VALUES (?, ?, ?, ?)")
        .bind(&profile.id)
        .bind(&profile.email)
        .bind(profile.user_type.as_str())
        .bind(profile.created_at.to_rfc3339())
        .execute(pool)
        .await?;

    tracing::info!(user_id = %profile.id, role = role.as_str(), "profile created from signup intent");
    Ok(profile)
}
