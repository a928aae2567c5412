use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::{decode_error, parse_timestamp};

/// Role picked at signup. Exactly one role per account, immutable after the
/// first successful resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Transporter,
    Client,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Transporter => "transporter",
            Role::Client => "client",
        }
    }

    pub fn parse(value: &str) -> Option<Role> {
        match value {
            "transporter" => Some(Role::Transporter),
            "client" => Some(Role::Client),
            _ => None,
        }
    }
}

/// Business attributes of an account. The bcrypt hash lives only in the
/// `profiles` table and is never carried on this struct.
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub id: String,
    pub email: String,
    pub phone: Option<String>,
    pub user_type: Role,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    pub fn from_row(row: &SqliteRow) -> Result<Profile, sqlx::Error> {
        let user_type_raw = row.get::<String, _>("user_type");
        let user_type = Role::parse(&user_type_raw).ok_or_else(|| {
            decode_error(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("unknown user_type '{user_type_raw}'"),
            ))
        })?;

        Ok(Profile {
            id: row.get::<String, _>("id"),
            email: row.get::<String, _>("email"),
            phone: row.try_get::<Option<String>, _>("phone").unwrap_or(None),
            user_type,
            created_at: parse_timestamp(&row.get::<String, _>("created_at"))?,
        })
    }
}

/// Contact card shown to the counterparty once a request is matched.
#[derive(Debug, Clone, Serialize)]
pub struct Contact {
    pub email: String,
    pub phone: Option<String>,
}
