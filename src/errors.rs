use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

/// Error taxonomy for the service layer. Validation and authorization
/// failures are terminal for the call; `ConcurrencyConflict` is retried
/// inside `services::matching` and never reaches a handler.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    State(String),

    #[error("authentication required")]
    Unauthenticated,

    #[error("not allowed for this account")]
    Authorization,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("offer capacity was taken by a concurrent request")]
    ConcurrencyConflict,

    #[error("storage error: {0}")]
    Persistence(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("geocoder unavailable: {0}")]
    Geocoder(#[from] reqwest::Error),
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::State(_) => StatusCode::CONFLICT,
            ServiceError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ServiceError::Authorization => StatusCode::FORBIDDEN,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::ConcurrencyConflict => StatusCode::CONFLICT,
            ServiceError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::Geocoder(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ServiceError::Persistence(err) = self {
            tracing::error!(%err, "storage operation failed");
        }
        HttpResponse::build(self.status_code()).json(json!({
            "error": self.to_string(),
        }))
    }
}
