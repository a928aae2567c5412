use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;

use crate::errors::ServiceError;
use crate::i18n::{self, Locale};
use crate::services::matching;
use crate::state::AppState;

use super::authenticate;

/// Mock payment step: flips the caller's matched request to paid. No payment
/// provider is involved.
pub async fn confirm_payment(
    req: HttpRequest,
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let profile = authenticate(&req, &state.pool).await?;
    let locale = i18n::detect_locale(&req);
    let request_id = path.into_inner();

    let confirmation = matching::confirm_payment(&state.pool, &request_id, &profile.id).await?;

    let message = match locale {
        Locale::Fr => "Paiement confirmé",
        Locale::En => "payment confirmed",
    };

    Ok(HttpResponse::Ok().json(json!({
        "message": message,
        "request_id": confirmation.request_id,
        "status": confirmation.status,
        "payment_reference": confirmation.payment_reference,
    })))
}
