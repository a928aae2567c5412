use actix_web::{web, HttpRequest, HttpResponse};
use futures_util::future::try_join_all;
use serde_json::json;
use sqlx::Row;

use crate::errors::ServiceError;
use crate::i18n::{self, Locale};
use crate::models::{
    Contact, NewShipmentRequest, Offer, RequestSummary, Role, TransportRequest,
};
use crate::services::matching;
use crate::state::AppState;

use super::authenticate;

const REQUEST_COLUMNS: &str = "id, client_id, weight_kg, desired_date, pickup_location, \
    pickup_coords, dropoff_location, dropoff_coords, direction, status, \
    matched_offer_id, created_at";

pub async fn submit_request(
    req: HttpRequest,
    data: web::Json<NewShipmentRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let profile = authenticate(&req, &state.pool).await?;
    if profile.user_type != Role::Client {
        return Err(ServiceError::Authorization);
    }
    let locale = i18n::detect_locale(&req);

    let outcome = matching::submit_request(&state.pool, &profile.id, data.into_inner()).await?;

    let message = match (locale, outcome.matched) {
        (Locale::Fr, true) => "Transporteur trouvé !",
        (Locale::Fr, false) => {
            "Aucun transporteur disponible pour cette destination et ce poids. \
             Votre demande sera enregistrée."
        }
        (Locale::En, true) => "transporter found",
        (Locale::En, false) => "no transporter currently available; your request has been recorded",
    };

    Ok(HttpResponse::Created().json(json!({
        "message": message,
        "matched": outcome.matched,
        "request_id": outcome.request_id,
        "offer_id": outcome.offer_id,
    })))
}

/// The client dashboard: own requests, newest first; matched ones carry the
/// offer and the transporter's contact card. A failing secondary lookup
/// fails the call instead of silently thinning the list.
pub async fn list_my_requests(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let profile = authenticate(&req, &state.pool).await?;
    if profile.user_type != Role::Client {
        return Err(ServiceError::Authorization);
    }
    let locale = i18n::detect_locale(&req);
    let pool = &state.pool;

    let rows = sqlx::query(&format!(
        "SELECT {REQUEST_COLUMNS} FROM transport_requests WHERE client_id = ? \
         ORDER BY datetime(created_at) DESC"
    ))
    .bind(&profile.id)
    .fetch_all(pool)
    .await?;
    let requests = rows
        .iter()
        .map(TransportRequest::from_row)
        .collect::<Result<Vec<_>, _>>()?;

    let summaries = try_join_all(requests.into_iter().map(|request| {
        let pool = pool.clone();
        async move {
            let (matched_offer, transporter) = match &request.matched_offer_id {
                Some(offer_id) => {
                    let row = sqlx::query(
                        "SELECT id, transporter_id, direction, pickup_location, pickup_coords, \
                                dropoff_location, dropoff_coords, departure_date, arrival_date, \
                                total_capacity_kg, available_capacity_kg, created_at \
                         FROM transport_offers WHERE id = ?",
                    )
                    .bind(offer_id)
                    .fetch_optional(&pool)
                    .await?;
                    match row {
                        Some(row) => {
                            let offer = Offer::from_row(&row)?;
                            let contact =
                                sqlx::query("SELECT email, phone FROM profiles WHERE id = ?")
                                    .bind(&offer.transporter_id)
                                    .fetch_optional(&pool)
                                    .await?
                                    .map(|row| Contact {
                                        email: row.get::<String, _>("email"),
                                        phone: row
                                            .try_get::<Option<String>, _>("phone")
                                            .unwrap_or(None),
                                    });
                            (Some(offer), contact)
                        }
                        None => (None, None),
                    }
                }
                None => (None, None),
            };

            Ok::<_, ServiceError>(RequestSummary {
                status_label: i18n::status_label(locale, request.status).into_owned(),
                request,
                matched_offer,
                transporter,
            })
        }
    }))
    .await?;

    Ok(HttpResponse::Ok().json(summaries))
}

pub async fn get_request(
    req: HttpRequest,
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let profile = authenticate(&req, &state.pool).await?;
    let request_id = path.into_inner();

    let row = sqlx::query(&format!(
        "SELECT {REQUEST_COLUMNS} FROM transport_requests WHERE id = ?"
    ))
    .bind(&request_id)
    .fetch_optional(&state.pool)
    .await?;
    let Some(row) = row else {
        return Err(ServiceError::NotFound("request"));
    };

    let request = TransportRequest::from_row(&row)?;
    if request.client_id != profile.id {
        return Err(ServiceError::Authorization);
    }

    Ok(HttpResponse::Ok().json(request))
}
