use actix_web::{web, HttpRequest, HttpResponse};
use futures_util::future::try_join_all;
use serde_json::json;
use sqlx::Row;

use crate::errors::ServiceError;
use crate::i18n;
use crate::models::{Booking, Contact, NewOffer, Offer, OfferSummary, Role, TransportRequest};
use crate::services::matching;
use crate::state::AppState;

use super::authenticate;

pub async fn create_offer(
    req: HttpRequest,
    data: web::Json<NewOffer>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let profile = authenticate(&req, &state.pool).await?;
    if profile.user_type != Role::Transporter {
        return Err(ServiceError::Authorization);
    }

    let offer = matching::create_offer(&state.pool, &profile.id, data.into_inner()).await?;
    Ok(HttpResponse::Created().json(offer))
}

/// The transporter dashboard: own offers, newest departure first, each with
/// the number of requests matched against it.
pub async fn list_my_offers(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let profile = authenticate(&req, &state.pool).await?;
    if profile.user_type != Role::Transporter {
        return Err(ServiceError::Authorization);
    }
    let pool = &state.pool;

    let rows = sqlx::query(
        "SELECT id, transporter_id, direction, pickup_location, pickup_coords, \
                dropoff_location, dropoff_coords, departure_date, arrival_date, \
                total_capacity_kg, available_capacity_kg, created_at \
         FROM transport_offers WHERE transporter_id = ? \
         ORDER BY datetime(departure_date) DESC",
    )
    .bind(&profile.id)
    .fetch_all(pool)
    .await?;
    let offers = rows
        .iter()
        .map(Offer::from_row)
        .collect::<Result<Vec<_>, _>>()?;

    let counts = try_join_all(offers.iter().map(|offer| {
        let pool = pool.clone();
        let offer_id = offer.id.clone();
        async move {
            sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(1) FROM transport_requests WHERE matched_offer_id = ?",
            )
            .bind(&offer_id)
            .fetch_one(&pool)
            .await
        }
    }))
    .await?;

    let summaries: Vec<OfferSummary> = offers
        .into_iter()
        .zip(counts)
        .map(|(offer, matched_request_count)| OfferSummary {
            offer,
            matched_request_count,
        })
        .collect();

    Ok(HttpResponse::Ok().json(summaries))
}

/// Offer detail plus the transporter's contact card, as shown on the
/// match-found view.
pub async fn get_offer(
    req: HttpRequest,
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    authenticate(&req, &state.pool).await?;
    let offer_id = path.into_inner();

    let row = sqlx::query(
        "SELECT id, transporter_id, direction, pickup_location, pickup_coords, \
                dropoff_location, dropoff_coords, departure_date, arrival_date, \
                total_capacity_kg, available_capacity_kg, created_at \
         FROM transport_offers WHERE id = ?",
    )
    .bind(&offer_id)
    .fetch_optional(&state.pool)
    .await?;
    let Some(row) = row else {
        return Err(ServiceError::NotFound("offer"));
    };
    let offer = Offer::from_row(&row)?;

    let transporter = sqlx::query("SELECT email, phone FROM profiles WHERE id = ?")
        .bind(&offer.transporter_id)
        .fetch_optional(&state.pool)
        .await?;
    let Some(transporter) = transporter else {
        return Err(ServiceError::NotFound("transporter profile"));
    };

    Ok(HttpResponse::Ok().json(json!({
        "offer": offer,
        "transporter": Contact {
            email: transporter.get::<String, _>("email"),
            phone: transporter.try_get::<Option<String>, _>("phone").unwrap_or(None),
        },
    })))
}

/// Requests matched to one of the caller's offers, with each client's
/// contact card.
pub async fn offer_bookings(
    req: HttpRequest,
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let profile = authenticate(&req, &state.pool).await?;
    let locale = i18n::detect_locale(&req);
    let offer_id = path.into_inner();

    let owner = sqlx::query_scalar::<_, String>("SELECT transporter_id FROM transport_offers WHERE id = ?")
        .bind(&offer_id)
        .fetch_optional(&state.pool)
        .await?;
    let Some(owner) = owner else {
        return Err(ServiceError::NotFound("offer"));
    };
    if owner != profile.id {
        return Err(ServiceError::Authorization);
    }

    let rows = sqlx::query(
        "SELECT r.*, p.email AS client_email, p.phone AS client_phone \
         FROM transport_requests r JOIN profiles p ON p.id = r.client_id \
         WHERE r.matched_offer_id = ? \
         ORDER BY datetime(r.created_at) DESC",
    )
    .bind(&offer_id)
    .fetch_all(&state.pool)
    .await?;

    let bookings = rows
        .iter()
        .map(|row| {
            let request = TransportRequest::from_row(row)?;
            let status_label = i18n::status_label(locale, request.status).into_owned();
            Ok(Booking {
                status_label,
                client: Contact {
                    email: row.get::<String, _>("client_email"),
                    phone: row.try_get::<Option<String>, _>("client_phone").unwrap_or(None),
                },
                request,
            })
        })
        .collect::<Result<Vec<_>, ServiceError>>()?;

    Ok(HttpResponse::Ok().json(bookings))
}
