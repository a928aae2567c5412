use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::{
    Coordinates, Direction, MatchOutcome, NewOffer, NewShipmentRequest, Offer,
    PaymentConfirmation, RequestStatus, TransportRequest,
};

/// How many times a submission re-runs the offer query after losing the
/// capacity re-check to a concurrent request. Exhaustion degrades to the
/// pending branch, indistinguishable from genuine scarcity.
const MATCH_ATTEMPTS: u32 = 3;

// Latitude bands the web client uses to tell the two countries apart.
const TUNISIA_LAT: std::ops::RangeInclusive<f64> = 30.0..=38.0;
const FRANCE_LAT: std::ops::RangeInclusive<f64> = 41.0..=51.0;

const INSERT_REQUEST_SQL: &str = "INSERT INTO transport_requests \
    (id, client_id, weight_kg, desired_date, pickup_location, pickup_coords, \
     dropoff_location, dropoff_coords, direction, status, matched_offer_id, created_at) \
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";

/// Derives the route from the endpoints, the way the web form does when the
/// user never picks a direction explicitly.
pub fn infer_direction(pickup: Coordinates, dropoff: Coordinates) -> Option<Direction> {
    if TUNISIA_LAT.contains(&pickup.lat) && FRANCE_LAT.contains(&dropoff.lat) {
        Some(Direction::TnFr)
    } else if FRANCE_LAT.contains(&pickup.lat) && TUNISIA_LAT.contains(&dropoff.lat) {
        Some(Direction::FrTn)
    } else {
        None
    }
}

/// Resolves a new shipment request against the available offers and reserves
/// capacity. The capacity check and the request insert commit as one SQLite
/// transaction, so an offer can never be driven below zero and a request can
/// never be marked matched without its reservation.
pub async fn submit_request(
    pool: &SqlitePool,
    client_id: &str,
    input: NewShipmentRequest,
) -> Result<MatchOutcome, ServiceError> {
    if !input.weight_kg.is_finite() || input.weight_kg <= 0.0 {
        return Err(ServiceError::Validation(
            "weight must be a positive number of kilograms".to_string(),
        ));
    }
    if input.pickup_location.trim().is_empty() || input.dropoff_location.trim().is_empty() {
        return Err(ServiceError::Validation(
            "pickup and dropoff locations are required".to_string(),
        ));
    }
    let (pickup_coords, dropoff_coords) = match (input.pickup_coords, input.dropoff_coords) {
        (Some(p), Some(d)) => (p, d),
        _ => {
            return Err(ServiceError::Validation(
                "pickup and dropoff must be selected on the map".to_string(),
            ))
        }
    };
    let direction = match input.direction {
        Some(direction) => direction,
        None => infer_direction(pickup_coords, dropoff_coords).ok_or_else(|| {
            ServiceError::Validation("route must connect Tunisia and France".to_string())
        })?,
    };

    let now = Utc::now();
    let record = TransportRequest {
        id: Uuid::new_v4().to_string(),
        client_id: client_id.to_string(),
        weight_kg: input.weight_kg,
        desired_date: input.desired_date,
        pickup_location: input.pickup_location,
        pickup_coords,
        dropoff_location: input.dropoff_location,
        dropoff_coords,
        direction,
        status: RequestStatus::Pending,
        matched_offer_id: None,
        created_at: now,
    };

    for attempt in 1..=MATCH_ATTEMPTS {
        let Some(offer) = find_earliest_offer(pool, direction, record.weight_kg, &now).await?
        else {
            break;
        };

        match reserve(pool, &offer.id, &record).await {
            Ok(()) => {
                tracing::info!(
                    request_id = %record.id,
                    offer_id = %offer.id,
                    weight_kg = record.weight_kg,
                    "request matched"
                );
                return Ok(MatchOutcome {
                    matched: true,
                    request_id: record.id,
                    offer_id: Some(offer.id),
                });
            }
            // Capacity was consumed between the query and the decrement;
            // the offer no longer passes the filter, so re-query.
            Err(ServiceError::ConcurrencyConflict) => {
                tracing::warn!(offer_id = %offer.id, attempt, "offer capacity taken concurrently, rematching");
                continue;
            }
            Err(err) => return Err(err),
        }
    }

    sqlx::query(INSERT_REQUEST_SQL)
        .bind(&record.id)
        .bind(&record.client_id)
        .bind(record.weight_kg)
        .bind(record.desired_date.to_rfc3339())
        .bind(&record.pickup_location)
        .bind(record.pickup_coords.to_json())
        .bind(&record.dropoff_location)
        .bind(record.dropoff_coords.to_json())
        .bind(record.direction.as_str())
        .bind(RequestStatus::Pending.as_str())
        .bind(Option::<String>::None)
        .bind(record.created_at.to_rfc3339())
        .execute(pool)
        .await?;

    tracing::info!(request_id = %record.id, "no compatible offer, request recorded as pending");
    Ok(MatchOutcome {
        matched: false,
        request_id: record.id,
        offer_id: None,
    })
}

/// Earliest-departing offer on the route with enough remaining capacity.
/// Equal departures fall back to insertion order.
async fn find_earliest_offer(
    pool: &SqlitePool,
    direction: Direction,
    weight_kg: f64,
    now: &DateTime<Utc>,
) -> Result<Option<Offer>, ServiceError> {
    let row = sqlx::query(
        "SELECT id, transporter_id, direction, pickup_location, pickup_coords, \
                dropoff_location, dropoff_coords, departure_date, arrival_date, \
                total_capacity_kg, available_capacity_kg, created_at \
         FROM transport_offers \
         WHERE direction = ? AND available_capacity_kg >= ? \
           AND datetime(departure_date) >= datetime(?) \
         ORDER BY datetime(departure_date) ASC, rowid ASC \
         LIMIT 1",
    )
    .bind(direction.as_str())
    .bind(weight_kg)
    .bind(now.to_rfc3339())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(Offer::from_row).transpose().map_err(Into::into)
}

/// Atomically re-checks capacity, decrements it and inserts the matched
/// request. Loses with `ConcurrencyConflict` when the conditional decrement
/// touches no row.
async fn reserve(
    pool: &SqlitePool,
    offer_id: &str,
    record: &TransportRequest,
) -> Result<(), ServiceError> {
    let mut tx = pool.begin().await?;

    let updated = sqlx::query(
        "UPDATE transport_offers \
         SET available_capacity_kg = available_capacity_kg - ? \
         WHERE id = ? AND available_capacity_kg >= ?",
    )
    .bind(record.weight_kg)
    .bind(offer_id)
    .bind(record.weight_kg)
    .execute(&mut tx)
    .await?;

    if updated.rows_affected() != 1 {
        tx.rollback().await?;
        return Err(ServiceError::ConcurrencyConflict);
    }

    sqlx::query(INSERT_REQUEST_SQL)
        .bind(&record.id)
        .bind(&record.client_id)
        .bind(record.weight_kg)
        .bind(record.desired_date.to_rfc3339())
        .bind(&record.pickup_location)
        .bind(record.pickup_coords.to_json())
        .bind(&record.dropoff_location)
        .bind(record.dropoff_coords.to_json())
        .bind(record.direction.as_str())
        .bind(RequestStatus::Matched.as_str())
        .bind(Some(offer_id))
        .bind(record.created_at.to_rfc3339())
        .execute(&mut tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

/// Persists a new offer with its full capacity still available.
pub async fn create_offer(
    pool: &SqlitePool,
    transporter_id: &str,
    input: NewOffer,
) -> Result<Offer, ServiceError> {
    if !input.total_capacity_kg.is_finite() || input.total_capacity_kg <= 0.0 {
        return Err(ServiceError::Validation(
            "capacity must be a positive number of kilograms".to_string(),
        ));
    }
    if input.pickup_location.trim().is_empty() || input.dropoff_location.trim().is_empty() {
        return Err(ServiceError::Validation(
            "pickup and dropoff locations are required".to_string(),
        ));
    }
    let (pickup_coords, dropoff_coords) = match (input.pickup_coords, input.dropoff_coords) {
        (Some(p), Some(d)) => (p, d),
        _ => {
            return Err(ServiceError::Validation(
                "pickup and dropoff must be selected on the map".to_string(),
            ))
        }
    };
    if input.arrival_date <= input.departure_date {
        return Err(ServiceError::Validation(
            "arrival must be after departure".to_string(),
        ));
    }

    let offer = Offer {
        id: Uuid::new_v4().to_string(),
        transporter_id: transporter_id.to_string(),
        direction: input.direction,
        pickup_location: input.pickup_location,
        pickup_coords,
        dropoff_location: input.dropoff_location,
        dropoff_coords,
        departure_date: input.departure_date,
        arrival_date: input.arrival_date,
        total_capacity_kg: input.total_capacity_kg,
        available_capacity_kg: input.total_capacity_kg,
        created_at: Utc::now(),
    };

    sqlx::query(
        "INSERT INTO transport_offers \
         (id, transporter_id, direction, pickup_location, pickup_coords, \
          dropoff_location, dropoff_coords, departure_date, arrival_date, \
          total_capacity_kg, available_capacity_kg, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&offer.id)
    .bind(&offer.transporter_id)
    .bind(offer.direction.as_str())
    .bind(&offer.pickup_location)
    .bind(offer.pickup_coords.to_json())
    .bind(&offer.dropoff_location)
    .bind(offer.dropoff_coords.to_json())
    .bind(offer.departure_date.to_rfc3339())
    .bind(offer.arrival_date.to_rfc3339())
    .bind(offer.total_capacity_kg)
    .bind(offer.available_capacity_kg)
    .bind(offer.created_at.to_rfc3339())
    .execute(pool)
    .await?;

    tracing::info!(offer_id = %offer.id, capacity_kg = offer.total_capacity_kg, "offer created");
    Ok(offer)
}

/// Flips a matched request to paid on behalf of its owning client. The
/// update is conditional on the current status so a concurrent double
/// confirmation loses cleanly.
pub async fn confirm_payment(
    pool: &SqlitePool,
    request_id: &str,
    payer_id: &str,
) -> Result<PaymentConfirmation, ServiceError> {
    use sqlx::Row;

    let row = sqlx::query("SELECT client_id, status FROM transport_requests WHERE id = ?")
        .bind(request_id)
        .fetch_optional(pool)
        .await?;
    let Some(row) = row else {
        return Err(ServiceError::NotFound("request"));
    };

    let client_id = row.get::<String, _>("client_id");
    if client_id != payer_id {
        return Err(ServiceError::Authorization);
    }

    let status_raw = row.get::<String, _>("status");
    let status = RequestStatus::parse(&status_raw).ok_or_else(|| {
        ServiceError::Persistence(sqlx::Error::Decode(
            format!("unknown status '{status_raw}'").into(),
        ))
    })?;
    match status {
        RequestStatus::Pending => {
            return Err(ServiceError::State(
                "request has no matched offer to pay for".to_string(),
            ))
        }
        RequestStatus::Paid => {
            return Err(ServiceError::State("request is already paid".to_string()))
        }
        RequestStatus::Matched => {}
    }

    let updated =
        sqlx::query("UPDATE transport_requests SET status = 'paid' WHERE id = ? AND status = 'matched'")
            .bind(request_id)
            .execute(pool)
            .await?;
    if updated.rows_affected() != 1 {
        return Err(ServiceError::State("request is already paid".to_string()));
    }

    tracing::info!(request_id, "payment confirmed");
    Ok(PaymentConfirmation {
        request_id: request_id.to_string(),
        status: RequestStatus::Paid,
        payment_reference: payment_reference(),
    })
}

fn payment_reference() -> String {
    use rand::distr::Alphanumeric;
    use rand::Rng;

    let suffix: String = rand::rng()
        .sample_iter(Alphanumeric)
        .take(10)
        .map(char::from)
        .collect();
    format!("PAY-{}", suffix.to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use chrono::Duration;

    async fn test_pool() -> SqlitePool {
        let path = std::env::temp_dir().join(format!("sila-matching-{}.db", Uuid::new_v4()));
        let url = format!("sqlite://{}", path.display());
        crate::db::init_pool(&url).await.expect("test pool")
    }

    async fn seed_profile(pool: &SqlitePool, role: Role) -> String {
        let id = Uuid::new_v4().to_string();
        sqlx::query("INSERT INTO profiles (id, email, user_type, created_at) VALUES (?, ?, ?, ?)")
            .bind(&id)
            .bind(format!("{id}@example.com"))
            .bind(role.as_str())
            .bind(Utc::now().to_rfc3339())
            .execute(pool)
            .await
            .expect("seed profile");
        id
    }

    fn tunis() -> Coordinates {
        Coordinates { lat: 36.8065, lng: 10.1815 }
    }

    fn paris() -> Coordinates {
        Coordinates { lat: 48.8566, lng: 2.3522 }
    }

    fn rome() -> Coordinates {
        Coordinates { lat: 41.9028, lng: 12.4964 }
    }

    fn offer_input(capacity_kg: f64, departs_in_days: i64) -> NewOffer {
        NewOffer {
            direction: Direction::TnFr,
            pickup_location: "Tunis, Tunisia".to_string(),
            pickup_coords: Some(tunis()),
            dropoff_location: "Paris, France".to_string(),
            dropoff_coords: Some(paris()),
            departure_date: Utc::now() + Duration::days(departs_in_days),
            arrival_date: Utc::now() + Duration::days(departs_in_days + 1),
            total_capacity_kg: capacity_kg,
        }
    }

    fn request_input(weight_kg: f64) -> NewShipmentRequest {
        NewShipmentRequest {
            direction: Some(Direction::TnFr),
            weight_kg,
            desired_date: Utc::now() + Duration::days(6),
            pickup_location: "Tunis, Tunisia".to_string(),
            pickup_coords: Some(tunis()),
            dropoff_location: "Paris, France".to_string(),
            dropoff_coords: Some(paris()),
        }
    }

    async fn available_capacity(pool: &SqlitePool, offer_id: &str) -> f64 {
        sqlx::query_scalar::<_, f64>(
            "SELECT available_capacity_kg FROM transport_offers WHERE id = ?",
        )
        .bind(offer_id)
        .fetch_one(pool)
        .await
        .expect("offer row")
    }

    async fn request_status(pool: &SqlitePool, request_id: &str) -> String {
        sqlx::query_scalar::<_, String>("SELECT status FROM transport_requests WHERE id = ?")
            .bind(request_id)
            .fetch_one(pool)
            .await
            .expect("request row")
    }

    #[tokio::test]
    async fn matches_earliest_compatible_offer() {
        let pool = test_pool().await;
        let transporter = seed_profile(&pool, Role::Transporter).await;
        let client = seed_profile(&pool, Role::Client).await;

        let later = create_offer(&pool, &transporter, offer_input(50.0, 9)).await.unwrap();
        let earliest = create_offer(&pool, &transporter, offer_input(50.0, 5)).await.unwrap();

        let outcome = submit_request(&pool, &client, request_input(30.0)).await.unwrap();

        assert!(outcome.matched);
        assert_eq!(outcome.offer_id.as_deref(), Some(earliest.id.as_str()));
        assert_eq!(available_capacity(&pool, &earliest.id).await, 20.0);
        assert_eq!(available_capacity(&pool, &later.id).await, 50.0);
        assert_eq!(request_status(&pool, &outcome.request_id).await, "matched");
    }

    #[tokio::test]
    async fn insufficient_capacity_leaves_request_pending() {
        let pool = test_pool().await;
        let transporter = seed_profile(&pool, Role::Transporter).await;
        let client = seed_profile(&pool, Role::Client).await;

        let offer = create_offer(&pool, &transporter, offer_input(20.0, 5)).await.unwrap();

        let outcome = submit_request(&pool, &client, request_input(25.0)).await.unwrap();

        assert!(!outcome.matched);
        assert!(outcome.offer_id.is_none());
        assert_eq!(available_capacity(&pool, &offer.id).await, 20.0);
        assert_eq!(request_status(&pool, &outcome.request_id).await, "pending");
    }

    #[tokio::test]
    async fn exact_weight_drains_offer_to_zero() {
        let pool = test_pool().await;
        let transporter = seed_profile(&pool, Role::Transporter).await;
        let client = seed_profile(&pool, Role::Client).await;

        let offer = create_offer(&pool, &transporter, offer_input(30.0, 5)).await.unwrap();

        let first = submit_request(&pool, &client, request_input(30.0)).await.unwrap();
        assert!(first.matched);
        assert_eq!(available_capacity(&pool, &offer.id).await, 0.0);

        let second = submit_request(&pool, &client, request_input(1.0)).await.unwrap();
        assert!(!second.matched);
        assert_eq!(available_capacity(&pool, &offer.id).await, 0.0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_requests_never_oversubscribe() {
        let pool = test_pool().await;
        let transporter = seed_profile(&pool, Role::Transporter).await;
        let client_a = seed_profile(&pool, Role::Client).await;
        let client_b = seed_profile(&pool, Role::Client).await;

        let offer = create_offer(&pool, &transporter, offer_input(30.0, 5)).await.unwrap();

        let pool_a = pool.clone();
        let pool_b = pool.clone();
        let a = tokio::spawn(async move {
            submit_request(&pool_a, &client_a, request_input(30.0)).await
        });
        let b = tokio::spawn(async move {
            submit_request(&pool_b, &client_b, request_input(30.0)).await
        });

        let a = a.await.unwrap().unwrap();
        let b = b.await.unwrap().unwrap();

        assert_eq!(
            [a.matched, b.matched].iter().filter(|m| **m).count(),
            1,
            "exactly one of the two concurrent requests may win the capacity"
        );
        assert_eq!(available_capacity(&pool, &offer.id).await, 0.0);
    }

    #[tokio::test]
    async fn matched_weight_never_exceeds_total_capacity() {
        let pool = test_pool().await;
        let transporter = seed_profile(&pool, Role::Transporter).await;
        let client = seed_profile(&pool, Role::Client).await;

        let offer = create_offer(&pool, &transporter, offer_input(50.0, 5)).await.unwrap();

        let mut matched = 0;
        for _ in 0..3 {
            if submit_request(&pool, &client, request_input(20.0)).await.unwrap().matched {
                matched += 1;
            }
        }

        assert_eq!(matched, 2);
        let matched_weight: f64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(weight_kg), 0.0) FROM transport_requests WHERE matched_offer_id = ?",
        )
        .bind(&offer.id)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert!(matched_weight <= offer.total_capacity_kg);
        assert_eq!(available_capacity(&pool, &offer.id).await, 10.0);
    }

    #[tokio::test]
    async fn past_departures_never_match() {
        let pool = test_pool().await;
        let transporter = seed_profile(&pool, Role::Transporter).await;
        let client = seed_profile(&pool, Role::Client).await;

        create_offer(&pool, &transporter, offer_input(50.0, -1)).await.unwrap();

        let outcome = submit_request(&pool, &client, request_input(10.0)).await.unwrap();
        assert!(!outcome.matched);
    }

    #[tokio::test]
    async fn rejects_nonpositive_weight_without_side_effects() {
        let pool = test_pool().await;
        let client = seed_profile(&pool, Role::Client).await;

        for weight in [0.0, -5.0] {
            let err = submit_request(&pool, &client, request_input(weight)).await.unwrap_err();
            assert!(matches!(err, ServiceError::Validation(_)));
        }

        let count: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM transport_requests")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn rejects_missing_coordinates() {
        let pool = test_pool().await;
        let client = seed_profile(&pool, Role::Client).await;

        let mut input = request_input(10.0);
        input.pickup_coords = None;
        let err = submit_request(&pool, &client, input).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn infers_direction_when_not_supplied() {
        let pool = test_pool().await;
        let transporter = seed_profile(&pool, Role::Transporter).await;
        let client = seed_profile(&pool, Role::Client).await;

        create_offer(&pool, &transporter, offer_input(50.0, 5)).await.unwrap();

        let mut input = request_input(10.0);
        input.direction = None;
        let outcome = submit_request(&pool, &client, input).await.unwrap();
        assert!(outcome.matched, "tunis -> paris should infer tn_fr and match");

        // The reverse route has no offer; the request is stored as fr_tn.
        let mut reverse = request_input(10.0);
        reverse.direction = None;
        reverse.pickup_coords = Some(paris());
        reverse.dropoff_coords = Some(tunis());
        let outcome = submit_request(&pool, &client, reverse).await.unwrap();
        assert!(!outcome.matched);
        let direction: String =
            sqlx::query_scalar("SELECT direction FROM transport_requests WHERE id = ?")
                .bind(&outcome.request_id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(direction, "fr_tn");
    }

    #[tokio::test]
    async fn rejects_route_outside_served_countries() {
        let pool = test_pool().await;
        let client = seed_profile(&pool, Role::Client).await;

        let mut input = request_input(10.0);
        input.direction = None;
        input.pickup_coords = Some(rome());
        let err = submit_request(&pool, &client, input).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn offer_with_inverted_dates_is_rejected_and_not_persisted() {
        let pool = test_pool().await;
        let transporter = seed_profile(&pool, Role::Transporter).await;

        let mut input = offer_input(50.0, 5);
        input.arrival_date = input.departure_date - Duration::hours(1);
        let err = create_offer(&pool, &transporter, input).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM transport_offers")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn offer_with_nonpositive_capacity_is_rejected() {
        let pool = test_pool().await;
        let transporter = seed_profile(&pool, Role::Transporter).await;

        let err = create_offer(&pool, &transporter, offer_input(0.0, 5)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn payment_flips_matched_to_paid_exactly_once() {
        let pool = test_pool().await;
        let transporter = seed_profile(&pool, Role::Transporter).await;
        let client = seed_profile(&pool, Role::Client).await;

        create_offer(&pool, &transporter, offer_input(50.0, 5)).await.unwrap();
        let outcome = submit_request(&pool, &client, request_input(30.0)).await.unwrap();

        let confirmation = confirm_payment(&pool, &outcome.request_id, &client).await.unwrap();
        assert_eq!(confirmation.status, RequestStatus::Paid);
        assert!(confirmation.payment_reference.starts_with("PAY-"));
        assert_eq!(request_status(&pool, &outcome.request_id).await, "paid");

        let err = confirm_payment(&pool, &outcome.request_id, &client).await.unwrap_err();
        assert!(matches!(err, ServiceError::State(_)));
        assert_eq!(request_status(&pool, &outcome.request_id).await, "paid");
    }

    #[tokio::test]
    async fn payment_by_non_owner_is_refused() {
        let pool = test_pool().await;
        let transporter = seed_profile(&pool, Role::Transporter).await;
        let client = seed_profile(&pool, Role::Client).await;
        let stranger = seed_profile(&pool, Role::Client).await;

        create_offer(&pool, &transporter, offer_input(50.0, 5)).await.unwrap();
        let outcome = submit_request(&pool, &client, request_input(30.0)).await.unwrap();

        let err = confirm_payment(&pool, &outcome.request_id, &stranger).await.unwrap_err();
        assert!(matches!(err, ServiceError::Authorization));
        assert_eq!(request_status(&pool, &outcome.request_id).await, "matched");
    }

    #[tokio::test]
    async fn payment_requires_a_matched_request() {
        let pool = test_pool().await;
        let client = seed_profile(&pool, Role::Client).await;

        let outcome = submit_request(&pool, &client, request_input(30.0)).await.unwrap();
        assert!(!outcome.matched);

        let err = confirm_payment(&pool, &outcome.request_id, &client).await.unwrap_err();
        assert!(matches!(err, ServiceError::State(_)));

        let err = confirm_payment(&pool, "missing-request", &client).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[test]
    fn direction_inference_matches_the_latitude_bands() {
        assert_eq!(infer_direction(tunis(), paris()), Some(Direction::TnFr));
        assert_eq!(infer_direction(paris(), tunis()), Some(Direction::FrTn));
        assert_eq!(infer_direction(rome(), paris()), None);
        assert_eq!(infer_direction(tunis(), tunis()), None);
    }
}
