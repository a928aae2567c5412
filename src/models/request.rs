use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::{decode_error, parse_timestamp, Contact, Coordinates, Direction, Offer};

/// Lifecycle of a shipment request. `pending → matched` happens only at
/// creation time, `matched → paid` via payment confirmation. There is no
/// transition back and no cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Matched,
    Paid,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Matched => "matched",
            RequestStatus::Paid => "paid",
        }
    }

    pub fn parse(value: &str) -> Option<RequestStatus> {
        match value {
            "pending" => Some(RequestStatus::Pending),
            "matched" => Some(RequestStatus::Matched),
            "paid" => Some(RequestStatus::Paid),
            _ => None,
        }
    }
}

/// A client's ask to ship a package, optionally matched to an offer.
#[derive(Debug, Clone, Serialize)]
pub struct TransportRequest {
    pub id: String,
    pub client_id: String,
    pub weight_kg: f64,
    pub desired_date: DateTime<Utc>,
    pub pickup_location: String,
    pub pickup_coords: Coordinates,
    pub dropoff_location: String,
    pub dropoff_coords: Coordinates,
    pub direction: Direction,
    pub status: RequestStatus,
    pub matched_offer_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TransportRequest {
    pub fn from_row(row: &SqliteRow) -> Result<TransportRequest, sqlx::Error> {
        let direction_raw = row.get::<String, _>("direction");
        let direction = Direction::parse(&direction_raw).ok_or_else(|| {
            decode_error(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("unknown direction '{direction_raw}'"),
            ))
        })?;
        let status_raw = row.get::<String, _>("status");
        let status = RequestStatus::parse(&status_raw).ok_or_else(|| {
            decode_error(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("unknown status '{status_raw}'"),
            ))
        })?;

        Ok(TransportRequest {
            id: row.get::<String, _>("id"),
            client_id: row.get::<String, _>("client_id"),
            weight_kg: row.get::<f64, _>("weight_kg"),
            desired_date: parse_timestamp(&row.get::<String, _>("desired_date"))?,
            pickup_location: row.get::<String, _>("pickup_location"),
            pickup_coords: Coordinates::from_json(&row.get::<String, _>("pickup_coords"))
                .map_err(decode_error)?,
            dropoff_location: row.get::<String, _>("dropoff_location"),
            dropoff_coords: Coordinates::from_json(&row.get::<String, _>("dropoff_coords"))
                .map_err(decode_error)?,
            direction,
            status,
            matched_offer_id: row
                .try_get::<Option<String>, _>("matched_offer_id")
                .unwrap_or(None),
            created_at: parse_timestamp(&row.get::<String, _>("created_at"))?,
        })
    }
}

/// Payload for the "find a transporter" action. `direction` may be omitted,
/// in which case it is inferred from the coordinates; coordinates are
/// optional only so the service can report their absence as a validation
/// failure of its own.
#[derive(Debug, Clone, Deserialize)]
pub struct NewShipmentRequest {
    pub direction: Option<Direction>,
    pub weight_kg: f64,
    pub desired_date: DateTime<Utc>,
    pub pickup_location: String,
    pub pickup_coords: Option<Coordinates>,
    pub dropoff_location: String,
    pub dropoff_coords: Option<Coordinates>,
}

/// Result of submitting a request: either matched against an offer with
/// capacity reserved, or recorded as pending.
#[derive(Debug, Serialize)]
pub struct MatchOutcome {
    pub matched: bool,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offer_id: Option<String>,
}

/// Outcome of the mock payment step. The reference is generated, not stored;
/// no money moves anywhere.
#[derive(Debug, Serialize)]
pub struct PaymentConfirmation {
    pub request_id: String,
    pub status: RequestStatus,
    pub payment_reference: String,
}

/// Client-dashboard line: the request plus, when matched, the offer and the
/// transporter's contact card.
#[derive(Debug, Serialize)]
pub struct RequestSummary {
    #[serde(flatten)]
    pub request: TransportRequest,
    pub status_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_offer: Option<Offer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transporter: Option<Contact>,
}

/// Transporter's view of a request matched to one of their offers.
#[derive(Debug, Serialize)]
pub struct Booking {
    #[serde(flatten)]
    pub request: TransportRequest,
    pub status_label: String,
    pub client: Contact,
}
