use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::{decode_error, parse_timestamp, Coordinates, Direction};

/// A transporter's announced capacity on a route and time window.
#[derive(Debug, Clone, Serialize)]
pub struct Offer {
    pub id: String,
    pub transporter_id: String,
    pub direction: Direction,
    pub pickup_location: String,
    pub pickup_coords: Coordinates,
    pub dropoff_location: String,
    pub dropoff_coords: Coordinates,
    pub departure_date: DateTime<Utc>,
    pub arrival_date: DateTime<Utc>,
    pub total_capacity_kg: f64,
    pub available_capacity_kg: f64,
    pub created_at: DateTime<Utc>,
}

impl Offer {
    pub fn from_row(row: &SqliteRow) -> Result<Offer, sqlx::Error> {
        let direction_raw = row.get::<String, _>("direction");
        let direction = Direction::parse(&direction_raw).ok_or_else(|| {
            decode_error(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("unknown direction '{direction_raw}'"),
            ))
        })?;

        Ok(Offer {
            id: row.get::<String, _>("id"),
            transporter_id: row.get::<String, _>("transporter_id"),
            direction,
            pickup_location: row.get::<String, _>("pickup_location"),
            pickup_coords: Coordinates::from_json(&row.get::<String, _>("pickup_coords"))
                .map_err(decode_error)?,
            dropoff_location: row.get::<String, _>("dropoff_location"),
            dropoff_coords: Coordinates::from_json(&row.get::<String, _>("dropoff_coords"))
                .map_err(decode_error)?,
            departure_date: parse_timestamp(&row.get::<String, _>("departure_date"))?,
            arrival_date: parse_timestamp(&row.get::<String, _>("arrival_date"))?,
            total_capacity_kg: row.get::<f64, _>("total_capacity_kg"),
            available_capacity_kg: row.get::<f64, _>("available_capacity_kg"),
            created_at: parse_timestamp(&row.get::<String, _>("created_at"))?,
        })
    }
}

/// Payload for announcing a new offer. Coordinates stay optional here so the
/// service can reject their absence itself instead of trusting the client
/// form to have blocked submission.
#[derive(Debug, Clone, Deserialize)]
pub struct NewOffer {
    pub direction: Direction,
    pub pickup_location: String,
    pub pickup_coords: Option<Coordinates>,
    pub dropoff_location: String,
    pub dropoff_coords: Option<Coordinates>,
    pub departure_date: DateTime<Utc>,
    pub arrival_date: DateTime<Utc>,
    pub total_capacity_kg: f64,
}

/// Dashboard line for a transporter's own offer.
#[derive(Debug, Serialize)]
pub struct OfferSummary {
    #[serde(flatten)]
    pub offer: Offer,
    pub matched_request_count: i64,
}
