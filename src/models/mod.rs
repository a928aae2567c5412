pub mod offer;
pub mod profile;
pub mod request;

pub use offer::{NewOffer, Offer, OfferSummary};
pub use profile::{Contact, Profile, Role};
pub use request::{
    Booking,
    MatchOutcome,
    NewShipmentRequest,
    PaymentConfirmation,
    RequestStatus,
    RequestSummary,
    TransportRequest,
};

use serde::{Deserialize, Serialize};

/// Shipping route between the two served countries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    TnFr,
    FrTn,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::TnFr => "tn_fr",
            Direction::FrTn => "fr_tn",
        }
    }

    pub fn parse(value: &str) -> Option<Direction> {
        match value {
            "tn_fr" => Some(Direction::TnFr),
            "fr_tn" => Some(Direction::FrTn),
            _ => None,
        }
    }
}

/// A resolved map point. Stored as a JSON object in a TEXT column, the same
/// shape the mobile and web clients exchange with the map views.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn to_json(&self) -> String {
        // Two plain floats cannot fail to serialize.
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn from_json(raw: &str) -> Result<Coordinates, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

pub(crate) fn decode_error<E>(err: E) -> sqlx::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    sqlx::Error::Decode(Box::new(err))
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<chrono::DateTime<chrono::Utc>, sqlx::Error> {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .map_err(decode_error)
}
