use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::ServiceError;

const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";
// Nominatim's usage policy requires an identifying agent.
const USER_AGENT: &str = concat!("sila-backend/", env!("CARGO_PKG_VERSION"));
const MIN_QUERY_LEN: usize = 3;

#[derive(Debug, Serialize)]
pub struct GeocodeSuggestion {
    pub display_name: String,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Deserialize)]
struct NominatimPlace {
    display_name: String,
    lat: String,
    lon: String,
}

fn base_url() -> String {
    std::env::var("GEOCODER_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string())
}

fn client() -> Result<Client, ServiceError> {
    Client::builder()
        .timeout(Duration::from_secs(10))
        .user_agent(USER_AGENT)
        .build()
        .map_err(Into::into)
}

/// Forward geocoding for the address autocomplete fields. Queries below the
/// autocomplete threshold return nothing without an upstream call, matching
/// the clients' own debounce rule.
pub async fn search(query: &str, limit: u32) -> Result<Vec<GeocodeSuggestion>, ServiceError> {
    let query = query.trim();
    if query.len() < MIN_QUERY_LEN {
        return Ok(Vec::new());
    }

    let places: Vec<NominatimPlace> = client()?
        .get(format!("{}/search", base_url()))
        .query(&[
            ("format", "json".to_string()),
            ("q", query.to_string()),
            ("limit", limit.to_string()),
            ("addressdetails", "1".to_string()),
        ])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    // Nominatim serializes coordinates as strings; entries that fail to
    // parse are dropped rather than failing the whole lookup.
    Ok(places
        .into_iter()
        .filter_map(|place| {
            let lat = place.lat.parse().ok()?;
            let lng = place.lon.parse().ok()?;
            Some(GeocodeSuggestion {
                display_name: place.display_name,
                lat,
                lng,
            })
        })
        .collect())
}

/// Reverse geocoding for map taps: a coordinate pair back to a display name.
pub async fn reverse(lat: f64, lng: f64) -> Result<Option<String>, ServiceError> {
    #[derive(Deserialize)]
    struct ReversePlace {
        display_name: Option<String>,
    }

    let place: ReversePlace = client()?
        .get(format!("{}/reverse", base_url()))
        .query(&[
            ("format", "json".to_string()),
            ("lat", lat.to_string()),
            ("lon", lng.to_string()),
        ])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    Ok(place.display_name)
}
