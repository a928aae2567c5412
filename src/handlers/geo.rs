use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::errors::ServiceError;
use crate::services::geocoding;

const DEFAULT_LIMIT: u32 = 5;
const MAX_LIMIT: u32 = 10;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ReverseQuery {
    pub lat: f64,
    pub lng: f64,
}

pub async fn search(query: web::Query<SearchQuery>) -> Result<HttpResponse, ServiceError> {
    let query = query.into_inner();
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    let suggestions = geocoding::search(&query.q, limit).await?;
    Ok(HttpResponse::Ok().json(suggestions))
}

pub async fn reverse(query: web::Query<ReverseQuery>) -> Result<HttpResponse, ServiceError> {
    let query = query.into_inner();
    let display_name = geocoding::reverse(query.lat, query.lng).await?;
    Ok(HttpResponse::Ok().json(json!({ "display_name": display_name })))
}
