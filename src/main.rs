mod db;
mod errors;
mod handlers;
mod i18n;
mod models;
mod services;
mod state;

use actix_cors::Cors;
use actix_web::middleware::NormalizePath;
use actix_web::{web, App, HttpServer};
use state::AppState;
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let port = std::env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse::<u16>()
        .unwrap_or(8080);
    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://sila.db".to_string());

    let pool = db::init_pool(&database_url)
        .await
        .expect("Failed to initialize SQLite pool");
    let app_state = web::Data::new(AppState::new(pool));

    tracing::info!(port, "sila backend listening");

    HttpServer::new(move || {
        App::new()
            .wrap(NormalizePath::trim())
            .wrap(Cors::permissive())
            .app_data(app_state.clone())
            .route("/", web::get().to(handlers::index))
            .route("/health", web::get().to(handlers::health_check))

            .route("/api/auth/register", web::post().to(handlers::auth::register))
            .route("/api/auth/login", web::post().to(handlers::auth::login))
            .route("/api/auth/check-user", web::get().to(handlers::auth::email_exists))
            .route("/api/auth/check-token", web::get().to(handlers::auth::check_token))
            .route("/api/auth/profile/{user_id}", web::get().to(handlers::auth::get_profile))
            .route("/api/auth/oauth/intent", web::post().to(handlers::auth::oauth_intent))
            .route("/api/auth/oauth/complete", web::post().to(handlers::auth::oauth_complete))

            .route("/api/offers", web::post().to(handlers::offers::create_offer))
            .route("/api/offers", web::get().to(handlers::offers::list_my_offers))
            .route("/api/offers/{offer_id}", web::get().to(handlers::offers::get_offer))
            .route("/api/offers/{offer_id}/bookings", web::get().to(handlers::offers::offer_bookings))

            .route("/api/requests", web::post().to(handlers::requests::submit_request))
            .route("/api/requests", web::get().to(handlers::requests::list_my_requests))
            .route("/api/requests/{request_id}", web::get().to(handlers::requests::get_request))

            .route("/api/payments/{request_id}", web::post().to(handlers::payments::confirm_payment))

            .route("/api/geo/search", web::get().to(handlers::geo::search))
            .route("/api/geo/reverse", web::get().to(handlers::geo::reverse))
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
