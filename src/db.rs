use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;

pub async fn init_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let connect_opts = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        // Concurrent submissions must queue on the write lock, not error out.
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(connect_opts)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS profiles (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            password TEXT,
            phone TEXT,
            user_type TEXT NOT NULL CHECK(user_type IN ('transporter', 'client')),
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(&pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            token TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            created_at TEXT NOT NULL,
            expires_at TEXT,
            FOREIGN KEY(user_id) REFERENCES profiles(id)
        );
        "#,
    )
    .execute(&pool)
    .await?;

    // Replaces the on-device "pending user type" cache: a signup intent is a
    // server-side record bridging the OAuth redirect, consumed exactly once.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS signup_intents (
            id TEXT PRIMARY KEY,
            user_type TEXT NOT NULL CHECK(user_type IN ('transporter', 'client')),
            created_at TEXT NOT NULL,
            expires_at TEXT NOT NULL,
            consumed_at TEXT
        );
        "#,
    )
    .execute(&pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS transport_offers (
            id TEXT PRIMARY KEY,
            transporter_id TEXT NOT NULL,
            direction TEXT NOT NULL CHECK(direction IN ('tn_fr', 'fr_tn')),
            pickup_location TEXT NOT NULL,
            pickup_coords TEXT NOT NULL,
            dropoff_location TEXT NOT NULL,
            dropoff_coords TEXT NOT NULL,
            departure_date TEXT NOT NULL,
            arrival_date TEXT NOT NULL,
            total_capacity_kg REAL NOT NULL,
            available_capacity_kg REAL NOT NULL CHECK(available_capacity_kg >= 0),
            created_at TEXT NOT NULL,
            FOREIGN KEY(transporter_id) REFERENCES profiles(id)
        );
        "#,
    )
    .execute(&pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS transport_requests (
            id TEXT PRIMARY KEY,
            client_id TEXT NOT NULL,
            weight_kg REAL NOT NULL,
            desired_date TEXT NOT NULL,
            pickup_location TEXT NOT NULL,
            pickup_coords TEXT NOT NULL,
            dropoff_location TEXT NOT NULL,
            dropoff_coords TEXT NOT NULL,
            direction TEXT NOT NULL CHECK(direction IN ('tn_fr', 'fr_tn')),
            status TEXT NOT NULL CHECK(status IN ('pending', 'matched', 'paid')),
            matched_offer_id TEXT,
            created_at TEXT NOT NULL,
            FOREIGN KEY(client_id) REFERENCES profiles(id),
            FOREIGN KEY(matched_offer_id) REFERENCES transport_offers(id)
        );
        "#,
    )
    .execute(&pool)
    .await?;

    // Matching scans by route and departure window.
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_offers_direction_departure \
         ON transport_offers(direction, departure_date);",
    )
    .execute(&pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_requests_client ON transport_requests(client_id);")
        .execute(&pool)
        .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_requests_matched_offer \
         ON transport_requests(matched_offer_id);",
    )
    .execute(&pool)
    .await?;

    Ok(pool)
}
