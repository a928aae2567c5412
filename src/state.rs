use sqlx::SqlitePool;

/// Shared application state. The pool is the only shared mutable resource;
/// every operation is a short-lived unit of work against it.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
}

impl AppState {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}
