use skyfare_core::BookingError;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::time::Duration;

#[derive(Clone)]
pub struct DbClient {
    pub pool: Pool<Postgres>,
}

impl DbClient {
    pub async fn new(connection_string: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(connection_string)
            .await?;

        Ok(Self { pool })
    }
}

/// Convert a storage-layer failure into the catch-all domain error. No raw
/// sqlx error crosses the repository boundary.
pub(crate) fn db_err(e: sqlx::Error) -> BookingError {
    BookingError::Unavailable(e.to_string())
}
