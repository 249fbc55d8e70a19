use busline_core::{Conflict, EngineError};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::time::Duration;
use tracing::{error, info};

pub const BOOKING_CODE_INDEX: &str = "bookings_code_upper_idx";
pub const ACTIVE_SEAT_INDEX: &str = "booking_seats_active_idx";

#[derive(Clone)]
pub struct DbClient {
    pub pool: Pool<Postgres>,
}

impl DbClient {
    pub async fn new(connection_string: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(connection_string)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("../migrations").run(&self.pool).await?;
        info!("Migrations completed successfully.");
        Ok(())
    }
}

/// Maps a driver error onto the engine taxonomy. Unique-index violations that
/// back engine invariants become conflicts; everything else is a storage failure.
pub(crate) fn db_error(e: sqlx::Error) -> EngineError {
    if let Some(db) = e.as_database_error() {
        match db.constraint() {
            Some(BOOKING_CODE_INDEX) => {
                return Conflict::DuplicateBookingCode(db.message().to_string()).into();
            }
            Some(ACTIVE_SEAT_INDEX) => {
                return Conflict::SeatsTaken(Vec::new()).into();
            }
            _ => {}
        }
    }
    error!("database error: {}", e);
    EngineError::Storage(e.to_string())
}
