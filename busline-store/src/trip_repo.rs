use async_trait::async_trait;
use busline_core::repository::TripRepository;
use busline_core::trip::{BusLayout, IncidentReport, Seat, SeatType, Trip, TripStatus, TripStatusLogEntry};
use busline_core::{EngineError, EngineResult};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::db_error;

pub struct PgTripRepository {
    pool: PgPool,
}

impl PgTripRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn ensure_exists(&self, id: Uuid) -> EngineResult<()> {
        let found: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM trips WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        found.map(|_| ()).ok_or_else(|| EngineError::not_found("trip", id))
    }
}

#[derive(sqlx::FromRow)]
struct TripRow {
    id: Uuid,
    company_id: Uuid,
    departure_location: String,
    arrival_location: String,
    departure_time: DateTime<Utc>,
    arrival_time: DateTime<Utc>,
    base_price: i64,
    bus_id: Uuid,
    status: String,
    version: i64,
}

#[derive(sqlx::FromRow)]
struct SeatRow {
    seat_number: String,
    seat_type: String,
    price_multiplier_bps: i32,
}

#[derive(sqlx::FromRow)]
struct StatusLogRow {
    trip_id: Uuid,
    from_status: String,
    to_status: String,
    note: Option<String>,
    changed_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct IncidentRow {
    id: Uuid,
    trip_id: Uuid,
    note: String,
    reported_at: DateTime<Utc>,
}

fn seat_type(value: &str) -> EngineResult<SeatType> {
    match value {
        "STANDARD" => Ok(SeatType::Standard),
        "VIP" => Ok(SeatType::Vip),
        "SLEEPER" => Ok(SeatType::Sleeper),
        other => Err(EngineError::Storage(format!("unknown seat type {other}"))),
    }
}

impl TryFrom<StatusLogRow> for TripStatusLogEntry {
    type Error = EngineError;

    fn try_from(row: StatusLogRow) -> Result<Self, Self::Error> {
        Ok(TripStatusLogEntry {
            trip_id: row.trip_id,
            from: row.from_status.parse()?,
            to: row.to_status.parse()?,
            note: row.note,
            changed_at: row.changed_at,
        })
    }
}

#[async_trait]
impl TripRepository for PgTripRepository {
    async fn get_trip(&self, id: Uuid) -> EngineResult<Trip> {
        let row: TripRow = sqlx::query_as(
            r#"
            SELECT id, company_id, departure_location, arrival_location, departure_time,
                   arrival_time, base_price, bus_id, status, version
            FROM trips WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .ok_or_else(|| EngineError::not_found("trip", id))?;

        let seats: Vec<SeatRow> = sqlx::query_as(
            "SELECT seat_number, seat_type, price_multiplier_bps FROM bus_seats WHERE bus_id = $1",
        )
        .bind(row.bus_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        let seats = seats
            .into_iter()
            .map(|s| {
                Ok(Seat::new(s.seat_number, seat_type(&s.seat_type)?)
                    .with_multiplier_bps(s.price_multiplier_bps.max(0) as u32))
            })
            .collect::<EngineResult<Vec<_>>>()?;

        Ok(Trip {
            id: row.id,
            company_id: row.company_id,
            departure_location: row.departure_location,
            arrival_location: row.arrival_location,
            departure_time: row.departure_time,
            arrival_time: row.arrival_time,
            base_price: row.base_price,
            bus: BusLayout::new(row.bus_id, seats),
            status: row.status.parse::<TripStatus>()?,
            version: row.version.max(0) as u64,
        })
    }

    async fn update_trip_status(
        &self,
        id: Uuid,
        expected_version: u64,
        entry: TripStatusLogEntry,
    ) -> EngineResult<Trip> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let result = sqlx::query(
            "UPDATE trips SET status = $3, version = version + 1 WHERE id = $1 AND version = $2",
        )
        .bind(id)
        .bind(expected_version as i64)
        .bind(entry.to.as_str())
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        if result.rows_affected() == 0 {
            self.ensure_exists(id).await?;
            return Err(EngineError::stale("trip", id));
        }

        sqlx::query(
            r#"
            INSERT INTO trip_status_log (trip_id, from_status, to_status, note, changed_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(id)
        .bind(entry.from.as_str())
        .bind(entry.to.as_str())
        .bind(&entry.note)
        .bind(entry.changed_at)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        self.get_trip(id).await
    }

    async fn status_log(&self, id: Uuid) -> EngineResult<Vec<TripStatusLogEntry>> {
        self.ensure_exists(id).await?;
        let rows: Vec<StatusLogRow> = sqlx::query_as(
            r#"
            SELECT trip_id, from_status, to_status, note, changed_at
            FROM trip_status_log WHERE trip_id = $1 ORDER BY id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.into_iter().map(TripStatusLogEntry::try_from).collect()
    }

    async fn add_incident(&self, report: &IncidentReport) -> EngineResult<()> {
        self.ensure_exists(report.trip_id).await?;
        sqlx::query("INSERT INTO incident_reports (id, trip_id, note, reported_at) VALUES ($1, $2, $3, $4)")
            .bind(report.id)
            .bind(report.trip_id)
            .bind(&report.note)
            .bind(report.reported_at)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }

    async fn incidents(&self, trip_id: Uuid) -> EngineResult<Vec<IncidentReport>> {
        self.ensure_exists(trip_id).await?;
        let rows: Vec<IncidentRow> = sqlx::query_as(
            "SELECT id, trip_id, note, reported_at FROM incident_reports WHERE trip_id = $1 ORDER BY reported_at",
        )
        .bind(trip_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(rows
            .into_iter()
            .map(|r| IncidentReport {
                id: r.id,
                trip_id: r.trip_id,
                note: r.note,
                reported_at: r.reported_at,
            })
            .collect())
    }
}
