use async_trait::async_trait;
use busline_catalog::inventory::SeatInventory;
use busline_core::booking::{Booking, BookingStatus, Passenger};
use busline_core::payment::Payment;
use busline_core::repository::{BookingRepository, RedemptionClaim};
use busline_core::{Conflict, EngineError, EngineResult};
use busline_shared::Masked;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::database::db_error;
use crate::voucher_repo::count_usage;

pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one(&self, filter: &str, bind: BookingKey<'_>) -> EngineResult<Option<Booking>> {
        let sql = format!("{BOOKING_SELECT} WHERE {filter}");
        let query = sqlx::query_as::<_, BookingRow>(&sql);
        let query = match bind {
            BookingKey::Id(id) => query.bind(id),
            BookingKey::Code(code) => query.bind(code),
        };
        let row = query.fetch_optional(&self.pool).await.map_err(db_error)?;
        row.map(Booking::try_from).transpose()
    }
}

enum BookingKey<'a> {
    Id(Uuid),
    Code(&'a str),
}

const BOOKING_SELECT: &str = r#"
    SELECT b.id, b.booking_code, b.trip_id, b.user_id, b.passenger_name, b.passenger_phone,
           b.passenger_email, b.total_price, b.discount_amount, b.payable_amount, b.voucher_code,
           b.status, b.cancel_reason, b.cancel_note, b.operator_note, b.refund_amount,
           b.payment_id, b.payment_method, b.payment_status, b.payment_amount, b.transaction_id,
           b.paid_at, b.refunded_at, b.created_at, b.updated_at, b.version,
           ARRAY(SELECT s.seat_number FROM booking_seats s WHERE s.booking_id = b.id ORDER BY s.seat_number) AS seat_numbers
    FROM bookings b
"#;

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    booking_code: String,
    trip_id: Uuid,
    user_id: Option<String>,
    passenger_name: String,
    passenger_phone: String,
    passenger_email: Option<String>,
    total_price: i64,
    discount_amount: i64,
    payable_amount: i64,
    voucher_code: Option<String>,
    status: String,
    cancel_reason: Option<String>,
    cancel_note: Option<String>,
    operator_note: Option<String>,
    refund_amount: Option<i64>,
    payment_id: Uuid,
    payment_method: String,
    payment_status: String,
    payment_amount: i64,
    transaction_id: Option<String>,
    paid_at: Option<DateTime<Utc>>,
    refunded_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: i64,
    seat_numbers: Vec<String>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = EngineError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        Ok(Booking {
            id: row.id,
            booking_code: row.booking_code,
            trip_id: row.trip_id,
            user_id: row.user_id,
            passenger: Passenger {
                name: row.passenger_name,
                phone: Masked::new(row.passenger_phone),
                email: row.passenger_email.map(Masked::new),
            },
            seat_numbers: row.seat_numbers,
            total_price: row.total_price,
            discount_amount: row.discount_amount,
            payable_amount: row.payable_amount,
            voucher_code: row.voucher_code,
            status: row.status.parse()?,
            cancel_reason: row.cancel_reason,
            cancel_note: row.cancel_note,
            operator_note: row.operator_note,
            refund_amount: row.refund_amount,
            payment: Payment {
                id: row.payment_id,
                method: row.payment_method.parse()?,
                status: row.payment_status.parse()?,
                amount: row.payment_amount,
                transaction_id: row.transaction_id,
                paid_at: row.paid_at,
                refunded_at: row.refunded_at,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
            version: row.version.max(0) as u64,
        })
    }
}

async fn insert_booking(tx: &mut Transaction<'_, Postgres>, booking: &Booking) -> EngineResult<()> {
    sqlx::query(
        r#"
        INSERT INTO bookings (
            id, booking_code, trip_id, user_id, passenger_name, passenger_phone, passenger_email,
            total_price, discount_amount, payable_amount, voucher_code, status,
            payment_id, payment_method, payment_status, payment_amount, created_at, updated_at, version
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
        "#,
    )
    .bind(booking.id)
    .bind(&booking.booking_code)
    .bind(booking.trip_id)
    .bind(&booking.user_id)
    .bind(&booking.passenger.name)
    .bind(booking.passenger.phone.expose())
    .bind(booking.passenger.email.as_ref().map(|e| e.expose().clone()))
    .bind(booking.total_price)
    .bind(booking.discount_amount)
    .bind(booking.payable_amount)
    .bind(&booking.voucher_code)
    .bind(booking.status.as_str())
    .bind(booking.payment.id)
    .bind(booking.payment.method.as_str())
    .bind(booking.payment.status.as_str())
    .bind(booking.payment.amount)
    .bind(booking.created_at)
    .bind(booking.updated_at)
    .bind(booking.version as i64)
    .execute(&mut **tx)
    .await
    .map_err(|e| match db_error(e) {
        EngineError::Conflict(Conflict::DuplicateBookingCode(_)) => {
            Conflict::DuplicateBookingCode(booking.booking_code.clone()).into()
        }
        other => other,
    })?;

    for seat in &booking.seat_numbers {
        sqlx::query("INSERT INTO booking_seats (booking_id, trip_id, seat_number, active) VALUES ($1, $2, $3, TRUE)")
            .bind(booking.id)
            .bind(booking.trip_id)
            .bind(seat)
            .execute(&mut **tx)
            .await
            .map_err(|e| match db_error(e) {
                EngineError::Conflict(Conflict::SeatsTaken(_)) => Conflict::SeatsTaken(vec![seat.clone()]).into(),
                other => other,
            })?;
    }
    Ok(())
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn held_seats(&self, trip_id: Uuid) -> EngineResult<BTreeSet<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT seat_number FROM booking_seats WHERE trip_id = $1 AND active")
                .bind(trip_id)
                .fetch_all(&self.pool)
                .await
                .map_err(db_error)?;
        Ok(rows.into_iter().map(|(seat,)| seat).collect())
    }

    async fn commit_booking(&self, booking: Booking, claim: Option<RedemptionClaim>) -> EngineResult<Booking> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        // Serializes reservations per trip until commit.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1::text))")
            .bind(booking.trip_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        let held: Vec<(String,)> =
            sqlx::query_as("SELECT seat_number FROM booking_seats WHERE trip_id = $1 AND active")
                .bind(booking.trip_id)
                .fetch_all(&mut *tx)
                .await
                .map_err(db_error)?;
        let held: BTreeSet<String> = held.into_iter().map(|(seat,)| seat).collect();
        SeatInventory::reserve(&held, &booking.seat_numbers)?;

        if let Some(claim) = &claim {
            sqlx::query("SELECT id FROM vouchers WHERE id = $1 FOR UPDATE")
                .bind(claim.voucher.id)
                .execute(&mut *tx)
                .await
                .map_err(db_error)?;
            let usage = count_usage(&mut *tx, claim.voucher.id, booking.user_id.as_deref()).await?;
            if let Some(rejection) = claim.voucher.usage_rejection(&usage, booking.user_id.as_deref()) {
                return Err(rejection.into());
            }
        }

        insert_booking(&mut tx, &booking).await?;

        if let Some(claim) = &claim {
            let r = &claim.redemption;
            sqlx::query(
                r#"
                INSERT INTO voucher_redemptions (voucher_id, voucher_code, booking_id, user_id, discount_applied, redeemed_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(r.voucher_id)
            .bind(&r.voucher_code)
            .bind(r.booking_id)
            .bind(&r.user_id)
            .bind(r.discount_applied)
            .bind(r.redeemed_at)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        }

        tx.commit().await.map_err(db_error)?;
        Ok(booking)
    }

    async fn get_booking(&self, id: Uuid) -> EngineResult<Booking> {
        self.fetch_one("b.id = $1", BookingKey::Id(id))
            .await?
            .ok_or_else(|| EngineError::not_found("booking", id))
    }

    async fn find_by_code(&self, code: &str) -> EngineResult<Booking> {
        self.fetch_one("upper(b.booking_code) = upper($1)", BookingKey::Code(code.trim()))
            .await?
            .ok_or_else(|| EngineError::not_found("booking", code))
    }

    async fn list_for_trip(&self, trip_id: Uuid) -> EngineResult<Vec<Booking>> {
        let sql = format!("{BOOKING_SELECT} WHERE b.trip_id = $1 ORDER BY b.created_at");
        let rows: Vec<BookingRow> = sqlx::query_as(&sql)
            .bind(trip_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        rows.into_iter().map(Booking::try_from).collect()
    }

    async fn list_pending_before(&self, cutoff: DateTime<Utc>) -> EngineResult<Vec<Booking>> {
        let sql = format!("{BOOKING_SELECT} WHERE b.status = $1 AND b.created_at < $2 ORDER BY b.created_at");
        let rows: Vec<BookingRow> = sqlx::query_as(&sql)
            .bind(BookingStatus::Pending.as_str())
            .bind(cutoff)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        rows.into_iter().map(Booking::try_from).collect()
    }

    async fn update_booking(&self, booking: &Booking, expected_version: u64) -> EngineResult<Booking> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let result = sqlx::query(
            r#"
            UPDATE bookings SET
                status = $3, cancel_reason = $4, cancel_note = $5, operator_note = $6,
                refund_amount = $7, payment_status = $8, transaction_id = $9,
                paid_at = $10, refunded_at = $11, updated_at = $12, version = version + 1
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(booking.id)
        .bind(expected_version as i64)
        .bind(booking.status.as_str())
        .bind(&booking.cancel_reason)
        .bind(&booking.cancel_note)
        .bind(&booking.operator_note)
        .bind(booking.refund_amount)
        .bind(booking.payment.status.as_str())
        .bind(&booking.payment.transaction_id)
        .bind(booking.payment.paid_at)
        .bind(booking.payment.refunded_at)
        .bind(booking.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        if result.rows_affected() == 0 {
            drop(tx);
            self.get_booking(booking.id).await?;
            return Err(EngineError::stale("booking", booking.id));
        }

        if !booking.holds_seats() {
            sqlx::query("UPDATE booking_seats SET active = FALSE WHERE booking_id = $1")
                .bind(booking.id)
                .execute(&mut *tx)
                .await
                .map_err(db_error)?;
        }

        tx.commit().await.map_err(db_error)?;
        self.get_booking(booking.id).await
    }

    async fn next_booking_sequence(&self, day: NaiveDate) -> EngineResult<u32> {
        let (value,): (i32,) = sqlx::query_as(
            r#"
            INSERT INTO booking_code_sequences (day, last_value) VALUES ($1, 1)
            ON CONFLICT (day) DO UPDATE SET last_value = booking_code_sequences.last_value + 1
            RETURNING last_value
            "#,
        )
        .bind(day)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(value.max(1) as u32)
    }
}
