use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::booking::Booking;
use crate::trip::{IncidentReport, Trip, TripStatusLogEntry};
use crate::voucher::{Voucher, VoucherRedemption, VoucherUsage};
use crate::EngineResult;

/// Trip data owned by the scheduling side. The engine only writes status.
#[async_trait]
pub trait TripRepository: Send + Sync {
    async fn get_trip(&self, id: Uuid) -> EngineResult<Trip>;

    /// Compare-and-set on `expected_version`; appends `entry` in the same write.
    async fn update_trip_status(
        &self,
        id: Uuid,
        expected_version: u64,
        entry: TripStatusLogEntry,
    ) -> EngineResult<Trip>;

    async fn status_log(&self, id: Uuid) -> EngineResult<Vec<TripStatusLogEntry>>;

    async fn add_incident(&self, report: &IncidentReport) -> EngineResult<()>;

    async fn incidents(&self, trip_id: Uuid) -> EngineResult<Vec<IncidentReport>>;
}

#[async_trait]
pub trait VoucherRepository: Send + Sync {
    /// Lookup by normalized code.
    async fn find_voucher(&self, code: &str) -> EngineResult<Option<Voucher>>;

    async fn usage(&self, voucher_id: Uuid, user_id: Option<&str>) -> EngineResult<VoucherUsage>;
}

/// Voucher redemption that must land together with its booking.
#[derive(Debug, Clone)]
pub struct RedemptionClaim {
    pub voucher: Voucher,
    pub redemption: VoucherRedemption,
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Seat numbers held by non-terminal bookings of the trip.
    async fn held_seats(&self, trip_id: Uuid) -> EngineResult<BTreeSet<String>>;

    /// One unit of work: reserve the booking's seats, insert it, and record the
    /// redemption. Implementations must fail with `Conflict::SeatsTaken` if any
    /// seat is held, `Conflict::DuplicateBookingCode` on a code clash, and the
    /// voucher's usage rejection if a cap is reached, leaving nothing written.
    async fn commit_booking(&self, booking: Booking, claim: Option<RedemptionClaim>) -> EngineResult<Booking>;

    async fn get_booking(&self, id: Uuid) -> EngineResult<Booking>;

    async fn find_by_code(&self, code: &str) -> EngineResult<Booking>;

    async fn list_for_trip(&self, trip_id: Uuid) -> EngineResult<Vec<Booking>>;

    /// PENDING bookings created before `cutoff`.
    async fn list_pending_before(&self, cutoff: DateTime<Utc>) -> EngineResult<Vec<Booking>>;

    /// Compare-and-set on `expected_version`; returns the stored booking with the bumped version.
    async fn update_booking(&self, booking: &Booking, expected_version: u64) -> EngineResult<Booking>;

    /// Next per-day sequence for booking codes, starting at 1.
    async fn next_booking_sequence(&self, day: NaiveDate) -> EngineResult<u32>;
}
