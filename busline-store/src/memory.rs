use async_trait::async_trait;
use busline_catalog::inventory::SeatInventory;
use busline_core::booking::Booking;
use busline_core::repository::{BookingRepository, RedemptionClaim, TripRepository, VoucherRepository};
use busline_core::trip::{IncidentReport, Trip, TripStatusLogEntry};
use busline_core::voucher::{normalize_code, Voucher, VoucherRedemption, VoucherUsage};
use busline_core::{Conflict, EngineError, EngineResult};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{BTreeSet, HashMap};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct State {
    trips: HashMap<Uuid, Trip>,
    status_log: HashMap<Uuid, Vec<TripStatusLogEntry>>,
    incidents: HashMap<Uuid, Vec<IncidentReport>>,
    vouchers: HashMap<String, Voucher>,
    redemptions: Vec<VoucherRedemption>,
    bookings: HashMap<Uuid, Booking>,
    /// Upper-cased booking code -> booking id.
    codes: HashMap<String, Uuid>,
    sequences: HashMap<NaiveDate, u32>,
}

impl State {
    fn usage(&self, voucher_id: Uuid, user_id: Option<&str>) -> VoucherUsage {
        self.redemptions
            .iter()
            .filter(|r| r.voucher_id == voucher_id)
            .fold(VoucherUsage::default(), |mut usage, r| {
                usage.total += 1;
                if user_id.is_some() && r.user_id.as_deref() == user_id {
                    usage.by_user += 1;
                }
                usage
            })
    }
}

/// Single-process store. One lock guards everything, so each repository call
/// is one atomic unit of work.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed_trip(&self, trip: Trip) -> EngineResult<()> {
        trip.validate()?;
        self.state.write().await.trips.insert(trip.id, trip);
        Ok(())
    }

    pub async fn seed_voucher(&self, voucher: Voucher) -> EngineResult<()> {
        voucher.validate_definition()?;
        self.state.write().await.vouchers.insert(voucher.code.clone(), voucher);
        Ok(())
    }

    pub async fn redemptions(&self) -> Vec<VoucherRedemption> {
        self.state.read().await.redemptions.clone()
    }
}

#[async_trait]
impl TripRepository for MemoryStore {
    async fn get_trip(&self, id: Uuid) -> EngineResult<Trip> {
        self.state
            .read()
            .await
            .trips
            .get(&id)
            .cloned()
            .ok_or_else(|| EngineError::not_found("trip", id))
    }

    async fn update_trip_status(
        &self,
        id: Uuid,
        expected_version: u64,
        entry: TripStatusLogEntry,
    ) -> EngineResult<Trip> {
        let mut state = self.state.write().await;
        let trip = state.trips.get_mut(&id).ok_or_else(|| EngineError::not_found("trip", id))?;
        if trip.version != expected_version {
            return Err(EngineError::stale("trip", id));
        }
        trip.status = entry.to;
        trip.version += 1;
        let updated = trip.clone();
        state.status_log.entry(id).or_default().push(entry);
        Ok(updated)
    }

    async fn status_log(&self, id: Uuid) -> EngineResult<Vec<TripStatusLogEntry>> {
        let state = self.state.read().await;
        if !state.trips.contains_key(&id) {
            return Err(EngineError::not_found("trip", id));
        }
        Ok(state.status_log.get(&id).cloned().unwrap_or_default())
    }

    async fn add_incident(&self, report: &IncidentReport) -> EngineResult<()> {
        let mut state = self.state.write().await;
        if !state.trips.contains_key(&report.trip_id) {
            return Err(EngineError::not_found("trip", report.trip_id));
        }
        state.incidents.entry(report.trip_id).or_default().push(report.clone());
        Ok(())
    }

    async fn incidents(&self, trip_id: Uuid) -> EngineResult<Vec<IncidentReport>> {
        let state = self.state.read().await;
        if !state.trips.contains_key(&trip_id) {
            return Err(EngineError::not_found("trip", trip_id));
        }
        Ok(state.incidents.get(&trip_id).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl VoucherRepository for MemoryStore {
    async fn find_voucher(&self, code: &str) -> EngineResult<Option<Voucher>> {
        Ok(self.state.read().await.vouchers.get(&normalize_code(code)).cloned())
    }

    async fn usage(&self, voucher_id: Uuid, user_id: Option<&str>) -> EngineResult<VoucherUsage> {
        Ok(self.state.read().await.usage(voucher_id, user_id))
    }
}

#[async_trait]
impl BookingRepository for MemoryStore {
    async fn held_seats(&self, trip_id: Uuid) -> EngineResult<BTreeSet<String>> {
        let state = self.state.read().await;
        Ok(SeatInventory::held_seats(trip_id, state.bookings.values()))
    }

    async fn commit_booking(&self, booking: Booking, claim: Option<RedemptionClaim>) -> EngineResult<Booking> {
        let mut state = self.state.write().await;

        let code_key = booking.booking_code.to_uppercase();
        if state.codes.contains_key(&code_key) {
            return Err(Conflict::DuplicateBookingCode(booking.booking_code).into());
        }

        let held = SeatInventory::held_seats(booking.trip_id, state.bookings.values());
        SeatInventory::reserve(&held, &booking.seat_numbers)?;

        if let Some(claim) = &claim {
            let usage = state.usage(claim.voucher.id, booking.user_id.as_deref());
            if let Some(rejection) = claim.voucher.usage_rejection(&usage, booking.user_id.as_deref()) {
                return Err(rejection.into());
            }
        }

        state.codes.insert(code_key, booking.id);
        state.bookings.insert(booking.id, booking.clone());
        if let Some(claim) = claim {
            state.redemptions.push(claim.redemption);
        }
        Ok(booking)
    }

    async fn get_booking(&self, id: Uuid) -> EngineResult<Booking> {
        self.state
            .read()
            .await
            .bookings
            .get(&id)
            .cloned()
            .ok_or_else(|| EngineError::not_found("booking", id))
    }

    async fn find_by_code(&self, code: &str) -> EngineResult<Booking> {
        let state = self.state.read().await;
        state
            .codes
            .get(&code.trim().to_uppercase())
            .and_then(|id| state.bookings.get(id))
            .cloned()
            .ok_or_else(|| EngineError::not_found("booking", code))
    }

    async fn list_for_trip(&self, trip_id: Uuid) -> EngineResult<Vec<Booking>> {
        let state = self.state.read().await;
        let mut bookings: Vec<Booking> = state
            .bookings
            .values()
            .filter(|b| b.trip_id == trip_id)
            .cloned()
            .collect();
        bookings.sort_by_key(|b| b.created_at);
        Ok(bookings)
    }

    async fn list_pending_before(&self, cutoff: DateTime<Utc>) -> EngineResult<Vec<Booking>> {
        let state = self.state.read().await;
        Ok(state
            .bookings
            .values()
            .filter(|b| b.status == busline_core::booking::BookingStatus::Pending && b.created_at < cutoff)
            .cloned()
            .collect())
    }

    async fn update_booking(&self, booking: &Booking, expected_version: u64) -> EngineResult<Booking> {
        let mut state = self.state.write().await;
        let stored = state
            .bookings
            .get_mut(&booking.id)
            .ok_or_else(|| EngineError::not_found("booking", booking.id))?;
        if stored.version != expected_version {
            return Err(EngineError::stale("booking", booking.id));
        }

        let seat_numbers = std::mem::take(&mut stored.seat_numbers);
        *stored = Booking {
            seat_numbers,
            version: expected_version + 1,
            ..booking.clone()
        };
        Ok(stored.clone())
    }

    async fn next_booking_sequence(&self, day: NaiveDate) -> EngineResult<u32> {
        let mut state = self.state.write().await;
        let sequence = state.sequences.entry(day).or_insert(0);
        *sequence += 1;
        Ok(*sequence)
    }
}
