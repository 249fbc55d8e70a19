use busline_core::booking::Booking;
use busline_core::trip::{BusLayout, SeatType, Trip};
use busline_core::{Conflict, EngineError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use uuid::Uuid;

use crate::pricing::PricingEngine;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeatAvailability {
    pub seat_number: String,
    pub seat_type: SeatType,
    pub price: i64,
    pub available: bool,
}

/// Seat inventory for a trip, derived from its bookings on every call.
///
/// Nothing here is stored: a seat is held exactly while a non-terminal booking
/// lists it. Repositories call [`SeatInventory::reserve`] inside their atomic
/// unit of work so the check and the insert cannot interleave with another
/// reservation on the same trip.
pub struct SeatInventory;

impl SeatInventory {
    /// Normalizes a requested seat list: trimmed, non-empty, no duplicates,
    /// every seat present in the layout. Returns the list sorted.
    pub fn validate_request(layout: &BusLayout, seat_numbers: &[String]) -> Result<Vec<String>, InventoryError> {
        if seat_numbers.is_empty() {
            return Err(InventoryError::EmptySelection);
        }

        let mut seen = HashSet::new();
        let mut seats = Vec::with_capacity(seat_numbers.len());
        for raw in seat_numbers {
            let seat = raw.trim().to_string();
            if layout.seat(&seat).is_none() {
                return Err(InventoryError::UnknownSeat(seat));
            }
            if !seen.insert(seat.clone()) {
                return Err(InventoryError::DuplicateSeat(seat));
            }
            seats.push(seat);
        }

        seats.sort();
        Ok(seats)
    }

    /// Seats held by the non-terminal bookings of `trip_id`.
    pub fn held_seats<'a, I>(trip_id: Uuid, bookings: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = &'a Booking>,
    {
        bookings
            .into_iter()
            .filter(|b| b.trip_id == trip_id && b.holds_seats())
            .flat_map(|b| b.seat_numbers.iter().cloned())
            .collect()
    }

    /// All-or-nothing claim against the current held set. Callers insert the
    /// booking's seats in the same unit of work when this succeeds.
    pub fn reserve(held: &BTreeSet<String>, requested: &[String]) -> Result<(), InventoryError> {
        let taken: Vec<String> = requested
            .iter()
            .filter(|seat| held.contains(seat.as_str()))
            .cloned()
            .collect();

        if !taken.is_empty() {
            return Err(InventoryError::SeatsTaken(taken));
        }

        Ok(())
    }

    pub fn seat_map(trip: &Trip, held: &BTreeSet<String>, pricing: &PricingEngine) -> Vec<SeatAvailability> {
        trip.bus
            .seats
            .iter()
            .map(|seat| SeatAvailability {
                seat_number: seat.seat_number.clone(),
                seat_type: seat.seat_type,
                price: pricing.seat_price(trip.base_price, seat),
                available: !held.contains(&seat.seat_number),
            })
            .collect()
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InventoryError {
    #[error("at least one seat must be selected")]
    EmptySelection,

    #[error("seat {0} does not exist on this bus")]
    UnknownSeat(String),

    #[error("seat {0} was selected more than once")]
    DuplicateSeat(String),

    #[error("seats already held: {}", .0.join(", "))]
    SeatsTaken(Vec<String>),
}

impl From<InventoryError> for EngineError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::SeatsTaken(seats) => EngineError::Conflict(Conflict::SeatsTaken(seats)),
            other => EngineError::Validation(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use busline_core::booking::{BookingStatus, Passenger};
    use busline_core::payment::{Payment, PaymentMethod};
    use busline_core::trip::Seat;
    use busline_shared::Masked;
    use chrono::Utc;

    fn layout() -> BusLayout {
        BusLayout::new(
            Uuid::new_v4(),
            vec![
                Seat::new("01", SeatType::Standard),
                Seat::new("02", SeatType::Vip),
                Seat::new("03", SeatType::Sleeper),
            ],
        )
    }

    fn booking(trip_id: Uuid, seats: &[&str], status: BookingStatus) -> Booking {
        let now = Utc::now();
        Booking {
            id: Uuid::new_v4(),
            booking_code: format!("BK{}", Uuid::new_v4().simple()),
            trip_id,
            user_id: None,
            passenger: Passenger {
                name: "Tran Thi B".into(),
                phone: Masked::new("0912000000".into()),
                email: None,
            },
            seat_numbers: seats.iter().map(|s| s.to_string()).collect(),
            total_price: 0,
            discount_amount: 0,
            payable_amount: 0,
            voucher_code: None,
            status,
            cancel_reason: None,
            cancel_note: None,
            operator_note: None,
            refund_amount: None,
            payment: Payment::pending(PaymentMethod::Cash, 0),
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    #[test]
    fn test_validate_request() {
        let layout = layout();
        let ok = SeatInventory::validate_request(&layout, &["03".into(), " 01".into()]).unwrap();
        assert_eq!(ok, vec!["01".to_string(), "03".to_string()]);

        assert_eq!(SeatInventory::validate_request(&layout, &[]), Err(InventoryError::EmptySelection));
        assert_eq!(
            SeatInventory::validate_request(&layout, &["09".into()]),
            Err(InventoryError::UnknownSeat("09".into()))
        );
        assert_eq!(
            SeatInventory::validate_request(&layout, &["01".into(), "01".into()]),
            Err(InventoryError::DuplicateSeat("01".into()))
        );
    }

    #[test]
    fn test_held_seats_ignore_terminal_and_other_trips() {
        let trip_id = Uuid::new_v4();
        let bookings = vec![
            booking(trip_id, &["01"], BookingStatus::Pending),
            booking(trip_id, &["02"], BookingStatus::Cancelled),
            booking(trip_id, &["03"], BookingStatus::Completed),
            booking(Uuid::new_v4(), &["03"], BookingStatus::Confirmed),
        ];

        let held = SeatInventory::held_seats(trip_id, &bookings);
        assert_eq!(held.into_iter().collect::<Vec<_>>(), vec!["01".to_string()]);
    }

    #[test]
    fn test_reserve_is_all_or_nothing() {
        let held: BTreeSet<String> = ["02".to_string(), "03".to_string()].into_iter().collect();

        let err = SeatInventory::reserve(&held, &["01".into(), "02".into(), "03".into()]).unwrap_err();
        assert_eq!(err, InventoryError::SeatsTaken(vec!["02".into(), "03".into()]));

        assert_eq!(SeatInventory::reserve(&held, &["01".into(), "04".into()]), Ok(()));
    }

    #[test]
    fn test_conflicts_map_to_retryable_errors() {
        let err: EngineError = InventoryError::SeatsTaken(vec!["01".into()]).into();
        assert!(err.is_retryable());
        let err: EngineError = InventoryError::UnknownSeat("99".into()).into();
        assert!(matches!(err, EngineError::Validation(_)));
    }
}
