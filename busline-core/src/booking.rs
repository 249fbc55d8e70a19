use busline_shared::Masked;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::payment::{Payment, PaymentStatus};
use crate::{EngineError, EngineResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    CancelRequested,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }

    /// Non-terminal bookings keep their seats out of the inventory.
    pub fn holds_seats(&self) -> bool {
        !self.is_terminal()
    }

    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, Completed)
                | (Confirmed, CancelRequested)
                | (CancelRequested, Cancelled)
                | (CancelRequested, Confirmed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::CancelRequested => "CANCEL_REQUESTED",
            BookingStatus::Cancelled => "CANCELLED",
            BookingStatus::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(BookingStatus::Pending),
            "CONFIRMED" => Ok(BookingStatus::Confirmed),
            "CANCEL_REQUESTED" => Ok(BookingStatus::CancelRequested),
            "CANCELLED" => Ok(BookingStatus::Cancelled),
            "COMPLETED" => Ok(BookingStatus::Completed),
            other => Err(EngineError::Validation(format!("unknown booking status {other}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Passenger {
    pub name: String,
    pub phone: Masked<String>,
    pub email: Option<Masked<String>>,
}

impl Passenger {
    pub fn validate(&self) -> EngineResult<()> {
        if self.name.trim().is_empty() {
            return Err(EngineError::Validation("passenger name is required".into()));
        }
        if self.phone.expose().trim().is_empty() {
            return Err(EngineError::Validation("passenger phone is required".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: Uuid,
    pub booking_code: String,
    pub trip_id: Uuid,
    pub user_id: Option<String>,
    pub passenger: Passenger,
    /// Sorted, unique, fixed at creation.
    pub seat_numbers: Vec<String>,
    pub total_price: i64,
    pub discount_amount: i64,
    pub payable_amount: i64,
    pub voucher_code: Option<String>,
    pub status: BookingStatus,
    pub cancel_reason: Option<String>,
    pub cancel_note: Option<String>,
    pub operator_note: Option<String>,
    pub refund_amount: Option<i64>,
    pub payment: Payment,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: u64,
}

impl Booking {
    /// Moves the booking to `next`, rejecting anything off the transition table.
    pub fn transition(&mut self, next: BookingStatus, now: DateTime<Utc>) -> EngineResult<BookingStatus> {
        let from = self.status;
        if !from.can_transition_to(next) {
            return Err(EngineError::illegal("booking", from, next));
        }
        self.status = next;
        self.updated_at = now;
        Ok(from)
    }

    pub fn transition_payment(&mut self, next: PaymentStatus, now: DateTime<Utc>) -> EngineResult<PaymentStatus> {
        let from = self.payment.status;
        if !from.can_transition_to(next) {
            return Err(EngineError::illegal("payment", from, next));
        }
        self.payment.status = next;
        self.updated_at = now;
        Ok(from)
    }

    pub fn holds_seats(&self) -> bool {
        self.status.holds_seats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::PaymentMethod;

    fn booking(status: BookingStatus) -> Booking {
        let now = Utc::now();
        Booking {
            id: Uuid::new_v4(),
            booking_code: "BK2610160001".into(),
            trip_id: Uuid::new_v4(),
            user_id: None,
            passenger: Passenger {
                name: "Nguyen Van A".into(),
                phone: Masked::new("0901234567".into()),
                email: None,
            },
            seat_numbers: vec!["01".into()],
            total_price: 100_000,
            discount_amount: 0,
            payable_amount: 100_000,
            voucher_code: None,
            status,
            cancel_reason: None,
            cancel_note: None,
            operator_note: None,
            refund_amount: None,
            payment: Payment::pending(PaymentMethod::Cash, 100_000),
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    #[test]
    fn test_unlisted_transitions_are_illegal() {
        use BookingStatus::*;
        let all = [Pending, Confirmed, CancelRequested, Cancelled, Completed];
        let legal = [
            (Pending, Confirmed),
            (Pending, Cancelled),
            (Confirmed, Completed),
            (Confirmed, CancelRequested),
            (CancelRequested, Cancelled),
            (CancelRequested, Confirmed),
        ];
        for from in all {
            for to in all {
                let mut b = booking(from);
                let result = b.transition(to, Utc::now());
                if legal.contains(&(from, to)) {
                    assert_eq!(result.unwrap(), from);
                    assert_eq!(b.status, to);
                } else {
                    assert!(matches!(result, Err(EngineError::IllegalState { .. })), "{from} -> {to}");
                    assert_eq!(b.status, from);
                }
            }
        }
    }

    #[test]
    fn test_terminal_bookings_release_seats() {
        assert!(booking(BookingStatus::Pending).holds_seats());
        assert!(booking(BookingStatus::CancelRequested).holds_seats());
        assert!(!booking(BookingStatus::Cancelled).holds_seats());
        assert!(!booking(BookingStatus::Completed).holds_seats());
    }

    #[test]
    fn test_debug_output_masks_contact_details() {
        let b = booking(BookingStatus::Pending);
        let rendered = format!("{:?}", b);
        assert!(!rendered.contains("0901234567"));
    }

    #[test]
    fn test_passenger_requires_name_and_phone() {
        let mut p = booking(BookingStatus::Pending).passenger;
        assert!(p.validate().is_ok());
        p.name = "  ".into();
        assert!(p.validate().is_err());
    }
}
