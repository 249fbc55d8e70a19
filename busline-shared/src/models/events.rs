use uuid::Uuid;

/// Topic names used by every publisher implementation.
pub mod topics {
    pub const BOOKING_CREATED: &str = "booking.created";
    pub const BOOKING_STATUS: &str = "booking.status";
    pub const PAYMENT_STATUS: &str = "payment.status";
    pub const TRIP_STATUS: &str = "trip.status";
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct BookingCreatedEvent {
    pub booking_id: Uuid,
    pub booking_code: String,
    pub trip_id: Uuid,
    pub seat_numbers: Vec<String>,
    pub payable_amount: i64,
    pub voucher_code: Option<String>,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct BookingStatusChangedEvent {
    pub booking_id: Uuid,
    pub trip_id: Uuid,
    pub from: String,
    pub to: String,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct PaymentStatusChangedEvent {
    pub booking_id: Uuid,
    pub payment_id: Uuid,
    pub from: String,
    pub to: String,
    pub amount: i64,
    pub refund_amount: Option<i64>,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct TripStatusChangedEvent {
    pub trip_id: Uuid,
    pub from: String,
    pub to: String,
    pub note: Option<String>,
    pub timestamp: i64,
}

/// Envelope handed to publishers; `topic` and `key` drive partitioning.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LifecycleEvent {
    BookingCreated(BookingCreatedEvent),
    BookingStatusChanged(BookingStatusChangedEvent),
    PaymentStatusChanged(PaymentStatusChangedEvent),
    TripStatusChanged(TripStatusChangedEvent),
}

impl LifecycleEvent {
    pub fn topic(&self) -> &'static str {
        match self {
            LifecycleEvent::BookingCreated(_) => topics::BOOKING_CREATED,
            LifecycleEvent::BookingStatusChanged(_) => topics::BOOKING_STATUS,
            LifecycleEvent::PaymentStatusChanged(_) => topics::PAYMENT_STATUS,
            LifecycleEvent::TripStatusChanged(_) => topics::TRIP_STATUS,
        }
    }

    /// Partition key: events of one booking (or trip) stay ordered.
    pub fn key(&self) -> String {
        match self {
            LifecycleEvent::BookingCreated(e) => e.booking_id.to_string(),
            LifecycleEvent::BookingStatusChanged(e) => e.booking_id.to_string(),
            LifecycleEvent::PaymentStatusChanged(e) => e.booking_id.to_string(),
            LifecycleEvent::TripStatusChanged(e) => e.trip_id.to_string(),
        }
    }
}
