use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::money::BPS_SCALE;
use crate::{EngineError, EngineResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatType {
    Standard,
    Vip,
    Sleeper,
}

impl SeatType {
    /// Default fare multiplier in basis points.
    pub fn default_multiplier_bps(&self) -> u32 {
        match self {
            SeatType::Standard => 10_000,
            SeatType::Vip => 12_000,
            SeatType::Sleeper => 11_000,
        }
    }
}

/// Immutable layout data. Whether a seat is booked is never stored here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Seat {
    pub seat_number: String,
    pub seat_type: SeatType,
    pub price_multiplier_bps: u32,
}

impl Seat {
    pub fn new(seat_number: impl Into<String>, seat_type: SeatType) -> Self {
        Self {
            seat_number: seat_number.into(),
            seat_type,
            price_multiplier_bps: seat_type.default_multiplier_bps(),
        }
    }

    pub fn with_multiplier_bps(mut self, bps: u32) -> Self {
        self.price_multiplier_bps = bps;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BusLayout {
    pub bus_id: Uuid,
    pub seats: Vec<Seat>,
}

impl BusLayout {
    pub fn new(bus_id: Uuid, mut seats: Vec<Seat>) -> Self {
        seats.sort_by(|a, b| a.seat_number.cmp(&b.seat_number));
        Self { bus_id, seats }
    }

    pub fn seat(&self, seat_number: &str) -> Option<&Seat> {
        self.seats.iter().find(|s| s.seat_number == seat_number)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl TripStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TripStatus::Completed | TripStatus::Cancelled)
    }

    /// Forward-only driver transitions.
    pub fn can_transition_to(&self, next: TripStatus) -> bool {
        use TripStatus::*;
        matches!(
            (self, next),
            (Scheduled, InProgress)
                | (Scheduled, Cancelled)
                | (InProgress, Completed)
                | (InProgress, Cancelled)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TripStatus::Scheduled => "SCHEDULED",
            TripStatus::InProgress => "IN_PROGRESS",
            TripStatus::Completed => "COMPLETED",
            TripStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for TripStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TripStatus {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SCHEDULED" => Ok(TripStatus::Scheduled),
            "IN_PROGRESS" => Ok(TripStatus::InProgress),
            "COMPLETED" => Ok(TripStatus::Completed),
            "CANCELLED" => Ok(TripStatus::Cancelled),
            other => Err(EngineError::Validation(format!("unknown trip status {other}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Trip {
    pub id: Uuid,
    pub company_id: Uuid,
    pub departure_location: String,
    pub arrival_location: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    /// Minor units.
    pub base_price: i64,
    pub bus: BusLayout,
    pub status: TripStatus,
    pub version: u64,
}

impl Trip {
    /// Checks the invariants the admin side is expected to uphold.
    pub fn validate(&self) -> EngineResult<()> {
        if self.arrival_time <= self.departure_time {
            return Err(EngineError::Validation(format!(
                "trip {} arrives before it departs",
                self.id
            )));
        }
        if self.base_price <= 0 {
            return Err(EngineError::Validation(format!(
                "trip {} has non-positive base price",
                self.id
            )));
        }
        let mut seen = HashSet::new();
        for seat in &self.bus.seats {
            if !seen.insert(seat.seat_number.as_str()) {
                return Err(EngineError::Validation(format!(
                    "seat {} appears twice in bus {}",
                    seat.seat_number, self.bus.bus_id
                )));
            }
            if seat.price_multiplier_bps < BPS_SCALE {
                return Err(EngineError::Validation(format!(
                    "seat {} has a multiplier below 1.0",
                    seat.seat_number
                )));
            }
        }
        Ok(())
    }

    pub fn has_departed(&self, now: DateTime<Utc>) -> bool {
        now >= self.departure_time
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TripStatusLogEntry {
    pub trip_id: Uuid,
    pub from: TripStatus,
    pub to: TripStatus,
    pub note: Option<String>,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IncidentReport {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub note: String,
    pub reported_at: DateTime<Utc>,
}
