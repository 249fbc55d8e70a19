use busline_core::money::{apply_bps, round_to_unit};
use busline_core::trip::{Seat, SeatType, Trip};
use busline_core::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Per-seat prices are rounded half-up to a multiple of this many minor units.
    pub rounding_unit: i64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self { rounding_unit: 1 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeatPrice {
    pub seat_number: String,
    pub seat_type: SeatType,
    pub multiplier_bps: u32,
    pub price: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FareQuote {
    pub per_seat: Vec<SeatPrice>,
    pub subtotal: i64,
}

/// Fare computation. Pure: no inventory reads, no persistence.
#[derive(Debug, Clone, Default)]
pub struct PricingEngine {
    config: PricingConfig,
}

impl PricingEngine {
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    pub fn seat_price(&self, base_price: i64, seat: &Seat) -> i64 {
        let raw = apply_bps(base_price, seat.price_multiplier_bps);
        round_to_unit(raw, self.config.rounding_unit)
    }

    /// Prices `seat_numbers` on `trip`. Seats are expected to be validated
    /// already; an unknown seat is still reported rather than priced at zero.
    pub fn quote(&self, trip: &Trip, seat_numbers: &[String]) -> EngineResult<FareQuote> {
        let mut per_seat = Vec::with_capacity(seat_numbers.len());
        for number in seat_numbers {
            let seat = trip.bus.seat(number).ok_or_else(|| {
                EngineError::Validation(format!("seat {} does not exist on this bus", number))
            })?;
            per_seat.push(SeatPrice {
                seat_number: seat.seat_number.clone(),
                seat_type: seat.seat_type,
                multiplier_bps: seat.price_multiplier_bps,
                price: self.seat_price(trip.base_price, seat),
            });
        }

        let subtotal = per_seat.iter().map(|s| s.price).sum();
        Ok(FareQuote { per_seat, subtotal })
    }
}
