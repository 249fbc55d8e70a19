pub mod pricing;
pub mod inventory;

pub use pricing::{FareQuote, PricingConfig, PricingEngine, SeatPrice};
pub use inventory::{InventoryError, SeatAvailability, SeatInventory};
