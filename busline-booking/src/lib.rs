pub mod code;
pub mod lifecycle;
pub mod progress;
pub mod refund;

pub use code::BookingCodeGenerator;
pub use lifecycle::{BookingLifecycle, BookingQuote, CancellationResolution, LifecycleSettings, NewBooking};
pub use progress::TripProgress;
pub use refund::{RefundDecision, RefundPolicy, RefundTier};
