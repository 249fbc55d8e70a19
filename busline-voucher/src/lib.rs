pub mod engine;
pub mod rules;

pub use engine::{AppliedVoucher, VoucherEngine};
pub use rules::{check_eligibility, compute_discount, EligibilityContext, VoucherRule};
