//! Integer money helpers. Amounts are minor units of the platform currency,
//! rates are basis points (`10_000` = 1.0).

pub const BPS_SCALE: u32 = 10_000;

/// `amount * bps / 10_000`, rounded half-up to a whole minor unit.
pub fn apply_bps(amount: i64, bps: u32) -> i64 {
    div_half_up(amount as i128 * bps as i128, BPS_SCALE as i128)
}

/// `amount * percent / 100`, rounded half-up.
pub fn percent_of(amount: i64, percent: i64) -> i64 {
    div_half_up(amount as i128 * percent as i128, 100)
}

/// Rounds `amount` half-up to a multiple of `unit` (e.g. 1_000 for whole thousands).
pub fn round_to_unit(amount: i64, unit: i64) -> i64 {
    if unit <= 1 {
        return amount;
    }
    div_half_up(amount as i128, unit as i128) * unit
}

fn div_half_up(numerator: i128, denominator: i128) -> i64 {
    let quotient = numerator / denominator;
    let remainder = numerator % denominator;
    let rounded = if remainder.abs() * 2 >= denominator {
        quotient + numerator.signum()
    } else {
        quotient
    };
    rounded as i64
}
