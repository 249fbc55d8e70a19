use busline_core::money::percent_of;
use busline_core::voucher::{DiscountType, Voucher, VoucherRejection, VoucherUsage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The order being checked out.
#[derive(Debug, Clone, Copy)]
pub struct EligibilityContext<'a> {
    pub user_id: Option<&'a str>,
    pub company_id: Uuid,
    pub subtotal: i64,
    pub now: DateTime<Utc>,
}

/// Eligibility rules in evaluation order. The first failure wins.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum VoucherRule {
    Active,
    ValidityWindow,
    CompanyScope,
    MinimumOrder,
    UsageCaps,
}

pub const RULE_ORDER: [VoucherRule; 5] = [
    VoucherRule::Active,
    VoucherRule::ValidityWindow,
    VoucherRule::CompanyScope,
    VoucherRule::MinimumOrder,
    VoucherRule::UsageCaps,
];

impl VoucherRule {
    fn evaluate(
        &self,
        voucher: &Voucher,
        usage: &VoucherUsage,
        ctx: &EligibilityContext<'_>,
    ) -> Result<(), VoucherRejection> {
        match self {
            VoucherRule::Active => {
                if !voucher.is_active {
                    return Err(VoucherRejection::Inactive);
                }
            }
            VoucherRule::ValidityWindow => {
                if voucher.start_date.is_some_and(|start| ctx.now < start) {
                    return Err(VoucherRejection::NotStarted);
                }
                if voucher.end_date.is_some_and(|end| ctx.now > end) {
                    return Err(VoucherRejection::Expired);
                }
            }
            VoucherRule::CompanyScope => {
                if voucher.company_scope.is_some_and(|company| company != ctx.company_id) {
                    return Err(VoucherRejection::WrongCompany);
                }
            }
            VoucherRule::MinimumOrder => {
                if let Some(minimum) = voucher.min_order_value {
                    if ctx.subtotal < minimum {
                        return Err(VoucherRejection::BelowMinimumOrder {
                            minimum,
                            subtotal: ctx.subtotal,
                        });
                    }
                }
            }
            VoucherRule::UsageCaps => {
                if let Some(rejection) = voucher.usage_rejection(usage, ctx.user_id) {
                    return Err(rejection);
                }
            }
        }
        Ok(())
    }
}

/// Runs every rule in [`RULE_ORDER`].
pub fn check_eligibility(
    voucher: &Voucher,
    usage: &VoucherUsage,
    ctx: &EligibilityContext<'_>,
) -> Result<(), VoucherRejection> {
    RULE_ORDER
        .iter()
        .try_for_each(|rule| rule.evaluate(voucher, usage, ctx))
}

/// Rules that need no redemption counts.
pub fn check_static_rules(voucher: &Voucher, ctx: &EligibilityContext<'_>) -> Result<(), VoucherRejection> {
    RULE_ORDER
        .iter()
        .filter(|rule| **rule != VoucherRule::UsageCaps)
        .try_for_each(|rule| rule.evaluate(voucher, &VoucherUsage::default(), ctx))
}

/// Discount for `subtotal`, always within `[0, subtotal]`.
pub fn compute_discount(voucher: &Voucher, subtotal: i64) -> i64 {
    if subtotal <= 0 {
        return 0;
    }

    let raw = match voucher.discount_type {
        DiscountType::Amount => voucher.discount_value,
        DiscountType::Percent => {
            let amount = percent_of(subtotal, voucher.discount_value);
            match voucher.max_discount {
                Some(cap) => amount.min(cap),
                None => amount,
            }
        }
    };

    raw.clamp(0, subtotal)
}
