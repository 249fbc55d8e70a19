use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, EngineResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountType {
    Amount,
    Percent,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Voucher {
    pub id: Uuid,
    /// Stored normalized, see [`normalize_code`].
    pub code: String,
    pub discount_type: DiscountType,
    /// Minor units for AMOUNT, 1..=100 for PERCENT.
    pub discount_value: i64,
    pub min_order_value: Option<i64>,
    pub max_discount: Option<i64>,
    pub usage_limit: Option<u32>,
    pub usage_per_user: Option<u32>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    /// `None` means platform-wide.
    pub company_scope: Option<Uuid>,
    pub is_active: bool,
}

impl Voucher {
    pub fn validate_definition(&self) -> EngineResult<()> {
        if self.code.is_empty() || self.code != normalize_code(&self.code) {
            return Err(EngineError::Validation(format!(
                "voucher code {:?} is not normalized",
                self.code
            )));
        }
        if self.discount_value <= 0 {
            return Err(EngineError::Validation("discount value must be positive".into()));
        }
        if self.discount_type == DiscountType::Percent && self.discount_value > 100 {
            return Err(EngineError::Validation("percent discount must be within 1..=100".into()));
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                return Err(EngineError::Validation("voucher ends before it starts".into()));
            }
        }
        Ok(())
    }

    /// Usage-cap rules, in check order. Guests (`user_id == None`) skip the per-user cap.
    pub fn usage_rejection(&self, usage: &VoucherUsage, user_id: Option<&str>) -> Option<VoucherRejection> {
        if let Some(limit) = self.usage_limit {
            if usage.total >= limit as u64 {
                return Some(VoucherRejection::UsageLimitReached);
            }
        }
        if let (Some(limit), Some(_)) = (self.usage_per_user, user_id) {
            if usage.by_user >= limit as u64 {
                return Some(VoucherRejection::PerUserLimitReached);
            }
        }
        None
    }
}

/// Trimmed and upper-cased; codes compare case-insensitively everywhere.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoucherUsage {
    pub total: u64,
    pub by_user: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VoucherRedemption {
    pub voucher_id: Uuid,
    pub voucher_code: String,
    pub booking_id: Uuid,
    pub user_id: Option<String>,
    pub discount_applied: i64,
    pub redeemed_at: DateTime<Utc>,
}

/// The specific eligibility rule a voucher failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "reason", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoucherRejection {
    #[error("voucher is inactive")]
    Inactive,
    #[error("voucher is not valid yet")]
    NotStarted,
    #[error("voucher has expired")]
    Expired,
    #[error("voucher does not apply to this operator")]
    WrongCompany,
    #[error("order total {subtotal} is below the minimum {minimum}")]
    BelowMinimumOrder { minimum: i64, subtotal: i64 },
    #[error("voucher usage limit reached")]
    UsageLimitReached,
    #[error("voucher already used the maximum number of times by this user")]
    PerUserLimitReached,
}

impl VoucherRejection {
    pub fn code(&self) -> &'static str {
        match self {
            VoucherRejection::Inactive => "INACTIVE",
            VoucherRejection::NotStarted => "NOT_STARTED",
            VoucherRejection::Expired => "EXPIRED",
            VoucherRejection::WrongCompany => "WRONG_COMPANY",
            VoucherRejection::BelowMinimumOrder { .. } => "BELOW_MINIMUM_ORDER",
            VoucherRejection::UsageLimitReached => "USAGE_LIMIT_REACHED",
            VoucherRejection::PerUserLimitReached => "PER_USER_LIMIT_REACHED",
        }
    }
}
