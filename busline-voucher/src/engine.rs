use std::sync::Arc;

use busline_core::repository::VoucherRepository;
use busline_core::voucher::{normalize_code, Voucher, VoucherUsage};
use busline_core::{EngineError, EngineResult};
use serde::Serialize;

use crate::rules::{check_eligibility, check_static_rules, compute_discount, EligibilityContext};

/// A voucher that passed every rule, with the discount it grants.
#[derive(Debug, Clone, Serialize)]
pub struct AppliedVoucher {
    pub voucher: Voucher,
    pub discount: i64,
}

pub struct VoucherEngine {
    repo: Arc<dyn VoucherRepository>,
}

impl VoucherEngine {
    pub fn new(repo: Arc<dyn VoucherRepository>) -> Self {
        Self { repo }
    }

    /// Looks up `code` and runs the eligibility rules in order.
    ///
    /// Unknown codes are `NotFound`; every other failure is a
    /// `Policy` error naming the rule. Redemption counts are only read once
    /// the cheaper rules have passed.
    pub async fn validate(&self, code: &str, ctx: &EligibilityContext<'_>) -> EngineResult<Voucher> {
        let normalized = normalize_code(code);
        let voucher = self
            .repo
            .find_voucher(&normalized)
            .await?
            .ok_or_else(|| EngineError::not_found("voucher", &normalized))?;

        check_static_rules(&voucher, ctx)?;

        let usage = if voucher.usage_limit.is_some() || voucher.usage_per_user.is_some() {
            self.repo.usage(voucher.id, ctx.user_id).await?
        } else {
            VoucherUsage::default()
        };
        check_eligibility(&voucher, &usage, ctx)?;

        tracing::debug!(code = %voucher.code, subtotal = ctx.subtotal, "voucher eligible");
        Ok(voucher)
    }

    /// [`validate`](Self::validate) plus the discount for `ctx.subtotal`.
    pub async fn apply(&self, code: &str, ctx: &EligibilityContext<'_>) -> EngineResult<AppliedVoucher> {
        let voucher = self.validate(code, ctx).await?;
        let discount = compute_discount(&voucher, ctx.subtotal);
        Ok(AppliedVoucher { voucher, discount })
    }
}
