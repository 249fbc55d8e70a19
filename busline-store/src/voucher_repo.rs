use async_trait::async_trait;
use busline_core::repository::VoucherRepository;
use busline_core::voucher::{DiscountType, Voucher, VoucherUsage};
use busline_core::{EngineError, EngineResult};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::db_error;

pub struct PgVoucherRepository {
    pool: PgPool,
}

impl PgVoucherRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct VoucherRow {
    id: Uuid,
    code: String,
    discount_type: String,
    discount_value: i64,
    min_order_value: Option<i64>,
    max_discount: Option<i64>,
    usage_limit: Option<i32>,
    usage_per_user: Option<i32>,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    company_scope: Option<Uuid>,
    is_active: bool,
}

pub(crate) const VOUCHER_COLUMNS: &str = "id, code, discount_type, discount_value, min_order_value, max_discount, \
     usage_limit, usage_per_user, start_date, end_date, company_scope, is_active";

impl TryFrom<VoucherRow> for Voucher {
    type Error = EngineError;

    fn try_from(row: VoucherRow) -> Result<Self, Self::Error> {
        let discount_type = match row.discount_type.as_str() {
            "AMOUNT" => DiscountType::Amount,
            "PERCENT" => DiscountType::Percent,
            other => return Err(EngineError::Storage(format!("unknown discount type {other}"))),
        };
        Ok(Voucher {
            id: row.id,
            code: row.code,
            discount_type,
            discount_value: row.discount_value,
            min_order_value: row.min_order_value,
            max_discount: row.max_discount,
            usage_limit: row.usage_limit.map(|v| v.max(0) as u32),
            usage_per_user: row.usage_per_user.map(|v| v.max(0) as u32),
            start_date: row.start_date,
            end_date: row.end_date,
            company_scope: row.company_scope,
            is_active: row.is_active,
        })
    }
}

/// Redemption counts for a voucher, optionally for one user too.
pub(crate) async fn count_usage<'e, E>(executor: E, voucher_id: Uuid, user_id: Option<&str>) -> EngineResult<VoucherUsage>
where
    E: sqlx::Executor<'e, Database = sqlx::Postgres>,
{
    let (total, by_user): (i64, i64) = sqlx::query_as(
        r#"
        SELECT COUNT(*), COUNT(*) FILTER (WHERE $2::text IS NOT NULL AND user_id = $2)
        FROM voucher_redemptions
        WHERE voucher_id = $1
        "#,
    )
    .bind(voucher_id)
    .bind(user_id)
    .fetch_one(executor)
    .await
    .map_err(db_error)?;

    Ok(VoucherUsage {
        total: total.max(0) as u64,
        by_user: by_user.max(0) as u64,
    })
}

#[async_trait]
impl VoucherRepository for PgVoucherRepository {
    async fn find_voucher(&self, code: &str) -> EngineResult<Option<Voucher>> {
        let row: Option<VoucherRow> = sqlx::query_as(&format!(
            "SELECT {VOUCHER_COLUMNS} FROM vouchers WHERE upper(code) = upper($1)"
        ))
        .bind(code.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.map(Voucher::try_from).transpose()
    }

    async fn usage(&self, voucher_id: Uuid, user_id: Option<&str>) -> EngineResult<VoucherUsage> {
        count_usage(&self.pool, voucher_id, user_id).await
    }
}
