use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::EngineError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Cancelled,
    RefundPending,
    Refunded,
}

impl PaymentStatus {
    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        use PaymentStatus::*;
        matches!(
            (self, next),
            (Pending, Paid)
                | (Pending, Failed)
                | (Pending, Cancelled)
                | (Paid, Cancelled)
                | (Paid, RefundPending)
                | (RefundPending, Refunded)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::Cancelled => "CANCELLED",
            PaymentStatus::RefundPending => "REFUND_PENDING",
            PaymentStatus::Refunded => "REFUNDED",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(PaymentStatus::Pending),
            "PAID" => Ok(PaymentStatus::Paid),
            "FAILED" => Ok(PaymentStatus::Failed),
            "CANCELLED" => Ok(PaymentStatus::Cancelled),
            "REFUND_PENDING" => Ok(PaymentStatus::RefundPending),
            "REFUNDED" => Ok(PaymentStatus::Refunded),
            other => Err(EngineError::Validation(format!("unknown payment status {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    #[default]
    BankTransfer,
    Vnpay,
    Momo,
    Cash,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::BankTransfer => "BANK_TRANSFER",
            PaymentMethod::Vnpay => "VNPAY",
            PaymentMethod::Momo => "MOMO",
            PaymentMethod::Cash => "CASH",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BANK_TRANSFER" => Ok(PaymentMethod::BankTransfer),
            "VNPAY" => Ok(PaymentMethod::Vnpay),
            "MOMO" => Ok(PaymentMethod::Momo),
            "CASH" => Ok(PaymentMethod::Cash),
            other => Err(EngineError::Validation(format!("unknown payment method {other}"))),
        }
    }
}

/// One payment per booking, embedded in the booking record so both share a version.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Payment {
    pub id: Uuid,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    /// Always the booking's payable amount.
    pub amount: i64,
    pub transaction_id: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub refunded_at: Option<DateTime<Utc>>,
}

impl Payment {
    pub fn pending(method: PaymentMethod, amount: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            method,
            status: PaymentStatus::Pending,
            amount,
            transaction_id: None,
            paid_at: None,
            refunded_at: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentOutcome {
    Success,
    Failed,
}

/// Inbound gateway callback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfirmation {
    pub booking_id: Uuid,
    pub transaction_id: String,
    pub amount: i64,
    pub status: PaymentOutcome,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_transition_table() {
        use PaymentStatus::*;
        let all = [Pending, Paid, Failed, Cancelled, RefundPending, Refunded];
        let legal = [
            (Pending, Paid),
            (Pending, Failed),
            (Pending, Cancelled),
            (Paid, Cancelled),
            (Paid, RefundPending),
            (RefundPending, Refunded),
        ];
        for from in all {
            for to in all {
                assert_eq!(from.can_transition_to(to), legal.contains(&(from, to)), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn test_method_wire_names() {
        assert_eq!(serde_json::to_string(&PaymentMethod::BankTransfer).unwrap(), "\"BANK_TRANSFER\"");
        assert_eq!("VNPAY".parse::<PaymentMethod>().unwrap(), PaymentMethod::Vnpay);
        assert!("PAYPAL".parse::<PaymentMethod>().is_err());
    }
}
