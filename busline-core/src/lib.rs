pub mod booking;
pub mod clock;
pub mod events;
pub mod identity;
pub mod money;
pub mod payment;
pub mod repository;
pub mod trip;
pub mod voucher;

use voucher::VoucherRejection;

/// Why a write lost against concurrent state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Conflict {
    #[error("seats already held: {}", .0.join(", "))]
    SeatsTaken(Vec<String>),
    #[error("{entity} {id} was modified concurrently")]
    StaleVersion { entity: &'static str, id: String },
    #[error("booking code {0} already exists")]
    DuplicateBookingCode(String),
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Conflict: {0}")]
    Conflict(#[from] Conflict),
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error("Illegal {entity} transition from {from} to {to}")]
    IllegalState {
        entity: &'static str,
        from: String,
        to: String,
    },
    #[error("Operation not allowed: {0}")]
    NotAllowed(String),
    #[error("Voucher rejected: {0}")]
    Policy(#[from] VoucherRejection),
    #[error("Storage failure: {0}")]
    Storage(String),
}

impl EngineError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn illegal(entity: &'static str, from: impl ToString, to: impl ToString) -> Self {
        Self::IllegalState {
            entity,
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub fn stale(entity: &'static str, id: impl ToString) -> Self {
        Self::Conflict(Conflict::StaleVersion {
            entity,
            id: id.to_string(),
        })
    }

    /// Conflicts come from racing writers; the same request may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::Conflict(_))
    }

    /// Short machine-readable kind, used by the HTTP layer and in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::Validation(_) => "VALIDATION",
            EngineError::Conflict(_) => "CONFLICT",
            EngineError::NotFound { .. } => "NOT_FOUND",
            EngineError::IllegalState { .. } | EngineError::NotAllowed(_) => "ILLEGAL_STATE",
            EngineError::Policy(_) => "POLICY",
            EngineError::Storage(_) => "STORAGE",
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_conflicts_are_retryable() {
        assert!(EngineError::from(Conflict::SeatsTaken(vec!["01".into()])).is_retryable());
        assert!(EngineError::stale("booking", "b-1").is_retryable());
        assert!(!EngineError::Validation("empty seat list".into()).is_retryable());
        assert!(!EngineError::from(VoucherRejection::UsageLimitReached).is_retryable());
        assert!(!EngineError::illegal("booking", "CANCELLED", "CONFIRMED").is_retryable());
    }

    #[test]
    fn test_seat_conflict_message_lists_seats() {
        let err = EngineError::from(Conflict::SeatsTaken(vec!["01".into(), "04".into()]));
        assert_eq!(err.to_string(), "Conflict: seats already held: 01, 04");
        assert_eq!(err.kind(), "CONFLICT");
    }
}
