use busline_core::money::percent_of;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RefundTier {
    /// Applies when at least this many hours remain before departure.
    pub min_hours_before_departure: i64,
    pub percent: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RefundDecision {
    pub percent: i64,
    pub amount: i64,
}

/// Time-based refund tiers. The most generous tier whose threshold is met wins;
/// below every threshold nothing is refunded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RefundPolicy {
    tiers: Vec<RefundTier>,
}

impl RefundPolicy {
    pub fn new(mut tiers: Vec<RefundTier>) -> Self {
        tiers.sort_by(|a, b| b.min_hours_before_departure.cmp(&a.min_hours_before_departure));
        Self { tiers }
    }

    pub fn tiers(&self) -> &[RefundTier] {
        &self.tiers
    }

    pub fn percent_for(&self, departure: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
        let remaining = departure - now;
        self.tiers
            .iter()
            .find(|tier| remaining >= Duration::hours(tier.min_hours_before_departure))
            .map(|tier| tier.percent.clamp(0, 100))
            .unwrap_or(0)
    }

    pub fn decide(&self, paid: i64, departure: DateTime<Utc>, now: DateTime<Utc>) -> RefundDecision {
        let percent = self.percent_for(departure, now);
        RefundDecision {
            percent,
            amount: percent_of(paid, percent),
        }
    }
}

impl Default for RefundPolicy {
    fn default() -> Self {
        Self::new(vec![
            RefundTier {
                min_hours_before_departure: 24,
                percent: 100,
            },
            RefundTier {
                min_hours_before_departure: 6,
                percent: 50,
            },
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        let policy = RefundPolicy::default();
        let departure = Utc::now() + Duration::days(3);

        assert_eq!(policy.percent_for(departure, departure - Duration::hours(24)), 100);
        assert_eq!(policy.percent_for(departure, departure - Duration::hours(23) - Duration::minutes(59)), 50);
        assert_eq!(policy.percent_for(departure, departure - Duration::hours(6)), 50);
        assert_eq!(policy.percent_for(departure, departure - Duration::hours(5) - Duration::minutes(59)), 0);
        assert_eq!(policy.percent_for(departure, departure + Duration::hours(1)), 0);
    }

    #[test]
    fn test_decision_amount_rounds_half_up() {
        let policy = RefundPolicy::default();
        let departure = Utc::now() + Duration::hours(10);
        let decision = policy.decide(170_001, departure, departure - Duration::hours(10));
        assert_eq!(decision, RefundDecision { percent: 50, amount: 85_001 });
    }

    #[test]
    fn test_custom_tiers_are_sorted() {
        let policy = RefundPolicy::new(vec![
            RefundTier { min_hours_before_departure: 2, percent: 10 },
            RefundTier { min_hours_before_departure: 48, percent: 90 },
        ]);
        assert_eq!(policy.tiers()[0].min_hours_before_departure, 48);
        let departure = Utc::now();
        assert_eq!(policy.percent_for(departure, departure - Duration::hours(3)), 10);
    }
}
