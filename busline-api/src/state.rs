use std::sync::Arc;

use busline_booking::{BookingLifecycle, LifecycleSettings, RefundPolicy, RefundTier, TripProgress};
use busline_catalog::pricing::PricingConfig;
use busline_core::clock::Clock;
use busline_core::events::EventPublisher;
use busline_core::repository::{BookingRepository, TripRepository, VoucherRepository};
use busline_store::app_config::BusinessRules;
use busline_store::{DbClient, MemoryStore, PgBookingRepository, PgTripRepository, PgVoucherRepository, RedisClient};

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
}

#[derive(Clone)]
pub struct RateLimit {
    pub redis: Arc<RedisClient>,
    pub per_minute: i64,
}

#[derive(Clone)]
pub struct AppState {
    pub lifecycle: Arc<BookingLifecycle>,
    pub progress: Arc<TripProgress>,
    pub auth: AuthConfig,
    /// Enabled only when Redis is configured.
    pub rate_limit: Option<RateLimit>,
}

pub struct Repositories {
    pub trips: Arc<dyn TripRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub vouchers: Arc<dyn VoucherRepository>,
}

impl Repositories {
    pub fn in_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            trips: store.clone(),
            bookings: store.clone(),
            vouchers: store,
        }
    }

    pub fn postgres(db: &DbClient) -> Self {
        Self {
            trips: Arc::new(PgTripRepository::new(db.pool.clone())),
            bookings: Arc::new(PgBookingRepository::new(db.pool.clone())),
            vouchers: Arc::new(PgVoucherRepository::new(db.pool.clone())),
        }
    }
}

impl AppState {
    pub fn new(
        repos: Repositories,
        clock: Arc<dyn Clock>,
        events: Arc<dyn EventPublisher>,
        settings: LifecycleSettings,
        auth: AuthConfig,
        rate_limit: Option<RateLimit>,
    ) -> Self {
        let lifecycle = Arc::new(BookingLifecycle::new(
            repos.trips.clone(),
            repos.bookings,
            repos.vouchers,
            clock,
            events,
            settings,
        ));
        let progress = Arc::new(TripProgress::new(repos.trips, lifecycle.clone()));

        Self {
            lifecycle,
            progress,
            auth,
            rate_limit,
        }
    }
}

pub fn lifecycle_settings(rules: &BusinessRules) -> LifecycleSettings {
    LifecycleSettings {
        pricing: PricingConfig {
            rounding_unit: rules.rounding_unit.max(1),
        },
        refunds: RefundPolicy::new(
            rules
                .refund_tiers
                .iter()
                .map(|t| RefundTier {
                    min_hours_before_departure: t.min_hours_before_departure,
                    percent: t.percent,
                })
                .collect(),
        ),
        booking_code_prefix: rules.booking_code_prefix.clone(),
    }
}
