pub mod app_config;
pub mod booking_repo;
pub mod database;
pub mod events;
pub mod memory;
pub mod redis_repo;
pub mod trip_repo;
pub mod voucher_repo;

pub use app_config::Config;
pub use booking_repo::PgBookingRepository;
pub use database::DbClient;
pub use events::RecordingPublisher;
pub use memory::MemoryStore;
pub use redis_repo::RedisClient;
pub use trip_repo::PgTripRepository;
pub use voucher_repo::PgVoucherRepository;

#[cfg(feature = "kafka")]
pub use events::EventProducer;
