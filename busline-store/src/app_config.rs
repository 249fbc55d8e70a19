use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub kafka: KafkaConfig,
    pub auth: AuthConfig,
    pub business_rules: BusinessRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    /// Unpaid bookings older than this are released by the sweeper.
    pub pending_hold_seconds: u64,
    pub expiry_sweep_seconds: u64,
    pub booking_code_prefix: String,
    /// Per-seat prices are rounded to a multiple of this many minor units.
    pub rounding_unit: i64,
    pub refund_tiers: Vec<RefundTierConfig>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct RefundTierConfig {
    pub min_hours_before_departure: i64,
    pub percent: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// Without a URL the engine runs on the in-memory store.
    pub url: Option<String>,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: Option<String>,
    pub rate_limit_per_minute: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct KafkaConfig {
    pub brokers: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Self::defaults()?
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `BUSLINE__DATABASE__URL=postgres://...`
            .add_source(config::Environment::with_prefix("BUSLINE").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    /// Built-in values; every file and environment layer overrides these.
    pub fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
        config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("database.max_connections", 5)?
            .set_default("redis.rate_limit_per_minute", 120)?
            .set_default("auth.jwt_secret", "change-me")?
            .set_default("business_rules.pending_hold_seconds", 900)?
            .set_default("business_rules.expiry_sweep_seconds", 60)?
            .set_default("business_rules.booking_code_prefix", "BK")?
            .set_default("business_rules.rounding_unit", 1)?
            .set_default(
                "business_rules.refund_tiers",
                vec![refund_tier(24, 100), refund_tier(6, 50)],
            )
    }
}

fn refund_tier(hours: i64, percent: i64) -> config::Value {
    let mut table = config::Map::new();
    table.insert("min_hours_before_departure".to_string(), config::Value::from(hours));
    table.insert("percent".to_string(), config::Value::from(percent));
    config::Value::from(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_deserialize() {
        let config: Config = Config::defaults()
            .and_then(|b| b.build())
            .and_then(|c| c.try_deserialize())
            .unwrap();

        assert!(config.database.url.is_none());
        assert_eq!(config.business_rules.booking_code_prefix, "BK");
        assert_eq!(
            config.business_rules.refund_tiers,
            vec![
                RefundTierConfig { min_hours_before_departure: 24, percent: 100 },
                RefundTierConfig { min_hours_before_departure: 6, percent: 50 },
            ]
        );
    }

    #[test]
    fn test_overrides_win() {
        let config: Config = Config::defaults()
            .and_then(|b| b.set_override("business_rules.pending_hold_seconds", 60))
            .and_then(|b| b.build())
            .and_then(|c| c.try_deserialize())
            .unwrap();
        assert_eq!(config.business_rules.pending_hold_seconds, 60);
    }
}
