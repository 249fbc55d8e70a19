use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use busline_api::state::{lifecycle_settings, AppState, AuthConfig, RateLimit, Repositories};
use busline_api::{app, worker};
use busline_core::clock::SystemClock;
use busline_core::events::EventPublisher;
use busline_store::app_config::Config;
use busline_store::{DbClient, MemoryStore, RedisClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "busline_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Busline API on port {}", config.server.port);

    let repos = match &config.database.url {
        Some(url) => {
            let db = DbClient::new(url, config.database.max_connections)
                .await
                .context("Failed to connect to Postgres")?;
            db.migrate().await.context("Failed to run migrations")?;
            Repositories::postgres(&db)
        }
        None => {
            tracing::warn!("No database configured, using the in-memory store");
            Repositories::in_memory(Arc::new(MemoryStore::new()))
        }
    };

    let rate_limit = match &config.redis.url {
        Some(url) => Some(RateLimit {
            redis: Arc::new(RedisClient::new(url).context("Invalid Redis URL")?),
            per_minute: config.redis.rate_limit_per_minute,
        }),
        None => None,
    };

    let state = AppState::new(
        repos,
        Arc::new(SystemClock),
        event_publisher(&config)?,
        lifecycle_settings(&config.business_rules),
        AuthConfig {
            secret: config.auth.jwt_secret.clone(),
        },
        rate_limit,
    );

    worker::start_expiry_sweeper(
        state.lifecycle.clone(),
        Duration::from_secs(config.business_rules.pending_hold_seconds),
        Duration::from_secs(config.business_rules.expiry_sweep_seconds.max(1)),
    );

    let app = app(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}

#[cfg(feature = "kafka")]
fn event_publisher(config: &Config) -> anyhow::Result<Arc<dyn EventPublisher>> {
    match &config.kafka.brokers {
        Some(brokers) => {
            let producer = busline_store::EventProducer::new(brokers).context("Failed to create Kafka producer")?;
            Ok(Arc::new(producer))
        }
        None => Ok(Arc::new(busline_core::events::TracingPublisher)),
    }
}

#[cfg(not(feature = "kafka"))]
fn event_publisher(config: &Config) -> anyhow::Result<Arc<dyn EventPublisher>> {
    if config.kafka.brokers.is_some() {
        tracing::warn!("Kafka brokers configured but the kafka feature is disabled; events are only logged");
    }
    Ok(Arc::new(busline_core::events::TracingPublisher))
}
