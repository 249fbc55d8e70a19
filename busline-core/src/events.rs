use async_trait::async_trait;
use busline_shared::models::events::LifecycleEvent;

/// Outbound lifecycle notifications. Delivery is best-effort: callers log
/// failures and never roll back a committed write because of them.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &LifecycleEvent) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Publisher that only traces events; used when no broker is configured.
pub struct TracingPublisher;

#[async_trait]
impl EventPublisher for TracingPublisher {
    async fn publish(&self, event: &LifecycleEvent) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        tracing::info!(topic = event.topic(), key = %event.key(), "lifecycle event");
        Ok(())
    }
}
