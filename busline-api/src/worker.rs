use std::sync::Arc;
use std::time::Duration;

use busline_booking::BookingLifecycle;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Periodically releases unpaid bookings older than `hold`.
pub fn start_expiry_sweeper(lifecycle: Arc<BookingLifecycle>, hold: Duration, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(hold_secs = hold.as_secs(), every_secs = every.as_secs(), "Expiry sweeper started");
        let hold = chrono::Duration::seconds(hold.as_secs() as i64);
        let mut ticker = tokio::time::interval(every);

        loop {
            ticker.tick().await;
            if let Err(e) = lifecycle.expire_pending(hold).await {
                error!("Expiry sweep failed: {}", e);
            }
        }
    })
}
