use std::sync::Arc;

use busline_core::repository::TripRepository;
use busline_core::trip::{IncidentReport, Trip, TripStatus, TripStatusLogEntry};
use busline_core::{EngineError, EngineResult};
use busline_shared::models::events::{LifecycleEvent, TripStatusChangedEvent};
use uuid::Uuid;

use crate::lifecycle::BookingLifecycle;

/// Driver-operated trip state machine.
pub struct TripProgress {
    trips: Arc<dyn TripRepository>,
    lifecycle: Arc<BookingLifecycle>,
}

impl TripProgress {
    pub fn new(trips: Arc<dyn TripRepository>, lifecycle: Arc<BookingLifecycle>) -> Self {
        Self { trips, lifecycle }
    }

    /// Moves the trip forward and logs the change in the same write.
    ///
    /// Completion and cancellation are then fanned out to the trip's bookings.
    /// A failed fan-out is logged but does not undo the trip transition; both
    /// fan-outs are idempotent and can be re-run.
    pub async fn advance_trip_status(
        &self,
        trip_id: Uuid,
        next: TripStatus,
        note: Option<String>,
    ) -> EngineResult<Trip> {
        let now = self.lifecycle.clock().now();
        let trip = self.trips.get_trip(trip_id).await?;
        if !trip.status.can_transition_to(next) {
            return Err(EngineError::illegal("trip", trip.status, next));
        }

        let entry = TripStatusLogEntry {
            trip_id,
            from: trip.status,
            to: next,
            note: note.clone(),
            changed_at: now,
        };
        let updated = self.trips.update_trip_status(trip_id, trip.version, entry).await?;
        tracing::info!(%trip_id, from = %trip.status, to = %next, "trip status changed");

        let event = LifecycleEvent::TripStatusChanged(TripStatusChangedEvent {
            trip_id,
            from: trip.status.to_string(),
            to: next.to_string(),
            note,
            timestamp: now.timestamp_millis(),
        });
        if let Err(e) = self.lifecycle.events().publish(&event).await {
            tracing::warn!(%trip_id, "failed to publish trip status event: {}", e);
        }

        let fan_out = match next {
            TripStatus::Completed => Some(self.lifecycle.complete_for_trip(trip_id).await),
            TripStatus::Cancelled => Some(self.lifecycle.cancel_for_trip(trip_id).await),
            _ => None,
        };
        if let Some(Err(e)) = fan_out {
            tracing::error!(%trip_id, status = %next, "booking fan-out failed: {}", e);
        }

        Ok(updated)
    }

    pub async fn file_incident_report(&self, trip_id: Uuid, note: &str) -> EngineResult<IncidentReport> {
        let now = self.lifecycle.clock().now();
        if note.trim().is_empty() {
            return Err(EngineError::Validation("incident note is required".into()));
        }

        let trip = self.trips.get_trip(trip_id).await?;
        if trip.status.is_terminal() {
            return Err(EngineError::NotAllowed(format!(
                "trip {} is {}; incidents can no longer be filed",
                trip_id, trip.status
            )));
        }

        let report = IncidentReport {
            id: Uuid::new_v4(),
            trip_id,
            note: note.trim().to_string(),
            reported_at: now,
        };
        self.trips.add_incident(&report).await?;
        tracing::warn!(%trip_id, incident_id = %report.id, "incident reported");
        Ok(report)
    }

    pub async fn status_log(&self, trip_id: Uuid) -> EngineResult<Vec<TripStatusLogEntry>> {
        self.trips.status_log(trip_id).await
    }

    pub async fn incidents(&self, trip_id: Uuid) -> EngineResult<Vec<IncidentReport>> {
        self.trips.incidents(trip_id).await
    }
}
