use std::sync::Arc;

use busline_catalog::inventory::{SeatAvailability, SeatInventory};
use busline_catalog::pricing::{PricingConfig, PricingEngine, SeatPrice};
use busline_core::booking::{Booking, BookingStatus, Passenger};
use busline_core::clock::Clock;
use busline_core::events::EventPublisher;
use busline_core::identity::CurrentUser;
use busline_core::payment::{Payment, PaymentConfirmation, PaymentMethod, PaymentOutcome, PaymentStatus};
use busline_core::repository::{BookingRepository, RedemptionClaim, TripRepository, VoucherRepository};
use busline_core::trip::{Trip, TripStatus};
use busline_core::voucher::{normalize_code, VoucherRedemption};
use busline_core::{Conflict, EngineError, EngineResult};
use busline_shared::models::events::{
    BookingCreatedEvent, BookingStatusChangedEvent, LifecycleEvent, PaymentStatusChangedEvent,
};
use busline_voucher::{AppliedVoucher, EligibilityContext, VoucherEngine};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::code::BookingCodeGenerator;
use crate::refund::RefundPolicy;

const CODE_ATTEMPTS: usize = 5;
const FAN_OUT_ATTEMPTS: usize = 3;
pub const TRIP_CANCELLED_REASON: &str = "TRIP_CANCELLED";

#[derive(Debug, Clone)]
pub struct LifecycleSettings {
    pub pricing: PricingConfig,
    pub refunds: RefundPolicy,
    pub booking_code_prefix: String,
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        Self {
            pricing: PricingConfig::default(),
            refunds: RefundPolicy::default(),
            booking_code_prefix: crate::code::DEFAULT_PREFIX.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BookingQuote {
    pub trip_id: Uuid,
    pub per_seat: Vec<SeatPrice>,
    pub subtotal: i64,
    pub voucher_code: Option<String>,
    pub discount: i64,
    pub payable: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewBooking {
    pub trip_id: Uuid,
    pub seat_numbers: Vec<String>,
    pub passenger: Passenger,
    pub voucher_code: Option<String>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CancellationResolution {
    pub approve: bool,
    #[serde(default)]
    pub should_refund: bool,
    pub note: Option<String>,
}

/// Booking and payment state machines over the repositories.
///
/// Every write is a compare-and-set on the booking version. Lifecycle events
/// are derived from the before/after pair of each write and published after
/// the write commits.
pub struct BookingLifecycle {
    trips: Arc<dyn TripRepository>,
    bookings: Arc<dyn BookingRepository>,
    vouchers: VoucherEngine,
    pricing: PricingEngine,
    refunds: RefundPolicy,
    codes: BookingCodeGenerator,
    clock: Arc<dyn Clock>,
    events: Arc<dyn EventPublisher>,
}

impl BookingLifecycle {
    pub fn new(
        trips: Arc<dyn TripRepository>,
        bookings: Arc<dyn BookingRepository>,
        vouchers: Arc<dyn VoucherRepository>,
        clock: Arc<dyn Clock>,
        events: Arc<dyn EventPublisher>,
        settings: LifecycleSettings,
    ) -> Self {
        Self {
            trips,
            bookings,
            vouchers: VoucherEngine::new(vouchers),
            pricing: PricingEngine::new(settings.pricing),
            refunds: settings.refunds,
            codes: BookingCodeGenerator::new(settings.booking_code_prefix),
            clock,
            events,
        }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn events(&self) -> &Arc<dyn EventPublisher> {
        &self.events
    }

    /// Prices a prospective booking. Reads only.
    pub async fn quote(
        &self,
        trip_id: Uuid,
        seat_numbers: &[String],
        voucher_code: Option<&str>,
        user: Option<&CurrentUser>,
    ) -> EngineResult<BookingQuote> {
        let now = self.clock.now();
        let trip = self.trips.get_trip(trip_id).await?;
        let seats = SeatInventory::validate_request(&trip.bus, seat_numbers)?;
        let fare = self.pricing.quote(&trip, &seats)?;
        let applied = self.apply_voucher(voucher_code, &trip, user, fare.subtotal, now).await?;
        let discount = applied.as_ref().map_or(0, |a| a.discount);

        Ok(BookingQuote {
            trip_id,
            per_seat: fare.per_seat,
            subtotal: fare.subtotal,
            voucher_code: applied.map(|a| a.voucher.code),
            discount,
            payable: fare.subtotal - discount,
        })
    }

    pub async fn create_booking(&self, request: NewBooking, user: Option<&CurrentUser>) -> EngineResult<Booking> {
        let now = self.clock.now();
        request.passenger.validate()?;

        let trip = self.trips.get_trip(request.trip_id).await?;
        ensure_bookable(&trip, now)?;

        let seats = SeatInventory::validate_request(&trip.bus, &request.seat_numbers)?;
        let fare = self.pricing.quote(&trip, &seats)?;
        let applied = self
            .apply_voucher(request.voucher_code.as_deref(), &trip, user, fare.subtotal, now)
            .await?;
        let discount = applied.as_ref().map_or(0, |a| a.discount);
        let payable = fare.subtotal - discount;

        let mut booking = Booking {
            id: Uuid::new_v4(),
            booking_code: String::new(),
            trip_id: trip.id,
            user_id: user.map(|u| u.id.clone()),
            passenger: request.passenger,
            seat_numbers: seats,
            total_price: fare.subtotal,
            discount_amount: discount,
            payable_amount: payable,
            voucher_code: applied.as_ref().map(|a| a.voucher.code.clone()),
            status: BookingStatus::Pending,
            cancel_reason: None,
            cancel_note: None,
            operator_note: None,
            refund_amount: None,
            payment: Payment::pending(request.payment_method, payable),
            created_at: now,
            updated_at: now,
            version: 0,
        };

        let claim = applied.map(|a| RedemptionClaim {
            redemption: VoucherRedemption {
                voucher_id: a.voucher.id,
                voucher_code: a.voucher.code.clone(),
                booking_id: booking.id,
                user_id: booking.user_id.clone(),
                discount_applied: a.discount,
                redeemed_at: now,
            },
            voucher: a.voucher,
        });

        let mut attempt = 0;
        let saved = loop {
            attempt += 1;
            let sequence = self.bookings.next_booking_sequence(now.date_naive()).await?;
            booking.booking_code = self.codes.format(now.date_naive(), sequence);

            match self.bookings.commit_booking(booking.clone(), claim.clone()).await {
                Ok(saved) => break saved,
                Err(EngineError::Conflict(Conflict::DuplicateBookingCode(code))) if attempt < CODE_ATTEMPTS => {
                    tracing::warn!(code = %code, attempt, "booking code collision, retrying");
                }
                Err(err) => return Err(err),
            }
        };

        tracing::info!(
            booking_id = %saved.id,
            booking_code = %saved.booking_code,
            trip_id = %saved.trip_id,
            seats = ?saved.seat_numbers,
            payable = saved.payable_amount,
            "booking created"
        );

        self.publish(LifecycleEvent::BookingCreated(BookingCreatedEvent {
            booking_id: saved.id,
            booking_code: saved.booking_code.clone(),
            trip_id: saved.trip_id,
            seat_numbers: saved.seat_numbers.clone(),
            payable_amount: saved.payable_amount,
            voucher_code: saved.voucher_code.clone(),
            timestamp: now.timestamp_millis(),
        }))
        .await;

        Ok(saved)
    }

    /// Applies a gateway callback. SUCCESS replays with the recorded
    /// transaction id return the booking unchanged. A payment that lands after
    /// the trip completed moves the booking straight to COMPLETED.
    pub async fn confirm_payment(&self, confirmation: PaymentConfirmation) -> EngineResult<Booking> {
        let now = self.clock.now();
        let before = self.bookings.get_booking(confirmation.booking_id).await?;
        let mut booking = before.clone();

        match confirmation.status {
            PaymentOutcome::Success => {
                if booking.payment.status == PaymentStatus::Paid
                    && booking.payment.transaction_id.as_deref() == Some(confirmation.transaction_id.as_str())
                {
                    tracing::debug!(booking_id = %booking.id, "duplicate payment confirmation ignored");
                    return Ok(booking);
                }

                booking.transition(BookingStatus::Confirmed, now)?;
                booking.transition_payment(PaymentStatus::Paid, now)?;
                if confirmation.amount != booking.payable_amount {
                    return Err(EngineError::Validation(format!(
                        "paid amount {} does not match payable amount {}",
                        confirmation.amount, booking.payable_amount
                    )));
                }
                booking.payment.transaction_id = Some(confirmation.transaction_id);
                booking.payment.paid_at = Some(now);

                // The completion fan-out already ran for this trip.
                let trip = self.trips.get_trip(booking.trip_id).await?;
                if trip.status == TripStatus::Completed {
                    booking.transition(BookingStatus::Completed, now)?;
                    tracing::info!(booking_id = %booking.id, trip_id = %trip.id, "late payment on completed trip");
                }
            }
            PaymentOutcome::Failed => {
                if booking.payment.status == PaymentStatus::Failed {
                    return Ok(booking);
                }
                booking.transition(BookingStatus::Cancelled, now)?;
                booking.transition_payment(PaymentStatus::Failed, now)?;
                booking.payment.transaction_id = Some(confirmation.transaction_id);
            }
        }

        self.persist(&before, booking, now).await
    }

    pub async fn request_cancellation(
        &self,
        booking_id: Uuid,
        reason: &str,
        note: Option<String>,
        user: Option<&CurrentUser>,
    ) -> EngineResult<Booking> {
        let now = self.clock.now();
        if reason.trim().is_empty() {
            return Err(EngineError::Validation("cancellation reason is required".into()));
        }

        let before = self.bookings.get_booking(booking_id).await?;
        ensure_owner(&before, user)?;

        let trip = self.trips.get_trip(before.trip_id).await?;
        if trip.has_departed(now) {
            return Err(EngineError::NotAllowed(format!(
                "trip {} has already departed",
                trip.id
            )));
        }

        let mut booking = before.clone();
        booking.transition(BookingStatus::CancelRequested, now)?;
        booking.cancel_reason = Some(reason.trim().to_string());
        booking.cancel_note = note;

        self.persist(&before, booking, now).await
    }

    /// Operator decision on a pending cancellation request.
    pub async fn resolve_cancellation(
        &self,
        booking_id: Uuid,
        resolution: CancellationResolution,
    ) -> EngineResult<Booking> {
        let now = self.clock.now();
        let before = self.bookings.get_booking(booking_id).await?;
        let mut booking = before.clone();

        if !resolution.approve {
            booking.transition(BookingStatus::Confirmed, now)?;
            booking.operator_note = resolution.note;
            return self.persist(&before, booking, now).await;
        }

        booking.transition(BookingStatus::Cancelled, now)?;
        booking.operator_note = resolution.note;

        match booking.payment.status {
            PaymentStatus::Paid if resolution.should_refund => {
                let trip = self.trips.get_trip(booking.trip_id).await?;
                let decision = self.refunds.decide(booking.payment.amount, trip.departure_time, now);
                booking.transition_payment(PaymentStatus::RefundPending, now)?;
                booking.refund_amount = Some(decision.amount);
                tracing::info!(
                    booking_id = %booking.id,
                    percent = decision.percent,
                    amount = decision.amount,
                    "refund decided"
                );
            }
            PaymentStatus::Pending => {
                booking.transition_payment(PaymentStatus::Cancelled, now)?;
                booking.refund_amount = Some(0);
            }
            _ => {
                booking.refund_amount = Some(0);
            }
        }

        self.persist(&before, booking, now).await
    }

    /// Marks a pending refund as paid out.
    pub async fn settle_refund(&self, booking_id: Uuid, transaction_id: Option<&str>) -> EngineResult<Booking> {
        let now = self.clock.now();
        let before = self.bookings.get_booking(booking_id).await?;
        let mut booking = before.clone();

        booking.transition_payment(PaymentStatus::Refunded, now)?;
        booking.payment.refunded_at = Some(now);
        tracing::info!(
            booking_id = %booking.id,
            refund_transaction = transaction_id.unwrap_or("-"),
            "refund settled"
        );

        self.persist(&before, booking, now).await
    }

    /// Releases an unpaid booking.
    pub async fn abandon_booking(&self, booking_id: Uuid, user: Option<&CurrentUser>) -> EngineResult<Booking> {
        let now = self.clock.now();
        let before = self.bookings.get_booking(booking_id).await?;
        ensure_owner(&before, user)?;

        let mut booking = before.clone();
        abandon(&mut booking, now)?;
        self.persist(&before, booking, now).await
    }

    /// Abandons every PENDING booking older than `hold`. Bookings that moved
    /// on concurrently are skipped. Returns how many were released.
    pub async fn expire_pending(&self, hold: Duration) -> EngineResult<usize> {
        let now = self.clock.now();
        let stale = self.bookings.list_pending_before(now - hold).await?;

        let mut released = 0;
        for before in stale {
            let mut booking = before.clone();
            if abandon(&mut booking, now).is_err() {
                continue;
            }
            match self.persist(&before, booking, now).await {
                Ok(_) => released += 1,
                Err(EngineError::Conflict(conflict)) => {
                    tracing::warn!(booking_id = %before.id, %conflict, "skipping expiry of concurrently updated booking");
                }
                Err(err) => return Err(err),
            }
        }

        if released > 0 {
            tracing::info!(released, "expired unpaid bookings");
        }
        Ok(released)
    }

    /// CONFIRMED bookings of a finished trip become COMPLETED. Idempotent.
    pub async fn complete_for_trip(&self, trip_id: Uuid) -> EngineResult<usize> {
        self.fan_out(trip_id, |booking, now| {
            if booking.status != BookingStatus::Confirmed {
                return Ok(false);
            }
            booking.transition(BookingStatus::Completed, now)?;
            Ok(true)
        })
        .await
    }

    /// Cancels every live booking of a cancelled trip. Paid tickets are
    /// refunded in full. Idempotent.
    pub async fn cancel_for_trip(&self, trip_id: Uuid) -> EngineResult<usize> {
        self.fan_out(trip_id, |booking, now| {
            if booking.status.is_terminal() {
                return Ok(false);
            }
            if booking.status == BookingStatus::Confirmed {
                booking.transition(BookingStatus::CancelRequested, now)?;
            }
            booking.transition(BookingStatus::Cancelled, now)?;
            booking.cancel_reason.get_or_insert_with(|| TRIP_CANCELLED_REASON.to_string());

            match booking.payment.status {
                PaymentStatus::Paid => {
                    booking.transition_payment(PaymentStatus::RefundPending, now)?;
                    booking.refund_amount = Some(booking.payment.amount);
                }
                PaymentStatus::Pending => {
                    booking.transition_payment(PaymentStatus::Cancelled, now)?;
                    booking.refund_amount = Some(0);
                }
                _ => {}
            }
            Ok(true)
        })
        .await
    }

    pub async fn seat_map(&self, trip_id: Uuid) -> EngineResult<Vec<SeatAvailability>> {
        let trip = self.trips.get_trip(trip_id).await?;
        let held = self.bookings.held_seats(trip_id).await?;
        Ok(SeatInventory::seat_map(&trip, &held, &self.pricing))
    }

    pub async fn get_booking(&self, booking_id: Uuid) -> EngineResult<Booking> {
        self.bookings.get_booking(booking_id).await
    }

    pub async fn find_by_code(&self, code: &str) -> EngineResult<Booking> {
        self.bookings.find_by_code(&normalize_code(code)).await
    }

    pub async fn list_for_trip(&self, trip_id: Uuid) -> EngineResult<Vec<Booking>> {
        self.bookings.list_for_trip(trip_id).await
    }

    async fn apply_voucher(
        &self,
        code: Option<&str>,
        trip: &Trip,
        user: Option<&CurrentUser>,
        subtotal: i64,
        now: DateTime<Utc>,
    ) -> EngineResult<Option<AppliedVoucher>> {
        let Some(code) = code.filter(|c| !c.trim().is_empty()) else {
            return Ok(None);
        };
        let ctx = EligibilityContext {
            user_id: user.map(|u| u.id.as_str()),
            company_id: trip.company_id,
            subtotal,
            now,
        };
        self.vouchers.apply(code, &ctx).await.map(Some)
    }

    /// Applies `change` to every booking of the trip, reloading and retrying
    /// a booking that lost a version race.
    async fn fan_out<F>(&self, trip_id: Uuid, change: F) -> EngineResult<usize>
    where
        F: Fn(&mut Booking, DateTime<Utc>) -> EngineResult<bool> + Send + Sync,
    {
        let now = self.clock.now();
        let mut updated = 0;

        for listed in self.bookings.list_for_trip(trip_id).await? {
            let mut before = listed;
            for attempt in 1..=FAN_OUT_ATTEMPTS {
                let mut booking = before.clone();
                if !change(&mut booking, now)? {
                    break;
                }
                match self.persist(&before, booking, now).await {
                    Ok(_) => {
                        updated += 1;
                        break;
                    }
                    Err(err @ EngineError::Conflict(_)) if attempt == FAN_OUT_ATTEMPTS => return Err(err),
                    Err(EngineError::Conflict(_)) => {
                        before = self.bookings.get_booking(before.id).await?;
                    }
                    Err(err) => return Err(err),
                }
            }
        }

        tracing::info!(%trip_id, updated, "trip bookings updated");
        Ok(updated)
    }

    async fn persist(&self, before: &Booking, after: Booking, now: DateTime<Utc>) -> EngineResult<Booking> {
        let saved = self.bookings.update_booking(&after, before.version).await?;

        if before.status != saved.status {
            tracing::info!(
                booking_id = %saved.id,
                from = %before.status,
                to = %saved.status,
                "booking status changed"
            );
            self.publish(LifecycleEvent::BookingStatusChanged(BookingStatusChangedEvent {
                booking_id: saved.id,
                trip_id: saved.trip_id,
                from: before.status.to_string(),
                to: saved.status.to_string(),
                timestamp: now.timestamp_millis(),
            }))
            .await;
        }

        if before.payment.status != saved.payment.status {
            tracing::info!(
                booking_id = %saved.id,
                from = %before.payment.status,
                to = %saved.payment.status,
                "payment status changed"
            );
            self.publish(LifecycleEvent::PaymentStatusChanged(PaymentStatusChangedEvent {
                booking_id: saved.id,
                payment_id: saved.payment.id,
                from: before.payment.status.to_string(),
                to: saved.payment.status.to_string(),
                amount: saved.payment.amount,
                refund_amount: saved.refund_amount,
                timestamp: now.timestamp_millis(),
            }))
            .await;
        }

        Ok(saved)
    }

    async fn publish(&self, event: LifecycleEvent) {
        if let Err(e) = self.events.publish(&event).await {
            tracing::warn!(topic = event.topic(), key = %event.key(), "failed to publish lifecycle event: {}", e);
        }
    }
}

fn ensure_bookable(trip: &Trip, now: DateTime<Utc>) -> EngineResult<()> {
    if trip.status != TripStatus::Scheduled {
        return Err(EngineError::NotAllowed(format!(
            "trip {} is {} and no longer open for booking",
            trip.id, trip.status
        )));
    }
    if trip.has_departed(now) {
        return Err(EngineError::NotAllowed(format!(
            "trip {} has already departed",
            trip.id
        )));
    }
    Ok(())
}

/// Bookings made by a signed-in customer can only be seen or changed by that
/// customer or an operator. Guest bookings are addressed by id or code alone.
pub fn ensure_owner(booking: &Booking, user: Option<&CurrentUser>) -> EngineResult<()> {
    match (&booking.user_id, user) {
        (None, _) => Ok(()),
        (Some(_), Some(u)) if u.is_operator() => Ok(()),
        (Some(owner), Some(u)) if *owner == u.id => Ok(()),
        _ => Err(EngineError::NotAllowed(format!(
            "booking {} belongs to another customer",
            booking.id
        ))),
    }
}

fn abandon(booking: &mut Booking, now: DateTime<Utc>) -> EngineResult<()> {
    booking.transition(BookingStatus::Cancelled, now)?;
    booking.transition_payment(PaymentStatus::Cancelled, now)?;
    booking.refund_amount = Some(0);
    Ok(())
}
