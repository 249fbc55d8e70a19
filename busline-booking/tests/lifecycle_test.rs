use std::sync::Arc;

use busline_booking::{BookingLifecycle, CancellationResolution, LifecycleSettings, NewBooking, TripProgress};
use busline_core::booking::{Booking, BookingStatus, Passenger};
use busline_core::clock::FixedClock;
use busline_core::identity::{CurrentUser, Role};
use busline_core::payment::{PaymentConfirmation, PaymentMethod, PaymentOutcome, PaymentStatus};
use busline_core::repository::BookingRepository;
use busline_core::trip::{BusLayout, Seat, SeatType, Trip, TripStatus};
use busline_core::voucher::{DiscountType, Voucher, VoucherRejection};
use busline_core::{Conflict, EngineError};
use busline_shared::models::events::topics;
use busline_shared::Masked;
use busline_store::{MemoryStore, RecordingPublisher};
use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;

struct Harness {
    store: Arc<MemoryStore>,
    clock: Arc<FixedClock>,
    events: Arc<RecordingPublisher>,
    lifecycle: Arc<BookingLifecycle>,
    progress: TripProgress,
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 16, 8, 0, 0).unwrap()
}

fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(FixedClock::new(t0()));
    let events = Arc::new(RecordingPublisher::new());
    let lifecycle = Arc::new(BookingLifecycle::new(
        store.clone(),
        store.clone(),
        store.clone(),
        clock.clone(),
        events.clone(),
        LifecycleSettings::default(),
    ));
    let progress = TripProgress::new(store.clone(), lifecycle.clone());
    Harness {
        store,
        clock,
        events,
        lifecycle,
        progress,
    }
}

fn trip(departs_in: Duration) -> Trip {
    let mut seats = vec![Seat::new("01", SeatType::Standard), Seat::new("02", SeatType::Vip)];
    for n in 3..=10 {
        seats.push(Seat::new(format!("{:02}", n), SeatType::Standard));
    }
    let departure = t0() + departs_in;
    Trip {
        id: Uuid::new_v4(),
        company_id: Uuid::new_v4(),
        departure_location: "Ha Noi".into(),
        arrival_location: "Ninh Binh".into(),
        departure_time: departure,
        arrival_time: departure + Duration::hours(2),
        base_price: 100_000,
        bus: BusLayout::new(Uuid::new_v4(), seats),
        status: TripStatus::Scheduled,
        version: 0,
    }
}

fn voucher(code: &str, discount_type: DiscountType, value: i64) -> Voucher {
    Voucher {
        id: Uuid::new_v4(),
        code: code.into(),
        discount_type,
        discount_value: value,
        min_order_value: None,
        max_discount: None,
        usage_limit: None,
        usage_per_user: None,
        start_date: None,
        end_date: None,
        company_scope: None,
        is_active: true,
    }
}

fn request(trip_id: Uuid, seats: &[&str], voucher_code: Option<&str>) -> NewBooking {
    NewBooking {
        trip_id,
        seat_numbers: seats.iter().map(|s| s.to_string()).collect(),
        passenger: Passenger {
            name: "Pham Thi D".into(),
            phone: Masked::new("0903111222".into()),
            email: Some(Masked::new("d@example.com".into())),
        },
        voucher_code: voucher_code.map(str::to_string),
        payment_method: PaymentMethod::Vnpay,
    }
}

fn customer(id: &str) -> CurrentUser {
    CurrentUser {
        id: id.into(),
        role: Role::Customer,
    }
}

async fn paid_booking(h: &Harness, trip_id: Uuid, seats: &[&str]) -> Booking {
    let booking = h.lifecycle.create_booking(request(trip_id, seats, None), None).await.unwrap();
    h.lifecycle
        .confirm_payment(PaymentConfirmation {
            booking_id: booking.id,
            transaction_id: format!("TX-{}", booking.booking_code),
            amount: booking.payable_amount,
            status: PaymentOutcome::Success,
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn test_amount_voucher_checkout() {
    let h = harness();
    let t = trip(Duration::hours(48));
    h.store.seed_trip(t.clone()).await.unwrap();
    let mut flat = voucher("GIAM50K", DiscountType::Amount, 50_000);
    flat.min_order_value = Some(100_000);
    h.store.seed_voucher(flat).await.unwrap();

    let quote = h.lifecycle.quote(t.id, &["01".into(), "02".into()], Some("giam50k"), None).await.unwrap();
    assert_eq!((quote.subtotal, quote.discount, quote.payable), (220_000, 50_000, 170_000));
    // Quoting reserves nothing.
    assert!(h.store.held_seats(t.id).await.unwrap().is_empty());
    assert!(h.store.redemptions().await.is_empty());

    let booking = h
        .lifecycle
        .create_booking(request(t.id, &["02", "01"], Some("GIAM50K")), None)
        .await
        .unwrap();
    assert_eq!(booking.seat_numbers, vec!["01".to_string(), "02".to_string()]);
    assert_eq!(booking.total_price, 220_000);
    assert_eq!(booking.discount_amount, 50_000);
    assert_eq!(booking.payable_amount, 170_000);
    assert_eq!(booking.payment.amount, 170_000);
    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(booking.payment.status, PaymentStatus::Pending);
    assert_eq!(booking.booking_code, "BK2610160001");
    assert_eq!(h.store.redemptions().await.len(), 1);
    assert_eq!(h.events.topics(), vec![topics::BOOKING_CREATED]);
}

#[tokio::test]
async fn test_percent_voucher_is_capped() {
    let h = harness();
    let t = trip(Duration::hours(48));
    h.store.seed_trip(t.clone()).await.unwrap();
    let mut pct = voucher("TET20", DiscountType::Percent, 20);
    pct.max_discount = Some(30_000);
    h.store.seed_voucher(pct).await.unwrap();

    let booking = h
        .lifecycle
        .create_booking(request(t.id, &["01", "02"], Some("TET20")), None)
        .await
        .unwrap();
    assert_eq!(booking.discount_amount, 30_000);
    assert_eq!(booking.payable_amount, 190_000);
}

#[tokio::test]
async fn test_voucher_rejections_surface_as_policy_errors() {
    let h = harness();
    let t = trip(Duration::hours(48));
    h.store.seed_trip(t.clone()).await.unwrap();
    let mut scoped = voucher("OTHERCO", DiscountType::Amount, 10_000);
    scoped.company_scope = Some(Uuid::new_v4());
    h.store.seed_voucher(scoped).await.unwrap();

    let err = h
        .lifecycle
        .create_booking(request(t.id, &["01"], Some("OTHERCO")), None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Policy(VoucherRejection::WrongCompany)));

    let err = h
        .lifecycle
        .create_booking(request(t.id, &["01"], Some("MISSING")), None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound { .. }));
    assert!(h.store.held_seats(t.id).await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reservations_have_one_winner() {
    let h = harness();
    let t = trip(Duration::hours(48));
    h.store.seed_trip(t.clone()).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..16 {
        let lifecycle = h.lifecycle.clone();
        let trip_id = t.id;
        handles.push(tokio::spawn(async move {
            lifecycle.create_booking(request(trip_id, &["01", "03"], None), None).await
        }));
    }

    let mut won = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => won += 1,
            Err(EngineError::Conflict(Conflict::SeatsTaken(seats))) => assert!(!seats.is_empty()),
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(won, 1);

    let bookings = h.lifecycle.list_for_trip(t.id).await.unwrap();
    assert_eq!(bookings.len(), 1);
    let codes: std::collections::HashSet<_> = bookings.iter().map(|b| b.booking_code.clone()).collect();
    assert_eq!(codes.len(), bookings.len());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_single_use_voucher_race() {
    let h = harness();
    let t = trip(Duration::hours(48));
    h.store.seed_trip(t.clone()).await.unwrap();
    let mut once = voucher("ONCE", DiscountType::Amount, 20_000);
    once.usage_limit = Some(1);
    h.store.seed_voucher(once).await.unwrap();

    let a = {
        let lifecycle = h.lifecycle.clone();
        let trip_id = t.id;
        tokio::spawn(async move { lifecycle.create_booking(request(trip_id, &["04"], Some("ONCE")), None).await })
    };
    let b = {
        let lifecycle = h.lifecycle.clone();
        let trip_id = t.id;
        tokio::spawn(async move { lifecycle.create_booking(request(trip_id, &["05"], Some("ONCE")), None).await })
    };

    let results = [a.await.unwrap(), b.await.unwrap()];
    let discounted = results.iter().filter(|r| matches!(r, Ok(b) if b.discount_amount == 20_000)).count();
    let rejected = results
        .iter()
        .filter(|r| matches!(r, Err(EngineError::Policy(VoucherRejection::UsageLimitReached))))
        .count();
    assert_eq!((discounted, rejected), (1, 1));
    assert_eq!(h.store.redemptions().await.len(), 1);
}

#[tokio::test]
async fn test_payment_confirmation_rules() {
    let h = harness();
    let t = trip(Duration::hours(48));
    h.store.seed_trip(t.clone()).await.unwrap();
    let booking = h.lifecycle.create_booking(request(t.id, &["01"], None), None).await.unwrap();

    let short = PaymentConfirmation {
        booking_id: booking.id,
        transaction_id: "TX1".into(),
        amount: 99_999,
        status: PaymentOutcome::Success,
    };
    assert!(matches!(h.lifecycle.confirm_payment(short).await, Err(EngineError::Validation(_))));

    let ok = PaymentConfirmation {
        booking_id: booking.id,
        transaction_id: "TX1".into(),
        amount: 100_000,
        status: PaymentOutcome::Success,
    };
    let confirmed = h.lifecycle.confirm_payment(ok.clone()).await.unwrap();
    assert_eq!(confirmed.status, BookingStatus::Confirmed);
    assert_eq!(confirmed.payment.status, PaymentStatus::Paid);
    assert_eq!(confirmed.payment.paid_at, Some(t0()));

    let replay = h.lifecycle.confirm_payment(ok).await.unwrap();
    assert_eq!(replay.version, confirmed.version);
}

#[tokio::test]
async fn test_failed_payment_releases_seats() {
    let h = harness();
    let t = trip(Duration::hours(48));
    h.store.seed_trip(t.clone()).await.unwrap();
    let booking = h.lifecycle.create_booking(request(t.id, &["01"], None), None).await.unwrap();

    let failed = h
        .lifecycle
        .confirm_payment(PaymentConfirmation {
            booking_id: booking.id,
            transaction_id: "TX-FAIL".into(),
            amount: booking.payable_amount,
            status: PaymentOutcome::Failed,
        })
        .await
        .unwrap();
    assert_eq!(failed.status, BookingStatus::Cancelled);
    assert_eq!(failed.payment.status, PaymentStatus::Failed);
    assert!(h.store.held_seats(t.id).await.unwrap().is_empty());

    h.lifecycle.create_booking(request(t.id, &["01"], None), None).await.unwrap();
}

#[tokio::test]
async fn test_cancellation_ten_hours_out_refunds_half() {
    let h = harness();
    let t = trip(Duration::hours(10));
    h.store.seed_trip(t.clone()).await.unwrap();
    let booking = paid_booking(&h, t.id, &["01", "02"]).await;

    let requested = h
        .lifecycle
        .request_cancellation(booking.id, "change of plans", Some("family event".into()), None)
        .await
        .unwrap();
    assert_eq!(requested.status, BookingStatus::CancelRequested);
    assert_eq!(requested.cancel_reason.as_deref(), Some("change of plans"));
    // Still holding seats until resolved.
    assert_eq!(h.store.held_seats(t.id).await.unwrap().len(), 2);

    let resolved = h
        .lifecycle
        .resolve_cancellation(
            booking.id,
            CancellationResolution {
                approve: true,
                should_refund: true,
                note: Some("approved".into()),
            },
        )
        .await
        .unwrap();
    assert_eq!(resolved.status, BookingStatus::Cancelled);
    assert_eq!(resolved.payment.status, PaymentStatus::RefundPending);
    assert_eq!(resolved.refund_amount, Some(110_000));
    assert!(h.store.held_seats(t.id).await.unwrap().is_empty());

    let settled = h.lifecycle.settle_refund(booking.id, Some("RF-1")).await.unwrap();
    assert_eq!(settled.payment.status, PaymentStatus::Refunded);
    assert_eq!(settled.payment.refunded_at, Some(t0()));

    let err = h.lifecycle.settle_refund(booking.id, None).await.unwrap_err();
    assert!(matches!(err, EngineError::IllegalState { .. }));
}

#[tokio::test]
async fn test_rejected_cancellation_returns_to_confirmed() {
    let h = harness();
    let t = trip(Duration::hours(48));
    h.store.seed_trip(t.clone()).await.unwrap();
    let booking = paid_booking(&h, t.id, &["03"]).await;

    h.lifecycle.request_cancellation(booking.id, "sick", None, None).await.unwrap();
    let rejected = h
        .lifecycle
        .resolve_cancellation(
            booking.id,
            CancellationResolution {
                approve: false,
                should_refund: false,
                note: Some("ticket is non-refundable".into()),
            },
        )
        .await
        .unwrap();
    assert_eq!(rejected.status, BookingStatus::Confirmed);
    assert_eq!(rejected.payment.status, PaymentStatus::Paid);
    assert_eq!(rejected.operator_note.as_deref(), Some("ticket is non-refundable"));
}

#[tokio::test]
async fn test_approval_without_refund_keeps_payment() {
    let h = harness();
    let t = trip(Duration::hours(48));
    h.store.seed_trip(t.clone()).await.unwrap();
    let booking = paid_booking(&h, t.id, &["03"]).await;

    h.lifecycle.request_cancellation(booking.id, "sick", None, None).await.unwrap();
    let resolved = h
        .lifecycle
        .resolve_cancellation(
            booking.id,
            CancellationResolution {
                approve: true,
                should_refund: false,
                note: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(resolved.status, BookingStatus::Cancelled);
    assert_eq!(resolved.payment.status, PaymentStatus::Paid);
    assert_eq!(resolved.refund_amount, Some(0));
}

#[tokio::test]
async fn test_illegal_transitions_and_time_windows() {
    let h = harness();
    let t = trip(Duration::hours(3));
    h.store.seed_trip(t.clone()).await.unwrap();
    let pending = h.lifecycle.create_booking(request(t.id, &["01"], None), None).await.unwrap();

    // Only confirmed bookings can ask to cancel.
    let err = h.lifecycle.request_cancellation(pending.id, "x", None, None).await.unwrap_err();
    assert!(matches!(err, EngineError::IllegalState { .. }));

    let err = h.lifecycle.request_cancellation(pending.id, "   ", None, None).await.unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let paid = paid_booking(&h, t.id, &["02"]).await;
    h.clock.advance(Duration::hours(4));
    let err = h.lifecycle.request_cancellation(paid.id, "late", None, None).await.unwrap_err();
    assert!(matches!(err, EngineError::NotAllowed(_)));

    let err = h.lifecycle.create_booking(request(t.id, &["05"], None), None).await.unwrap_err();
    assert!(matches!(err, EngineError::NotAllowed(_)));

    let err = h.lifecycle.abandon_booking(paid.id, None).await.unwrap_err();
    assert!(matches!(err, EngineError::IllegalState { .. }));
}

#[tokio::test]
async fn test_customer_bookings_are_private() {
    let h = harness();
    let t = trip(Duration::hours(48));
    h.store.seed_trip(t.clone()).await.unwrap();
    let owner = customer("cust-1");
    let booking = h
        .lifecycle
        .create_booking(request(t.id, &["06"], None), Some(&owner))
        .await
        .unwrap();
    assert_eq!(booking.user_id.as_deref(), Some("cust-1"));

    let err = h.lifecycle.abandon_booking(booking.id, Some(&customer("cust-2"))).await.unwrap_err();
    assert!(matches!(err, EngineError::NotAllowed(_)));
    let err = h.lifecycle.abandon_booking(booking.id, None).await.unwrap_err();
    assert!(matches!(err, EngineError::NotAllowed(_)));

    let abandoned = h.lifecycle.abandon_booking(booking.id, Some(&owner)).await.unwrap();
    assert_eq!(abandoned.status, BookingStatus::Cancelled);
    assert_eq!(abandoned.payment.status, PaymentStatus::Cancelled);

    let found = h.lifecycle.find_by_code(&booking.booking_code.to_lowercase()).await.unwrap();
    assert_eq!(found.id, booking.id);
}

#[tokio::test]
async fn test_expire_pending_releases_old_unpaid_bookings() {
    let h = harness();
    let t = trip(Duration::hours(48));
    h.store.seed_trip(t.clone()).await.unwrap();
    let old = h.lifecycle.create_booking(request(t.id, &["01"], None), None).await.unwrap();
    let paid = paid_booking(&h, t.id, &["02"]).await;

    h.clock.advance(Duration::minutes(10));
    let fresh = h.lifecycle.create_booking(request(t.id, &["03"], None), None).await.unwrap();

    h.clock.advance(Duration::minutes(6));
    let released = h.lifecycle.expire_pending(Duration::minutes(15)).await.unwrap();
    assert_eq!(released, 1);

    assert_eq!(h.lifecycle.get_booking(old.id).await.unwrap().status, BookingStatus::Cancelled);
    assert_eq!(h.lifecycle.get_booking(paid.id).await.unwrap().status, BookingStatus::Confirmed);
    assert_eq!(h.lifecycle.get_booking(fresh.id).await.unwrap().status, BookingStatus::Pending);

    let seats = h.lifecycle.seat_map(t.id).await.unwrap();
    let available = |n: &str| seats.iter().find(|s| s.seat_number == n).map(|s| s.available);
    assert_eq!(available("01"), Some(true));
    assert_eq!(available("02"), Some(false));
    assert_eq!(seats.iter().find(|s| s.seat_number == "02").map(|s| s.price), Some(120_000));
}

#[tokio::test]
async fn test_trip_completion_fans_out() {
    let h = harness();
    let t = trip(Duration::hours(1));
    h.store.seed_trip(t.clone()).await.unwrap();
    let paid = paid_booking(&h, t.id, &["01"]).await;
    let unpaid = h.lifecycle.create_booking(request(t.id, &["02"], None), None).await.unwrap();

    h.clock.advance(Duration::hours(1));
    h.progress.advance_trip_status(t.id, TripStatus::InProgress, None).await.unwrap();
    let report = h.progress.file_incident_report(t.id, "flat tyre near Phu Ly").await.unwrap();
    assert_eq!(h.progress.incidents(t.id).await.unwrap(), vec![report]);

    let done = h
        .progress
        .advance_trip_status(t.id, TripStatus::Completed, Some("arrived".into()))
        .await
        .unwrap();
    assert_eq!(done.status, TripStatus::Completed);
    assert_eq!(done.version, 2);

    assert_eq!(h.lifecycle.get_booking(paid.id).await.unwrap().status, BookingStatus::Completed);
    assert_eq!(h.lifecycle.get_booking(unpaid.id).await.unwrap().status, BookingStatus::Pending);
    assert_eq!(h.lifecycle.complete_for_trip(t.id).await.unwrap(), 0);

    let log = h.progress.status_log(t.id).await.unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!((log[1].from, log[1].to), (TripStatus::InProgress, TripStatus::Completed));

    let err = h.progress.advance_trip_status(t.id, TripStatus::InProgress, None).await.unwrap_err();
    assert!(matches!(err, EngineError::IllegalState { .. }));
    let err = h.progress.file_incident_report(t.id, "after arrival").await.unwrap_err();
    assert!(matches!(err, EngineError::NotAllowed(_)));
}

#[tokio::test]
async fn test_trip_cancellation_refunds_everyone() {
    let h = harness();
    let t = trip(Duration::hours(2));
    h.store.seed_trip(t.clone()).await.unwrap();
    let paid = paid_booking(&h, t.id, &["01", "02"]).await;
    let unpaid = h.lifecycle.create_booking(request(t.id, &["03"], None), None).await.unwrap();

    let err = h.progress.file_incident_report(t.id, "  ").await.unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    h.progress
        .advance_trip_status(t.id, TripStatus::Cancelled, Some("road closed".into()))
        .await
        .unwrap();

    let paid = h.lifecycle.get_booking(paid.id).await.unwrap();
    assert_eq!(paid.status, BookingStatus::Cancelled);
    assert_eq!(paid.payment.status, PaymentStatus::RefundPending);
    assert_eq!(paid.refund_amount, Some(220_000));

    let unpaid = h.lifecycle.get_booking(unpaid.id).await.unwrap();
    assert_eq!(unpaid.status, BookingStatus::Cancelled);
    assert_eq!(unpaid.payment.status, PaymentStatus::Cancelled);

    assert!(h.store.held_seats(t.id).await.unwrap().is_empty());
    assert!(h.events.topics().contains(&topics::TRIP_STATUS));
}

async fn approve_refund_at(h: &Harness, t: &Trip, seat: &str, before_departure: Duration) -> Booking {
    let booking = paid_booking(h, t.id, &[seat]).await;
    h.lifecycle.request_cancellation(booking.id, "cannot travel", None, None).await.unwrap();
    h.clock.set(t.departure_time - before_departure);
    h.lifecycle
        .resolve_cancellation(
            booking.id,
            CancellationResolution {
                approve: true,
                should_refund: true,
                note: None,
            },
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn test_refund_tier_boundaries_on_approval() {
    let h = harness();
    let t = trip(Duration::hours(48));
    h.store.seed_trip(t.clone()).await.unwrap();

    let full = approve_refund_at(&h, &t, "03", Duration::hours(24)).await;
    assert_eq!(full.payment.status, PaymentStatus::RefundPending);
    assert_eq!(full.refund_amount, Some(100_000));

    h.clock.set(t0());
    let half = approve_refund_at(&h, &t, "04", Duration::hours(24) - Duration::minutes(1)).await;
    assert_eq!(half.payment.status, PaymentStatus::RefundPending);
    assert_eq!(half.refund_amount, Some(50_000));

    h.clock.set(t0());
    let none = approve_refund_at(&h, &t, "05", Duration::hours(6) - Duration::minutes(1)).await;
    assert_eq!(none.status, BookingStatus::Cancelled);
    assert_eq!(none.payment.status, PaymentStatus::RefundPending);
    assert_eq!(none.refund_amount, Some(0));

    let settled = h.lifecycle.settle_refund(none.id, None).await.unwrap();
    assert_eq!(settled.payment.status, PaymentStatus::Refunded);
}

#[tokio::test]
async fn test_late_payment_on_completed_trip_completes_booking() {
    let h = harness();
    let t = trip(Duration::hours(1));
    h.store.seed_trip(t.clone()).await.unwrap();
    let unpaid = h.lifecycle.create_booking(request(t.id, &["02"], None), None).await.unwrap();

    h.clock.advance(Duration::hours(1));
    h.progress.advance_trip_status(t.id, TripStatus::InProgress, None).await.unwrap();
    h.clock.advance(Duration::hours(2));
    h.progress.advance_trip_status(t.id, TripStatus::Completed, None).await.unwrap();
    assert_eq!(h.lifecycle.get_booking(unpaid.id).await.unwrap().status, BookingStatus::Pending);

    let late = h
        .lifecycle
        .confirm_payment(PaymentConfirmation {
            booking_id: unpaid.id,
            transaction_id: "TX-LATE".into(),
            amount: unpaid.payable_amount,
            status: PaymentOutcome::Success,
        })
        .await
        .unwrap();
    assert_eq!(late.status, BookingStatus::Completed);
    assert_eq!(late.payment.status, PaymentStatus::Paid);
    assert!(h.store.held_seats(t.id).await.unwrap().is_empty());

    let statuses: Vec<_> = h
        .lifecycle
        .list_for_trip(t.id)
        .await
        .unwrap()
        .into_iter()
        .map(|b| b.status)
        .collect();
    assert!(!statuses.contains(&BookingStatus::Confirmed));
}
