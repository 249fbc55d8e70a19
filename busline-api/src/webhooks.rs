use axum::{extract::State, routing::post, Json, Router};
use busline_core::booking::Booking;
use busline_core::payment::PaymentConfirmation;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/webhooks/payments", post(handle_payment_webhook))
}

/// POST /v1/webhooks/payments
/// Gateway callback for a booking's payment. Replays are safe.
pub async fn handle_payment_webhook(
    State(state): State<AppState>,
    Json(payload): Json<PaymentConfirmation>,
) -> Result<Json<Booking>, AppError> {
    tracing::info!(
        booking_id = %payload.booking_id,
        transaction_id = %payload.transaction_id,
        status = ?payload.status,
        "Received payment webhook"
    );
    Ok(Json(state.lifecycle.confirm_payment(payload).await?))
}
