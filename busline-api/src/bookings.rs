use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use busline_booking::lifecycle::ensure_owner;
use busline_booking::{CancellationResolution, NewBooking};
use busline_core::booking::Booking;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::auth::{MaybeUser, Operator};
use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings", post(create_booking))
        .route("/v1/bookings/{id}", get(get_booking))
        .route("/v1/bookings/code/{code}", get(find_by_code))
        .route("/v1/bookings/{id}/cancellation", post(request_cancellation))
        .route("/v1/bookings/{id}/cancellation/resolve", post(resolve_cancellation))
        .route("/v1/bookings/{id}/abandon", post(abandon_booking))
        .route("/v1/bookings/{id}/refund/settle", post(settle_refund))
}

#[derive(Debug, Deserialize)]
pub struct CancellationRequest {
    pub reason: String,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct SettleRefundRequest {
    pub transaction_id: Option<String>,
}

async fn create_booking(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Json(req): Json<NewBooking>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let booking = state.lifecycle.create_booking(req, user.as_ref()).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    MaybeUser(user): MaybeUser,
) -> Result<Json<Booking>, AppError> {
    let booking = state.lifecycle.get_booking(id).await?;
    ensure_owner(&booking, user.as_ref())?;
    Ok(Json(booking))
}

async fn find_by_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
    MaybeUser(user): MaybeUser,
) -> Result<Json<Booking>, AppError> {
    let booking = state.lifecycle.find_by_code(&code).await?;
    ensure_owner(&booking, user.as_ref())?;
    Ok(Json(booking))
}

async fn request_cancellation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    MaybeUser(user): MaybeUser,
    Json(req): Json<CancellationRequest>,
) -> Result<Json<Booking>, AppError> {
    let booking = state
        .lifecycle
        .request_cancellation(id, &req.reason, req.note, user.as_ref())
        .await?;
    Ok(Json(booking))
}

async fn resolve_cancellation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Operator(operator): Operator,
    Json(req): Json<CancellationResolution>,
) -> Result<Json<Booking>, AppError> {
    info!(booking_id = %id, operator = %operator.id, approve = req.approve, "resolving cancellation");
    Ok(Json(state.lifecycle.resolve_cancellation(id, req).await?))
}

async fn abandon_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    MaybeUser(user): MaybeUser,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.lifecycle.abandon_booking(id, user.as_ref()).await?))
}

async fn settle_refund(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    _operator: Operator,
    body: Option<Json<SettleRefundRequest>>,
) -> Result<Json<Booking>, AppError> {
    let req = body.map(|Json(b)| b).unwrap_or_default();
    Ok(Json(state.lifecycle.settle_refund(id, req.transaction_id.as_deref()).await?))
}
