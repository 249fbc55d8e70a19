use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use busline_booking::BookingQuote;
use busline_catalog::inventory::SeatAvailability;
use busline_core::booking::Booking;
use busline_core::trip::{IncidentReport, Trip, TripStatus, TripStatusLogEntry};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::{Driver, MaybeUser, Operator};
use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/trips/{trip_id}/quote", post(quote))
        .route("/v1/trips/{trip_id}/seats", get(seat_map))
        .route("/v1/trips/{trip_id}/bookings", get(list_bookings))
        .route("/v1/trips/{trip_id}/status", post(advance_status))
        .route("/v1/trips/{trip_id}/status-log", get(status_log))
        .route("/v1/trips/{trip_id}/incidents", post(file_incident).get(list_incidents))
}

#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    pub seat_numbers: Vec<String>,
    pub voucher_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AdvanceStatusRequest {
    pub status: TripStatus,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IncidentRequest {
    pub note: String,
}

async fn quote(
    State(state): State<AppState>,
    Path(trip_id): Path<Uuid>,
    MaybeUser(user): MaybeUser,
    Json(req): Json<QuoteRequest>,
) -> Result<Json<BookingQuote>, AppError> {
    let quote = state
        .lifecycle
        .quote(trip_id, &req.seat_numbers, req.voucher_code.as_deref(), user.as_ref())
        .await?;
    Ok(Json(quote))
}

async fn seat_map(
    State(state): State<AppState>,
    Path(trip_id): Path<Uuid>,
) -> Result<Json<Vec<SeatAvailability>>, AppError> {
    Ok(Json(state.lifecycle.seat_map(trip_id).await?))
}

async fn list_bookings(
    State(state): State<AppState>,
    Path(trip_id): Path<Uuid>,
    _operator: Operator,
) -> Result<Json<Vec<Booking>>, AppError> {
    Ok(Json(state.lifecycle.list_for_trip(trip_id).await?))
}

async fn advance_status(
    State(state): State<AppState>,
    Path(trip_id): Path<Uuid>,
    Driver(driver): Driver,
    Json(req): Json<AdvanceStatusRequest>,
) -> Result<Json<Trip>, AppError> {
    tracing::info!(%trip_id, driver = %driver.id, status = %req.status, "trip status update requested");
    let trip = state.progress.advance_trip_status(trip_id, req.status, req.note).await?;
    Ok(Json(trip))
}

async fn status_log(
    State(state): State<AppState>,
    Path(trip_id): Path<Uuid>,
) -> Result<Json<Vec<TripStatusLogEntry>>, AppError> {
    Ok(Json(state.progress.status_log(trip_id).await?))
}

async fn file_incident(
    State(state): State<AppState>,
    Path(trip_id): Path<Uuid>,
    _driver: Driver,
    Json(req): Json<IncidentRequest>,
) -> Result<(StatusCode, Json<IncidentReport>), AppError> {
    let report = state.progress.file_incident_report(trip_id, &req.note).await?;
    Ok((StatusCode::CREATED, Json(report)))
}

async fn list_incidents(
    State(state): State<AppState>,
    Path(trip_id): Path<Uuid>,
    _operator: Operator,
) -> Result<Json<Vec<IncidentReport>>, AppError> {
    Ok(Json(state.progress.incidents(trip_id).await?))
}
