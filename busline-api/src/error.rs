use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use busline_core::{Conflict, EngineError};
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    AuthorizationError(String),
    Engine(EngineError),
    InternalServerError(String),
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        Self::Engine(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let err = match self {
            AppError::AuthenticationError(msg) => {
                return (StatusCode::UNAUTHORIZED, Json(json!({ "error": msg, "kind": "UNAUTHENTICATED" }))).into_response();
            }
            AppError::AuthorizationError(msg) => {
                return (StatusCode::FORBIDDEN, Json(json!({ "error": msg, "kind": "FORBIDDEN" }))).into_response();
            }
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                return internal_error();
            }
            AppError::Engine(err) => err,
        };

        let status = match &err {
            EngineError::Validation(_) => StatusCode::BAD_REQUEST,
            EngineError::Conflict(_) => StatusCode::CONFLICT,
            EngineError::NotFound { .. } => StatusCode::NOT_FOUND,
            EngineError::IllegalState { .. } | EngineError::NotAllowed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            EngineError::Policy(_) => StatusCode::UNPROCESSABLE_ENTITY,
            EngineError::Storage(msg) => {
                tracing::error!("Storage failure: {}", msg);
                return internal_error();
            }
        };

        let mut body = json!({
            "error": err.to_string(),
            "kind": err.kind(),
            "retryable": err.is_retryable(),
        });
        match &err {
            EngineError::Policy(rejection) => {
                body["reason"] = json!(rejection.code());
                body["detail"] = json!(rejection);
            }
            EngineError::Conflict(Conflict::SeatsTaken(seats)) => {
                body["reason"] = json!("SEATS_TAKEN");
                body["seats"] = json!(seats);
            }
            _ => {}
        }

        (status, Json(body)).into_response()
    }
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Internal Server Error", "kind": "STORAGE", "retryable": false })),
    )
        .into_response()
}
