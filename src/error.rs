use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::models::order::OrderStatus;

/// Business-rule violations are expected outcomes a caller branches on;
/// `Internal` is reserved for infrastructure failures (audit store down,
/// bind errors) and always aborts the mutation that triggered it.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("illegal transition: {from:?} -> {to:?}")]
    IllegalTransition { from: OrderStatus, to: OrderStatus },

    #[error("missing proof of delivery: {0}")]
    MissingProofOfDelivery(String),

    #[error("concurrent modification: {0}")]
    ConcurrentModification(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable code, shared between single-call error bodies
    /// and per-item bulk outcomes.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "not_found",
            AppError::Validation(_) => "validation_error",
            AppError::Forbidden(_) => "forbidden",
            AppError::IllegalTransition { .. } => "illegal_transition",
            AppError::MissingProofOfDelivery(_) => "missing_proof_of_delivery",
            AppError::ConcurrentModification(_) => "concurrent_modification",
            AppError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::IllegalTransition { .. } => StatusCode::CONFLICT,
            AppError::MissingProofOfDelivery(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::ConcurrentModification(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string(),
            "code": self.code(),
        }));

        (status, body).into_response()
    }
}
