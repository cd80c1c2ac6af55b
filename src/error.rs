// src/error.rs

use std::fmt;

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;

use crate::api::payment_client::PaymentError;
use crate::engine::IneligibilityReason;

#[derive(Debug)]
pub enum ServiceError {
    /// Bad input shape: empty description, non-positive amount, unknown enum
    /// value, invalid state transition.
    Validation(String),
    /// The referenced record does not exist (or is not owned by the caller).
    NotFound(&'static str),
    /// Rescue conditions not met; carries the structured reasons.
    Ineligible(Vec<IneligibilityReason>),
    /// The payment collaborator failed or declined.
    Payment(PaymentError),
    /// Propagated persistence failure, not interpreted further.
    Database(sqlx::Error),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::Validation(msg) => write!(f, "validation error: {msg}"),
            ServiceError::NotFound(what) => write!(f, "{what} not found"),
            ServiceError::Ineligible(reasons) => {
                write!(f, "not eligible for a rescue request ({} reason(s))", reasons.len())
            }
            ServiceError::Payment(e) => write!(f, "payment error: {e}"),
            ServiceError::Database(e) => write!(f, "database error: {e}"),
        }
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(value: sqlx::Error) -> Self {
        Self::Database(value)
    }
}

impl From<PaymentError> for ServiceError {
    fn from(value: PaymentError) -> Self {
        Self::Payment(value)
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Ineligible(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::Payment(_) => StatusCode::BAD_GATEWAY,
            ServiceError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            ServiceError::Validation(msg) => {
                HttpResponse::BadRequest().json(json!({ "error": msg }))
            }
            ServiceError::NotFound(what) => {
                HttpResponse::NotFound().json(json!({ "error": format!("{what} not found") }))
            }
            ServiceError::Ineligible(reasons) => HttpResponse::UnprocessableEntity().json(json!({
                "error": "not eligible for a rescue request",
                "reasons": reasons,
            })),
            ServiceError::Payment(e) => {
                log::error!("payment collaborator error: {e}");
                HttpResponse::BadGateway().json(json!({
                    "error": "payment initiation failed",
                    "details": e.to_string(),
                }))
            }
            ServiceError::Database(e) => {
                log::error!("database error: {e}");
                HttpResponse::InternalServerError().json(json!({ "error": "internal error" }))
            }
        }
    }
}

/// Names the violated unique constraint, if the error is a unique violation.
/// Used to turn schema-enforced invariants (one subscription per service, one
/// pending request per subscription) into validation errors.
pub fn unique_violation(e: &sqlx::Error) -> Option<String> {
    let db = e.as_database_error()?;
    if db.is_unique_violation() {
        db.constraint().map(|c| c.to_string())
    } else {
        None
    }
}
