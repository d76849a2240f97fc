//! Unified API error handling
//!
//! Provides consistent error responses across all endpoints. The workflow
//! variants mirror the RFQ lifecycle faults so callers can branch on the
//! `code` field without parsing messages.

#![allow(dead_code)]

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Itinerary locked: {0}")]
    ItineraryLocked(String),

    #[error("Empty itinerary: {0}")]
    EmptyItinerary(String),

    #[error("Duplicate RFQ: {0}")]
    DuplicateRfq(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("RFQ expired: {0}")]
    RfqExpired(String),

    #[error("Duplicate quote: {0}")]
    DuplicateQuote(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("Database error")]
    Database(#[from] sqlx::Error),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl ApiError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn access_denied(msg: impl Into<String>) -> Self {
        Self::AccessDenied(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn invalid_transition(msg: impl Into<String>) -> Self {
        Self::InvalidTransition(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(anyhow::anyhow!(msg.into()))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::AccessDenied(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::InvalidState(_)
            | Self::ItineraryLocked(_)
            | Self::EmptyItinerary(_)
            | Self::DuplicateRfq(_)
            | Self::InvalidTransition(_)
            | Self::RfqExpired(_)
            | Self::DuplicateQuote(_) => StatusCode::CONFLICT,
            Self::Internal(_) | Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::AccessDenied(_) => "ACCESS_DENIED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidState(_) => "INVALID_STATE",
            Self::ItineraryLocked(_) => "ITINERARY_LOCKED",
            Self::EmptyItinerary(_) => "EMPTY_ITINERARY",
            Self::DuplicateRfq(_) => "DUPLICATE_RFQ",
            Self::InvalidTransition(_) => "INVALID_TRANSITION",
            Self::RfqExpired(_) => "RFQ_EXPIRED",
            Self::DuplicateQuote(_) => "DUPLICATE_QUOTE",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    fn public_message(&self) -> String {
        match self {
            Self::Unauthorized(msg)
            | Self::AccessDenied(msg)
            | Self::NotFound(msg)
            | Self::Validation(msg)
            | Self::InvalidState(msg)
            | Self::ItineraryLocked(msg)
            | Self::EmptyItinerary(msg)
            | Self::DuplicateRfq(msg)
            | Self::InvalidTransition(msg)
            | Self::RfqExpired(msg)
            | Self::DuplicateQuote(msg) => msg.clone(),
            // Don't leak internal error details
            Self::Internal(_) | Self::Database(_) => "An internal error occurred".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Log internal errors
        match &self {
            Self::Internal(e) => {
                tracing::error!(error = ?e, "Internal server error");
            }
            Self::Database(e) => {
                tracing::error!(error = ?e, "Database error");
            }
            _ => {
                tracing::warn!(error = %self, "API error");
            }
        }

        let status = self.status_code();
        let body = ErrorResponse {
            code: self.error_code().to_string(),
            message: self.public_message(),
            request_id: None, // Will be populated by middleware if available
        };

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workflow_codes_are_conflicts() {
        for err in [
            ApiError::ItineraryLocked("x".into()),
            ApiError::EmptyItinerary("x".into()),
            ApiError::DuplicateRfq("x".into()),
            ApiError::InvalidTransition("x".into()),
            ApiError::RfqExpired("x".into()),
            ApiError::DuplicateQuote("x".into()),
        ] {
            assert_eq!(err.status_code(), StatusCode::CONFLICT);
        }
    }

    #[test]
    fn test_codes_are_distinct() {
        let codes = [
            ApiError::unauthorized("x").error_code(),
            ApiError::access_denied("x").error_code(),
            ApiError::not_found("x").error_code(),
            ApiError::validation("x").error_code(),
            ApiError::invalid_state("x").error_code(),
            ApiError::ItineraryLocked("x".into()).error_code(),
            ApiError::EmptyItinerary("x".into()).error_code(),
            ApiError::DuplicateRfq("x".into()).error_code(),
            ApiError::invalid_transition("x").error_code(),
            ApiError::RfqExpired("x".into()).error_code(),
            ApiError::DuplicateQuote("x".into()).error_code(),
        ];
        for (i, a) in codes.iter().enumerate() {
            for b in codes.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_internal_message_is_opaque() {
        let err = ApiError::internal("connection string leaked");
        assert_eq!(err.public_message(), "An internal error occurred");
    }
}
