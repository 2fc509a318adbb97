//! API error types with HTTP status code mapping.
//!
//! [`ApiError`] is the central error type for the server. Each variant
//! maps to a specific HTTP status code and structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 4005,
///     "message": "class is full",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges on [`ApiError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category                  | HTTP Status                |
/// |-----------|---------------------------|----------------------------|
/// | 1000–1999 | Validation / auth         | 400 / 401 / 403            |
/// | 2000–2999 | Not found / conflicts     | 404 / 400                  |
/// | 3000–3999 | Server                    | 500 Internal Server Error  |
/// | 4000–4999 | Booking business outcomes | 400 / 403                  |
///
/// Booking business outcomes are terminal: the caller must re-decide,
/// nothing in this range is ever retried by the server.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Request validation failed (malformed id, missing field, bad value).
    #[error("invalid request: {0}")]
    InvalidInput(String),

    /// Login failed. Deliberately does not say whether the account exists.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// No `Authorization: Bearer` token was supplied.
    #[error("authentication required")]
    Unauthenticated,

    /// The supplied token is malformed, tampered with, or expired.
    #[error("invalid or expired token")]
    InvalidToken,

    /// The caller is authenticated but lacks the admin role.
    #[error("admin access required")]
    AdminOnly,

    /// A referenced resource does not exist (admin CRUD targets).
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Registration with an email that is already taken.
    #[error("email already registered")]
    EmailTaken,

    /// The member has no subscription covering the current instant.
    #[error("an active membership package is required to book classes")]
    NoActiveMembership,

    /// The member already holds an unexpired subscription.
    #[error("an unexpired membership package already exists")]
    SubscriptionActive,

    /// The class does not exist or is closed for booking.
    #[error("class not found or closed for booking")]
    ClassUnavailable,

    /// The class's scheduled start has already passed.
    #[error("cannot book a class that has already started")]
    ClassInPast,

    /// Every seat in the class is taken.
    #[error("class is full")]
    ClassFull,

    /// The member already holds a booking for this class.
    #[error("class already booked")]
    AlreadyBooked,

    /// Cancellation of a booking that does not exist or belongs to
    /// someone else. The two cases are indistinguishable on purpose.
    #[error("not allowed")]
    NotAllowed,

    /// Persistence failure after all transparent retries, or any other
    /// unexpected store condition. Detail is logged, not returned.
    #[error("storage error")]
    StoreFailure,

    /// Internal server error.
    #[error("internal error")]
    Internal,
}

impl ApiError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidInput(_) => 1001,
            Self::InvalidCredentials => 1002,
            Self::Unauthenticated => 1003,
            Self::InvalidToken => 1004,
            Self::AdminOnly => 1005,
            Self::NotFound(_) => 2001,
            Self::EmailTaken => 2002,
            Self::NoActiveMembership => 4001,
            Self::SubscriptionActive => 4002,
            Self::ClassUnavailable => 4003,
            Self::ClassInPast => 4004,
            Self::ClassFull => 4005,
            Self::AlreadyBooked => 4006,
            Self::NotAllowed => 4007,
            Self::StoreFailure => 3001,
            Self::Internal => 3000,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_)
            | Self::EmailTaken
            | Self::SubscriptionActive
            | Self::ClassUnavailable
            | Self::ClassInPast
            | Self::ClassFull
            | Self::AlreadyBooked => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials | Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::InvalidToken | Self::AdminOnly | Self::NoActiveMembership | Self::NotAllowed => {
                StatusCode::FORBIDDEN
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::StoreFailure | Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<crate::domain::InvalidId> for ApiError {
    fn from(err: crate::domain::InvalidId) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn booking_outcomes_are_client_errors() {
        assert_eq!(ApiError::ClassFull.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::AlreadyBooked.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::NoActiveMembership.status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(ApiError::NotAllowed.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn error_codes_are_distinct() {
        let variants = [
            ApiError::InvalidInput(String::new()),
            ApiError::InvalidCredentials,
            ApiError::Unauthenticated,
            ApiError::InvalidToken,
            ApiError::AdminOnly,
            ApiError::NotFound("class"),
            ApiError::EmailTaken,
            ApiError::NoActiveMembership,
            ApiError::SubscriptionActive,
            ApiError::ClassUnavailable,
            ApiError::ClassInPast,
            ApiError::ClassFull,
            ApiError::AlreadyBooked,
            ApiError::NotAllowed,
            ApiError::StoreFailure,
            ApiError::Internal,
        ];
        let mut codes: Vec<u32> = variants.iter().map(ApiError::error_code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), variants.len());
    }

    #[test]
    fn store_failure_hides_detail() {
        assert_eq!(ApiError::StoreFailure.to_string(), "storage error");
    }
}
