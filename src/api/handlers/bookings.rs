//! Booking endpoint handlers: reserve, list, cancel.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{delete, post};
use axum::{Json, Router};
use chrono::Utc;

use crate::api::dto::{BookingDto, CreateBookingRequest, MessageResponse};
use crate::app_state::AppState;
use crate::auth::CurrentMember;
use crate::domain::{BookingId, ClassId};
use crate::error::{ApiError, ErrorResponse};

/// `POST /bookings` — Reserve a seat in a class.
///
/// # Errors
///
/// Returns [`ApiError`] with a distinct code for every admission
/// failure: invalid id, no active membership, class unavailable, class
/// in the past, class full, or already booked.
#[utoipa::path(
    post,
    path = "/api/v1/bookings",
    tag = "Bookings",
    summary = "Book a class",
    description = "Reserves a seat for the authenticated member. Requires an active membership package; capacity is enforced atomically so a class can never be oversold.",
    request_body = CreateBookingRequest,
    responses(
        (status = 200, description = "Seat reserved", body = MessageResponse),
        (status = 400, description = "Invalid id, class unavailable, in the past, full, or already booked", body = ErrorResponse),
        (status = 403, description = "No active membership package", body = ErrorResponse),
    )
)]
pub async fn create_booking(
    State(state): State<AppState>,
    member: CurrentMember,
    Json(req): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let class_id = ClassId::try_from(req.class_id)?;

    state
        .admission
        .attempt_booking(member.id, class_id, Utc::now())
        .await?;

    Ok(Json(MessageResponse::new("Booked successfully")))
}

/// `GET /bookings` — The authenticated member's bookings, newest first.
///
/// # Errors
///
/// Returns [`ApiError::StoreFailure`] on store trouble.
#[utoipa::path(
    get,
    path = "/api/v1/bookings",
    tag = "Bookings",
    summary = "List own bookings",
    description = "Returns the authenticated member's bookings with their class snapshots, most recent first.",
    responses(
        (status = 200, description = "Booking list", body = Vec<BookingDto>),
        (status = 401, description = "Missing token", body = ErrorResponse),
    )
)]
pub async fn list_bookings(
    State(state): State<AppState>,
    member: CurrentMember,
) -> Result<impl IntoResponse, ApiError> {
    let bookings = state.admission.bookings_for_member(member.id).await?;
    let dtos: Vec<BookingDto> = bookings.into_iter().map(BookingDto::from).collect();
    Ok(Json(dtos))
}

/// `DELETE /bookings/:id` — Cancel an own booking.
///
/// # Errors
///
/// Returns [`ApiError::NotAllowed`] when the booking does not exist or
/// belongs to another member.
#[utoipa::path(
    delete,
    path = "/api/v1/bookings/{id}",
    tag = "Bookings",
    summary = "Cancel a booking",
    description = "Deletes a booking owned by the authenticated member. Missing and foreign bookings fail identically.",
    params(
        ("id" = i64, Path, description = "Booking id"),
    ),
    responses(
        (status = 200, description = "Booking cancelled", body = MessageResponse),
        (status = 403, description = "Booking missing or owned by someone else", body = ErrorResponse),
    )
)]
pub async fn cancel_booking(
    State(state): State<AppState>,
    member: CurrentMember,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let booking_id = BookingId::try_from(id)?;

    state.admission.cancel_booking(member.id, booking_id).await?;

    Ok(Json(MessageResponse::new("Cancelled")))
}

/// Booking routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bookings", post(create_booking).get(list_bookings))
        .route("/bookings/{id}", delete(cancel_booking))
}
