//! Booking DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::class_dto::ClassDto;
use crate::domain::BookingWithClass;

/// Request body for `POST /bookings`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBookingRequest {
    /// Class to reserve a seat in.
    pub class_id: i64,
}

/// A booking with its class snapshot, as served by the member's list.
#[derive(Debug, Serialize, ToSchema)]
pub struct BookingDto {
    /// Booking id.
    pub id: i64,
    /// Booked class id.
    pub class_id: i64,
    /// Reservation timestamp.
    pub created_at: DateTime<Utc>,
    /// The booked class.
    pub class: ClassDto,
}

impl From<BookingWithClass> for BookingDto {
    fn from(joined: BookingWithClass) -> Self {
        Self {
            id: joined.booking.id.get(),
            class_id: joined.booking.class_id.get(),
            created_at: joined.booking.created_at,
            class: joined.class.into(),
        }
    }
}
