//! Booking rows linking members to classes.

use chrono::{DateTime, Utc};

use super::{BookingId, ClassId, FitnessClass, MemberId};

/// One reserved seat: the pair `(member_id, class_id)` is unique.
///
/// Created only through the admission transaction; deleted only by its
/// owning member.
#[derive(Debug, Clone)]
pub struct Booking {
    /// Row id.
    pub id: BookingId,
    /// Member holding the seat.
    pub member_id: MemberId,
    /// Booked class.
    pub class_id: ClassId,
    /// When the seat was reserved.
    pub created_at: DateTime<Utc>,
}

/// A booking joined with its class, as served by the member's booking
/// list.
#[derive(Debug, Clone)]
pub struct BookingWithClass {
    /// The booking row.
    pub booking: Booking,
    /// The class it reserves a seat in.
    pub class: FitnessClass,
}
