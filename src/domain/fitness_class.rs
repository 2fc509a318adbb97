//! Scheduled fitness classes.

use chrono::{DateTime, Utc};

use super::{ClassId, Trainer, TrainerId};

/// A scheduled class that members can book into.
///
/// `capacity` is the hard seat limit the admission transaction protects:
/// the number of booking rows for a class must never exceed it.
#[derive(Debug, Clone)]
pub struct FitnessClass {
    /// Class id.
    pub id: ClassId,
    /// Display name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Scheduled start instant. Booking closes once this has passed.
    pub schedule: DateTime<Utc>,
    /// Maximum number of seats. Always positive.
    pub capacity: i32,
    /// Admin gate on new bookings; `false` hides the class from booking.
    pub is_active: bool,
    /// Assigned trainer, if any.
    pub trainer_id: Option<TrainerId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl FitnessClass {
    /// Whether the scheduled start has already passed at `now`.
    #[must_use]
    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        self.schedule <= now
    }

    /// Whether `booked` committed seats exhaust the capacity.
    #[must_use]
    pub fn is_full(&self, booked: i64) -> bool {
        booked >= i64::from(self.capacity)
    }
}

/// A class joined with its trainer and current booking count, as served
/// by the public catalog listing.
#[derive(Debug, Clone)]
pub struct ClassDetails {
    /// The class itself.
    pub class: FitnessClass,
    /// Assigned trainer, resolved.
    pub trainer: Option<Trainer>,
    /// Number of committed bookings.
    pub booked_count: i64,
}

/// Data for creating a new class.
#[derive(Debug, Clone)]
pub struct NewClass {
    /// Display name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Scheduled start instant.
    pub schedule: DateTime<Utc>,
    /// Seat limit.
    pub capacity: i32,
    /// Optional trainer assignment.
    pub trainer_id: Option<TrainerId>,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn class_at(schedule: &str, capacity: i32) -> FitnessClass {
        let Ok(schedule) = schedule.parse::<DateTime<Utc>>() else {
            panic!("bad schedule in fixture");
        };
        FitnessClass {
            id: ClassId::new(1),
            name: "Spin".to_string(),
            description: None,
            schedule,
            capacity,
            is_active: true,
            trainer_id: None,
            created_at: schedule,
        }
    }

    #[test]
    fn has_started_treats_exact_start_as_started() {
        let class = class_at("2024-06-01T18:00:00Z", 10);
        assert!(class.has_started(class.schedule));
        assert!(!class.has_started(class.schedule - chrono::Duration::seconds(1)));
    }

    #[test]
    fn is_full_at_capacity() {
        let class = class_at("2024-06-01T18:00:00Z", 2);
        assert!(!class.is_full(1));
        assert!(class.is_full(2));
        assert!(class.is_full(3));
    }
}
