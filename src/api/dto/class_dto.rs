//! Class catalog DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::trainer_dto::TrainerDto;
use crate::domain::{ClassDetails, FitnessClass};

/// Request body for `POST /classes`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateClassRequest {
    /// Display name.
    pub name: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Scheduled start instant (must be in the future).
    pub schedule: DateTime<Utc>,
    /// Seat limit (must be positive).
    pub capacity: i32,
    /// Optional trainer assignment.
    #[serde(default)]
    pub trainer_id: Option<i64>,
}

/// A class as exposed to callers.
#[derive(Debug, Serialize, ToSchema)]
pub struct ClassDto {
    /// Class id.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Scheduled start.
    pub schedule: DateTime<Utc>,
    /// Seat limit.
    pub capacity: i32,
    /// Whether booking is open.
    pub is_active: bool,
    /// Assigned trainer id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trainer_id: Option<i64>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<FitnessClass> for ClassDto {
    fn from(class: FitnessClass) -> Self {
        Self {
            id: class.id.get(),
            name: class.name,
            description: class.description,
            schedule: class.schedule,
            capacity: class.capacity,
            is_active: class.is_active,
            trainer_id: class.trainer_id.map(|t| t.get()),
            created_at: class.created_at,
        }
    }
}

/// A class with its trainer and live booking count, as served by the
/// public listing.
#[derive(Debug, Serialize, ToSchema)]
pub struct ClassDetailsDto {
    /// The class.
    #[serde(flatten)]
    pub class: ClassDto,
    /// Resolved trainer profile.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trainer: Option<TrainerDto>,
    /// Number of committed bookings.
    pub booked_count: i64,
}

impl From<ClassDetails> for ClassDetailsDto {
    fn from(details: ClassDetails) -> Self {
        Self {
            class: details.class.into(),
            trainer: details.trainer.map(TrainerDto::from),
            booked_count: details.booked_count,
        }
    }
}
