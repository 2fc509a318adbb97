//! Trainer DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::Trainer;

/// A trainer profile as exposed to callers.
#[derive(Debug, Serialize, ToSchema)]
pub struct TrainerDto {
    /// Trainer id.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Main discipline.
    pub specialty: String,
    /// Biography.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    /// Profile image URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<Trainer> for TrainerDto {
    fn from(trainer: Trainer) -> Self {
        Self {
            id: trainer.id.get(),
            name: trainer.name,
            specialty: trainer.specialty,
            bio: trainer.bio,
            image_url: trainer.image_url,
            created_at: trainer.created_at,
        }
    }
}

/// Request body for `POST /trainers/create`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTrainerRequest {
    /// Display name.
    pub name: String,
    /// Main discipline.
    pub specialty: String,
    /// Optional biography.
    #[serde(default)]
    pub bio: Option<String>,
}
