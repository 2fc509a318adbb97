//! Trainer profiles.

use chrono::{DateTime, Utc};

use super::TrainerId;

/// A trainer that can be assigned to classes.
#[derive(Debug, Clone)]
pub struct Trainer {
    /// Trainer id.
    pub id: TrainerId,
    /// Display name.
    pub name: String,
    /// Main discipline (e.g. "Yoga", "HIIT").
    pub specialty: String,
    /// Free-form biography.
    pub bio: Option<String>,
    /// Profile image URL.
    pub image_url: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Data for creating a new trainer.
#[derive(Debug, Clone)]
pub struct NewTrainer {
    /// Display name.
    pub name: String,
    /// Main discipline.
    pub specialty: String,
    /// Optional biography.
    pub bio: Option<String>,
}
