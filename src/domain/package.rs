//! Purchasable membership packages.

use chrono::{DateTime, Utc};

use super::PackageId;

/// A membership package offered in the catalog.
///
/// Packages are templates: purchasing one creates a
/// [`Subscription`](super::Subscription) row that snapshots the name and
/// price at purchase time, so later catalog edits never rewrite history.
#[derive(Debug, Clone)]
pub struct Package {
    /// Package id.
    pub id: PackageId,
    /// Display name.
    pub name: String,
    /// Marketing description.
    pub description: Option<String>,
    /// Price at the current point in time.
    pub price: f64,
    /// Subscription length granted by one purchase.
    pub duration_days: i32,
    /// Whether the package can currently be purchased.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Data for creating a new package.
#[derive(Debug, Clone)]
pub struct NewPackage {
    /// Display name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Price.
    pub price: f64,
    /// Subscription length in days.
    pub duration_days: i32,
}
