//! Package and subscription DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Package, Subscription};

/// A catalog package as exposed to callers.
#[derive(Debug, Serialize, ToSchema)]
pub struct PackageDto {
    /// Package id.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Current price.
    pub price: f64,
    /// Subscription length granted by one purchase.
    pub duration_days: i32,
    /// Whether the package can currently be purchased.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<Package> for PackageDto {
    fn from(package: Package) -> Self {
        Self {
            id: package.id.get(),
            name: package.name,
            description: package.description,
            price: package.price,
            duration_days: package.duration_days,
            is_active: package.is_active,
            created_at: package.created_at,
        }
    }
}

/// A package with its subscriber count, for the admin listing.
#[derive(Debug, Serialize, ToSchema)]
pub struct PackageWithMembersDto {
    /// The package.
    #[serde(flatten)]
    pub package: PackageDto,
    /// Number of subscription rows referencing it.
    pub member_count: i64,
}

/// Request body for `POST /packages`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePackageRequest {
    /// Display name.
    pub name: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Price.
    pub price: f64,
    /// Subscription length in days (must be positive).
    pub duration_days: i32,
}

/// Request body for `POST /packages/subscribe`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SubscribeRequest {
    /// Catalog package to purchase.
    pub package_id: i64,
}

/// A purchased subscription as exposed to callers.
#[derive(Debug, Serialize, ToSchema)]
pub struct SubscriptionDto {
    /// Subscription row id.
    pub id: i64,
    /// Owning member.
    pub member_id: i64,
    /// Source package, if still in the catalog.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_id: Option<i64>,
    /// Package name at purchase time.
    pub name: String,
    /// Price paid.
    pub price: f64,
    /// Window start, inclusive.
    pub start_date: DateTime<Utc>,
    /// Window end, inclusive.
    pub end_date: DateTime<Utc>,
    /// Purchase timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<Subscription> for SubscriptionDto {
    fn from(sub: Subscription) -> Self {
        Self {
            id: sub.id.get(),
            member_id: sub.member_id.get(),
            package_id: sub.package_id.map(|p| p.get()),
            name: sub.name,
            price: sub.price,
            start_date: sub.start_date,
            end_date: sub.end_date,
            created_at: sub.created_at,
        }
    }
}
