//! Row types read back from PostgreSQL.
//!
//! Thin `FromRow` structs, converted into domain types at the
//! persistence boundary. Role strings are validated during conversion so
//! a corrupted row surfaces as a [`StoreError`] instead of leaking
//! through the domain layer.
//!
//! [`StoreError`]: super::StoreError

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::contracts::StoreError;
use crate::domain::{
    Booking, BookingId, ClassId, FitnessClass, Member, MemberId, Package, PackageId, Role,
    Subscription, SubscriptionId, Trainer, TrainerId,
};

/// A row from `members`, including the password hash.
#[derive(Debug, FromRow)]
pub struct MemberRow {
    /// Primary key.
    pub id: i64,
    /// First name.
    pub name: String,
    /// Last name.
    pub last_name: Option<String>,
    /// Phone number.
    pub phone: Option<String>,
    /// Login email.
    pub email: String,
    /// Argon2 PHC hash.
    pub password_hash: String,
    /// Role storage string.
    pub role: String,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}

impl MemberRow {
    /// Converts into the domain [`Member`], dropping the password hash.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] when the stored role string is
    /// not recognized.
    pub fn into_member(self) -> Result<Member, StoreError> {
        let role: Role = self
            .role
            .parse()
            .map_err(|e: crate::domain::member::UnknownRole| StoreError::Database(e.to_string()))?;
        Ok(Member {
            id: MemberId::new(self.id),
            name: self.name,
            last_name: self.last_name,
            phone: self.phone,
            email: self.email,
            role,
            created_at: self.created_at,
        })
    }
}

/// A row from `trainers`.
#[derive(Debug, FromRow)]
pub struct TrainerRow {
    /// Primary key.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Main discipline.
    pub specialty: String,
    /// Biography.
    pub bio: Option<String>,
    /// Profile image URL.
    pub image_url: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<TrainerRow> for Trainer {
    fn from(row: TrainerRow) -> Self {
        Self {
            id: TrainerId::new(row.id),
            name: row.name,
            specialty: row.specialty,
            bio: row.bio,
            image_url: row.image_url,
            created_at: row.created_at,
        }
    }
}

/// A row from `packages`.
#[derive(Debug, FromRow)]
pub struct PackageRow {
    /// Primary key.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Current price.
    pub price: f64,
    /// Subscription length in days.
    pub duration_days: i32,
    /// Purchase gate.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<PackageRow> for Package {
    fn from(row: PackageRow) -> Self {
        Self {
            id: PackageId::new(row.id),
            name: row.name,
            description: row.description,
            price: row.price,
            duration_days: row.duration_days,
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

/// A row from `member_packages`.
#[derive(Debug, FromRow)]
pub struct SubscriptionRow {
    /// Primary key.
    pub id: i64,
    /// Owning member.
    pub member_id: i64,
    /// Source package, if still in the catalog.
    pub package_id: Option<i64>,
    /// Name snapshot.
    pub name: String,
    /// Price snapshot.
    pub price: f64,
    /// Window start, inclusive.
    pub start_date: DateTime<Utc>,
    /// Window end, inclusive.
    pub end_date: DateTime<Utc>,
    /// Purchase timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<SubscriptionRow> for Subscription {
    fn from(row: SubscriptionRow) -> Self {
        Self {
            id: SubscriptionId::new(row.id),
            member_id: MemberId::new(row.member_id),
            package_id: row.package_id.map(PackageId::new),
            name: row.name,
            price: row.price,
            start_date: row.start_date,
            end_date: row.end_date,
            created_at: row.created_at,
        }
    }
}

/// A row from `classes`.
#[derive(Debug, FromRow)]
pub struct ClassRow {
    /// Primary key.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Scheduled start.
    pub schedule: DateTime<Utc>,
    /// Seat limit.
    pub capacity: i32,
    /// Booking gate.
    pub is_active: bool,
    /// Assigned trainer.
    pub trainer_id: Option<i64>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<ClassRow> for FitnessClass {
    fn from(row: ClassRow) -> Self {
        Self {
            id: ClassId::new(row.id),
            name: row.name,
            description: row.description,
            schedule: row.schedule,
            capacity: row.capacity,
            is_active: row.is_active,
            trainer_id: row.trainer_id.map(TrainerId::new),
            created_at: row.created_at,
        }
    }
}

/// A row from `bookings`.
#[derive(Debug, FromRow)]
pub struct BookingRow {
    /// Primary key.
    pub id: i64,
    /// Member holding the seat.
    pub member_id: i64,
    /// Booked class.
    pub class_id: i64,
    /// Reservation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<BookingRow> for Booking {
    fn from(row: BookingRow) -> Self {
        Self {
            id: BookingId::new(row.id),
            member_id: MemberId::new(row.member_id),
            class_id: ClassId::new(row.class_id),
            created_at: row.created_at,
        }
    }
}
