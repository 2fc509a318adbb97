//! Store contracts consumed by the service layer.
//!
//! The admission controller never talks to a concrete database; it is
//! handed these trait objects. Production wires in the PostgreSQL
//! implementation, the test-suite substitutes the in-memory one, and the
//! concurrency guarantees are expressed purely in terms of the
//! [`AdmissionTx`] contract.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    Booking, BookingId, BookingWithClass, ClassDetails, ClassId, FitnessClass, MemberId, NewClass,
    NewPackage, NewSubscription, Package, PackageId, Subscription,
};

/// Low-level persistence failure, classified for retry decisions.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A concurrency collision: serialization failure, deadlock abort,
    /// or lock wait timeout. Safe to retry the whole transaction.
    #[error("transient store conflict: {0}")]
    Transient(String),

    /// A unique constraint rejected the write.
    #[error("duplicate row: {0}")]
    Duplicate(String),

    /// Any other database failure. Not retryable.
    #[error("database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            match db.code().as_deref() {
                // serialization_failure, deadlock_detected, lock_not_available
                Some("40001") | Some("40P01") | Some("55P03") => {
                    return Self::Transient(db.to_string());
                }
                // unique_violation
                Some("23505") => return Self::Duplicate(db.to_string()),
                _ => {}
            }
        }
        Self::Database(err.to_string())
    }
}

impl From<StoreError> for crate::error::ApiError {
    fn from(err: StoreError) -> Self {
        tracing::error!(error = %err, "store operation failed");
        Self::StoreFailure
    }
}

/// Subscription store: validity queries and purchase inserts.
///
/// `find_active_subscription` is the membership gate for booking; it is a
/// pure read with no side effect.
#[async_trait]
pub trait MembershipLedger: Send + Sync + fmt::Debug {
    /// Returns a subscription whose inclusive `[start_date, end_date]`
    /// window contains `at`, preferring the one expiring last.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    async fn find_active_subscription(
        &self,
        member_id: MemberId,
        at: DateTime<Utc>,
    ) -> Result<Option<Subscription>, StoreError>;

    /// Returns any subscription with `end_date >= at`, including windows
    /// that have not opened yet. This is the purchase gate's view.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    async fn find_unexpired_subscription(
        &self,
        member_id: MemberId,
        at: DateTime<Utc>,
    ) -> Result<Option<Subscription>, StoreError>;

    /// Inserts a new subscription row and returns it.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    async fn insert_subscription(
        &self,
        sub: NewSubscription,
    ) -> Result<Subscription, StoreError>;

    /// All of a member's subscriptions, most recent purchase first.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    async fn subscriptions_for_member(
        &self,
        member_id: MemberId,
    ) -> Result<Vec<Subscription>, StoreError>;
}

/// Package catalog store.
#[async_trait]
pub trait PackageCatalog: Send + Sync + fmt::Debug {
    /// Looks up a package by id.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    async fn find_package(&self, id: PackageId) -> Result<Option<Package>, StoreError>;

    /// Active packages only, cheapest first.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    async fn list_active_packages(&self) -> Result<Vec<Package>, StoreError>;

    /// Every package with its subscriber count, cheapest first.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    async fn list_all_packages(&self) -> Result<Vec<(Package, i64)>, StoreError>;

    /// Creates a new package, active by default.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    async fn insert_package(&self, pkg: NewPackage) -> Result<Package, StoreError>;

    /// Deletes a package. Returns `false` when no such row existed.
    /// Existing subscription rows keep their snapshots.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    async fn delete_package(&self, id: PackageId) -> Result<bool, StoreError>;
}

/// Class catalog store.
#[async_trait]
pub trait ClassCatalog: Send + Sync + fmt::Debug {
    /// All classes with trainer and booking count, earliest schedule first.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    async fn list_classes(&self) -> Result<Vec<ClassDetails>, StoreError>;

    /// Looks up a class by id, without locking.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    async fn find_class(&self, id: ClassId) -> Result<Option<FitnessClass>, StoreError>;

    /// Creates a new class, active by default.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    async fn insert_class(&self, class: NewClass) -> Result<FitnessClass, StoreError>;

    /// Sets the booking gate on a class, returning the updated row, or
    /// `None` when no such class exists.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    async fn set_class_active(
        &self,
        id: ClassId,
        active: bool,
    ) -> Result<Option<FitnessClass>, StoreError>;

    /// Deletes a class and, through the schema, its bookings. Returns
    /// `false` when no such row existed.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    async fn delete_class(&self, id: ClassId) -> Result<bool, StoreError>;
}

/// Booking store, including the admission transaction entry point.
#[async_trait]
pub trait BookingLedger: Send + Sync + fmt::Debug {
    /// Opens the transaction bracketing one admission decision.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the transaction cannot be opened.
    async fn begin_admission(&self) -> Result<Box<dyn AdmissionTx>, StoreError>;

    /// Looks up a booking by id.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    async fn find_booking(&self, id: BookingId) -> Result<Option<Booking>, StoreError>;

    /// Deletes a booking row. Deletion only ever lowers a class's booked
    /// count, so no transaction is required.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    async fn delete_booking(&self, id: BookingId) -> Result<(), StoreError>;

    /// A member's bookings joined with their classes, newest first.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    async fn bookings_for_member(
        &self,
        member_id: MemberId,
    ) -> Result<Vec<BookingWithClass>, StoreError>;
}

/// Scoped handle over one admission transaction.
///
/// The handle brackets the check-then-insert sequence: the class row is
/// locked by [`class_with_booking_count`], so the count observed there
/// stays consistent with concurrently committing bookings until
/// [`commit`]. Dropping the handle without committing rolls everything
/// back — no partial booking row can survive an abandoned admission.
///
/// [`class_with_booking_count`]: AdmissionTx::class_with_booking_count
/// [`commit`]: AdmissionTx::commit
#[async_trait]
pub trait AdmissionTx: Send {
    /// Loads the class row and its committed booking count, taking an
    /// exclusive lock on the class row for the lifetime of the
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure; a lock wait timeout
    /// classifies as [`StoreError::Transient`].
    async fn class_with_booking_count(
        &mut self,
        class_id: ClassId,
    ) -> Result<Option<(FitnessClass, i64)>, StoreError>;

    /// Whether the member already holds a booking for the class.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    async fn booking_exists(
        &mut self,
        member_id: MemberId,
        class_id: ClassId,
    ) -> Result<bool, StoreError>;

    /// Writes the booking row, visible to others only after
    /// [`commit`](AdmissionTx::commit).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Duplicate`] when the `(member, class)`
    /// uniqueness backstop rejects the row.
    async fn insert_booking(
        &mut self,
        member_id: MemberId,
        class_id: ClassId,
    ) -> Result<BookingId, StoreError>;

    /// Commits the transaction, releasing the class-row lock.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the commit is rejected; a
    /// serialization conflict classifies as [`StoreError::Transient`].
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}
