//! Booking admission control.
//!
//! [`AdmissionService`] owns the one decision in the platform where
//! correctness depends on an atomic check-then-act across several
//! records: may this member take a seat in this class right now? The
//! eligibility ladder runs in a fixed order — membership gate first,
//! then class existence/activity, schedule, capacity, and duplicate
//! check — with everything from the class read onward inside a single
//! scoped store transaction, so two callers racing for the last seat
//! can never both pass the capacity check.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::domain::{BookingId, BookingWithClass, ClassId, MemberId};
use crate::error::ApiError;
use crate::persistence::{BookingLedger, MembershipLedger, StoreError};

/// Bounded retry policy for transient store conflicts.
///
/// Only [`StoreError::Transient`] failures (serialization aborts,
/// deadlock victims, lock timeouts) are retried; business rejections
/// are terminal and returned to the caller on the first attempt.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the initial attempt.
    pub max_retries: u32,
    /// Base backoff; the N-th retry sleeps N times this.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff: Duration::from_millis(50),
        }
    }
}

/// Outcome of a single admission attempt, before retry handling.
enum AttemptError {
    /// Terminal business rejection, mapped to its API error.
    Rejected(ApiError),
    /// Store failure, possibly transient.
    Store(StoreError),
}

impl From<StoreError> for AttemptError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

/// Orchestrates booking admission and cancellation.
///
/// Holds the membership ledger and booking ledger as trait objects, so
/// tests substitute the in-memory store and production wires PostgreSQL.
#[derive(Debug)]
pub struct AdmissionService {
    memberships: Arc<dyn MembershipLedger>,
    bookings: Arc<dyn BookingLedger>,
    retry: RetryPolicy,
}

impl AdmissionService {
    /// Creates a new admission service.
    #[must_use]
    pub fn new(
        memberships: Arc<dyn MembershipLedger>,
        bookings: Arc<dyn BookingLedger>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            memberships,
            bookings,
            retry,
        }
    }

    /// Attempts to reserve a seat for `member_id` in `class_id` at `now`.
    ///
    /// The membership gate runs as a plain read; everything that touches
    /// the class and its bookings runs inside one admission transaction.
    /// Transient store conflicts are retried per the [`RetryPolicy`];
    /// every other failure is terminal.
    ///
    /// # Errors
    ///
    /// - [`ApiError::NoActiveMembership`] — no subscription covers `now`.
    /// - [`ApiError::ClassUnavailable`] — class missing or inactive.
    /// - [`ApiError::ClassInPast`] — the scheduled start has passed.
    /// - [`ApiError::ClassFull`] — every seat is committed.
    /// - [`ApiError::AlreadyBooked`] — the member already holds a seat.
    /// - [`ApiError::StoreFailure`] — persistent store trouble.
    pub async fn attempt_booking(
        &self,
        member_id: MemberId,
        class_id: ClassId,
        now: DateTime<Utc>,
    ) -> Result<BookingId, ApiError> {
        let subscription = self
            .memberships
            .find_active_subscription(member_id, now)
            .await?;
        if subscription.is_none() {
            return Err(ApiError::NoActiveMembership);
        }

        let mut attempt: u32 = 0;
        loop {
            match self.try_admission(member_id, class_id, now).await {
                Ok(booking_id) => {
                    tracing::info!(%member_id, %class_id, %booking_id, "booking admitted");
                    return Ok(booking_id);
                }
                Err(AttemptError::Rejected(reason)) => {
                    tracing::info!(%member_id, %class_id, %reason, "booking rejected");
                    return Err(reason);
                }
                Err(AttemptError::Store(StoreError::Transient(detail)))
                    if attempt < self.retry.max_retries =>
                {
                    attempt += 1;
                    tracing::warn!(
                        %member_id,
                        %class_id,
                        attempt,
                        detail,
                        "transient store conflict, retrying admission"
                    );
                    tokio::time::sleep(self.retry.backoff * attempt).await;
                }
                Err(AttemptError::Store(err)) => return Err(err.into()),
            }
        }
    }

    /// One pass through the admission ladder. Any early return drops the
    /// transaction handle, rolling back.
    async fn try_admission(
        &self,
        member_id: MemberId,
        class_id: ClassId,
        now: DateTime<Utc>,
    ) -> Result<BookingId, AttemptError> {
        let mut tx = self.bookings.begin_admission().await?;

        let Some((class, booked)) = tx.class_with_booking_count(class_id).await? else {
            return Err(AttemptError::Rejected(ApiError::ClassUnavailable));
        };
        if !class.is_active {
            return Err(AttemptError::Rejected(ApiError::ClassUnavailable));
        }
        if class.has_started(now) {
            return Err(AttemptError::Rejected(ApiError::ClassInPast));
        }
        if class.is_full(booked) {
            return Err(AttemptError::Rejected(ApiError::ClassFull));
        }
        if tx.booking_exists(member_id, class_id).await? {
            return Err(AttemptError::Rejected(ApiError::AlreadyBooked));
        }

        let booking_id = match tx.insert_booking(member_id, class_id).await {
            Ok(id) => id,
            // The unique constraint is the backstop for a duplicate that
            // slipped past the explicit check.
            Err(StoreError::Duplicate(_)) => {
                return Err(AttemptError::Rejected(ApiError::AlreadyBooked));
            }
            Err(err) => return Err(err.into()),
        };

        tx.commit().await?;
        Ok(booking_id)
    }

    /// Cancels a booking owned by `member_id`.
    ///
    /// A booking that does not exist and a booking owned by someone else
    /// fail identically, so callers cannot probe for other members'
    /// booking ids. Deletion runs outside any transaction: it only ever
    /// lowers a class's booked count and cannot violate the capacity
    /// invariant.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotAllowed`] when the booking is missing or
    /// foreign, [`ApiError::StoreFailure`] on store trouble.
    pub async fn cancel_booking(
        &self,
        member_id: MemberId,
        booking_id: BookingId,
    ) -> Result<(), ApiError> {
        let Some(booking) = self.bookings.find_booking(booking_id).await? else {
            return Err(ApiError::NotAllowed);
        };
        if booking.member_id != member_id {
            return Err(ApiError::NotAllowed);
        }

        self.bookings.delete_booking(booking_id).await?;
        tracing::info!(%member_id, %booking_id, "booking cancelled");
        Ok(())
    }

    /// The member's bookings with their class snapshots, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::StoreFailure`] on store trouble.
    pub async fn bookings_for_member(
        &self,
        member_id: MemberId,
    ) -> Result<Vec<BookingWithClass>, ApiError> {
        Ok(self.bookings.bookings_for_member(member_id).await?)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{FitnessClass, NewClass, NewSubscription, PackageId};
    use crate::persistence::{ClassCatalog, MemoryStore};

    fn fixed_now() -> DateTime<Utc> {
        let Ok(now) = "2024-06-01T12:00:00Z".parse() else {
            panic!("bad fixture timestamp");
        };
        now
    }

    fn service(store: &MemoryStore) -> AdmissionService {
        AdmissionService::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            RetryPolicy::default(),
        )
    }

    async fn seed_subscription(
        store: &MemoryStore,
        member_id: MemberId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) {
        let Ok(_) = store
            .insert_subscription(NewSubscription {
                member_id,
                package_id: PackageId::new(1),
                name: "Monthly".to_string(),
                price: 49.0,
                start_date: start,
                end_date: end,
            })
            .await
        else {
            panic!("seeding subscription failed");
        };
    }

    async fn seed_member(store: &MemoryStore, member_id: MemberId, now: DateTime<Utc>) {
        seed_subscription(
            store,
            member_id,
            now - chrono::Duration::days(1),
            now + chrono::Duration::days(29),
        )
        .await;
    }

    async fn seed_class(
        store: &MemoryStore,
        capacity: i32,
        schedule: DateTime<Utc>,
    ) -> FitnessClass {
        let Ok(class) = store
            .insert_class(NewClass {
                name: "Spin".to_string(),
                description: None,
                schedule,
                capacity,
                trainer_id: None,
            })
            .await
        else {
            panic!("seeding class failed");
        };
        class
    }

    async fn booked_count(store: &MemoryStore, class_id: ClassId) -> i64 {
        let Ok(details) = store.list_classes().await else {
            panic!("list_classes failed");
        };
        let Some(entry) = details.iter().find(|d| d.class.id == class_id) else {
            panic!("class vanished");
        };
        entry.booked_count
    }

    #[tokio::test]
    async fn books_a_seat_for_an_eligible_member() {
        let store = MemoryStore::new();
        let now = fixed_now();
        let member = MemberId::new(1);
        seed_member(&store, member, now).await;
        let class = seed_class(&store, 10, now + chrono::Duration::days(1)).await;

        let result = service(&store).attempt_booking(member, class.id, now).await;
        assert!(result.is_ok());
        assert_eq!(booked_count(&store, class.id).await, 1);
    }

    #[tokio::test]
    async fn rejects_a_member_without_membership() {
        let store = MemoryStore::new();
        let now = fixed_now();
        let class = seed_class(&store, 10, now + chrono::Duration::days(1)).await;

        let result = service(&store)
            .attempt_booking(MemberId::new(1), class.id, now)
            .await;
        assert!(matches!(result, Err(ApiError::NoActiveMembership)));
        assert_eq!(booked_count(&store, class.id).await, 0);
    }

    #[tokio::test]
    async fn membership_is_valid_through_its_last_instant() {
        let store = MemoryStore::new();
        let now = fixed_now();
        let member = MemberId::new(1);
        // Window ends exactly at `now`: still active, inclusive.
        seed_subscription(&store, member, now - chrono::Duration::days(30), now).await;
        let class = seed_class(&store, 10, now + chrono::Duration::days(1)).await;

        let result = service(&store).attempt_booking(member, class.id, now).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn membership_expired_before_now_is_rejected() {
        let store = MemoryStore::new();
        let now = fixed_now();
        let member = MemberId::new(1);
        seed_subscription(
            &store,
            member,
            now - chrono::Duration::days(30),
            now - chrono::Duration::days(1),
        )
        .await;
        let class = seed_class(&store, 10, now + chrono::Duration::days(1)).await;

        let result = service(&store).attempt_booking(member, class.id, now).await;
        assert!(matches!(result, Err(ApiError::NoActiveMembership)));
    }

    #[tokio::test]
    async fn rejects_an_unknown_class() {
        let store = MemoryStore::new();
        let now = fixed_now();
        let member = MemberId::new(1);
        seed_member(&store, member, now).await;

        let result = service(&store)
            .attempt_booking(member, ClassId::new(404), now)
            .await;
        assert!(matches!(result, Err(ApiError::ClassUnavailable)));
    }

    #[tokio::test]
    async fn rejects_a_deactivated_class() {
        let store = MemoryStore::new();
        let now = fixed_now();
        let member = MemberId::new(1);
        seed_member(&store, member, now).await;
        let class = seed_class(&store, 10, now + chrono::Duration::days(1)).await;
        let Ok(Some(_)) = store.set_class_active(class.id, false).await else {
            panic!("deactivation failed");
        };

        let result = service(&store).attempt_booking(member, class.id, now).await;
        assert!(matches!(result, Err(ApiError::ClassUnavailable)));
    }

    #[tokio::test]
    async fn rejects_a_class_that_already_started() {
        let store = MemoryStore::new();
        let now = fixed_now();
        let member = MemberId::new(1);
        seed_member(&store, member, now).await;
        // Open seats, but the schedule has passed.
        let class = seed_class(&store, 10, now - chrono::Duration::hours(1)).await;

        let result = service(&store).attempt_booking(member, class.id, now).await;
        assert!(matches!(result, Err(ApiError::ClassInPast)));
        assert_eq!(booked_count(&store, class.id).await, 0);
    }

    #[tokio::test]
    async fn rejects_when_every_seat_is_taken() {
        let store = MemoryStore::new();
        let now = fixed_now();
        let svc = service(&store);
        let class = seed_class(&store, 2, now + chrono::Duration::days(1)).await;

        for raw in 1..=2 {
            let member = MemberId::new(raw);
            seed_member(&store, member, now).await;
            let Ok(_) = svc.attempt_booking(member, class.id, now).await else {
                panic!("seat {raw} should have been granted");
            };
        }

        let late = MemberId::new(3);
        seed_member(&store, late, now).await;
        let result = svc.attempt_booking(late, class.id, now).await;
        assert!(matches!(result, Err(ApiError::ClassFull)));
        assert_eq!(booked_count(&store, class.id).await, 2);
    }

    #[tokio::test]
    async fn rejects_a_second_booking_for_the_same_class() {
        let store = MemoryStore::new();
        let now = fixed_now();
        let member = MemberId::new(1);
        seed_member(&store, member, now).await;
        let class = seed_class(&store, 10, now + chrono::Duration::days(1)).await;
        let svc = service(&store);

        let Ok(_) = svc.attempt_booking(member, class.id, now).await else {
            panic!("first booking should succeed");
        };
        let second = svc.attempt_booking(member, class.id, now).await;
        assert!(matches!(second, Err(ApiError::AlreadyBooked)));
        assert_eq!(booked_count(&store, class.id).await, 1);
    }

    #[tokio::test]
    async fn capacity_is_never_oversold_under_concurrency() {
        let store = MemoryStore::new();
        let now = fixed_now();
        let class = seed_class(&store, 3, now + chrono::Duration::days(1)).await;
        for raw in 1..=8 {
            seed_member(&store, MemberId::new(raw), now).await;
        }
        let svc = Arc::new(service(&store));

        let handles: Vec<_> = (1..=8)
            .map(|raw| {
                let svc = Arc::clone(&svc);
                let class_id = class.id;
                tokio::spawn(async move {
                    svc.attempt_booking(MemberId::new(raw), class_id, now).await
                })
            })
            .collect();

        let mut granted = 0;
        let mut full = 0;
        for outcome in futures_util::future::join_all(handles).await {
            let Ok(result) = outcome else {
                panic!("booking task panicked");
            };
            match result {
                Ok(_) => granted += 1,
                Err(ApiError::ClassFull) => full += 1,
                Err(other) => panic!("unexpected admission outcome: {other}"),
            }
        }

        assert_eq!(granted, 3);
        assert_eq!(full, 5);
        assert_eq!(booked_count(&store, class.id).await, 3);
    }

    #[tokio::test]
    async fn exactly_one_caller_wins_the_last_seat() {
        let store = MemoryStore::new();
        let now = fixed_now();
        let class = seed_class(&store, 1, now + chrono::Duration::days(1)).await;
        let (m2, m3) = (MemberId::new(2), MemberId::new(3));
        seed_member(&store, m2, now).await;
        seed_member(&store, m3, now).await;
        let svc = Arc::new(service(&store));

        let a = {
            let svc = Arc::clone(&svc);
            let class_id = class.id;
            tokio::spawn(async move { svc.attempt_booking(m2, class_id, now).await })
        };
        let b = {
            let svc = Arc::clone(&svc);
            let class_id = class.id;
            tokio::spawn(async move { svc.attempt_booking(m3, class_id, now).await })
        };

        let (Ok(a), Ok(b)) = tokio::join!(a, b) else {
            panic!("booking task panicked");
        };
        let winners = usize::from(a.is_ok()) + usize::from(b.is_ok());
        assert_eq!(winners, 1);
        assert!(
            matches!(&a, Err(ApiError::ClassFull)) || matches!(&b, Err(ApiError::ClassFull)),
            "the loser must see ClassFull"
        );
        assert_eq!(booked_count(&store, class.id).await, 1);
    }

    #[tokio::test]
    async fn duplicate_concurrent_requests_leave_one_row() {
        let store = MemoryStore::new();
        let now = fixed_now();
        let class = seed_class(&store, 5, now + chrono::Duration::days(1)).await;
        let member = MemberId::new(1);
        seed_member(&store, member, now).await;
        let svc = Arc::new(service(&store));

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let svc = Arc::clone(&svc);
                let class_id = class.id;
                tokio::spawn(async move { svc.attempt_booking(member, class_id, now).await })
            })
            .collect();

        let mut granted = 0;
        let mut duplicate = 0;
        for outcome in futures_util::future::join_all(handles).await {
            let Ok(result) = outcome else {
                panic!("booking task panicked");
            };
            match result {
                Ok(_) => granted += 1,
                Err(ApiError::AlreadyBooked) => duplicate += 1,
                Err(other) => panic!("unexpected admission outcome: {other}"),
            }
        }

        assert_eq!(granted, 1);
        assert_eq!(duplicate, 1);
        assert_eq!(booked_count(&store, class.id).await, 1);
    }

    #[tokio::test]
    async fn a_member_can_cancel_their_own_booking() {
        let store = MemoryStore::new();
        let now = fixed_now();
        let member = MemberId::new(1);
        seed_member(&store, member, now).await;
        let class = seed_class(&store, 10, now + chrono::Duration::days(1)).await;
        let svc = service(&store);

        let Ok(booking_id) = svc.attempt_booking(member, class.id, now).await else {
            panic!("booking should succeed");
        };
        let Ok(()) = svc.cancel_booking(member, booking_id).await else {
            panic!("cancellation should succeed");
        };
        assert_eq!(booked_count(&store, class.id).await, 0);
    }

    #[tokio::test]
    async fn cancelling_someone_elses_booking_is_not_allowed() {
        let store = MemoryStore::new();
        let now = fixed_now();
        let (owner, intruder) = (MemberId::new(1), MemberId::new(2));
        seed_member(&store, owner, now).await;
        seed_member(&store, intruder, now).await;
        let class = seed_class(&store, 10, now + chrono::Duration::days(1)).await;
        let svc = service(&store);

        let Ok(booking_id) = svc.attempt_booking(owner, class.id, now).await else {
            panic!("booking should succeed");
        };

        let result = svc.cancel_booking(intruder, booking_id).await;
        assert!(matches!(result, Err(ApiError::NotAllowed)));
        // The owner's booking must be untouched.
        assert_eq!(booked_count(&store, class.id).await, 1);
    }

    #[tokio::test]
    async fn cancelling_a_missing_booking_is_not_allowed() {
        let store = MemoryStore::new();
        let svc = service(&store);

        let result = svc
            .cancel_booking(MemberId::new(1), BookingId::new(999))
            .await;
        assert!(matches!(result, Err(ApiError::NotAllowed)));
    }
}
