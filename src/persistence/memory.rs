//! In-memory implementation of the store contracts.
//!
//! Backs the test-suite (and makes the admission concurrency property
//! testable without a database). The whole store sits behind one
//! `tokio::sync::Mutex`; an admission transaction holds the lock from
//! `begin_admission` until commit or drop, which gives it strictly
//! serialized transactions — a stronger version of the row-lock
//! guarantee the PostgreSQL implementation provides. Writes staged
//! inside a transaction are buffered and only applied on commit, so
//! dropping the handle rolls back.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::contracts::{
    AdmissionTx, BookingLedger, ClassCatalog, MembershipLedger, PackageCatalog, StoreError,
};
use crate::domain::{
    Booking, BookingId, BookingWithClass, ClassDetails, ClassId, FitnessClass, MemberId, NewClass,
    NewPackage, NewSubscription, Package, PackageId, Subscription, SubscriptionId,
};

#[derive(Debug, Default)]
struct Inner {
    subscriptions: HashMap<i64, Subscription>,
    packages: HashMap<i64, Package>,
    classes: HashMap<i64, FitnessClass>,
    bookings: HashMap<i64, Booking>,
    next_id: i64,
}

impl Inner {
    fn alloc_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn booked_count(&self, class_id: ClassId) -> i64 {
        self.bookings
            .values()
            .filter(|b| b.class_id == class_id)
            .count() as i64
    }
}

/// In-memory store implementing every contract the services consume.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MembershipLedger for MemoryStore {
    async fn find_active_subscription(
        &self,
        member_id: MemberId,
        at: DateTime<Utc>,
    ) -> Result<Option<Subscription>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .subscriptions
            .values()
            .filter(|s| s.member_id == member_id && s.covers(at))
            .max_by_key(|s| s.end_date)
            .cloned())
    }

    async fn find_unexpired_subscription(
        &self,
        member_id: MemberId,
        at: DateTime<Utc>,
    ) -> Result<Option<Subscription>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .subscriptions
            .values()
            .filter(|s| s.member_id == member_id && s.unexpired(at))
            .max_by_key(|s| s.end_date)
            .cloned())
    }

    async fn insert_subscription(
        &self,
        sub: NewSubscription,
    ) -> Result<Subscription, StoreError> {
        let mut inner = self.inner.lock().await;
        let id = inner.alloc_id();
        let stored = Subscription {
            id: SubscriptionId::new(id),
            member_id: sub.member_id,
            package_id: Some(sub.package_id),
            name: sub.name,
            price: sub.price,
            start_date: sub.start_date,
            end_date: sub.end_date,
            created_at: Utc::now(),
        };
        inner.subscriptions.insert(id, stored.clone());
        Ok(stored)
    }

    async fn subscriptions_for_member(
        &self,
        member_id: MemberId,
    ) -> Result<Vec<Subscription>, StoreError> {
        let inner = self.inner.lock().await;
        let mut subs: Vec<Subscription> = inner
            .subscriptions
            .values()
            .filter(|s| s.member_id == member_id)
            .cloned()
            .collect();
        subs.sort_by_key(|s| std::cmp::Reverse((s.created_at, s.id)));
        Ok(subs)
    }
}

#[async_trait]
impl PackageCatalog for MemoryStore {
    async fn find_package(&self, id: PackageId) -> Result<Option<Package>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.packages.get(&id.get()).cloned())
    }

    async fn list_active_packages(&self) -> Result<Vec<Package>, StoreError> {
        let inner = self.inner.lock().await;
        let mut packages: Vec<Package> = inner
            .packages
            .values()
            .filter(|p| p.is_active)
            .cloned()
            .collect();
        packages.sort_by(|a, b| {
            a.price
                .partial_cmp(&b.price)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(packages)
    }

    async fn list_all_packages(&self) -> Result<Vec<(Package, i64)>, StoreError> {
        let inner = self.inner.lock().await;
        let mut packages: Vec<(Package, i64)> = inner
            .packages
            .values()
            .map(|p| {
                let count = inner
                    .subscriptions
                    .values()
                    .filter(|s| s.package_id == Some(p.id))
                    .count() as i64;
                (p.clone(), count)
            })
            .collect();
        packages.sort_by(|a, b| {
            a.0.price
                .partial_cmp(&b.0.price)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(packages)
    }

    async fn insert_package(&self, pkg: NewPackage) -> Result<Package, StoreError> {
        let mut inner = self.inner.lock().await;
        let id = inner.alloc_id();
        let stored = Package {
            id: PackageId::new(id),
            name: pkg.name,
            description: pkg.description,
            price: pkg.price,
            duration_days: pkg.duration_days,
            is_active: true,
            created_at: Utc::now(),
        };
        inner.packages.insert(id, stored.clone());
        Ok(stored)
    }

    async fn delete_package(&self, id: PackageId) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().await;
        let removed = inner.packages.remove(&id.get()).is_some();
        if removed {
            // Mirror the schema's ON DELETE SET NULL: purchase history
            // keeps its snapshots, only the catalog link is cleared.
            for sub in inner.subscriptions.values_mut() {
                if sub.package_id == Some(id) {
                    sub.package_id = None;
                }
            }
        }
        Ok(removed)
    }
}

#[async_trait]
impl ClassCatalog for MemoryStore {
    async fn list_classes(&self) -> Result<Vec<ClassDetails>, StoreError> {
        let inner = self.inner.lock().await;
        let mut details: Vec<ClassDetails> = inner
            .classes
            .values()
            .map(|c| ClassDetails {
                class: c.clone(),
                trainer: None,
                booked_count: inner.booked_count(c.id),
            })
            .collect();
        details.sort_by_key(|d| d.class.schedule);
        Ok(details)
    }

    async fn find_class(&self, id: ClassId) -> Result<Option<FitnessClass>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.classes.get(&id.get()).cloned())
    }

    async fn insert_class(&self, class: NewClass) -> Result<FitnessClass, StoreError> {
        let mut inner = self.inner.lock().await;
        let id = inner.alloc_id();
        let stored = FitnessClass {
            id: ClassId::new(id),
            name: class.name,
            description: class.description,
            schedule: class.schedule,
            capacity: class.capacity,
            is_active: true,
            trainer_id: class.trainer_id,
            created_at: Utc::now(),
        };
        inner.classes.insert(id, stored.clone());
        Ok(stored)
    }

    async fn set_class_active(
        &self,
        id: ClassId,
        active: bool,
    ) -> Result<Option<FitnessClass>, StoreError> {
        let mut inner = self.inner.lock().await;
        match inner.classes.get_mut(&id.get()) {
            Some(class) => {
                class.is_active = active;
                Ok(Some(class.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_class(&self, id: ClassId) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().await;
        let removed = inner.classes.remove(&id.get()).is_some();
        if removed {
            // Mirror the schema's ON DELETE CASCADE.
            inner.bookings.retain(|_, b| b.class_id != id);
        }
        Ok(removed)
    }
}

#[async_trait]
impl BookingLedger for MemoryStore {
    async fn begin_admission(&self) -> Result<Box<dyn AdmissionTx>, StoreError> {
        let guard = Arc::clone(&self.inner).lock_owned().await;
        Ok(Box::new(MemAdmissionTx {
            guard,
            staged: None,
        }))
    }

    async fn find_booking(&self, id: BookingId) -> Result<Option<Booking>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.bookings.get(&id.get()).cloned())
    }

    async fn delete_booking(&self, id: BookingId) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner.bookings.remove(&id.get());
        Ok(())
    }

    async fn bookings_for_member(
        &self,
        member_id: MemberId,
    ) -> Result<Vec<BookingWithClass>, StoreError> {
        let inner = self.inner.lock().await;
        let mut joined: Vec<BookingWithClass> = inner
            .bookings
            .values()
            .filter(|b| b.member_id == member_id)
            .filter_map(|b| {
                inner.classes.get(&b.class_id.get()).map(|c| BookingWithClass {
                    booking: b.clone(),
                    class: c.clone(),
                })
            })
            .collect();
        joined.sort_by_key(|j| std::cmp::Reverse((j.booking.created_at, j.booking.id)));
        Ok(joined)
    }
}

/// Admission transaction over the whole-store lock.
///
/// Holds the store mutex for its entire lifetime, so admissions are
/// fully serialized. The single staged insert is applied on commit;
/// dropping the handle discards it.
struct MemAdmissionTx {
    guard: OwnedMutexGuard<Inner>,
    staged: Option<Booking>,
}

#[async_trait]
impl AdmissionTx for MemAdmissionTx {
    async fn class_with_booking_count(
        &mut self,
        class_id: ClassId,
    ) -> Result<Option<(FitnessClass, i64)>, StoreError> {
        let Some(class) = self.guard.classes.get(&class_id.get()) else {
            return Ok(None);
        };
        let count = self.guard.booked_count(class_id);
        Ok(Some((class.clone(), count)))
    }

    async fn booking_exists(
        &mut self,
        member_id: MemberId,
        class_id: ClassId,
    ) -> Result<bool, StoreError> {
        let committed = self
            .guard
            .bookings
            .values()
            .any(|b| b.member_id == member_id && b.class_id == class_id);
        let staged = self
            .staged
            .as_ref()
            .is_some_and(|b| b.member_id == member_id && b.class_id == class_id);
        Ok(committed || staged)
    }

    async fn insert_booking(
        &mut self,
        member_id: MemberId,
        class_id: ClassId,
    ) -> Result<BookingId, StoreError> {
        if self.booking_exists(member_id, class_id).await? {
            return Err(StoreError::Duplicate(format!(
                "booking ({member_id}, {class_id}) already exists"
            )));
        }
        let id = self.guard.alloc_id();
        self.staged = Some(Booking {
            id: BookingId::new(id),
            member_id,
            class_id,
            created_at: Utc::now(),
        });
        Ok(BookingId::new(id))
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let mut tx = self;
        if let Some(booking) = tx.staged.take() {
            tx.guard.bookings.insert(booking.id.get(), booking);
        }
        Ok(())
    }
}
