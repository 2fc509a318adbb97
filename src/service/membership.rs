//! Membership subscriptions: the purchase gate and validity queries.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::domain::{MemberId, NewSubscription, PackageId, Subscription};
use crate::error::ApiError;
use crate::persistence::{MembershipLedger, PackageCatalog};

/// Orchestrates subscription purchases and validity lookups.
///
/// The purchase gate is check-then-insert without a transaction. That is
/// weaker than the booking admission path on purpose: a lost race here
/// costs one redundant subscription row, it cannot oversell a physical
/// seat.
#[derive(Debug)]
pub struct MembershipService {
    memberships: Arc<dyn MembershipLedger>,
    packages: Arc<dyn PackageCatalog>,
}

impl MembershipService {
    /// Creates a new membership service.
    #[must_use]
    pub fn new(memberships: Arc<dyn MembershipLedger>, packages: Arc<dyn PackageCatalog>) -> Self {
        Self {
            memberships,
            packages,
        }
    }

    /// Purchases `package_id` for `member_id`, opening a validity window
    /// of the package's duration starting at `now`. The package's name
    /// and price are snapshotted into the subscription row.
    ///
    /// # Errors
    ///
    /// - [`ApiError::NotFound`] — the package is missing or inactive.
    /// - [`ApiError::SubscriptionActive`] — the member still holds an
    ///   unexpired subscription (including one starting in the future).
    /// - [`ApiError::StoreFailure`] — store trouble.
    pub async fn subscribe(
        &self,
        member_id: MemberId,
        package_id: PackageId,
        now: DateTime<Utc>,
    ) -> Result<Subscription, ApiError> {
        let Some(package) = self.packages.find_package(package_id).await? else {
            return Err(ApiError::NotFound("package"));
        };
        if !package.is_active {
            return Err(ApiError::NotFound("package"));
        }

        if self
            .memberships
            .find_unexpired_subscription(member_id, now)
            .await?
            .is_some()
        {
            return Err(ApiError::SubscriptionActive);
        }

        let subscription = self
            .memberships
            .insert_subscription(NewSubscription {
                member_id,
                package_id,
                name: package.name.clone(),
                price: package.price,
                start_date: now,
                end_date: now + Duration::days(i64::from(package.duration_days)),
            })
            .await?;

        tracing::info!(
            %member_id,
            %package_id,
            subscription_id = %subscription.id,
            end_date = %subscription.end_date,
            "subscription purchased"
        );
        Ok(subscription)
    }

    /// The subscription covering `now`, if any. When several overlap,
    /// the one expiring last wins.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::StoreFailure`] on store trouble.
    pub async fn active_subscription(
        &self,
        member_id: MemberId,
        now: DateTime<Utc>,
    ) -> Result<Option<Subscription>, ApiError> {
        Ok(self
            .memberships
            .find_active_subscription(member_id, now)
            .await?)
    }

    /// Full purchase history, most recent first.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::StoreFailure`] on store trouble.
    pub async fn history(&self, member_id: MemberId) -> Result<Vec<Subscription>, ApiError> {
        Ok(self.memberships.subscriptions_for_member(member_id).await?)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{NewClass, NewPackage, Package};
    use crate::persistence::{ClassCatalog, MemoryStore};
    use crate::service::admission::{AdmissionService, RetryPolicy};

    fn service(store: &MemoryStore) -> MembershipService {
        MembershipService::new(Arc::new(store.clone()), Arc::new(store.clone()))
    }

    async fn seed_package(store: &MemoryStore, duration_days: i32) -> Package {
        let Ok(package) = store
            .insert_package(NewPackage {
                name: "Monthly".to_string(),
                description: None,
                price: 49.0,
                duration_days,
            })
            .await
        else {
            panic!("seeding package failed");
        };
        package
    }

    fn date(s: &str) -> DateTime<Utc> {
        let Ok(parsed) = s.parse() else {
            panic!("bad fixture timestamp: {s}");
        };
        parsed
    }

    #[tokio::test]
    async fn subscribing_opens_a_window_of_the_package_duration() {
        let store = MemoryStore::new();
        let package = seed_package(&store, 30).await;
        let now = date("2024-01-01T00:00:00Z");

        let Ok(sub) = service(&store)
            .subscribe(MemberId::new(1), package.id, now)
            .await
        else {
            panic!("subscribe failed");
        };

        assert_eq!(sub.start_date, now);
        assert_eq!(sub.end_date, date("2024-01-31T00:00:00Z"));
        assert_eq!(sub.name, "Monthly");
        assert!((sub.price - 49.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn an_unknown_package_cannot_be_purchased() {
        let store = MemoryStore::new();
        let result = service(&store)
            .subscribe(MemberId::new(1), PackageId::new(404), Utc::now())
            .await;
        assert!(matches!(result, Err(ApiError::NotFound("package"))));
    }

    #[tokio::test]
    async fn an_unexpired_subscription_blocks_a_new_purchase() {
        let store = MemoryStore::new();
        let package = seed_package(&store, 30).await;
        let svc = service(&store);
        let now = date("2024-01-01T00:00:00Z");

        let Ok(_) = svc.subscribe(MemberId::new(1), package.id, now).await else {
            panic!("first subscribe failed");
        };
        let again = svc
            .subscribe(MemberId::new(1), package.id, now + Duration::days(10))
            .await;
        assert!(matches!(again, Err(ApiError::SubscriptionActive)));
    }

    #[tokio::test]
    async fn a_lapsed_subscription_allows_a_new_purchase() {
        let store = MemoryStore::new();
        let package = seed_package(&store, 30).await;
        let svc = service(&store);

        let Ok(_) = svc
            .subscribe(MemberId::new(1), package.id, date("2024-01-01T00:00:00Z"))
            .await
        else {
            panic!("first subscribe failed");
        };
        // 2024-01-31 was the last valid day; February 2nd is clear.
        let result = svc
            .subscribe(MemberId::new(1), package.id, date("2024-02-02T00:00:00Z"))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn booking_eligibility_tracks_the_subscription_window() {
        let store = MemoryStore::new();
        let package = seed_package(&store, 30).await;
        let memberships = service(&store);
        let admission = AdmissionService::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            RetryPolicy::default(),
        );
        let member = MemberId::new(1);

        let Ok(_) = memberships
            .subscribe(member, package.id, date("2024-01-01T00:00:00Z"))
            .await
        else {
            panic!("subscribe failed");
        };

        let seed_class = |schedule: DateTime<Utc>| NewClass {
            name: "Yoga".to_string(),
            description: None,
            schedule,
            capacity: 10,
            trainer_id: None,
        };
        let Ok(january_class) = store
            .insert_class(seed_class(date("2024-01-31T18:00:00Z")))
            .await
        else {
            panic!("class seeding failed");
        };
        let Ok(february_class) = store
            .insert_class(seed_class(date("2024-02-05T18:00:00Z")))
            .await
        else {
            panic!("class seeding failed");
        };

        // On the window's last day the membership gate passes.
        let on_expiry = admission
            .attempt_booking(member, january_class.id, date("2024-01-31T00:00:00Z"))
            .await;
        assert!(on_expiry.is_ok());

        // One day later it does not.
        let after_expiry = admission
            .attempt_booking(member, february_class.id, date("2024-02-01T00:00:00Z"))
            .await;
        assert!(matches!(after_expiry, Err(ApiError::NoActiveMembership)));
    }

    #[tokio::test]
    async fn history_lists_purchases() {
        let store = MemoryStore::new();
        let package = seed_package(&store, 30).await;
        let svc = service(&store);
        let member = MemberId::new(1);

        let Ok(first) = svc
            .subscribe(member, package.id, date("2023-01-01T00:00:00Z"))
            .await
        else {
            panic!("first subscribe failed");
        };
        let Ok(second) = svc
            .subscribe(member, package.id, date("2024-01-01T00:00:00Z"))
            .await
        else {
            panic!("second subscribe failed");
        };

        let Ok(history) = svc.history(member).await else {
            panic!("history failed");
        };
        assert_eq!(history.len(), 2);
        let ids: Vec<_> = history.iter().map(|s| s.id).collect();
        assert!(ids.contains(&first.id));
        assert!(ids.contains(&second.id));
    }

    #[tokio::test]
    async fn active_subscription_prefers_the_latest_expiry() {
        let store = MemoryStore::new();
        let svc = service(&store);
        let member = MemberId::new(1);
        let now = date("2024-01-15T00:00:00Z");

        for end in ["2024-01-20T00:00:00Z", "2024-02-20T00:00:00Z"] {
            let Ok(_) = store
                .insert_subscription(NewSubscription {
                    member_id: member,
                    package_id: PackageId::new(1),
                    name: "Monthly".to_string(),
                    price: 49.0,
                    start_date: date("2024-01-01T00:00:00Z"),
                    end_date: date(end),
                })
                .await
            else {
                panic!("seeding subscription failed");
            };
        }

        let Ok(Some(active)) = svc.active_subscription(member, now).await else {
            panic!("expected an active subscription");
        };
        assert_eq!(active.end_date, date("2024-02-20T00:00:00Z"));
    }
}
