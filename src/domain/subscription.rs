//! Purchased membership subscriptions.

use chrono::{DateTime, Utc};

use super::{MemberId, PackageId, SubscriptionId};

/// One purchased package instance with its validity window.
///
/// Immutable after creation. The `name` and `price` fields are snapshots
/// taken at purchase time; `package_id` is informational only and may be
/// cleared when the catalog entry is deleted.
#[derive(Debug, Clone)]
pub struct Subscription {
    /// Row id.
    pub id: SubscriptionId,
    /// Owning member.
    pub member_id: MemberId,
    /// Catalog package this was purchased from, if it still exists.
    pub package_id: Option<PackageId>,
    /// Package name at purchase time.
    pub name: String,
    /// Price paid.
    pub price: f64,
    /// First instant the subscription is valid, inclusive.
    pub start_date: DateTime<Utc>,
    /// Last instant the subscription is valid, inclusive.
    pub end_date: DateTime<Utc>,
    /// Purchase timestamp.
    pub created_at: DateTime<Utc>,
}

impl Subscription {
    /// Whether the validity window `[start_date, end_date]` contains
    /// `at`. Both ends are inclusive: a subscription expiring exactly
    /// now still admits a booking.
    #[must_use]
    pub fn covers(&self, at: DateTime<Utc>) -> bool {
        self.start_date <= at && at <= self.end_date
    }

    /// Whether the subscription has not yet expired at `at`.
    ///
    /// Broader than [`covers`](Self::covers): a subscription whose window
    /// has not opened yet still counts. Used by the purchase gate, which
    /// refuses a new purchase while any unexpired subscription exists.
    #[must_use]
    pub fn unexpired(&self, at: DateTime<Utc>) -> bool {
        self.end_date >= at
    }
}

/// Data for inserting a new subscription row.
#[derive(Debug, Clone)]
pub struct NewSubscription {
    /// Owning member.
    pub member_id: MemberId,
    /// Source catalog package.
    pub package_id: PackageId,
    /// Name snapshot.
    pub name: String,
    /// Price snapshot.
    pub price: f64,
    /// Window start, inclusive.
    pub start_date: DateTime<Utc>,
    /// Window end, inclusive.
    pub end_date: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn subscription(start: &str, end: &str) -> Subscription {
        let Ok(start_date) = start.parse::<DateTime<Utc>>() else {
            panic!("bad start date in fixture");
        };
        let Ok(end_date) = end.parse::<DateTime<Utc>>() else {
            panic!("bad end date in fixture");
        };
        Subscription {
            id: SubscriptionId::new(1),
            member_id: MemberId::new(1),
            package_id: Some(PackageId::new(1)),
            name: "Monthly".to_string(),
            price: 49.0,
            start_date,
            end_date,
            created_at: start_date,
        }
    }

    #[test]
    fn covers_is_inclusive_on_both_ends() {
        let sub = subscription("2024-01-01T00:00:00Z", "2024-01-31T00:00:00Z");
        let Some(start) = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single() else {
            panic!("bad timestamp");
        };
        let Some(end) = Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).single() else {
            panic!("bad timestamp");
        };
        assert!(sub.covers(start));
        assert!(sub.covers(end));
    }

    #[test]
    fn covers_rejects_outside_the_window() {
        let sub = subscription("2024-01-01T00:00:00Z", "2024-01-31T00:00:00Z");
        let Some(before) = Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).single() else {
            panic!("bad timestamp");
        };
        let Some(after) = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).single() else {
            panic!("bad timestamp");
        };
        assert!(!sub.covers(before));
        assert!(!sub.covers(after));
    }

    #[test]
    fn unexpired_counts_future_windows() {
        let sub = subscription("2024-03-01T00:00:00Z", "2024-03-31T00:00:00Z");
        let Some(now) = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).single() else {
            panic!("bad timestamp");
        };
        assert!(!sub.covers(now));
        assert!(sub.unexpired(now));
    }
}
