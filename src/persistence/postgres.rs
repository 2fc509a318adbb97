//! PostgreSQL implementation of the store contracts.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use super::contracts::{
    AdmissionTx, BookingLedger, ClassCatalog, MembershipLedger, PackageCatalog, StoreError,
};
use super::models::{BookingRow, ClassRow, MemberRow, PackageRow, SubscriptionRow, TrainerRow};
use crate::domain::{
    Booking, BookingId, BookingWithClass, ClassDetails, ClassId, FitnessClass, Member, MemberId,
    NewClass, NewMember, NewPackage, NewSubscription, NewTrainer, Package, PackageId, Subscription,
    Trainer, TrainerId,
};

/// PostgreSQL-backed store using `sqlx::PgPool`.
///
/// Implements every store contract plus the concrete member/trainer
/// queries the API layer uses directly.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
    lock_timeout_ms: u64,
}

impl PostgresStore {
    /// Creates a new store with the given connection pool.
    ///
    /// `lock_timeout_ms` bounds how long an admission transaction waits
    /// on a competing transaction's class-row lock before aborting with
    /// a transient failure.
    #[must_use]
    pub fn new(pool: PgPool, lock_timeout_ms: u64) -> Self {
        Self {
            pool,
            lock_timeout_ms,
        }
    }

    /// Inserts a member account.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Duplicate`] when the email is already
    /// registered.
    pub async fn insert_member(&self, member: NewMember) -> Result<Member, StoreError> {
        let row = sqlx::query_as::<_, MemberRow>(
            "INSERT INTO members (name, last_name, phone, email, password_hash, role) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, name, last_name, phone, email, password_hash, role, created_at",
        )
        .bind(&member.name)
        .bind(&member.last_name)
        .bind(&member.phone)
        .bind(&member.email)
        .bind(&member.password_hash)
        .bind(member.role.as_str())
        .fetch_one(&self.pool)
        .await?;

        row.into_member()
    }

    /// Looks up a member by login email, returning the domain member and
    /// the stored password hash for credential verification.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    pub async fn find_member_by_email(
        &self,
        email: &str,
    ) -> Result<Option<(Member, String)>, StoreError> {
        let row = sqlx::query_as::<_, MemberRow>(
            "SELECT id, name, last_name, phone, email, password_hash, role, created_at \
             FROM members WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let hash = row.password_hash.clone();
                Ok(Some((row.into_member()?, hash)))
            }
            None => Ok(None),
        }
    }

    /// Looks up a member by id.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    pub async fn find_member(&self, id: MemberId) -> Result<Option<Member>, StoreError> {
        let row = sqlx::query_as::<_, MemberRow>(
            "SELECT id, name, last_name, phone, email, password_hash, role, created_at \
             FROM members WHERE id = $1",
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await?;

        row.map(MemberRow::into_member).transpose()
    }

    /// All member accounts, oldest id first.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    pub async fn list_members(&self) -> Result<Vec<Member>, StoreError> {
        let rows = sqlx::query_as::<_, MemberRow>(
            "SELECT id, name, last_name, phone, email, password_hash, role, created_at \
             FROM members ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(MemberRow::into_member).collect()
    }

    /// Updates a member's name and/or password hash, returning the
    /// updated account or `None` when the member does not exist. `None`
    /// arguments leave the stored value untouched.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    pub async fn update_member_profile(
        &self,
        id: MemberId,
        name: Option<&str>,
        password_hash: Option<&str>,
    ) -> Result<Option<Member>, StoreError> {
        let row = sqlx::query_as::<_, MemberRow>(
            "UPDATE members SET name = COALESCE($2, name), \
             password_hash = COALESCE($3, password_hash) \
             WHERE id = $1 \
             RETURNING id, name, last_name, phone, email, password_hash, role, created_at",
        )
        .bind(id.get())
        .bind(name)
        .bind(password_hash)
        .fetch_optional(&self.pool)
        .await?;

        row.map(MemberRow::into_member).transpose()
    }

    /// All trainers, newest first.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    pub async fn list_trainers(&self) -> Result<Vec<Trainer>, StoreError> {
        let rows = sqlx::query_as::<_, TrainerRow>(
            "SELECT id, name, specialty, bio, image_url, created_at \
             FROM trainers ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Trainer::from).collect())
    }

    /// Inserts a trainer.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    pub async fn insert_trainer(&self, trainer: NewTrainer) -> Result<Trainer, StoreError> {
        let row = sqlx::query_as::<_, TrainerRow>(
            "INSERT INTO trainers (name, specialty, bio) VALUES ($1, $2, $3) \
             RETURNING id, name, specialty, bio, image_url, created_at",
        )
        .bind(&trainer.name)
        .bind(&trainer.specialty)
        .bind(&trainer.bio)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    /// Deletes a trainer. Classes keep running with their trainer link
    /// cleared by the schema. Returns `false` when no such row existed.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] on database failure.
    pub async fn delete_trainer(&self, id: TrainerId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM trainers WHERE id = $1")
            .bind(id.get())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl MembershipLedger for PostgresStore {
    async fn find_active_subscription(
        &self,
        member_id: MemberId,
        at: DateTime<Utc>,
    ) -> Result<Option<Subscription>, StoreError> {
        let row = sqlx::query_as::<_, SubscriptionRow>(
            "SELECT id, member_id, package_id, name, price, start_date, end_date, created_at \
             FROM member_packages \
             WHERE member_id = $1 AND start_date <= $2 AND end_date >= $2 \
             ORDER BY end_date DESC LIMIT 1",
        )
        .bind(member_id.get())
        .bind(at)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Subscription::from))
    }

    async fn find_unexpired_subscription(
        &self,
        member_id: MemberId,
        at: DateTime<Utc>,
    ) -> Result<Option<Subscription>, StoreError> {
        let row = sqlx::query_as::<_, SubscriptionRow>(
            "SELECT id, member_id, package_id, name, price, start_date, end_date, created_at \
             FROM member_packages \
             WHERE member_id = $1 AND end_date >= $2 \
             ORDER BY end_date DESC LIMIT 1",
        )
        .bind(member_id.get())
        .bind(at)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Subscription::from))
    }

    async fn insert_subscription(
        &self,
        sub: NewSubscription,
    ) -> Result<Subscription, StoreError> {
        let row = sqlx::query_as::<_, SubscriptionRow>(
            "INSERT INTO member_packages (member_id, package_id, name, price, start_date, end_date) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, member_id, package_id, name, price, start_date, end_date, created_at",
        )
        .bind(sub.member_id.get())
        .bind(sub.package_id.get())
        .bind(&sub.name)
        .bind(sub.price)
        .bind(sub.start_date)
        .bind(sub.end_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn subscriptions_for_member(
        &self,
        member_id: MemberId,
    ) -> Result<Vec<Subscription>, StoreError> {
        let rows = sqlx::query_as::<_, SubscriptionRow>(
            "SELECT id, member_id, package_id, name, price, start_date, end_date, created_at \
             FROM member_packages WHERE member_id = $1 ORDER BY created_at DESC",
        )
        .bind(member_id.get())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Subscription::from).collect())
    }
}

#[async_trait]
impl PackageCatalog for PostgresStore {
    async fn find_package(&self, id: PackageId) -> Result<Option<Package>, StoreError> {
        let row = sqlx::query_as::<_, PackageRow>(
            "SELECT id, name, description, price, duration_days, is_active, created_at \
             FROM packages WHERE id = $1",
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Package::from))
    }

    async fn list_active_packages(&self) -> Result<Vec<Package>, StoreError> {
        let rows = sqlx::query_as::<_, PackageRow>(
            "SELECT id, name, description, price, duration_days, is_active, created_at \
             FROM packages WHERE is_active = TRUE ORDER BY price ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Package::from).collect())
    }

    async fn list_all_packages(&self) -> Result<Vec<(Package, i64)>, StoreError> {
        let rows = sqlx::query_as::<_, PackageWithCountRow>(
            "SELECT p.id, p.name, p.description, p.price, p.duration_days, p.is_active, \
             p.created_at, \
             (SELECT COUNT(*) FROM member_packages mp WHERE mp.package_id = p.id) AS member_count \
             FROM packages p ORDER BY p.price ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.package.into(), row.member_count))
            .collect())
    }

    async fn insert_package(&self, pkg: NewPackage) -> Result<Package, StoreError> {
        let row = sqlx::query_as::<_, PackageRow>(
            "INSERT INTO packages (name, description, price, duration_days, is_active) \
             VALUES ($1, $2, $3, $4, TRUE) \
             RETURNING id, name, description, price, duration_days, is_active, created_at",
        )
        .bind(&pkg.name)
        .bind(&pkg.description)
        .bind(pkg.price)
        .bind(pkg.duration_days)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn delete_package(&self, id: PackageId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM packages WHERE id = $1")
            .bind(id.get())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ClassCatalog for PostgresStore {
    async fn list_classes(&self) -> Result<Vec<ClassDetails>, StoreError> {
        let rows = sqlx::query_as::<_, ClassDetailsRow>(
            "SELECT c.id, c.name, c.description, c.schedule, c.capacity, c.is_active, \
             c.trainer_id, c.created_at, \
             t.id AS t_id, t.name AS t_name, t.specialty AS t_specialty, t.bio AS t_bio, \
             t.image_url AS t_image_url, t.created_at AS t_created_at, \
             (SELECT COUNT(*) FROM bookings b WHERE b.class_id = c.id) AS booked_count \
             FROM classes c LEFT JOIN trainers t ON t.id = c.trainer_id \
             ORDER BY c.schedule ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ClassDetailsRow::into_details).collect())
    }

    async fn find_class(&self, id: ClassId) -> Result<Option<FitnessClass>, StoreError> {
        let row = sqlx::query_as::<_, ClassRow>(
            "SELECT id, name, description, schedule, capacity, is_active, trainer_id, created_at \
             FROM classes WHERE id = $1",
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(FitnessClass::from))
    }

    async fn insert_class(&self, class: NewClass) -> Result<FitnessClass, StoreError> {
        let row = sqlx::query_as::<_, ClassRow>(
            "INSERT INTO classes (name, description, schedule, capacity, is_active, trainer_id) \
             VALUES ($1, $2, $3, $4, TRUE, $5) \
             RETURNING id, name, description, schedule, capacity, is_active, trainer_id, created_at",
        )
        .bind(&class.name)
        .bind(&class.description)
        .bind(class.schedule)
        .bind(class.capacity)
        .bind(class.trainer_id.map(|t| t.get()))
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn set_class_active(
        &self,
        id: ClassId,
        active: bool,
    ) -> Result<Option<FitnessClass>, StoreError> {
        let row = sqlx::query_as::<_, ClassRow>(
            "UPDATE classes SET is_active = $2 WHERE id = $1 \
             RETURNING id, name, description, schedule, capacity, is_active, trainer_id, created_at",
        )
        .bind(id.get())
        .bind(active)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(FitnessClass::from))
    }

    async fn delete_class(&self, id: ClassId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM classes WHERE id = $1")
            .bind(id.get())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl BookingLedger for PostgresStore {
    async fn begin_admission(&self) -> Result<Box<dyn AdmissionTx>, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Bound the wait on a competing admission's class-row lock; a
        // timeout aborts with SQLSTATE 55P03 and classifies as transient.
        let stmt = format!("SET LOCAL lock_timeout = '{}ms'", self.lock_timeout_ms);
        sqlx::query(&stmt).execute(&mut *tx).await?;

        Ok(Box::new(PgAdmissionTx { tx }))
    }

    async fn find_booking(&self, id: BookingId) -> Result<Option<Booking>, StoreError> {
        let row = sqlx::query_as::<_, BookingRow>(
            "SELECT id, member_id, class_id, created_at FROM bookings WHERE id = $1",
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Booking::from))
    }

    async fn delete_booking(&self, id: BookingId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(id.get())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn bookings_for_member(
        &self,
        member_id: MemberId,
    ) -> Result<Vec<BookingWithClass>, StoreError> {
        let rows = sqlx::query_as::<_, BookingWithClassRow>(
            "SELECT b.id, b.member_id, b.class_id, b.created_at, \
             c.name AS c_name, c.description AS c_description, c.schedule AS c_schedule, \
             c.capacity AS c_capacity, c.is_active AS c_is_active, \
             c.trainer_id AS c_trainer_id, c.created_at AS c_created_at \
             FROM bookings b JOIN classes c ON c.id = b.class_id \
             WHERE b.member_id = $1 ORDER BY b.created_at DESC",
        )
        .bind(member_id.get())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(BookingWithClassRow::into_joined).collect())
    }
}

/// Scoped admission transaction over a `sqlx` Postgres transaction.
///
/// Dropping the struct without [`AdmissionTx::commit`] rolls the
/// transaction back through `sqlx`'s `Drop` implementation.
struct PgAdmissionTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl AdmissionTx for PgAdmissionTx {
    async fn class_with_booking_count(
        &mut self,
        class_id: ClassId,
    ) -> Result<Option<(FitnessClass, i64)>, StoreError> {
        // FOR UPDATE serializes competing admissions on the same class:
        // the count below stays accurate until this transaction ends.
        let row = sqlx::query_as::<_, ClassRow>(
            "SELECT id, name, description, schedule, capacity, is_active, trainer_id, created_at \
             FROM classes WHERE id = $1 FOR UPDATE",
        )
        .bind(class_id.get())
        .fetch_optional(&mut *self.tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM bookings WHERE class_id = $1",
        )
        .bind(class_id.get())
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(Some((row.into(), count)))
    }

    async fn booking_exists(
        &mut self,
        member_id: MemberId,
        class_id: ClassId,
    ) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM bookings WHERE member_id = $1 AND class_id = $2)",
        )
        .bind(member_id.get())
        .bind(class_id.get())
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(exists)
    }

    async fn insert_booking(
        &mut self,
        member_id: MemberId,
        class_id: ClassId,
    ) -> Result<BookingId, StoreError> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO bookings (member_id, class_id) VALUES ($1, $2) RETURNING id",
        )
        .bind(member_id.get())
        .bind(class_id.get())
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(BookingId::new(id))
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PackageWithCountRow {
    #[sqlx(flatten)]
    package: PackageRow,
    member_count: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct ClassDetailsRow {
    id: i64,
    name: String,
    description: Option<String>,
    schedule: DateTime<Utc>,
    capacity: i32,
    is_active: bool,
    trainer_id: Option<i64>,
    created_at: DateTime<Utc>,
    t_id: Option<i64>,
    t_name: Option<String>,
    t_specialty: Option<String>,
    t_bio: Option<String>,
    t_image_url: Option<String>,
    t_created_at: Option<DateTime<Utc>>,
    booked_count: i64,
}

impl ClassDetailsRow {
    fn into_details(self) -> ClassDetails {
        let trainer = match (self.t_id, self.t_name, self.t_specialty, self.t_created_at) {
            (Some(id), Some(name), Some(specialty), Some(created_at)) => Some(Trainer {
                id: TrainerId::new(id),
                name,
                specialty,
                bio: self.t_bio,
                image_url: self.t_image_url,
                created_at,
            }),
            _ => None,
        };

        ClassDetails {
            class: FitnessClass {
                id: ClassId::new(self.id),
                name: self.name,
                description: self.description,
                schedule: self.schedule,
                capacity: self.capacity,
                is_active: self.is_active,
                trainer_id: self.trainer_id.map(TrainerId::new),
                created_at: self.created_at,
            },
            trainer,
            booked_count: self.booked_count,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct BookingWithClassRow {
    id: i64,
    member_id: i64,
    class_id: i64,
    created_at: DateTime<Utc>,
    c_name: String,
    c_description: Option<String>,
    c_schedule: DateTime<Utc>,
    c_capacity: i32,
    c_is_active: bool,
    c_trainer_id: Option<i64>,
    c_created_at: DateTime<Utc>,
}

impl BookingWithClassRow {
    fn into_joined(self) -> BookingWithClass {
        BookingWithClass {
            booking: Booking {
                id: BookingId::new(self.id),
                member_id: MemberId::new(self.member_id),
                class_id: ClassId::new(self.class_id),
                created_at: self.created_at,
            },
            class: FitnessClass {
                id: ClassId::new(self.class_id),
                name: self.c_name,
                description: self.c_description,
                schedule: self.c_schedule,
                capacity: self.c_capacity,
                is_active: self.c_is_active,
                trainer_id: self.c_trainer_id.map(TrainerId::new),
                created_at: self.c_created_at,
            },
        }
    }
}
