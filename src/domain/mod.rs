//! Domain layer: entities and typed identifiers.
//!
//! This module contains the business entities of the booking platform —
//! members, trainers, packages, subscriptions, classes, and bookings —
//! together with the small invariant helpers (validity windows, capacity
//! checks) the service layer builds on.

pub mod booking;
pub mod fitness_class;
pub mod ids;
pub mod member;
pub mod package;
pub mod subscription;
pub mod trainer;

pub use booking::{Booking, BookingWithClass};
pub use fitness_class::{ClassDetails, FitnessClass, NewClass};
pub use ids::{BookingId, ClassId, InvalidId, MemberId, PackageId, SubscriptionId, TrainerId};
pub use member::{Member, NewMember, Role};
pub use package::{NewPackage, Package};
pub use subscription::{NewSubscription, Subscription};
pub use trainer::{NewTrainer, Trainer};
