//! Persistence layer: store contracts and their implementations.
//!
//! The contracts in [`contracts`] are what the service layer sees.
//! [`postgres`] is the production implementation; [`memory`] is the
//! in-memory substitute the test-suite runs the concurrency properties
//! against.

pub mod contracts;
pub mod memory;
pub mod models;
pub mod postgres;

pub use contracts::{
    AdmissionTx, BookingLedger, ClassCatalog, MembershipLedger, PackageCatalog, StoreError,
};
pub use memory::MemoryStore;
pub use postgres::PostgresStore;
