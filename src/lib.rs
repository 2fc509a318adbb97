//! # fitbook
//!
//! REST API backend for a gym class-booking platform: members purchase
//! time-bounded membership packages and reserve seats in scheduled
//! classes; administrators manage classes, trainers, and packages.
//!
//! The load-bearing piece is the booking admission transaction: the
//! capacity check and the booking insert run inside one scoped store
//! transaction, so concurrent requests can never oversell a class.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── Auth extractors (auth/)
//!     │
//!     ├── AdmissionService (service/)
//!     ├── MembershipService (service/)
//!     │
//!     ├── Store contracts (persistence/contracts)
//!     ├── PostgreSQL / in-memory stores (persistence/)
//!     │
//!     └── Domain entities (domain/)
//! ```

pub mod api;
pub mod app_state;
pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
