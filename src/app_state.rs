//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::auth::TokenService;
use crate::persistence::PostgresStore;
use crate::service::{AdmissionService, MembershipService};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Booking admission and cancellation.
    pub admission: Arc<AdmissionService>,
    /// Subscription purchases and validity queries.
    pub memberships: Arc<MembershipService>,
    /// Direct store access for the CRUD surface (members, trainers,
    /// classes, packages).
    pub store: Arc<PostgresStore>,
    /// Token issuing and validation.
    pub tokens: Arc<TokenService>,
}
