//! REST endpoint handlers organized by resource.

pub mod auth;
pub mod bookings;
pub mod classes;
pub mod packages;
pub mod system;
pub mod trainers;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(auth::routes())
        .merge(bookings::routes())
        .merge(classes::routes())
        .merge(packages::routes())
        .merge(trainers::routes())
}
