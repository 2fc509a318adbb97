//! REST API layer: route handlers, DTOs, and router composition.
//!
//! All endpoints are mounted under `/api/v1` except the system routes.

pub mod dto;
pub mod handlers;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI document aggregating every endpoint and schema.
#[derive(Debug, OpenApi)]
#[openapi(
    paths(
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::session,
        handlers::auth::list_users,
        handlers::auth::update_profile,
        handlers::bookings::create_booking,
        handlers::bookings::list_bookings,
        handlers::bookings::cancel_booking,
        handlers::classes::list_classes,
        handlers::classes::create_class,
        handlers::classes::toggle_class,
        handlers::classes::delete_class,
        handlers::packages::list_packages,
        handlers::packages::list_all_packages,
        handlers::packages::create_package,
        handlers::packages::subscribe,
        handlers::packages::my_active_subscription,
        handlers::packages::subscription_history,
        handlers::trainers::list_trainers,
        handlers::trainers::create_trainer,
        handlers::trainers::delete_trainer,
        handlers::system::health_handler,
    ),
    tags(
        (name = "Auth", description = "Registration, login, and profile"),
        (name = "Bookings", description = "Seat reservation and cancellation"),
        (name = "Classes", description = "Class catalog"),
        (name = "Packages", description = "Membership packages and subscriptions"),
        (name = "Trainers", description = "Trainer profiles"),
        (name = "System", description = "Health and diagnostics"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes())
}
