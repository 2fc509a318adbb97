//! Package endpoint handlers: catalog, purchase, history.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::Utc;

use crate::api::dto::{
    CreatePackageRequest, MessageResponse, PackageDto, PackageWithMembersDto, SubscribeRequest,
    SubscriptionDto,
};
use crate::app_state::AppState;
use crate::auth::{AdminMember, CurrentMember};
use crate::domain::{NewPackage, PackageId};
use crate::error::{ApiError, ErrorResponse};
use crate::persistence::PackageCatalog;

/// `GET /packages` — Purchasable packages, cheapest first.
///
/// # Errors
///
/// Returns [`ApiError::StoreFailure`] on store trouble.
#[utoipa::path(
    get,
    path = "/api/v1/packages",
    tag = "Packages",
    summary = "List purchasable packages",
    description = "Returns active packages, cheapest first. Public.",
    responses(
        (status = 200, description = "Package list", body = Vec<PackageDto>),
    )
)]
pub async fn list_packages(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let packages = state.store.list_active_packages().await?;
    let dtos: Vec<PackageDto> = packages.into_iter().map(PackageDto::from).collect();
    Ok(Json(dtos))
}

/// `GET /packages/all` — Every package with subscriber counts (admin).
///
/// # Errors
///
/// Returns [`ApiError::AdminOnly`] for non-admin callers.
#[utoipa::path(
    get,
    path = "/api/v1/packages/all",
    tag = "Packages",
    summary = "List all packages",
    description = "Returns every package, inactive included, with its subscriber count.",
    responses(
        (status = 200, description = "Package list with counts", body = Vec<PackageWithMembersDto>),
        (status = 403, description = "Admin access required", body = ErrorResponse),
    )
)]
pub async fn list_all_packages(
    State(state): State<AppState>,
    _admin: AdminMember,
) -> Result<impl IntoResponse, ApiError> {
    let packages = state.store.list_all_packages().await?;
    let dtos: Vec<PackageWithMembersDto> = packages
        .into_iter()
        .map(|(package, member_count)| PackageWithMembersDto {
            package: package.into(),
            member_count,
        })
        .collect();
    Ok(Json(dtos))
}

/// `POST /packages` — Create a package (admin only).
///
/// # Errors
///
/// Returns [`ApiError::InvalidInput`] on missing name, negative price,
/// or non-positive duration.
#[utoipa::path(
    post,
    path = "/api/v1/packages",
    tag = "Packages",
    summary = "Create a package",
    description = "Creates a package, open for purchase.",
    request_body = CreatePackageRequest,
    responses(
        (status = 200, description = "Package created", body = PackageDto),
        (status = 400, description = "Invalid fields", body = ErrorResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse),
    )
)]
pub async fn create_package(
    State(state): State<AppState>,
    _admin: AdminMember,
    Json(req): Json<CreatePackageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.name.trim().is_empty() {
        return Err(ApiError::InvalidInput("name is required".to_string()));
    }
    if req.price < 0.0 {
        return Err(ApiError::InvalidInput(
            "price cannot be negative".to_string(),
        ));
    }
    if req.duration_days <= 0 {
        return Err(ApiError::InvalidInput(
            "duration must be at least one day".to_string(),
        ));
    }

    let package = state
        .store
        .insert_package(NewPackage {
            name: req.name,
            description: req.description,
            price: req.price,
            duration_days: req.duration_days,
        })
        .await?;

    tracing::info!(package_id = %package.id, "package created");
    Ok(Json(PackageDto::from(package)))
}

/// `POST /packages/subscribe` — Purchase a package.
///
/// # Errors
///
/// Returns [`ApiError::NotFound`] for a missing or inactive package and
/// [`ApiError::SubscriptionActive`] while an unexpired subscription
/// exists.
#[utoipa::path(
    post,
    path = "/api/v1/packages/subscribe",
    tag = "Packages",
    summary = "Purchase a package",
    description = "Opens a subscription window of the package's duration starting now, snapshotting name and price.",
    request_body = SubscribeRequest,
    responses(
        (status = 200, description = "Subscription created", body = SubscriptionDto),
        (status = 400, description = "Unexpired subscription exists", body = ErrorResponse),
        (status = 404, description = "Package missing or inactive", body = ErrorResponse),
    )
)]
pub async fn subscribe(
    State(state): State<AppState>,
    member: CurrentMember,
    Json(req): Json<SubscribeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let package_id = PackageId::try_from(req.package_id)?;

    let subscription = state
        .memberships
        .subscribe(member.id, package_id, Utc::now())
        .await?;

    Ok(Json(SubscriptionDto::from(subscription)))
}

/// `GET /packages/my-active` — The caller's current subscription.
///
/// # Errors
///
/// Returns [`ApiError::StoreFailure`] on store trouble.
#[utoipa::path(
    get,
    path = "/api/v1/packages/my-active",
    tag = "Packages",
    summary = "Current subscription",
    description = "Returns the subscription covering now, or null. With overlapping windows the one expiring last wins.",
    responses(
        (status = 200, description = "Current subscription, or null without one", body = SubscriptionDto),
        (status = 401, description = "Missing token", body = ErrorResponse),
    )
)]
pub async fn my_active_subscription(
    State(state): State<AppState>,
    member: CurrentMember,
) -> Result<impl IntoResponse, ApiError> {
    let subscription = state
        .memberships
        .active_subscription(member.id, Utc::now())
        .await?;
    Ok(Json(subscription.map(SubscriptionDto::from)))
}

/// `GET /packages/history` — The caller's purchase history.
///
/// # Errors
///
/// Returns [`ApiError::StoreFailure`] on store trouble.
#[utoipa::path(
    get,
    path = "/api/v1/packages/history",
    tag = "Packages",
    summary = "Purchase history",
    description = "Returns every subscription the member has purchased, most recent first.",
    responses(
        (status = 200, description = "Purchase history", body = Vec<SubscriptionDto>),
        (status = 401, description = "Missing token", body = ErrorResponse),
    )
)]
pub async fn subscription_history(
    State(state): State<AppState>,
    member: CurrentMember,
) -> Result<impl IntoResponse, ApiError> {
    let history = state.memberships.history(member.id).await?;
    let dtos: Vec<SubscriptionDto> = history.into_iter().map(SubscriptionDto::from).collect();
    Ok(Json(dtos))
}

/// `DELETE /packages/:id` — Delete a package (admin only).
///
/// # Errors
///
/// Returns [`ApiError::NotFound`] when the package does not exist.
#[utoipa::path(
    delete,
    path = "/api/v1/packages/{id}",
    tag = "Packages",
    summary = "Delete a package",
    description = "Removes a package from the catalog. Purchase history keeps its snapshots.",
    params(
        ("id" = i64, Path, description = "Package id"),
    ),
    responses(
        (status = 200, description = "Package deleted", body = MessageResponse),
        (status = 404, description = "Package not found", body = ErrorResponse),
    )
)]
pub async fn delete_package(
    State(state): State<AppState>,
    _admin: AdminMember,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let package_id = PackageId::try_from(id)?;

    if !state.store.delete_package(package_id).await? {
        return Err(ApiError::NotFound("package"));
    }

    tracing::info!(package_id = %package_id, "package deleted");
    Ok(Json(MessageResponse::new("Package deleted")))
}

/// Package routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/packages", get(list_packages).post(create_package))
        .route("/packages/all", get(list_all_packages))
        .route("/packages/subscribe", post(subscribe))
        .route("/packages/my-active", get(my_active_subscription))
        .route("/packages/history", get(subscription_history))
        .route("/packages/{id}", delete(delete_package))
}
