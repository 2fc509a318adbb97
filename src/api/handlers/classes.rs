//! Class catalog handlers: list, create, toggle, delete.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{delete, get, put};
use axum::{Json, Router};
use chrono::Utc;

use crate::api::dto::{ClassDetailsDto, ClassDto, CreateClassRequest, MessageResponse};
use crate::app_state::AppState;
use crate::auth::AdminMember;
use crate::domain::{ClassId, NewClass, TrainerId};
use crate::error::{ApiError, ErrorResponse};
use crate::persistence::ClassCatalog;

/// `GET /classes` — Every class with trainer and booking count.
///
/// # Errors
///
/// Returns [`ApiError::StoreFailure`] on store trouble.
#[utoipa::path(
    get,
    path = "/api/v1/classes",
    tag = "Classes",
    summary = "List classes",
    description = "Returns all classes with their trainer and current booking count, earliest schedule first. Public.",
    responses(
        (status = 200, description = "Class list", body = Vec<ClassDetailsDto>),
    )
)]
pub async fn list_classes(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let classes = state.store.list_classes().await?;
    let dtos: Vec<ClassDetailsDto> = classes.into_iter().map(ClassDetailsDto::from).collect();
    Ok(Json(dtos))
}

/// `POST /classes` — Create a class (admin only).
///
/// # Errors
///
/// Returns [`ApiError::InvalidInput`] for a non-positive capacity or a
/// schedule that is not in the future.
#[utoipa::path(
    post,
    path = "/api/v1/classes",
    tag = "Classes",
    summary = "Create a class",
    description = "Creates a class, open for booking. The schedule must be in the future and the capacity positive.",
    request_body = CreateClassRequest,
    responses(
        (status = 200, description = "Class created", body = ClassDto),
        (status = 400, description = "Invalid capacity or schedule", body = ErrorResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse),
    )
)]
pub async fn create_class(
    State(state): State<AppState>,
    _admin: AdminMember,
    Json(req): Json<CreateClassRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.name.trim().is_empty() {
        return Err(ApiError::InvalidInput("name is required".to_string()));
    }
    if req.capacity <= 0 {
        return Err(ApiError::InvalidInput(
            "capacity must be greater than 0".to_string(),
        ));
    }
    if req.schedule <= Utc::now() {
        return Err(ApiError::InvalidInput(
            "schedule must be in the future".to_string(),
        ));
    }
    let trainer_id = req.trainer_id.map(TrainerId::try_from).transpose()?;

    let class = state
        .store
        .insert_class(NewClass {
            name: req.name,
            description: req.description,
            schedule: req.schedule,
            capacity: req.capacity,
            trainer_id,
        })
        .await?;

    tracing::info!(class_id = %class.id, "class created");
    Ok(Json(ClassDto::from(class)))
}

/// `PUT /classes/:id/toggle` — Flip the booking gate (admin only).
///
/// # Errors
///
/// Returns [`ApiError::NotFound`] when the class does not exist.
#[utoipa::path(
    put,
    path = "/api/v1/classes/{id}/toggle",
    tag = "Classes",
    summary = "Toggle booking gate",
    description = "Flips whether a class accepts new bookings.",
    params(
        ("id" = i64, Path, description = "Class id"),
    ),
    responses(
        (status = 200, description = "Updated class", body = ClassDto),
        (status = 404, description = "Class not found", body = ErrorResponse),
    )
)]
pub async fn toggle_class(
    State(state): State<AppState>,
    _admin: AdminMember,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let class_id = ClassId::try_from(id)?;

    let Some(class) = state.store.find_class(class_id).await? else {
        return Err(ApiError::NotFound("class"));
    };
    let Some(updated) = state
        .store
        .set_class_active(class_id, !class.is_active)
        .await?
    else {
        return Err(ApiError::NotFound("class"));
    };

    tracing::info!(class_id = %class_id, is_active = updated.is_active, "booking gate toggled");
    Ok(Json(ClassDto::from(updated)))
}

/// `DELETE /classes/:id` — Delete a class and its bookings (admin only).
///
/// # Errors
///
/// Returns [`ApiError::NotFound`] when the class does not exist.
#[utoipa::path(
    delete,
    path = "/api/v1/classes/{id}",
    tag = "Classes",
    summary = "Delete a class",
    description = "Deletes a class; its bookings go with it.",
    params(
        ("id" = i64, Path, description = "Class id"),
    ),
    responses(
        (status = 200, description = "Class deleted", body = MessageResponse),
        (status = 404, description = "Class not found", body = ErrorResponse),
    )
)]
pub async fn delete_class(
    State(state): State<AppState>,
    _admin: AdminMember,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let class_id = ClassId::try_from(id)?;

    if !state.store.delete_class(class_id).await? {
        return Err(ApiError::NotFound("class"));
    }

    tracing::info!(class_id = %class_id, "class deleted");
    Ok(Json(MessageResponse::new("Class deleted")))
}

/// Class routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/classes", get(list_classes).post(create_class))
        .route("/classes/{id}/toggle", put(toggle_class))
        .route("/classes/{id}", delete(delete_class))
}
