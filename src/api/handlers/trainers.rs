//! Trainer endpoint handlers.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};

use crate::api::dto::{CreateTrainerRequest, MessageResponse, TrainerDto};
use crate::app_state::AppState;
use crate::auth::AdminMember;
use crate::domain::{NewTrainer, TrainerId};
use crate::error::{ApiError, ErrorResponse};

/// `GET /trainers/all` — Every trainer, newest first.
///
/// # Errors
///
/// Returns [`ApiError::StoreFailure`] on store trouble.
#[utoipa::path(
    get,
    path = "/api/v1/trainers/all",
    tag = "Trainers",
    summary = "List trainers",
    description = "Returns all trainer profiles, newest first. Public.",
    responses(
        (status = 200, description = "Trainer list", body = Vec<TrainerDto>),
    )
)]
pub async fn list_trainers(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let trainers = state.store.list_trainers().await?;
    let dtos: Vec<TrainerDto> = trainers.into_iter().map(TrainerDto::from).collect();
    Ok(Json(dtos))
}

/// `POST /trainers/create` — Add a trainer (admin only).
///
/// # Errors
///
/// Returns [`ApiError::InvalidInput`] on missing name or specialty.
#[utoipa::path(
    post,
    path = "/api/v1/trainers/create",
    tag = "Trainers",
    summary = "Add a trainer",
    description = "Creates a trainer profile.",
    request_body = CreateTrainerRequest,
    responses(
        (status = 200, description = "Trainer created", body = TrainerDto),
        (status = 400, description = "Missing fields", body = ErrorResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse),
    )
)]
pub async fn create_trainer(
    State(state): State<AppState>,
    _admin: AdminMember,
    Json(req): Json<CreateTrainerRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.name.trim().is_empty() || req.specialty.trim().is_empty() {
        return Err(ApiError::InvalidInput(
            "name and specialty are required".to_string(),
        ));
    }

    let trainer = state
        .store
        .insert_trainer(NewTrainer {
            name: req.name,
            specialty: req.specialty,
            bio: req.bio,
        })
        .await?;

    tracing::info!(trainer_id = %trainer.id, "trainer created");
    Ok(Json(TrainerDto::from(trainer)))
}

/// `DELETE /trainers/:id` — Remove a trainer (admin only).
///
/// Classes keep running; their trainer link is cleared by the schema.
///
/// # Errors
///
/// Returns [`ApiError::NotFound`] when the trainer does not exist.
#[utoipa::path(
    delete,
    path = "/api/v1/trainers/{id}",
    tag = "Trainers",
    summary = "Remove a trainer",
    description = "Deletes a trainer profile. Assigned classes lose the link but stay scheduled.",
    params(
        ("id" = i64, Path, description = "Trainer id"),
    ),
    responses(
        (status = 200, description = "Trainer deleted", body = MessageResponse),
        (status = 404, description = "Trainer not found", body = ErrorResponse),
    )
)]
pub async fn delete_trainer(
    State(state): State<AppState>,
    _admin: AdminMember,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let trainer_id = TrainerId::try_from(id)?;

    if !state.store.delete_trainer(trainer_id).await? {
        return Err(ApiError::NotFound("trainer"));
    }

    tracing::info!(trainer_id = %trainer_id, "trainer deleted");
    Ok(Json(MessageResponse::new("Trainer deleted")))
}

/// Trainer routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/trainers/all", get(list_trainers))
        .route("/trainers/create", post(create_trainer))
        .route("/trainers/{id}", delete(delete_trainer))
}
