//! Auth endpoint handlers: registration, login, session, profile.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::Utc;

use crate::api::dto::{
    LoginRequest, LoginResponse, MemberDto, RegisterRequest, SessionResponse, UpdateProfileRequest,
};
use crate::app_state::AppState;
use crate::auth::{AdminMember, CurrentMember, hash_password, verify_password};
use crate::domain::{NewMember, Role};
use crate::error::{ApiError, ErrorResponse};
use crate::persistence::StoreError;

/// `POST /auth/register` — Create a member account.
///
/// Registration always produces a regular member; roles are never
/// caller-supplied.
///
/// # Errors
///
/// Returns [`ApiError::InvalidInput`] on missing fields and
/// [`ApiError::EmailTaken`] when the email is already registered.
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "Auth",
    summary = "Register",
    description = "Creates a member account. The password is stored as an Argon2 hash.",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created", body = MemberDto),
        (status = 400, description = "Missing fields or email already registered", body = ErrorResponse),
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.name.trim().is_empty() || req.email.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::InvalidInput(
            "name, email, and password are required".to_string(),
        ));
    }

    let password_hash = hash_password(&req.password)?;
    let member = state
        .store
        .insert_member(NewMember {
            name: req.name,
            last_name: req.last_name,
            phone: req.phone,
            email: req.email,
            password_hash,
            role: Role::Member,
        })
        .await
        .map_err(|err| match err {
            StoreError::Duplicate(_) => ApiError::EmailTaken,
            other => other.into(),
        })?;

    tracing::info!(member_id = %member.id, "member registered");
    Ok(Json(MemberDto::from(member)))
}

/// `POST /auth/login` — Verify credentials and issue a token.
///
/// # Errors
///
/// Returns [`ApiError::InvalidCredentials`] for an unknown email or a
/// wrong password, without distinguishing the two.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Auth",
    summary = "Log in",
    description = "Verifies credentials and returns a bearer token with the account.",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::InvalidInput(
            "email and password are required".to_string(),
        ));
    }

    let Some((member, stored_hash)) = state.store.find_member_by_email(&req.email).await? else {
        return Err(ApiError::InvalidCredentials);
    };
    if !verify_password(&req.password, &stored_hash) {
        return Err(ApiError::InvalidCredentials);
    }

    let token = state.tokens.issue(&member, Utc::now())?;
    tracing::info!(member_id = %member.id, "member logged in");

    Ok(Json(LoginResponse {
        token,
        user: member.into(),
    }))
}

/// `GET /auth/session` — The account behind the presented token.
///
/// # Errors
///
/// Returns [`ApiError::NotFound`] when the account behind a valid token
/// no longer exists.
#[utoipa::path(
    get,
    path = "/api/v1/auth/session",
    tag = "Auth",
    summary = "Check session",
    description = "Validates the bearer token and returns the current account.",
    responses(
        (status = 200, description = "Token is valid", body = SessionResponse),
        (status = 401, description = "Missing token", body = ErrorResponse),
        (status = 403, description = "Invalid or expired token", body = ErrorResponse),
    )
)]
pub async fn session(
    State(state): State<AppState>,
    member: CurrentMember,
) -> Result<impl IntoResponse, ApiError> {
    let Some(account) = state.store.find_member(member.id).await? else {
        return Err(ApiError::NotFound("member"));
    };

    Ok(Json(SessionResponse {
        user: account.into(),
    }))
}

/// `GET /auth/users` — All member accounts (admin only).
///
/// # Errors
///
/// Returns [`ApiError::AdminOnly`] for non-admin callers.
#[utoipa::path(
    get,
    path = "/api/v1/auth/users",
    tag = "Auth",
    summary = "List accounts",
    description = "Returns every account, oldest first. Admin only.",
    responses(
        (status = 200, description = "Account list", body = Vec<MemberDto>),
        (status = 403, description = "Admin access required", body = ErrorResponse),
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminMember,
) -> Result<impl IntoResponse, ApiError> {
    let members = state.store.list_members().await?;
    let dtos: Vec<MemberDto> = members.into_iter().map(MemberDto::from).collect();
    Ok(Json(dtos))
}

/// `PUT /auth/profile` — Update own name and/or password.
///
/// # Errors
///
/// Returns [`ApiError::InvalidInput`] when neither field is supplied.
#[utoipa::path(
    put,
    path = "/api/v1/auth/profile",
    tag = "Auth",
    summary = "Update profile",
    description = "Updates the authenticated member's name and/or password. Absent fields stay unchanged.",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = MemberDto),
        (status = 400, description = "No fields to update", body = ErrorResponse),
    )
)]
pub async fn update_profile(
    State(state): State<AppState>,
    member: CurrentMember,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = req.name.as_deref().filter(|n| !n.trim().is_empty());
    let password = req.password.as_deref().filter(|p| !p.is_empty());
    if name.is_none() && password.is_none() {
        return Err(ApiError::InvalidInput("nothing to update".to_string()));
    }

    let password_hash = password.map(hash_password).transpose()?;
    let Some(updated) = state
        .store
        .update_member_profile(member.id, name, password_hash.as_deref())
        .await?
    else {
        return Err(ApiError::NotFound("member"));
    };

    Ok(Json(MemberDto::from(updated)))
}

/// Auth routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/session", get(session))
        .route("/auth/users", get(list_users))
        .route("/auth/profile", put(update_profile))
}
