//! Axum extractors for authenticated callers.
//!
//! Protected handlers take [`CurrentMember`] as an argument; admin-only
//! handlers take [`AdminMember`]. Extraction reads the
//! `Authorization: Bearer` header, validates the token, and converts the
//! claims at the trust boundary. A missing header is a 401; a bad or
//! expired token is a 403.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use super::jwt::CurrentMember;
use crate::app_state::AppState;
use crate::domain::Role;
use crate::error::ApiError;

impl FromRequestParts<AppState> for CurrentMember {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Reuse an identity already extracted earlier in this request.
        if let Some(member) = parts.extensions.get::<CurrentMember>() {
            return Ok(member.clone());
        }

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        let Some(header) = header else {
            return Err(ApiError::Unauthenticated);
        };
        let Some(token) = header.strip_prefix("Bearer ") else {
            return Err(ApiError::Unauthenticated);
        };

        let claims = state.tokens.verify(token)?;
        let member = CurrentMember::try_from(claims)?;

        parts.extensions.insert(member.clone());
        Ok(member)
    }
}

/// Extractor wrapper requiring the admin role.
#[derive(Debug, Clone)]
pub struct AdminMember(pub CurrentMember);

impl FromRequestParts<AppState> for AdminMember {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let member = CurrentMember::from_request_parts(parts, state).await?;
        if member.role != Role::Admin {
            return Err(ApiError::AdminOnly);
        }
        Ok(Self(member))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Arc;

    use axum::http::Request;
    use chrono::{Duration, Utc};
    use sqlx::postgres::PgPoolOptions;

    use super::*;
    use crate::auth::TokenService;
    use crate::domain::{Member, MemberId};
    use crate::persistence::{MemoryStore, PostgresStore};
    use crate::service::{AdmissionService, MembershipService, RetryPolicy};

    fn make_state() -> AppState {
        let store = MemoryStore::new();
        let Ok(pool) = PgPoolOptions::new().connect_lazy("postgres://localhost/unused") else {
            panic!("lazy pool construction failed");
        };
        AppState {
            admission: Arc::new(AdmissionService::new(
                Arc::new(store.clone()),
                Arc::new(store.clone()),
                RetryPolicy::default(),
            )),
            memberships: Arc::new(MembershipService::new(
                Arc::new(store.clone()),
                Arc::new(store),
            )),
            store: Arc::new(PostgresStore::new(pool, 5000)),
            tokens: Arc::new(TokenService::new(
                "test-secret-at-least-32-characters!!",
                Duration::hours(1),
            )),
        }
    }

    fn member(role: Role) -> Member {
        Member {
            id: MemberId::new(7),
            name: "Ada".to_string(),
            last_name: None,
            phone: None,
            email: "ada@example.com".to_string(),
            role,
            created_at: Utc::now(),
        }
    }

    fn parts_with_header(header: Option<String>) -> Parts {
        let mut builder = Request::builder().uri("/api/v1/bookings");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        let Ok(request) = builder.body(()) else {
            panic!("request construction failed");
        };
        request.into_parts().0
    }

    #[tokio::test]
    async fn a_valid_bearer_token_authenticates() {
        let state = make_state();
        let Ok(token) = state.tokens.issue(&member(Role::Member), Utc::now()) else {
            panic!("issuing failed");
        };
        let mut parts = parts_with_header(Some(format!("Bearer {token}")));

        let Ok(current) = CurrentMember::from_request_parts(&mut parts, &state).await else {
            panic!("extraction failed");
        };
        assert_eq!(current.id, MemberId::new(7));
        assert_eq!(current.role, Role::Member);
    }

    #[tokio::test]
    async fn a_missing_header_is_unauthenticated() {
        let state = make_state();
        let mut parts = parts_with_header(None);

        let result = CurrentMember::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(ApiError::Unauthenticated)));
    }

    #[tokio::test]
    async fn a_tampered_token_is_forbidden() {
        let state = make_state();
        let mut parts = parts_with_header(Some("Bearer bogus.token.here".to_string()));

        let result = CurrentMember::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(ApiError::InvalidToken)));
    }

    #[tokio::test]
    async fn a_regular_member_cannot_pass_the_admin_gate() {
        let state = make_state();
        let Ok(token) = state.tokens.issue(&member(Role::Member), Utc::now()) else {
            panic!("issuing failed");
        };
        let mut parts = parts_with_header(Some(format!("Bearer {token}")));

        let result = AdminMember::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(ApiError::AdminOnly)));
    }

    #[tokio::test]
    async fn an_admin_passes_the_admin_gate() {
        let state = make_state();
        let Ok(token) = state.tokens.issue(&member(Role::Admin), Utc::now()) else {
            panic!("issuing failed");
        };
        let mut parts = parts_with_header(Some(format!("Bearer {token}")));

        let result = AdminMember::from_request_parts(&mut parts, &state).await;
        assert!(result.is_ok());
    }
}
