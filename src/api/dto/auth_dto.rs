//! Registration, login, and profile DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Member, Role};

/// Request body for `POST /auth/register`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    /// First name.
    pub name: String,
    /// Optional last name.
    #[serde(default)]
    pub last_name: Option<String>,
    /// Optional phone number.
    #[serde(default)]
    pub phone: Option<String>,
    /// Login email.
    pub email: String,
    /// Plaintext password; hashed before storage.
    pub password: String,
}

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Login email.
    pub email: String,
    /// Plaintext password.
    pub password: String,
}

/// Request body for `PUT /auth/profile`. Absent fields stay unchanged.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    /// New first name.
    #[serde(default)]
    pub name: Option<String>,
    /// New plaintext password; hashed before storage.
    #[serde(default)]
    pub password: Option<String>,
}

/// A member account as exposed to callers. Never carries the password
/// hash.
#[derive(Debug, Serialize, ToSchema)]
pub struct MemberDto {
    /// Account id.
    pub id: i64,
    /// First name.
    pub name: String,
    /// Last name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Phone number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Login email.
    pub email: String,
    /// Member or admin.
    pub role: Role,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<Member> for MemberDto {
    fn from(member: Member) -> Self {
        Self {
            id: member.id.get(),
            name: member.name,
            last_name: member.last_name,
            phone: member.phone,
            email: member.email,
            role: member.role,
            created_at: member.created_at,
        }
    }
}

/// Response body for `POST /auth/login`.
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    /// Bearer token for subsequent requests.
    pub token: String,
    /// The authenticated account.
    pub user: MemberDto,
}

/// Response body for `GET /auth/session`.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    /// The account behind the presented token.
    pub user: MemberDto,
}
