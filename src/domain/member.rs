//! Member accounts and roles.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::MemberId;

/// Authorization role attached to every member account.
///
/// The platform only distinguishes regular members from administrators;
/// there is no finer-grained permission model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Role {
    /// Regular gym member: may subscribe, book, and cancel own bookings.
    #[serde(rename = "MEMBER")]
    Member,
    /// Administrator: manages classes, trainers, and packages.
    #[serde(rename = "ADMIN")]
    Admin,
}

impl Role {
    /// Returns the canonical storage string for this role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Member => "MEMBER",
            Self::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a stored or transmitted role string is not recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role: {}", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MEMBER" => Ok(Self::Member),
            "ADMIN" => Ok(Self::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// A registered member account.
///
/// The password hash never leaves the persistence layer; this struct is
/// what the rest of the crate sees.
#[derive(Debug, Clone)]
pub struct Member {
    /// Account id.
    pub id: MemberId,
    /// First name.
    pub name: String,
    /// Last name, if provided at registration.
    pub last_name: Option<String>,
    /// Contact phone number, if provided.
    pub phone: Option<String>,
    /// Login email, unique per account.
    pub email: String,
    /// Member or admin.
    pub role: Role,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}

/// Data for creating a new member account.
#[derive(Debug, Clone)]
pub struct NewMember {
    /// First name.
    pub name: String,
    /// Optional last name.
    pub last_name: Option<String>,
    /// Optional phone number.
    pub phone: Option<String>,
    /// Login email.
    pub email: String,
    /// Argon2 PHC-format password hash.
    pub password_hash: String,
    /// Role; registration always uses [`Role::Member`].
    pub role: Role,
}
