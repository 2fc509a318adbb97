//! Token issuing and validation (HS256 JWT).

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::domain::{Member, MemberId, Role};
use crate::error::ApiError;

/// Claims carried in every access token.
///
/// Deserialization is exhaustive: an unknown role string or a
/// non-numeric subject fails validation instead of flowing through the
/// application as loose data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Member id, stringified.
    pub sub: String,
    /// Login email at issue time.
    pub email: String,
    /// Member or admin.
    pub role: Role,
    /// Issued-at, Unix seconds.
    pub iat: i64,
    /// Expiry, Unix seconds.
    pub exp: i64,
}

/// The authenticated caller, as every protected handler sees it.
///
/// Produced only by validating a token and then converting its claims;
/// the id is guaranteed positive and the role is typed.
#[derive(Debug, Clone)]
pub struct CurrentMember {
    /// Account id from the token subject.
    pub id: MemberId,
    /// Email claim.
    pub email: String,
    /// Role claim.
    pub role: Role,
}

impl TryFrom<Claims> for CurrentMember {
    type Error = ApiError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let raw: i64 = claims.sub.parse().map_err(|_| ApiError::InvalidToken)?;
        let id = MemberId::try_from(raw).map_err(|_| ApiError::InvalidToken)?;
        Ok(Self {
            id,
            email: claims.email,
            role: claims.role,
        })
    }
}

/// Issues and validates access tokens.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Creates a token service from the shared secret and token
    /// time-to-live.
    #[must_use]
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    /// Issues a token for `member`, valid from `now` for the configured
    /// time-to-live.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Internal`] when encoding fails.
    pub fn issue(&self, member: &Member, now: DateTime<Utc>) -> Result<String, ApiError> {
        let claims = Claims {
            sub: member.id.to_string(),
            email: member.email.clone(),
            role: member.role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|err| {
            tracing::error!(error = %err, "token encoding failed");
            ApiError::Internal
        })
    }

    /// Validates a token and returns its claims.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidToken`] for anything wrong with the
    /// token: bad signature, malformed payload, or expiry.
    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp"]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| ApiError::InvalidToken)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn member(id: i64, role: Role) -> Member {
        Member {
            id: MemberId::new(id),
            name: "Ada".to_string(),
            last_name: None,
            phone: None,
            email: "ada@example.com".to_string(),
            role,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn issued_tokens_round_trip() {
        let service = TokenService::new("test-secret-at-least-32-characters!!", Duration::hours(1));
        let Ok(token) = service.issue(&member(7, Role::Member), Utc::now()) else {
            panic!("issuing failed");
        };

        let Ok(claims) = service.verify(&token) else {
            panic!("verification failed");
        };
        assert_eq!(claims.sub, "7");
        assert_eq!(claims.email, "ada@example.com");
        assert_eq!(claims.role, Role::Member);

        let Ok(current) = CurrentMember::try_from(claims) else {
            panic!("claims conversion failed");
        };
        assert_eq!(current.id, MemberId::new(7));
    }

    #[test]
    fn a_token_signed_with_another_key_is_rejected() {
        let issuer = TokenService::new("first-secret-first-secret-first-sec!", Duration::hours(1));
        let verifier = TokenService::new("other-secret-other-secret-other-sec!", Duration::hours(1));
        let Ok(token) = issuer.issue(&member(7, Role::Member), Utc::now()) else {
            panic!("issuing failed");
        };

        let result = verifier.verify(&token);
        assert!(matches!(result, Err(ApiError::InvalidToken)));
    }

    #[test]
    fn garbage_is_rejected() {
        let service = TokenService::new("test-secret-at-least-32-characters!!", Duration::hours(1));
        let result = service.verify("not.a.token");
        assert!(matches!(result, Err(ApiError::InvalidToken)));
    }

    #[test]
    fn an_expired_token_is_rejected() {
        let service = TokenService::new("test-secret-at-least-32-characters!!", Duration::hours(1));
        // Issued ten days ago with a one-hour ttl: long past any leeway.
        let Ok(token) = service.issue(&member(7, Role::Member), Utc::now() - Duration::days(10))
        else {
            panic!("issuing failed");
        };

        let result = service.verify(&token);
        assert!(matches!(result, Err(ApiError::InvalidToken)));
    }

    #[test]
    fn claims_with_a_malformed_subject_are_rejected() {
        let claims = Claims {
            sub: "not-a-number".to_string(),
            email: "ada@example.com".to_string(),
            role: Role::Member,
            iat: 0,
            exp: 0,
        };
        assert!(matches!(
            CurrentMember::try_from(claims),
            Err(ApiError::InvalidToken)
        ));

        let negative = Claims {
            sub: "-4".to_string(),
            email: "ada@example.com".to_string(),
            role: Role::Member,
            iat: 0,
            exp: 0,
        };
        assert!(matches!(
            CurrentMember::try_from(negative),
            Err(ApiError::InvalidToken)
        ));
    }
}
