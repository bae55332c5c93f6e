use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use relieftrack_core::{OrganizationId, UserId};

use crate::Role;

/// JWT claims model.
///
/// Timestamps are registered-claim seconds since the epoch (`iat`, `exp`), so
/// tokens interoperate with any standard JWT library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject / user identifier.
    pub sub: UserId,

    /// Organization the token acts within.
    pub organization_id: OrganizationId,

    pub email: String,

    /// RBAC roles granted within the organization.
    pub roles: Vec<Role>,

    /// Issued-at (seconds since epoch).
    pub iat: i64,

    /// Expiration (seconds since epoch).
    pub exp: i64,
}

impl JwtClaims {
    pub fn new(
        sub: UserId,
        organization_id: OrganizationId,
        email: impl Into<String>,
        roles: Vec<Role>,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            sub,
            organization_id,
            email: email.into(),
            roles,
            iat: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
        }
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.iat, 0).single()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued in the future)")]
    NotYetValid,

    #[error("invalid token time window (exp <= iat)")]
    InvalidTimeWindow,

    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("token signing failed: {0}")]
    Signing(String),
}

/// Deterministically validate the time window of decoded claims.
pub fn validate_claims(claims: &JwtClaims, now: DateTime<Utc>) -> Result<(), TokenError> {
    if claims.exp <= claims.iat {
        return Err(TokenError::InvalidTimeWindow);
    }
    let now = now.timestamp();
    if now < claims.iat {
        return Err(TokenError::NotYetValid);
    }
    if now >= claims.exp {
        return Err(TokenError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(issued_at: DateTime<Utc>, ttl: Duration) -> JwtClaims {
        JwtClaims::new(
            UserId::new(),
            OrganizationId::new(),
            "admin@relief.org",
            vec![Role::admin()],
            issued_at,
            ttl,
        )
    }

    #[test]
    fn accepts_tokens_inside_their_window() {
        let now = Utc::now();
        assert_eq!(validate_claims(&claims(now, Duration::minutes(60)), now), Ok(()));
    }

    #[test]
    fn rejects_expired_and_future_tokens() {
        let now = Utc::now();
        let c = claims(now - Duration::minutes(61), Duration::minutes(60));
        assert_eq!(validate_claims(&c, now), Err(TokenError::Expired));

        let c = claims(now + Duration::minutes(5), Duration::minutes(60));
        assert_eq!(validate_claims(&c, now), Err(TokenError::NotYetValid));

        let c = claims(now, Duration::zero());
        assert_eq!(validate_claims(&c, now), Err(TokenError::InvalidTimeWindow));
    }

    #[test]
    fn serializes_registered_claim_names() {
        let c = claims(Utc::now(), Duration::minutes(1));
        let json = serde_json::to_value(&c).unwrap();
        assert!(json["iat"].is_i64());
        assert!(json["exp"].is_i64());
        assert_eq!(json["roles"][0], "admin");
    }
}
