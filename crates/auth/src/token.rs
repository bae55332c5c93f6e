//! HS256 token issue/verification.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use crate::claims::{JwtClaims, TokenError, validate_claims};

/// Verifies bearer tokens and yields their claims.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenError>;
}

/// Shared-secret (HS256) signer and validator.
#[derive(Clone)]
pub struct Hs256Tokens {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl core::fmt::Debug for Hs256Tokens {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hs256Tokens").finish_non_exhaustive()
    }
}

impl Hs256Tokens {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    pub fn issue(&self, claims: &JwtClaims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }
}

impl JwtValidator for Hs256Tokens {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenError> {
        // Signature and shape only; the time window is checked against `now`.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = decode::<JwtClaims>(token, &self.decoding, &validation)
            .map_err(|e| TokenError::Malformed(e.to_string()))?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;
    use chrono::Duration;
    use relieftrack_core::{OrganizationId, UserId};

    fn claims(now: DateTime<Utc>) -> JwtClaims {
        JwtClaims::new(
            UserId::new(),
            OrganizationId::new(),
            "ops@relief.org",
            vec![Role::new("coordinator")],
            now,
            Duration::minutes(60),
        )
    }

    #[test]
    fn issued_tokens_validate_until_expiry() {
        let tokens = Hs256Tokens::new(b"test-secret");
        let now = Utc::now();
        let c = claims(now);

        let token = tokens.issue(&c).unwrap();
        assert_eq!(tokens.validate(&token, now).unwrap(), c);
        assert_eq!(
            tokens.validate(&token, now + Duration::minutes(61)),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let now = Utc::now();
        let token = Hs256Tokens::new(b"one").issue(&claims(now)).unwrap();
        assert!(matches!(
            Hs256Tokens::new(b"two").validate(&token, now),
            Err(TokenError::Malformed(_))
        ));
    }

    #[test]
    fn garbage_is_rejected() {
        let tokens = Hs256Tokens::new(b"s");
        assert!(matches!(
            tokens.validate("not.a.jwt", Utc::now()),
            Err(TokenError::Malformed(_))
        ));
    }
}
