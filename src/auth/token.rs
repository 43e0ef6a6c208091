//! Signed, expiring session claim sets (HS256).

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::Role;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token")]
    Invalid,
    #[error("token encoding failed: {0}")]
    Encoding(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            _ => Self::Invalid,
        }
    }
}

/// Payload embedded in every issued token. One fixed shape for all call
/// sites; tokens that do not decode into it are rejected outright.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Account identifier.
    pub sub: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    /// Approval snapshot at issue time. Stale by design; privileged gating
    /// re-reads the live record instead of trusting this.
    pub approved: bool,
    pub iat: i64,
    pub exp: i64,
}

/// Role-dependent token lifetimes.
#[derive(Debug, Clone, Copy)]
pub struct TokenTtls {
    pub administrator: Duration,
    pub standard: Duration,
}

impl Default for TokenTtls {
    fn default() -> Self {
        Self {
            administrator: Duration::days(365),
            standard: Duration::hours(2),
        }
    }
}

impl TokenTtls {
    #[must_use]
    pub fn for_role(&self, role: Role) -> Duration {
        match role {
            Role::Administrator => self.administrator,
            Role::Student | Role::Editor => self.standard,
        }
    }
}

/// Signs and verifies claim sets with a shared secret, independent of
/// transport. Never consults the credential store.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttls: TokenTtls,
}

impl TokenCodec {
    #[must_use]
    pub fn new(secret: &str, ttls: TokenTtls) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttls,
        }
    }

    #[must_use]
    pub fn ttls(&self) -> &TokenTtls {
        &self.ttls
    }

    /// Mint a claim set expiring after the role's TTL.
    pub fn mint(
        &self,
        sub: Uuid,
        name: &str,
        email: &str,
        role: Role,
        approved: bool,
    ) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub,
            name: name.to_string(),
            email: email.to_string(),
            role,
            approved,
            iat: now.timestamp(),
            exp: (now + self.ttls.for_role(role)).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|err| TokenError::Encoding(err.to_string()))
    }

    /// Check signature and expiry, returning the decoded claims.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding_key, &validation)?;
        Ok(data.claims)
    }

    /// Decode the payload without checking signature or expiry.
    ///
    /// Trust level: none. Only used to recover a subject id for best-effort
    /// flag cleanup when a presented token no longer verifies.
    #[must_use]
    pub fn decode_unverified(&self, token: &str) -> Option<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .ok()
            .map(|data| data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> TokenCodec {
        TokenCodec::new("test-secret-at-least-32-bytes-long!!", TokenTtls::default())
    }

    fn expired_codec() -> TokenCodec {
        let ttls = TokenTtls {
            administrator: Duration::seconds(-60),
            standard: Duration::seconds(-60),
        };
        TokenCodec::new("test-secret-at-least-32-bytes-long!!", ttls)
    }

    #[test]
    fn round_trip_before_expiry() {
        let codec = codec();
        let sub = Uuid::now_v7();
        let token = codec
            .mint(sub, "Alice", "alice@example.com", Role::Student, false)
            .unwrap();

        let claims = codec.verify(&token).unwrap();
        assert_eq!(claims.sub, sub);
        assert_eq!(claims.name, "Alice");
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.role, Role::Student);
        assert!(!claims.approved);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn expired_token_reports_expired() {
        let codec = expired_codec();
        let token = codec
            .mint(Uuid::now_v7(), "Alice", "alice@example.com", Role::Student, true)
            .unwrap();

        assert!(matches!(codec.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let token = codec()
            .mint(Uuid::now_v7(), "Alice", "alice@example.com", Role::Student, false)
            .unwrap();

        let other = TokenCodec::new("another-secret-entirely!!!!!!!!!!!!!", TokenTtls::default());
        assert!(matches!(other.verify(&token), Err(TokenError::Invalid)));
    }

    #[test]
    fn garbage_is_invalid() {
        assert!(matches!(
            codec().verify("not.a.token"),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn unverified_decode_survives_expiry() {
        let codec = expired_codec();
        let sub = Uuid::now_v7();
        let token = codec
            .mint(sub, "Alice", "alice@example.com", Role::Student, true)
            .unwrap();

        let claims = codec.decode_unverified(&token).unwrap();
        assert_eq!(claims.sub, sub);
    }

    #[test]
    fn unverified_decode_rejects_garbage_payloads() {
        assert!(codec().decode_unverified("definitely-not-a-jwt").is_none());
    }

    #[test]
    fn administrator_tokens_outlive_standard_ones() {
        let codec = codec();
        let admin = codec
            .mint(Uuid::now_v7(), "Root", "root@example.com", Role::Administrator, true)
            .unwrap();
        let student = codec
            .mint(Uuid::now_v7(), "Alice", "alice@example.com", Role::Student, false)
            .unwrap();

        let admin_claims = codec.verify(&admin).unwrap();
        let student_claims = codec.verify(&student).unwrap();
        assert!(admin_claims.exp > student_claims.exp);
    }
}
