//! Access guards evaluated before protected handlers run.

use axum::http::{header::AUTHORIZATION, HeaderMap};
use uuid::Uuid;

use super::error::AuthError;
use super::service::AuthService;
use super::token::Claims;
use crate::store::Role;

/// Cookie carrying the signed session token.
pub const TOKEN_COOKIE_NAME: &str = "token";

/// Identity attached to a request once a guard passes.
#[derive(Debug, Clone)]
pub struct Identity {
    pub subject_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    /// Approval snapshot from the token. Do not use for privileged gating.
    pub approved: bool,
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self {
            subject_id: claims.sub,
            name: claims.name,
            email: claims.email,
            role: claims.role,
            approved: claims.approved,
        }
    }
}

/// Pull the session token from the cookie, falling back to a bearer header.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(header) = headers.get(axum::http::header::COOKIE) {
        if let Ok(value) = header.to_str() {
            for pair in value.split(';') {
                // Segments without an `=` (stray attributes, junk) are skipped,
                // not treated as the end of the header.
                let Some((key, val)) = pair.trim().split_once('=') else {
                    continue;
                };
                if key.trim() == TOKEN_COOKIE_NAME && !val.trim().is_empty() {
                    return Some(val.trim().to_string());
                }
            }
        }
    }

    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value
        .trim()
        .strip_prefix("Bearer ")
        .or_else(|| value.trim().strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Any non-expired, correctly signed token passes. Callers turning the error
/// into a response should also clear the client-side cookie.
pub async fn require_session(
    headers: &HeaderMap,
    service: &AuthService,
) -> Result<Identity, AuthError> {
    let Some(token) = extract_token(headers) else {
        return Err(AuthError::Unauthorized("Token not found".to_string()));
    };

    match service.validate_token(&token).await {
        Some(claims) => Ok(Identity::from(claims)),
        None => Err(AuthError::Unauthorized("Invalid token".to_string())),
    }
}

/// Session checks plus a live re-fetch of the account: the role claim inside
/// the token is ignored, so a stale token cannot survive a role downgrade.
pub async fn require_admin(
    headers: &HeaderMap,
    service: &AuthService,
) -> Result<Identity, AuthError> {
    let identity = require_session(headers, service).await?;

    let Some(account) = service.fetch_account(identity.subject_id).await? else {
        return Err(AuthError::Unauthorized(
            "Account does not exist".to_string(),
        ));
    };

    if account.role != Role::Administrator {
        return Err(AuthError::Forbidden(
            "You do not have permission to perform this action".to_string(),
        ));
    }

    Ok(Identity {
        role: account.role,
        approved: account.is_approved,
        ..identity
    })
}
