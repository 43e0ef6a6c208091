//! Error taxonomy shared by the auth service, guards, and handlers.

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Bot check failed or the verification service was unreachable.
    #[error("human verification failed")]
    InvalidVerification,
    /// Bad email or password. Messages differ so the frontend can hint, the
    /// status code does not.
    #[error("{0}")]
    InvalidCredentials(String),
    /// Missing, invalid, or expired token.
    #[error("{0}")]
    Unauthorized(String),
    /// Valid session, insufficient role.
    #[error("{0}")]
    Forbidden(String),
    /// Target account absent.
    #[error("{0}")]
    NotFound(String),
    /// Duplicate email on registration.
    #[error("{0}")]
    Conflict(String),
    #[error("internal error")]
    Internal(#[source] anyhow::Error),
}

impl AuthError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidVerification => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials(_) | Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => {
                Self::Conflict("Email already exists, please try another email".to_string())
            }
            StoreError::Backend(err) => Self::Internal(err),
        }
    }
}

/// Uniform `{success, message}` error body.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiMessage {
    pub success: bool,
    pub message: String,
}

impl ApiMessage {
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> axum::response::Response {
        let message = match &self {
            // Store/internal detail stays in the logs, not the response body.
            Self::Internal(err) => {
                error!("Internal auth error: {err:?}");
                "Internal server error".to_string()
            }
            Self::InvalidVerification => "Invalid verification".to_string(),
            other => other.to_string(),
        };

        (self.status(), Json(ApiMessage::failure(message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_taxonomy() {
        assert_eq!(AuthError::InvalidVerification.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AuthError::InvalidCredentials("bad".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::Unauthorized("no token".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::Forbidden("nope".into()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AuthError::NotFound("gone".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AuthError::Conflict("dup".into()).status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn duplicate_email_maps_to_conflict() {
        let err: AuthError = crate::store::StoreError::DuplicateEmail.into();
        assert!(matches!(err, AuthError::Conflict(_)));
    }
}
