//! Session endpoints: login, approval lifecycle, refresh, logout.
//!
//! The signed token travels in an `HttpOnly` cookie named `token`; every
//! response that mints or invalidates a session also rewrites that cookie so
//! the client never has to manage it by hand.

use axum::{
    extract::{Extension, Path},
    http::{
        header::{InvalidHeaderValue, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{
    error::{ApiMessage, AuthError},
    guard::{extract_token, require_admin, require_session, TOKEN_COOKIE_NAME},
    service::{AccountSummary, ApprovalStatus, AuthService, Session},
};
use crate::proctor::CookieSettings;
use crate::store::Role;

#[derive(ToSchema, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub bot_token: String,
}

#[derive(ToSchema, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub success: bool,
    pub message: String,
    pub access_token: String,
    pub role: Role,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct PendingResponse {
    pub success: bool,
    pub data: Vec<AccountSummary>,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct DecisionResponse {
    pub success: bool,
    pub message: String,
    pub data: AccountSummary,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct ApprovalStatusResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub message: String,
}

fn token_cookie(
    settings: &CookieSettings,
    token: &str,
    max_age_seconds: i64,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!(
        "{TOKEN_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Strict; Max-Age={max_age_seconds}"
    );
    if settings.secure {
        cookie.push_str("; Secure");
    }
    if let Some(domain) = &settings.domain {
        cookie.push_str("; Domain=");
        cookie.push_str(domain);
    }
    HeaderValue::from_str(&cookie)
}

fn clear_token_cookie(settings: &CookieSettings) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie =
        format!("{TOKEN_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0");
    if settings.secure {
        cookie.push_str("; Secure");
    }
    if let Some(domain) = &settings.domain {
        cookie.push_str("; Domain=");
        cookie.push_str(domain);
    }
    HeaderValue::from_str(&cookie)
}

/// Error response that also tells the client to discard its cookie. Applied
/// to `Unauthorized` only; a `Forbidden` session is still a valid session.
pub(crate) fn guard_failure(err: AuthError, settings: &CookieSettings) -> Response {
    let clear = matches!(err, AuthError::Unauthorized(_));
    let mut response = err.into_response();
    if clear {
        if let Ok(cookie) = clear_token_cookie(settings) {
            response.headers_mut().append(SET_COOKIE, cookie);
        }
    }
    response
}

fn session_response(
    service: &AuthService,
    settings: &CookieSettings,
    session: &Session,
    message: &str,
) -> Response {
    let max_age = service.codec().ttls().for_role(session.role).num_seconds();
    let mut headers = HeaderMap::new();
    if let Ok(cookie) = token_cookie(settings, &session.token, max_age) {
        headers.insert(SET_COOKIE, cookie);
    }

    let body = SessionResponse {
        success: true,
        message: message.to_string(),
        access_token: session.token.clone(),
        role: session.role,
    };
    (StatusCode::OK, headers, Json(body)).into_response()
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful, session cookie set", body = SessionResponse),
        (status = 400, description = "Human verification failed", body = ApiMessage),
        (status = 401, description = "Unknown email or wrong password", body = ApiMessage),
    ),
    tag = "auth"
)]
#[instrument(skip(service, settings, payload))]
pub async fn login(
    service: Extension<Arc<AuthService>>,
    settings: Extension<Arc<CookieSettings>>,
    payload: Option<Json<LoginRequest>>,
) -> Response {
    let Some(Json(request)) = payload else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiMessage::failure("Missing payload")),
        )
            .into_response();
    };

    match service
        .login(&request.email, &request.password, &request.bot_token)
        .await
    {
        Ok(session) => session_response(
            &service,
            &settings,
            &session,
            "Login successful, awaiting account approval",
        ),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/auth/pending",
    responses(
        (status = 200, description = "Accounts awaiting approval", body = PendingResponse),
        (status = 401, description = "Missing or invalid token", body = ApiMessage),
    ),
    tag = "auth"
)]
#[instrument(skip(service, settings, headers))]
pub async fn pending(
    headers: HeaderMap,
    service: Extension<Arc<AuthService>>,
    settings: Extension<Arc<CookieSettings>>,
) -> Response {
    if let Err(err) = require_session(&headers, &service).await {
        return guard_failure(err, &settings);
    }

    match service.list_pending().await {
        Ok(data) => (
            StatusCode::OK,
            Json(PendingResponse {
                success: true,
                data,
            }),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    patch,
    path = "/auth/approve/{id}",
    params(("id" = Uuid, Path, description = "Account to approve")),
    responses(
        (status = 200, description = "Account approved", body = DecisionResponse),
        (status = 403, description = "Caller is not an administrator", body = ApiMessage),
        (status = 404, description = "No such account", body = ApiMessage),
    ),
    tag = "auth"
)]
#[instrument(skip(service, settings, headers))]
pub async fn approve(
    headers: HeaderMap,
    service: Extension<Arc<AuthService>>,
    settings: Extension<Arc<CookieSettings>>,
    Path(id): Path<Uuid>,
) -> Response {
    if let Err(err) = require_admin(&headers, &service).await {
        return guard_failure(err, &settings);
    }

    match service.approve(id).await {
        Ok(data) => (
            StatusCode::OK,
            Json(DecisionResponse {
                success: true,
                message: "Account approved".to_string(),
                data,
            }),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    patch,
    path = "/auth/reject/{id}",
    params(("id" = Uuid, Path, description = "Account to reject")),
    responses(
        (status = 200, description = "Account rejected", body = DecisionResponse),
        (status = 403, description = "Caller is not an administrator", body = ApiMessage),
        (status = 404, description = "No such account", body = ApiMessage),
    ),
    tag = "auth"
)]
#[instrument(skip(service, settings, headers))]
pub async fn reject(
    headers: HeaderMap,
    service: Extension<Arc<AuthService>>,
    settings: Extension<Arc<CookieSettings>>,
    Path(id): Path<Uuid>,
) -> Response {
    if let Err(err) = require_admin(&headers, &service).await {
        return guard_failure(err, &settings);
    }

    match service.reject(id).await {
        Ok(data) => (
            StatusCode::OK,
            Json(DecisionResponse {
                success: true,
                message: "Account rejected".to_string(),
                data,
            }),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/auth/check-approval",
    responses(
        (status = 200, description = "Approval status derived from live flags", body = ApprovalStatusResponse),
        (status = 401, description = "Missing or invalid token", body = ApiMessage),
    ),
    tag = "auth"
)]
#[instrument(skip(service, settings, headers))]
pub async fn check_approval(
    headers: HeaderMap,
    service: Extension<Arc<AuthService>>,
    settings: Extension<Arc<CookieSettings>>,
) -> Response {
    let Some(token) = extract_token(&headers) else {
        return guard_failure(
            AuthError::Unauthorized("Token not found".to_string()),
            &settings,
        );
    };

    match service.check_approval_status(&token).await {
        Ok(ApprovalStatus::Approved) => (
            StatusCode::OK,
            Json(ApprovalStatusResponse {
                success: true,
                reason: None,
                message: "Account approved".to_string(),
            }),
        )
            .into_response(),
        Ok(status) => {
            let message = match status {
                ApprovalStatus::Rejected => "Account was not approved",
                _ => "Account awaiting approval",
            };
            (
                StatusCode::OK,
                Json(ApprovalStatusResponse {
                    success: false,
                    reason: Some(status.as_str().to_string()),
                    message: message.to_string(),
                }),
            )
                .into_response()
        }
        Err(err) => guard_failure(err, &settings),
    }
}

#[utoipa::path(
    post,
    path = "/auth/refresh-token",
    responses(
        (status = 200, description = "Fresh token minted, cookie rewritten", body = SessionResponse),
        (status = 401, description = "Missing, invalid, or expired token", body = ApiMessage),
    ),
    tag = "auth"
)]
#[instrument(skip(service, settings, headers))]
pub async fn refresh_token(
    headers: HeaderMap,
    service: Extension<Arc<AuthService>>,
    settings: Extension<Arc<CookieSettings>>,
) -> Response {
    let Some(token) = extract_token(&headers) else {
        return guard_failure(
            AuthError::Unauthorized("Token not found".to_string()),
            &settings,
        );
    };

    match service.refresh(&token).await {
        Ok(session) => session_response(&service, &settings, &session, "Token refreshed"),
        Err(err) => guard_failure(err, &settings),
    }
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Session cleared; always succeeds", body = ApiMessage),
    ),
    tag = "auth"
)]
#[instrument(skip(service, settings, headers))]
pub async fn logout(
    headers: HeaderMap,
    service: Extension<Arc<AuthService>>,
    settings: Extension<Arc<CookieSettings>>,
) -> Response {
    if let Some(token) = extract_token(&headers) {
        service.logout(&token).await;
    }

    // Always clear the cookie, even when no token was presented.
    let mut response_headers = HeaderMap::new();
    if let Ok(cookie) = clear_token_cookie(&settings) {
        response_headers.insert(SET_COOKIE, cookie);
    }

    (
        StatusCode::OK,
        response_headers,
        Json(serde_json::json!({ "success": true, "message": "Logged out" })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(secure: bool, domain: Option<&str>) -> CookieSettings {
        CookieSettings {
            secure,
            domain: domain.map(str::to_string),
        }
    }

    #[test]
    fn token_cookie_carries_lifecycle_attributes() {
        let cookie = token_cookie(&settings(false, None), "abc", 7200).unwrap();
        let value = cookie.to_str().unwrap();
        assert!(value.starts_with("token=abc"));
        assert!(value.contains("HttpOnly"));
        assert!(value.contains("SameSite=Strict"));
        assert!(value.contains("Max-Age=7200"));
        assert!(!value.contains("Secure"));
    }

    #[test]
    fn production_cookie_is_secure_and_domain_scoped() {
        let cookie = token_cookie(&settings(true, Some("exam.example.com")), "abc", 7200).unwrap();
        let value = cookie.to_str().unwrap();
        assert!(value.contains("Secure"));
        assert!(value.contains("Domain=exam.example.com"));
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        let cookie = clear_token_cookie(&settings(false, None)).unwrap();
        let value = cookie.to_str().unwrap();
        assert!(value.starts_with("token=;"));
        assert!(value.contains("Max-Age=0"));
    }
}
