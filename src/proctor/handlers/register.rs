//! Self-service account registration.

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;

use crate::auth::{
    error::ApiMessage,
    service::{AccountSummary, AuthService},
};

#[derive(ToSchema, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub bot_token: String,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct RegisterResponse {
    pub success: bool,
    pub message: String,
    pub data: AccountSummary,
}

#[utoipa::path(
    post,
    path = "/user/create",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created, pending approval", body = RegisterResponse),
        (status = 400, description = "Human verification failed", body = ApiMessage),
        (status = 409, description = "Email already registered", body = ApiMessage),
    ),
    tag = "user"
)]
#[instrument(skip(service, payload))]
pub async fn register(
    service: Extension<Arc<AuthService>>,
    payload: Option<Json<RegisterRequest>>,
) -> Response {
    let Some(Json(request)) = payload else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiMessage::failure("Missing payload")),
        )
            .into_response();
    };

    match service
        .register(
            &request.name,
            &request.email,
            &request.password,
            &request.bot_token,
        )
        .await
    {
        Ok(data) => (
            StatusCode::CREATED,
            Json(RegisterResponse {
                success: true,
                message: "Account created".to_string(),
                data,
            }),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}
