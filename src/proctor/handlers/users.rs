//! Administrator account console: paginated listing with search.

use axum::{
    extract::{Extension, Query},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::auth::{error::ApiMessage, guard::require_admin, service::AuthService};
use crate::proctor::handlers::auth::guard_failure;
use crate::proctor::CookieSettings;
use crate::store::{Account, ListQuery, Role, SortField, SortOrder};

#[derive(IntoParams, Deserialize, Debug, Default)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// 1-based page number.
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// One of `createdAt`, `name`, `email`.
    pub sort: Option<String>,
    /// `asc` or `desc`.
    pub order: Option<String>,
    pub search: Option<String>,
}

/// Account projection for administrators. The password hash never leaves the
/// store layer.
#[derive(ToSchema, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AccountDetail {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub is_approved: bool,
    pub has_attempted_login: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Account> for AccountDetail {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            name: account.name.clone(),
            email: account.email.clone(),
            role: account.role,
            is_approved: account.is_approved,
            has_attempted_login: account.has_attempted_login,
            created_at: account.created_at,
        }
    }
}

#[derive(ToSchema, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct ListResponse {
    pub success: bool,
    pub data: Vec<AccountDetail>,
    pub pagination: Pagination,
}

fn to_list_query(params: &ListParams) -> ListQuery {
    ListQuery {
        page: params.page.unwrap_or(1),
        limit: params.limit.unwrap_or(10),
        sort: params
            .sort
            .as_deref()
            .and_then(|s| s.parse::<SortField>().ok())
            .unwrap_or_default(),
        order: match params.order.as_deref() {
            Some("asc") => SortOrder::Asc,
            _ => SortOrder::Desc,
        },
        search: params.search.clone(),
    }
}

#[utoipa::path(
    get,
    path = "/user/all",
    params(ListParams),
    responses(
        (status = 200, description = "One page of accounts", body = ListResponse),
        (status = 401, description = "Missing or invalid token", body = ApiMessage),
        (status = 403, description = "Caller is not an administrator", body = ApiMessage),
    ),
    tag = "user"
)]
#[instrument(skip(service, settings, headers))]
pub async fn list(
    headers: HeaderMap,
    service: Extension<Arc<AuthService>>,
    settings: Extension<Arc<CookieSettings>>,
    Query(params): Query<ListParams>,
) -> Response {
    if let Err(err) = require_admin(&headers, &service).await {
        return guard_failure(err, &settings);
    }

    let query = to_list_query(&params);
    match service.list_accounts(&query).await {
        Ok(page) => {
            let limit = query.limit_or_default();
            let current = query.page_or_default();
            let total_pages = page.total.div_ceil(u64::from(limit));

            let body = ListResponse {
                success: true,
                data: page.accounts.iter().map(AccountDetail::from).collect(),
                pagination: Pagination {
                    page: current,
                    limit,
                    total: page.total,
                    total_pages,
                    has_next_page: u64::from(current) < total_pages,
                    has_prev_page: current > 1,
                },
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_params_map_onto_store_query() {
        let params = ListParams {
            page: Some(2),
            limit: Some(25),
            sort: Some("email".to_string()),
            order: Some("asc".to_string()),
            search: Some("alice".to_string()),
        };
        let query = to_list_query(&params);
        assert_eq!(query.page, 2);
        assert_eq!(query.limit, 25);
        assert_eq!(query.sort, SortField::Email);
        assert_eq!(query.order, SortOrder::Asc);
        assert_eq!(query.search.as_deref(), Some("alice"));
    }

    #[test]
    fn bad_sort_and_order_fall_back_to_defaults() {
        let params = ListParams {
            sort: Some("password".to_string()),
            order: Some("sideways".to_string()),
            ..ListParams::default()
        };
        let query = to_list_query(&params);
        assert_eq!(query.sort, SortField::CreatedAt);
        assert_eq!(query.order, SortOrder::Desc);
    }
}
