//! Credential store adapter.
//!
//! The auth core only needs a handful of single-record operations: lookup by
//! email or id, create, and flag patching. They are expressed as the
//! [`UserStore`] trait so the session lifecycle can be exercised against the
//! in-memory store in tests while production runs on PostgreSQL.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Account role. Only an explicit administrative update may change it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Editor,
    Administrator,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Editor => "editor",
            Self::Administrator => "administrator",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Self::Student),
            "editor" => Ok(Self::Editor),
            "administrator" => Ok(Self::Administrator),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Identity record. Never hard-deleted by the auth core.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: Role,
    pub is_approved: bool,
    pub has_attempted_login: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields needed to create an account. Role defaults to student and both
/// lifecycle flags start false.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: Role,
}

impl NewAccount {
    #[must_use]
    pub fn new(email: String, password_hash: String, name: String) -> Self {
        Self {
            email,
            password_hash,
            name,
            role: Role::Student,
        }
    }
}

/// Partial update for the two lifecycle flags. `None` leaves a flag untouched
/// so concurrent patches to different flags stay independent.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlagPatch {
    pub is_approved: Option<bool>,
    pub has_attempted_login: Option<bool>,
}

impl FlagPatch {
    #[must_use]
    pub const fn approve() -> Self {
        Self {
            is_approved: Some(true),
            has_attempted_login: None,
        }
    }

    /// Rejection clears both flags so the account reads as rejected even when
    /// it was previously approved.
    #[must_use]
    pub const fn reject() -> Self {
        Self {
            is_approved: Some(false),
            has_attempted_login: Some(false),
        }
    }

    #[must_use]
    pub const fn attempted_login() -> Self {
        Self {
            is_approved: None,
            has_attempted_login: Some(true),
        }
    }

    /// Forced logout: back to the initial flag state.
    #[must_use]
    pub const fn reset() -> Self {
        Self {
            is_approved: Some(false),
            has_attempted_login: Some(false),
        }
    }
}

/// Sortable columns for account listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    CreatedAt,
    Name,
    Email,
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "createdAt" | "created_at" => Ok(Self::CreatedAt),
            "name" => Ok(Self::Name),
            "email" => Ok(Self::Email),
            other => Err(format!("unknown sort field: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Pagination/search parameters for account listings.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub page: u32,
    pub limit: u32,
    pub sort: SortField,
    pub order: SortOrder,
    pub search: Option<String>,
}

impl ListQuery {
    #[must_use]
    pub fn page_or_default(&self) -> u32 {
        self.page.max(1)
    }

    #[must_use]
    pub fn limit_or_default(&self) -> u32 {
        if self.limit == 0 {
            10
        } else {
            self.limit.min(100)
        }
    }
}

/// One page of accounts plus the unpaginated total.
#[derive(Debug, Clone)]
pub struct AccountPage {
    pub accounts: Vec<Account>,
    pub total: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("email already exists")]
    DuplicateEmail,
    #[error("store backend error: {0}")]
    Backend(#[source] anyhow::Error),
}

/// Single-record operations the auth core needs from the credential store.
///
/// Each call is atomic at the record level; the lifecycle manager makes no
/// cross-call consistency assumptions beyond that.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError>;

    /// Create an account; duplicate email yields [`StoreError::DuplicateEmail`].
    async fn create(&self, account: NewAccount) -> Result<Account, StoreError>;

    /// Apply a flag patch, returning the updated record or `None` when the
    /// account does not exist.
    async fn update_flags(&self, id: Uuid, patch: FlagPatch) -> Result<Option<Account>, StoreError>;

    /// Non-administrator accounts awaiting approval (`is_approved = false`,
    /// `has_attempted_login = true`).
    async fn list_pending(&self) -> Result<Vec<Account>, StoreError>;

    /// Paginated account listing with optional name/email search.
    async fn list(&self, query: &ListQuery) -> Result<AccountPage, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_text() {
        for role in [Role::Student, Role::Editor, Role::Administrator] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn role_schema_lists_all_variants() {
        use utoipa::PartialSchema;

        let rendered = serde_json::to_value(Role::schema()).unwrap().to_string();
        for role in ["student", "editor", "administrator"] {
            assert!(rendered.contains(role));
        }
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Role::Administrator).unwrap(),
            r#""administrator""#
        );
    }

    #[test]
    fn list_query_clamps_page_and_limit() {
        let query = ListQuery::default();
        assert_eq!(query.page_or_default(), 1);
        assert_eq!(query.limit_or_default(), 10);

        let query = ListQuery {
            page: 3,
            limit: 500,
            ..ListQuery::default()
        };
        assert_eq!(query.page_or_default(), 3);
        assert_eq!(query.limit_or_default(), 100);
    }

    #[test]
    fn reject_patch_clears_both_flags() {
        let patch = FlagPatch::reject();
        assert_eq!(patch.is_approved, Some(false));
        assert_eq!(patch.has_attempted_login, Some(false));
    }
}
