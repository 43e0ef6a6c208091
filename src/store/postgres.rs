//! PostgreSQL credential store.

use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use super::{
    Account, AccountPage, FlagPatch, ListQuery, NewAccount, Role, SortField, SortOrder, StoreError,
    UserStore,
};

const ACCOUNT_COLUMNS: &str =
    "id, email, password_hash, name, role, is_approved, has_attempted_login, created_at, updated_at";

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_span(operation: &str, statement: &str) -> tracing::Span {
    tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = operation,
        db.statement = statement
    )
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

fn backend(err: sqlx::Error) -> StoreError {
    StoreError::Backend(err.into())
}

fn account_from_row(row: &PgRow) -> Result<Account, StoreError> {
    let role: String = row.try_get("role").map_err(backend)?;
    let role = role
        .parse::<Role>()
        .map_err(|err| StoreError::Backend(anyhow::anyhow!(err)))?;

    Ok(Account {
        id: row.try_get("id").map_err(backend)?,
        email: row.try_get("email").map_err(backend)?,
        password_hash: row.try_get("password_hash").map_err(backend)?,
        name: row.try_get("name").map_err(backend)?,
        role,
        is_approved: row.try_get("is_approved").map_err(backend)?,
        has_attempted_login: row.try_get("has_attempted_login").map_err(backend)?,
        created_at: row.try_get("created_at").map_err(backend)?,
        updated_at: row.try_get("updated_at").map_err(backend)?,
    })
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1");
        let row = sqlx::query(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .instrument(db_span("SELECT", &query))
            .await
            .map_err(backend)?;

        row.as_ref().map(account_from_row).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1");
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(db_span("SELECT", &query))
            .await
            .map_err(backend)?;

        row.as_ref().map(account_from_row).transpose()
    }

    async fn create(&self, account: NewAccount) -> Result<Account, StoreError> {
        let query = format!(
            "INSERT INTO accounts (id, email, password_hash, name, role)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {ACCOUNT_COLUMNS}"
        );
        let row = sqlx::query(&query)
            .bind(Uuid::now_v7())
            .bind(&account.email)
            .bind(&account.password_hash)
            .bind(&account.name)
            .bind(account.role.as_str())
            .fetch_one(&self.pool)
            .instrument(db_span("INSERT", &query))
            .await
            .map_err(|err| {
                if is_unique_violation(&err) {
                    StoreError::DuplicateEmail
                } else {
                    backend(err)
                }
            })?;

        account_from_row(&row)
    }

    async fn update_flags(&self, id: Uuid, patch: FlagPatch) -> Result<Option<Account>, StoreError> {
        let query = format!(
            "UPDATE accounts
             SET is_approved = COALESCE($2, is_approved),
                 has_attempted_login = COALESCE($3, has_attempted_login),
                 updated_at = now()
             WHERE id = $1
             RETURNING {ACCOUNT_COLUMNS}"
        );
        let row = sqlx::query(&query)
            .bind(id)
            .bind(patch.is_approved)
            .bind(patch.has_attempted_login)
            .fetch_optional(&self.pool)
            .instrument(db_span("UPDATE", &query))
            .await
            .map_err(backend)?;

        row.as_ref().map(account_from_row).transpose()
    }

    async fn list_pending(&self) -> Result<Vec<Account>, StoreError> {
        let query = format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts
             WHERE role <> 'administrator'
               AND is_approved = false
               AND has_attempted_login = true
             ORDER BY created_at"
        );
        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .instrument(db_span("SELECT", &query))
            .await
            .map_err(backend)?;

        rows.iter().map(account_from_row).collect()
    }

    async fn list(&self, query: &ListQuery) -> Result<AccountPage, StoreError> {
        // Sort column comes from a fixed whitelist, never from user input.
        let sort_column = match query.sort {
            SortField::CreatedAt => "created_at",
            SortField::Name => "name",
            SortField::Email => "email",
        };
        let order = match query.order {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };

        let limit = i64::from(query.limit_or_default());
        let offset = i64::from(query.page_or_default() - 1) * limit;
        let pattern = query
            .search
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{s}%"));

        let select = format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts
             WHERE ($1::text IS NULL OR name ILIKE $1 OR email ILIKE $1)
             ORDER BY {sort_column} {order}
             LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query(&select)
            .bind(&pattern)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .instrument(db_span("SELECT", &select))
            .await
            .map_err(backend)?;

        let count = "SELECT count(*) FROM accounts
             WHERE ($1::text IS NULL OR name ILIKE $1 OR email ILIKE $1)";
        let total: i64 = sqlx::query(count)
            .bind(&pattern)
            .fetch_one(&self.pool)
            .instrument(db_span("SELECT", count))
            .await
            .map_err(backend)?
            .try_get(0)
            .map_err(backend)?;

        let accounts = rows
            .iter()
            .map(account_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(AccountPage {
            accounts,
            total: u64::try_from(total).unwrap_or(0),
        })
    }
}
