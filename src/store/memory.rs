//! In-memory credential store for tests and local development.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    Account, AccountPage, FlagPatch, ListQuery, NewAccount, Role, SortField, SortOrder, StoreError,
    UserStore,
};

#[derive(Default)]
pub struct MemoryStore {
    accounts: RwLock<HashMap<Uuid, Account>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an account directly, bypassing registration. Handy for setting up
    /// administrator fixtures.
    pub async fn insert(&self, account: Account) {
        self.accounts.write().await.insert(account.id, account);
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.values().find(|a| a.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        Ok(self.accounts.read().await.get(&id).cloned())
    }

    async fn create(&self, account: NewAccount) -> Result<Account, StoreError> {
        let mut accounts = self.accounts.write().await;
        if accounts.values().any(|a| a.email == account.email) {
            return Err(StoreError::DuplicateEmail);
        }

        let now = Utc::now();
        let record = Account {
            id: Uuid::now_v7(),
            email: account.email,
            password_hash: account.password_hash,
            name: account.name,
            role: account.role,
            is_approved: false,
            has_attempted_login: false,
            created_at: now,
            updated_at: now,
        };
        accounts.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_flags(&self, id: Uuid, patch: FlagPatch) -> Result<Option<Account>, StoreError> {
        let mut accounts = self.accounts.write().await;
        let Some(account) = accounts.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(approved) = patch.is_approved {
            account.is_approved = approved;
        }
        if let Some(attempted) = patch.has_attempted_login {
            account.has_attempted_login = attempted;
        }
        account.updated_at = Utc::now();
        Ok(Some(account.clone()))
    }

    async fn list_pending(&self) -> Result<Vec<Account>, StoreError> {
        let accounts = self.accounts.read().await;
        let mut pending: Vec<Account> = accounts
            .values()
            .filter(|a| a.role != Role::Administrator && !a.is_approved && a.has_attempted_login)
            .cloned()
            .collect();
        pending.sort_by_key(|a| a.created_at);
        Ok(pending)
    }

    async fn list(&self, query: &ListQuery) -> Result<AccountPage, StoreError> {
        let accounts = self.accounts.read().await;
        let needle = query
            .search
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let mut matched: Vec<Account> = accounts
            .values()
            .filter(|a| {
                needle.as_deref().is_none_or(|needle| {
                    a.name.to_lowercase().contains(needle)
                        || a.email.to_lowercase().contains(needle)
                })
            })
            .cloned()
            .collect();

        matched.sort_by(|a, b| {
            let ordering = match query.sort {
                SortField::CreatedAt => a.created_at.cmp(&b.created_at),
                SortField::Name => a.name.cmp(&b.name),
                SortField::Email => a.email.cmp(&b.email),
            };
            match query.order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        let total = matched.len() as u64;
        let limit = query.limit_or_default() as usize;
        let offset = (query.page_or_default() as usize - 1) * limit;
        let accounts = matched.into_iter().skip(offset).take(limit).collect();

        Ok(AccountPage { accounts, total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_account(email: &str, name: &str) -> NewAccount {
        NewAccount::new(email.to_string(), "$2b$10$hash".to_string(), name.to_string())
    }

    #[tokio::test]
    async fn create_rejects_duplicate_email() {
        let store = MemoryStore::new();
        store.create(new_account("a@example.com", "A")).await.unwrap();

        let err = store
            .create(new_account("a@example.com", "A2"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail));

        let page = store.list(&ListQuery::default()).await.unwrap();
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn update_flags_patches_only_named_fields() {
        let store = MemoryStore::new();
        let account = store.create(new_account("a@example.com", "A")).await.unwrap();

        let updated = store
            .update_flags(account.id, FlagPatch::attempted_login())
            .await
            .unwrap()
            .unwrap();
        assert!(updated.has_attempted_login);
        assert!(!updated.is_approved);

        let updated = store
            .update_flags(account.id, FlagPatch::approve())
            .await
            .unwrap()
            .unwrap();
        assert!(updated.is_approved);
        assert!(updated.has_attempted_login);
    }

    #[tokio::test]
    async fn update_flags_missing_account_returns_none() {
        let store = MemoryStore::new();
        let result = store
            .update_flags(Uuid::now_v7(), FlagPatch::approve())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn list_pending_excludes_administrators_and_untouched_accounts() {
        let store = MemoryStore::new();
        let alice = store.create(new_account("alice@example.com", "Alice")).await.unwrap();
        store.create(new_account("bob@example.com", "Bob")).await.unwrap();

        store
            .update_flags(alice.id, FlagPatch::attempted_login())
            .await
            .unwrap();

        let pending = store.list_pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].email, "alice@example.com");
    }

    #[tokio::test]
    async fn list_searches_and_paginates() {
        let store = MemoryStore::new();
        for i in 0..15 {
            store
                .create(new_account(&format!("user{i}@example.com"), &format!("User {i}")))
                .await
                .unwrap();
        }
        store.create(new_account("zoe@other.org", "Zoe")).await.unwrap();

        let page = store
            .list(&ListQuery {
                search: Some("example.com".to_string()),
                ..ListQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 15);
        assert_eq!(page.accounts.len(), 10);

        let page2 = store
            .list(&ListQuery {
                page: 2,
                search: Some("example.com".to_string()),
                ..ListQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(page2.accounts.len(), 5);
    }
}
