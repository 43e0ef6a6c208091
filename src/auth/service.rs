//! Session lifecycle manager.
//!
//! Orchestrates login, logout, refresh, approval, and rejection. The store
//! holds the only durable state (two flags per account); tokens are
//! self-contained, so forced invalidation works by resetting those flags and
//! letting the transport drop the cookie.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error};
use utoipa::ToSchema;
use uuid::Uuid;

use super::error::AuthError;
use super::password::{hash_password, verify_password};
use super::token::{Claims, TokenCodec};
use crate::store::{Account, AccountPage, FlagPatch, ListQuery, NewAccount, Role, UserStore};

/// Verdict source for the bot filter. The production implementation posts to
/// the external verification endpoint; tests stub it.
#[async_trait]
pub trait BotVerifier: Send + Sync {
    async fn verify(&self, client_token: &str) -> bool;
}

/// Derived approval status. There is no third stored flag: rejection is the
/// flag combination `(false, false)`, indistinguishable from a freshly
/// registered account that never logged in. Callers must not assume
/// `Rejected` implies an explicit administrator rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalStatus {
    Approved,
    Pending,
    Rejected,
}

impl ApprovalStatus {
    #[must_use]
    pub const fn from_flags(is_approved: bool, has_attempted_login: bool) -> Self {
        match (is_approved, has_attempted_login) {
            (true, true) => Self::Approved,
            (false, false) => Self::Rejected,
            _ => Self::Pending,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Pending => "pending",
            Self::Rejected => "rejected",
        }
    }
}

/// Account projection returned to administrators: never the password hash.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AccountSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<&Account> for AccountSummary {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            name: account.name.clone(),
            email: account.email.clone(),
        }
    }
}

/// A freshly minted session.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub role: Role,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub struct AuthService {
    store: Arc<dyn UserStore>,
    codec: TokenCodec,
    bot_filter: Arc<dyn BotVerifier>,
}

impl AuthService {
    #[must_use]
    pub fn new(store: Arc<dyn UserStore>, codec: TokenCodec, bot_filter: Arc<dyn BotVerifier>) -> Self {
        Self {
            store,
            codec,
            bot_filter,
        }
    }

    #[must_use]
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Live account lookup for guards and handlers that must not trust claim
    /// snapshots.
    pub async fn fetch_account(&self, id: Uuid) -> Result<Option<Account>, AuthError> {
        Ok(self.store.find_by_id(id).await?)
    }

    /// Register a new account: student role, both lifecycle flags false.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        bot_token: &str,
    ) -> Result<AccountSummary, AuthError> {
        if !self.bot_filter.verify(bot_token).await {
            return Err(AuthError::InvalidVerification);
        }

        let password_hash = hash_password(password).map_err(AuthError::Internal)?;
        let account = self
            .store
            .create(NewAccount::new(
                normalize_email(email),
                password_hash,
                name.trim().to_string(),
            ))
            .await?;

        Ok(AccountSummary::from(&account))
    }

    /// Verify bot token and credentials, persist the login-attempt flag, then
    /// mint a claim set from the account's current role/approval snapshot.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        bot_token: &str,
    ) -> Result<Session, AuthError> {
        if !self.bot_filter.verify(bot_token).await {
            return Err(AuthError::InvalidVerification);
        }

        let email = normalize_email(email);
        let Some(account) = self.store.find_by_email(&email).await? else {
            return Err(AuthError::InvalidCredentials(
                "Email does not exist".to_string(),
            ));
        };

        let password_ok =
            verify_password(password, &account.password_hash).map_err(AuthError::Internal)?;
        if !password_ok {
            return Err(AuthError::InvalidCredentials(
                "Incorrect password".to_string(),
            ));
        }

        // Persist the flag before returning; the mint below is pure.
        self.store
            .update_flags(account.id, FlagPatch::attempted_login())
            .await?;

        let token = self
            .codec
            .mint(
                account.id,
                &account.name,
                &account.email,
                account.role,
                account.is_approved,
            )
            .map_err(|err| AuthError::Internal(err.into()))?;

        Ok(Session {
            token,
            role: account.role,
        })
    }

    /// Derive approval status from the live flags, not the token snapshot.
    pub async fn check_approval_status(&self, token: &str) -> Result<ApprovalStatus, AuthError> {
        let Some(claims) = self.validate_token(token).await else {
            return Err(AuthError::Unauthorized("Invalid token".to_string()));
        };

        let Some(account) = self.store.find_by_id(claims.sub).await? else {
            return Err(AuthError::Unauthorized(
                "Account does not exist".to_string(),
            ));
        };

        Ok(ApprovalStatus::from_flags(
            account.is_approved,
            account.has_attempted_login,
        ))
    }

    /// Non-administrator accounts that logged in and still await approval.
    pub async fn list_pending(&self) -> Result<Vec<AccountSummary>, AuthError> {
        let pending = self.store.list_pending().await?;
        Ok(pending.iter().map(AccountSummary::from).collect())
    }

    /// Unconditional field set, so approving twice is harmless.
    pub async fn approve(&self, id: Uuid) -> Result<AccountSummary, AuthError> {
        let account = self
            .store
            .update_flags(id, FlagPatch::approve())
            .await?
            .ok_or_else(|| AuthError::NotFound("Account not found".to_string()))?;

        Ok(AccountSummary::from(&account))
    }

    /// Clears both flags so a previously approved account reads as rejected,
    /// not pending.
    pub async fn reject(&self, id: Uuid) -> Result<AccountSummary, AuthError> {
        let account = self
            .store
            .update_flags(id, FlagPatch::reject())
            .await?
            .ok_or_else(|| AuthError::NotFound("Account not found".to_string()))?;

        Ok(AccountSummary::from(&account))
    }

    /// Mint a replacement token: identity claims carry over from the old
    /// token, the approval snapshot and expiry are fresh. The old token is
    /// not invalidated server-side; the client is expected to discard it.
    pub async fn refresh(&self, token: &str) -> Result<Session, AuthError> {
        // Straight codec verification, not the guard path: an expired token
        // must not silently reset flags here, the client still gets a clean
        // 401 and can re-login.
        let claims = self.codec.verify(token).map_err(|err| match err {
            super::token::TokenError::Expired => {
                AuthError::Unauthorized("Token expired".to_string())
            }
            _ => AuthError::Unauthorized("Invalid token".to_string()),
        })?;

        let Some(account) = self.store.find_by_id(claims.sub).await? else {
            return Err(AuthError::Unauthorized(
                "Account does not exist".to_string(),
            ));
        };

        let token = self
            .codec
            .mint(
                claims.sub,
                &claims.name,
                &claims.email,
                claims.role,
                account.is_approved,
            )
            .map_err(|err| AuthError::Internal(err.into()))?;

        Ok(Session {
            token,
            role: claims.role,
        })
    }

    /// Best-effort flag reset keyed off an unverified decode. Never fails:
    /// logout must not block a client from clearing its cookie.
    pub async fn logout(&self, token: &str) {
        let Some(claims) = self.codec.decode_unverified(token) else {
            debug!("Logout with undecodable token, nothing to reset");
            return;
        };

        if let Err(err) = self.store.update_flags(claims.sub, FlagPatch::reset()).await {
            error!("Failed to reset flags on logout: {err}");
        }
    }

    /// Wraps codec verification for callers that only need claims-or-nothing.
    ///
    /// On expiry or bad signature the subject's flags are reset best-effort,
    /// so a client retrying with a stale token lands back in pending state.
    pub async fn validate_token(&self, token: &str) -> Option<Claims> {
        match self.codec.verify(token) {
            Ok(claims) => Some(claims),
            Err(err) => {
                debug!("Token verification failed: {err}");
                if let Some(claims) = self.codec.decode_unverified(token) {
                    if let Err(store_err) =
                        self.store.update_flags(claims.sub, FlagPatch::reset()).await
                    {
                        error!("Failed to reset flags after invalid token: {store_err}");
                    }
                }
                None
            }
        }
    }

    /// Paginated account listing for the administrator console.
    pub async fn list_accounts(&self, query: &ListQuery) -> Result<AccountPage, AuthError> {
        Ok(self.store.list(query).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approval_truth_table() {
        assert_eq!(
            ApprovalStatus::from_flags(true, true),
            ApprovalStatus::Approved
        );
        assert_eq!(
            ApprovalStatus::from_flags(false, false),
            ApprovalStatus::Rejected
        );
        assert_eq!(
            ApprovalStatus::from_flags(true, false),
            ApprovalStatus::Pending
        );
        assert_eq!(
            ApprovalStatus::from_flags(false, true),
            ApprovalStatus::Pending
        );
    }

    #[test]
    fn normalize_email_trims_and_lowercases() {
        assert_eq!(normalize_email(" Alice@Example.COM "), "alice@example.com");
    }
}
