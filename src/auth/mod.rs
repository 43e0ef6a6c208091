//! Authentication and account-approval core.
//!
//! Flow Overview:
//! 1) `login` verifies the bot token, the password, and mints a signed claim
//!    set with a role-dependent TTL.
//! 2) Every protected request passes through a guard (`require_session` /
//!    `require_admin`) which validates the token and attaches an [`guard::Identity`].
//! 3) Administrators move accounts through the approval lifecycle
//!    (`approve` / `reject`); logout and failed verification reset it.
//!
//! Security boundaries:
//! - The administrator guard re-reads the live account record; the role claim
//!   inside a token is never trusted for privileged gating.
//! - `decode_unverified` exists only for best-effort flag cleanup and is named
//!   so call sites cannot confuse trust levels.
//! - The bot filter fails closed: an unreachable verification service blocks
//!   the attempt.

pub mod error;
pub mod guard;
pub mod password;
pub mod recaptcha;
pub mod service;
pub mod token;

pub use self::error::AuthError;
pub use self::guard::{require_admin, require_session, Identity};
pub use self::service::{ApprovalStatus, AuthService, BotVerifier};
pub use self::token::{Claims, TokenCodec, TokenError, TokenTtls};
