//! # Proctor (Examination Platform Backend)
//!
//! `proctor` is the backend for an examination platform. Test content, scores
//! and uploads all sit behind a role-gated HTTP API, and the gate itself is the
//! interesting part: accounts go through an approval lifecycle
//! (`registered` → `pending` → `approved`/`rejected`) driven by administrators,
//! and sessions are carried as signed, expiring JWT claim sets in an
//! `HttpOnly` cookie.
//!
//! ## Approval lifecycle
//!
//! Two booleans on the account record drive the whole state machine:
//!
//! - `has_attempted_login`: set on a successful password check.
//! - `is_approved`: set only by an administrator.
//!
//! Status is derived from the pair: `(true, true)` is approved,
//! `(false, false)` is rejected, anything else is pending. Logout, rejection,
//! and failed token verification all reset the pair to `(false, false)`, so a
//! replayed stale token can never upgrade an account's visible status.
//!
//! ## Sessions
//!
//! The server keeps no session table. Tokens are minted with a role-dependent
//! TTL (administrators get long-lived sessions, everyone else two hours) and
//! invalidation is cookie erasure plus the flag reset above. Privileged
//! operations never trust the role claim inside a token: the administrator
//! guard re-reads the live account record.

pub mod auth;
pub mod cli;
pub mod proctor;
pub mod store;
