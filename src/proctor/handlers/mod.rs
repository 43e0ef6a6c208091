//! Route handlers for the examination backend.

pub mod auth;
pub mod health;
pub mod register;
pub mod users;
