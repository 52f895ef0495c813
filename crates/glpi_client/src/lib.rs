//! GLPI API client.
//!
//! Session handshake, offset pagination and the [`InventorySource`]
//! implementation the audit engine runs against.
//!
//! No retries, no backoff: a failed request fails the call.
//!
//! [`InventorySource`]: samaudit_recon::engine::InventorySource

mod auth;
mod client;
pub mod paging;

pub use auth::{Credentials, APP_TOKEN_ENV, USER_TOKEN_ENV};
pub use client::{GlpiClient, GlpiError, Session};
pub use paging::{fetch_all, Endpoint, PageSource};
