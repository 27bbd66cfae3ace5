//! # JSON Fetch Library
//!
//! Issues an HTTP request, parses the JSON response and hands it back,
//! with a per-call timeout and optional Basic or JWT bearer authentication.
//! Bearer tokens are refreshed transparently shortly before they expire.
//!
//! Modules:
//! - `fetcher` — `JsonFetcher` and the per-call `FetchCall` builder
//! - `auth` — credentials, JWT expiry decoding and token refresh
//! - `request` — request options and the executor enforcing the timeout
//! - `config` — YAML configuration, env expansion and validation
//! - `error` — typed failures

pub mod auth;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod helpers;
pub mod observability;
pub mod request;
pub mod utils;

#[cfg(test)]
mod tests;

pub use crate::config::credentials::{FetcherConfig, JwtConfig};
pub use crate::config::settings::{ErrorMode, FetcherSettings};
pub use crate::error::{ErrorKind, FetchError};
pub use crate::fetcher::{FetchCall, JsonFetcher, JsonFetcherBuilder};
