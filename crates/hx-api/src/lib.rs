//! Harvest v2 REST API client.
//!
//! Provides:
//! - An authenticated request primitive behind the [`Transport`] seam
//! - Transparent aggregation of paged collections ([`Harvest::fetch_all`])
//! - Typed endpoints for clients, projects, users, tasks and time entries
//! - The bulk time-entry [`migrate`] workflow

mod client;
mod error;
mod migrate;
mod transport;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use client::{ActiveFilter, Harvest, PER_PAGE};
pub use error::ApiError;
pub use migrate::{MigrationError, migrate, select_batch};
pub use transport::{Credentials, DEFAULT_BASE_URL, HttpOptions, HttpTransport, Method, Params, Transport};
