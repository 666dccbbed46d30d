//! HTTP front end of the account service.
//!
//! Wires the domain [`AccountService`](account_domain::AccountService) to an
//! axum router, maps domain errors to HTTP responses and loads settings.

pub mod config;
pub mod mapper;
pub mod service;

pub use config::{Settings, StorageBackend};
pub use mapper::ApiError;
pub use service::{router, AppState};
