//! # API Shared
//!
//! Pieces shared by the clinic's HTTP surfaces.
//!
//! Contains:
//! - `HealthService` and its response body
//! - API-key checking used to guard the REST router
//!
//! Used by `api-rest` and the `clinic-run` binary.

pub mod auth;
pub mod health;

pub use auth::{validate_api_key, AuthError, API_KEY_HEADER};
pub use health::{HealthRes, HealthService};
