//! Genseqdid - didactic sequence service
//!
//! A multi-tenant HTTP API for teachers and researchers working on
//! language-learning material (sequences, library documents, community
//! resources). Every request runs through the same pipeline:
//!
//! 1. **Language** - `?lang=`, `Accept-Language`, or the configured default
//! 2. **Identity** - optional bearer token verification
//! 3. **Audit** - bounded in-memory trail, including requests the gate rejects
//! 4. **Maintenance gate** - admins and sentinel routes only while enabled
//! 5. **Route + guard** - static route table with per-route access rules
//! 6. **Handler** - operations on the in-memory store

pub mod auth;
pub mod config;
pub mod i18n;
pub mod logging;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod sessions;
pub mod store;
pub mod types;

pub use config::Args;
pub use server::{dispatch, run, ApiRequest, AppState};
pub use types::{Result, ServiceError};
