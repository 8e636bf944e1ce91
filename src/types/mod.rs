//! Shared types for genseqdid

pub mod error;

pub use error::{EntityKind, Result, ServiceError};
