//! Logging infrastructure for genseqdid
//!
//! Holds the in-memory request audit trail.

pub mod audit;

pub use audit::{AuditEntry, AuditLog, DEFAULT_READ_LIMIT};
