//! Maintenance gate
//!
//! A process-wide switch. While it is on, only the sentinel and login paths
//! and callers holding `admin` claims get through; everyone else receives a
//! uniform 503.

use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

use crate::auth::Identity;
use crate::types::ServiceError;

/// Paths that stay reachable during maintenance
pub const EXEMPT_PATHS: [&str; 7] = [
    "/api/status",
    "/api/version",
    "/api/meta",
    "/api/endpoints",
    "/openapi.json",
    "/api/auth/login",
    "/api/auth/demo-token",
];

pub fn is_exempt(path: &str) -> bool {
    let path = path.trim_end_matches('/');
    EXEMPT_PATHS.contains(&path)
}

#[derive(Debug, Default)]
pub struct MaintenanceGate {
    enabled: AtomicBool,
}

impl MaintenanceGate {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Flip the flag, returning the new value
    pub fn set(&self, enabled: bool) -> bool {
        let previous = self.enabled.swap(enabled, Ordering::SeqCst);
        if previous != enabled {
            info!("Maintenance mode {}", if enabled { "enabled" } else { "disabled" });
        }
        enabled
    }

    /// Reject the request if the gate is closed for this caller
    pub fn check(&self, path: &str, identity: &Identity) -> Result<(), ServiceError> {
        if !self.is_enabled() || is_exempt(path) || identity.is_admin() {
            return Ok(());
        }
        Err(ServiceError::ServiceUnavailable(
            "API under maintenance".into(),
        ))
    }
}
