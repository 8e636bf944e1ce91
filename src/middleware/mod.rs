//! Cross-cutting request stages that run before routing
//!
//! - Optional bearer-token verification into an [`Identity`]
//! - The maintenance gate

pub mod maintenance;

pub use maintenance::{is_exempt, MaintenanceGate, EXEMPT_PATHS};

use tracing::debug;

use crate::auth::{extract_token_from_header, Identity, JwtValidator};

/// Verify the bearer token if one is present. Never fails: a missing token
/// yields `Anonymous`, a bad one `Rejected` so guards can report why.
pub fn resolve_identity(jwt: &JwtValidator, authorization: Option<&str>) -> Identity {
    let Some(token) = extract_token_from_header(authorization) else {
        return Identity::Anonymous;
    };

    let result = jwt.verify_token(token);
    match result.claims {
        Some(claims) if result.valid => Identity::Authenticated(claims),
        _ => {
            let reason = result.error.unwrap_or_else(|| "Invalid token".into());
            debug!("Bearer token rejected: {}", reason);
            Identity::Rejected(reason)
        }
    }
}
