//! Role names and request guards
//!
//! Every route declares an [`Access`] requirement. The router evaluates it
//! against the caller's [`Identity`] before the handler runs, so a handler
//! only ever sees requests that already passed its guard.

use serde::Serialize;
use std::fmt;

use crate::auth::Claims;
use crate::types::ServiceError;

pub const ADMIN: &str = "admin";
pub const TEACHER: &str = "enseignant";
pub const RESEARCHER: &str = "chercheur";
/// Claim-only role carried by demo tokens; never assigned to a stored user
pub const DEMO: &str = "demo";

/// Roles created at bootstrap, in id order
pub const BOOTSTRAP_ROLES: [&str; 3] = [TEACHER, RESEARCHER, ADMIN];

/// Access requirement attached to an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// No token needed
    Public,
    /// Any structurally valid, unexpired token
    Authenticated,
    /// Valid token carrying at least one of these roles
    Roles(&'static [&'static str]),
}

impl Access {
    pub const ADMIN_ONLY: Access = Access::Roles(&[ADMIN]);
    pub const EDITORS: Access = Access::Roles(&[ADMIN, TEACHER]);
    pub const CURATORS: Access = Access::Roles(&[ADMIN, RESEARCHER]);
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Access::Public => write!(f, "public"),
            Access::Authenticated => write!(f, "authenticated"),
            Access::Roles(roles) => write!(f, "roles:{}", roles.join("|")),
        }
    }
}

impl Serialize for Access {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Caller identity resolved from the optional bearer token
#[derive(Debug, Clone)]
pub enum Identity {
    /// No token presented
    Anonymous,
    /// A token was presented but failed validation
    Rejected(String),
    /// Valid token
    Authenticated(Claims),
}

/// Label recorded for callers without a valid token
pub const ANONYMOUS_LABEL: &str = "anonymous";

impl Identity {
    pub fn claims(&self) -> Option<&Claims> {
        match self {
            Identity::Authenticated(claims) => Some(claims),
            _ => None,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.claims().is_some_and(Claims::is_admin)
    }

    /// Username for audit records; degrades to the anonymous marker
    pub fn label(&self) -> &str {
        self.claims()
            .map(|c| c.username.as_str())
            .unwrap_or(ANONYMOUS_LABEL)
    }
}

/// Guard: demand a valid token, independent of role
pub fn require_authenticated(identity: &Identity) -> Result<&Claims, ServiceError> {
    match identity {
        Identity::Authenticated(claims) => Ok(claims),
        Identity::Rejected(reason) => Err(ServiceError::Unauthorized(reason.clone())),
        Identity::Anonymous => Err(ServiceError::Unauthorized(
            "Missing bearer token".into(),
        )),
    }
}

/// Guard: demand a valid token whose roles intersect `allowed`
pub fn require_roles<'a>(
    identity: &'a Identity,
    allowed: &[&str],
) -> Result<&'a Claims, ServiceError> {
    let claims = require_authenticated(identity)?;
    if claims.has_any_role(allowed) {
        Ok(claims)
    } else {
        Err(ServiceError::Forbidden(format!(
            "Role required: {}",
            allowed.join(" or ")
        )))
    }
}

/// Evaluate an access requirement. Public routes still surface valid claims.
pub fn authorize<'a>(
    access: Access,
    identity: &'a Identity,
) -> Result<Option<&'a Claims>, ServiceError> {
    match access {
        Access::Public => Ok(identity.claims()),
        Access::Authenticated => require_authenticated(identity).map(Some),
        Access::Roles(allowed) => require_roles(identity, allowed).map(Some),
    }
}
