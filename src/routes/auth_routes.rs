//! HTTP Routes for Authentication
//!
//! - POST /api/auth/login      - Exchange credentials for a JWT
//! - GET  /api/auth/demo-token - Demo JWT without credentials or elevated roles
//! - GET  /api/me              - Claims of the current token
//! - GET  /api/roles           - Role names
//! - GET  /api/users           - Users with their roles (admin)

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{ok, HandlerResult, RequestContext};
use crate::auth::TokenInput;
use crate::types::ServiceError;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
    pub username: String,
    pub roles: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct MeResponse<'a> {
    pub id: &'a str,
    pub username: &'a str,
    pub roles: &'a [String],
    pub expires_at: u64,
}

fn issue(ctx: &RequestContext<'_>, input: TokenInput) -> HandlerResult {
    let username = input.username.clone();
    let roles = input.roles.clone();
    let access_token = ctx.state.jwt.generate_token(input)?;
    ok(&TokenResponse {
        access_token,
        token_type: "Bearer",
        expires_in: ctx.state.jwt.expiry_seconds(),
        username,
        roles,
    })
}

/// POST /api/auth/login
pub fn login(ctx: &RequestContext<'_>) -> HandlerResult {
    let body: LoginRequest = ctx.request.json()?;
    let username = body.username.trim();
    if username.is_empty() || body.password.is_empty() {
        return Err(ServiceError::BadRequest(
            "username and password are required".into(),
        ));
    }

    match ctx.state.identities.authenticate(username, &body.password)? {
        Some(input) => {
            info!("Login successful for user: {}", input.username);
            issue(ctx, input)
        }
        None => {
            warn!("Login failed - invalid credentials for: {}", username);
            Err(ServiceError::Unauthorized("Invalid credentials".into()))
        }
    }
}

/// GET /api/auth/demo-token
pub fn demo_token(ctx: &RequestContext<'_>) -> HandlerResult {
    issue(ctx, TokenInput::demo())
}

/// GET /api/me
pub fn me(ctx: &RequestContext<'_>) -> HandlerResult {
    let claims = ctx.claims()?;
    ok(&MeResponse {
        id: &claims.sub,
        username: &claims.username,
        roles: &claims.roles,
        expires_at: claims.exp,
    })
}

/// GET /api/roles
pub fn roles(ctx: &RequestContext<'_>) -> HandlerResult {
    ok(&ctx.state.identities.role_names())
}

/// GET /api/users
pub fn users(ctx: &RequestContext<'_>) -> HandlerResult {
    ok(&ctx.state.identities.list_users())
}
