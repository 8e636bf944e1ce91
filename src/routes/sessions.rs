//! Collaborative session routes

use serde_json::json;

use super::{created, ok, HandlerResult, RequestContext};
use crate::types::{EntityKind, ServiceError};

fn session_id(ctx: &RequestContext<'_>) -> Result<u64, ServiceError> {
    ctx.numeric_param("id", EntityKind::Session)
}

/// POST /api/session
pub fn create(ctx: &RequestContext<'_>) -> HandlerResult {
    let session = ctx.state.sessions.create(ctx.username()?);
    created(&json!({"session_id": session.id, "users": session.users}))
}

/// GET /api/session/{id}
pub fn get(ctx: &RequestContext<'_>) -> HandlerResult {
    ok(&ctx.state.sessions.get(session_id(ctx)?)?)
}

/// POST /api/session/{id}/join
pub fn join(ctx: &RequestContext<'_>) -> HandlerResult {
    let session = ctx.state.sessions.join(session_id(ctx)?, ctx.username()?)?;
    ok(&json!({"session_id": session.id, "users": session.users}))
}

/// POST /api/session/{id}/message
pub fn message(ctx: &RequestContext<'_>) -> HandlerResult {
    let id = session_id(ctx)?;
    let text = ctx.request.string_field("message")?.unwrap_or_default();
    let session = ctx.state.sessions.post_message(id, ctx.username()?, &text)?;
    ok(&json!({"session_id": session.id, "messages": session.messages}))
}
