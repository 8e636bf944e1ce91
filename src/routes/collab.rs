//! Per-user ledgers, notification inboxes and the webhook receiver

use serde_json::{json, Value};
use tracing::info;

use super::{ok, HandlerResult, RequestContext};

/// GET /api/shared
pub fn shared(ctx: &RequestContext<'_>) -> HandlerResult {
    ok(&ctx.state.store.shares.get(ctx.username()?))
}

/// GET /api/favorites
pub fn favorites(ctx: &RequestContext<'_>) -> HandlerResult {
    ok(&ctx.state.store.favorites.get(ctx.username()?))
}

/// GET /api/notifications
pub fn notifications(ctx: &RequestContext<'_>) -> HandlerResult {
    ok(&ctx.state.store.notifications.list(ctx.username()?))
}

/// POST /api/notifications
///
/// A missing or null `notification` leaves the inbox as it is.
pub fn push_notification(ctx: &RequestContext<'_>) -> HandlerResult {
    let user = ctx.username()?;
    let mut body = ctx.request.json_object_or_empty()?;
    let inbox = &ctx.state.store.notifications;
    match body.remove("notification") {
        Some(Value::Null) | None => ok(&inbox.list(user)),
        Some(notification) => ok(&inbox.push(user, notification)),
    }
}

/// POST /api/webhook
pub fn webhook(ctx: &RequestContext<'_>) -> HandlerResult {
    let event = ctx
        .request
        .string_field("event")?
        .unwrap_or_else(|| "unknown".to_string());
    info!(target: "genseqdid::webhook", event = %event, "Webhook received");
    ok(&json!({
        "message": format!("Webhook '{}' received", event),
        "event": event,
    }))
}
