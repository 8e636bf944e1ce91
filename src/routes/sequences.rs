//! Didactic sequence routes
//!
//! CRUD, collaborative sub-operations (tags, comments, favorites, shares,
//! workflow) and the generated quiz/feedback views.

use serde::Serialize;
use serde_json::json;
use tracing::info;

use super::{created, ok, HandlerResult, RequestContext};
use crate::store::{Comment, Sequence, WorkflowStatus};
use crate::types::{EntityKind, ServiceError};

const UNKNOWN: &str = "inconnu";

#[derive(Debug, Serialize)]
struct WorkflowResponse {
    id: u64,
    #[serde(rename = "workflow_status")]
    status: WorkflowStatus,
}

fn sequence_id(ctx: &RequestContext<'_>) -> Result<u64, ServiceError> {
    ctx.numeric_param("id", EntityKind::Sequence)
}

/// GET /api/sequences
pub fn list(ctx: &RequestContext<'_>) -> HandlerResult {
    ok(&ctx.state.store.sequences.search(&ctx.request.query))
}

/// GET /api/sequences/advanced-search
pub fn advanced_search(ctx: &RequestContext<'_>) -> HandlerResult {
    ok(&ctx.state.store.sequences.advanced_search(&ctx.request.query))
}

/// POST /api/sequences
pub fn create(ctx: &RequestContext<'_>) -> HandlerResult {
    let fields = ctx.request.json_object()?;
    let sequence = ctx.state.store.sequences.create(fields)?;
    info!("Sequence {} created by {}", sequence.id, ctx.username()?);
    created(&json!({"message": ctx.message("created"), "data": sequence}))
}

/// GET /api/sequences/{id}
pub fn get(ctx: &RequestContext<'_>) -> HandlerResult {
    ok(&ctx.state.store.sequences.get(sequence_id(ctx)?)?)
}

/// PUT /api/sequences/{id}
pub fn update(ctx: &RequestContext<'_>) -> HandlerResult {
    let id = sequence_id(ctx)?;
    let patch = ctx.request.json_object()?;
    let sequence = ctx.state.store.sequences.update(id, patch)?;
    ok(&json!({"message": ctx.message("updated"), "data": sequence}))
}

/// DELETE /api/sequences/{id}
pub fn delete(ctx: &RequestContext<'_>) -> HandlerResult {
    let id = sequence_id(ctx)?;
    ctx.state.store.sequences.delete(id)?;
    info!("Sequence {} deleted by {}", id, ctx.username()?);
    ok(&json!({"message": ctx.message("deleted")}))
}

/// POST /api/sequences/{id}/tags
pub fn add_tag(ctx: &RequestContext<'_>) -> HandlerResult {
    let id = sequence_id(ctx)?;
    let tag = ctx.request.required_string("tag")?;
    ok(&ctx.state.store.sequences.add_tag(id, &tag)?)
}

/// POST /api/sequences/{id}/comments
pub fn add_comment(ctx: &RequestContext<'_>) -> HandlerResult {
    let id = sequence_id(ctx)?;
    let text = ctx.request.required_string("comment")?;
    let comment = Comment::new(ctx.username()?, text);
    ok(&ctx.state.store.sequences.add_comment(id, comment)?)
}

/// POST /api/sequences/{id}/favorite
pub fn favorite(ctx: &RequestContext<'_>) -> HandlerResult {
    let id = sequence_id(ctx)?;
    if !ctx.state.store.sequences.exists(id) {
        return Err(ServiceError::not_found(EntityKind::Sequence, id));
    }
    let favorites = ctx.state.store.favorites.add_sequence(ctx.username()?, id);
    ok(&json!({"favorites": favorites.sequences}))
}

/// POST /api/sequences/{id}/share
pub fn share(ctx: &RequestContext<'_>) -> HandlerResult {
    let id = sequence_id(ctx)?;
    if !ctx.state.store.sequences.exists(id) {
        return Err(ServiceError::not_found(EntityKind::Sequence, id));
    }
    let to_user = ctx.request.required_string("to_user")?;
    ctx.state.store.shares.add_sequence(&to_user, id);
    info!("Sequence {} shared by {} with {}", id, ctx.username()?, to_user);
    ok(&json!({
        "message": format!("Sequence {} shared with {}", id, to_user),
        "id": id,
        "to_user": to_user,
    }))
}

fn transition(ctx: &RequestContext<'_>, status: WorkflowStatus) -> HandlerResult {
    let sequence = ctx.state.store.sequences.set_status(sequence_id(ctx)?, status)?;
    ok(&json!({"id": sequence.id, "status": sequence.status}))
}

/// POST /api/sequences/{id}/validate
pub fn validate(ctx: &RequestContext<'_>) -> HandlerResult {
    transition(ctx, WorkflowStatus::Validated)
}

/// POST /api/sequences/{id}/edit
pub fn edit(ctx: &RequestContext<'_>) -> HandlerResult {
    transition(ctx, WorkflowStatus::InEdit)
}

/// POST /api/sequences/{id}/workflow
pub fn set_workflow(ctx: &RequestContext<'_>) -> HandlerResult {
    let raw = ctx.request.required_string("status")?;
    let status = WorkflowStatus::parse(&raw).ok_or_else(|| {
        ServiceError::BadRequest(format!(
            "Unknown workflow status '{}' (expected draft, in-edit or validated)",
            raw
        ))
    })?;
    transition(ctx, status)
}

/// GET /api/sequences/{id}/workflow
pub fn workflow(ctx: &RequestContext<'_>) -> HandlerResult {
    let sequence = ctx.state.store.sequences.get(sequence_id(ctx)?)?;
    ok(&WorkflowResponse {
        id: sequence.id,
        status: sequence.status,
    })
}

pub fn quiz_for(sequence: &Sequence) -> serde_json::Value {
    json!({
        "sequence_id": sequence.id,
        "questions": [
            {
                "q": format!(
                    "Expliquez le thème de la séquence '{}'.",
                    sequence.theme.as_deref().unwrap_or(UNKNOWN)
                ),
                "type": "ouverte",
            },
            {
                "q": "Quel est le niveau de cette séquence ?",
                "type": "choix",
                "options": ["A1", "A2", "B1", "B2"],
            },
            {
                "q": "La modalité est-elle présentielle ou en ligne ?",
                "type": "choix",
                "options": ["présentiel", "en ligne"],
            },
        ],
    })
}

/// GET /api/sequences/{id}/quiz
pub fn quiz(ctx: &RequestContext<'_>) -> HandlerResult {
    let sequence = ctx.state.store.sequences.get(sequence_id(ctx)?)?;
    ok(&quiz_for(&sequence))
}

pub fn feedback_for(sequence: &Sequence) -> String {
    format!(
        "Séquence '{}' : niveau {}, thème {}. Bonne structuration.",
        sequence.title,
        sequence.level.as_deref().unwrap_or(UNKNOWN),
        sequence.theme.as_deref().unwrap_or(UNKNOWN)
    )
}

/// GET /api/sequences/{id}/feedback
pub fn feedback(ctx: &RequestContext<'_>) -> HandlerResult {
    let sequence = ctx.state.store.sequences.get(sequence_id(ctx)?)?;
    ok(&json!({"feedback": feedback_for(&sequence)}))
}
