//! Library document and community resource routes
//!
//! Both collections share one record shape, so every handler here is a
//! thin wrapper that picks the [`Catalog`] and delegates.

use serde_json::{json, Value};
use tracing::info;

use super::{created, ok, HandlerResult, RequestContext};
use crate::store::{Catalog, CatalogItem, Comment};
use crate::types::ServiceError;

const SUMMARY_CHARS: usize = 100;

fn documents<'a>(ctx: &RequestContext<'a>) -> &'a Catalog {
    &ctx.state.store.documents
}

fn resources<'a>(ctx: &RequestContext<'a>) -> &'a Catalog {
    &ctx.state.store.resources
}

/// First hundred characters, with an ellipsis when truncated
pub fn summarize(content: &str) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(SUMMARY_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

fn search(ctx: &RequestContext<'_>, catalog: &Catalog) -> HandlerResult {
    ok(&catalog.search(&ctx.request.query))
}

fn create(ctx: &RequestContext<'_>, catalog: &Catalog) -> HandlerResult {
    let body = ctx.request.json_object()?;
    let item = catalog.create(Value::Object(body))?;
    info!("{} {} created by {}", catalog.kind(), item.id, ctx.username()?);
    created(&json!({"message": ctx.message("created"), "data": item}))
}

fn get(ctx: &RequestContext<'_>, catalog: &Catalog) -> HandlerResult {
    ok(&catalog.get(ctx.param("id")?)?)
}

fn update(ctx: &RequestContext<'_>, catalog: &Catalog) -> HandlerResult {
    let id = ctx.param("id")?;
    let patch = ctx.request.json_object()?;
    let item = catalog.update(id, patch)?;
    ok(&json!({"message": ctx.message("updated"), "data": item}))
}

fn delete(ctx: &RequestContext<'_>, catalog: &Catalog) -> HandlerResult {
    let id = ctx.param("id")?;
    catalog.delete(id)?;
    info!("{} {} deleted by {}", catalog.kind(), id, ctx.username()?);
    ok(&json!({"message": ctx.message("deleted")}))
}

fn summary(ctx: &RequestContext<'_>, catalog: &Catalog) -> HandlerResult {
    let item = catalog.get(ctx.param("id")?)?;
    ok(&json!({"summary": summarize(&item.content)}))
}

pub fn search_documents(ctx: &RequestContext<'_>) -> HandlerResult {
    search(ctx, documents(ctx))
}

pub fn create_document(ctx: &RequestContext<'_>) -> HandlerResult {
    create(ctx, documents(ctx))
}

pub fn get_document(ctx: &RequestContext<'_>) -> HandlerResult {
    get(ctx, documents(ctx))
}

pub fn update_document(ctx: &RequestContext<'_>) -> HandlerResult {
    update(ctx, documents(ctx))
}

pub fn delete_document(ctx: &RequestContext<'_>) -> HandlerResult {
    delete(ctx, documents(ctx))
}

pub fn document_summary(ctx: &RequestContext<'_>) -> HandlerResult {
    summary(ctx, documents(ctx))
}

pub fn search_resources(ctx: &RequestContext<'_>) -> HandlerResult {
    search(ctx, resources(ctx))
}

pub fn create_resource(ctx: &RequestContext<'_>) -> HandlerResult {
    create(ctx, resources(ctx))
}

pub fn get_resource(ctx: &RequestContext<'_>) -> HandlerResult {
    get(ctx, resources(ctx))
}

pub fn update_resource(ctx: &RequestContext<'_>) -> HandlerResult {
    update(ctx, resources(ctx))
}

pub fn delete_resource(ctx: &RequestContext<'_>) -> HandlerResult {
    delete(ctx, resources(ctx))
}

pub fn resource_summary(ctx: &RequestContext<'_>) -> HandlerResult {
    summary(ctx, resources(ctx))
}

/// POST /api/internet/resources/{id}/tags
pub fn tag_resource(ctx: &RequestContext<'_>) -> HandlerResult {
    let id = ctx.param("id")?;
    let tag = ctx.request.required_string("tag")?;
    ok(&resources(ctx).add_tag(id, &tag)?)
}

/// POST /api/internet/resources/{id}/comments
pub fn comment_resource(ctx: &RequestContext<'_>) -> HandlerResult {
    let id = ctx.param("id")?;
    let text = ctx.request.required_string("comment")?;
    let comment = Comment::new(ctx.username()?, text);
    ok(&resources(ctx).add_comment(id, comment)?)
}

fn existing_resource(ctx: &RequestContext<'_>) -> Result<String, ServiceError> {
    let id = ctx.param("id")?;
    let catalog = resources(ctx);
    if !catalog.exists(id) {
        return Err(ServiceError::not_found(catalog.kind(), id));
    }
    Ok(id.to_string())
}

/// POST /api/internet/resources/{id}/favorite
pub fn favorite_resource(ctx: &RequestContext<'_>) -> HandlerResult {
    let id = existing_resource(ctx)?;
    let favorites = ctx.state.store.favorites.add_resource(ctx.username()?, &id);
    ok(&json!({"favorites": favorites.resources}))
}

/// POST /api/internet/resources/{id}/share
pub fn share_resource(ctx: &RequestContext<'_>) -> HandlerResult {
    let id = existing_resource(ctx)?;
    let to_user = ctx.request.required_string("to_user")?;
    ctx.state.store.shares.add_resource(&to_user, &id);
    info!("Resource {} shared by {} with {}", id, ctx.username()?, to_user);
    ok(&json!({
        "message": format!("Resource {} shared with {}", id, to_user),
        "id": id,
        "to_user": to_user,
    }))
}

pub fn feedback_for(item: &CatalogItem) -> String {
    format!(
        "Ressource '{}' : type {}, thème {}. Utile pour l'apprentissage.",
        item.title,
        item.extra_str("type").unwrap_or("inconnu"),
        item.extra_str("theme").unwrap_or("inconnu")
    )
}

/// GET /api/internet/resources/{id}/feedback
pub fn resource_feedback(ctx: &RequestContext<'_>) -> HandlerResult {
    let item = resources(ctx).get(ctx.param("id")?)?;
    ok(&json!({"feedback": feedback_for(&item)}))
}
