//! Administration routes
//!
//! Bulk generators, snapshot import/export (JSON and CSV), audit trail,
//! activity report and the maintenance switch. Every route here is
//! admin-only; the route table enforces it.

use hyper::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use super::{empty_response, ok, text_response, HandlerResult, RequestContext};
use crate::auth::roles::TEACHER;
use crate::logging::DEFAULT_READ_LIMIT;
use crate::store::seed::{self, ResourceBlueprint, SequenceBlueprint, MAX_GENERATED};
use crate::store::{CsvTarget, SnapshotInput};
use crate::types::ServiceError;

const DEFAULT_GENERATED: usize = 5;

fn check_count(count: usize) -> Result<usize, ServiceError> {
    if count > MAX_GENERATED {
        return Err(ServiceError::BadRequest(format!(
            "count must be at most {}",
            MAX_GENERATED
        )));
    }
    Ok(count)
}

/// `?count=` parameter; absent means the default, garbage is rejected
fn count_param(ctx: &RequestContext<'_>) -> Result<usize, ServiceError> {
    match ctx.request.query("count") {
        None => Ok(DEFAULT_GENERATED),
        Some(raw) => raw
            .trim()
            .parse::<usize>()
            .map_err(|_| ServiceError::BadRequest(format!("Invalid count '{}'", raw)))
            .and_then(check_count),
    }
}

/// POST /api/admin/generate-sequences?count=N
pub fn generate_sequences(ctx: &RequestContext<'_>) -> HandlerResult {
    let count = count_param(ctx)?;
    let sequences = &ctx.state.store.sequences;
    let ids = (0..count)
        .map(|_| sequences.insert_with(seed::auto_sequence).map(|s| s.id))
        .collect::<Result<Vec<u64>, _>>()?;
    info!("Generated {} sequences", count);
    ok(&json!({
        "message": format!("{} sequences generated", count),
        "ids": ids,
    }))
}

/// POST /api/admin/generate-custom-sequences
pub fn generate_custom_sequences(ctx: &RequestContext<'_>) -> HandlerResult {
    let blueprint: SequenceBlueprint = ctx.request.json_or_default()?;
    let blueprint = blueprint.normalized();
    let count = check_count(blueprint.count)?;

    let mut rng = rand::thread_rng();
    let created = (0..count)
        .map(|_| {
            let draft = blueprint.generate(&mut rng);
            ctx.state.store.sequences.insert_with(move |_| draft)
        })
        .collect::<Result<Vec<_>, _>>()?;
    info!("Generated {} custom sequences", created.len());
    ok(&json!({
        "message": format!("{} sequences generated", created.len()),
        "sequences": created,
    }))
}

/// POST /api/admin/generate-resources
pub fn generate_resources(ctx: &RequestContext<'_>) -> HandlerResult {
    let blueprint: ResourceBlueprint = ctx.request.json_or_default()?;
    let blueprint = blueprint.normalized();
    let count = check_count(blueprint.count)?;

    let mut rng = rand::thread_rng();
    for _ in 0..count {
        ctx.state
            .store
            .resources
            .insert_with(|id| blueprint.generate(&mut rng, id))?;
    }
    info!("Generated {} resources", count);
    ok(&json!({"message": format!("{} resources generated", count)}))
}

/// POST /api/admin/generate-multilang-examples
pub fn generate_multilang_examples(ctx: &RequestContext<'_>) -> HandlerResult {
    let store = &ctx.state.store;
    let sequences = seed::multilang_sequences()
        .into_iter()
        .map(|draft| store.sequences.insert_with(move |_| draft))
        .collect::<Result<Vec<_>, _>>()?;
    let resources = seed::multilang_resources()
        .into_iter()
        .map(|item| store.resources.insert(item))
        .collect::<Result<Vec<_>, _>>()?;
    ok(&json!({
        "message": "Multilingual examples generated",
        "sequences": sequences,
        "resources": resources,
    }))
}

/// POST /api/admin/generate-from-prompt
pub fn generate_from_prompt(ctx: &RequestContext<'_>) -> HandlerResult {
    let prompt = ctx.request.required_string("prompt")?;
    let store = &ctx.state.store;
    let draft = seed::prompt_sequence(&prompt);
    let sequence = store.sequences.insert_with(move |_| draft)?;
    let resource = store
        .resources
        .insert_with(|id| seed::prompt_resource(&prompt, id))?;
    ok(&json!({"sequence": sequence, "resource": resource}))
}

/// POST /api/admin/generate-users
///
/// Existing usernames are skipped.
pub fn generate_users(ctx: &RequestContext<'_>) -> HandlerResult {
    let mut created = 0;
    for (username, secret) in seed::test_accounts() {
        if ctx
            .state
            .identities
            .create_if_absent(&username, &secret, &[TEACHER])?
        {
            created += 1;
        }
    }
    info!("Generated {} test users", created);
    ok(&json!({
        "message": format!("{} test users generated", created),
        "created": created,
    }))
}

/// POST /api/admin/reset-mocks
pub fn reset(ctx: &RequestContext<'_>) -> HandlerResult {
    ctx.state.store.reset();
    ok(&json!({"message": "Content reset to defaults"}))
}

/// POST /api/admin/import-mocks
pub fn import_mocks(ctx: &RequestContext<'_>) -> HandlerResult {
    let input: SnapshotInput = ctx.request.json()?;
    ctx.state.store.import(input)?;
    ok(&json!({
        "message": "Content imported",
        "sequences": ctx.state.store.sequences.len(),
        "library_documents": ctx.state.store.documents.len(),
        "internet_resources": ctx.state.store.resources.len(),
    }))
}

/// GET /api/admin/export-mocks
pub fn export_mocks(ctx: &RequestContext<'_>) -> HandlerResult {
    ok(&ctx.state.store.snapshot())
}

fn csv_target(ctx: &RequestContext<'_>) -> Result<CsvTarget, ServiceError> {
    ctx.request.query("what").unwrap_or_default().parse()
}

/// POST /api/admin/import-csv?what=sequences|resources
pub fn import_csv(ctx: &RequestContext<'_>) -> HandlerResult {
    let target = csv_target(ctx)?;
    let text = ctx.request.text()?;
    if text.trim().is_empty() {
        return Err(ServiceError::BadRequest("No CSV content provided".into()));
    }
    let imported = ctx.state.store.import_csv(target, text)?;
    info!("Imported {} rows from CSV ({:?})", imported, target);
    ok(&json!({
        "message": format!("{} rows imported", imported),
        "imported": imported,
    }))
}

/// GET /api/admin/export-csv?what=sequences|resources
pub fn export_csv(ctx: &RequestContext<'_>) -> HandlerResult {
    match ctx.state.store.export_csv(csv_target(ctx)?)? {
        Some(csv) => Ok(text_response(StatusCode::OK, "text/csv; charset=utf-8", csv)),
        None => Ok(empty_response(StatusCode::NO_CONTENT)),
    }
}

/// GET /api/admin/audit-log?limit=N
pub fn audit_log(ctx: &RequestContext<'_>) -> HandlerResult {
    let limit = ctx
        .request
        .query("limit")
        .and_then(|raw| raw.trim().parse::<usize>().ok())
        .unwrap_or(DEFAULT_READ_LIMIT);
    ok(&ctx.state.audit.recent(limit))
}

/// GET /api/admin/activity-report
pub fn activity_report(ctx: &RequestContext<'_>) -> HandlerResult {
    let state = ctx.state;
    ok(&json!({
        "sequences": state.store.sequences.len(),
        "library_documents": state.store.documents.len(),
        "internet_resources": state.store.resources.len(),
        "users": state.identities.user_count(),
        "sessions": state.sessions.len(),
    }))
}

#[derive(Debug, Deserialize)]
struct MaintenanceRequest {
    enabled: bool,
}

/// GET /api/admin/maintenance
pub fn maintenance_status(ctx: &RequestContext<'_>) -> HandlerResult {
    ok(&json!({"maintenance": ctx.state.maintenance.is_enabled()}))
}

/// POST /api/admin/maintenance
pub fn set_maintenance(ctx: &RequestContext<'_>) -> HandlerResult {
    let body: MaintenanceRequest = ctx.request.json()?;
    let enabled = ctx.state.maintenance.set(body.enabled);
    if enabled {
        warn!("Maintenance mode enabled by {}", ctx.username()?);
    }
    ok(&json!({"maintenance": enabled}))
}
