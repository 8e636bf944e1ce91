//! Service sentinels and self-description
//!
//! Provides:
//! - GET /api/status    - Liveness check
//! - GET /api/version   - Build and version info
//! - GET /api/meta      - Service metadata
//! - GET /api/endpoints - Route table listing
//! - GET /openapi.json  - OpenAPI document derived from the route table

use serde::Serialize;
use serde_json::{json, Map, Value};

use super::{ok, routes, HandlerResult, RequestContext, RouteSpec};
use crate::auth::Access;
use crate::i18n::Lang;

const SERVICE_NAME: &str = "genseqdid";

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub uptime_seconds: u64,
    pub maintenance: bool,
}

/// Version information response
#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub version: &'static str,
    pub commit: &'static str,
    pub commit_full: &'static str,
    pub build_time: &'static str,
    pub service: &'static str,
}

#[derive(Debug, Serialize)]
pub struct EndpointInfo {
    pub path: &'static str,
    pub method: String,
    pub description: &'static str,
    pub access: Access,
}

pub fn status(ctx: &RequestContext<'_>) -> HandlerResult {
    ok(&StatusResponse {
        status: "ok",
        uptime_seconds: ctx.state.started_at.elapsed().as_secs(),
        maintenance: ctx.state.maintenance.is_enabled(),
    })
}

pub fn version_info() -> VersionResponse {
    VersionResponse {
        version: env!("CARGO_PKG_VERSION"),
        commit: option_env!("GIT_COMMIT_SHORT").unwrap_or("unknown"),
        commit_full: option_env!("GIT_COMMIT_FULL").unwrap_or("unknown"),
        build_time: option_env!("BUILD_TIMESTAMP").unwrap_or("unknown"),
        service: SERVICE_NAME,
    }
}

pub fn version(_ctx: &RequestContext<'_>) -> HandlerResult {
    ok(&version_info())
}

pub fn meta(ctx: &RequestContext<'_>) -> HandlerResult {
    ok(&json!({
        "name": SERVICE_NAME,
        "description": env!("CARGO_PKG_DESCRIPTION"),
        "version": env!("CARGO_PKG_VERSION"),
        "documentation": "/openapi.json",
        "endpoints": "/api/endpoints",
        "languages": Lang::supported_codes(),
        "default_language": ctx.state.default_lang.code(),
    }))
}

/// Route table sorted by path, then verb
pub fn endpoint_list() -> Vec<EndpointInfo> {
    let mut list: Vec<EndpointInfo> = routes()
        .iter()
        .map(|spec| EndpointInfo {
            path: spec.pattern,
            method: spec.method.to_string(),
            description: spec.description,
            access: spec.access,
        })
        .collect();
    list.sort_by(|a, b| a.path.cmp(b.path).then_with(|| a.method.cmp(&b.method)));
    list
}

pub fn endpoints(_ctx: &RequestContext<'_>) -> HandlerResult {
    ok(&endpoint_list())
}

/// First path segment after `/api`, used to group operations
fn tag_for(pattern: &str) -> &str {
    let mut segments = pattern.trim_start_matches('/').split('/');
    match (segments.next(), segments.next()) {
        (Some("api"), Some(group)) => group,
        _ => "service",
    }
}

fn operation(spec: &RouteSpec) -> Value {
    let parameters: Vec<Value> = spec
        .pattern
        .split('/')
        .filter_map(|seg| seg.strip_prefix('{').and_then(|s| s.strip_suffix('}')))
        .map(|name| {
            json!({
                "name": name,
                "in": "path",
                "required": true,
                "schema": {"type": "string"},
            })
        })
        .collect();

    let mut responses = Map::new();
    responses.insert("200".into(), json!({"description": "Success"}));
    if spec.access != Access::Public {
        responses.insert("401".into(), json!({"description": "Missing or invalid token"}));
    }
    if matches!(spec.access, Access::Roles(_)) {
        responses.insert("403".into(), json!({"description": "Role not allowed"}));
    }

    let mut op = json!({
        "tags": [tag_for(spec.pattern)],
        "summary": spec.description,
        "x-access": spec.access.to_string(),
        "parameters": parameters,
        "responses": responses,
    });
    if spec.access != Access::Public {
        op["security"] = json!([{"bearerAuth": []}]);
    }
    op
}

/// OpenAPI 3 document covering every route
pub fn openapi_document() -> Value {
    let mut paths = Map::new();
    for spec in routes() {
        let entry = paths
            .entry(spec.pattern.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(verbs) = entry {
            verbs.insert(spec.method.as_str().to_lowercase(), operation(spec));
        }
    }

    json!({
        "openapi": "3.0.0",
        "info": {
            "title": SERVICE_NAME,
            "description": env!("CARGO_PKG_DESCRIPTION"),
            "version": env!("CARGO_PKG_VERSION"),
        },
        "paths": paths,
        "components": {
            "securitySchemes": {
                "bearerAuth": {"type": "http", "scheme": "bearer", "bearerFormat": "JWT"}
            }
        }
    })
}

pub fn openapi(_ctx: &RequestContext<'_>) -> HandlerResult {
    ok(&openapi_document())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_info() {
        let info = version_info();
        assert_eq!(info.service, "genseqdid");
        assert!(!info.version.is_empty());
    }

    #[test]
    fn test_endpoint_list_is_sorted_and_complete() {
        let list = endpoint_list();
        assert_eq!(list.len(), routes().len());
        assert!(list.windows(2).all(|w| w[0].path <= w[1].path));
        let users = list.iter().find(|e| e.path == "/api/users").unwrap();
        assert_eq!(users.access.to_string(), "roles:admin");
    }

    #[test]
    fn test_openapi_lists_path_parameters() {
        let doc = openapi_document();
        let get = &doc["paths"]["/api/sequences/{id}"]["get"];
        assert_eq!(get["parameters"][0]["name"], "id");
        assert_eq!(get["tags"][0], "sequences");
        assert_eq!(get["x-access"], "authenticated");
        assert!(doc["paths"]["/api/status"]["get"]["security"].is_null());
    }

    #[test]
    fn test_tag_for() {
        assert_eq!(tag_for("/openapi.json"), "service");
        assert_eq!(tag_for("/api/admin/reset-mocks"), "admin");
    }
}
