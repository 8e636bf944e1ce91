//! HTTP route table and handlers
//!
//! Every operation is one [`RouteSpec`]: verb, path pattern, description,
//! access requirement and handler. The same table drives request matching,
//! guard evaluation, `/api/endpoints` and `/openapi.json`.

pub mod admin;
pub mod auth_routes;
pub mod catalog;
pub mod collab;
pub mod health;
pub mod sequences;
pub mod sessions;
pub mod tools;

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{HeaderName, HeaderValue, CONTENT_LANGUAGE, CONTENT_TYPE};
use hyper::{Method, Response, StatusCode};
use serde::Serialize;
use serde_json::json;
use tracing::{error, warn};

use crate::auth::{Access, Claims, Identity};
use crate::i18n::Lang;
use crate::server::{ApiRequest, AppState};
use crate::types::{EntityKind, ServiceError};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub type HttpResponse = Response<Full<Bytes>>;
pub type HandlerResult = Result<HttpResponse, ServiceError>;
pub type Handler = fn(&RequestContext<'_>) -> HandlerResult;

/// One externally reachable operation
pub struct RouteSpec {
    pub method: Method,
    /// Path with `{name}` placeholders for single segments
    pub pattern: &'static str,
    pub description: &'static str,
    pub access: Access,
    pub handler: Handler,
}

/// Everything a handler may look at
pub struct RequestContext<'a> {
    pub state: &'a AppState,
    pub request: &'a ApiRequest,
    pub identity: &'a Identity,
    pub lang: Lang,
    params: Vec<(&'static str, String)>,
}

impl<'a> RequestContext<'a> {
    pub fn new(
        state: &'a AppState,
        request: &'a ApiRequest,
        identity: &'a Identity,
        lang: Lang,
        params: Vec<(&'static str, String)>,
    ) -> Self {
        Self {
            state,
            request,
            identity,
            lang,
            params,
        }
    }

    /// Claims of the caller. Guards have already run, so this only fails on
    /// public routes called without a token.
    pub fn claims(&self) -> Result<&Claims, ServiceError> {
        crate::auth::roles::require_authenticated(self.identity)
    }

    pub fn username(&self) -> Result<&str, ServiceError> {
        self.claims().map(|c| c.username.as_str())
    }

    pub fn param(&self, name: &str) -> Result<&str, ServiceError> {
        self.params
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
            .ok_or_else(|| ServiceError::Internal(format!("Route has no '{}' segment", name)))
    }

    /// Numeric id segment; anything unparsable cannot name a record
    pub fn numeric_param(&self, name: &str, kind: EntityKind) -> Result<u64, ServiceError> {
        let raw = self.param(name)?;
        raw.parse::<u64>()
            .map_err(|_| ServiceError::not_found(kind, raw))
    }

    /// Localized fixed status message
    pub fn message(&self, key: &str) -> String {
        self.lang.translate(key).to_string()
    }
}

const fn route(
    method: Method,
    pattern: &'static str,
    description: &'static str,
    access: Access,
    handler: Handler,
) -> RouteSpec {
    RouteSpec {
        method,
        pattern,
        description,
        access,
        handler,
    }
}

const PUBLIC: Access = Access::Public;
const AUTH: Access = Access::Authenticated;
const ADMIN: Access = Access::ADMIN_ONLY;
const EDITORS: Access = Access::EDITORS;
const CURATORS: Access = Access::CURATORS;

static ROUTES: &[RouteSpec] = &[
    // service
    route(Method::GET, "/api/status", "Liveness sentinel", PUBLIC, health::status),
    route(Method::GET, "/api/version", "Build and version information", PUBLIC, health::version),
    route(Method::GET, "/api/meta", "Service metadata", PUBLIC, health::meta),
    route(Method::GET, "/api/endpoints", "List every operation with its access rule", PUBLIC, health::endpoints),
    route(Method::GET, "/openapi.json", "OpenAPI document generated from the route table", PUBLIC, health::openapi),
    // identity
    route(Method::POST, "/api/auth/login", "Exchange username and password for a token", PUBLIC, auth_routes::login),
    route(Method::GET, "/api/auth/demo-token", "Issue a demo token (no elevated role)", PUBLIC, auth_routes::demo_token),
    route(Method::GET, "/api/me", "Profile of the current token", AUTH, auth_routes::me),
    route(Method::GET, "/api/roles", "List role names", AUTH, auth_routes::roles),
    route(Method::GET, "/api/users", "List users with their roles", ADMIN, auth_routes::users),
    // sequences
    route(Method::GET, "/api/sequences", "Search sequences (query, level, theme, modality, paging, sorting)", AUTH, sequences::list),
    route(Method::POST, "/api/sequences", "Create a sequence", AUTH, sequences::create),
    route(Method::GET, "/api/sequences/advanced-search", "Search every sequence field (query, level/niveau, theme, modality/modalidad, sorting)", AUTH, sequences::advanced_search),
    route(Method::GET, "/api/sequences/{id}", "Fetch a sequence", AUTH, sequences::get),
    route(Method::PUT, "/api/sequences/{id}", "Merge fields into a sequence", AUTH, sequences::update),
    route(Method::DELETE, "/api/sequences/{id}", "Delete a sequence", AUTH, sequences::delete),
    route(Method::POST, "/api/sequences/{id}/tags", "Tag a sequence", AUTH, sequences::add_tag),
    route(Method::POST, "/api/sequences/{id}/comments", "Comment on a sequence", AUTH, sequences::add_comment),
    route(Method::POST, "/api/sequences/{id}/favorite", "Add a sequence to your favorites", AUTH, sequences::favorite),
    route(Method::POST, "/api/sequences/{id}/share", "Share a sequence with another user", AUTH, sequences::share),
    route(Method::POST, "/api/sequences/{id}/validate", "Mark a sequence validated", EDITORS, sequences::validate),
    route(Method::POST, "/api/sequences/{id}/edit", "Mark a sequence in edition", EDITORS, sequences::edit),
    route(Method::POST, "/api/sequences/{id}/workflow", "Set the workflow status of a sequence", EDITORS, sequences::set_workflow),
    route(Method::GET, "/api/sequences/{id}/workflow", "Workflow status of a sequence", AUTH, sequences::workflow),
    route(Method::GET, "/api/sequences/{id}/quiz", "Quiz generated from a sequence", AUTH, sequences::quiz),
    route(Method::GET, "/api/sequences/{id}/feedback", "Automatic feedback on a sequence", AUTH, sequences::feedback),
    // library
    route(Method::GET, "/api/library/search", "Search library documents", AUTH, catalog::search_documents),
    route(Method::POST, "/api/library/documents", "Add a library document", CURATORS, catalog::create_document),
    route(Method::GET, "/api/library/documents/{id}", "Fetch a library document", AUTH, catalog::get_document),
    route(Method::PUT, "/api/library/documents/{id}", "Merge fields into a library document", CURATORS, catalog::update_document),
    route(Method::DELETE, "/api/library/documents/{id}", "Delete a library document", CURATORS, catalog::delete_document),
    route(Method::GET, "/api/library/documents/{id}/summary", "Summary of a library document", AUTH, catalog::document_summary),
    // community resources
    route(Method::GET, "/api/internet/search", "Search community resources", AUTH, catalog::search_resources),
    route(Method::POST, "/api/internet/resources", "Add a community resource", AUTH, catalog::create_resource),
    route(Method::GET, "/api/internet/resources/{id}", "Fetch a community resource", AUTH, catalog::get_resource),
    route(Method::PUT, "/api/internet/resources/{id}", "Merge fields into a community resource", AUTH, catalog::update_resource),
    route(Method::DELETE, "/api/internet/resources/{id}", "Delete a community resource", AUTH, catalog::delete_resource),
    route(Method::POST, "/api/internet/resources/{id}/tags", "Tag a community resource", AUTH, catalog::tag_resource),
    route(Method::POST, "/api/internet/resources/{id}/comments", "Comment on a community resource", AUTH, catalog::comment_resource),
    route(Method::POST, "/api/internet/resources/{id}/favorite", "Add a resource to your favorites", AUTH, catalog::favorite_resource),
    route(Method::POST, "/api/internet/resources/{id}/share", "Share a resource with another user", AUTH, catalog::share_resource),
    route(Method::GET, "/api/internet/resources/{id}/summary", "Summary of a community resource", AUTH, catalog::resource_summary),
    route(Method::GET, "/api/internet/resources/{id}/feedback", "Automatic feedback on a community resource", AUTH, catalog::resource_feedback),
    // per-user ledgers
    route(Method::GET, "/api/shared", "Items shared with you", AUTH, collab::shared),
    route(Method::GET, "/api/favorites", "Your favorites", AUTH, collab::favorites),
    route(Method::GET, "/api/notifications", "Your notifications", AUTH, collab::notifications),
    route(Method::POST, "/api/notifications", "Append a notification to your inbox", AUTH, collab::push_notification),
    route(Method::POST, "/api/webhook", "Receive an external event", PUBLIC, collab::webhook),
    // sessions
    route(Method::POST, "/api/session", "Open a collaborative session", AUTH, sessions::create),
    route(Method::GET, "/api/session/{id}", "Members and history of a session", AUTH, sessions::get),
    route(Method::POST, "/api/session/{id}/join", "Join a session", AUTH, sessions::join),
    route(Method::POST, "/api/session/{id}/message", "Post a message to a session", AUTH, sessions::message),
    // text tools
    route(Method::GET, "/api/stats", "Sequence counts by level, theme and modality", AUTH, tools::stats),
    route(Method::GET, "/api/corpus-analysis", "Word statistics over the corpus", AUTH, tools::corpus_analysis),
    route(Method::GET, "/api/progression-plan", "Personal progression plan", AUTH, tools::progression_plan),
    route(Method::GET, "/api/suggestions", "Random suggestions for your role", AUTH, tools::suggestions),
    route(Method::POST, "/api/translate", "Simulated translation", AUTH, tools::translate),
    route(Method::POST, "/api/keywords", "Extract keywords from text", AUTH, tools::keywords),
    route(Method::POST, "/api/similarity", "Word-set similarity of two texts", AUTH, tools::similarity),
    route(Method::POST, "/api/quiz-from-text", "Quiz generated from free text", AUTH, tools::quiz_from_text),
    route(Method::POST, "/api/semantic-search", "Full-text search over sequences and resources", AUTH, tools::semantic_search),
    route(Method::POST, "/api/lesson-plan", "Lesson plan from selected sequences", AUTH, tools::lesson_plan),
    route(Method::POST, "/api/export-text", "Plain-text export of selected sequences", AUTH, tools::export_text),
    // administration
    route(Method::POST, "/api/admin/generate-sequences", "Generate placeholder sequences (?count=N)", ADMIN, admin::generate_sequences),
    route(Method::POST, "/api/admin/generate-custom-sequences", "Generate sequences from level/theme/modality choices", ADMIN, admin::generate_custom_sequences),
    route(Method::POST, "/api/admin/generate-resources", "Generate community resources", ADMIN, admin::generate_resources),
    route(Method::POST, "/api/admin/generate-multilang-examples", "Insert one example per language", ADMIN, admin::generate_multilang_examples),
    route(Method::POST, "/api/admin/generate-from-prompt", "Generate a sequence and a resource from a prompt", ADMIN, admin::generate_from_prompt),
    route(Method::POST, "/api/admin/generate-users", "Create the test accounts", ADMIN, admin::generate_users),
    route(Method::POST, "/api/admin/reset-mocks", "Reset content to the default catalogue", ADMIN, admin::reset),
    route(Method::POST, "/api/admin/import-mocks", "Replace all content", ADMIN, admin::import_mocks),
    route(Method::GET, "/api/admin/export-mocks", "Dump all content", ADMIN, admin::export_mocks),
    route(Method::POST, "/api/admin/import-csv", "Append CSV rows (?what=sequences|resources)", ADMIN, admin::import_csv),
    route(Method::GET, "/api/admin/export-csv", "Export a collection as CSV (?what=sequences|resources)", ADMIN, admin::export_csv),
    route(Method::GET, "/api/admin/audit-log", "Most recent requests (?limit=N)", ADMIN, admin::audit_log),
    route(Method::GET, "/api/admin/activity-report", "Collection and user counts", ADMIN, admin::activity_report),
    route(Method::GET, "/api/admin/maintenance", "Maintenance flag", ADMIN, admin::maintenance_status),
    route(Method::POST, "/api/admin/maintenance", "Turn maintenance mode on or off", ADMIN, admin::set_maintenance),
];

pub fn routes() -> &'static [RouteSpec] {
    ROUTES
}

/// Result of looking a request up in the table
pub enum RouteMatch {
    Found(&'static RouteSpec, Vec<(&'static str, String)>),
    /// Path exists but not for this verb
    WrongMethod(Vec<Method>),
    Missing,
}

fn match_pattern(pattern: &'static str, path: &str) -> Option<Vec<(&'static str, String)>> {
    let mut wanted = pattern.trim_matches('/').split('/');
    let mut given = path.trim_matches('/').split('/');
    let mut params = Vec::new();

    loop {
        match (wanted.next(), given.next()) {
            (None, None) => return Some(params),
            (Some(w), Some(g)) => {
                if let Some(name) = w.strip_prefix('{').and_then(|w| w.strip_suffix('}')) {
                    if g.is_empty() {
                        return None;
                    }
                    let value = urlencoding::decode(g).map(|v| v.into_owned()).unwrap_or_else(|_| g.to_string());
                    params.push((name, value));
                } else if w != g {
                    return None;
                }
            }
            _ => return None,
        }
    }
}

pub fn find_route(method: &Method, path: &str) -> RouteMatch {
    let mut allowed = Vec::new();
    for spec in routes() {
        if let Some(params) = match_pattern(spec.pattern, path) {
            if spec.method == *method {
                return RouteMatch::Found(spec, params);
            }
            allowed.push(spec.method.clone());
        }
    }
    if allowed.is_empty() {
        RouteMatch::Missing
    } else {
        RouteMatch::WrongMethod(allowed)
    }
}

// =============================================================================
// Response Helpers
// =============================================================================

pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> HttpResponse {
    let json = serde_json::to_vec(body).unwrap_or_else(|_| b"{}".to_vec());
    let mut response = Response::new(Full::new(Bytes::from(json)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

pub fn text_response(status: StatusCode, content_type: &'static str, body: String) -> HttpResponse {
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

pub fn empty_response(status: StatusCode) -> HttpResponse {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    response
}

pub fn ok<T: Serialize>(body: &T) -> HandlerResult {
    Ok(json_response(StatusCode::OK, body))
}

pub fn created<T: Serialize>(body: &T) -> HandlerResult {
    Ok(json_response(StatusCode::CREATED, body))
}

/// Localized JSON error body
pub fn error_response(err: &ServiceError, lang: Lang) -> HttpResponse {
    match err {
        ServiceError::Internal(_) | ServiceError::Config(_) => error!("Request failed: {}", err),
        ServiceError::Unauthorized(_) | ServiceError::Forbidden(_) => warn!("Access denied: {}", err),
        _ => {}
    }

    let body = json!({
        "error": lang.translate(err.message_key()),
        "code": err.code(),
        "detail": err.client_detail(),
    });
    json_response(err.status_code(), &body)
}

pub fn set_request_id(response: &mut HttpResponse, id: &str) {
    if let Ok(value) = HeaderValue::from_str(id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }
}

pub fn set_content_language(response: &mut HttpResponse, lang: Lang) {
    response
        .headers_mut()
        .insert(CONTENT_LANGUAGE, HeaderValue::from_static(lang.code()));
}
