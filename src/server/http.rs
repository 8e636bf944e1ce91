//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling. Bodies are buffered,
//! then the request runs through [`dispatch`] on the blocking pool: every
//! store operation is synchronous and password hashing is CPU bound.

use bytes::Bytes;
use http_body_util::{BodyExt, Full, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::auth::{authorize, IdentityStore, JwtValidator};
use crate::config::Args;
use crate::i18n::Lang;
use crate::logging::{AuditEntry, AuditLog};
use crate::middleware::{resolve_identity, MaintenanceGate};
use crate::routes::{
    error_response, find_route, set_content_language, set_request_id, HandlerResult, HttpResponse,
    RequestContext, RouteMatch,
};
use crate::server::ApiRequest;
use crate::sessions::SessionRegistry;
use crate::store::ResourceStore;
use crate::types::{EntityKind, ServiceError};

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub default_lang: Lang,
    pub jwt: JwtValidator,
    /// Users and roles
    pub identities: IdentityStore,
    /// Sequences, catalogues, ledgers and inboxes
    pub store: ResourceStore,
    pub sessions: SessionRegistry,
    pub audit: AuditLog,
    pub maintenance: MaintenanceGate,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(args: Args) -> Result<Self, ServiceError> {
        let jwt = JwtValidator::new(args.jwt_secret()?, args.jwt_expiry_seconds)?;

        let (identities, store) = if args.seed_demo_data {
            (
                IdentityStore::with_bootstrap_users()?,
                ResourceStore::with_default_catalogue(),
            )
        } else {
            (IdentityStore::new()?, ResourceStore::new())
        };

        if args.maintenance {
            warn!("Starting with maintenance mode enabled");
        }

        Ok(Self {
            default_lang: args.default_lang(),
            jwt,
            identities,
            store,
            sessions: SessionRegistry::new(),
            audit: AuditLog::new(args.audit_capacity),
            maintenance: MaintenanceGate::new(args.maintenance),
            started_at: Instant::now(),
            args,
        })
    }
}

/// Start the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<(), ServiceError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!("Genseqdid listening on {}", state.args.listen);

    if state.args.dev_mode {
        warn!("Development mode enabled - built-in JWT secret in use");
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new()
                        .preserve_header_case(true)
                        .title_case_headers(true)
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Buffer the body and hand the request to the pipeline
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();
    debug!("[{}] {} {}", addr, parts.method, parts.uri.path());

    let body = match Limited::new(body, state.args.max_body_bytes).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            let err = ServiceError::BadRequest(format!("Request body rejected: {}", e));
            return Ok(error_response(&err, state.default_lang));
        }
    };

    let request = ApiRequest::from_parts(parts, body);
    let worker = Arc::clone(&state);
    match tokio::task::spawn_blocking(move || dispatch(&worker, request)).await {
        Ok(response) => Ok(response),
        Err(e) => {
            let err = ServiceError::Internal(format!("Request task failed: {}", e));
            Ok(error_response(&err, state.default_lang))
        }
    }
}

/// Run one request through language, identity, audit, maintenance,
/// routing, guard and handler. Every response carries Content-Language.
pub fn dispatch(state: &AppState, req: ApiRequest) -> HttpResponse {
    let lang = Lang::resolve(
        req.query("lang"),
        req.header("accept-language"),
        state.default_lang,
    );

    let mut request_id = None;
    let mut response = process(state, &req, lang, &mut request_id)
        .unwrap_or_else(|err| error_response(&err, lang));
    set_content_language(&mut response, lang);
    if let Some(id) = request_id {
        set_request_id(&mut response, &id);
    }
    response
}

fn process(
    state: &AppState,
    req: &ApiRequest,
    lang: Lang,
    request_id: &mut Option<String>,
) -> HandlerResult {
    let identity = resolve_identity(&state.jwt, req.header("authorization"));

    let entry = AuditEntry::new(req.path.as_str(), req.method.as_str(), identity.label());
    *request_id = Some(entry.request_id.clone());
    state.audit.record(entry);

    state.maintenance.check(&req.path, &identity)?;

    let (spec, params) = match find_route(&req.method, &req.path) {
        RouteMatch::Found(spec, params) => (spec, params),
        RouteMatch::WrongMethod(allowed) => {
            let allowed: Vec<&str> = allowed.iter().map(|m| m.as_str()).collect();
            return Err(ServiceError::MethodNotAllowed(format!(
                "{} is not supported on {} (allowed: {})",
                req.method,
                req.path,
                allowed.join(", ")
            )));
        }
        RouteMatch::Missing => return Err(ServiceError::not_found(EntityKind::Route, &req.path)),
    };

    authorize(spec.access, &identity)?;

    let ctx = RequestContext::new(state, req, &identity, lang, params);
    (spec.handler)(&ctx)
}
