//! End-to-end pipeline tests: requests go through `dispatch` exactly as the
//! HTTP server would hand them over.

mod common;

use hyper::{Method, StatusCode};
use serde_json::json;

use common::{get, login, post, send, state, state_with};
use genseqdid::ApiRequest;

#[test]
fn test_admin_generation_and_maintenance_flow() {
    let state = state();
    let admin = login(&state, "admin", "admin123");
    let teacher = login(&state, "enseignant", "enseignant123");

    let me = get(&state, "/api/me", Some(&admin)).json();
    assert!(me["roles"].as_array().unwrap().contains(&json!("admin")));

    let first = post(
        &state,
        "/api/sequences",
        Some(&teacher),
        json!({"title": "Saludos", "modality": "en ligne"}),
    );
    assert_eq!(first.status, StatusCode::CREATED);
    let prior_max = first.json()["data"]["id"].as_u64().unwrap();
    let sequence_count = |state: &genseqdid::AppState| {
        get(state, "/api/admin/activity-report", Some(&admin)).json()["sequences"]
            .as_u64()
            .unwrap()
    };
    let before = sequence_count(&state);

    let generated = post(&state, "/api/admin/generate-sequences?count=5", Some(&admin), json!({}));
    assert_eq!(generated.status, StatusCode::OK);
    let ids: Vec<u64> = generated.json()["ids"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_u64().unwrap())
        .collect();
    assert_eq!(ids.len(), 5);
    assert!(ids.iter().all(|id| *id > prior_max));
    assert_eq!(sequence_count(&state), before + 5);

    let on = post(&state, "/api/admin/maintenance", Some(&admin), json!({"enabled": true}));
    assert_eq!(on.json()["maintenance"], true);

    let blocked = get(&state, "/api/sequences", Some(&teacher));
    assert_eq!(blocked.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(blocked.json()["error"], "API en maintenance");
    assert_eq!(get(&state, "/api/sequences", None).status, StatusCode::SERVICE_UNAVAILABLE);

    // admins and sentinels keep working
    assert_eq!(get(&state, "/api/sequences", Some(&admin)).status, StatusCode::OK);
    assert_eq!(get(&state, "/api/status", None).status, StatusCode::OK);
    assert_eq!(get(&state, "/api/version", None).status, StatusCode::OK);
    assert_eq!(get(&state, "/api/auth/demo-token", None).status, StatusCode::OK);

    let off = post(&state, "/api/admin/maintenance", Some(&admin), json!({"enabled": false}));
    assert_eq!(off.json()["maintenance"], false);

    let listed = get(&state, "/api/sequences", Some(&teacher));
    assert_eq!(listed.status, StatusCode::OK);
    let listed_ids: Vec<u64> = listed
        .json()
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_u64().unwrap())
        .collect();
    assert_eq!(listed_ids.len() as u64, before + 5);
    for id in &ids {
        assert!(listed_ids.contains(id));
    }
}

#[test]
fn test_login_failures_are_indistinguishable() {
    let state = state();
    let wrong_secret = post(
        &state,
        "/api/auth/login",
        None,
        json!({"username": "admin", "password": "nope"}),
    );
    let unknown_user = post(
        &state,
        "/api/auth/login",
        None,
        json!({"username": "ghost", "password": "nope"}),
    );
    assert_eq!(wrong_secret.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_secret.body, unknown_user.body);

    let missing = post(&state, "/api/auth/login", None, json!({"username": "admin"}));
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
}

#[test]
fn test_guards() {
    let state = state();
    assert_eq!(get(&state, "/api/sequences", None).status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        get(&state, "/api/sequences", Some("not-a-token")).status,
        StatusCode::UNAUTHORIZED
    );

    let demo = get(&state, "/api/auth/demo-token", None).json()["access_token"]
        .as_str()
        .unwrap()
        .to_string();
    let me = get(&state, "/api/me", Some(&demo)).json();
    assert_eq!(me["username"], "demo");
    assert_eq!(get(&state, "/api/users", Some(&demo)).status, StatusCode::FORBIDDEN);

    // Any authenticated caller may create, but workflow changes need an editor role
    let drafted = post(
        &state,
        "/api/sequences",
        Some(&demo),
        json!({"title": "Brouillon", "modality": "en ligne"}),
    );
    assert_eq!(drafted.status, StatusCode::CREATED);
    let drafted_id = drafted.json()["data"]["id"].as_u64().unwrap();
    let refused = post(&state, &format!("/api/sequences/{}/validate", drafted_id), Some(&demo), json!({}));
    assert_eq!(refused.status, StatusCode::FORBIDDEN);

    let researcher = login(&state, "chercheur", "chercheur123");
    let validate = post(&state, "/api/sequences/1/validate", Some(&researcher), json!({}));
    assert_eq!(validate.status, StatusCode::FORBIDDEN);
    let doc = post(
        &state,
        "/api/library/documents",
        Some(&researcher),
        json!({"title": "Lexique"}),
    );
    assert_eq!(doc.status, StatusCode::CREATED);
    assert_eq!(doc.json()["data"]["id"], "5");
}

#[test]
fn test_sequence_crud_rules() {
    let state = state();
    let teacher = login(&state, "enseignant", "enseignant123");

    let rejected = post(&state, "/api/sequences", Some(&teacher), json!({"title": "Sans modalité"}));
    assert_eq!(rejected.status, StatusCode::BAD_REQUEST);
    assert_eq!(get(&state, "/api/sequences", Some(&teacher)).json(), json!([]));

    let created = post(
        &state,
        "/api/sequences",
        Some(&teacher),
        json!({"id": 99, "titulo": "Números", "modalidad": "présentiel", "niveau": "A1"}),
    )
    .json();
    assert_eq!(created["data"]["id"], 1);
    assert_eq!(created["data"]["level"], "A1");
    assert_eq!(created["data"]["dialect"], "yucatèque");

    let update = send(
        &state,
        ApiRequest::new(Method::PUT, "/api/sequences/42")
            .with_bearer(&teacher)
            .with_json(&json!({"title": "x"})),
    );
    assert_eq!(update.status, StatusCode::NOT_FOUND);

    let update = send(
        &state,
        ApiRequest::new(Method::PUT, "/api/sequences/1")
            .with_bearer(&teacher)
            .with_json(&json!({"title": ""})),
    );
    assert_eq!(update.status, StatusCode::BAD_REQUEST);
    assert_eq!(get(&state, "/api/sequences/1", Some(&teacher)).json()["title"], "Números");

    post(&state, "/api/sequences/1/tags", Some(&teacher), json!({"tag": "oral"}));
    let tagged = post(&state, "/api/sequences/1/tags", Some(&teacher), json!({"tag": "oral"})).json();
    assert_eq!(tagged["tags"], json!(["oral"]));

    let workflow = post(
        &state,
        "/api/sequences/1/workflow",
        Some(&teacher),
        json!({"status": "validated"}),
    );
    assert_eq!(workflow.status, StatusCode::OK);
    let status = get(&state, "/api/sequences/1/workflow", Some(&teacher)).json();
    assert_eq!(status["workflow_status"], "validated");

    let deleted = send(
        &state,
        ApiRequest::new(Method::DELETE, "/api/sequences/1").with_bearer(&teacher),
    );
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(
        get(&state, "/api/sequences/1", Some(&teacher)).status,
        StatusCode::NOT_FOUND
    );
}

#[test]
fn test_resource_at_numeric_id_limit_keeps_creates_working() {
    let state = state();
    let teacher = login(&state, "enseignant", "enseignant123");
    let top = u64::MAX.to_string();

    let highest = post(
        &state,
        "/api/internet/resources",
        Some(&teacher),
        json!({"id": top, "title": "Highest"}),
    );
    assert_eq!(highest.status, StatusCode::CREATED);

    let explicit = post(
        &state,
        "/api/internet/resources",
        Some(&teacher),
        json!({"id": "7", "title": "explicit id"}),
    );
    assert_eq!(explicit.status, StatusCode::CREATED);

    let automatic = post(&state, "/api/internet/resources", Some(&teacher), json!({"title": "Auto"}));
    assert_eq!(automatic.status, StatusCode::BAD_REQUEST);
    assert_eq!(get(&state, "/api/internet/resources/7", Some(&teacher)).status, StatusCode::OK);
}

#[test]
fn test_advanced_search_covers_every_field() {
    let state = state();
    let teacher = login(&state, "enseignant", "enseignant123");
    post(
        &state,
        "/api/sequences",
        Some(&teacher),
        json!({"titulo": "Saludos", "modalidad": "hybride", "niveau": "A2", "materiel": "cartes illustrées"}),
    );
    post(
        &state,
        "/api/sequences",
        Some(&teacher),
        json!({"title": "Números", "modality": "hybride", "level": "A1"}),
    );

    let by_extra = get(&state, "/api/sequences/advanced-search?query=CARTES", Some(&teacher));
    assert_eq!(by_extra.status, StatusCode::OK);
    let found = by_extra.json();
    assert_eq!(found.as_array().unwrap().len(), 1);
    assert_eq!(found[0]["title"], "Saludos");

    let by_alias = get(&state, "/api/sequences/advanced-search?modalidad=hybride&niveau=A1", Some(&teacher)).json();
    assert_eq!(by_alias.as_array().unwrap().len(), 1);
    assert_eq!(by_alias[0]["title"], "Números");

    let newest_first = get(&state, "/api/sequences/advanced-search?sort_order=desc", Some(&teacher)).json();
    let ids: Vec<u64> = newest_first
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_u64().unwrap())
        .collect();
    assert_eq!(ids, vec![2, 1]);

    // Plain listing only looks at title and description
    let listed = get(&state, "/api/sequences?query=cartes", Some(&teacher)).json();
    assert_eq!(listed, json!([]));

    let anonymous = get(&state, "/api/sequences/advanced-search?query=cartes", None);
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);
}

#[test]
fn test_pagination_over_filtered_items() {
    let state = state();
    let teacher = login(&state, "enseignant", "enseignant123");
    for i in 1..=5 {
        post(
            &state,
            "/api/sequences",
            Some(&teacher),
            json!({"title": format!("Famille {}", i), "modality": "en ligne", "theme": "famille"}),
        );
    }
    post(
        &state,
        "/api/sequences",
        Some(&teacher),
        json!({"title": "Autre", "modality": "en ligne", "theme": "nombres"}),
    );

    let page1 = get(&state, "/api/sequences?theme=famille&page=1&page_size=2", Some(&teacher)).json();
    let titles: Vec<&str> = page1
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Famille 1", "Famille 2"]);

    let page3 = get(&state, "/api/sequences?theme=famille&page=3&page_size=2", Some(&teacher)).json();
    assert_eq!(page3.as_array().unwrap().len(), 1);
    assert_eq!(page3[0]["title"], "Famille 5");

    let beyond = get(&state, "/api/sequences?theme=famille&page=9&page_size=2", Some(&teacher)).json();
    assert_eq!(beyond, json!([]));

    let fallback = get(&state, "/api/sequences?page=0&page_size=abc", Some(&teacher)).json();
    assert_eq!(fallback.as_array().unwrap().len(), 6);
}

#[test]
fn test_sessions_keep_message_order() {
    let state = state();
    let teacher = login(&state, "enseignant", "enseignant123");
    let researcher = login(&state, "chercheur", "chercheur123");

    let opened = post(&state, "/api/session", Some(&teacher), json!({}));
    assert_eq!(opened.status, StatusCode::CREATED);
    let id = opened.json()["session_id"].as_u64().unwrap();

    let joined = post(&state, &format!("/api/session/{}/join", id), Some(&researcher), json!({}));
    assert_eq!(joined.json()["users"], json!(["enseignant", "chercheur"]));

    post(&state, &format!("/api/session/{}/message", id), Some(&teacher), json!({"message": "Bonjour"}));
    post(&state, &format!("/api/session/{}/message", id), Some(&researcher), json!({"message": "Ba'ax ka wa'alik"}));

    let session = get(&state, &format!("/api/session/{}", id), Some(&teacher)).json();
    assert_eq!(
        session["messages"],
        json!([
            {"user": "enseignant", "message": "Bonjour"},
            {"user": "chercheur", "message": "Ba'ax ka wa'alik"}
        ])
    );

    let empty = post(&state, &format!("/api/session/{}/message", id), Some(&teacher), json!({}));
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        get(&state, "/api/session/77", Some(&teacher)).status,
        StatusCode::NOT_FOUND
    );
}

#[test]
fn test_localized_errors_and_content_language() {
    let state = state();
    let teacher = login(&state, "enseignant", "enseignant123");

    let missing = get(&state, "/api/sequences/404?lang=en", Some(&teacher));
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.content_language.as_deref(), Some("en"));
    assert_eq!(missing.json()["error"], "Sequence not found");
    assert_eq!(missing.json()["code"], "NOT_FOUND");

    // region subtags are not matched; the default applies
    let regional = send(
        &state,
        ApiRequest::new(Method::GET, "/api/sequences/404")
            .with_bearer(&teacher)
            .with_header("accept-language", "es-MX;q=0.9, en"),
    );
    assert_eq!(regional.content_language.as_deref(), Some("fr"));

    let spanish = send(
        &state,
        ApiRequest::new(Method::GET, "/api/sequences/404")
            .with_bearer(&teacher)
            .with_header("accept-language", "es;q=0.9, en"),
    );
    assert_eq!(spanish.content_language.as_deref(), Some("es"));
    assert_eq!(spanish.json()["error"], "Secuencia no encontrada");

    let default = get(&state, "/api/status", None);
    assert_eq!(default.content_language.as_deref(), Some("fr"));
}

#[test]
fn test_unknown_route_and_method() {
    let state = state();
    let route = get(&state, "/api/nowhere", None);
    assert_eq!(route.status, StatusCode::NOT_FOUND);

    let method = send(&state, ApiRequest::new(Method::PATCH, "/api/sequences"));
    assert_eq!(method.status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(method.json()["code"], "METHOD_NOT_ALLOWED");
}

#[test]
fn test_audit_log_records_callers() {
    let state = state();
    let admin = login(&state, "admin", "admin123");
    let status = get(&state, "/api/status", None);

    let log = get(&state, "/api/admin/audit-log?limit=2", Some(&admin)).json();
    let entries = log.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["path"], "/api/status");
    assert_eq!(entries[0]["user"], "anonymous");
    assert_eq!(entries[1]["path"], "/api/admin/audit-log");
    assert_eq!(entries[1]["user"], "admin");
    assert_eq!(
        entries[0]["request_id"].as_str(),
        status.request_id.as_deref()
    );
}

#[test]
fn test_requests_turned_away_by_maintenance_are_audited() {
    let state = state_with(&["--maintenance"]);
    let admin = login(&state, "admin", "admin123");
    let teacher = login(&state, "enseignant", "enseignant123");

    let blocked = get(&state, "/api/sequences", Some(&teacher));
    assert_eq!(blocked.status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(blocked.request_id.is_some());

    let log = get(&state, "/api/admin/audit-log?limit=2", Some(&admin)).json();
    let entries = log.as_array().unwrap();
    assert_eq!(entries[0]["path"], "/api/sequences");
    assert_eq!(entries[0]["method"], "GET");
    assert_eq!(entries[0]["user"], "enseignant");
    assert_eq!(
        entries[0]["request_id"].as_str(),
        blocked.request_id.as_deref()
    );
}

#[test]
fn test_collaboration_ledgers() {
    let state = state();
    let teacher = login(&state, "enseignant", "enseignant123");
    let researcher = login(&state, "chercheur", "chercheur123");
    post(
        &state,
        "/api/sequences",
        Some(&teacher),
        json!({"title": "Saludos", "modality": "en ligne"}),
    );

    let shared = post(
        &state,
        "/api/sequences/1/share",
        Some(&teacher),
        json!({"to_user": "chercheur"}),
    );
    assert_eq!(shared.status, StatusCode::OK);
    post(&state, "/api/internet/resources/2/share", Some(&teacher), json!({"to_user": "chercheur"}));
    let inbox = get(&state, "/api/shared", Some(&researcher)).json();
    assert_eq!(inbox, json!({"sequences": [1], "resources": ["2"]}));

    let no_target = post(&state, "/api/sequences/1/share", Some(&teacher), json!({}));
    assert_eq!(no_target.status, StatusCode::BAD_REQUEST);
    let no_record = post(&state, "/api/sequences/9/favorite", Some(&teacher), json!({}));
    assert_eq!(no_record.status, StatusCode::NOT_FOUND);

    let favs = post(&state, "/api/sequences/1/favorite", Some(&teacher), json!({})).json();
    assert_eq!(favs["favorites"], json!([1]));

    let notes = post(
        &state,
        "/api/notifications",
        Some(&teacher),
        json!({"notification": "Nouvelle séquence"}),
    )
    .json();
    assert_eq!(notes, json!(["Nouvelle séquence"]));
    let unchanged = post(&state, "/api/notifications", Some(&teacher), json!({})).json();
    assert_eq!(unchanged, json!(["Nouvelle séquence"]));
}

#[test]
fn test_admin_snapshot_and_csv() {
    let state = state_with(&["--seed-demo-data", "true"]);
    let admin = login(&state, "admin", "admin123");

    let empty = get(&state, "/api/admin/export-csv?what=sequences", Some(&admin));
    assert_eq!(empty.status, StatusCode::NO_CONTENT);

    let csv = "titulo,modalidad,niveau\nUno,en ligne,A1\nDos,présentiel,A2\n";
    let imported = send(
        &state,
        ApiRequest::new(Method::POST, "/api/admin/import-csv?what=sequences")
            .with_bearer(&admin)
            .with_body("text/csv", csv),
    );
    assert_eq!(imported.json()["imported"], 2);

    let exported = get(&state, "/api/admin/export-csv", Some(&admin));
    assert_eq!(exported.status, StatusCode::OK);
    assert!(exported.content_type.as_ref().unwrap().starts_with("text/csv"));
    assert!(exported.text().contains("Uno"));

    let snapshot = get(&state, "/api/admin/export-mocks", Some(&admin)).json();
    assert_eq!(snapshot["sequences"].as_array().unwrap().len(), 2);
    assert_eq!(snapshot["library_documents"].as_array().unwrap().len(), 4);

    let reset = post(&state, "/api/admin/reset-mocks", Some(&admin), json!({}));
    assert_eq!(reset.status, StatusCode::OK);
    let report = get(&state, "/api/admin/activity-report", Some(&admin)).json();
    assert_eq!(report["sequences"], 0);
    assert_eq!(report["internet_resources"], 4);
    assert_eq!(report["users"], 3);

    let restored = post(&state, "/api/admin/import-mocks", Some(&admin), snapshot);
    assert_eq!(restored.status, StatusCode::OK);
    let next = post(
        &state,
        "/api/sequences",
        Some(&admin),
        json!({"title": "Tres", "modality": "en ligne"}),
    );
    assert_eq!(next.json()["data"]["id"], 3);
}

#[test]
fn test_self_description() {
    let state = state();
    let endpoints = get(&state, "/api/endpoints", None).json();
    let reset = endpoints
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["path"] == "/api/admin/reset-mocks")
        .unwrap();
    assert_eq!(reset["method"], "POST");
    assert_eq!(reset["access"], "roles:admin");

    let openapi = get(&state, "/openapi.json", None).json();
    assert_eq!(openapi["openapi"], "3.0.0");
    assert!(openapi["paths"]["/api/session/{id}/join"]["post"].is_object());

    let version = get(&state, "/api/version", None).json();
    assert_eq!(version["service"], "genseqdid");
}

#[test]
fn test_text_tools() {
    let state = state();
    let teacher = login(&state, "enseignant", "enseignant123");

    let translated = post(&state, "/api/translate", Some(&teacher), json!({"text": "hola"})).json();
    assert_eq!(translated["translation"], "[fr->es] aloh");

    let sim = post(
        &state,
        "/api/similarity",
        Some(&teacher),
        json!({"text1": "a b c", "text2": "b c d"}),
    )
    .json();
    assert_eq!(sim["similarity"], 0.5);

    let missing = post(&state, "/api/keywords", Some(&teacher), json!({}));
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);

    let doc = get(&state, "/api/library/documents/1/summary", Some(&teacher));
    assert_eq!(doc.status, StatusCode::OK);

    post(
        &state,
        "/api/sequences",
        Some(&teacher),
        json!({"title": "Saludos", "modality": "en ligne"}),
    );
    let export = post(&state, "/api/export-text", Some(&teacher), json!({"ids": [1, 7]}));
    assert_eq!(export.text(), "Séquence 1: Saludos (en ligne)");

    let suggestions = get(&state, "/api/suggestions", Some(&teacher)).json();
    assert_eq!(suggestions.as_array().unwrap().len(), 1);
}
