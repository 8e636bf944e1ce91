//! Shared helpers for pipeline tests: in-memory requests, no socket.

#![allow(dead_code)]

use clap::Parser;
use http_body_util::BodyExt;
use hyper::{Method, StatusCode};
use serde_json::{json, Value};

use genseqdid::{dispatch, ApiRequest, AppState, Args};

pub const TEST_SECRET: &str = "integration-test-secret-at-least-32-chars";

pub fn state_with(extra: &[&str]) -> AppState {
    let mut argv = vec!["genseqdid", "--dev-mode", "--jwt-secret", TEST_SECRET];
    argv.extend_from_slice(extra);
    AppState::new(Args::parse_from(argv)).expect("state")
}

pub fn state() -> AppState {
    state_with(&[])
}

pub struct Reply {
    pub status: StatusCode,
    pub content_language: Option<String>,
    pub content_type: Option<String>,
    pub request_id: Option<String>,
    pub body: Vec<u8>,
}

impl Reply {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("JSON body")
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.body.clone()).expect("UTF-8 body")
    }
}

pub fn send(state: &AppState, req: ApiRequest) -> Reply {
    let response = dispatch(state, req);
    let status = response.status();
    let header = |name: &str| {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let content_language = header("content-language");
    let content_type = header("content-type");
    let request_id = header("x-request-id");
    let body = tokio_test::block_on(response.into_body().collect())
        .expect("body")
        .to_bytes()
        .to_vec();
    Reply {
        status,
        content_language,
        content_type,
        request_id,
        body,
    }
}

pub fn get(state: &AppState, target: &str, token: Option<&str>) -> Reply {
    let mut req = ApiRequest::new(Method::GET, target);
    if let Some(token) = token {
        req = req.with_bearer(token);
    }
    send(state, req)
}

pub fn post(state: &AppState, target: &str, token: Option<&str>, body: Value) -> Reply {
    let mut req = ApiRequest::new(Method::POST, target).with_json(&body);
    if let Some(token) = token {
        req = req.with_bearer(token);
    }
    send(state, req)
}

pub fn login(state: &AppState, username: &str, password: &str) -> String {
    let reply = post(
        state,
        "/api/auth/login",
        None,
        json!({"username": username, "password": password}),
    );
    assert_eq!(reply.status, StatusCode::OK, "login as {}", username);
    reply.json()["access_token"]
        .as_str()
        .expect("access_token")
        .to_string()
}
