//! HTTP server and request pipeline

pub mod http;
pub mod request;

pub use http::{dispatch, run, AppState};
pub use request::ApiRequest;
