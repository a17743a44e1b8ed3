//! Response state: the single source of truth for what gets sent.
//!
//! # Responsibilities
//! - Hold status, headers, and body for the in-flight request
//! - Enforce the finalized flag: first writer wins unless forced
//! - Provide the JSON convenience writer
//!
//! # Design Decisions
//! - Finalization models "response already sent" without touching the
//!   transport; the failure path uses `force` to override it
//! - Header merges let new keys win on conflict
//! - The transport flushes this state exactly once, after dispatch returns

use axum::http::header::{HeaderValue, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};

/// Mutable response holder, created fresh per request.
#[derive(Debug)]
pub struct ResponseState {
    status: StatusCode,
    headers: HeaderMap,
    body: String,
    finalized: bool,
}

impl Default for ResponseState {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: String::new(),
            finalized: false,
        }
    }
}

impl ResponseState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Consume the state for the transport flush.
    pub fn into_body(self) -> String {
        self.body
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Write the response. A no-op when already finalized and `force` is
    /// false; otherwise replaces the body, optionally overrides the status,
    /// merges the headers (new keys win), and finalizes. Returns whether
    /// the write was applied.
    pub fn set_response(
        &mut self,
        body: impl Into<String>,
        status: Option<StatusCode>,
        headers: Option<HeaderMap>,
        force: bool,
    ) -> bool {
        if self.finalized && !force {
            return false;
        }

        self.body = body.into();
        if let Some(status) = status {
            self.status = status;
        }
        if let Some(headers) = headers {
            for (name, value) in headers.iter() {
                self.headers.insert(name.clone(), value.clone());
            }
        }
        self.finalized = true;
        true
    }

    /// Write a JSON response: the serialized value as the body plus a
    /// `Content-Type: application/json` header, through `set_response`.
    pub fn as_json(
        &mut self,
        data: &serde_json::Value,
        status: Option<StatusCode>,
        force: bool,
    ) -> bool {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self.set_response(data.to_string(), status, Some(headers), force)
    }
}
