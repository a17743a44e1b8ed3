//! Error taxonomy and failure translation.
//!
//! # Responsibilities
//! - Define registration-time errors (bad patterns, duplicates, unknown
//!   interceptor names)
//! - Translate unhandled handler/interceptor failures into a correlated,
//!   client-safe 500 response plus a full-detail log record
//!
//! # Design Decisions
//! - Only unhandled failures cross component boundaries as errors; no-match
//!   and interceptor aborts are ordinary state transitions
//! - The correlation id is derived from the failure origin, message and a
//!   time-based salt, truncated to 12 hex chars; it links the client body to
//!   the log record without leaking internals
//! - Raw failure detail reaches the client only when the debug flag is set

use axum::http::Method;
use serde_json::json;
use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Opaque failure type returned by handlers and interceptors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Length of the client-visible correlation token.
const CORRELATION_ID_LEN: usize = 12;

/// Errors raised while building the route table. All of these are
/// programming errors and are rejected before the app serves traffic.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// A placeholder declared a type other than `string` or `int`.
    #[error("unsupported param type `{ty}` for `{{{name}}}` in route {pattern}")]
    UnsupportedParamType {
        pattern: String,
        name: String,
        ty: String,
    },

    /// The same (method, pattern) pair was registered twice.
    #[error("route already registered: {method} {pattern}")]
    DuplicateRoute { method: Method, pattern: String },

    /// A route references an interceptor name missing from the registry.
    #[error("unknown interceptor `{name}` referenced by {method} {pattern}")]
    UnknownInterceptor {
        method: Method,
        pattern: String,
        name: String,
    },
}

/// An unhandled failure recovered at the dispatch boundary.
#[derive(Debug)]
pub struct Failure {
    /// Where the failure originated: the route pattern for handler failures,
    /// the interceptor name for interceptor failures.
    pub origin: String,
    pub error: BoxError,
}

impl Failure {
    pub fn new(origin: impl Into<String>, error: BoxError) -> Self {
        Self {
            origin: origin.into(),
            error,
        }
    }

    /// Full failure detail: the error message followed by its source chain.
    pub fn detail(&self) -> String {
        let mut detail = format!("{} (at {})", self.error, self.origin);
        let mut source = self.error.source();
        while let Some(cause) = source {
            detail.push_str(": ");
            detail.push_str(&cause.to_string());
            source = cause.source();
        }
        detail
    }
}

/// The three outputs of failure translation.
#[derive(Debug)]
pub struct Translated {
    /// Fixed-length token shared by the client body and the log record.
    pub correlation_id: String,
    /// Client-safe 500 envelope; `trace` is null unless debug is enabled.
    pub client_body: serde_json::Value,
    /// Same envelope with `trace` always populated, for the diagnostic sink.
    pub log_record: serde_json::Value,
}

/// Convert an unhandled failure into its correlated client/log pair.
pub fn translate(failure: &Failure, debug: bool) -> Translated {
    let detail = failure.detail();
    let correlation_id = correlation_id(&failure.origin, &detail);

    let client_body = json!({
        "error": {
            "error_id": correlation_id,
            "code": 500,
            "message": "Internal Server Error",
            "trace": if debug { json!(detail) } else { json!(null) },
        }
    });
    let log_record = json!({
        "error": {
            "error_id": correlation_id,
            "code": 500,
            "message": "Internal Server Error",
            "trace": detail,
        }
    });

    Translated {
        correlation_id,
        client_body,
        log_record,
    }
}

/// Derive the correlation token: Sha256(origin | message | time salt),
/// hex-encoded and truncated to a stable length.
fn correlation_id(origin: &str, detail: &str) -> String {
    let salt = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);

    let mut hasher = Sha256::new();
    hasher.update(origin.as_bytes());
    hasher.update(detail.as_bytes());
    hasher.update(salt.to_be_bytes());
    let digest = hasher.finalize();

    let mut hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    hex.truncate(CORRELATION_ID_LEN);
    hex
}
