//! Axum transport adapter.
//!
//! # Responsibilities
//! - Bind the dispatch core to a real HTTP listener
//! - Parse the pieces the core consumes: method, path, query map, form map,
//!   header map, raw body
//! - Flush the finalized ResponseState back out exactly once
//! - Attach a request id and the usual middleware (tracing, timeout)
//!
//! # Design Decisions
//! - The core stays transport-agnostic; everything Axum-specific lives here
//! - A single catch-all route hands every request to `App::dispatch`
//! - Timeouts/cancellation belong to this layer, not the core: a hung
//!   handler is cut off by the TimeoutLayer

use axum::{
    body::Body,
    extract::State,
    http::header::{HeaderValue, CONTENT_TYPE},
    http::{Request, Response, StatusCode},
    routing::any,
    Router,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::dispatch::App;
use crate::http::{RequestContext, ResponseState};

/// Request bodies beyond this are not buffered; the request proceeds with
/// an empty body.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// HTTP server hosting a dispatch core.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Wire the app into an Axum router with the middleware stack.
    pub fn new(app: Arc<App>, config: &AppConfig) -> Self {
        let router = Router::new()
            .route("/{*path}", any(dispatch_handler))
            .route("/", any(dispatch_handler))
            .with_state(app)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(TraceLayer::new_for_http());
        Self { router }
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Catch-all handler: parse, dispatch, flush.
async fn dispatch_handler(State(app): State<Arc<App>>, request: Request<Body>) -> Response<Body> {
    let request_id = uuid::Uuid::new_v4().to_string();
    let (parts, body) = request.into_parts();

    let path = parts.uri.path().to_string();
    let query = parts
        .uri
        .query()
        .map(parse_urlencoded)
        .unwrap_or_default();

    let body = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Failed to buffer request body");
            String::new()
        }
    };

    let is_form = parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/x-www-form-urlencoded"));
    let form = if is_form {
        parse_urlencoded(&body)
    } else {
        HashMap::new()
    };

    tracing::debug!(
        request_id = %request_id,
        method = %parts.method,
        path = %path,
        "Dispatching request"
    );

    let context = RequestContext::new(parts.method, path)
        .with_query(query)
        .with_form(form)
        .with_headers(parts.headers)
        .with_body(body);

    let state = app.dispatch(&context);
    flush(state, &request_id)
}

/// Convert the finalized ResponseState into the wire response: status line,
/// one header line per entry, body verbatim.
fn flush(state: ResponseState, request_id: &str) -> Response<Body> {
    let mut builder = Response::builder().status(state.status());
    if let Some(headers) = builder.headers_mut() {
        for (name, value) in state.headers().iter() {
            headers.insert(name.clone(), value.clone());
        }
        if let Ok(id) = HeaderValue::from_str(request_id) {
            headers.insert("x-request-id", id);
        }
    }

    builder.body(Body::from(state.into_body())).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to build response");
        let mut fallback = Response::new(Body::empty());
        *fallback.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        fallback
    })
}

fn parse_urlencoded(input: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(input.as_bytes())
        .into_owned()
        .collect()
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
    }
    tracing::info!("Shutdown signal received");
}
