//! The app: registration API and the per-request dispatch state machine.

use axum::http::{Method, StatusCode};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;

use crate::errors::{translate, BoxError, Failure, RegistrationError};
use crate::http::{RequestContext, ResponseState};
use crate::interceptor::{Flow, InterceptContext, Interceptor, InterceptorRegistry};
use crate::observability::metrics;
use crate::routing::table::Handler;
use crate::routing::{normalize, Pattern, Route, RouteTable};

/// The dispatch core: a route table, an interceptor registry, and the
/// state machine that runs one request through them.
///
/// Built once during startup via the registration methods, then treated as
/// immutable; `dispatch` takes `&self` and may run concurrently.
pub struct App {
    table: RouteTable,
    interceptors: InterceptorRegistry,
    base_path: String,
    debug: bool,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> Self {
        Self {
            table: RouteTable::new(),
            interceptors: InterceptorRegistry::new(),
            base_path: String::new(),
            debug: false,
        }
    }

    /// Prefix stripped from incoming paths before matching, e.g. when the
    /// app is mounted under `/api`. Trailing slashes are dropped.
    pub fn with_base_path(mut self, base_path: &str) -> Self {
        self.base_path = base_path.trim_end_matches('/').to_string();
        self
    }

    /// When set, 500 bodies carry the full failure detail in `trace`.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn routes(&self) -> &RouteTable {
        &self.table
    }

    /* ------------------------------------------------------------------ */
    /*  Registration                                                       */
    /* ------------------------------------------------------------------ */

    /// Register a named interceptor instance. Discovery stays with the
    /// host; this API accepts already-resolved name → instance pairs.
    pub fn interceptor(&mut self, name: &str, interceptor: Arc<dyn Interceptor>) -> &mut Self {
        self.interceptors.register(name, interceptor);
        self
    }

    /// Queue global before-interceptors for every route registered after
    /// this call.
    pub fn before<I, S>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.interceptors.queue_global_before(names);
        self
    }

    /// Queue global after-interceptors for every route registered after
    /// this call.
    pub fn after<I, S>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.interceptors.queue_global_after(names);
        self
    }

    /// Register a batch of routes sharing scoped interceptors. The scope
    /// opens before the closure and always closes afterwards, so scoped
    /// queues never leak into later registrations.
    pub fn load<F>(&mut self, f: F) -> Result<(), RegistrationError>
    where
        F: FnOnce(&mut Self) -> Result<(), RegistrationError>,
    {
        self.interceptors.open_scope();
        let result = f(self);
        self.interceptors.close_scope();
        result
    }

    /// Queue scoped before-interceptors; applies only inside `load`.
    pub fn scoped_before<I, S>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.interceptors.queue_scoped_before(names);
        self
    }

    /// Queue scoped after-interceptors; applies only inside `load`.
    pub fn scoped_after<I, S>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.interceptors.queue_scoped_after(names);
        self
    }

    pub fn get<H>(&mut self, pattern: &str, handler: H) -> Result<(), RegistrationError>
    where
        H: Fn(&RequestContext, &mut ResponseState, &[String]) -> Result<(), BoxError>
            + Send
            + Sync
            + 'static,
    {
        self.route(Method::GET, pattern, Arc::new(handler), &[], &[])
    }

    pub fn post<H>(&mut self, pattern: &str, handler: H) -> Result<(), RegistrationError>
    where
        H: Fn(&RequestContext, &mut ResponseState, &[String]) -> Result<(), BoxError>
            + Send
            + Sync
            + 'static,
    {
        self.route(Method::POST, pattern, Arc::new(handler), &[], &[])
    }

    pub fn put<H>(&mut self, pattern: &str, handler: H) -> Result<(), RegistrationError>
    where
        H: Fn(&RequestContext, &mut ResponseState, &[String]) -> Result<(), BoxError>
            + Send
            + Sync
            + 'static,
    {
        self.route(Method::PUT, pattern, Arc::new(handler), &[], &[])
    }

    pub fn delete<H>(&mut self, pattern: &str, handler: H) -> Result<(), RegistrationError>
    where
        H: Fn(&RequestContext, &mut ResponseState, &[String]) -> Result<(), BoxError>
            + Send
            + Sync
            + 'static,
    {
        self.route(Method::DELETE, pattern, Arc::new(handler), &[], &[])
    }

    pub fn patch<H>(&mut self, pattern: &str, handler: H) -> Result<(), RegistrationError>
    where
        H: Fn(&RequestContext, &mut ResponseState, &[String]) -> Result<(), BoxError>
            + Send
            + Sync
            + 'static,
    {
        self.route(Method::PATCH, pattern, Arc::new(handler), &[], &[])
    }

    /// Register a route with explicit per-route interceptor names. The
    /// pattern is compiled and validated here; the interceptor lists are
    /// resolved and checked against the registry here as well, so nothing
    /// is left to fail on the first matching request.
    pub fn route(
        &mut self,
        method: Method,
        pattern: &str,
        handler: Handler,
        before: &[&str],
        after: &[&str],
    ) -> Result<(), RegistrationError> {
        let pattern = Pattern::parse(pattern)?;
        let (before, after) = self.interceptors.resolve(before, after);

        for name in before.iter().chain(after.iter()) {
            if !self.interceptors.contains(name) {
                return Err(RegistrationError::UnknownInterceptor {
                    method,
                    pattern: pattern.raw().to_string(),
                    name: name.clone(),
                });
            }
        }

        self.table.register(
            method,
            Route {
                pattern,
                handler,
                before,
                after,
            },
        )
    }

    /* ------------------------------------------------------------------ */
    /*  Dispatch                                                           */
    /* ------------------------------------------------------------------ */

    /// Run one request through the state machine and return the response
    /// state for the transport to flush. Never returns an error: no-match
    /// becomes a 404, unhandled failures become correlated 500s.
    pub fn dispatch(&self, request: &RequestContext) -> ResponseState {
        let start = Instant::now();
        let method = request.method();
        let path = normalize(self.strip_base_path(request.path()));
        let mut response = ResponseState::new();

        // MATCHING: first registered match wins; at most one handler runs.
        let Some((route, params)) = self.table.find(method, &path) else {
            tracing::debug!(method = %method, path = %path, "No route matched");
            self.write_not_found(&mut response);
            metrics::record_dispatch(method.as_str(), response.status().as_u16(), "none", start);
            return response;
        };
        let pattern = route.pattern.raw();

        tracing::debug!(
            method = %method,
            path = %path,
            route = %pattern,
            params = ?params,
            "Route matched"
        );

        // BEFORE
        for name in &route.before {
            let mut ctx = InterceptContext {
                method,
                path: &path,
                params: &params,
                request,
                response: &mut response,
            };
            match self.interceptors.run_before(name, &mut ctx) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Halt) => {
                    tracing::debug!(route = %pattern, interceptor = %name, "Dispatch halted by before-interceptor");
                    metrics::record_dispatch(method.as_str(), response.status().as_u16(), pattern, start);
                    return response;
                }
                Err(error) => {
                    self.write_failure(&mut response, Failure::new(name.clone(), error));
                    metrics::record_dispatch(method.as_str(), response.status().as_u16(), pattern, start);
                    return response;
                }
            }
        }

        // HANDLING
        if let Err(error) = (*route.handler)(request, &mut response, &params) {
            self.write_failure(&mut response, Failure::new(pattern, error));
            metrics::record_dispatch(method.as_str(), response.status().as_u16(), pattern, start);
            return response;
        }

        // AFTER: failures are reported but never revert the response.
        for name in &route.after {
            let mut ctx = InterceptContext {
                method,
                path: &path,
                params: &params,
                request,
                response: &mut response,
            };
            if let Err(error) = self.interceptors.run_after(name, &mut ctx) {
                let failure = Failure::new(name.clone(), error);
                let translated = translate(&failure, self.debug);
                tracing::error!(
                    error_id = %translated.correlation_id,
                    interceptor = %name,
                    record = %translated.log_record,
                    "After-interceptor failed; response already finalized"
                );
            }
        }

        metrics::record_dispatch(method.as_str(), response.status().as_u16(), pattern, start);
        response
    }

    fn strip_base_path<'a>(&self, path: &'a str) -> &'a str {
        if !self.base_path.is_empty() && path.starts_with(&self.base_path) {
            &path[self.base_path.len()..]
        } else {
            path
        }
    }

    fn write_not_found(&self, response: &mut ResponseState) {
        if !response.is_finalized() {
            let body = json!({"error": {"code": 404, "message": "Not Found"}});
            response.as_json(&body, Some(StatusCode::NOT_FOUND), false);
        }
    }

    /// Translate an unhandled failure: log the full record, force the
    /// opaque correlated 500 into the response.
    fn write_failure(&self, response: &mut ResponseState, failure: Failure) {
        let translated = translate(&failure, self.debug);
        tracing::error!(
            error_id = %translated.correlation_id,
            origin = %failure.origin,
            record = %translated.log_record,
            "Unhandled failure during dispatch"
        );
        response.as_json(
            &translated.client_body,
            Some(StatusCode::INTERNAL_SERVER_ERROR),
            true,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_request(path: &str) -> RequestContext {
        RequestContext::new(Method::GET, path)
    }

    #[test]
    fn test_base_path_stripped_before_matching() {
        let mut app = App::new().with_base_path("/api/");
        app.get("/users/{id}", |_req, res, params| {
            res.set_response(params[0].clone(), None, None, false);
            Ok(())
        })
        .unwrap();

        let response = app.dispatch(&get_request("/api/users/42"));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body(), "42");

        // Without the prefix the route still matches: the base path is
        // stripped only when present.
        let response = app.dispatch(&get_request("/users/42"));
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_not_found_body_shape() {
        let app = App::new();
        let response = app.dispatch(&get_request("/nowhere"));

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: serde_json::Value = serde_json::from_str(response.body()).unwrap();
        assert_eq!(body, json!({"error": {"code": 404, "message": "Not Found"}}));
    }

    #[test]
    fn test_unknown_interceptor_rejected_at_registration() {
        let mut app = App::new();
        app.before(["ghost"]);
        let err = app.get("/x", |_req, _res, _p| Ok(())).unwrap_err();
        assert!(matches!(
            err,
            RegistrationError::UnknownInterceptor { ref name, .. } if name == "ghost"
        ));
    }
}
