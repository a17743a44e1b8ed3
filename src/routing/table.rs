//! Route table: registration-ordered storage and lookup.
//!
//! # Responsibilities
//! - Store compiled routes per HTTP method, preserving registration order
//! - Reject duplicate (method, pattern) registrations
//! - Find the first route matching a normalized path
//!
//! # Design Decisions
//! - Immutable after the registration phase; lookups never lock
//! - O(n) scan per method; route counts in an embedded router are small and
//!   first-match-wins requires the scan anyway
//! - Duplicate registration is a hard error, not a silent overwrite: a
//!   duplicate always means two pieces of code think they own the route

use axum::http::Method;
use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::{BoxError, RegistrationError};
use crate::http::{RequestContext, ResponseState};
use crate::routing::pattern::Pattern;

/// A registered route handler.
///
/// Handlers receive the request, the mutable response state, and the path
/// parameters extracted by the matcher, as strings in placeholder order.
/// The slice length always equals the pattern's placeholder count. An `Err`
/// is recovered at the dispatch boundary and rendered as a correlated 500.
pub type Handler =
    Arc<dyn Fn(&RequestContext, &mut ResponseState, &[String]) -> Result<(), BoxError> + Send + Sync>;

/// One registered route: compiled pattern, handler, and the interceptor
/// name lists resolved at registration time.
#[derive(Clone)]
pub struct Route {
    pub pattern: Pattern,
    pub handler: Handler,
    /// Before-interceptor names: global, then scoped, then explicit, deduped.
    pub before: Vec<String>,
    /// After-interceptor names: scoped, then explicit, then global, deduped.
    pub after: Vec<String>,
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("pattern", &self.pattern.raw())
            .field("before", &self.before)
            .field("after", &self.after)
            .finish_non_exhaustive()
    }
}

/// The route table, built during startup and read-only during dispatch.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: HashMap<Method, Vec<Route>>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route. The pattern inside `route` must already be
    /// compiled; duplicates of an existing (method, pattern) pair are
    /// rejected.
    pub fn register(&mut self, method: Method, route: Route) -> Result<(), RegistrationError> {
        let entries = self.routes.entry(method.clone()).or_default();
        if entries
            .iter()
            .any(|r| r.pattern.raw() == route.pattern.raw())
        {
            return Err(RegistrationError::DuplicateRoute {
                method,
                pattern: route.pattern.raw().to_string(),
            });
        }

        tracing::debug!(
            method = %method,
            pattern = %route.pattern.raw(),
            before = ?route.before,
            after = ?route.after,
            "Route registered"
        );
        entries.push(route);
        Ok(())
    }

    /// Routes for a method, in registration order. Empty when the method
    /// has no routes.
    pub fn lookup(&self, method: &Method) -> &[Route] {
        self.routes.get(method).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Find the first route matching `path` (already normalized), together
    /// with its extracted parameters. First registered, first tried.
    pub fn find(&self, method: &Method, path: &str) -> Option<(&Route, Vec<String>)> {
        self.lookup(method)
            .iter()
            .find_map(|route| route.pattern.matches(path).map(|params| (route, params)))
    }

    /// Total number of registered routes, across all methods.
    pub fn len(&self) -> usize {
        self.routes.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop_handler() -> Handler {
        Arc::new(|_req, _res, _params| Ok(()))
    }

    fn route(pattern: &str) -> Route {
        Route {
            pattern: Pattern::parse(pattern).unwrap(),
            handler: noop_handler(),
            before: vec![],
            after: vec![],
        }
    }

    #[test]
    fn test_registration_order_determines_priority() {
        let mut table = RouteTable::new();
        table.register(Method::GET, route("/users/me")).unwrap();
        table.register(Method::GET, route("/users/{id}")).unwrap();

        let (matched, params) = table.find(&Method::GET, "/users/me").unwrap();
        assert_eq!(matched.pattern.raw(), "/users/me");
        assert!(params.is_empty());

        let (matched, params) = table.find(&Method::GET, "/users/42").unwrap();
        assert_eq!(matched.pattern.raw(), "/users/{id}");
        assert_eq!(params, vec!["42".to_string()]);
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut table = RouteTable::new();
        table.register(Method::GET, route("/users/{id}")).unwrap();
        // Same normalized pattern, different raw spelling.
        let err = table
            .register(Method::GET, route("users/{id}/"))
            .unwrap_err();
        assert!(matches!(err, RegistrationError::DuplicateRoute { .. }));
    }

    #[test]
    fn test_methods_are_independent() {
        let mut table = RouteTable::new();
        table.register(Method::GET, route("/users")).unwrap();
        table.register(Method::POST, route("/users")).unwrap();

        assert!(table.find(&Method::GET, "/users").is_some());
        assert!(table.find(&Method::POST, "/users").is_some());
        assert!(table.find(&Method::DELETE, "/users").is_none());
        assert_eq!(table.len(), 2);
    }
}
