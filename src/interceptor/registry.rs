//! Interceptor trait, registry, and ordering queues.

use axum::http::Method;
use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::BoxError;
use crate::http::{RequestContext, ResponseState};

/// Outcome of a before-interceptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Proceed to the next interceptor or the handler.
    Continue,
    /// Stop dispatch. The interceptor has already written the response;
    /// the handler and all after-interceptors are skipped.
    Halt,
}

/// Context handed to interceptors on both sides of the handler.
pub struct InterceptContext<'a> {
    pub method: &'a Method,
    /// The normalized request path.
    pub path: &'a str,
    /// Path parameters extracted by the matcher, in placeholder order.
    pub params: &'a [String],
    pub request: &'a RequestContext,
    pub response: &'a mut ResponseState,
}

/// A named unit running around route handlers. Both hooks default to
/// pass-through, so implementors override only the side they need.
pub trait Interceptor: Send + Sync {
    /// Runs before the handler. `Flow::Halt` ends dispatch early; an `Err`
    /// is recovered at the dispatch boundary as an unhandled failure.
    fn before(&self, _ctx: &mut InterceptContext<'_>) -> Result<Flow, BoxError> {
        Ok(Flow::Continue)
    }

    /// Runs after the handler. Failures are reported but never revert the
    /// already-finalized response.
    fn after(&self, _ctx: &mut InterceptContext<'_>) -> Result<(), BoxError> {
        Ok(())
    }
}

#[derive(Debug, Default)]
struct ScopeQueues {
    before: Vec<String>,
    after: Vec<String>,
}

/// Owns all interceptor instances plus the global and scoped ordering
/// queues. Populated during startup; read-only during dispatch.
#[derive(Default)]
pub struct InterceptorRegistry {
    named: HashMap<String, Arc<dyn Interceptor>>,
    global_before: Vec<String>,
    global_after: Vec<String>,
    scope: Option<ScopeQueues>,
}

impl InterceptorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named interceptor. Names are case-insensitive; the last
    /// registration for a name wins.
    pub fn register(&mut self, name: &str, interceptor: Arc<dyn Interceptor>) {
        self.named.insert(name.to_ascii_lowercase(), interceptor);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.named.contains_key(&name.to_ascii_lowercase())
    }

    fn get(&self, name: &str) -> Option<Arc<dyn Interceptor>> {
        self.named.get(&name.to_ascii_lowercase()).cloned()
    }

    /// Queue global before-interceptors, applied to every route registered
    /// afterward.
    pub fn queue_global_before<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.global_before
            .extend(names.into_iter().map(|n| n.as_ref().to_ascii_lowercase()));
    }

    /// Queue global after-interceptors, applied to every route registered
    /// afterward.
    pub fn queue_global_after<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.global_after
            .extend(names.into_iter().map(|n| n.as_ref().to_ascii_lowercase()));
    }

    /// Open a registration scope. Scoped interceptors queued from here on
    /// apply only to routes registered before the scope closes. An already
    /// open scope is discarded.
    pub fn open_scope(&mut self) {
        self.scope = Some(ScopeQueues::default());
    }

    /// Close the current scope, dropping its queues.
    pub fn close_scope(&mut self) {
        self.scope = None;
    }

    pub fn queue_scoped_before<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        match &mut self.scope {
            Some(scope) => scope
                .before
                .extend(names.into_iter().map(|n| n.as_ref().to_ascii_lowercase())),
            None => tracing::warn!("Scoped before-interceptors queued outside a scope; ignored"),
        }
    }

    pub fn queue_scoped_after<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        match &mut self.scope {
            Some(scope) => scope
                .after
                .extend(names.into_iter().map(|n| n.as_ref().to_ascii_lowercase())),
            None => tracing::warn!("Scoped after-interceptors queued outside a scope; ignored"),
        }
    }

    /// Resolve the interceptor lists for a route being registered right now.
    ///
    /// before = dedupe(global ++ scoped ++ explicit)
    /// after  = dedupe(scoped ++ explicit ++ global)
    ///
    /// Dedupe preserves the first occurrence, so a name listed globally and
    /// explicitly runs exactly once, in its global position.
    pub fn resolve(&self, explicit_before: &[&str], explicit_after: &[&str]) -> (Vec<String>, Vec<String>) {
        let scoped_before = self.scope.as_ref().map(|s| s.before.as_slice()).unwrap_or(&[]);
        let scoped_after = self.scope.as_ref().map(|s| s.after.as_slice()).unwrap_or(&[]);

        let before = dedupe(
            self.global_before
                .iter()
                .cloned()
                .chain(scoped_before.iter().cloned())
                .chain(explicit_before.iter().map(|n| n.to_ascii_lowercase())),
        );
        let after = dedupe(
            scoped_after
                .iter()
                .cloned()
                .chain(explicit_after.iter().map(|n| n.to_ascii_lowercase()))
                .chain(self.global_after.iter().cloned()),
        );
        (before, after)
    }

    /// Run a before-interceptor by name. A missing name is an unhandled
    /// failure, never a silent skip.
    pub fn run_before(&self, name: &str, ctx: &mut InterceptContext<'_>) -> Result<Flow, BoxError> {
        let interceptor = self
            .get(name)
            .ok_or_else(|| format!("interceptor `{}` not registered", name))?;
        interceptor.before(ctx)
    }

    /// Run an after-interceptor by name.
    pub fn run_after(&self, name: &str, ctx: &mut InterceptContext<'_>) -> Result<(), BoxError> {
        let interceptor = self
            .get(name)
            .ok_or_else(|| format!("interceptor `{}` not registered", name))?;
        interceptor.after(ctx)
    }
}

/// First-occurrence-preserving dedupe. Lists are short, so the quadratic
/// scan beats a set allocation.
fn dedupe(names: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for name in names {
        if !out.contains(&name) {
            out.push(name);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;
    impl Interceptor for Noop {}

    #[test]
    fn test_merge_order_and_dedupe() {
        let mut registry = InterceptorRegistry::new();
        registry.queue_global_before(["auth"]);
        registry.queue_global_after(["metrics"]);
        registry.open_scope();
        registry.queue_scoped_before(["audit"]);
        registry.queue_scoped_after(["audit"]);

        let (before, after) = registry.resolve(&["auth", "csrf"], &["csrf"]);
        // Global first, then scoped, then explicit; "auth" collapses to its
        // global position.
        assert_eq!(before, vec!["auth", "audit", "csrf"]);
        // Scoped, then explicit, then global.
        assert_eq!(after, vec!["audit", "csrf", "metrics"]);
    }

    #[test]
    fn test_scope_reset() {
        let mut registry = InterceptorRegistry::new();
        registry.open_scope();
        registry.queue_scoped_before(["audit"]);
        registry.close_scope();

        let (before, _) = registry.resolve(&[], &[]);
        assert!(before.is_empty());
    }

    #[test]
    fn test_names_are_case_insensitive() {
        let mut registry = InterceptorRegistry::new();
        registry.register("Auth", Arc::new(Noop));
        assert!(registry.contains("AUTH"));
        assert!(registry.contains("auth"));

        registry.queue_global_before(["AUTH"]);
        let (before, _) = registry.resolve(&["auth"], &[]);
        assert_eq!(before, vec!["auth"]);
    }

    #[test]
    fn test_scoped_queue_outside_scope_is_ignored() {
        let mut registry = InterceptorRegistry::new();
        registry.queue_scoped_before(["audit"]);
        let (before, _) = registry.resolve(&[], &[]);
        assert!(before.is_empty());
    }
}
