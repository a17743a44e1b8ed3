//! Request context and input extraction.
//!
//! # Responsibilities
//! - Hold the already-parsed request: method, path, query map, form map,
//!   header map, raw body
//! - Decode the JSON body lazily, once, cached for the rest of the request
//! - Extract single values through the source/filter matrix of `input`
//!
//! # Design Decisions
//! - The core never touches the socket; the transport adapter (or the host)
//!   parses the request and builds this context
//! - Absent or filter-rejected values yield `None`, never an error
//! - The default filter trims and HTML-entity-escapes, so extracted strings
//!   are safe to echo into markup

use axum::http::{HeaderMap, Method};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Where `input` reads a value from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// URL query parameters.
    Query,
    /// URL-encoded form body.
    Form,
    /// Decoded JSON body, top-level keys only.
    Json,
    /// Request headers, looked up case-insensitively.
    Header,
}

/// How `input` validates/sanitizes the raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    /// Trimmed and HTML-entity-escaped. The default.
    Str,
    /// Valid integer string, canonicalized; rejects everything else.
    Int,
    /// Standard email shape, returned verbatim.
    Email,
    /// Absolute URL with a host, returned verbatim.
    Url,
}

/// One request's worth of pre-parsed input, created fresh per request and
/// never shared across requests.
#[derive(Debug, Default)]
pub struct RequestContext {
    method: Method,
    path: String,
    query: HashMap<String, String>,
    form: HashMap<String, String>,
    headers: HeaderMap,
    body: String,
    json_cache: OnceLock<Option<serde_json::Value>>,
}

impl RequestContext {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_query(mut self, query: HashMap<String, String>) -> Self {
        self.query = query;
        self
    }

    pub fn with_form(mut self, form: HashMap<String, String>) -> Self {
        self.form = form;
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The raw request path, as received. The dispatcher normalizes it.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Extract one value from the given source and run it through the
    /// filter. Absent keys, non-scalar JSON values, and values the filter
    /// rejects all come back as `None`.
    pub fn input(&self, key: &str, source: Source, filter: Filter) -> Option<String> {
        let raw = match source {
            Source::Query => self.query.get(key).cloned(),
            Source::Form => self.form.get(key).cloned(),
            Source::Json => self.json_scalar(key),
            Source::Header => self
                .headers
                .get(key)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        }?;
        apply_filter(&raw, filter)
    }

    /// The decoded JSON body. Decoded at most once per request; an
    /// unparsable body caches as absent.
    fn json_body(&self) -> Option<&serde_json::Value> {
        self.json_cache
            .get_or_init(|| serde_json::from_str(&self.body).ok())
            .as_ref()
    }

    /// Top-level JSON scalar by key; objects and arrays are not flattened.
    fn json_scalar(&self, key: &str) -> Option<String> {
        match self.json_body()?.get(key)? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            serde_json::Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

fn apply_filter(raw: &str, filter: Filter) -> Option<String> {
    match filter {
        Filter::Str => Some(escape_html(raw.trim())),
        Filter::Int => raw.trim().parse::<i64>().ok().map(|n| n.to_string()),
        Filter::Email => is_valid_email(raw).then(|| raw.to_string()),
        Filter::Url => is_valid_url(raw).then(|| raw.to_string()),
    }
}

/// Escape the five HTML-significant characters, both quote styles included.
fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

/// Conservative email shape check: one `@`, a non-empty local part without
/// whitespace, and a dotted domain of alnum/hyphen labels.
fn is_valid_email(s: &str) -> bool {
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    if local.is_empty() || local.chars().any(|c| c.is_whitespace() || c == '@') {
        return false;
    }
    if !domain.contains('.') {
        return false;
    }
    domain.split('.').all(|label| {
        !label.is_empty()
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}

fn is_valid_url(s: &str) -> bool {
    url::Url::parse(s).map(|u| u.has_host()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn ctx() -> RequestContext {
        let mut headers = HeaderMap::new();
        headers.insert("X-Api-Key", HeaderValue::from_static("secret"));
        RequestContext::new(Method::POST, "/submit")
            .with_query(HashMap::from([
                ("page".to_string(), "3".to_string()),
                ("title".to_string(), "  <b>Hi</b>  ".to_string()),
            ]))
            .with_form(HashMap::from([(
                "email".to_string(),
                "user@example.com".to_string(),
            )]))
            .with_headers(headers)
            .with_body(r#"{"count": 7, "flag": true, "nested": {"a": 1}}"#)
    }

    #[test]
    fn test_query_int_filter() {
        let ctx = ctx();
        assert_eq!(ctx.input("page", Source::Query, Filter::Int), Some("3".into()));
        assert_eq!(ctx.input("title", Source::Query, Filter::Int), None);
        assert_eq!(ctx.input("missing", Source::Query, Filter::Int), None);
    }

    #[test]
    fn test_string_filter_trims_and_escapes() {
        let ctx = ctx();
        assert_eq!(
            ctx.input("title", Source::Query, Filter::Str),
            Some("&lt;b&gt;Hi&lt;/b&gt;".to_string())
        );
    }

    #[test]
    fn test_email_filter() {
        let ctx = ctx();
        assert_eq!(
            ctx.input("email", Source::Form, Filter::Email),
            Some("user@example.com".to_string())
        );
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a b@example.com"));
        assert!(!is_valid_email("a@localhost"));
    }

    #[test]
    fn test_url_filter() {
        assert!(is_valid_url("https://example.com/x?y=1"));
        assert!(!is_valid_url("example.com"));
        assert!(!is_valid_url("mailto:user@example.com"));
    }

    #[test]
    fn test_json_source_scalars_only() {
        let ctx = ctx();
        assert_eq!(ctx.input("count", Source::Json, Filter::Int), Some("7".into()));
        assert_eq!(ctx.input("flag", Source::Json, Filter::Str), Some("true".into()));
        assert_eq!(ctx.input("nested", Source::Json, Filter::Str), None);
        assert_eq!(ctx.input("missing", Source::Json, Filter::Str), None);
    }

    #[test]
    fn test_json_body_decoded_once_even_when_invalid() {
        let ctx = RequestContext::new(Method::POST, "/x").with_body("not json");
        assert_eq!(ctx.input("k", Source::Json, Filter::Str), None);
        assert_eq!(ctx.input("k", Source::Json, Filter::Str), None);
    }

    #[test]
    fn test_header_lookup_case_insensitive() {
        let ctx = ctx();
        assert_eq!(
            ctx.input("x-api-key", Source::Header, Filter::Str),
            Some("secret".to_string())
        );
        assert_eq!(
            ctx.input("X-API-KEY", Source::Header, Filter::Str),
            Some("secret".to_string())
        );
    }
}
