//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (startup only):
//!     raw pattern string
//!     → pattern.rs (compile segments, validate placeholder types)
//!     → table.rs (store per method, registration order preserved)
//!
//! Dispatch (per request):
//!     (method, normalized path)
//!     → table.rs (scan routes for the method in registration order)
//!     → pattern.rs (segment-wise match, extract positional params)
//!     → Return: first matching route + params, or explicit no-match
//! ```
//!
//! # Design Decisions
//! - Routes are compiled at registration, immutable during dispatch
//! - First match wins, in registration order: overlapping patterns like
//!   `/users/me` and `/users/{id}` resolve to whichever was registered first
//! - Explicit no-match rather than a silent default route

pub mod pattern;
pub mod table;

pub use pattern::{ParamType, Pattern, Segment};
pub use table::{Route, RouteTable};

/// Normalize a path or pattern to its canonical form: a single leading
/// slash and no trailing slash. The root collapses to `/`.
pub fn normalize(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_canonical_forms() {
        assert_eq!(normalize("/a/b/"), "/a/b");
        assert_eq!(normalize("a/b"), "/a/b");
        assert_eq!(normalize("/a/b"), "/a/b");
        assert_eq!(normalize("/"), "/");
        assert_eq!(normalize(""), "/");
        assert_eq!(normalize("///"), "/");
    }
}
