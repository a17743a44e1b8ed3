//! Route pattern compilation and matching.
//!
//! # Responsibilities
//! - Parse a raw route string into literal and placeholder segments
//! - Validate placeholder types at registration, before a route is accepted
//! - Match a concrete path against the compiled segments, extracting
//!   positional parameters
//!
//! # Design Decisions
//! - No regex in the hot path; placeholders are parsed character-wise
//! - A pattern with k segments only ever matches paths with exactly k
//!   segments: no wildcards, no optional segments, no partial matches
//! - Typed placeholders validate the path value but never coerce it; the
//!   extracted parameter keeps its original string form

use crate::errors::RegistrationError;
use crate::routing::normalize;

/// Supported placeholder types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    /// `[A-Za-z0-9_-]+`, the default when no type is declared.
    Str,
    /// Non-empty ASCII digits only: no sign, no separators.
    Int,
}

impl ParamType {
    fn accepts(&self, value: &str) -> bool {
        if value.is_empty() {
            return false;
        }
        match self {
            ParamType::Int => value.bytes().all(|b| b.is_ascii_digit()),
            ParamType::Str => value
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_'),
        }
    }
}

/// One compiled segment of a route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Param { name: String, ty: ParamType },
}

/// A compiled route pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
    raw: String,
    segments: Vec<Segment>,
}

impl Pattern {
    /// Compile a raw route string. The pattern is normalized first, so
    /// `users/{id}/` and `/users/{id}` compile to the same pattern.
    ///
    /// Declaring a placeholder type outside {string, int} is a programming
    /// error and is rejected here rather than on the first matching request.
    pub fn parse(raw: &str) -> Result<Self, RegistrationError> {
        let normalized = normalize(raw);
        let segments = split_segments(&normalized)
            .into_iter()
            .map(|s| parse_segment(&normalized, s))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            raw: normalized,
            segments,
        })
    }

    /// The normalized pattern string.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of placeholders, which is also the handler's parameter count.
    pub fn param_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Param { .. }))
            .count()
    }

    /// Match a normalized path, extracting parameters in placeholder order.
    /// Returns `None` on any mismatch; matching is all-or-nothing.
    pub fn matches(&self, path: &str) -> Option<Vec<String>> {
        let parts = split_segments(path);
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = Vec::new();
        for (segment, part) in self.segments.iter().zip(&parts) {
            match segment {
                Segment::Literal(lit) => {
                    if lit != part {
                        return None;
                    }
                }
                Segment::Param { ty, .. } => {
                    if !ty.accepts(part) {
                        return None;
                    }
                    params.push((*part).to_string());
                }
            }
        }
        Some(params)
    }
}

/// Split a path or pattern into its segments. The root path has zero
/// segments; interior empty segments (from `a//b`) are preserved so they
/// can fail matching explicitly.
fn split_segments(path: &str) -> Vec<&str> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        Vec::new()
    } else {
        trimmed.split('/').collect()
    }
}

/// Word characters, as in the placeholder grammar `{name}` / `{name:type}`.
fn is_word(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Parse one segment. A segment is a placeholder only when it has the exact
/// shape `{word}` or `{word:word}`; everything else is a literal, including
/// malformed brace forms. A well-formed placeholder with an unknown type is
/// rejected.
fn parse_segment(pattern: &str, segment: &str) -> Result<Segment, RegistrationError> {
    let inner = match segment
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
    {
        Some(inner) => inner,
        None => return Ok(Segment::Literal(segment.to_string())),
    };

    let (name, ty) = match inner.split_once(':') {
        Some((name, ty)) => (name, Some(ty)),
        None => (inner, None),
    };
    if !is_word(name) || ty.is_some_and(|t| !is_word(t)) {
        return Ok(Segment::Literal(segment.to_string()));
    }

    let ty = match ty {
        None | Some("string") => ParamType::Str,
        Some("int") => ParamType::Int,
        Some(other) => {
            return Err(RegistrationError::UnsupportedParamType {
                pattern: pattern.to_string(),
                name: name.to_string(),
                ty: other.to_string(),
            })
        }
    };
    Ok(Segment::Param {
        name: name.to_string(),
        ty,
    })
}
