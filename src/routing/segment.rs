//! Path segmentation and route-pattern validation.
//!
//! # Responsibilities
//! - Split route patterns into typed segments
//! - Validate segment syntax at registration time (never at request time)
//! - Reject duplicate parameter names within one route
//! - Split incoming request paths into plain string segments
//!
//! # Design Decisions
//! - Four segment kinds: literal, `{name}` parameter, `*`, `**`
//! - Literal segments restricted to `[A-Za-z0-9._-]`, parameter names to
//!   `[A-Za-z0-9_]` (hand-rolled char checks, no regex)
//! - Empty segments from leading/trailing/repeated slashes are discarded,
//!   so `/` and `""` are the zero-segment (root) pattern

use crate::routing::RouteError;

/// One `/`-delimited component of a route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Exact-text segment.
    Literal(String),
    /// `{name}` segment binding one path segment to a parameter.
    Param(String),
    /// `*` segment matching exactly one path segment.
    Wildcard,
    /// `**` segment matching zero or more trailing path segments.
    DoubleWildcard,
}

impl Segment {
    /// Classify and validate a single raw segment.
    fn classify(raw: &str, path: &str) -> Result<Segment, RouteError> {
        match raw {
            "**" => return Ok(Segment::DoubleWildcard),
            "*" => return Ok(Segment::Wildcard),
            _ => {}
        }

        if raw.starts_with('{') && raw.ends_with('}') && raw.len() >= 2 {
            let name = &raw[1..raw.len() - 1];
            if name.is_empty() || !name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
                return Err(RouteError::InvalidParam {
                    segment: raw.to_string(),
                    path: path.to_string(),
                });
            }
            return Ok(Segment::Param(name.to_string()));
        }

        if raw
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'))
        {
            return Ok(Segment::Literal(raw.to_string()));
        }

        Err(RouteError::Syntax {
            segment: raw.to_string(),
            path: path.to_string(),
        })
    }
}

/// Parse and fully validate a route pattern.
///
/// The pattern must start with `/`. Returns the ordered segments with empty
/// components discarded; `/` alone yields zero segments and registers at the
/// trie root. Fails with [`RouteError`] on malformed segments or duplicate
/// parameter names.
pub fn parse_route(path: &str) -> Result<Vec<Segment>, RouteError> {
    if !path.is_empty() && !path.starts_with('/') {
        return Err(RouteError::Syntax {
            segment: path.split('/').next().unwrap_or(path).to_string(),
            path: path.to_string(),
        });
    }

    let mut segments = Vec::new();
    for raw in path.split('/').filter(|s| !s.is_empty()) {
        segments.push(Segment::classify(raw, path)?);
    }

    let mut seen: Vec<&str> = Vec::new();
    for segment in &segments {
        if let Segment::Param(name) = segment {
            if seen.contains(&name.as_str()) {
                return Err(RouteError::DuplicateParam {
                    name: name.clone(),
                    path: path.to_string(),
                });
            }
            seen.push(name);
        }
    }

    Ok(segments)
}

/// Split an incoming (already percent-decoded) request path into segments.
///
/// Request paths are plain strings; no validation happens here.
pub fn request_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Reconstruct a display pattern from parsed segments, for error messages.
pub(crate) fn pattern_of(segments: &[Segment]) -> String {
    if segments.is_empty() {
        return "/".to_string();
    }
    let mut out = String::new();
    for segment in segments {
        out.push('/');
        match segment {
            Segment::Literal(text) => out.push_str(text),
            Segment::Param(name) => {
                out.push('{');
                out.push_str(name);
                out.push('}');
            }
            Segment::Wildcard => out.push('*'),
            Segment::DoubleWildcard => out.push_str("**"),
        }
    }
    out
}
