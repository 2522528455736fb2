//! The `/Tag[n]/Tag[n]` path mini-language.
//!
//! A path is a slash-separated list of segments. Each segment is an ASCII
//! alphanumeric tag optionally followed by a 1-based occurrence index in
//! brackets. `[]` and `[0]` both mean the first occurrence. Segments naming
//! the document root are skipped, so `FatturaElettronica/FatturaElettronicaBody`
//! and `/FatturaElettronicaBody` address the same node.

use std::fmt;

use super::error::EfattureError;

/// One resolved step of a path: a tag and its 1-based occurrence index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathSegment {
    pub tag: String,
    pub index: usize,
}

impl PathSegment {
    pub fn new(tag: impl Into<String>, index: usize) -> Self {
        Self {
            tag: tag.into(),
            index: index.max(1),
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.index > 1 {
            write!(f, "{}[{}]", self.tag, self.index)
        } else {
            f.write_str(&self.tag)
        }
    }
}

/// Split `path` into segments relative to a root element named `root`.
///
/// Empty segments (leading, trailing or doubled slashes) are ignored.
pub fn parse_path(path: &str, root: &str) -> Result<Vec<PathSegment>, EfattureError> {
    let mut segments = Vec::new();
    for token in path.split('/') {
        if token.is_empty() {
            continue;
        }
        let segment = parse_segment(token).ok_or_else(|| EfattureError::PathSyntax {
            path: path.to_string(),
            segment: token.to_string(),
        })?;
        if segment.tag == root {
            continue;
        }
        segments.push(segment);
    }
    Ok(segments)
}

fn parse_segment(token: &str) -> Option<PathSegment> {
    let tag_end = token
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(token.len());
    if tag_end == 0 {
        return None;
    }
    let (tag, rest) = token.split_at(tag_end);
    if rest.is_empty() {
        return Some(PathSegment::new(tag, 1));
    }

    let digits = rest.strip_prefix('[')?.strip_suffix(']')?;
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let index = if digits.is_empty() {
        1
    } else {
        // Overflowing indices are rejected rather than wrapped.
        digits.parse::<usize>().ok()?
    };
    Some(PathSegment::new(tag, index))
}

/// Render segments back into canonical `/Tag/Tag[2]` form.
pub fn format_path(root: &str, segments: &[PathSegment]) -> String {
    let mut out = format!("/{root}");
    for s in segments {
        out.push('/');
        out.push_str(&s.to_string());
    }
    out
}
