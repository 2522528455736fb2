//! Canonical element ordering.
//!
//! An ordering map is a list of path patterns in schema sequence, one per
//! line, e.g. `/FatturaElettronica/FatturaElettronicaBody[n]/DatiGenerali`.
//! `[n]` marks a repeatable element. A pattern matches every leaf whose path
//! starts with the pattern's tags, whatever the occurrence indices; leaf-level
//! patterns therefore match a single field, shorter ones a whole subtree.

use std::fmt;

use tracing::{debug, warn};

use super::document::XmlDocument;
use super::error::EfattureError;
use super::path::{PathSegment, format_path};
use super::schema::StructuralSchema;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternSegment {
    pub tag: String,
    pub repeatable: bool,
}

/// One entry of a [`SchemaOrderingMap`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderingPattern {
    segments: Vec<PatternSegment>,
}

impl OrderingPattern {
    pub fn new(segments: Vec<PatternSegment>) -> Self {
        Self { segments }
    }

    pub fn parse(pattern: &str) -> Result<Self, EfattureError> {
        let mut segments = Vec::new();
        for token in pattern.split('/') {
            if token.is_empty() {
                continue;
            }
            let (tag, repeatable) = match token.strip_suffix("[n]") {
                Some(tag) => (tag, true),
                None => (token, false),
            };
            if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(EfattureError::PathSyntax {
                    path: pattern.to_string(),
                    segment: token.to_string(),
                });
            }
            segments.push(PatternSegment {
                tag: tag.to_string(),
                repeatable,
            });
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[PatternSegment] {
        &self.segments
    }

    /// Segments after any leading ones naming the document root.
    fn relative_to(&self, root: &str) -> &[PatternSegment] {
        let skip = self.segments.iter().take_while(|s| s.tag == root).count();
        &self.segments[skip..]
    }
}

impl fmt::Display for OrderingPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for s in &self.segments {
            write!(f, "/{}", s.tag)?;
            if s.repeatable {
                f.write_str("[n]")?;
            }
        }
        Ok(())
    }
}

/// Result of [`SchemaOrderingMap::order_tags`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderingOutcome {
    /// Leaves written back in canonical order.
    pub kept: usize,
    /// Paths of leaves no pattern matched; their values are gone.
    pub dropped: Vec<String>,
}

/// Ordered list of path patterns describing a schema's element sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaOrderingMap {
    patterns: Vec<OrderingPattern>,
}

impl SchemaOrderingMap {
    pub fn new<I, S>(patterns: I) -> Result<Self, EfattureError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| OrderingPattern::parse(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn from_patterns(patterns: Vec<OrderingPattern>) -> Self {
        Self { patterns }
    }

    /// Leaf paths of `schema`, in declaration order.
    pub fn from_schema(schema: &StructuralSchema) -> Self {
        Self::from_patterns(schema.paths())
    }

    /// Parse one pattern per line. Blank lines and `#` comments are ignored.
    pub fn parse(text: &str) -> Result<Self, EfattureError> {
        Self::new(pattern_lines(text))
    }

    /// Like [`parse`](Self::parse) but skips malformed lines with a warning.
    pub(crate) fn parse_lenient(text: &str) -> Self {
        let mut patterns = Vec::new();
        for line in pattern_lines(text) {
            match OrderingPattern::parse(line) {
                Ok(p) => patterns.push(p),
                Err(e) => warn!(pattern = line, error = %e, "skipping ordering pattern"),
            }
        }
        Self { patterns }
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn patterns(&self) -> &[OrderingPattern] {
        &self.patterns
    }

    /// Index of the first pattern matching `path` (relative to `root`).
    pub fn position(&self, root: &str, path: &[PathSegment]) -> Option<usize> {
        self.patterns
            .iter()
            .position(|p| matches(p.relative_to(root), path))
    }

    /// Rebuild the document's tree in pattern order.
    ///
    /// Snapshots every non-blank leaf, clears the root's children (its
    /// attributes stay), then writes the leaves back pattern by pattern,
    /// keeping the original relative order and occurrence indices among the
    /// leaves a pattern matches. Leaves matching no pattern are dropped,
    /// logged, and listed in the outcome.
    pub fn order_tags(&self, document: &mut XmlDocument) -> Result<OrderingOutcome, EfattureError> {
        let entries = document.leaf_entries();
        let root_tag = document.root_tag().to_string();

        let mut rebuilt = XmlDocument::new(document.root().shallow_clone());

        let mut placed = vec![false; entries.len()];
        for pattern in &self.patterns {
            let rel = pattern.relative_to(&root_tag);
            for (i, (segments, value)) in entries.iter().enumerate() {
                if placed[i] || !matches(rel, segments) {
                    continue;
                }
                warn_unexpected_repeat(pattern, rel, segments);
                rebuilt.set(&format_path(&root_tag, segments), value)?;
                placed[i] = true;
            }
        }

        let mut outcome = OrderingOutcome::default();
        for ((segments, value), placed) in entries.iter().zip(&placed) {
            if *placed {
                outcome.kept += 1;
            } else {
                let path = format_path(&root_tag, segments);
                warn!(path = %path, value = %value, "leaf matches no ordering pattern, dropped");
                outcome.dropped.push(path);
            }
        }

        let (root, _) = rebuilt.into_parts();
        *document.root_mut() = root;
        debug!(kept = outcome.kept, dropped = outcome.dropped.len(), "reordered document");
        Ok(outcome)
    }
}

fn pattern_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
}

fn matches(pattern: &[PatternSegment], path: &[PathSegment]) -> bool {
    pattern.len() <= path.len() && pattern.iter().zip(path).all(|(p, s)| p.tag == s.tag)
}

fn warn_unexpected_repeat(pattern: &OrderingPattern, rel: &[PatternSegment], path: &[PathSegment]) {
    for (p, s) in rel.iter().zip(path) {
        if !p.repeatable && s.index > 1 {
            warn!(
                pattern = %pattern,
                tag = %s.tag,
                index = s.index,
                "repeated element not marked repeatable in ordering map"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::node::Element;

    fn map(lines: &str) -> SchemaOrderingMap {
        SchemaOrderingMap::parse(lines).unwrap()
    }

    fn doc() -> XmlDocument {
        XmlDocument::new(Element::new("Root").with_attribute("versione", "1"))
    }

    #[test]
    fn parse_skips_comments_and_blanks() {
        let m = map("# header\n\n/Root/A\n  /Root/B[n]/C  \n");
        assert_eq!(m.len(), 2);
        assert_eq!(m.patterns()[1].to_string(), "/Root/B[n]/C");
        assert!(m.patterns()[1].segments()[1].repeatable);
        assert!(SchemaOrderingMap::parse("/Root/B-C").is_err());
        assert_eq!(SchemaOrderingMap::parse_lenient("/Root/A\n/Root/B-C\n").len(), 1);
    }

    #[test]
    fn reorders_into_pattern_sequence() {
        let mut d = doc();
        d.set("Z/Second", "2").unwrap();
        d.set("A/Item[1]/Y", "y1").unwrap();
        d.set("A/Item[1]/X", "x1").unwrap();
        d.set("A/Item[2]/X", "x2").unwrap();
        d.set("Z/First", "1").unwrap();

        let m = map("/Root/A/Item[n]/X\n/Root/A/Item[n]/Y\n/Root/Z/First\n/Root/Z/Second\n");
        let outcome = m.order_tags(&mut d).unwrap();
        assert_eq!(outcome.kept, 5);
        assert!(outcome.dropped.is_empty());

        assert_eq!(
            d.to_array(),
            vec![
                ("/Root/A/Item/X".to_string(), "x1".to_string()),
                ("/Root/A/Item/Y".to_string(), "y1".to_string()),
                ("/Root/A/Item[2]/X".to_string(), "x2".to_string()),
                ("/Root/Z/First".to_string(), "1".to_string()),
                ("/Root/Z/Second".to_string(), "2".to_string()),
            ]
        );
        assert_eq!(d.root().attribute("versione"), Some("1"));
    }

    #[test]
    fn prefix_pattern_moves_whole_subtree() {
        let mut d = doc();
        d.set("B/One", "1").unwrap();
        d.set("A/Two", "2").unwrap();
        d.set("B/Three", "3").unwrap();

        map("/Root/A\n/Root/B\n").order_tags(&mut d).unwrap();
        let names: Vec<_> = d.root().children().iter().map(Element::local_name).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(d.get("B/Three").unwrap().as_deref(), Some("3"));
    }

    #[test]
    fn unmatched_leaves_are_reported() {
        let mut d = doc();
        d.set("A", "kept").unwrap();
        d.set("Unknown/Leaf", "lost").unwrap();
        d.set("Blank", "").unwrap();

        let outcome = map("/Root/A\n").order_tags(&mut d).unwrap();
        assert_eq!(outcome.dropped, vec!["/Root/Unknown/Leaf".to_string()]);
        assert_eq!(d.root().children().len(), 1);
        assert!(!d.has("Unknown/Leaf").unwrap());
    }

    #[test]
    fn sparse_indices_are_preserved() {
        let mut d = doc();
        d.set("A[2]/B", "second").unwrap();
        map("/Root/A[n]/B\n").order_tags(&mut d).unwrap();
        assert_eq!(d.get("A[2]/B").unwrap().as_deref(), Some("second"));
        assert_eq!(d.count("A").unwrap(), 2);
    }
}
