//! Path-addressable XML document.
//!
//! Reads (`get`, `has`, `count`, `attribute`) resolve paths without touching
//! the tree. Writes (`set`, `set_attribute`) go through a separate resolver
//! that appends missing elements left to right, padding with empty same-tag
//! siblings until the requested occurrence exists.

use sha2::{Digest, Sha256};
use tracing::debug;

use super::error::EfattureError;
use super::node::Element;
use super::path::{PathSegment, format_path, parse_path};
use super::validation::{ValidationReport, ValidatorChain};
use super::xml_utils::{read_document, write_document};

/// Most same-tag siblings one write may create to reach an index.
pub const MAX_PADDING: usize = 10_000;

/// An XML document with a fixed root and an attached validator chain.
#[derive(Debug, Clone)]
pub struct XmlDocument {
    root: Element,
    validators: ValidatorChain,
}

impl PartialEq for XmlDocument {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root
    }
}

impl XmlDocument {
    pub fn new(root: Element) -> Self {
        Self {
            root,
            validators: ValidatorChain::default(),
        }
    }

    pub fn with_validators(mut self, validators: ValidatorChain) -> Self {
        self.validators = validators;
        self
    }

    /// Parse a document from XML text.
    pub fn parse(xml: &str) -> Result<Self, EfattureError> {
        Ok(Self::new(read_document(xml)?))
    }

    /// Parse a document from UTF-8 bytes. A leading byte-order mark is skipped.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EfattureError> {
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        let xml = std::str::from_utf8(bytes)
            .map_err(|e| EfattureError::Xml(format!("document is not UTF-8: {e}")))?;
        Self::parse(xml)
    }

    pub fn into_parts(self) -> (Element, ValidatorChain) {
        (self.root, self.validators)
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub(crate) fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    /// Local name of the root element; path segments equal to it are skipped.
    pub fn root_tag(&self) -> &str {
        self.root.local_name()
    }

    pub fn validators(&self) -> &ValidatorChain {
        &self.validators
    }

    fn segments(&self, path: &str) -> Result<Vec<PathSegment>, EfattureError> {
        parse_path(path, self.root.local_name())
    }

    fn resolve(&self, segments: &[PathSegment]) -> Option<&Element> {
        let mut node = &self.root;
        for seg in segments {
            node = node.nth_named(&seg.tag, seg.index)?;
        }
        Some(node)
    }

    /// Resolve `path` without creating anything. `Ok(None)` when any segment
    /// is absent.
    pub fn retrieve_node(&self, path: &str) -> Result<Option<&Element>, EfattureError> {
        let segments = self.segments(path)?;
        Ok(self.resolve(&segments))
    }

    /// Resolve `path`, creating every missing element along the way.
    ///
    /// A single segment may pad at most [`MAX_PADDING`] new siblings. Larger
    /// gaps fail with `Structural` before the tree is touched.
    pub fn retrieve_node_mut(&mut self, path: &str) -> Result<&mut Element, EfattureError> {
        let segments = self.segments(path)?;
        self.check_padding(&segments)?;
        let mut node = &mut self.root;
        for seg in &segments {
            let existing = node.count_named(&seg.tag);
            if existing < seg.index {
                if !node.text().trim().is_empty() {
                    return Err(EfattureError::Structural(format!(
                        "cannot create <{}> under <{}>, which holds a value",
                        seg.tag,
                        node.local_name()
                    )));
                }
                for _ in existing..seg.index {
                    node.push_child(Element::new(seg.tag.as_str()));
                }
                debug!(tag = %seg.tag, created = seg.index - existing, "created missing nodes");
            }
            node = node.nth_named_mut(&seg.tag, seg.index).ok_or_else(|| {
                EfattureError::Structural(format!("node <{}> vanished during resolution", seg.tag))
            })?;
        }
        Ok(node)
    }

    fn check_padding(&self, segments: &[PathSegment]) -> Result<(), EfattureError> {
        let mut node = Some(&self.root);
        for seg in segments {
            let existing = node.map_or(0, |n| n.count_named(&seg.tag));
            let missing = seg.index.saturating_sub(existing);
            if missing > MAX_PADDING {
                return Err(EfattureError::Structural(format!(
                    "writing <{}[{}]> would create {missing} siblings (limit {MAX_PADDING})",
                    seg.tag, seg.index
                )));
            }
            node = node.and_then(|n| n.nth_named(&seg.tag, seg.index));
        }
        Ok(())
    }

    /// Trimmed text at `path`, or `None` when absent or blank.
    pub fn get(&self, path: &str) -> Result<Option<String>, EfattureError> {
        Ok(self
            .retrieve_node(path)?
            .map(Element::deep_text)
            .filter(|v| !v.is_empty()))
    }

    /// Like [`get`](Self::get) with a fallback value.
    pub fn get_or(&self, path: &str, default: &str) -> Result<String, EfattureError> {
        Ok(self.get(path)?.unwrap_or_else(|| default.to_string()))
    }

    pub fn has(&self, path: &str) -> Result<bool, EfattureError> {
        Ok(self.get(path)?.is_some())
    }

    /// Number of elements named like the last segment under its resolved
    /// parent. The index of the last segment is ignored.
    pub fn count(&self, path: &str) -> Result<usize, EfattureError> {
        let mut segments = self.segments(path)?;
        let Some(last) = segments.pop() else {
            return Ok(1);
        };
        Ok(self
            .resolve(&segments)
            .map_or(0, |parent| parent.count_named(&last.tag)))
    }

    /// Set the trimmed `value` at `path`, creating missing elements. Numeric
    /// strings are stored verbatim.
    pub fn set(&mut self, path: &str, value: impl AsRef<str>) -> Result<&mut Self, EfattureError> {
        let node = self.retrieve_node_mut(path)?;
        if !node.is_leaf() {
            return Err(EfattureError::Structural(format!(
                "cannot set a value on <{}>, which has child elements",
                node.local_name()
            )));
        }
        node.set_text(value.as_ref().trim());
        Ok(self)
    }

    pub fn attribute(&self, path: &str, name: &str) -> Result<Option<String>, EfattureError> {
        Ok(self
            .retrieve_node(path)?
            .and_then(|n| n.attribute(name))
            .map(str::to_string))
    }

    pub fn set_attribute(
        &mut self,
        path: &str,
        name: &str,
        value: impl AsRef<str>,
    ) -> Result<&mut Self, EfattureError> {
        if name.is_empty() {
            return Err(EfattureError::InvalidArgument("attribute name is empty".into()));
        }
        self.retrieve_node_mut(path)?
            .set_attribute(name, value.as_ref().trim());
        Ok(self)
    }

    /// Remove the element at `path`. Returns whether something was removed.
    pub fn remove(&mut self, path: &str) -> Result<bool, EfattureError> {
        let mut segments = self.segments(path)?;
        let Some(last) = segments.pop() else {
            return Err(EfattureError::InvalidArgument(
                "the root element cannot be removed".into(),
            ));
        };
        let mut node = &mut self.root;
        for seg in &segments {
            match node.nth_named_mut(&seg.tag, seg.index) {
                Some(next) => node = next,
                None => return Ok(false),
            }
        }
        Ok(node.remove_nth_named(&last.tag, last.index).is_some())
    }

    /// Paths of the direct children of the element at `path`.
    pub fn children_paths(&self, path: &str) -> Result<Vec<String>, EfattureError> {
        let segments = self.segments(path)?;
        let Some(node) = self.resolve(&segments) else {
            return Ok(Vec::new());
        };
        let base = format_path(self.root_tag(), &segments);
        let mut seen: Vec<(&str, usize)> = Vec::new();
        let mut out = Vec::with_capacity(node.children().len());
        for child in node.children() {
            let tag = child.local_name();
            let n = occurrence(&mut seen, tag);
            out.push(format!("{base}/{}", PathSegment::new(tag, n)));
        }
        Ok(out)
    }

    /// Remove empty elements until none remain. Idempotent.
    pub fn normalize(&mut self) -> &mut Self {
        let removed = self.root.prune_empty();
        if removed > 0 {
            debug!(removed, "pruned empty nodes");
        }
        self
    }

    /// Order-independent digest of the document's leaf content.
    ///
    /// Normalizes, then hashes the JSON of the sorted list of
    /// `[root, ..., tag, value]` arrays (lower-cased) of every leaf with a
    /// non-blank value. Each leaf stays one array, so a `|` or `/` inside a
    /// value cannot be mistaken for a deeper path. Attributes and sibling
    /// order do not contribute.
    pub fn fingerprint(&mut self) -> Result<String, EfattureError> {
        self.normalize();

        let mut lines: Vec<Vec<String>> = Vec::new();
        self.root.walk_leaves(&mut |trail, leaf| {
            let value = leaf.text().trim();
            if !value.is_empty() {
                let mut line: Vec<String> = trail.iter().map(|t| t.to_lowercase()).collect();
                line.push(value.to_lowercase());
                lines.push(line);
            }
        });
        lines.sort();

        let json = serde_json::to_vec(&lines)
            .map_err(|e| EfattureError::Structural(format!("fingerprint encoding: {e}")))?;
        Ok(hex::encode(Sha256::digest(&json)))
    }

    /// Every non-blank leaf as `(path, value)` in document order. Occurrence
    /// indices appear only where greater than one.
    pub fn to_array(&self) -> Vec<(String, String)> {
        let root = self.root_tag();
        self.leaf_entries()
            .into_iter()
            .map(|(segments, value)| (format_path(root, &segments), value))
            .collect()
    }

    /// Like [`to_array`](Self::to_array) but with parsed segments relative to
    /// the root.
    pub(crate) fn leaf_entries(&self) -> Vec<(Vec<PathSegment>, String)> {
        let mut out = Vec::new();
        let mut trail = Vec::new();
        collect_leaves(&self.root, &mut trail, &mut out);
        out
    }

    /// Serialize without modifying the tree.
    pub fn to_xml_string(&self, pretty: bool) -> Result<String, EfattureError> {
        write_document(&self.root, pretty)
    }

    /// Normalize, then serialize.
    pub fn save_xml(&mut self, pretty: bool) -> Result<String, EfattureError> {
        self.normalize();
        self.to_xml_string(pretty)
    }

    /// Run the attached validators.
    pub fn errors(&self) -> Result<ValidationReport, EfattureError> {
        self.validators.run(self)
    }

    /// `Err(EfattureError::Validation)` with the first error, if any.
    pub fn validate(&self) -> Result<(), EfattureError> {
        self.errors()?.into_result()
    }
}

fn collect_leaves(
    node: &Element,
    trail: &mut Vec<PathSegment>,
    out: &mut Vec<(Vec<PathSegment>, String)>,
) {
    if node.is_leaf() {
        let value = node.text().trim();
        if !value.is_empty() {
            out.push((trail.clone(), value.to_string()));
        }
        return;
    }

    let mut seen: Vec<(&str, usize)> = Vec::new();
    for child in node.children() {
        let tag = child.local_name();
        let n = occurrence(&mut seen, tag);
        trail.push(PathSegment::new(tag, n));
        collect_leaves(child, trail, out);
        trail.pop();
    }
}

/// Bump and return the running occurrence count of `tag`.
fn occurrence<'a>(seen: &mut Vec<(&'a str, usize)>, tag: &'a str) -> usize {
    match seen.iter_mut().find(|(t, _)| *t == tag) {
        Some(entry) => {
            entry.1 += 1;
            entry.1
        }
        None => {
            seen.push((tag, 1));
            1
        }
    }
}
