//! Owned element tree.
//!
//! Every element exclusively owns its children, so a document is acyclic by
//! construction and can be walked without depth guards.

/// An XML element: qualified name, optional namespace URI, text, attributes
/// and ordered children.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    name: String,
    namespace: Option<String>,
    text: String,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
}

impl Element {
    /// Create an element without namespace. `name` may carry a prefix
    /// (`p:FatturaElettronica`); lookups always use the local part.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Copy of this element's name, namespace and attributes, without text or
    /// children.
    pub fn shallow_clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            namespace: self.namespace.clone(),
            attributes: self.attributes.clone(),
            ..Self::default()
        }
    }

    /// Qualified name as it is serialized.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name without namespace prefix.
    pub fn local_name(&self) -> &str {
        local_part(&self.name)
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub(crate) fn set_namespace(&mut self, namespace: Option<String>) {
        self.namespace = namespace;
    }

    /// Raw (untrimmed) text content of this element.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub(crate) fn append_text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, replacing an existing one in place.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        let pos = self.attributes.iter().position(|(k, _)| k == name)?;
        Some(self.attributes.remove(pos).1)
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<Element> {
        &mut self.children
    }

    pub fn push_child(&mut self, child: Element) {
        self.children.push(child);
    }

    /// Detach and return all children.
    pub fn take_children(&mut self) -> Vec<Element> {
        std::mem::take(&mut self.children)
    }

    /// Children whose local name is `tag`, in document order.
    pub fn children_named<'a, 'b>(&'a self, tag: &'b str) -> impl Iterator<Item = &'a Element> + use<'a, 'b> {
        self.children.iter().filter(move |c| c.local_name() == tag)
    }

    pub fn count_named(&self, tag: &str) -> usize {
        self.children_named(tag).count()
    }

    /// The `index`-th (1-based) child named `tag`.
    pub fn nth_named(&self, tag: &str, index: usize) -> Option<&Element> {
        self.children_named(tag).nth(index.checked_sub(1)?)
    }

    pub fn nth_named_mut(&mut self, tag: &str, index: usize) -> Option<&mut Element> {
        let skip = index.checked_sub(1)?;
        self.children
            .iter_mut()
            .filter(|c| c.local_name() == tag)
            .nth(skip)
    }

    /// Remove the `index`-th (1-based) child named `tag`.
    pub fn remove_nth_named(&mut self, tag: &str, index: usize) -> Option<Element> {
        let skip = index.checked_sub(1)?;
        let pos = self
            .children
            .iter()
            .enumerate()
            .filter(|(_, c)| c.local_name() == tag)
            .nth(skip)
            .map(|(i, _)| i)?;
        Some(self.children.remove(pos))
    }

    /// No element children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Eligible for pruning: no children, no attributes, blank text.
    pub fn is_empty_node(&self) -> bool {
        self.children.is_empty() && self.attributes.is_empty() && self.text.trim().is_empty()
    }

    /// Concatenated trimmed text of this element and its descendants.
    pub fn deep_text(&self) -> String {
        if self.children.is_empty() {
            return self.text.trim().to_string();
        }
        let mut out = String::new();
        for child in &self.children {
            out.push_str(&child.deep_text());
        }
        out
    }

    /// Remove empty descendants bottom-up until none remain. Returns the number
    /// of removed elements. The receiver itself is never removed.
    pub fn prune_empty(&mut self) -> usize {
        let mut removed = 0;
        for child in &mut self.children {
            removed += child.prune_empty();
        }
        let before = self.children.len();
        self.children.retain(|c| !c.is_empty_node());
        removed + (before - self.children.len())
    }

    /// Visit every leaf together with the local names of its ancestors
    /// (root first, leaf last).
    pub fn walk_leaves<'a, F>(&'a self, f: &mut F)
    where
        F: FnMut(&[&'a str], &'a Element),
    {
        let mut trail = Vec::new();
        self.walk_inner(&mut trail, f);
    }

    fn walk_inner<'a, F>(&'a self, trail: &mut Vec<&'a str>, f: &mut F)
    where
        F: FnMut(&[&'a str], &'a Element),
    {
        trail.push(self.local_name());
        if self.children.is_empty() {
            f(trail, self);
        } else {
            for child in &self.children {
                child.walk_inner(trail, f);
            }
        }
        trail.pop();
    }
}

/// Strip a namespace prefix from a qualified name.
pub fn local_part(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, local)| local)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(name: &str, text: &str) -> Element {
        let mut e = Element::new(name);
        e.set_text(text);
        e
    }

    #[test]
    fn local_name_strips_prefix() {
        let e = Element::new("p:FatturaElettronica");
        assert_eq!(e.local_name(), "FatturaElettronica");
        assert_eq!(e.name(), "p:FatturaElettronica");
        assert_eq!(local_part("Plain"), "Plain");
    }

    #[test]
    fn nth_named_is_one_based() {
        let mut root = Element::new("Root");
        root.push_child(leaf("A", "1"));
        root.push_child(leaf("B", "x"));
        root.push_child(leaf("A", "2"));
        assert_eq!(root.count_named("A"), 2);
        assert_eq!(root.nth_named("A", 2).unwrap().text(), "2");
        assert!(root.nth_named("A", 0).is_none());
        assert!(root.nth_named("A", 3).is_none());

        let removed = root.remove_nth_named("A", 1).unwrap();
        assert_eq!(removed.text(), "1");
        assert_eq!(root.children().len(), 2);
    }

    #[test]
    fn prune_cascades_to_empty_parents() {
        let mut root = Element::new("Root");
        let mut a = Element::new("A");
        let mut b = Element::new("B");
        b.push_child(leaf("C", "   "));
        a.push_child(b);
        root.push_child(a);
        root.push_child(leaf("D", "kept"));
        root.push_child(Element::new("E").with_attribute("x", "1"));

        assert_eq!(root.prune_empty(), 3);
        let names: Vec<_> = root.children().iter().map(Element::local_name).collect();
        assert_eq!(names, vec!["D", "E"]);
        assert_eq!(root.prune_empty(), 0);
    }

    #[test]
    fn set_attribute_replaces_in_place() {
        let mut e = Element::new("X").with_attribute("a", "1").with_attribute("b", "2");
        e.set_attribute("a", "3");
        assert_eq!(e.attribute("a"), Some("3"));
        assert_eq!(e.attributes()[1], ("b".to_string(), "2".to_string()));
        assert_eq!(e.remove_attribute("a").as_deref(), Some("3"));
        assert!(e.attribute("a").is_none());
    }

    #[test]
    fn walk_leaves_reports_ancestors() {
        let mut root = Element::new("p:Root");
        let mut a = Element::new("A");
        a.push_child(leaf("B", "v"));
        root.push_child(a);

        let mut seen = Vec::new();
        root.walk_leaves(&mut |trail, leaf| seen.push((trail.join("/"), leaf.text().to_string())));
        assert_eq!(seen, vec![("Root/A/B".to_string(), "v".to_string())]);
    }
}
