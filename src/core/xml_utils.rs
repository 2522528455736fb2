use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::ResolveResult;
use quick_xml::{NsReader, Writer};
use std::io::Cursor;

use super::error::EfattureError;
use super::node::Element;

fn xml_io(e: std::io::Error) -> EfattureError {
    EfattureError::Xml(format!("XML write error: {e}"))
}

fn xml_parse(e: impl std::fmt::Display) -> EfattureError {
    EfattureError::Xml(format!("XML parse error: {e}"))
}

/// Streams an [`Element`] tree to UTF-8 XML.
pub struct XmlWriter {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl XmlWriter {
    /// Start a document with an XML 1.0 / UTF-8 declaration. `pretty` indents
    /// nested elements by two spaces.
    pub fn new(pretty: bool) -> Result<Self, EfattureError> {
        let mut writer = if pretty {
            Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2)
        } else {
            Writer::new(Cursor::new(Vec::new()))
        };
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(xml_io)?;
        Ok(Self { writer })
    }

    pub fn into_string(self) -> Result<String, EfattureError> {
        let buf = self.writer.into_inner().into_inner();
        String::from_utf8(buf).map_err(|e| EfattureError::Xml(format!("XML UTF-8 error: {e}")))
    }

    /// Write `element` and its subtree. Leaves are always emitted as a
    /// start/text/end triple so an empty value survives a round-trip.
    pub fn element(&mut self, element: &Element) -> Result<&mut Self, EfattureError> {
        let mut start = BytesStart::new(element.name());
        for (k, v) in element.attributes() {
            start.push_attribute((k.as_str(), v.as_str()));
        }
        self.writer
            .write_event(Event::Start(start))
            .map_err(xml_io)?;

        if element.is_leaf() {
            self.writer
                .write_event(Event::Text(BytesText::new(element.text())))
                .map_err(xml_io)?;
        } else {
            for child in element.children() {
                self.element(child)?;
            }
        }

        self.writer
            .write_event(Event::End(BytesEnd::new(element.name())))
            .map_err(xml_io)?;
        Ok(self)
    }
}

/// Serialize `root` as a complete XML document.
pub fn write_document(root: &Element, pretty: bool) -> Result<String, EfattureError> {
    let mut w = XmlWriter::new(pretty)?;
    w.element(root)?;
    w.into_string()
}

/// Parse a complete XML document into its root element.
///
/// Namespace URIs are resolved per element; `xmlns` declarations stay in the
/// attribute list so the document serializes back with the same bindings.
/// Whitespace between elements, comments and processing instructions are
/// dropped.
pub fn read_document(xml: &str) -> Result<Element, EfattureError> {
    let mut reader = NsReader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_resolved_event() {
            Ok((ns, Event::Start(e))) => {
                stack.push(start_element(ns, &e)?);
            }
            Ok((ns, Event::Empty(e))) => {
                let element = start_element(ns, &e)?;
                attach(&mut stack, &mut root, element)?;
            }
            Ok((_, Event::End(_))) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| EfattureError::Xml("unbalanced end tag".into()))?;
                attach(&mut stack, &mut root, element)?;
            }
            Ok((_, Event::Text(e))) => {
                let text = e.unescape().map_err(xml_parse)?;
                if let Some(top) = stack.last_mut() {
                    top.append_text(&text);
                }
            }
            Ok((_, Event::CData(e))) => {
                let bytes = e.into_inner();
                let text = std::str::from_utf8(&bytes).map_err(xml_parse)?;
                if let Some(top) = stack.last_mut() {
                    top.append_text(text);
                }
            }
            Ok((_, Event::Eof)) => break,
            Err(e) => return Err(xml_parse(e)),
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(EfattureError::Xml("unexpected end of document".into()));
    }
    root.ok_or_else(|| EfattureError::Xml("document has no root element".into()))
}

fn start_element(ns: ResolveResult<'_>, e: &BytesStart<'_>) -> Result<Element, EfattureError> {
    let name = std::str::from_utf8(e.name().as_ref())
        .map_err(xml_parse)?
        .to_string();
    let mut element = Element::new(name);

    if let ResolveResult::Bound(namespace) = ns {
        let uri = std::str::from_utf8(namespace.as_ref()).map_err(xml_parse)?;
        element.set_namespace(Some(uri.to_string()));
    }

    for attr in e.attributes() {
        let attr = attr.map_err(xml_parse)?;
        let key = std::str::from_utf8(attr.key.as_ref()).map_err(xml_parse)?;
        let value = attr.unescape_value().map_err(xml_parse)?;
        element.set_attribute(key, value.as_ref());
    }
    Ok(element)
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), EfattureError> {
    match stack.last_mut() {
        Some(parent) => {
            parent.push_child(element);
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(element);
            Ok(())
        }
        None => Err(EfattureError::Xml("more than one root element".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_resolves_namespaces() {
        let xml = r#"<?xml version="1.0"?>
<p:Root xmlns:p="urn:test" versione="FPR12">
  <A>
    <B>1 &amp; 2</B>
    <B/>
  </A>
</p:Root>"#;
        let root = read_document(xml).unwrap();
        assert_eq!(root.name(), "p:Root");
        assert_eq!(root.namespace(), Some("urn:test"));
        assert_eq!(root.attribute("versione"), Some("FPR12"));
        assert_eq!(root.attribute("xmlns:p"), Some("urn:test"));

        let a = root.nth_named("A", 1).unwrap();
        assert!(a.namespace().is_none());
        assert_eq!(a.count_named("B"), 2);
        assert_eq!(a.nth_named("B", 1).unwrap().text(), "1 & 2");
    }

    #[test]
    fn leaves_are_never_self_closed() {
        let mut root = Element::new("Root");
        root.push_child(Element::new("Empty"));
        let mut v = Element::new("V");
        v.set_text("a<b");
        root.push_child(v);

        let xml = write_document(&root, false).unwrap();
        assert_eq!(
            xml,
            r#"<?xml version="1.0" encoding="UTF-8"?><Root><Empty></Empty><V>a&lt;b</V></Root>"#
        );
    }

    #[test]
    fn pretty_output_round_trips() {
        let mut root = Element::new("Root").with_attribute("x", "\"q\"");
        let mut a = Element::new("A");
        let mut b = Element::new("B");
        b.set_text("value");
        a.push_child(b);
        root.push_child(a);

        let pretty = write_document(&root, true).unwrap();
        assert!(pretty.contains("\n  <A>\n    <B>value</B>\n  </A>\n"));
        assert_eq!(read_document(&pretty).unwrap(), root);
    }

    #[test]
    fn rejects_broken_documents() {
        assert!(read_document("").is_err());
        assert!(read_document("<A><B></A>").is_err());
        assert!(read_document("<A></A><B></B>").is_err());
        assert!(read_document("<A>").is_err());
    }
}
