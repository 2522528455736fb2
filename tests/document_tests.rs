use efatture::core::*;

fn doc() -> XmlDocument {
    XmlDocument::new(Element::new("Root"))
}

fn doc_with(entries: &[(&str, &str)]) -> XmlDocument {
    let mut d = doc();
    for (path, value) in entries {
        d.set(path, value).unwrap();
    }
    d
}

// --- Reading and writing values ---

#[test]
fn set_then_get_through_created_path() {
    let mut d = doc();
    d.set("Header/Sender/Country", " IT ").unwrap();

    assert_eq!(d.get("Header/Sender/Country").unwrap().as_deref(), Some("IT"));
    assert_eq!(d.get("/Root/Header/Sender/Country").unwrap().as_deref(), Some("IT"));
    assert!(d.has("Header/Sender").unwrap());
    assert!(!d.has("Header/Receiver").unwrap());
    assert_eq!(d.get("Header/Receiver/Country").unwrap(), None);
}

#[test]
fn numeric_strings_are_stored_verbatim() {
    let mut d = doc();
    d.set("Line/Price", "10.50").unwrap().set("Line/Qty", "007").unwrap();
    assert_eq!(d.get("Line/Price").unwrap().as_deref(), Some("10.50"));
    assert_eq!(d.get("Line/Qty").unwrap().as_deref(), Some("007"));
}

#[test]
fn blank_values_read_as_absent() {
    let mut d = doc();
    d.set("Note", "   ").unwrap();
    assert_eq!(d.get("Note").unwrap(), None);
    assert!(!d.has("Note").unwrap());
    assert_eq!(d.get_or("Note", "n/a").unwrap(), "n/a");
}

#[test]
fn indices_pad_with_empty_siblings() {
    let mut d = doc();
    d.set("Body/Line[3]/Qty", "1").unwrap();

    assert_eq!(d.count("Body/Line").unwrap(), 3);
    assert_eq!(d.get("Body/Line[1]/Qty").unwrap(), None);
    assert_eq!(d.get("Body/Line[3]/Qty").unwrap().as_deref(), Some("1"));

    // `[]` and `[0]` both mean the first occurrence
    d.set("Body/Line[]/Qty", "5").unwrap();
    assert_eq!(d.get("Body/Line[0]/Qty").unwrap().as_deref(), Some("5"));
    assert_eq!(d.count("Body/Line").unwrap(), 3);
}

#[test]
fn padding_is_capped_per_write() {
    let mut d = doc_with(&[("Body/Line/Qty", "1")]);
    let before = d.to_xml_string(false).unwrap();

    let far = format!("Body/Line[{}]/Qty", MAX_PADDING + 2);
    assert!(matches!(d.set(&far, "x"), Err(EfattureError::Structural(_))));
    assert!(matches!(d.set("Other[100000000]", "x"), Err(EfattureError::Structural(_))));
    assert_eq!(d.to_xml_string(false).unwrap(), before);

    // exactly at the limit is still allowed
    let edge = format!("Body/Line[{}]/Qty", MAX_PADDING + 1);
    d.set(&edge, "2").unwrap();
    assert_eq!(d.count("Body/Line").unwrap(), MAX_PADDING + 1);
}

#[test]
fn count_ignores_last_index_and_missing_parents() {
    let d = doc_with(&[("Body/Line[2]/Qty", "1")]);
    assert_eq!(d.count("Body/Line[7]").unwrap(), 2);
    assert_eq!(d.count("Body[2]/Line").unwrap(), 0);
    assert_eq!(d.count("Missing/Line").unwrap(), 0);
}

#[test]
fn writing_over_a_branch_fails() {
    let mut d = doc_with(&[("Header/Code", "A")]);
    let err = d.set("Header", "x").unwrap_err();
    assert!(matches!(err, EfattureError::Structural(_)));
    assert_eq!(d.get("Header/Code").unwrap().as_deref(), Some("A"));
}

#[test]
fn creating_below_a_value_fails() {
    let mut d = doc_with(&[("Header/Code", "A")]);
    let err = d.set("Header/Code/Sub", "x").unwrap_err();
    assert!(matches!(err, EfattureError::Structural(_)));
}

#[test]
fn malformed_paths_are_rejected() {
    let mut d = doc();
    for path in ["Body/Line[x]", "Body/-", "Body/Line[1", "Body/[2]"] {
        let err = d.set(path, "1").unwrap_err();
        assert!(matches!(err, EfattureError::PathSyntax { .. }), "{path}");
        assert!(d.get(path).is_err(), "{path}");
    }
}

// --- Attributes ---

#[test]
fn attributes_are_trimmed_and_readable() {
    let mut d = doc();
    d.set_attribute("Root", "versione", " FPR12 ").unwrap();
    d.set_attribute("Header/Code", "type", "x").unwrap();

    assert_eq!(d.attribute("/", "versione").unwrap().as_deref(), Some("FPR12"));
    assert_eq!(d.attribute("Header/Code", "type").unwrap().as_deref(), Some("x"));
    assert_eq!(d.attribute("Header/Code", "other").unwrap(), None);
    assert!(matches!(
        d.set_attribute("Header", "", "x"),
        Err(EfattureError::InvalidArgument(_))
    ));
}

// --- Removing and listing ---

#[test]
fn remove_drops_a_subtree() {
    let mut d = doc_with(&[("Body/Line[1]/Qty", "1"), ("Body/Line[2]/Qty", "2")]);
    assert!(d.remove("Body/Line[1]").unwrap());
    assert_eq!(d.count("Body/Line").unwrap(), 1);
    assert_eq!(d.get("Body/Line/Qty").unwrap().as_deref(), Some("2"));

    assert!(!d.remove("Body/Line[5]").unwrap());
    assert!(!d.remove("Missing/Line").unwrap());
    assert!(matches!(d.remove("/Root"), Err(EfattureError::InvalidArgument(_))));
}

#[test]
fn children_paths_number_repeated_tags() {
    let d = doc_with(&[
        ("Body/Header", "h"),
        ("Body/Line[1]/Qty", "1"),
        ("Body/Line[2]/Qty", "2"),
    ]);
    assert_eq!(
        d.children_paths("Body").unwrap(),
        vec!["/Root/Body/Header", "/Root/Body/Line", "/Root/Body/Line[2]"]
    );
    assert!(d.children_paths("Missing").unwrap().is_empty());
}

#[test]
fn to_array_lists_leaves_in_document_order() {
    let d = doc_with(&[
        ("Header/Code", "A"),
        ("Body/Line[2]/Qty", "2"),
        ("Body/Line[1]/Qty", "1"),
    ]);
    assert_eq!(
        d.to_array(),
        vec![
            ("/Root/Header/Code".to_string(), "A".to_string()),
            ("/Root/Body/Line/Qty".to_string(), "1".to_string()),
            ("/Root/Body/Line[2]/Qty".to_string(), "2".to_string()),
        ]
    );
}

// --- Normalization and fingerprint ---

#[test]
fn normalize_prunes_empty_nodes_and_is_idempotent() {
    let mut d = doc_with(&[("Body/Line[3]/Qty", "1"), ("Header/Empty", "")]);
    d.normalize();
    assert_eq!(d.count("Body/Line").unwrap(), 1);
    assert!(d.retrieve_node("Header").unwrap().is_none());

    let once = d.to_xml_string(false).unwrap();
    d.normalize();
    assert_eq!(d.to_xml_string(false).unwrap(), once);
}

#[test]
fn empty_elements_with_attributes_survive_normalize() {
    let mut d = doc();
    d.set_attribute("Marker", "kind", "x").unwrap();
    d.normalize();
    assert!(d.retrieve_node("Marker").unwrap().is_some());
}

#[test]
fn fingerprint_ignores_sibling_order_and_attributes() {
    let mut a = doc_with(&[("Header/Code", "A"), ("Header/Name", "Acme")]);
    let mut b = doc_with(&[("Header/Name", "Acme"), ("Header/Code", "A")]);
    b.set_attribute("Header", "id", "1").unwrap();
    b.set("Header/Empty", "").unwrap();

    let fa = a.fingerprint().unwrap();
    assert_eq!(fa.len(), 64);
    assert_eq!(fa, b.fingerprint().unwrap());
}

#[test]
fn fingerprint_is_case_insensitive_but_value_sensitive() {
    let mut a = doc_with(&[("Header/Code", "abc")]);
    let mut b = doc_with(&[("Header/Code", "ABC")]);
    let mut c = doc_with(&[("Header/Code", "abd")]);
    assert_eq!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
    assert_ne!(a.fingerprint().unwrap(), c.fingerprint().unwrap());
}

#[test]
fn fingerprint_keeps_values_apart_from_paths() {
    let mut joined = doc_with(&[("A", "b|c")]);
    let mut nested = doc_with(&[("A/B", "c")]);
    assert_ne!(joined.fingerprint().unwrap(), nested.fingerprint().unwrap());

    let mut slash = doc_with(&[("A", "b/c")]);
    assert_ne!(slash.fingerprint().unwrap(), nested.fingerprint().unwrap());
}

// --- Parsing and serialization ---

#[test]
fn serialize_and_parse_back() {
    let d = doc_with(&[("Header/Code", "A & B"), ("Body/Line[2]/Qty", "2")]);
    let xml = d.to_xml_string(false).unwrap();
    assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
    assert!(xml.contains("A &amp; B"));

    let back = XmlDocument::parse(&xml).unwrap();
    assert_eq!(back.get("Header/Code").unwrap().as_deref(), Some("A & B"));
    assert_eq!(back.count("Body/Line").unwrap(), 2);
}

#[test]
fn save_xml_normalizes_first() {
    let mut d = doc_with(&[("Body/Line[2]/Qty", "2")]);
    let xml = d.save_xml(false).unwrap();
    assert_eq!(xml.matches("<Line>").count(), 1);
}

#[test]
fn byte_order_mark_is_skipped() {
    let mut bytes = b"\xEF\xBB\xBF".to_vec();
    bytes.extend_from_slice(br#"<Root><Code>1</Code></Root>"#);
    let d = XmlDocument::from_bytes(&bytes).unwrap();
    assert_eq!(d.root_tag(), "Root");
    assert_eq!(d.get("Code").unwrap().as_deref(), Some("1"));
}

#[test]
fn invalid_xml_is_an_xml_error() {
    assert!(matches!(XmlDocument::parse("<Root><a></Root>"), Err(EfattureError::Xml(_))));
    assert!(matches!(XmlDocument::from_bytes(&[0xff, 0xfe]), Err(EfattureError::Xml(_))));
}

#[test]
fn prefixed_root_is_addressed_by_local_name() {
    let d = XmlDocument::parse(
        r#"<p:Invoice xmlns:p="urn:x" versione="1"><Header><Code>7</Code></Header></p:Invoice>"#,
    )
    .unwrap();
    assert_eq!(d.root_tag(), "Invoice");
    assert_eq!(d.root().namespace(), Some("urn:x"));
    assert_eq!(d.get("/Invoice/Header/Code").unwrap().as_deref(), Some("7"));
}

// --- Ordering maps ---

const ORDER: &str = "\
# test map
/Root/Header/Code
/Root/Header/Name
/Root/Line[n]/Qty
/Root/Line[n]/Price
/Root/Extra
";

#[test]
fn order_tags_rebuilds_in_pattern_order() {
    let map = SchemaOrderingMap::parse(ORDER).unwrap();
    let mut d = doc_with(&[
        ("Line[2]/Price", "20"),
        ("Line[1]/Price", "10"),
        ("Line[1]/Qty", "1"),
        ("Header/Name", "Acme"),
        ("Header/Code", "A"),
    ]);
    d.set_attribute("Root", "versione", "1").unwrap();

    let outcome = map.order_tags(&mut d).unwrap();
    assert_eq!(outcome.kept, 5);
    assert!(outcome.dropped.is_empty());

    assert_eq!(
        d.children_paths("Root").unwrap(),
        vec!["/Root/Header", "/Root/Line", "/Root/Line[2]"]
    );
    assert_eq!(
        d.children_paths("Line[1]").unwrap(),
        vec!["/Root/Line/Qty", "/Root/Line/Price"]
    );
    assert_eq!(d.get("Line[2]/Price").unwrap().as_deref(), Some("20"));
    assert_eq!(d.attribute("Root", "versione").unwrap().as_deref(), Some("1"));
}

#[test]
fn patterns_match_by_prefix() {
    let map = SchemaOrderingMap::parse(ORDER).unwrap();
    let mut d = doc_with(&[("Extra/Deep/Leaf", "x"), ("Header/Code", "A")]);
    let outcome = map.order_tags(&mut d).unwrap();
    assert_eq!(outcome.kept, 2);
    assert_eq!(d.get("Extra/Deep/Leaf").unwrap().as_deref(), Some("x"));
    assert_eq!(d.children_paths("/").unwrap(), vec!["/Root/Header", "/Root/Extra"]);
}

#[test]
fn unmatched_leaves_are_dropped_and_reported() {
    let map = SchemaOrderingMap::parse(ORDER).unwrap();
    let mut d = doc_with(&[("Header/Code", "A"), ("Unknown/Leaf", "lost")]);
    let outcome = map.order_tags(&mut d).unwrap();
    assert_eq!(outcome.kept, 1);
    assert_eq!(outcome.dropped, vec!["/Root/Unknown/Leaf".to_string()]);
    assert!(!d.has("Unknown").unwrap());
}

#[test]
fn ordering_map_parse_rejects_bad_patterns() {
    assert!(matches!(
        SchemaOrderingMap::parse("/Root/Line[x]/Qty"),
        Err(EfattureError::PathSyntax { .. })
    ));
}

#[test]
fn ordering_map_from_schema_declaration_order() {
    let schema = StructuralSchema::parse(
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
             <xs:element name="Root">
               <xs:complexType><xs:sequence>
                 <xs:element name="B" type="xs:string"/>
                 <xs:element name="A" type="xs:string" maxOccurs="unbounded"/>
               </xs:sequence></xs:complexType>
             </xs:element>
           </xs:schema>"#,
    )
    .unwrap();
    let map = SchemaOrderingMap::from_schema(&schema);
    let patterns: Vec<String> = map.patterns().iter().map(ToString::to_string).collect();
    assert_eq!(patterns, vec!["/Root/B", "/Root/A[n]"]);

    let mut d = doc_with(&[("A[2]", "a2"), ("A[1]", "a1"), ("B", "b")]);
    map.order_tags(&mut d).unwrap();
    assert_eq!(
        d.to_array(),
        vec![
            ("/Root/B".to_string(), "b".to_string()),
            ("/Root/A".to_string(), "a1".to_string()),
            ("/Root/A[2]".to_string(), "a2".to_string()),
        ]
    );
}

// --- Validator chains ---

struct RequireField(&'static str, &'static str);

impl DocumentValidator for RequireField {
    fn name(&self) -> &'static str {
        "require-field"
    }

    fn errors(&self, document: &XmlDocument) -> Result<ValidationReport, EfattureError> {
        let mut report = ValidationReport::new();
        if !document.has(self.0)? {
            report.insert(self.1, format!("{} is missing", self.0));
        }
        Ok(report)
    }
}

#[test]
fn attached_validators_run_in_order() {
    let chain = ValidatorChain::builder()
        .with(RequireField("Header/Code", "E1"))
        .with(RequireField("Header/Name", "E2"))
        .build();
    let d = doc_with(&[("Header/Name", "Acme")]).with_validators(chain);

    let report = d.errors().unwrap();
    assert_eq!(report.codes().collect::<Vec<_>>(), vec!["E1"]);
    assert_eq!(report.get("E1"), Some("Header/Code is missing"));

    let err = d.validate().unwrap_err();
    assert_eq!(err.code(), Some("E1"));
}

#[test]
fn document_without_validators_is_valid() {
    let d = doc_with(&[("Header/Code", "A")]);
    assert!(d.validators().is_empty());
    assert!(d.errors().unwrap().is_empty());
    assert!(d.validate().is_ok());
}

#[test]
fn schema_validator_checks_datatypes_and_patterns() {
    let schema = StructuralSchema::parse(
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
             <xs:element name="Root">
               <xs:complexType><xs:sequence>
                 <xs:element name="Data" type="xs:date"/>
                 <xs:element name="Qty" type="xs:decimal"/>
                 <xs:element name="Amount" type="Amount2Decimal"/>
               </xs:sequence></xs:complexType>
             </xs:element>
             <xs:simpleType name="Amount2Decimal">
               <xs:restriction base="xs:decimal">
                 <xs:pattern value="[\-]?[0-9]{1,11}\.[0-9]{2}"/>
               </xs:restriction>
             </xs:simpleType>
           </xs:schema>"#,
    )
    .unwrap();
    let chain = ValidatorChain::builder()
        .with(SchemaValidator::new(std::sync::Arc::new(schema)))
        .build();

    let bad = XmlDocument::parse("<Root><Data>not-a-date</Data><Qty>abc</Qty><Amount>12,5</Amount></Root>")
        .unwrap()
        .with_validators(chain.clone());
    let violations = bad.errors().unwrap();
    assert_eq!(violations.codes().collect::<Vec<_>>(), vec!["1824"]);
    assert_eq!(violations.violations().len(), 3);

    let off_pattern = XmlDocument::parse("<Root><Data>2024-06-15</Data><Qty>3</Qty><Amount>12.5</Amount></Root>")
        .unwrap()
        .with_validators(chain.clone());
    assert_eq!(off_pattern.errors().unwrap().codes().collect::<Vec<_>>(), vec!["1839"]);

    let good = XmlDocument::parse("<Root><Data>2024-06-15</Data><Qty>3</Qty><Amount>-12.50</Amount></Root>")
        .unwrap()
        .with_validators(chain);
    assert!(good.errors().unwrap().is_empty());
}
