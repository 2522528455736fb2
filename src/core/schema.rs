//! Structural schema validation over a subset of XML Schema.
//!
//! Supported: global and local `element` declarations (`name`, `type`, `ref`,
//! `minOccurs`, `maxOccurs`), named and anonymous `complexType` with nested
//! `sequence` / `choice` / `all` groups and `any` wildcards, `simpleContent`,
//! and `simpleType` restrictions with the `enumeration`, `length`,
//! `minLength`, `maxLength` and `pattern` facets. Patterns are translated
//! from XML Schema regular expressions (block escapes such as
//! `\p{IsBasicLatin}`, `\i`/`\c`, class subtraction) and matched against the
//! whole value. Values of the built-in `xs:decimal`, integer, `xs:date`,
//! `xs:dateTime`, `xs:time`, `xs:gYear`, `xs:boolean` and `xs:base64Binary`
//! types are checked lexically. Attributes are not checked. `complexContent`,
//! `list` and `union` are accepted and leave the affected content unchecked.
//!
//! Content models are matched greedily, which is exact for schemas obeying
//! the Unique Particle Attribution constraint.
//!
//! Violation codes follow libxml2's numbering so that callers keyed on them
//! keep working.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use regex::{Regex, RegexBuilder};

use super::document::XmlDocument;
use super::error::EfattureError;
use super::node::{Element, local_part};
use super::ordering::{OrderingPattern, PatternSegment};
use super::validation::{DocumentValidator, ValidationReport};
use super::xml_utils::read_document;

/// Value outside the lexical space of its built-in type.
pub const ERR_DATATYPE: u32 = 1824;
/// Facet `length` violated.
pub const ERR_LENGTH: u32 = 1830;
/// Facet `minLength` violated.
pub const ERR_MIN_LENGTH: u32 = 1831;
/// Facet `maxLength` violated.
pub const ERR_MAX_LENGTH: u32 = 1832;
/// Facet `pattern` violated.
pub const ERR_PATTERN: u32 = 1839;
/// Facet `enumeration` violated.
pub const ERR_ENUMERATION: u32 = 1840;
/// Child elements inside a simple-typed element.
pub const ERR_SIMPLE_CONTENT: u32 = 1841;
/// No global declaration for the document root.
pub const ERR_NO_ROOT: u32 = 1845;
/// Unexpected, missing or misplaced child element.
pub const ERR_CONTENT: u32 = 1871;

// Named types may refer to each other; cap the chain we follow.
const MAX_TYPE_DEPTH: usize = 32;
// Compiled size allowed for one pattern; long `{1,1000}` repeats need room.
const PATTERN_SIZE_LIMIT: usize = 1 << 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxOccurs {
    Bounded(u32),
    Unbounded,
}

impl MaxOccurs {
    fn allows(self, n: u32) -> bool {
        match self {
            Self::Bounded(max) => n <= max,
            Self::Unbounded => true,
        }
    }

    /// Whether more than one occurrence is allowed.
    pub fn is_repeatable(self) -> bool {
        !matches!(self, Self::Bounded(0 | 1))
    }
}

#[derive(Debug, Clone)]
enum TypeRef {
    Named(String),
    Complex(ComplexType),
    Simple(SimpleType),
    Unrestricted,
}

#[derive(Debug, Clone)]
struct ElementDecl {
    name: String,
    min: u32,
    max: MaxOccurs,
    ty: TypeRef,
    // `ref=` to a declaration this schema does not define.
    foreign: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupKind {
    Sequence,
    Choice,
    All,
}

#[derive(Debug, Clone)]
struct Group {
    kind: GroupKind,
    min: u32,
    max: MaxOccurs,
    items: Vec<Particle>,
}

#[derive(Debug, Clone)]
enum Particle {
    Element(ElementDecl),
    Group(Group),
    Any { min: u32, max: MaxOccurs },
}

impl Particle {
    fn occurs(&self) -> (u32, MaxOccurs) {
        match self {
            Self::Element(e) => (e.min, e.max),
            Self::Group(g) => (g.min, g.max),
            Self::Any { min, max } => (*min, *max),
        }
    }
}

#[derive(Debug, Clone)]
enum Content {
    Empty,
    Elements(Group),
    Simple(Box<TypeRef>),
    Open,
}

#[derive(Debug, Clone)]
struct ComplexType {
    content: Content,
}

#[derive(Debug, Clone, Default)]
struct SimpleType {
    base: Option<String>,
    enumeration: Vec<String>,
    length: Option<usize>,
    min_length: Option<usize>,
    max_length: Option<usize>,
    pattern: Option<Pattern>,
    open: bool,
}

/// The `pattern` facets of one restriction, ORed together.
#[derive(Debug, Clone)]
struct Pattern {
    sources: Vec<String>,
    regex: Regex,
}

impl Pattern {
    fn compile(sources: Vec<String>) -> Result<Self, EfattureError> {
        let mut alternatives = Vec::with_capacity(sources.len());
        for source in &sources {
            alternatives.push(format!("(?:{})", translate_pattern(source)?));
        }
        let anchored = format!("^(?:{})$", alternatives.join("|"));
        let regex = RegexBuilder::new(&anchored)
            .size_limit(PATTERN_SIZE_LIMIT)
            .build()
            .map_err(|e| xsd_error(format!("pattern '{}': {e}", sources.join("' | '"))))?;
        Ok(Self { sources, regex })
    }

    fn describe(&self) -> String {
        self.sources.join("' or '")
    }
}

/// A single schema violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    pub code: u32,
    pub message: String,
    /// Path of the offending element, `/Root/Child[2]` style.
    pub path: String,
}

/// A parsed structural schema.
#[derive(Debug, Clone, Default)]
pub struct StructuralSchema {
    target_namespace: Option<String>,
    roots: Vec<ElementDecl>,
    complex_types: HashMap<String, ComplexType>,
    simple_types: HashMap<String, SimpleType>,
}

impl StructuralSchema {
    /// Parse XSD text.
    pub fn parse(xsd: &str) -> Result<Self, EfattureError> {
        let root = read_document(xsd)?;
        if root.local_name() != "schema" {
            return Err(EfattureError::Xml(format!(
                "expected <schema> root, found <{}>",
                root.name()
            )));
        }

        let mut schema = Self {
            target_namespace: root.attribute("targetNamespace").map(str::to_string),
            ..Self::default()
        };
        for child in root.children() {
            match child.local_name() {
                "complexType" => {
                    let name = required_name(child)?;
                    let ty = parse_complex(child)?;
                    schema.complex_types.insert(name, ty);
                }
                "simpleType" => {
                    let name = required_name(child)?;
                    schema.simple_types.insert(name, parse_simple(child)?);
                }
                _ => {}
            }
        }
        // Global elements are parsed last so `ref=` can see every sibling.
        let globals: Vec<&Element> = root
            .children()
            .iter()
            .filter(|c| c.local_name() == "element")
            .collect();
        for child in &globals {
            schema.roots.push(parse_element(child, &globals)?);
        }
        Ok(schema)
    }

    pub fn target_namespace(&self) -> Option<&str> {
        self.target_namespace.as_deref()
    }

    /// Names of the global element declarations.
    pub fn root_names(&self) -> impl Iterator<Item = &str> {
        self.roots.iter().map(|d| d.name.as_str())
    }

    /// Every violation found under `root`.
    pub fn violations(&self, root: &Element) -> Vec<SchemaViolation> {
        let mut out = Vec::new();
        let decl = self.roots.iter().find(|d| {
            d.name == root.local_name()
                && match (&self.target_namespace, root.namespace()) {
                    (Some(expected), Some(actual)) => expected == actual,
                    (Some(_), None) => false,
                    (None, _) => true,
                }
        });
        match decl {
            Some(decl) => {
                let path = format!("/{}", root.local_name());
                self.check_element(root, &decl.ty, &path, 0, &mut out);
            }
            None => out.push(SchemaViolation {
                code: ERR_NO_ROOT,
                message: format!(
                    "Element '{}': No matching global declaration available for the validation root.",
                    root.name()
                ),
                path: format!("/{}", root.local_name()),
            }),
        }
        out
    }

    /// Leaf paths in declaration order, `[n]` marking repeatable segments.
    pub fn paths(&self) -> Vec<OrderingPattern> {
        let mut out = Vec::new();
        for root in &self.roots {
            let mut trail = vec![PatternSegment {
                tag: root.name.clone(),
                repeatable: false,
            }];
            self.collect_paths(&root.ty, &mut trail, 0, &mut out);
        }
        out
    }

    fn complex<'a>(&'a self, ty: &'a TypeRef) -> Option<&'a ComplexType> {
        match ty {
            TypeRef::Complex(c) => Some(c),
            TypeRef::Named(n) => self.complex_types.get(n),
            _ => None,
        }
    }

    fn collect_paths(
        &self,
        ty: &TypeRef,
        trail: &mut Vec<PatternSegment>,
        depth: usize,
        out: &mut Vec<OrderingPattern>,
    ) {
        let group = match self.complex(ty).map(|c| &c.content) {
            Some(Content::Elements(group)) if depth < MAX_TYPE_DEPTH => group,
            _ => {
                out.push(OrderingPattern::new(trail.clone()));
                return;
            }
        };
        self.collect_group_paths(group, trail, depth, out);
    }

    fn collect_group_paths(
        &self,
        group: &Group,
        trail: &mut Vec<PatternSegment>,
        depth: usize,
        out: &mut Vec<OrderingPattern>,
    ) {
        for item in &group.items {
            match item {
                Particle::Element(decl) => {
                    trail.push(PatternSegment {
                        tag: decl.name.clone(),
                        repeatable: decl.max.is_repeatable() || group.max.is_repeatable(),
                    });
                    self.collect_paths(&decl.ty, trail, depth + 1, out);
                    trail.pop();
                }
                Particle::Group(inner) => self.collect_group_paths(inner, trail, depth, out),
                Particle::Any { .. } => {}
            }
        }
    }

    fn check_element(
        &self,
        element: &Element,
        ty: &TypeRef,
        path: &str,
        depth: usize,
        out: &mut Vec<SchemaViolation>,
    ) {
        if depth > MAX_TYPE_DEPTH {
            return;
        }
        if let Some(complex) = self.complex(ty) {
            match &complex.content {
                Content::Open => {}
                Content::Empty => {
                    if let Some(child) = element.children().first() {
                        out.push(unexpected(child, path, None));
                    }
                }
                Content::Simple(inner) => self.check_simple_element(element, inner, path, out),
                Content::Elements(group) => {
                    self.check_children(element, group, path, depth, out);
                }
            }
        } else {
            self.check_simple_element(element, ty, path, out);
        }
    }

    fn check_children(
        &self,
        element: &Element,
        group: &Group,
        path: &str,
        depth: usize,
        out: &mut Vec<SchemaViolation>,
    ) {
        let children: Vec<&Element> = element.children().iter().collect();
        let mut assigned = Vec::new();
        let matcher = Matcher { children: &children };

        match matcher.group(group, 0, &mut assigned) {
            Ok(end) if end < children.len() => {
                out.push(unexpected(children[end], path, None));
            }
            Ok(_) => {}
            Err(fail) => match children.get(fail.at) {
                Some(child) => out.push(unexpected(child, path, Some(&fail.expected))),
                None => out.push(SchemaViolation {
                    code: ERR_CONTENT,
                    message: format!(
                        "Element '{}': Missing child element(s). Expected is ( {} ).",
                        element.name(),
                        fail.expected.join(", ")
                    ),
                    path: path.to_string(),
                }),
            },
        }

        for (index, decl) in assigned {
            let child = children[index];
            let n = children[..=index]
                .iter()
                .filter(|c| c.local_name() == child.local_name())
                .count();
            let child_path = if n > 1 {
                format!("{path}/{}[{n}]", child.local_name())
            } else {
                format!("{path}/{}", child.local_name())
            };
            if decl.foreign {
                continue;
            }
            self.check_element(child, &decl.ty, &child_path, depth + 1, out);
        }
    }

    fn check_simple_element(
        &self,
        element: &Element,
        ty: &TypeRef,
        path: &str,
        out: &mut Vec<SchemaViolation>,
    ) {
        if let Some(child) = element.children().first() {
            out.push(SchemaViolation {
                code: ERR_SIMPLE_CONTENT,
                message: format!(
                    "Element '{}': Element content is not allowed, because the content type is a simple type definition.",
                    element.name()
                ),
                path: format!("{path}/{}", child.local_name()),
            });
            return;
        }
        let value = element.text().trim();

        // Walk from the declared type down to its built-in base.
        let mut chain: Vec<&SimpleType> = Vec::new();
        let mut next = match ty {
            TypeRef::Simple(s) => {
                chain.push(s);
                s.base.as_deref()
            }
            TypeRef::Named(n) => Some(n.as_str()),
            _ => None,
        };
        let mut builtin = None;
        while let Some(name) = next {
            if chain.len() > MAX_TYPE_DEPTH {
                break;
            }
            match self.simple_types.get(name) {
                Some(simple) => {
                    chain.push(simple);
                    next = simple.base.as_deref();
                }
                None => {
                    builtin = Some(name);
                    break;
                }
            }
        }
        if chain.iter().any(|s| s.open) {
            return;
        }

        if let Some(builtin) = builtin {
            if !builtin_accepts(builtin, value) {
                out.push(SchemaViolation {
                    code: ERR_DATATYPE,
                    message: format!(
                        "Element '{}': '{value}' is not a valid value of the atomic type 'xs:{builtin}'.",
                        element.name()
                    ),
                    path: path.to_string(),
                });
                return;
            }
        }
        for simple in chain {
            if let Some(v) = check_facets(simple, element.name(), value, path) {
                out.push(v);
                return;
            }
        }
    }
}

fn unexpected(child: &Element, path: &str, expected: Option<&[String]>) -> SchemaViolation {
    let mut message = format!("Element '{}': This element is not expected.", child.name());
    if let Some(expected) = expected.filter(|e| !e.is_empty()) {
        message.push_str(&format!(" Expected is ( {} ).", expected.join(", ")));
    }
    SchemaViolation {
        code: ERR_CONTENT,
        message,
        path: format!("{path}/{}", child.local_name()),
    }
}

fn check_facets(simple: &SimpleType, name: &str, value: &str, path: &str) -> Option<SchemaViolation> {
    if simple.open {
        return None;
    }
    let violation = |code, message: String| SchemaViolation {
        code,
        message: format!("Element '{name}': {message}"),
        path: path.to_string(),
    };
    if !simple.enumeration.is_empty() && !simple.enumeration.iter().any(|e| e == value) {
        let set = simple
            .enumeration
            .iter()
            .map(|e| format!("'{e}'"))
            .collect::<Vec<_>>()
            .join(", ");
        return Some(violation(
            ERR_ENUMERATION,
            format!("[facet 'enumeration'] The value '{value}' is not an element of the set {{{set}}}."),
        ));
    }
    let len = value.chars().count();
    if let Some(expected) = simple.length.filter(|l| *l != len) {
        return Some(violation(
            ERR_LENGTH,
            format!("[facet 'length'] The value '{value}' has a length of '{len}'; this differs from the allowed length of '{expected}'."),
        ));
    }
    if let Some(min) = simple.min_length.filter(|m| len < *m) {
        return Some(violation(
            ERR_MIN_LENGTH,
            format!("[facet 'minLength'] The value '{value}' has a length of '{len}'; this underruns the allowed minimum length of '{min}'."),
        ));
    }
    if let Some(max) = simple.max_length.filter(|m| len > *m) {
        return Some(violation(
            ERR_MAX_LENGTH,
            format!("[facet 'maxLength'] The value '{value}' has a length of '{len}'; this exceeds the allowed maximum length of '{max}'."),
        ));
    }
    if let Some(pattern) = simple.pattern.as_ref().filter(|p| !p.regex.is_match(value)) {
        return Some(violation(
            ERR_PATTERN,
            format!(
                "[facet 'pattern'] The value '{value}' is not accepted by the pattern '{}'.",
                pattern.describe()
            ),
        ));
    }
    None
}

// ---------------------------------------------------------------------------
// Built-in types
// ---------------------------------------------------------------------------

/// Whether `value` is in the lexical space of the built-in type `name`.
/// Types without a lexical check accept everything.
fn builtin_accepts(name: &str, value: &str) -> bool {
    match name {
        "decimal" => is_decimal(value),
        "integer" => is_integer(value),
        "nonNegativeInteger" => integer_in(value, Some(0), None),
        "positiveInteger" => integer_in(value, Some(1), None),
        "nonPositiveInteger" => integer_in(value, None, Some(0)),
        "negativeInteger" => integer_in(value, None, Some(-1)),
        "long" => integer_in(value, Some(i64::MIN.into()), Some(i64::MAX.into())),
        "int" => integer_in(value, Some(i32::MIN.into()), Some(i32::MAX.into())),
        "short" => integer_in(value, Some(i16::MIN.into()), Some(i16::MAX.into())),
        "byte" => integer_in(value, Some(i8::MIN.into()), Some(i8::MAX.into())),
        "unsignedLong" => integer_in(value, Some(0), Some(u64::MAX.into())),
        "unsignedInt" => integer_in(value, Some(0), Some(u32::MAX.into())),
        "unsignedShort" => integer_in(value, Some(0), Some(u16::MAX.into())),
        "unsignedByte" => integer_in(value, Some(0), Some(u8::MAX.into())),
        "boolean" => matches!(value, "true" | "false" | "1" | "0"),
        "date" => parse_date(strip_timezone(value)).is_some(),
        "dateTime" => strip_timezone(value)
            .split_once('T')
            .is_some_and(|(date, time)| parse_date(date).is_some() && parse_time(time).is_some()),
        "time" => parse_time(strip_timezone(value)).is_some(),
        "gYear" => parse_year(strip_timezone(value)).is_some(),
        "base64Binary" => is_base64(value),
        _ => true,
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn unsigned(value: &str) -> &str {
    value.strip_prefix(['+', '-']).unwrap_or(value)
}

fn is_decimal(value: &str) -> bool {
    match unsigned(value).split_once('.') {
        Some((int, frac)) => {
            (is_digits(int) || int.is_empty())
                && (is_digits(frac) || frac.is_empty())
                && !(int.is_empty() && frac.is_empty())
        }
        None => is_digits(unsigned(value)),
    }
}

fn is_integer(value: &str) -> bool {
    is_digits(unsigned(value))
}

fn integer_in(value: &str, min: Option<i128>, max: Option<i128>) -> bool {
    if !is_integer(value) {
        return false;
    }
    // Too large for i128 only matters when a bound exists.
    match value.parse::<i128>() {
        Ok(n) => min.is_none_or(|m| n >= m) && max.is_none_or(|m| n <= m),
        Err(_) => {
            let negative = value.starts_with('-');
            if negative { min.is_none() } else { max.is_none() }
        }
    }
}

fn strip_timezone(value: &str) -> &str {
    if let Some(rest) = value.strip_suffix('Z') {
        return rest;
    }
    // `+hh:mm` / `-hh:mm`
    if value.len() > 6 && value.is_char_boundary(value.len() - 6) {
        let (head, zone) = value.split_at(value.len() - 6);
        let z = zone.as_bytes();
        if zone.is_ascii()
            && matches!(z[0], b'+' | b'-')
            && is_digits(&zone[1..3])
            && z[3] == b':'
            && is_digits(&zone[4..])
            && &zone[1..3] <= "14"
        {
            return head;
        }
    }
    value
}

fn parse_year(value: &str) -> Option<i32> {
    let digits = value.strip_prefix('-').unwrap_or(value);
    // At least four digits; no leading zero beyond four.
    if digits.len() < 4 || !is_digits(digits) || (digits.len() > 4 && digits.starts_with('0')) {
        return None;
    }
    let year: i32 = value.parse().ok()?;
    (year != 0).then_some(year)
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let (rest, day) = value.rsplit_once('-')?;
    let (year, month) = rest.rsplit_once('-')?;
    if month.len() != 2 || day.len() != 2 || !is_digits(month) || !is_digits(day) {
        return None;
    }
    NaiveDate::from_ymd_opt(parse_year(year)?, month.parse().ok()?, day.parse().ok()?)
}

/// `hh:mm:ss` with optional fractional seconds.
fn parse_time(value: &str) -> Option<NaiveTime> {
    let whole = match value.split_once('.') {
        Some((whole, fraction)) if is_digits(fraction) => whole,
        Some(_) => return None,
        None => value,
    };
    let b = whole.as_bytes();
    if !whole.is_ascii() || b.len() != 8 || b[2] != b':' || b[5] != b':' {
        return None;
    }
    if !is_digits(&whole[..2]) || !is_digits(&whole[3..5]) || !is_digits(&whole[6..]) {
        return None;
    }
    NaiveTime::parse_from_str(whole, "%H:%M:%S").ok()
}

fn is_base64(value: &str) -> bool {
    let compact: Vec<u8> = value.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
    let body = compact
        .strip_suffix(b"==")
        .or_else(|| compact.strip_suffix(b"="))
        .unwrap_or(&compact);
    compact.len() % 4 == 0
        && body
            .iter()
            .all(|b| b.is_ascii_alphanumeric() || *b == b'+' || *b == b'/')
}

// ---------------------------------------------------------------------------
// Pattern translation
// ---------------------------------------------------------------------------

// `\i` and `\c`, restricted to their ASCII subset.
const NAME_START: &str = "_:A-Za-z";
const NAME_CHAR: &str = "\\-._:A-Za-z0-9";
// XSD `\s` is exactly these four characters.
const XSD_SPACE: &str = " \\t\\n\\r";
const XSD_NOT_WORD: &str = "\\p{P}\\p{Z}\\p{C}";

/// Unicode blocks addressable as `\p{IsName}`, keyed by the folded name.
const BLOCKS: &[(&str, &str)] = &[
    ("basiclatin", "\\x{0}-\\x{7F}"),
    ("currencysymbols", "\\x{20A0}-\\x{20CF}"),
    ("cyrillic", "\\x{400}-\\x{4FF}"),
    ("generalpunctuation", "\\x{2000}-\\x{206F}"),
    ("greek", "\\x{370}-\\x{3FF}"),
    ("latin1supplement", "\\x{80}-\\x{FF}"),
    ("latinextendeda", "\\x{100}-\\x{17F}"),
    ("latinextendedadditional", "\\x{1E00}-\\x{1EFF}"),
    ("latinextendedb", "\\x{180}-\\x{24F}"),
];

/// Rewrite an XML Schema regular expression into `regex` syntax.
///
/// XSD patterns are implicitly anchored and treat `^`/`$` as literals; the
/// caller adds the anchors.
fn translate_pattern(pattern: &str) -> Result<String, EfattureError> {
    let bad = |why: &str| xsd_error(format!("pattern '{pattern}': {why}"));
    let mut out = String::with_capacity(pattern.len() + 16);
    let mut chars = pattern.chars().peekable();
    let mut depth = 0usize;
    let mut class_start = false;

    while let Some(c) = chars.next() {
        let at_class_start = std::mem::take(&mut class_start);
        let in_class = depth > 0;
        match c {
            '\\' => {
                let escaped = chars.next().ok_or_else(|| bad("trailing backslash"))?;
                match escaped {
                    'p' | 'P' => {
                        if chars.next() != Some('{') {
                            return Err(bad("expected '{' after \\p"));
                        }
                        let mut name = String::new();
                        loop {
                            match chars.next() {
                                Some('}') => break,
                                Some(ch) => name.push(ch),
                                None => return Err(bad("unterminated \\p{...}")),
                            }
                        }
                        out.push_str(&property(&name, escaped == 'P', in_class).ok_or_else(|| {
                            bad(&format!("unsupported property '{name}'"))
                        })?);
                    }
                    'i' => push_set(&mut out, NAME_START, false, in_class),
                    'I' => push_set(&mut out, NAME_START, true, in_class),
                    'c' => push_set(&mut out, NAME_CHAR, false, in_class),
                    'C' => push_set(&mut out, NAME_CHAR, true, in_class),
                    's' => push_set(&mut out, XSD_SPACE, false, in_class),
                    'S' => push_set(&mut out, XSD_SPACE, true, in_class),
                    'w' => push_set(&mut out, XSD_NOT_WORD, true, in_class),
                    'W' => push_set(&mut out, XSD_NOT_WORD, false, in_class),
                    'd' | 'D' | 'n' | 'r' | 't' => {
                        out.push('\\');
                        out.push(escaped);
                    }
                    '\\' | '|' | '.' | '-' | '^' | '?' | '*' | '+' | '{' | '}' | '(' | ')' | '['
                    | ']' | '$' => {
                        out.push('\\');
                        out.push(escaped);
                    }
                    other => return Err(bad(&format!("unknown escape '\\{other}'"))),
                }
            }
            '[' if !in_class => {
                depth += 1;
                class_start = true;
                out.push('[');
            }
            '-' if in_class && chars.peek() == Some(&'[') => {
                // class subtraction
                chars.next();
                depth += 1;
                class_start = true;
                out.push_str("--[");
            }
            ']' if in_class => {
                depth -= 1;
                out.push(']');
            }
            '^' if at_class_start => out.push('^'),
            '^' | '$' | '[' | ']' => {
                out.push('\\');
                out.push(c);
            }
            '&' | '~' if in_class => {
                out.push('\\');
                out.push(c);
            }
            '.' if !in_class => out.push_str("[^\\n\\r]"),
            c => out.push(c),
        }
    }
    if depth > 0 {
        return Err(bad("unterminated character class"));
    }
    Ok(out)
}

/// Emit a character set. Positive sets go bare inside a class; negated ones
/// always become a nested `[^...]`.
fn push_set(out: &mut String, set: &str, negated: bool, in_class: bool) {
    match (negated, in_class) {
        (false, true) => out.push_str(set),
        (false, false) => {
            out.push('[');
            out.push_str(set);
            out.push(']');
        }
        (true, _) => {
            out.push_str("[^");
            out.push_str(set);
            out.push(']');
        }
    }
}

fn property(name: &str, negated: bool, in_class: bool) -> Option<String> {
    let Some(block) = name.strip_prefix("Is") else {
        // General categories (`L`, `Nd`, ...) share the same spelling.
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphabetic()) {
            return None;
        }
        return Some(format!("\\{}{{{name}}}", if negated { 'P' } else { 'p' }));
    };
    let folded: String = block
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    let ranges = BLOCKS.iter().find(|(n, _)| *n == folded)?.1;
    let mut out = String::new();
    push_set(&mut out, ranges, negated, in_class);
    Some(out)
}

struct MatchFailure {
    at: usize,
    expected: Vec<String>,
}

struct Matcher<'c, 'e> {
    children: &'c [&'e Element],
}

impl<'c, 'e> Matcher<'c, 'e> {
    /// Match `particle` with its occurrence bounds starting at `pos`.
    fn particle<'s>(
        &self,
        particle: &'s Particle,
        pos: usize,
        out: &mut Vec<(usize, &'s ElementDecl)>,
    ) -> Result<usize, MatchFailure> {
        self.repeat(particle.occurs(), pos, out, |m, pos, out| m.once(particle, pos, out))
    }

    fn group<'s>(
        &self,
        group: &'s Group,
        pos: usize,
        out: &mut Vec<(usize, &'s ElementDecl)>,
    ) -> Result<usize, MatchFailure> {
        self.repeat((group.min, group.max), pos, out, |m, pos, out| {
            m.group_once(group, pos, out)
        })
    }

    fn repeat<'s, F>(
        &self,
        (min, max): (u32, MaxOccurs),
        mut pos: usize,
        out: &mut Vec<(usize, &'s ElementDecl)>,
        once: F,
    ) -> Result<usize, MatchFailure>
    where
        F: Fn(&Self, usize, &mut Vec<(usize, &'s ElementDecl)>) -> Result<usize, MatchFailure>,
    {
        let mut count = 0u32;
        while max.allows(count + 1) {
            let mark = out.len();
            match once(self, pos, out) {
                Ok(next) if next > pos => {
                    pos = next;
                    count += 1;
                }
                // Matched without consuming: further repetitions add nothing.
                Ok(_) => return Ok(pos),
                Err(fail) => {
                    out.truncate(mark);
                    if count >= min {
                        break;
                    }
                    return Err(fail);
                }
            }
        }
        Ok(pos)
    }

    fn once<'s>(
        &self,
        particle: &'s Particle,
        pos: usize,
        out: &mut Vec<(usize, &'s ElementDecl)>,
    ) -> Result<usize, MatchFailure> {
        match particle {
            Particle::Element(decl) => match self.children.get(pos) {
                Some(child) if child.local_name() == decl.name => {
                    out.push((pos, decl));
                    Ok(pos + 1)
                }
                _ => Err(MatchFailure {
                    at: pos,
                    expected: vec![decl.name.clone()],
                }),
            },
            Particle::Any { .. } => match self.children.get(pos) {
                Some(_) => Ok(pos + 1),
                None => Err(MatchFailure {
                    at: pos,
                    expected: vec!["##any".into()],
                }),
            },
            Particle::Group(group) => self.group_once(group, pos, out),
        }
    }

    fn group_once<'s>(
        &self,
        group: &'s Group,
        pos: usize,
        out: &mut Vec<(usize, &'s ElementDecl)>,
    ) -> Result<usize, MatchFailure> {
        match group.kind {
            GroupKind::Sequence => {
                let mut pos = pos;
                for item in &group.items {
                    pos = self.particle(item, pos, out)?;
                }
                Ok(pos)
            }
            GroupKind::Choice => self.choice(group, pos, out),
            GroupKind::All => self.all(group, pos, out),
        }
    }

    fn choice<'s>(
        &self,
        group: &'s Group,
        pos: usize,
        out: &mut Vec<(usize, &'s ElementDecl)>,
    ) -> Result<usize, MatchFailure> {
        let mut expected = Vec::new();
        let mut empty_ok = false;
        for alt in &group.items {
            let mark = out.len();
            match self.particle(alt, pos, out) {
                Ok(next) if next > pos => return Ok(next),
                Ok(_) => {
                    out.truncate(mark);
                    empty_ok = true;
                }
                Err(fail) => {
                    out.truncate(mark);
                    expected.extend(fail.expected);
                }
            }
        }
        if empty_ok {
            Ok(pos)
        } else {
            Err(MatchFailure { at: pos, expected })
        }
    }

    fn all<'s>(
        &self,
        group: &'s Group,
        mut pos: usize,
        out: &mut Vec<(usize, &'s ElementDecl)>,
    ) -> Result<usize, MatchFailure> {
        let mut done = vec![false; group.items.len()];
        loop {
            let mut progressed = false;
            for (i, item) in group.items.iter().enumerate() {
                if done[i] {
                    continue;
                }
                let mark = out.len();
                match self.particle(item, pos, out) {
                    Ok(next) if next > pos => {
                        done[i] = true;
                        pos = next;
                        progressed = true;
                    }
                    _ => out.truncate(mark),
                }
            }
            if !progressed {
                break;
            }
        }
        let missing: Vec<String> = group
            .items
            .iter()
            .zip(&done)
            .filter(|(item, done)| !**done && item.occurs().0 > 0)
            .filter_map(|(item, _)| match item {
                Particle::Element(decl) => Some(decl.name.clone()),
                _ => None,
            })
            .collect();
        if missing.is_empty() {
            Ok(pos)
        } else {
            Err(MatchFailure {
                at: pos,
                expected: missing,
            })
        }
    }
}

// ---------------------------------------------------------------------------
// XSD parsing
// ---------------------------------------------------------------------------

fn xsd_error(message: String) -> EfattureError {
    EfattureError::Xml(format!("schema: {message}"))
}

fn required_name(node: &Element) -> Result<String, EfattureError> {
    node.attribute("name")
        .map(str::to_string)
        .ok_or_else(|| xsd_error(format!("<{}> without name", node.name())))
}

fn parse_occurs(node: &Element) -> Result<(u32, MaxOccurs), EfattureError> {
    let min = match node.attribute("minOccurs") {
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| xsd_error(format!("invalid minOccurs '{v}'")))?,
        None => 1,
    };
    let max = match node.attribute("maxOccurs").map(str::trim) {
        Some("unbounded") => MaxOccurs::Unbounded,
        Some(v) => MaxOccurs::Bounded(
            v.parse()
                .map_err(|_| xsd_error(format!("invalid maxOccurs '{v}'")))?,
        ),
        None => MaxOccurs::Bounded(1),
    };
    Ok((min, max))
}

fn parse_element(node: &Element, globals: &[&Element]) -> Result<ElementDecl, EfattureError> {
    let (min, max) = parse_occurs(node)?;

    if let Some(reference) = node.attribute("ref") {
        let name = local_part(reference).to_string();
        let target = globals
            .iter()
            .find(|g| g.attribute("name") == Some(name.as_str()));
        return match target {
            Some(target) => {
                // Occurrence bounds come from the referencing particle.
                let mut decl = parse_element(target, &[])?;
                decl.min = min;
                decl.max = max;
                Ok(decl)
            }
            None => Ok(ElementDecl {
                name,
                min,
                max,
                ty: TypeRef::Unrestricted,
                foreign: true,
            }),
        };
    }

    let name = required_name(node)?;
    let ty = if let Some(ty) = node.attribute("type") {
        TypeRef::Named(local_part(ty).to_string())
    } else if let Some(complex) = node.children_named("complexType").next() {
        TypeRef::Complex(parse_complex(complex)?)
    } else if let Some(simple) = node.children_named("simpleType").next() {
        TypeRef::Simple(parse_simple(simple)?)
    } else {
        TypeRef::Unrestricted
    };
    Ok(ElementDecl {
        name,
        min,
        max,
        ty,
        foreign: false,
    })
}

fn parse_complex(node: &Element) -> Result<ComplexType, EfattureError> {
    for child in node.children() {
        match child.local_name() {
            "sequence" | "choice" | "all" => {
                return Ok(ComplexType {
                    content: Content::Elements(parse_group(child)?),
                });
            }
            "simpleContent" => {
                let base = child
                    .children()
                    .iter()
                    .find_map(|c| c.attribute("base"))
                    .map_or(TypeRef::Unrestricted, |b| {
                        TypeRef::Named(local_part(b).to_string())
                    });
                return Ok(ComplexType {
                    content: Content::Simple(Box::new(base)),
                });
            }
            "complexContent" => return Ok(ComplexType { content: Content::Open }),
            _ => {}
        }
    }
    Ok(ComplexType {
        content: Content::Empty,
    })
}

fn parse_group(node: &Element) -> Result<Group, EfattureError> {
    let kind = match node.local_name() {
        "sequence" => GroupKind::Sequence,
        "choice" => GroupKind::Choice,
        _ => GroupKind::All,
    };
    let (min, max) = parse_occurs(node)?;
    let mut items = Vec::new();
    for child in node.children() {
        match child.local_name() {
            "element" => items.push(Particle::Element(parse_element(child, &[])?)),
            "sequence" | "choice" | "all" => items.push(Particle::Group(parse_group(child)?)),
            "any" => {
                let (min, max) = parse_occurs(child)?;
                items.push(Particle::Any { min, max });
            }
            _ => {}
        }
    }
    Ok(Group {
        kind,
        min,
        max,
        items,
    })
}

fn parse_simple(node: &Element) -> Result<SimpleType, EfattureError> {
    let mut simple = SimpleType::default();
    let Some(restriction) = node.children_named("restriction").next() else {
        // list / union
        simple.open = true;
        return Ok(simple);
    };
    simple.base = restriction
        .attribute("base")
        .map(|b| local_part(b).to_string());
    let mut patterns = Vec::new();
    for facet in restriction.children() {
        let value = facet.attribute("value").unwrap_or_default();
        match facet.local_name() {
            "enumeration" => simple.enumeration.push(value.to_string()),
            "length" => simple.length = value.trim().parse().ok(),
            "minLength" => simple.min_length = value.trim().parse().ok(),
            "maxLength" => simple.max_length = value.trim().parse().ok(),
            "pattern" => patterns.push(value.to_string()),
            _ => {}
        }
    }
    if !patterns.is_empty() {
        simple.pattern = Some(Pattern::compile(patterns)?);
    }
    Ok(simple)
}

/// Validates documents against a [`StructuralSchema`], keying each violation
/// by its numeric code.
#[derive(Debug, Clone)]
pub struct SchemaValidator {
    schema: Arc<StructuralSchema>,
}

impl SchemaValidator {
    pub fn new(schema: Arc<StructuralSchema>) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &StructuralSchema {
        &self.schema
    }
}

impl DocumentValidator for SchemaValidator {
    fn name(&self) -> &'static str {
        "schema"
    }

    fn errors(&self, document: &XmlDocument) -> Result<ValidationReport, EfattureError> {
        let mut report = ValidationReport::new();
        for v in self.schema.violations(document.root()) {
            report.insert(v.code.to_string(), v.message);
        }
        Ok(report)
    }
}
