//! Generic XML reader and writer.
//!
//! XML has no native notion of mappings or sequences, so the reader folds
//! elements into values with these conventions:
//!
//! - an element with neither attributes nor child elements is its text, or
//!   `Null` when empty
//! - otherwise it is a mapping: `@name` keys for attributes, then child
//!   elements in document order, then `#text` for any character data
//! - repeated sibling elements collapse into a sequence
//!
//! ```rust
//! use canonconv::{value, xml};
//!
//! let doc = xml::from_str(r#"<cfg version="2"><host>a</host><host>b</host><debug/></cfg>"#).unwrap();
//! assert_eq!(doc, value!({"cfg": {"@version": "2", "host": ["a", "b"], "debug": null}}));
//! ```
//!
//! No type inference happens on read: numbers and booleans stay text. On
//! write, bytes become base64 and timestamps ISO-8601 text.
//!
//! The writer has two layouts, chosen by [`XmlLayout`]. The root-driven
//! layout is the inverse of the reader. The tag-driven layout wraps
//! everything in one element and writes every key as a plain child element.

use crate::error::{Error, Result};
use crate::options::{Format, XmlLayout, XmlReadOptions, XmlWriteOptions};
use crate::{transform, Mapping, Value};
use roxmltree::{Document, Node, ParsingOptions};
use std::io::{Read, Write};

const DECLARATION: &str = r#"<?xml version="1.0" encoding="utf-8"?>"#;
const DEFAULT_ROOT: &str = "root";
const ITEM_TAG: &str = "item";
const TEXT_KEY: &str = "#text";

/// Reads an XML document from `reader`.
pub fn read<R: Read>(reader: R, options: &XmlReadOptions) -> Result<Value> {
    let buf = crate::read_all(reader)?;
    let text = std::str::from_utf8(&buf)
        .map_err(|e| Error::parse(Format::Xml, format!("invalid UTF-8: {}", e)))?;
    from_str_with(text, options)
}

/// Parses an XML document with default options.
pub fn from_str(text: &str) -> Result<Value> {
    from_str_with(text, &XmlReadOptions::default())
}

/// Parses an XML document.
pub fn from_str_with(text: &str, options: &XmlReadOptions) -> Result<Value> {
    log::debug!(
        "reading XML: {} bytes, namespaces {}",
        text.len(),
        options.namespaces
    );
    let text = text.strip_prefix('\u{FEFF}').unwrap_or(text);
    let parsing = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc = Document::parse_with_options(text, parsing).map_err(parse_error)?;

    let root = doc.root_element();
    let mut map = Mapping::with_capacity(1);
    map.insert(
        element_name(root, options.namespaces),
        fold_element(root, options.namespaces),
    );
    Ok(Value::Mapping(map))
}

/// Writes `value` as XML to `writer`.
pub fn write<W: Write>(value: &Value, writer: W, options: &XmlWriteOptions) -> Result<()> {
    let text = to_string(value, options)?;
    crate::write_all(writer, text.as_bytes())
}

/// Renders `value` as an XML document.
pub fn to_string(value: &Value, options: &XmlWriteOptions) -> Result<String> {
    let value = if options.sort {
        value.sorted()
    } else {
        value.clone()
    };
    let value = transform::prepare_for_text(value);

    let mut emitter = Emitter {
        output: String::with_capacity(256),
        pretty: !options.minify,
        attributes: matches!(options.layout, XmlLayout::RootDriven { .. }),
    };

    match &options.layout {
        XmlLayout::RootDriven { root } => {
            if let Some(root) = root {
                check_name("root", root)?;
            }
            let (name, content) = choose_root(&value, root.as_deref());
            emitter.output.push_str(DECLARATION);
            emitter.output.push('\n');
            emitter.element(&sanitize_name(name), content, 0)?;
        }
        XmlLayout::TagDriven { wrap_tag } => {
            check_name("wrap_tag", wrap_tag)?;
            emitter.element(wrap_tag, &value, 0)?;
        }
    }
    log::debug!("wrote XML: {} bytes", emitter.output.len());
    Ok(emitter.output)
}

fn parse_error(err: roxmltree::Error) -> Error {
    let pos = err.pos();
    let message = err.to_string();
    let suffix = format!(" at {}:{}", pos.row, pos.col);
    let message = message.strip_suffix(&suffix).unwrap_or(&message);
    Error::parse_at(Format::Xml, pos.row as usize, pos.col as usize, message)
}

fn qualify(node: Node, local: &str, namespace: Option<&str>, keep_prefix: bool) -> String {
    if keep_prefix {
        if let Some(prefix) = namespace.and_then(|uri| node.lookup_prefix(uri)) {
            if !prefix.is_empty() {
                return format!("{}:{}", prefix, local);
            }
        }
    }
    local.to_string()
}

fn element_name(node: Node, keep_prefix: bool) -> String {
    let tag = node.tag_name();
    qualify(node, tag.name(), tag.namespace(), keep_prefix)
}

fn fold_element(node: Node, namespaces: bool) -> Value {
    let mut map = Mapping::new();

    if namespaces {
        let inherited: Vec<(Option<&str>, &str)> = node
            .parent_element()
            .map(|parent| parent.namespaces().map(|ns| (ns.name(), ns.uri())).collect())
            .unwrap_or_default();
        for ns in node.namespaces() {
            if ns.name() == Some("xml") || inherited.contains(&(ns.name(), ns.uri())) {
                continue;
            }
            let key = match ns.name() {
                Some(prefix) => format!("@xmlns:{}", prefix),
                None => "@xmlns".to_string(),
            };
            map.insert(key, Value::from(ns.uri()));
        }
    }

    for attr in node.attributes() {
        let name = qualify(node, attr.name(), attr.namespace(), namespaces);
        map.insert(format!("@{}", name), Value::from(attr.value()));
    }

    let mut text = String::new();
    for child in node.children() {
        if child.is_element() {
            let name = element_name(child, namespaces);
            let value = fold_element(child, namespaces);
            match map.get_mut(&name) {
                Some(Value::Sequence(items)) => items.push(value),
                Some(existing) => {
                    let first = std::mem::take(existing);
                    *existing = Value::Sequence(vec![first, value]);
                }
                None => {
                    map.insert(name, value);
                }
            }
        } else if child.is_text() {
            text.push_str(child.text().unwrap_or_default());
        }
    }

    let text = text.trim();
    if map.is_empty() {
        if text.is_empty() {
            Value::Null
        } else {
            Value::from(text)
        }
    } else {
        if !text.is_empty() {
            map.insert(TEXT_KEY.to_string(), Value::from(text));
        }
        Value::Mapping(map)
    }
}

/// Picks the root element name and the value written inside it.
fn choose_root<'a>(value: &'a Value, root: Option<&'a str>) -> (&'a str, &'a Value) {
    let single = value
        .as_mapping()
        .filter(|map| map.len() == 1)
        .and_then(|map| map.iter().next());

    match (root, single) {
        (Some(root), Some((key, inner))) if key == root => (root, inner),
        (Some(root), _) => (root, value),
        (None, Some((key, inner))) => (key.as_str(), inner),
        (None, None) => (DEFAULT_ROOT, value),
    }
}

fn check_name(option: &str, name: &str) -> Result<()> {
    if is_xml_name(name) {
        Ok(())
    } else {
        Err(Error::config(format!(
            "{} '{}' is not a valid XML element name",
            option, name
        )))
    }
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == ':'
}

fn is_name_char(c: char) -> bool {
    is_name_start(c) || c.is_alphanumeric() || matches!(c, '-' | '.' | '\u{B7}')
}

/// Returns `true` if `name` is a valid XML element name.
pub(crate) fn is_xml_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => is_name_start(first) && chars.all(is_name_char),
        None => false,
    }
}

/// Replaces characters that cannot appear in an XML name with `_`, then
/// prefixes `_` when the result cannot start a name.
///
/// ```rust
/// use canonconv::xml::sanitize_name;
///
/// assert_eq!(sanitize_name("first name"), "first_name");
/// assert_eq!(sanitize_name("2nd"), "_2nd");
/// assert_eq!(sanitize_name("@id"), "_id");
/// assert_eq!(sanitize_name(""), "_");
/// ```
#[must_use]
pub fn sanitize_name(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| if is_name_char(c) { c } else { '_' })
        .collect();
    match replaced.chars().next() {
        Some(first) if is_name_start(first) => replaced,
        _ => format!("_{}", replaced),
    }
}

struct Emitter {
    output: String,
    pretty: bool,
    /// Treat `@key` and `#text` entries as attributes and character data.
    attributes: bool,
}

impl Emitter {
    fn indent(&mut self, depth: usize) {
        if self.pretty {
            self.output.extend(std::iter::repeat("  ").take(depth));
        }
    }

    fn newline(&mut self) {
        if self.pretty {
            self.output.push('\n');
        }
    }

    fn open(&mut self, name: &str, attrs: &[(String, String)]) {
        self.output.push('<');
        self.output.push_str(name);
        for (key, value) in attrs {
            self.output.push(' ');
            self.output.push_str(key);
            self.output.push_str("=\"");
            escape_into(&mut self.output, value, true);
            self.output.push('"');
        }
    }

    fn empty(&mut self, name: &str, attrs: &[(String, String)], depth: usize) {
        self.indent(depth);
        self.open(name, attrs);
        if self.pretty {
            self.output.push_str("></");
            self.output.push_str(name);
            self.output.push('>');
        } else {
            self.output.push_str("/>");
        }
        self.newline();
    }

    fn close(&mut self, name: &str) {
        self.output.push_str("</");
        self.output.push_str(name);
        self.output.push('>');
    }

    fn element(&mut self, name: &str, value: &Value, depth: usize) -> Result<()> {
        match value {
            Value::Mapping(map) => self.mapping_element(name, map, depth),
            Value::Sequence(items) if items.is_empty() => {
                self.empty(name, &[], depth);
                Ok(())
            }
            Value::Sequence(items) => {
                self.indent(depth);
                self.open(name, &[]);
                self.output.push('>');
                self.newline();
                for item in items {
                    self.element(ITEM_TAG, item, depth + 1)?;
                }
                self.indent(depth);
                self.close(name);
                self.newline();
                Ok(())
            }
            Value::Null => {
                self.empty(name, &[], depth);
                Ok(())
            }
            scalar => {
                let text = scalar.scalar_text().unwrap_or_default();
                check_text(&text)?;
                self.indent(depth);
                self.open(name, &[]);
                self.output.push('>');
                escape_into(&mut self.output, &text, false);
                self.close(name);
                self.newline();
                Ok(())
            }
        }
    }

    fn mapping_element(&mut self, name: &str, map: &Mapping, depth: usize) -> Result<()> {
        let mut attrs = Vec::new();
        let mut text = String::new();
        let mut children = Vec::new();

        for (key, value) in map {
            if self.attributes {
                if let Some(attr) = key.strip_prefix('@') {
                    let rendered = attribute_text(value);
                    check_text(&rendered)?;
                    attrs.push((sanitize_name(attr), rendered));
                    continue;
                }
                if key == TEXT_KEY {
                    text = attribute_text(value);
                    check_text(&text)?;
                    continue;
                }
            }
            children.push((sanitize_name(key), value));
        }

        if children.is_empty() && text.is_empty() {
            self.empty(name, &attrs, depth);
            return Ok(());
        }

        self.indent(depth);
        self.open(name, &attrs);
        self.output.push('>');
        if children.is_empty() {
            escape_into(&mut self.output, &text, false);
        } else {
            self.newline();
            for (key, value) in children {
                match value {
                    Value::Sequence(items) => {
                        for item in items {
                            self.element(&key, item, depth + 1)?;
                        }
                    }
                    other => self.element(&key, other, depth + 1)?,
                }
            }
            if !text.is_empty() {
                self.indent(depth + 1);
                escape_into(&mut self.output, &text, false);
                self.newline();
            }
            self.indent(depth);
        }
        self.close(name);
        self.newline();
        Ok(())
    }
}

fn attribute_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        other => other.scalar_text().unwrap_or_else(|| other.to_string()),
    }
}

/// XML 1.0 cannot carry most C0 control characters, escaped or not.
fn check_text(text: &str) -> Result<()> {
    match text
        .chars()
        .find(|&c| c.is_control() && !matches!(c, '\t' | '\n' | '\r') && (c as u32) < 0x20)
    {
        Some(c) => Err(Error::unsupported(
            Format::Xml,
            format!("control character U+{:04X} in text", c as u32),
        )),
        None => Ok(()),
    }
}

fn escape_into(out: &mut String, text: &str, attribute: bool) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            '\n' if attribute => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            '\t' if attribute => out.push_str("&#9;"),
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn map(entries: Vec<(&str, Value)>) -> Value {
        Value::Mapping(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }

    fn pretty() -> XmlWriteOptions {
        XmlWriteOptions::new()
    }

    fn compact() -> XmlWriteOptions {
        XmlWriteOptions::new().with_minify(true)
    }

    #[test]
    fn test_fold_attributes_children_text() {
        let value = from_str(r#"<a id="1">hello<b>x</b> world<c/></a>"#).unwrap();
        assert_eq!(
            value,
            map(vec![(
                "a",
                map(vec![
                    ("@id", Value::from("1")),
                    ("b", Value::from("x")),
                    ("c", Value::Null),
                    ("#text", Value::from("hello world")),
                ])
            )])
        );
    }

    #[test]
    fn test_repeated_siblings_keep_first_position() {
        let value = from_str("<r><x>1</x><y>2</y><x>3</x><x>4</x></r>").unwrap();
        let r = value.as_mapping().unwrap().get("r").unwrap().as_mapping().unwrap();
        assert_eq!(r.keys().collect::<Vec<_>>(), ["x", "y"]);
        assert_eq!(
            r.get("x"),
            Some(&Value::Sequence(vec![
                Value::from("1"),
                Value::from("3"),
                Value::from("4")
            ]))
        );
    }

    #[test]
    fn test_cdata_comments_and_pi() {
        let value = from_str("<?xml version=\"1.0\"?><r><!-- c --><?pi x?><![CDATA[<raw>]]></r>").unwrap();
        assert_eq!(value, map(vec![("r", Value::from("<raw>"))]));
    }

    #[test]
    fn test_namespaces() {
        let text = r#"<p:doc xmlns:p="urn:p" xmlns="urn:d"><p:item p:kind="k">v</p:item><plain/></p:doc>"#;

        let local = from_str(text).unwrap();
        assert_eq!(
            local,
            map(vec![(
                "doc",
                map(vec![
                    ("item", map(vec![("@kind", Value::from("k")), ("#text", Value::from("v"))])),
                    ("plain", Value::Null),
                ])
            )])
        );

        let qualified = from_str_with(text, &XmlReadOptions::new().with_namespaces(true)).unwrap();
        let doc = qualified.as_mapping().unwrap().get("p:doc").unwrap().as_mapping().unwrap();
        assert_eq!(doc.get("@xmlns:p"), Some(&Value::from("urn:p")));
        assert_eq!(doc.get("@xmlns"), Some(&Value::from("urn:d")));
        let item = doc.get("p:item").unwrap().as_mapping().unwrap();
        assert_eq!(item.get("@p:kind"), Some(&Value::from("k")));
        assert!(item.get("@xmlns:p").is_none());
        assert!(doc.contains_key("plain"));
    }

    #[test]
    fn test_parse_error() {
        let err = from_str("<a><b></a>").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        match err {
            Error::Parse { line, column, .. } => {
                assert_eq!(line, Some(1));
                assert!(column.is_some());
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(from_str("").unwrap_err().kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_root_driven_pretty() {
        let value = map(vec![(
            "config",
            map(vec![
                ("@version", Value::Int(2)),
                ("name", Value::from("a & b")),
                ("ports", Value::Sequence(vec![Value::Int(80), Value::Int(443)])),
                ("empty", Value::Null),
                ("ratio", Value::Float(1.0)),
            ]),
        )]);
        let out = to_string(&value, &pretty()).unwrap();
        assert_eq!(
            out,
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
             <config version=\"2\">\n\
             \x20 <name>a &amp; b</name>\n\
             \x20 <ports>80</ports>\n\
             \x20 <ports>443</ports>\n\
             \x20 <empty></empty>\n\
             \x20 <ratio>1.0</ratio>\n\
             </config>\n"
        );
    }

    #[test]
    fn test_root_driven_minified() {
        let value = map(vec![("a", Value::Int(1)), ("b", Value::Null)]);
        let out = to_string(&value, &compact()).unwrap();
        assert_eq!(
            out,
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<root><a>1</a><b/></root>"
        );
    }

    #[test]
    fn test_explicit_root() {
        let value = map(vec![("data", map(vec![("x", Value::Int(1))]))]);
        let out = to_string(&value, &compact().with_root("data")).unwrap();
        assert!(out.ends_with("<data><x>1</x></data>"), "{out}");

        let out = to_string(&value, &compact().with_root("doc")).unwrap();
        assert!(out.ends_with("<doc><data><x>1</x></data></doc>"), "{out}");
    }

    #[test]
    fn test_top_level_sequence_uses_items() {
        let value = Value::Sequence(vec![Value::from("a"), Value::from("b")]);
        let out = to_string(&value, &compact()).unwrap();
        assert!(out.ends_with("<root><item>a</item><item>b</item></root>"), "{out}");
    }

    #[test]
    fn test_tag_driven() {
        let value = map(vec![
            ("@id", Value::Int(7)),
            ("names", Value::Sequence(vec![Value::from("x"), Value::from("y")])),
            ("nested", Value::Sequence(vec![Value::Sequence(vec![Value::Int(1)])])),
        ]);
        let out = to_string(&value, &compact().with_wrap_tag("export")).unwrap();
        assert_eq!(
            out,
            "<export><_id>7</_id><names>x</names><names>y</names><nested><item>1</item></nested></export>"
        );
    }

    #[test]
    fn test_bytes_and_timestamps_become_text() {
        let ts = crate::Timestamp::parse_iso8601("2022-01-01T00:00:00Z").unwrap();
        let value = map(vec![
            ("blob", Value::Bytes(b"hi".to_vec())),
            ("at", Value::Timestamp(ts)),
        ]);
        let out = to_string(&value, &compact()).unwrap();
        assert!(out.contains("<blob>aGk=</blob><at>2022-01-01T00:00:00Z</at>"), "{out}");
    }

    #[test]
    fn test_invalid_names() {
        let value = map(vec![("first name", Value::Int(1)), ("1x", Value::Int(2))]);
        let out = to_string(&value, &compact()).unwrap();
        assert!(out.contains("<first_name>1</first_name><_1x>2</_1x>"), "{out}");

        let err = to_string(&value, &compact().with_wrap_tag("bad tag")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        let err = to_string(&value, &compact().with_root("")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_escaping_round_trip() {
        let value = map(vec![(
            "r",
            map(vec![
                ("@q", Value::from("say \"hi\" <now>")),
                ("t", Value::from("1 < 2 && 3 > 2")),
            ]),
        )]);
        let out = to_string(&value, &pretty()).unwrap();
        assert_eq!(from_str(&out).unwrap(), value);
    }

    #[test]
    fn test_control_characters_rejected() {
        let err = to_string(&Value::from("bell\u{7}"), &compact()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedValue);
    }
}
