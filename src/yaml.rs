//! YAML reader and writer.
//!
//! Reading is event based: `yaml-rust2` produces parser events which are
//! folded into a [`Value`] tree, so mapping order is document order and tags
//! are seen before the built-in resolution runs. Plain scalars resolve with
//! the YAML 1.1 rules (`yes`/`no`/`on`/`off` are booleans, `0123` is octal,
//! date-shaped text is a timestamp); quoted scalars are always text. Explicit tags win:
//!
//! ```yaml
//! icon: !!binary R0lGODlh
//! when: !!timestamp 2001-12-14 21:59:43.10 -5
//! zip: !!str 01234
//! ```
//!
//! Anchors and aliases are expanded and `<<` merge keys applied. Only the
//! first document of a stream is read.
//!
//! Writing uses block style, or flow style when minified. Text that would
//! read back as another kind is double-quoted, so every value survives a
//! round trip:
//!
//! ```rust
//! use canonconv::{value, yaml, YamlWriteOptions};
//!
//! let doc = value!({"port": 8080, "enabled": "yes", "tags": ["a", "b"]});
//! let text = yaml::to_string(&doc, &YamlWriteOptions::new()).unwrap();
//! assert_eq!(text, "port: 8080\nenabled: \"yes\"\ntags:\n  - a\n  - b\n");
//! assert_eq!(yaml::from_str(&text).unwrap(), doc);
//! ```

use crate::error::{Error, Result};
use crate::options::{Format, YamlReadOptions, YamlWriteOptions};
use crate::value::float_text;
use crate::{Mapping, Timestamp, Value};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::collections::HashMap;
use std::io::{Read, Write};
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser};
use yaml_rust2::scanner::{Marker, ScanError, TScalarStyle};

const CORE_TAG_PREFIX: &str = "tag:yaml.org,2002:";

/// Reads the first YAML document from `reader`.
pub fn read<R: Read>(reader: R, _options: &YamlReadOptions) -> Result<Value> {
    let buf = crate::read_all(reader)?;
    let text = std::str::from_utf8(&buf)
        .map_err(|e| Error::parse(Format::Yaml, format!("invalid UTF-8: {}", e)))?;
    from_str(text)
}

/// Parses the first YAML document in `text`.
pub fn from_str(text: &str) -> Result<Value> {
    log::debug!("reading YAML: {} bytes", text.len());
    let text = text.strip_prefix('\u{FEFF}').unwrap_or(text);

    let mut sink = EventSink::default();
    Parser::new(text.chars())
        .load(&mut sink, false)
        .map_err(scan_error)?;

    let mut builder = Builder {
        events: sink.events.into_iter(),
        anchors: HashMap::new(),
    };
    builder.document()
}

/// Writes `value` as a YAML document to `writer`.
pub fn write<W: Write>(value: &Value, writer: W, options: &YamlWriteOptions) -> Result<()> {
    let text = to_string(value, options)?;
    crate::write_all(writer, text.as_bytes())
}

/// Renders `value` as a YAML document.
pub fn to_string(value: &Value, options: &YamlWriteOptions) -> Result<String> {
    let sorted;
    let value = if options.sort {
        sorted = value.sorted();
        &sorted
    } else {
        value
    };

    let mut emitter = Emitter::new(options.minify);
    if options.minify {
        emitter.flow(value);
        emitter.output.push('\n');
    } else {
        emitter.document(value);
    }
    log::debug!("wrote YAML: {} bytes", emitter.output.len());
    Ok(emitter.output)
}

fn scan_error(err: ScanError) -> Error {
    let marker = err.marker();
    let message = err.to_string();
    let message = message.split(" at byte ").next().unwrap_or(&message).to_string();
    Error::parse_at(Format::Yaml, marker.line(), marker.col() + 1, message)
}

fn error_at(mark: Marker, message: impl std::fmt::Display) -> Error {
    Error::parse_at(Format::Yaml, mark.line(), mark.col() + 1, message)
}

#[derive(Default)]
struct EventSink {
    events: Vec<(Event, Marker)>,
}

impl MarkedEventReceiver for EventSink {
    fn on_event(&mut self, ev: Event, mark: Marker) {
        self.events.push((ev, mark));
    }
}

/// Folds a recorded event stream into a value tree.
struct Builder {
    events: std::vec::IntoIter<(Event, Marker)>,
    anchors: HashMap<usize, Value>,
}

impl Builder {
    fn document(&mut self) -> Result<Value> {
        while let Some((ev, mark)) = self.events.next() {
            match ev {
                Event::StreamStart | Event::DocumentStart { .. } | Event::Nothing => continue,
                Event::StreamEnd | Event::DocumentEnd => return Ok(Value::Null),
                ev => return self.node(ev, mark),
            }
        }
        Ok(Value::Null)
    }

    fn next(&mut self) -> Result<(Event, Marker)> {
        self.events
            .next()
            .ok_or_else(|| Error::parse(Format::Yaml, "unexpected end of stream"))
    }

    fn remember(&mut self, anchor: usize, value: &Value) {
        if anchor > 0 {
            self.anchors.insert(anchor, value.clone());
        }
    }

    fn node(&mut self, ev: Event, mark: Marker) -> Result<Value> {
        match ev {
            Event::Scalar(text, style, anchor, tag) => {
                let tag = tag.as_ref().and_then(|t| core_tag(&t.handle, &t.suffix));
                let value = resolve_scalar(text, style, tag, mark)?;
                self.remember(anchor, &value);
                Ok(value)
            }
            Event::SequenceStart(anchor, _) => {
                let mut items = Vec::new();
                loop {
                    let (ev, mark) = self.next()?;
                    if matches!(ev, Event::SequenceEnd) {
                        break;
                    }
                    items.push(self.node(ev, mark)?);
                }
                let value = Value::Sequence(items);
                self.remember(anchor, &value);
                Ok(value)
            }
            Event::MappingStart(anchor, _) => {
                let value = Value::Mapping(self.mapping()?);
                self.remember(anchor, &value);
                Ok(value)
            }
            Event::Alias(id) => self
                .anchors
                .get(&id)
                .cloned()
                .ok_or_else(|| error_at(mark, "alias refers to an unknown anchor")),
            other => Err(error_at(mark, format!("unexpected event {:?}", other))),
        }
    }

    fn mapping(&mut self) -> Result<Mapping> {
        let mut explicit = Mapping::new();
        let mut merged = Mapping::new();

        loop {
            let (ev, mark) = self.next()?;
            if matches!(ev, Event::MappingEnd) {
                break;
            }
            let is_merge = matches!(
                &ev,
                Event::Scalar(text, TScalarStyle::Plain, _, None) if text == "<<"
            );
            let key = self.node(ev, mark)?;
            let (ev, value_mark) = self.next()?;
            let value = self.node(ev, value_mark)?;

            if is_merge {
                merge_into(&mut merged, value, value_mark)?;
            } else {
                explicit.insert(key_text(key), value);
            }
        }

        if merged.is_empty() {
            return Ok(explicit);
        }
        for (key, value) in explicit {
            merged.insert(key, value);
        }
        Ok(merged)
    }
}

/// Applies a `<<` value: a mapping, or a sequence of mappings where earlier
/// entries win.
fn merge_into(merged: &mut Mapping, source: Value, mark: Marker) -> Result<()> {
    match source {
        Value::Mapping(map) => {
            for (key, value) in map {
                if !merged.contains_key(&key) {
                    merged.insert(key, value);
                }
            }
            Ok(())
        }
        Value::Sequence(items) => items
            .into_iter()
            .try_for_each(|item| match item {
                Value::Mapping(_) => merge_into(merged, item, mark),
                other => Err(error_at(
                    mark,
                    format!("merge key expects mappings, found {}", other.type_name()),
                )),
            }),
        other => Err(error_at(
            mark,
            format!("merge key expects a mapping, found {}", other.type_name()),
        )),
    }
}

fn key_text(key: Value) -> String {
    match key {
        Value::Text(text) => text,
        Value::Null => "null".to_string(),
        other => other.scalar_text().unwrap_or_else(|| other.to_string()),
    }
}

/// Returns the suffix of a core-schema tag (`!!int` -> `int`).
fn core_tag<'a>(handle: &str, suffix: &'a str) -> Option<&'a str> {
    match handle {
        "!!" | CORE_TAG_PREFIX => Some(suffix),
        "!" => suffix.strip_prefix(CORE_TAG_PREFIX),
        "" => suffix.strip_prefix(CORE_TAG_PREFIX),
        _ => None,
    }
}

fn resolve_scalar(text: String, style: TScalarStyle, tag: Option<&str>, mark: Marker) -> Result<Value> {
    let invalid = |kind: &str, text: &str| error_at(mark, format!("invalid !!{} value '{}'", kind, text));

    match tag {
        Some("str" | "regex") => Ok(Value::Text(text)),
        Some("binary") => {
            let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
            STANDARD
                .decode(compact)
                .map(Value::Bytes)
                .map_err(|e| error_at(mark, format!("invalid !!binary payload: {}", e)))
        }
        Some("timestamp") => Timestamp::parse_iso8601(&text)
            .map(Value::Timestamp)
            .ok_or_else(|| invalid("timestamp", &text)),
        Some("int") => parse_int(&text)
            .map(Value::Int)
            .ok_or_else(|| invalid("int", &text)),
        Some("float") => parse_float(&text)
            .or_else(|| parse_int(&text).map(|i| i as f64))
            .map(Value::Float)
            .ok_or_else(|| invalid("float", &text)),
        Some("bool") => parse_bool(&text)
            .map(Value::Bool)
            .ok_or_else(|| invalid("bool", &text)),
        Some("null") => Ok(Value::Null),
        _ if style != TScalarStyle::Plain => Ok(Value::Text(text)),
        _ => Ok(resolve_plain(text)),
    }
}

/// YAML 1.1 implicit typing of an untagged plain scalar.
pub(crate) fn resolve_plain(text: String) -> Value {
    if is_null(&text) {
        return Value::Null;
    }
    if let Some(b) = parse_bool(&text) {
        return Value::Bool(b);
    }
    if let Some(i) = parse_int(&text) {
        return Value::Int(i);
    }
    if looks_like_decimal(&text) {
        if let Some(f) = parse_float(&text) {
            return Value::Float(f);
        }
    }
    if let Some(f) = parse_special_float(&text) {
        return Value::Float(f);
    }
    if text.as_bytes().first().map_or(false, u8::is_ascii_digit) {
        if let Some(ts) = Timestamp::parse_iso8601(&text) {
            return Value::Timestamp(ts);
        }
    }
    Value::Text(text)
}

fn is_null(text: &str) -> bool {
    matches!(text, "" | "~" | "null" | "Null" | "NULL")
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" => Some(true),
        "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_int(text: &str) -> Option<i64> {
    let (negative, body) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };
    let (radix, digits) = if let Some(hex) = body.strip_prefix("0x") {
        (16, hex)
    } else if let Some(oct) = body.strip_prefix("0o") {
        (8, oct)
    } else if body.len() > 1 && body.starts_with('0') {
        // YAML 1.1 octal
        (8, &body[1..])
    } else {
        (10, body)
    };
    if digits.starts_with('_') {
        return None;
    }
    let digits: String = digits.chars().filter(|&c| c != '_').collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    let magnitude = i128::from_str_radix(&digits, radix).ok()?;
    let value = if negative { -magnitude } else { magnitude };
    i64::try_from(value).ok()
}

/// `[-+]? (digits [. digits?] | . digits) ([eE] [-+]? digits)?`, with `_`
/// allowed between digits.
fn looks_like_decimal(text: &str) -> bool {
    let body = text.strip_prefix(['-', '+']).unwrap_or(text);
    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(pos) => (&body[..pos], Some(&body[pos + 1..])),
        None => (body, None),
    };
    let (whole, fraction) = match mantissa.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (mantissa, None),
    };
    let digits = |s: &str| s.chars().all(|c| c.is_ascii_digit() || c == '_');
    if fraction.is_none() && exponent.is_none() && whole.len() > 1 && whole.starts_with('0') {
        return false;
    }
    let whole_ok = whole.is_empty() || (whole.starts_with(|c: char| c.is_ascii_digit()) && digits(whole));
    let fraction_ok = fraction.map_or(true, |f| digits(f) && !f.starts_with('_'));
    let has_digits = whole.chars().any(|c| c.is_ascii_digit())
        || fraction.map_or(false, |f| f.chars().any(|c| c.is_ascii_digit()));
    let exponent_ok = exponent.map_or(true, |e| {
        let e = e.strip_prefix(['-', '+']).unwrap_or(e);
        !e.is_empty() && e.chars().all(|c| c.is_ascii_digit())
    });
    whole_ok && fraction_ok && has_digits && exponent_ok
}

fn parse_float(text: &str) -> Option<f64> {
    if let Some(f) = parse_special_float(text) {
        return Some(f);
    }
    let cleaned: String = text.chars().filter(|&c| c != '_').collect();
    cleaned.parse::<f64>().ok().filter(|_| looks_like_decimal(text))
}

fn parse_special_float(text: &str) -> Option<f64> {
    match text {
        ".inf" | ".Inf" | ".INF" | "+.inf" | "+.Inf" | "+.INF" => Some(f64::INFINITY),
        "-.inf" | "-.Inf" | "-.INF" => Some(f64::NEG_INFINITY),
        ".nan" | ".NaN" | ".NAN" => Some(f64::NAN),
        _ => None,
    }
}

/// Block and flow style YAML writer.
struct Emitter {
    output: String,
    /// Flow style only writes word-like text plain.
    flow: bool,
}

impl Emitter {
    fn new(flow: bool) -> Self {
        Emitter {
            output: String::with_capacity(256),
            flow,
        }
    }

    fn pad(&mut self, indent: usize) {
        self.output.extend(std::iter::repeat(' ').take(indent));
    }

    fn document(&mut self, value: &Value) {
        match value {
            Value::Mapping(map) if !map.is_empty() => self.block_mapping(map, 0, false),
            Value::Sequence(items) if !items.is_empty() => self.block_sequence(items, 0, false),
            scalar => {
                self.scalar(scalar);
                self.output.push('\n');
            }
        }
    }

    /// Writes a non-empty mapping. With `inline_first` the first entry
    /// continues the current line (after a `- ` marker).
    fn block_mapping(&mut self, map: &Mapping, indent: usize, inline_first: bool) {
        for (i, (key, value)) in map.iter().enumerate() {
            if i > 0 || !inline_first {
                self.pad(indent);
            }
            self.string(key);
            self.output.push(':');
            match value {
                Value::Mapping(inner) if !inner.is_empty() => {
                    self.output.push('\n');
                    self.block_mapping(inner, indent + 2, false);
                }
                Value::Sequence(items) if !items.is_empty() => {
                    self.output.push('\n');
                    self.block_sequence(items, indent + 2, false);
                }
                scalar => {
                    self.output.push(' ');
                    self.scalar(scalar);
                    self.output.push('\n');
                }
            }
        }
    }

    fn block_sequence(&mut self, items: &[Value], indent: usize, inline_first: bool) {
        for (i, item) in items.iter().enumerate() {
            if i > 0 || !inline_first {
                self.pad(indent);
            }
            self.output.push_str("- ");
            match item {
                Value::Mapping(inner) if !inner.is_empty() => {
                    self.block_mapping(inner, indent + 2, true);
                }
                Value::Sequence(inner) if !inner.is_empty() => {
                    self.block_sequence(inner, indent + 2, true);
                }
                scalar => {
                    self.scalar(scalar);
                    self.output.push('\n');
                }
            }
        }
    }

    fn flow(&mut self, value: &Value) {
        match value {
            Value::Mapping(map) if !map.is_empty() => {
                self.output.push('{');
                for (i, (key, item)) in map.iter().enumerate() {
                    if i > 0 {
                        self.output.push_str(", ");
                    }
                    self.string(key);
                    self.output.push_str(": ");
                    self.flow(item);
                }
                self.output.push('}');
            }
            Value::Sequence(items) if !items.is_empty() => {
                self.output.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.output.push_str(", ");
                    }
                    self.flow(item);
                }
                self.output.push(']');
            }
            scalar => self.scalar(scalar),
        }
    }

    /// Writes a scalar or an empty container on the current line.
    fn scalar(&mut self, value: &Value) {
        match value {
            Value::Null => self.output.push_str("null"),
            Value::Bool(b) => self.output.push_str(if *b { "true" } else { "false" }),
            Value::Int(i) => self.output.push_str(&i.to_string()),
            Value::Float(f) if f.is_nan() => self.output.push_str(".nan"),
            Value::Float(f) if f.is_infinite() => {
                self.output.push_str(if *f > 0.0 { ".inf" } else { "-.inf" })
            }
            Value::Float(f) => self.output.push_str(&float_text(*f)),
            Value::Text(s) => self.string(s),
            Value::Bytes(bytes) if bytes.is_empty() => self.output.push_str("!!binary \"\""),
            Value::Bytes(bytes) => {
                self.output.push_str("!!binary ");
                self.output.push_str(&STANDARD.encode(bytes));
            }
            Value::Timestamp(ts) if self.flow => {
                self.output.push_str("!!timestamp \"");
                self.output.push_str(&ts.to_iso8601());
                self.output.push('"');
            }
            Value::Timestamp(ts) => {
                self.output.push_str("!!timestamp ");
                self.output.push_str(&ts.to_iso8601());
            }
            Value::Sequence(_) => self.output.push_str("[]"),
            Value::Mapping(_) => self.output.push_str("{}"),
        }
    }

    fn string(&mut self, s: &str) {
        if !needs_quotes(s) && !(self.flow && !is_flow_plain(s)) {
            self.output.push_str(s);
            return;
        }
        self.output.push('"');
        for ch in s.chars() {
            match ch {
                '"' => self.output.push_str("\\\""),
                '\\' => self.output.push_str("\\\\"),
                '\n' => self.output.push_str("\\n"),
                '\r' => self.output.push_str("\\r"),
                '\t' => self.output.push_str("\\t"),
                '\0' => self.output.push_str("\\0"),
                c if (c as u32) < 0x20 || c == '\u{7F}' => {
                    self.output.push_str(&format!("\\x{:02X}", c as u32))
                }
                '\u{85}' | '\u{2028}' | '\u{2029}' | '\u{FEFF}' => {
                    self.output.push_str(&format!("\\u{:04X}", ch as u32))
                }
                c => self.output.push(c),
            }
        }
        self.output.push('"');
    }
}

/// Returns `true` when `s` cannot be written as a plain scalar that reads
/// back as the same text.
fn needs_quotes(s: &str) -> bool {
    let first = match s.chars().next() {
        Some(c) => c,
        None => return true,
    };
    if !matches!(resolve_plain(s.to_string()), Value::Text(_)) {
        return true;
    }
    // number-like text other parsers may still type (0123, 1:30, 1_000)
    if (first.is_ascii_digit() || matches!(first, '-' | '+' | '.'))
        && s
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '_' | ':' | '.' | '-' | '+' | 'e' | 'E'))
    {
        return true;
    }
    matches!(
        first,
        '-' | '?' | ':' | ',' | '[' | ']' | '{' | '}' | '#' | '&' | '*' | '!' | '|' | '>' | '\''
            | '"' | '%' | '@' | '`' | ' '
    ) || s.ends_with([' ', ':'])
        || s.contains(": ")
        || s.contains(" #")
        || s.contains([',', '[', ']', '{', '}'])
        || s.chars().any(|c| c.is_control() || matches!(c, '\u{2028}' | '\u{2029}' | '\u{FEFF}'))
        || s.starts_with("...")
        || matches!(s, "<<" | "=")
}

/// Text made only of letters, digits and `_` is safe inside `[]` and `{}`.
fn is_flow_plain(s: &str) -> bool {
    s.chars().all(|c| c.is_alphanumeric() || c == '_')
}
