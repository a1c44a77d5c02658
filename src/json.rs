//! JSON reader and writer.
//!
//! The reader accepts relaxed JSON: `//` and `/* */` comments and trailing
//! commas are stripped (see [`crate::sanitize`]) before strict parsing with
//! `serde_json`. Object key order is kept.
//!
//! JSON has no binary type, so `Bytes` is written as a tagged object that the
//! reader recognizes again:
//!
//! ```json
//! {"__bytes__": true, "base64": "AAEC"}
//! ```
//!
//! Timestamps are written as ISO-8601 strings and read back as text.
//!
//! ## Examples
//!
//! ```rust
//! use canonconv::{json, JsonWriteOptions, Value};
//!
//! let doc = json::from_str("{\"a\": 1, /* c */ \"b\": [1, 2, 3,], // trailing\n}").unwrap();
//! let out = json::to_string(&doc, &JsonWriteOptions::new().with_minify(true)).unwrap();
//! assert_eq!(out, r#"{"a":1,"b":[1,2,3]}"#);
//!
//! let blob = Value::Bytes(vec![0, 1, 2]);
//! let out = json::to_string(&blob, &JsonWriteOptions::new().with_minify(true)).unwrap();
//! assert_eq!(out, r#"{"__bytes__":true,"base64":"AAEC"}"#);
//! assert_eq!(json::from_str(&out).unwrap(), blob);
//! ```

use crate::error::{Error, Result};
use crate::options::{Format, JsonReadOptions, JsonWriteOptions};
use crate::{sanitize, Mapping, Value};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::io::{Read, Write};

const BYTES_TAG: &str = "__bytes__";
const BYTES_PAYLOAD: &str = "base64";

/// Reads one JSON document from `reader`.
pub fn read<R: Read>(reader: R, _options: &JsonReadOptions) -> Result<Value> {
    let buf = crate::read_all(reader)?;
    from_slice(&buf)
}

/// Parses relaxed JSON from a byte slice.
pub fn from_slice(input: &[u8]) -> Result<Value> {
    log::debug!("reading JSON: {} bytes", input.len());
    let input = input.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(input);
    let strict = sanitize::strip(input);
    let value: Value = serde_json::from_slice(&strict).map_err(parse_error)?;
    Ok(decode_tagged_bytes(value))
}

/// Parses relaxed JSON from a string.
pub fn from_str(input: &str) -> Result<Value> {
    from_slice(input.as_bytes())
}

/// Writes `value` as JSON to `writer`.
pub fn write<W: Write>(value: &Value, writer: W, options: &JsonWriteOptions) -> Result<()> {
    let out = to_vec(value, options)?;
    crate::write_all(writer, &out)
}

/// Renders `value` as JSON bytes.
pub fn to_vec(value: &Value, options: &JsonWriteOptions) -> Result<Vec<u8>> {
    let sorted;
    let value = if options.sort {
        sorted = value.sorted();
        &sorted
    } else {
        value
    };
    check_finite(value, &mut String::new())?;

    let view = JsonView {
        value,
        preserve_binary: options.preserve_binary,
    };
    let mut out = if options.minify {
        serde_json::to_vec(&view)
    } else {
        serde_json::to_vec_pretty(&view)
    }
    .map_err(|e| Error::unsupported(Format::Json, e))?;
    if !options.minify {
        out.push(b'\n');
    }
    log::debug!("wrote JSON: {} bytes", out.len());
    Ok(out)
}

/// Renders `value` as a JSON string.
pub fn to_string(value: &Value, options: &JsonWriteOptions) -> Result<String> {
    let out = to_vec(value, options)?;
    String::from_utf8(out).map_err(|e| Error::unsupported(Format::Json, e))
}

fn parse_error(err: serde_json::Error) -> Error {
    let message = err.to_string();
    let suffix = format!(" at line {} column {}", err.line(), err.column());
    let message = message.strip_suffix(&suffix).unwrap_or(&message);
    if err.line() == 0 {
        Error::parse(Format::Json, message)
    } else {
        Error::parse_at(Format::Json, err.line(), err.column(), message)
    }
}

/// Replaces `{"__bytes__": true, "base64": ...}` objects with `Bytes`.
fn decode_tagged_bytes(value: Value) -> Value {
    match value {
        Value::Sequence(items) => {
            Value::Sequence(items.into_iter().map(decode_tagged_bytes).collect())
        }
        Value::Mapping(map) => match tagged_payload(&map) {
            Some(bytes) => Value::Bytes(bytes),
            None => Value::Mapping(
                map.into_iter()
                    .map(|(k, v)| (k, decode_tagged_bytes(v)))
                    .collect(),
            ),
        },
        scalar => scalar,
    }
}

fn tagged_payload(map: &Mapping) -> Option<Vec<u8>> {
    if map.len() != 2 || map.get(BYTES_TAG) != Some(&Value::Bool(true)) {
        return None;
    }
    let payload = map.get(BYTES_PAYLOAD)?.as_str()?;
    STANDARD.decode(payload).ok()
}

fn check_finite(value: &Value, path: &mut String) -> Result<()> {
    match value {
        Value::Float(f) if !f.is_finite() => Err(Error::unsupported(
            Format::Json,
            format!(
                "non-finite float {} at {}",
                f,
                if path.is_empty() { "/" } else { path.as_str() }
            ),
        )),
        Value::Sequence(items) => items.iter().enumerate().try_for_each(|(i, item)| {
            let len = path.len();
            path.push_str(&format!("/{}", i));
            let result = check_finite(item, path);
            path.truncate(len);
            result
        }),
        Value::Mapping(map) => map.iter().try_for_each(|(key, item)| {
            let len = path.len();
            path.push('/');
            path.push_str(key);
            let result = check_finite(item, path);
            path.truncate(len);
            result
        }),
        _ => Ok(()),
    }
}

/// Serializes a value with the JSON encodings of `Bytes` and `Timestamp`.
struct JsonView<'a> {
    value: &'a Value,
    preserve_binary: bool,
}

impl<'a> JsonView<'a> {
    fn child(&self, value: &'a Value) -> JsonView<'a> {
        JsonView {
            value,
            preserve_binary: self.preserve_binary,
        }
    }
}

impl Serialize for JsonView<'_> {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.value {
            Value::Bytes(bytes) if self.preserve_binary => {
                serializer.serialize_str(&STANDARD.encode(bytes))
            }
            Value::Bytes(bytes) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry(BYTES_TAG, &true)?;
                map.serialize_entry(BYTES_PAYLOAD, &STANDARD.encode(bytes))?;
                map.end()
            }
            Value::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(&self.child(item))?;
                }
                seq.end()
            }
            Value::Mapping(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, item) in entries {
                    map.serialize_entry(key, &self.child(item))?;
                }
                map.end()
            }
            scalar => scalar.serialize(serializer),
        }
    }
}
