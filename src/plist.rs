//! Property list reader and writer (XML and binary).
//!
//! The reader detects XML and binary input automatically. `<data>` becomes
//! [`Value::Bytes`], `<date>` becomes a UTC [`Value::Timestamp`], and keyed
//! archiver UIDs read as integers.
//!
//! Property lists have no null. The writer resolves `Null` through
//! [`NoneHandler`]: fail (the default), strip the holding entry, or
//! substitute `false` or an empty string.
//!
//! ```rust
//! use canonconv::{plist, value, NoneHandler, PlistWriteOptions};
//!
//! let doc = value!({"name": "demo", "missing": null});
//!
//! assert!(plist::to_vec(&doc, &PlistWriteOptions::new()).is_err());
//!
//! let options = PlistWriteOptions::new()
//!     .with_binary(true)
//!     .with_none_handler(NoneHandler::Strip);
//! let bytes = plist::to_vec(&doc, &options).unwrap();
//! assert!(bytes.starts_with(b"bplist00"));
//! assert_eq!(plist::from_slice(&bytes).unwrap(), value!({"name": "demo"}));
//! ```

use crate::error::{Error, Result};
use crate::options::{Format, NoneHandler, PlistReadOptions, PlistWriteOptions};
use crate::{Mapping, Timestamp, Value};
use chrono::{DateTime, Duration, DurationRound, Utc};
use std::io::{Cursor, Read, Write};
use std::time::SystemTime;

/// Reads a property list from `reader`.
pub fn read<R: Read>(reader: R, _options: &PlistReadOptions) -> Result<Value> {
    let buf = crate::read_all(reader)?;
    from_slice(&buf)
}

/// Parses an XML or binary property list.
pub fn from_slice(input: &[u8]) -> Result<Value> {
    log::debug!("reading plist: {} bytes", input.len());
    let parsed = ::plist::Value::from_reader(Cursor::new(input))
        .map_err(|e| Error::parse(Format::Plist, e))?;
    Ok(from_plist(parsed))
}

/// Writes `value` as a property list to `writer`.
pub fn write<W: Write>(value: &Value, writer: W, options: &PlistWriteOptions) -> Result<()> {
    let out = to_vec(value, options)?;
    crate::write_all(writer, &out)
}

/// Renders `value` as an XML or binary property list.
pub fn to_vec(value: &Value, options: &PlistWriteOptions) -> Result<Vec<u8>> {
    let sorted;
    let value = if options.sort {
        sorted = value.sorted();
        &sorted
    } else {
        value
    };

    let root = to_plist(value, &mut String::new(), options.none_handler)?.ok_or_else(|| {
        Error::unsupported(
            Format::Plist,
            "a null document; only the false and empty-string handlers can replace it",
        )
    })?;

    let mut out = Vec::new();
    if options.binary {
        root.to_writer_binary(&mut out)
    } else {
        root.to_writer_xml(&mut out)
    }
    .map_err(|e| Error::unsupported(Format::Plist, e))?;
    log::debug!(
        "wrote {} plist: {} bytes",
        if options.binary { "binary" } else { "XML" },
        out.len()
    );
    Ok(out)
}

fn from_plist(value: ::plist::Value) -> Value {
    match value {
        ::plist::Value::Array(items) => {
            Value::Sequence(items.into_iter().map(from_plist).collect())
        }
        ::plist::Value::Dictionary(dict) => Value::Mapping(
            dict.into_iter()
                .map(|(k, v)| (k, from_plist(v)))
                .collect::<Mapping>(),
        ),
        ::plist::Value::Boolean(b) => Value::Bool(b),
        ::plist::Value::Data(bytes) => Value::Bytes(bytes),
        ::plist::Value::Date(date) => {
            // binary dates are f64 seconds; drop the float noise below 1µs
            let utc: DateTime<Utc> = SystemTime::from(date).into();
            let utc = utc.duration_round(Duration::microseconds(1)).unwrap_or(utc);
            Value::Timestamp(Timestamp::from_utc(utc))
        }
        ::plist::Value::Real(f) => Value::Float(f),
        ::plist::Value::Integer(i) => match (i.as_signed(), i.as_unsigned()) {
            (Some(signed), _) => Value::Int(signed),
            (None, Some(unsigned)) => Value::Float(unsigned as f64),
            (None, None) => Value::Null,
        },
        ::plist::Value::String(s) => Value::Text(s),
        ::plist::Value::Uid(uid) => match i64::try_from(uid.get()) {
            Ok(i) => Value::Int(i),
            Err(_) => Value::Float(uid.get() as f64),
        },
        _ => Value::Null,
    }
}

fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "/"
    } else {
        path
    }
}

/// Converts one node. `Ok(None)` means the node was stripped.
fn to_plist(
    value: &Value,
    path: &mut String,
    handler: NoneHandler,
) -> Result<Option<::plist::Value>> {
    let converted = match value {
        Value::Null => return null_replacement(path, handler),
        Value::Bool(b) => ::plist::Value::Boolean(*b),
        Value::Int(i) => ::plist::Value::Integer((*i).into()),
        Value::Float(f) => ::plist::Value::Real(*f),
        Value::Text(s) => ::plist::Value::String(s.clone()),
        Value::Bytes(bytes) => ::plist::Value::Data(bytes.clone()),
        Value::Timestamp(ts) => {
            ::plist::Value::Date(::plist::Date::from(SystemTime::from(ts.to_utc())))
        }
        Value::Sequence(items) => {
            let mut array = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                let len = path.len();
                path.push_str(&format!("/{}", i));
                let converted = to_plist(item, path, handler)?;
                path.truncate(len);
                array.extend(converted);
            }
            ::plist::Value::Array(array)
        }
        Value::Mapping(map) => {
            let mut dict = ::plist::Dictionary::new();
            for (key, item) in map {
                let len = path.len();
                path.push('/');
                path.push_str(key);
                let converted = to_plist(item, path, handler)?;
                path.truncate(len);
                if let Some(converted) = converted {
                    dict.insert(key.clone(), converted);
                }
            }
            ::plist::Value::Dictionary(dict)
        }
    };
    Ok(Some(converted))
}

fn null_replacement(path: &str, handler: NoneHandler) -> Result<Option<::plist::Value>> {
    match handler {
        NoneHandler::Fail => Err(Error::unsupported(
            Format::Plist,
            format!("null at {}", display_path(path)),
        )),
        NoneHandler::Strip => {
            log::info!("plist: stripped null at {}", display_path(path));
            Ok(None)
        }
        NoneHandler::False => {
            log::info!("plist: replaced null at {} with false", display_path(path));
            Ok(Some(::plist::Value::Boolean(false)))
        }
        NoneHandler::EmptyString => {
            log::info!(
                "plist: replaced null at {} with an empty string",
                display_path(path)
            );
            Ok(Some(::plist::Value::String(String::new())))
        }
    }
}
