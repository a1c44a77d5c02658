//! # canonconv
//!
//! Lossless conversion between JSON, YAML, property lists, XML and CSV.
//!
//! Every reader parses its format into one canonical [`Value`] and every
//! writer renders a [`Value`] back out, so any readable format converts to
//! any writable one:
//!
//! ```text
//! JSON  ─┐                ┌─> JSON
//! YAML  ─┤                ├─> YAML
//! plist ─┼──>  Value  ────┼─> plist (XML or binary)
//! XML   ─┤                └─> XML
//! CSV   ─┘
//! ```
//!
//! ## What is preserved
//!
//! - **Key order**: mappings are insertion ordered end to end; `sort` is an
//!   explicit writer option
//! - **Integers vs floats**: `Int(1)` and `Float(1.0)` stay distinct
//! - **Binary data**: `Bytes` travel as `!!binary` in YAML, `<data>` in
//!   plists and a tagged base64 object in JSON
//! - **Date-times**: `Timestamp` travels as `!!timestamp` in YAML and `<date>`
//!   in plists, with sub-second precision and UTC offset where the format
//!   allows
//!
//! ## Quick Start
//!
//! ```rust
//! use canonconv::{convert, Format, ReadOptions, WriteOptions};
//!
//! let input = "# settings\nname: demo\nports: [80, 443]\nicon: !!binary AAEC\n";
//! let mut output = Vec::new();
//!
//! convert(
//!     input.as_bytes(),
//!     &ReadOptions::for_format(Format::Yaml),
//!     &mut output,
//!     &WriteOptions::from_pairs(Format::Json, [("minify", "true")]).unwrap(),
//! )
//! .unwrap();
//!
//! assert_eq!(
//!     String::from_utf8(output).unwrap(),
//!     r#"{"name":"demo","ports":[80,443],"icon":{"__bytes__":true,"base64":"AAEC"}}"#
//! );
//! ```
//!
//! ### Per-format entry points
//!
//! ```rust
//! use canonconv::{read_json, write_plist, JsonReadOptions, PlistWriteOptions};
//!
//! let value = read_json(&b"{\"a\": 1, // comment\n \"b\": [true,],}"[..], &JsonReadOptions::new()).unwrap();
//!
//! let mut plist = Vec::new();
//! write_plist(&value, &mut plist, &PlistWriteOptions::new().with_binary(true)).unwrap();
//! assert!(plist.starts_with(b"bplist00"));
//! ```
//!
//! ## Streams
//!
//! Readers take their stream by value, read it to the end and drop it
//! before returning. Writers render the whole document into memory, then
//! write and flush it. Conversions are synchronous and share no state, so
//! independent conversions may run on separate threads.
//!
//! ## Logging
//!
//! The crate logs through the [`log`](https://docs.rs/log) facade: reader and
//! writer activity at `debug`, plist null substitutions at `info`, and
//! recoverable input problems (duplicate CSV keys, dialect fallback) at
//! `warn`. No logger is installed.

pub mod csv;
pub mod error;
pub mod json;
pub mod macros;
pub mod map;
pub mod options;
pub mod plist;
pub mod sanitize;
pub mod timestamp;
pub mod transform;
pub mod value;
pub mod xml;
pub mod yaml;

pub use error::{Error, ErrorKind, Result};
pub use map::Mapping;
pub use options::{
    CsvDialect, CsvReadOptions, DialectChoice, Format, JsonReadOptions, JsonWriteOptions,
    NoneHandler, PlistReadOptions, PlistWriteOptions, ReadOptions, WriteOptions, XmlLayout,
    XmlReadOptions, XmlWriteOptions, YamlReadOptions, YamlWriteOptions,
};
pub use timestamp::Timestamp;
pub use value::Value;

use std::io::{Read, Write};

/// Reads `reader` to the end, then drops it.
pub(crate) fn read_all<R: Read>(mut reader: R) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    Ok(buf)
}

/// Writes the rendered document and flushes.
pub(crate) fn write_all<W: Write>(mut writer: W, bytes: &[u8]) -> Result<()> {
    writer.write_all(bytes)?;
    writer.flush()?;
    Ok(())
}

/// Reads a relaxed JSON document (comments and trailing commas allowed).
///
/// # Errors
///
/// Returns [`Error::Parse`] with line and column for malformed input.
pub fn read_json<R: Read>(reader: R, options: &JsonReadOptions) -> Result<Value> {
    json::read(reader, options)
}

/// Reads the first document of a YAML stream.
///
/// # Errors
///
/// Returns [`Error::Parse`] for malformed YAML or invalid tagged scalars.
pub fn read_yaml<R: Read>(reader: R, options: &YamlReadOptions) -> Result<Value> {
    yaml::read(reader, options)
}

/// Reads an XML or binary property list.
///
/// # Errors
///
/// Returns [`Error::Parse`] for malformed input.
pub fn read_plist<R: Read>(reader: R, options: &PlistReadOptions) -> Result<Value> {
    plist::read(reader, options)
}

/// Reads an XML document.
///
/// # Errors
///
/// Returns [`Error::Parse`] for malformed XML.
pub fn read_xml<R: Read>(reader: R, options: &XmlReadOptions) -> Result<Value> {
    xml::read(reader, options)
}

/// Reads CSV.
///
/// # Errors
///
/// Returns [`Error::Parse`] for invalid UTF-8 or unterminated quotes, and
/// [`Error::Config`] for a `key_column` that does not fit the header.
pub fn read_csv<R: Read>(reader: R, options: &CsvReadOptions) -> Result<Value> {
    csv::read(reader, options)
}

/// Writes `value` as JSON.
///
/// # Errors
///
/// Returns [`Error::UnsupportedValue`] for NaN or infinite floats.
pub fn write_json<W: Write>(value: &Value, writer: W, options: &JsonWriteOptions) -> Result<()> {
    json::write(value, writer, options)
}

/// Writes `value` as a YAML document.
///
/// # Errors
///
/// Returns [`Error::Io`] when the writer fails.
pub fn write_yaml<W: Write>(value: &Value, writer: W, options: &YamlWriteOptions) -> Result<()> {
    yaml::write(value, writer, options)
}

/// Writes `value` as an XML or binary property list.
///
/// # Errors
///
/// Returns [`Error::UnsupportedValue`] for `Null` unless the options name a
/// [`NoneHandler`] that replaces it.
pub fn write_plist<W: Write>(value: &Value, writer: W, options: &PlistWriteOptions) -> Result<()> {
    plist::write(value, writer, options)
}

/// Writes `value` as XML.
///
/// # Errors
///
/// Returns [`Error::Config`] for an invalid root or wrap tag name.
pub fn write_xml<W: Write>(value: &Value, writer: W, options: &XmlWriteOptions) -> Result<()> {
    xml::write(value, writer, options)
}

/// Reads any supported format; the options select the format.
///
/// # Examples
///
/// ```rust
/// use canonconv::{read, value, Format, ReadOptions};
///
/// let options = ReadOptions::from_pairs(Format::Csv, [("header", "true")]).unwrap();
/// let value = read(&b"a,b\n1,2\n"[..], &options).unwrap();
/// assert_eq!(value, value!([{"a": "1", "b": "2"}]));
/// ```
pub fn read<R: Read>(reader: R, options: &ReadOptions) -> Result<Value> {
    match options {
        ReadOptions::Json(opts) => read_json(reader, opts),
        ReadOptions::Yaml(opts) => read_yaml(reader, opts),
        ReadOptions::Plist(opts) => read_plist(reader, opts),
        ReadOptions::Xml(opts) => read_xml(reader, opts),
        ReadOptions::Csv(opts) => read_csv(reader, opts),
    }
}

/// Writes any writable format; the options select the format.
pub fn write<W: Write>(value: &Value, writer: W, options: &WriteOptions) -> Result<()> {
    match options {
        WriteOptions::Json(opts) => write_json(value, writer, opts),
        WriteOptions::Yaml(opts) => write_yaml(value, writer, opts),
        WriteOptions::Plist(opts) => write_plist(value, writer, opts),
        WriteOptions::Xml(opts) => write_xml(value, writer, opts),
    }
}

/// Reads one format and writes another.
///
/// # Examples
///
/// ```rust
/// use canonconv::{convert, Format, ReadOptions, WriteOptions};
///
/// let mut out = Vec::new();
/// convert(
///     &b"<cfg><debug>true</debug></cfg>"[..],
///     &ReadOptions::for_format(Format::Xml),
///     &mut out,
///     &WriteOptions::for_format(Format::Yaml).unwrap(),
/// )
/// .unwrap();
/// assert_eq!(String::from_utf8(out).unwrap(), "cfg:\n  debug: \"true\"\n");
/// ```
pub fn convert<R: Read, W: Write>(
    reader: R,
    read_options: &ReadOptions,
    writer: W,
    write_options: &WriteOptions,
) -> Result<()> {
    log::debug!(
        "converting {} to {}",
        read_options.format(),
        write_options.format()
    );
    let value = read(reader, read_options)?;
    write(&value, writer, write_options)
}
