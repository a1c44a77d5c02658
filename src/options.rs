//! Formats and per-direction conversion options.
//!
//! Every reader and writer takes a typed options record:
//!
//! | format | read                 | write                 |
//! |--------|----------------------|-----------------------|
//! | JSON   | [`JsonReadOptions`]  | [`JsonWriteOptions`]  |
//! | YAML   | [`YamlReadOptions`]  | [`YamlWriteOptions`]  |
//! | plist  | [`PlistReadOptions`] | [`PlistWriteOptions`] |
//! | XML    | [`XmlReadOptions`]   | [`XmlWriteOptions`]   |
//! | CSV    | [`CsvReadOptions`]   | not writable          |
//!
//! The records are grouped into [`ReadOptions`] and [`WriteOptions`] for the
//! format-driven entry points, and both can be built from string key/value
//! pairs as they arrive from a command line or a config file.
//!
//! ## Examples
//!
//! ```rust
//! use canonconv::{Format, JsonWriteOptions, WriteOptions};
//!
//! let options = JsonWriteOptions::new().with_minify(true).with_sort(true);
//! assert!(options.minify);
//!
//! let options = WriteOptions::from_pairs(Format::Json, [("minify", "true")]).unwrap();
//! assert_eq!(options.format(), Format::Json);
//!
//! // Keys that do not apply to the format are rejected
//! assert!(WriteOptions::from_pairs(Format::Json, [("binary", "true")]).is_err());
//! ```

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// The encodings the engine converts between.
///
/// # Examples
///
/// ```rust
/// use canonconv::Format;
///
/// assert_eq!("yml".parse::<Format>().unwrap(), Format::Yaml);
/// assert_eq!(Format::from_extension("Info.plist"), Some(Format::Plist));
/// assert!(!Format::Csv.is_writable());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Format {
    Json,
    Yaml,
    Plist,
    Xml,
    Csv,
}

impl Format {
    /// All formats, in a stable order.
    pub const ALL: [Format; 5] = [
        Format::Json,
        Format::Yaml,
        Format::Plist,
        Format::Xml,
        Format::Csv,
    ];

    /// Lowercase name, as accepted by [`FromStr`].
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Yaml => "yaml",
            Format::Plist => "plist",
            Format::Xml => "xml",
            Format::Csv => "csv",
        }
    }

    /// Guesses the format from a file name or bare extension.
    #[must_use]
    pub fn from_extension(path: &str) -> Option<Format> {
        let ext = path.rsplit('.').next().unwrap_or(path).to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(Format::Json),
            "yaml" | "yml" => Some(Format::Yaml),
            "plist" => Some(Format::Plist),
            "xml" => Some(Format::Xml),
            "csv" | "tsv" => Some(Format::Csv),
            _ => None,
        }
    }

    /// Returns `false` for formats that can only be read.
    #[must_use]
    pub const fn is_writable(self) -> bool {
        !matches!(self, Format::Csv)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Format::Json => "JSON",
            Format::Yaml => "YAML",
            Format::Plist => "plist",
            Format::Xml => "XML",
            Format::Csv => "CSV",
        })
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Format::Json),
            "yaml" | "yml" => Ok(Format::Yaml),
            "plist" => Ok(Format::Plist),
            "xml" => Ok(Format::Xml),
            "csv" => Ok(Format::Csv),
            other => Err(Error::config(format!("unknown format '{}'", other))),
        }
    }
}

/// Options for reading JSON. The reader has no knobs; comments and trailing
/// commas are always tolerated.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct JsonReadOptions {}

impl JsonReadOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Options for writing JSON.
///
/// # Examples
///
/// ```rust
/// use canonconv::{json, value, JsonWriteOptions};
///
/// let doc = value!({"b": 1, "a": [true, null]});
/// let options = JsonWriteOptions::new().with_minify(true).with_sort(true);
/// assert_eq!(json::to_string(&doc, &options).unwrap(), r#"{"a":[true,null],"b":1}"#);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct JsonWriteOptions {
    /// Sort mapping keys recursively before writing.
    pub sort: bool,
    /// Emit no insignificant whitespace.
    pub minify: bool,
    /// Write `Bytes` as a bare base64 string instead of the tagged object.
    pub preserve_binary: bool,
}

impl JsonWriteOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_sort(mut self, sort: bool) -> Self {
        self.sort = sort;
        self
    }

    #[must_use]
    pub fn with_minify(mut self, minify: bool) -> Self {
        self.minify = minify;
        self
    }

    #[must_use]
    pub fn with_preserve_binary(mut self, preserve: bool) -> Self {
        self.preserve_binary = preserve;
        self
    }
}

/// Options for reading YAML.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct YamlReadOptions {}

impl YamlReadOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Options for writing YAML. `minify` switches from block to flow style.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct YamlWriteOptions {
    pub sort: bool,
    pub minify: bool,
}

impl YamlWriteOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_sort(mut self, sort: bool) -> Self {
        self.sort = sort;
        self
    }

    #[must_use]
    pub fn with_minify(mut self, minify: bool) -> Self {
        self.minify = minify;
        self
    }
}

/// Options for reading property lists. XML and binary input are detected
/// automatically.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlistReadOptions {}

impl PlistReadOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// What the plist writer does with `Null`, which property lists cannot hold.
///
/// # Examples
///
/// ```rust
/// use canonconv::NoneHandler;
///
/// assert_eq!("empty-string".parse::<NoneHandler>().unwrap(), NoneHandler::EmptyString);
/// assert_eq!(NoneHandler::default(), NoneHandler::Fail);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum NoneHandler {
    /// Refuse to write; the writer returns an unsupported value error.
    #[default]
    Fail,
    /// Drop the mapping entry or sequence element that holds `Null`.
    Strip,
    /// Write `<false/>` in place of `Null`.
    False,
    /// Write an empty string in place of `Null`.
    EmptyString,
}

impl NoneHandler {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            NoneHandler::Fail => "fail",
            NoneHandler::Strip => "strip",
            NoneHandler::False => "false",
            NoneHandler::EmptyString => "empty-string",
        }
    }
}

impl FromStr for NoneHandler {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail" => Ok(NoneHandler::Fail),
            "strip" => Ok(NoneHandler::Strip),
            "false" => Ok(NoneHandler::False),
            "empty-string" | "empty_string" | "empty" => Ok(NoneHandler::EmptyString),
            other => Err(Error::config(format!(
                "unknown none_handler '{}' (expected fail, strip, false or empty-string)",
                other
            ))),
        }
    }
}

/// Options for writing property lists.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlistWriteOptions {
    pub sort: bool,
    /// Write a binary plist instead of an XML plist.
    pub binary: bool,
    pub none_handler: NoneHandler,
}

impl PlistWriteOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_sort(mut self, sort: bool) -> Self {
        self.sort = sort;
        self
    }

    #[must_use]
    pub fn with_binary(mut self, binary: bool) -> Self {
        self.binary = binary;
        self
    }

    #[must_use]
    pub fn with_none_handler(mut self, handler: NoneHandler) -> Self {
        self.none_handler = handler;
        self
    }
}

/// Options for reading XML.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct XmlReadOptions {
    /// Keep namespace prefixes and surface `xmlns` declarations as attributes.
    pub namespaces: bool,
}

impl XmlReadOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_namespaces(mut self, namespaces: bool) -> Self {
        self.namespaces = namespaces;
        self
    }
}

/// How the XML writer structures the document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum XmlLayout {
    /// Declaration plus one root element; `@key` entries become attributes
    /// and `#text` becomes character data.
    RootDriven { root: Option<String> },
    /// No declaration; the tree is wrapped in one `<wrap_tag>` element and
    /// every key is a plain child element.
    TagDriven { wrap_tag: String },
}

impl Default for XmlLayout {
    fn default() -> Self {
        XmlLayout::RootDriven { root: None }
    }
}

/// Options for writing XML.
///
/// # Examples
///
/// ```rust
/// use canonconv::{XmlLayout, XmlWriteOptions};
///
/// let options = XmlWriteOptions::new().with_root("config");
/// assert_eq!(options.layout, XmlLayout::RootDriven { root: Some("config".into()) });
///
/// let options = XmlWriteOptions::new().with_wrap_tag("export");
/// assert_eq!(options.layout, XmlLayout::TagDriven { wrap_tag: "export".into() });
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct XmlWriteOptions {
    pub sort: bool,
    pub minify: bool,
    pub layout: XmlLayout,
}

impl XmlWriteOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_sort(mut self, sort: bool) -> Self {
        self.sort = sort;
        self
    }

    #[must_use]
    pub fn with_minify(mut self, minify: bool) -> Self {
        self.minify = minify;
        self
    }

    /// Uses the root-driven layout with an explicit root element name.
    #[must_use]
    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        self.layout = XmlLayout::RootDriven {
            root: Some(root.into()),
        };
        self
    }

    /// Uses the tag-driven layout, wrapping everything in `wrap_tag`.
    #[must_use]
    pub fn with_wrap_tag(mut self, wrap_tag: impl Into<String>) -> Self {
        self.layout = XmlLayout::TagDriven {
            wrap_tag: wrap_tag.into(),
        };
        self
    }
}

/// Delimiter, quoting and escaping conventions of a CSV file.
///
/// # Examples
///
/// ```rust
/// use canonconv::CsvDialect;
///
/// let tsv = CsvDialect::named("excel-tab").unwrap();
/// assert_eq!(tsv.delimiter, b'\t');
/// assert!(CsvDialect::named("dos").is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CsvDialect {
    pub delimiter: u8,
    pub quote: u8,
    pub escape: Option<u8>,
    /// A doubled quote inside a quoted field stands for one quote.
    pub double_quote: bool,
}

impl Default for CsvDialect {
    fn default() -> Self {
        CsvDialect::excel()
    }
}

impl CsvDialect {
    #[must_use]
    pub const fn excel() -> Self {
        CsvDialect {
            delimiter: b',',
            quote: b'"',
            escape: None,
            double_quote: true,
        }
    }

    #[must_use]
    pub const fn excel_tab() -> Self {
        CsvDialect {
            delimiter: b'\t',
            ..CsvDialect::excel()
        }
    }

    /// Unix-style files differ from `excel` only in line endings and output
    /// quoting, neither of which matters to a reader.
    #[must_use]
    pub const fn unix() -> Self {
        CsvDialect::excel()
    }

    /// Looks up a dialect by name: `excel`, `excel-tab` or `unix`.
    pub fn named(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "excel" => Ok(CsvDialect::excel()),
            "excel-tab" | "excel_tab" => Ok(CsvDialect::excel_tab()),
            "unix" | "unix_dialect" => Ok(CsvDialect::unix()),
            other => Err(Error::config(format!(
                "unknown CSV dialect '{}' (expected excel, excel-tab or unix)",
                other
            ))),
        }
    }

    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    #[must_use]
    pub fn with_quote(mut self, quote: u8) -> Self {
        self.quote = quote;
        self
    }

    #[must_use]
    pub fn with_escape(mut self, escape: Option<u8>) -> Self {
        self.escape = escape;
        self
    }

    #[must_use]
    pub fn with_double_quote(mut self, double_quote: bool) -> Self {
        self.double_quote = double_quote;
        self
    }
}

/// Either a fixed dialect or detection from the input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DialectChoice {
    #[default]
    Sniff,
    Fixed(CsvDialect),
}

/// Options for reading CSV.
///
/// # Examples
///
/// ```rust
/// use canonconv::{CsvDialect, CsvReadOptions, DialectChoice};
///
/// let options = CsvReadOptions::new()
///     .with_header(true)
///     .with_key_column(Some(1))
///     .with_dialect(DialectChoice::Fixed(CsvDialect::excel()));
/// assert_eq!(options.key_column, Some(1));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CsvReadOptions {
    /// Treat the first row as field names.
    pub header: bool,
    pub dialect: DialectChoice,
    /// 1-based column whose values key the result mapping. Requires `header`.
    pub key_column: Option<usize>,
}

impl CsvReadOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_header(mut self, header: bool) -> Self {
        self.header = header;
        self
    }

    #[must_use]
    pub fn with_dialect(mut self, dialect: DialectChoice) -> Self {
        self.dialect = dialect;
        self
    }

    #[must_use]
    pub fn with_key_column(mut self, key_column: Option<usize>) -> Self {
        self.key_column = key_column;
        self
    }
}

/// Reader options for any format.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReadOptions {
    Json(JsonReadOptions),
    Yaml(YamlReadOptions),
    Plist(PlistReadOptions),
    Xml(XmlReadOptions),
    Csv(CsvReadOptions),
}

impl ReadOptions {
    /// Default reader options for `format`.
    #[must_use]
    pub fn for_format(format: Format) -> Self {
        match format {
            Format::Json => ReadOptions::Json(JsonReadOptions::default()),
            Format::Yaml => ReadOptions::Yaml(YamlReadOptions::default()),
            Format::Plist => ReadOptions::Plist(PlistReadOptions::default()),
            Format::Xml => ReadOptions::Xml(XmlReadOptions::default()),
            Format::Csv => ReadOptions::Csv(CsvReadOptions::default()),
        }
    }

    #[must_use]
    pub const fn format(&self) -> Format {
        match self {
            ReadOptions::Json(_) => Format::Json,
            ReadOptions::Yaml(_) => Format::Yaml,
            ReadOptions::Plist(_) => Format::Plist,
            ReadOptions::Xml(_) => Format::Xml,
            ReadOptions::Csv(_) => Format::Csv,
        }
    }

    /// Builds reader options from string key/value pairs.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use canonconv::{Format, ReadOptions};
    ///
    /// let options = ReadOptions::from_pairs(
    ///     Format::Csv,
    ///     [("header", "yes"), ("key_column", "1"), ("dialect", "excel")],
    /// )
    /// .unwrap();
    /// assert_eq!(options.format(), Format::Csv);
    ///
    /// // key_column needs header mode
    /// assert!(ReadOptions::from_pairs(Format::Csv, [("key_column", "1")]).is_err());
    /// ```
    pub fn from_pairs<I, K, V>(format: Format, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut options = ReadOptions::for_format(format);
        for (key, value) in pairs {
            let (key, value) = (key.as_ref(), value.as_ref());
            match (&mut options, key) {
                (ReadOptions::Xml(xml), "namespaces") => xml.namespaces = parse_flag(key, value)?,
                (ReadOptions::Csv(csv), "header") => csv.header = parse_flag(key, value)?,
                (ReadOptions::Csv(csv), "dialect") => {
                    csv.dialect = match value.trim().to_ascii_lowercase().as_str() {
                        "sniff" | "auto" => DialectChoice::Sniff,
                        name => DialectChoice::Fixed(CsvDialect::named(name)?),
                    }
                }
                (ReadOptions::Csv(csv), "key_column") => {
                    csv.key_column = Some(parse_column(value)?);
                }
                _ => return Err(unknown_key(format, "reading", key)),
            }
        }
        if let ReadOptions::Csv(csv) = &options {
            if csv.key_column.is_some() && !csv.header {
                return Err(Error::config("key_column requires header mode"));
            }
        }
        Ok(options)
    }
}

/// Writer options for any writable format.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WriteOptions {
    Json(JsonWriteOptions),
    Yaml(YamlWriteOptions),
    Plist(PlistWriteOptions),
    Xml(XmlWriteOptions),
}

impl WriteOptions {
    /// Default writer options for `format`. Fails for read-only formats.
    pub fn for_format(format: Format) -> Result<Self> {
        match format {
            Format::Json => Ok(WriteOptions::Json(JsonWriteOptions::default())),
            Format::Yaml => Ok(WriteOptions::Yaml(YamlWriteOptions::default())),
            Format::Plist => Ok(WriteOptions::Plist(PlistWriteOptions::default())),
            Format::Xml => Ok(WriteOptions::Xml(XmlWriteOptions::default())),
            Format::Csv => Err(Error::config("CSV output is not supported")),
        }
    }

    #[must_use]
    pub const fn format(&self) -> Format {
        match self {
            WriteOptions::Json(_) => Format::Json,
            WriteOptions::Yaml(_) => Format::Yaml,
            WriteOptions::Plist(_) => Format::Plist,
            WriteOptions::Xml(_) => Format::Xml,
        }
    }

    /// Builds writer options from string key/value pairs.
    ///
    /// When both `root` and `wrap_tag` are given for XML, `wrap_tag` wins.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use canonconv::{Format, NoneHandler, WriteOptions};
    ///
    /// let options = WriteOptions::from_pairs(
    ///     Format::Plist,
    ///     [("binary", "1"), ("none_handler", "strip")],
    /// )
    /// .unwrap();
    /// match options {
    ///     WriteOptions::Plist(plist) => {
    ///         assert!(plist.binary);
    ///         assert_eq!(plist.none_handler, NoneHandler::Strip);
    ///     }
    ///     _ => unreachable!(),
    /// }
    /// ```
    pub fn from_pairs<I, K, V>(format: Format, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut options = WriteOptions::for_format(format)?;
        let mut root = None;
        let mut wrap_tag = None;

        for (key, value) in pairs {
            let (key, value) = (key.as_ref(), value.as_ref());
            match (&mut options, key) {
                (WriteOptions::Json(json), "sort") => json.sort = parse_flag(key, value)?,
                (WriteOptions::Json(json), "minify") => json.minify = parse_flag(key, value)?,
                (WriteOptions::Json(json), "preserve_binary") => {
                    json.preserve_binary = parse_flag(key, value)?
                }
                (WriteOptions::Yaml(yaml), "sort") => yaml.sort = parse_flag(key, value)?,
                (WriteOptions::Yaml(yaml), "minify") => yaml.minify = parse_flag(key, value)?,
                (WriteOptions::Plist(plist), "sort") => plist.sort = parse_flag(key, value)?,
                (WriteOptions::Plist(plist), "binary") => plist.binary = parse_flag(key, value)?,
                (WriteOptions::Plist(plist), "none_handler") => {
                    plist.none_handler = value.parse()?
                }
                (WriteOptions::Xml(xml), "sort") => xml.sort = parse_flag(key, value)?,
                (WriteOptions::Xml(xml), "minify") => xml.minify = parse_flag(key, value)?,
                (WriteOptions::Xml(_), "root") => root = Some(xml_name(key, value)?),
                (WriteOptions::Xml(_), "wrap_tag") => wrap_tag = Some(xml_name(key, value)?),
                _ => return Err(unknown_key(format, "writing", key)),
            }
        }

        if let WriteOptions::Xml(xml) = &mut options {
            xml.layout = match (root, wrap_tag) {
                (Some(root), Some(wrap_tag)) => {
                    log::warn!(
                        "both root '{}' and wrap_tag '{}' given; using wrap_tag",
                        root,
                        wrap_tag
                    );
                    XmlLayout::TagDriven { wrap_tag }
                }
                (_, Some(wrap_tag)) => XmlLayout::TagDriven { wrap_tag },
                (root, None) => XmlLayout::RootDriven { root },
            };
        }
        Ok(options)
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(Error::config(format!(
            "option '{}' expects a boolean, got '{}'",
            key, other
        ))),
    }
}

fn parse_column(value: &str) -> Result<usize> {
    match value.trim().parse::<usize>() {
        Ok(0) | Err(_) => Err(Error::config(format!(
            "key_column must be a positive 1-based column number, got '{}'",
            value
        ))),
        Ok(column) => Ok(column),
    }
}

fn xml_name(key: &str, value: &str) -> Result<String> {
    let name = value.trim();
    if crate::xml::is_xml_name(name) {
        Ok(name.to_string())
    } else {
        Err(Error::config(format!(
            "option '{}' is not a valid XML element name: '{}'",
            key, value
        )))
    }
}

fn unknown_key(format: Format, direction: &str, key: &str) -> Error {
    Error::config(format!(
        "unknown option '{}' for {} {}",
        key, direction, format
    ))
}
