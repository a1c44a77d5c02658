//! CSV reader.
//!
//! CSV is read-only. Rows come back as sequences of text, or as mappings
//! keyed by the header row when `header` is set. With a `key_column` the
//! result is one mapping from that column's values to the remaining fields:
//!
//! ```rust
//! use canonconv::{csv, value, CsvReadOptions};
//!
//! let text = "id,name\n1,Ann\n2,Bob\n";
//! let options = CsvReadOptions::new().with_header(true).with_key_column(Some(1));
//! assert_eq!(
//!     csv::from_str(text, &options).unwrap(),
//!     value!({"1": {"name": "Ann"}, "2": {"name": "Bob"}})
//! );
//! ```
//!
//! The dialect is fixed by the caller or sniffed from the first lines of
//! input; see [`sniff`].

use crate::error::{Error, Result};
use crate::options::{CsvDialect, CsvReadOptions, DialectChoice, Format};
use crate::{Mapping, Value};
use std::io::Read;

const SNIFF_LINES: usize = 10;
const DELIMITER_CANDIDATES: [u8; 5] = [b',', b'\t', b';', b'|', b':'];

/// Reads CSV from `reader`.
pub fn read<R: Read>(reader: R, options: &CsvReadOptions) -> Result<Value> {
    let buf = crate::read_all(reader)?;
    let text = std::str::from_utf8(&buf).map_err(|e| {
        Error::parse(Format::Csv, format!("invalid UTF-8: {}", e))
    })?;
    from_str(text, options)
}

/// Parses CSV text.
pub fn from_str(text: &str, options: &CsvReadOptions) -> Result<Value> {
    log::debug!(
        "reading CSV: {} bytes, header {}, key_column {:?}",
        text.len(),
        options.header,
        options.key_column
    );
    if options.key_column.is_some() && !options.header {
        return Err(Error::config("key_column requires header mode"));
    }

    let text = text.strip_prefix('\u{FEFF}').unwrap_or(text);
    let dialect = match options.dialect {
        DialectChoice::Fixed(dialect) => dialect,
        DialectChoice::Sniff => sniff(text).unwrap_or_else(|| {
            log::warn!("could not determine the CSV dialect; assuming excel");
            CsvDialect::excel()
        }),
    };
    check_quotes(text, &dialect)?;

    let rows = records(text, &dialect)?;
    let value = match (options.header, options.key_column) {
        (false, _) => Value::Sequence(
            rows.into_iter()
                .map(|row| Value::Sequence(row.into_iter().map(Value::Text).collect()))
                .collect(),
        ),
        (true, None) => {
            let mut rows = rows.into_iter();
            match rows.next() {
                Some(fields) => Value::Sequence(rows.map(|row| record(&fields, row, None)).collect()),
                None => Value::Sequence(Vec::new()),
            }
        }
        (true, Some(column)) => Value::Mapping(keyed(rows, column)?),
    };
    log::debug!("read CSV: {}", value.type_name());
    Ok(value)
}

fn records(text: &str, dialect: &CsvDialect) -> Result<Vec<Vec<String>>> {
    let mut reader = ::csv::ReaderBuilder::new()
        .delimiter(dialect.delimiter)
        .quote(dialect.quote)
        .escape(dialect.escape)
        .double_quote(dialect.double_quote)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    reader
        .records()
        .map(|record| {
            record
                .map(|r| r.iter().map(str::to_string).collect::<Vec<_>>())
                .map_err(csv_error)
        })
        .collect()
}

fn csv_error(err: ::csv::Error) -> Error {
    match err.position() {
        Some(pos) => Error::Parse {
            format: Format::Csv,
            line: Some(pos.line() as usize),
            column: None,
            message: err.to_string(),
        },
        None => Error::parse(Format::Csv, err),
    }
}

/// One header-mode row: padded with `Null`, extra cells dropped, and the
/// cell at `skip` (0-based) left out.
fn record(fields: &[String], row: Vec<String>, skip: Option<usize>) -> Value {
    let mut cells = row.into_iter();
    let mut map = Mapping::with_capacity(fields.len());
    for (i, field) in fields.iter().enumerate() {
        let cell = cells.next().map_or(Value::Null, Value::Text);
        if Some(i) != skip {
            map.insert(field.clone(), cell);
        }
    }
    Value::Mapping(map)
}

fn keyed(rows: Vec<Vec<String>>, column: usize) -> Result<Mapping> {
    let mut rows = rows.into_iter();
    let mut out = Mapping::new();
    let fields = match rows.next() {
        Some(fields) => fields,
        None => return Ok(out),
    };
    if column == 0 || column > fields.len() {
        return Err(Error::config(format!(
            "key_column {} is out of range for {} columns",
            column,
            fields.len()
        )));
    }
    let index = column - 1;

    // header is line 1
    for (line, row) in (2..).zip(rows) {
        let key = match row.get(index) {
            Some(key) => key.clone(),
            None => {
                log::warn!(
                    "CSV row {} has no value in key column {}; skipped",
                    line,
                    column
                );
                continue;
            }
        };
        let value = record(&fields, row, Some(index));
        if out.insert(key.clone(), value).is_some() {
            log::warn!("duplicate CSV key '{}' at row {}; keeping the last row", key, line);
        }
    }
    Ok(out)
}

/// Fails on a quoted field that is never closed.
fn check_quotes(text: &str, dialect: &CsvDialect) -> Result<()> {
    let bytes = text.as_bytes();
    let mut in_quotes = false;
    let mut field_start = true;
    let mut line = 1;
    let mut opened_at = 1;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if in_quotes {
            if Some(b) == dialect.escape {
                i += 1;
            } else if b == dialect.quote {
                if dialect.double_quote && bytes.get(i + 1) == Some(&dialect.quote) {
                    i += 1;
                } else {
                    in_quotes = false;
                }
            } else if b == b'\n' {
                line += 1;
            }
        } else {
            if b == dialect.quote && field_start {
                in_quotes = true;
                opened_at = line;
            }
            if b == b'\n' {
                line += 1;
            }
            field_start = b == dialect.delimiter || b == b'\n' || b == b'\r';
        }
        i += 1;
    }

    if in_quotes {
        return Err(Error::Parse {
            format: Format::Csv,
            line: Some(opened_at),
            column: None,
            message: "unterminated quoted field".to_string(),
        });
    }
    Ok(())
}

/// Guesses the dialect from the first lines of `sample`.
///
/// A delimiter is accepted when it occurs outside quotes the same non-zero
/// number of times on every sampled line; candidates are tried in the order
/// `,` tab `;` `|` `:`. A single quote is taken as the quote character when
/// it wraps fields and no double quote appears. Returns `None` when no
/// candidate is consistent.
///
/// ```rust
/// use canonconv::csv::sniff;
///
/// let dialect = sniff("a;b;c\n1;2;3\n").unwrap();
/// assert_eq!(dialect.delimiter, b';');
///
/// let dialect = sniff("'x'|'y, z'\n'1'|'2'\n").unwrap();
/// assert_eq!((dialect.delimiter, dialect.quote), (b'|', b'\''));
///
/// assert!(sniff("just one field\n").is_none());
/// ```
#[must_use]
pub fn sniff(sample: &str) -> Option<CsvDialect> {
    let lines: Vec<&str> = sample
        .lines()
        .filter(|line| !line.trim().is_empty())
        .take(SNIFF_LINES)
        .collect();
    if lines.is_empty() {
        return None;
    }

    let quote = if !sample.contains('"') && lines.iter().any(|line| wraps_single_quotes(line)) {
        b'\''
    } else {
        b'"'
    };

    DELIMITER_CANDIDATES
        .iter()
        .copied()
        .find(|&delimiter| {
            let mut counts = lines.iter().map(|line| count_outside_quotes(line, delimiter, quote));
            match counts.next() {
                Some(first) if first > 0 => counts.all(|n| n == first),
                _ => false,
            }
        })
        .map(|delimiter| CsvDialect::excel().with_delimiter(delimiter).with_quote(quote))
}

fn count_outside_quotes(line: &str, delimiter: u8, quote: u8) -> usize {
    let mut in_quotes = false;
    let mut count = 0;
    for b in line.bytes() {
        if b == quote {
            in_quotes = !in_quotes;
        } else if b == delimiter && !in_quotes {
            count += 1;
        }
    }
    count
}

/// `true` if some field of `line` is enclosed in single quotes.
fn wraps_single_quotes(line: &str) -> bool {
    let bytes = line.as_bytes();
    let is_boundary = |b: u8| DELIMITER_CANDIDATES.contains(&b) || b == b' ';

    bytes.iter().enumerate().any(|(start, &b)| {
        if b != b'\'' || (start > 0 && !is_boundary(bytes[start - 1])) {
            return false;
        }
        bytes[start + 1..]
            .iter()
            .position(|&c| c == b'\'')
            .map(|offset| start + 1 + offset + 1)
            .map_or(false, |after| after == bytes.len() || is_boundary(bytes[after]))
    })
}
