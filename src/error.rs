//! Error types for reading and writing canonical values.
//!
//! Every reader and writer in this crate fails fast with exactly one of four
//! kinds of error:
//!
//! - **Parse**: the input is not valid for the stated format (bad JSON, YAML
//!   or XML grammar, truncated plist, malformed CSV quoting)
//! - **Unsupported value**: a value cannot be represented in the target format
//!   without an explicit fallback (for example `Null` in a property list)
//! - **Config**: option values are inconsistent with each other or with the input
//! - **I/O**: the underlying stream failed
//!
//! ## Examples
//!
//! ```rust
//! use canonconv::{json, ErrorKind};
//!
//! let err = json::from_str("{\"a\": }").unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::Parse);
//! assert!(err.to_string().contains("line 1"));
//! ```

use crate::options::Format;
use std::fmt;
use std::io;
use thiserror::Error;

/// Represents all possible errors raised by the conversion engine.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Malformed input for the stated format
    #[error("{format} parse error{}: {message}", Position(.line, .column))]
    Parse {
        format: Format,
        line: Option<usize>,
        column: Option<usize>,
        message: String,
    },

    /// A value the target format cannot represent
    #[error("{format} cannot represent {message}")]
    UnsupportedValue { format: Format, message: String },

    /// Inconsistent or unknown options
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error during reading or writing
    #[error("IO error: {0}")]
    Io(String),
}

/// The four error categories, for callers that only need to branch on the kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Parse,
    UnsupportedValue,
    Config,
    Io,
}

struct Position<'a>(&'a Option<usize>, &'a Option<usize>);

impl fmt::Display for Position<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (*self.0, *self.1) {
            (Some(line), Some(col)) => write!(f, " at line {}, column {}", line, col),
            (Some(line), None) => write!(f, " at line {}", line),
            _ => Ok(()),
        }
    }
}

impl Error {
    /// Creates a parse error without position information.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use canonconv::{Error, Format};
    ///
    /// let err = Error::parse(Format::Plist, "truncated trailer");
    /// assert!(err.to_string().contains("truncated trailer"));
    /// ```
    pub fn parse<T: fmt::Display>(format: Format, msg: T) -> Self {
        Error::Parse {
            format,
            line: None,
            column: None,
            message: msg.to_string(),
        }
    }

    /// Creates a parse error with a 1-based line and column.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use canonconv::{Error, Format};
    ///
    /// let err = Error::parse_at(Format::Json, 3, 7, "expected value");
    /// assert!(err.to_string().contains("line 3, column 7"));
    /// ```
    pub fn parse_at<T: fmt::Display>(format: Format, line: usize, col: usize, msg: T) -> Self {
        Error::Parse {
            format,
            line: Some(line),
            column: Some(col),
            message: msg.to_string(),
        }
    }

    /// Creates an unsupported value error for the given target format.
    pub fn unsupported<T: fmt::Display>(format: Format, msg: T) -> Self {
        Error::UnsupportedValue {
            format,
            message: msg.to_string(),
        }
    }

    /// Creates a configuration error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use canonconv::Error;
    ///
    /// let err = Error::config("key_column 4 is out of range for 2 columns");
    /// assert!(err.to_string().contains("out of range"));
    /// ```
    pub fn config<T: fmt::Display>(msg: T) -> Self {
        Error::Config(msg.to_string())
    }

    /// Creates an I/O error for stream reading/writing failures.
    pub fn io(msg: &str) -> Self {
        Error::Io(msg.to_string())
    }

    /// Returns the category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Error::Parse { .. } => ErrorKind::Parse,
            Error::UnsupportedValue { .. } => ErrorKind::UnsupportedValue,
            Error::Config(_) => ErrorKind::Config,
            Error::Io(_) => ErrorKind::Io,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = Error::parse_at(Format::Yaml, 2, 5, "mapping values are not allowed here");
        assert_eq!(
            err.to_string(),
            "YAML parse error at line 2, column 5: mapping values are not allowed here"
        );

        let err = Error::parse(Format::Plist, "bad magic");
        assert_eq!(err.to_string(), "plist parse error: bad magic");
    }

    #[test]
    fn test_kinds() {
        assert_eq!(Error::parse(Format::Xml, "x").kind(), ErrorKind::Parse);
        assert_eq!(
            Error::unsupported(Format::Plist, "null").kind(),
            ErrorKind::UnsupportedValue
        );
        assert_eq!(Error::config("x").kind(), ErrorKind::Config);
        let io_err = io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed");
        assert_eq!(Error::from(io_err).kind(), ErrorKind::Io);
    }

    #[test]
    fn test_unsupported_display() {
        let err = Error::unsupported(Format::Plist, "null at /a/0");
        assert_eq!(err.to_string(), "plist cannot represent null at /a/0");
    }
}
