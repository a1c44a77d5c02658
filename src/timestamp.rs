//! Date-time values carried through conversions.
//!
//! A [`Timestamp`] is either *naive* (the source had no UTC offset) or carries
//! a fixed offset. Conversions never normalize between the two unless the
//! target format requires it: property lists store UTC instants, so a naive
//! timestamp written to a plist is taken as UTC.
//!
//! The textual form is ISO-8601. Parsing accepts the YAML 1.1 timestamp
//! grammar, which is a superset of RFC 3339:
//!
//! ```text
//! 2001-12-14                      date only (midnight, naive)
//! 2001-12-14T21:59:43.10          naive date-time
//! 2001-12-14 21:59:43.10 -5       space separated, short offset
//! 2001-12-15T02:59:43.1Z          UTC
//! ```

use chrono::{
    DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeZone, Utc,
};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A date-time with sub-second precision and an optional fixed UTC offset.
///
/// # Examples
///
/// ```rust
/// use canonconv::Timestamp;
///
/// let ts = Timestamp::parse_iso8601("2024-03-01T12:30:00.250+02:00").unwrap();
/// assert!(ts.offset().is_some());
/// assert_eq!(ts.to_iso8601(), "2024-03-01T12:30:00.250+02:00");
///
/// let naive = Timestamp::parse_iso8601("2024-03-01 12:30:00").unwrap();
/// assert_eq!(naive.to_iso8601(), "2024-03-01T12:30:00");
/// ```
#[derive(Clone, Copy, Debug)]
pub enum Timestamp {
    Naive(NaiveDateTime),
    Offset(DateTime<FixedOffset>),
}

/// Two offset timestamps are equal only when both the instant and the
/// offset match; `12:00+02:00` and `10:00Z` differ.
impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Timestamp::Naive(a), Timestamp::Naive(b)) => a == b,
            (Timestamp::Offset(a), Timestamp::Offset(b)) => a == b && a.offset() == b.offset(),
            _ => false,
        }
    }
}

impl Eq for Timestamp {}

impl Hash for Timestamp {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Timestamp::Naive(dt) => {
                0u8.hash(state);
                dt.hash(state);
            }
            Timestamp::Offset(dt) => {
                1u8.hash(state);
                dt.naive_utc().hash(state);
                dt.offset().local_minus_utc().hash(state);
            }
        }
    }
}

impl Timestamp {
    /// Wraps a UTC instant, keeping the `Z` offset.
    #[must_use]
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Timestamp::Offset(dt.into())
    }

    /// Returns the UTC offset, or `None` for a naive timestamp.
    #[must_use]
    pub fn offset(&self) -> Option<FixedOffset> {
        match self {
            Timestamp::Naive(_) => None,
            Timestamp::Offset(dt) => Some(*dt.offset()),
        }
    }

    /// Returns the wall-clock date-time as written in the source.
    #[must_use]
    pub fn local(&self) -> NaiveDateTime {
        match self {
            Timestamp::Naive(dt) => *dt,
            Timestamp::Offset(dt) => dt.naive_local(),
        }
    }

    /// Returns the instant in UTC. Naive timestamps are taken as UTC.
    #[must_use]
    pub fn to_utc(&self) -> DateTime<Utc> {
        match self {
            Timestamp::Naive(dt) => Utc.from_utc_datetime(dt),
            Timestamp::Offset(dt) => dt.with_timezone(&Utc),
        }
    }

    /// Formats the timestamp as ISO-8601.
    ///
    /// Fractional seconds are printed only when non-zero; a zero offset is
    /// written as `Z`.
    #[must_use]
    pub fn to_iso8601(&self) -> String {
        match self {
            Timestamp::Naive(dt) => dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
            Timestamp::Offset(dt) => dt.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        }
    }

    /// Parses an ISO-8601 / YAML timestamp. Returns `None` when `text` is not
    /// entirely a timestamp.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use canonconv::Timestamp;
    ///
    /// assert!(Timestamp::parse_iso8601("2001-12-14t21:59:43.10-05:00").is_some());
    /// assert!(Timestamp::parse_iso8601("2001-12-14").is_some());
    /// assert!(Timestamp::parse_iso8601("2001-13-14").is_none());
    /// assert!(Timestamp::parse_iso8601("version 2001-12-14").is_none());
    /// ```
    #[must_use]
    pub fn parse_iso8601(text: &str) -> Option<Timestamp> {
        let mut cur = Cursor::new(text.trim());

        let year = cur.digits(4, 4)?;
        cur.expect(b'-')?;
        let month = cur.digits(1, 2)?;
        cur.expect(b'-')?;
        let day = cur.digits(1, 2)?;
        let date = NaiveDate::from_ymd_opt(year as i32, month, day)?;

        if cur.at_end() {
            return Some(Timestamp::Naive(date.and_hms_opt(0, 0, 0)?));
        }

        match cur.peek()? {
            b'T' | b't' => cur.bump(),
            b' ' | b'\t' => cur.skip_blanks(),
            _ => return None,
        }

        let hour = cur.digits(1, 2)?;
        cur.expect(b':')?;
        let minute = cur.digits(2, 2)?;
        cur.expect(b':')?;
        let second = cur.digits(2, 2)?;
        let nanos = if cur.peek() == Some(b'.') {
            cur.bump();
            cur.fraction_nanos()?
        } else {
            0
        };
        let time = NaiveTime::from_hms_nano_opt(hour, minute, second, nanos)?;
        let local = date.and_time(time);

        cur.skip_blanks();
        if cur.at_end() {
            return Some(Timestamp::Naive(local));
        }

        let offset = match cur.peek()? {
            b'Z' | b'z' => {
                cur.bump();
                FixedOffset::east_opt(0)?
            }
            sign @ (b'+' | b'-') => {
                cur.bump();
                let hours = cur.digits(1, 2)? as i32;
                let minutes = if cur.peek() == Some(b':') {
                    cur.bump();
                    cur.digits(2, 2)? as i32
                } else if cur.remaining() == 2 {
                    cur.digits(2, 2)? as i32
                } else {
                    0
                };
                let secs = hours * 3600 + minutes * 60;
                if sign == b'-' {
                    FixedOffset::west_opt(secs)?
                } else {
                    FixedOffset::east_opt(secs)?
                }
            }
            _ => return None,
        };

        if !cur.at_end() {
            return None;
        }
        offset
            .from_local_datetime(&local)
            .single()
            .map(Timestamp::Offset)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

impl From<NaiveDateTime> for Timestamp {
    fn from(dt: NaiveDateTime) -> Self {
        Timestamp::Naive(dt)
    }
}

impl From<DateTime<FixedOffset>> for Timestamp {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        Timestamp::Offset(dt)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Timestamp::from_utc(dt)
    }
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Cursor {
            bytes: text.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.pos)
    }

    fn expect(&mut self, byte: u8) -> Option<()> {
        if self.peek() == Some(byte) {
            self.bump();
            Some(())
        } else {
            None
        }
    }

    fn skip_blanks(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t')) {
            self.bump();
        }
    }

    fn digits(&mut self, min: usize, max: usize) -> Option<u32> {
        let start = self.pos;
        let mut value = 0u32;
        while self.pos - start < max {
            match self.peek() {
                Some(b @ b'0'..=b'9') => {
                    value = value * 10 + u32::from(b - b'0');
                    self.bump();
                }
                _ => break,
            }
        }
        if self.pos - start < min {
            return None;
        }
        Some(value)
    }

    fn fraction_nanos(&mut self) -> Option<u32> {
        let start = self.pos;
        let mut nanos = 0u32;
        let mut scale = 100_000_000u32;
        while let Some(b @ b'0'..=b'9') = self.peek() {
            nanos += u32::from(b - b'0') * scale;
            scale /= 10;
            self.bump();
        }
        if self.pos == start {
            return None;
        }
        Some(nanos)
    }
}
