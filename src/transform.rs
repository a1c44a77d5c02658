//! Whole-tree passes over canonical values.
//!
//! None of these run implicitly. Writers call [`prepare_for_text`] when the
//! target has no binary or date type (XML); the coercions are opt-in stages a
//! caller can apply between reading and writing, typically when moving data
//! out of a format that stores everything as text:
//!
//! ```rust
//! use canonconv::{transform, value, Value};
//!
//! let from_xml = value!({"port": "8080", "debug": "True", "ratio": "0.5"});
//! let typed = transform::coerce_scalars(from_xml);
//! assert_eq!(typed, value!({"port": 8080, "debug": true, "ratio": 0.5}));
//! ```

use crate::{Timestamp, Value};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// Applies `f` to every scalar in the tree, rebuilding containers in order.
fn map_scalars<F>(value: Value, f: &F) -> Value
where
    F: Fn(Value) -> Value,
{
    match value {
        Value::Sequence(items) => {
            Value::Sequence(items.into_iter().map(|v| map_scalars(v, f)).collect())
        }
        Value::Mapping(map) => Value::Mapping(
            map.into_iter()
                .map(|(k, v)| (k, map_scalars(v, f)))
                .collect(),
        ),
        scalar => f(scalar),
    }
}

/// Turns `Bytes` into base64 `Text` and `Timestamp` into ISO-8601 `Text`.
///
/// Used before writing formats whose only scalar type is text.
///
/// ```rust
/// use canonconv::{transform, Value};
///
/// let out = transform::prepare_for_text(Value::Bytes(b"hi".to_vec()));
/// assert_eq!(out, Value::from("aGk="));
/// ```
#[must_use]
pub fn prepare_for_text(value: Value) -> Value {
    map_scalars(value, &|scalar| match scalar {
        Value::Bytes(bytes) => Value::Text(STANDARD.encode(bytes)),
        Value::Timestamp(ts) => Value::Text(ts.to_iso8601()),
        other => other,
    })
}

/// Converts `Text` spelling a boolean, an integer or a float into that kind.
///
/// Booleans match `true`/`false` in any case. Integers are plain ASCII digit
/// runs that fit in an `i64`; anything else that parses as a float becomes a
/// `Float`. Other text is left alone.
#[must_use]
pub fn coerce_scalars(value: Value) -> Value {
    map_scalars(value, &|scalar| match scalar {
        Value::Text(text) => coerce_text(text),
        other => other,
    })
}

fn coerce_text(text: String) -> Value {
    if text.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if text.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(i) = text.parse::<i64>() {
            return Value::Int(i);
        }
    }
    match text.trim().parse::<f64>() {
        Ok(f) => Value::Float(f),
        Err(_) => Value::Text(text),
    }
}

/// Converts `Text` that is entirely an ISO-8601 date-time into a `Timestamp`.
///
/// ```rust
/// use canonconv::{transform, value};
///
/// let out = transform::detect_timestamps(value!({"at": "2024-01-02T03:04:05Z", "id": "x"}));
/// assert!(out.as_mapping().unwrap().get("at").unwrap().is_timestamp());
/// ```
#[must_use]
pub fn detect_timestamps(value: Value) -> Value {
    map_scalars(value, &|scalar| match scalar {
        Value::Text(text) => match Timestamp::parse_iso8601(&text) {
            Some(ts) if text.contains(['T', 't', ' ']) => Value::Timestamp(ts),
            _ => Value::Text(text),
        },
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Mapping;

    #[test]
    fn test_prepare_for_text_recurses() {
        let ts = Timestamp::parse_iso8601("2020-05-06T07:08:09Z").unwrap();
        let mut map = Mapping::new();
        map.insert("blob".to_string(), Value::Bytes(vec![0, 1, 2]));
        map.insert(
            "times".to_string(),
            Value::Sequence(vec![Value::Timestamp(ts), Value::Int(3)]),
        );

        let out = prepare_for_text(Value::Mapping(map));
        let map = out.as_mapping().unwrap();
        assert_eq!(map.get("blob"), Some(&Value::from("AAEC")));
        assert_eq!(
            map.get("times"),
            Some(&Value::Sequence(vec![
                Value::from("2020-05-06T07:08:09Z"),
                Value::Int(3)
            ]))
        );
    }

    #[test]
    fn test_coerce_text() {
        assert_eq!(coerce_text("TRUE".into()), Value::Bool(true));
        assert_eq!(coerce_text("false".into()), Value::Bool(false));
        assert_eq!(coerce_text("42".into()), Value::Int(42));
        assert_eq!(coerce_text("-42".into()), Value::Float(-42.0));
        assert_eq!(coerce_text("1.5".into()), Value::Float(1.5));
        assert_eq!(coerce_text("1e3".into()), Value::Float(1000.0));
        assert_eq!(coerce_text("99999999999999999999".into()), Value::Float(1e20));
        assert_eq!(coerce_text("yes".into()), Value::from("yes"));
        assert_eq!(coerce_text("".into()), Value::from(""));
        assert_eq!(coerce_text("12abc".into()), Value::from("12abc"));
    }

    #[test]
    fn test_coerce_leaves_keys_and_other_kinds() {
        let mut map = Mapping::new();
        map.insert("1".to_string(), Value::Bytes(b"1".to_vec()));
        let out = coerce_scalars(Value::Mapping(map.clone()));
        assert_eq!(out, Value::Mapping(map));
    }

    #[test]
    fn test_detect_timestamps_needs_time_part() {
        let out = detect_timestamps(Value::from("2020-01-01"));
        assert_eq!(out, Value::from("2020-01-01"));

        let out = detect_timestamps(Value::from("2020-01-01 10:00:00"));
        assert!(out.is_timestamp());

        let out = detect_timestamps(Value::from("not a date"));
        assert_eq!(out, Value::from("not a date"));
    }
}
