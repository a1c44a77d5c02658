use canonconv::{value, Mapping, Timestamp, Value};

#[test]
fn test_value_macro_null() {
    assert_eq!(value!(null), Value::Null);
}

#[test]
fn test_value_macro_booleans() {
    assert_eq!(value!(true), Value::Bool(true));
    assert_eq!(value!(false), Value::Bool(false));
}

#[test]
fn test_value_macro_numbers() {
    assert_eq!(value!(42), Value::Int(42));
    assert_eq!(value!(-123), Value::Int(-123));
    assert_eq!(value!(3.5), Value::Float(3.5));
    assert_eq!(value!(2.0), Value::Float(2.0));
    assert_eq!(value!(u32::MAX), Value::Int(i64::from(u32::MAX)));
}

#[test]
fn test_value_macro_strings() {
    assert_eq!(value!("hello world"), Value::Text("hello world".to_string()));
    assert_eq!(value!(""), Value::Text(String::new()));
    assert_eq!(value!(String::from("owned")), Value::from("owned"));
}

#[test]
fn test_value_macro_bytes_and_timestamps() {
    assert_eq!(value!(vec![1u8, 2]), Value::Bytes(vec![1, 2]));
    assert_eq!(value!(&b"raw"[..]), Value::Bytes(b"raw".to_vec()));

    let ts = Timestamp::parse_iso8601("2024-02-29T00:00:00Z").unwrap();
    assert_eq!(value!(ts), Value::Timestamp(ts));
}

#[test]
fn test_value_macro_sequences() {
    assert_eq!(value!([]), Value::Sequence(vec![]));
    assert_eq!(
        value!([1, "two", null, [true]]),
        Value::Sequence(vec![
            Value::Int(1),
            Value::from("two"),
            Value::Null,
            Value::Sequence(vec![Value::Bool(true)]),
        ])
    );
    assert_eq!(value!([(-1), (-2.5)]), Value::Sequence(vec![Value::Int(-1), Value::Float(-2.5)]));
}

#[test]
fn test_value_macro_mappings_keep_order() {
    assert_eq!(value!({}), Value::Mapping(Mapping::new()));

    let value = value!({
        "zeta": 1,
        "alpha": {"nested": [1, 2]},
        "mid": null,
    });
    let map = value.as_mapping().unwrap();
    assert_eq!(map.keys().collect::<Vec<_>>(), ["zeta", "alpha", "mid"]);
    assert_eq!(
        map.get("alpha").and_then(|v| v.as_mapping()).and_then(|m| m.get("nested")),
        Some(&value!([1, 2]))
    );
}

#[test]
fn test_value_macro_option() {
    let some: Option<i32> = Some(5);
    let none: Option<i32> = None;
    assert_eq!(value!(some), Value::Int(5));
    assert_eq!(value!(none), Value::Null);
}
