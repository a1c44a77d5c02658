use canonconv::{
    read_yaml, value, write_yaml, yaml, Error, ErrorKind, Timestamp, Value, YamlReadOptions,
    YamlWriteOptions,
};

#[test]
fn test_scalar_kinds() {
    let text = "\
null_value: ~
empty:
flag: yes
other_flag: Off
count: 42
hex: 0xff
ratio: 2.5
big: 1e3
infinite: -.inf
day: 2002-12-14
name: plain text
quoted: '2002-12-14'
";
    let value = read_yaml(text.as_bytes(), &YamlReadOptions::new()).unwrap();
    let map = value.as_mapping().unwrap();
    assert_eq!(map.get("null_value"), Some(&Value::Null));
    assert_eq!(map.get("empty"), Some(&Value::Null));
    assert_eq!(map.get("flag"), Some(&Value::Bool(true)));
    assert_eq!(map.get("other_flag"), Some(&Value::Bool(false)));
    assert_eq!(map.get("count"), Some(&Value::Int(42)));
    assert_eq!(map.get("hex"), Some(&Value::Int(255)));
    assert_eq!(map.get("ratio"), Some(&Value::Float(2.5)));
    assert_eq!(map.get("big"), Some(&Value::Float(1000.0)));
    assert_eq!(map.get("infinite"), Some(&Value::Float(f64::NEG_INFINITY)));
    assert_eq!(
        map.get("day").and_then(Value::as_timestamp).map(Timestamp::to_iso8601),
        Some("2002-12-14T00:00:00".to_string())
    );
    assert_eq!(map.get("name"), Some(&Value::from("plain text")));
    assert_eq!(map.get("quoted"), Some(&Value::from("2002-12-14")));
}

#[test]
fn test_timestamp_forms() {
    let text = "\
canonical: 2001-12-15T02:59:43.1Z
spaced: 2001-12-14 21:59:43.10 -5
naive: 2001-12-14 21:59:43
";
    let value = yaml::from_str(text).unwrap();
    let map = value.as_mapping().unwrap();
    let stamp = |key: &str| *map.get(key).unwrap().as_timestamp().unwrap();

    assert_eq!(stamp("canonical").to_iso8601(), "2001-12-15T02:59:43.100Z");
    assert_eq!(stamp("spaced").to_iso8601(), "2001-12-14T21:59:43.100-05:00");
    assert_eq!(stamp("spaced").to_utc(), stamp("canonical").to_utc());
    assert_eq!(stamp("naive").offset(), None);
}

#[test]
fn test_binary_block_scalar() {
    let text = "icon: !!binary |\n  R0lGODlhDAAMAIQAAP//\n  9/X17unp5Q==\n";
    let value = yaml::from_str(text).unwrap();
    let bytes = value.as_mapping().unwrap().get("icon").unwrap().as_bytes().unwrap();
    assert!(bytes.starts_with(b"GIF89a"));
}

#[test]
fn test_collections_and_order() {
    let text = "\
zeta:
  - 1
  - [2, 3]
  - {inner: true}
alpha: {}
mid: []
";
    let value = yaml::from_str(text).unwrap();
    assert_eq!(
        value,
        value!({
            "zeta": [1, [2, 3], {"inner": true}],
            "alpha": {},
            "mid": []
        })
    );
}

#[test]
fn test_merge_sequence_earlier_source_wins() {
    let text = "\
a: &a {x: 1, y: 1}
b: &b {y: 2, z: 2}
c:
  <<: [*a, *b]
  z: 3
";
    let value = yaml::from_str(text).unwrap();
    let c = value.as_mapping().unwrap().get("c").unwrap();
    assert_eq!(c, &value!({"x": 1, "y": 1, "z": 3}));
}

#[test]
fn test_quoted_merge_key_is_plain_key() {
    let value = yaml::from_str("\"<<\": 1\n").unwrap();
    assert_eq!(value, value!({"<<": 1}));
}

#[test]
fn test_unknown_alias_and_bad_binary() {
    let err = yaml::from_str("a: *nowhere\n").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);

    let err = yaml::from_str("a: !!binary '***'\n").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
}

#[test]
fn test_parse_error_carries_position() {
    let err = yaml::from_str("key: value\n  - broken: [\n").unwrap_err();
    match err {
        Error::Parse { line, column, .. } => {
            assert!(line.is_some());
            assert!(column.is_some());
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_text_that_looks_typed_is_quoted() {
    let value = value!({
        "a": "true",
        "b": "0755",
        "c": "null",
        "d": "2020-01-01",
        "e": "- dash",
        "f": "x: y",
        "g": "multi\nline",
        "h": ""
    });
    let text = yaml::to_string(&value, &YamlWriteOptions::new()).unwrap();
    assert_eq!(
        text,
        "a: \"true\"\nb: \"0755\"\nc: \"null\"\nd: \"2020-01-01\"\ne: \"- dash\"\nf: \"x: y\"\ng: \"multi\\nline\"\nh: \"\"\n"
    );
    assert_eq!(yaml::from_str(&text).unwrap(), value);
}

#[test]
fn test_sorted_output() {
    let value = value!({"b": {"z": 1, "a": 2}, "a": [{"y": 1, "x": 2}]});
    let text = yaml::to_string(&value, &YamlWriteOptions::new().with_sort(true)).unwrap();
    assert_eq!(text, "a:\n  - x: 2\n    y: 1\nb:\n  a: 2\n  z: 1\n");
}

#[test]
fn test_round_trip_through_writer() {
    let ts = Timestamp::parse_iso8601("2023-05-06T07:08:09.5+05:30").unwrap();
    let value = value!({
        "name": "Zoë",
        "blob": (vec![1u8, 2, 3, 250]),
        "when": ts,
        "floats": [1.0, (-2.5), 1e-7],
        "nested": [[], {}, [null]]
    });

    for options in [YamlWriteOptions::new(), YamlWriteOptions::new().with_minify(true)] {
        let mut out = Vec::new();
        write_yaml(&value, &mut out, &options).unwrap();
        assert_eq!(read_yaml(&out[..], &YamlReadOptions::new()).unwrap(), value);
    }
}

#[test]
fn test_top_level_scalars() {
    for value in [Value::Null, Value::Int(7), Value::from("text"), Value::Bytes(vec![])] {
        let text = yaml::to_string(&value, &YamlWriteOptions::new()).unwrap();
        assert!(text.ends_with('\n'));
        assert_eq!(yaml::from_str(&text).unwrap(), value);
    }
}
