//! Property-based tests for the round-trip guarantees.
//!
//! Generated trees use finite floats and text from a small alphabet that
//! still covers the YAML quoting edge cases (`1e5`, `-`, `0x1`, `yes`, ...).

use canonconv::{
    json, plist, sanitize, yaml, JsonWriteOptions, Mapping, PlistWriteOptions, Value,
    YamlWriteOptions,
};
use proptest::prelude::*;

fn scalar(allow_null: bool) -> BoxedStrategy<Value> {
    let float = prop::num::f64::NORMAL | prop::num::f64::SUBNORMAL | prop::num::f64::ZERO;
    let leaf = prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        float.prop_map(Value::Float),
        "[a-zA-Z0-9 _.-]{0,12}".prop_map(Value::Text),
        prop::collection::vec(any::<u8>(), 0..24).prop_map(Value::Bytes),
    ];
    if allow_null {
        prop_oneof![Just(Value::Null), leaf].boxed()
    } else {
        leaf.boxed()
    }
}

fn tree(allow_null: bool) -> impl Strategy<Value = Value> {
    scalar(allow_null).prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Sequence),
            prop::collection::vec(("[a-z][a-z0-9_]{0,6}", inner), 0..6)
                .prop_map(|entries| Value::Mapping(entries.into_iter().collect::<Mapping>())),
        ]
    })
}

/// Equality that ignores mapping key order.
fn same_entries(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Mapping(x), Value::Mapping(y)) => {
            x.len() == y.len()
                && x.iter().all(|(k, v)| y.get(k).map_or(false, |w| same_entries(v, w)))
        }
        (Value::Sequence(x), Value::Sequence(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(v, w)| same_entries(v, w))
        }
        _ => a == b,
    }
}

proptest! {
    #[test]
    fn prop_json_round_trip(value in tree(true)) {
        for minify in [false, true] {
            let options = JsonWriteOptions::new().with_minify(minify);
            let text = json::to_string(&value, &options).unwrap();
            let back = json::from_str(&text).unwrap();
            prop_assert_eq!(&back, &value);
        }
    }

    #[test]
    fn prop_yaml_round_trip(value in tree(true)) {
        for minify in [false, true] {
            let options = YamlWriteOptions::new().with_minify(minify);
            let text = yaml::to_string(&value, &options).unwrap();
            let back = yaml::from_str(&text);
            prop_assert!(back.is_ok(), "{:?} failed to parse:\n{}", back, text);
            let back = back.unwrap();
            prop_assert_eq!(&back, &value, "emitted:\n{}", text);
        }
    }

    #[test]
    fn prop_binary_plist_round_trip(value in tree(false)) {
        let options = PlistWriteOptions::new().with_binary(true);
        let bytes = plist::to_vec(&value, &options).unwrap();
        let back = plist::from_slice(&bytes).unwrap();
        prop_assert_eq!(&back, &value);
    }

    #[test]
    fn prop_binary_plist_keeps_arbitrary_bytes(payload in prop::collection::vec(any::<u8>(), 0..512)) {
        let value = Value::Bytes(payload.clone());
        let bytes = plist::to_vec(&value, &PlistWriteOptions::new().with_binary(true)).unwrap();
        prop_assert_eq!(plist::from_slice(&bytes).unwrap(), Value::Bytes(payload));
    }

    #[test]
    fn prop_sort_orders_every_mapping(value in tree(true)) {
        let sorted = value.sorted();
        prop_assert!(same_entries(&sorted, &value));
        fn check(value: &Value) -> bool {
            match value {
                Value::Mapping(map) => {
                    let keys: Vec<_> = map.keys().collect();
                    keys.windows(2).all(|w| w[0] <= w[1]) && map.values().all(check)
                }
                Value::Sequence(items) => items.iter().all(check),
                _ => true,
            }
        }
        prop_assert!(check(&sorted));
    }

    #[test]
    fn prop_strict_json_is_left_alone(value in tree(true)) {
        let text = json::to_string(&value, &JsonWriteOptions::new()).unwrap();
        prop_assert_eq!(sanitize::strip(text.as_bytes()), text.into_bytes());
    }
}
