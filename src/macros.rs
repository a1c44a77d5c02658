/// Builds a [`Value`](crate::Value) from JSON-like syntax.
///
/// Mapping keys keep the order they are written in. Any other expression is
/// converted with `Value::from`.
///
/// ```rust
/// use canonconv::{value, Value};
///
/// let doc = value!({
///     "name": "Alice",
///     "age": 30,
///     "tags": ["rust", "yaml"],
///     "manager": null
/// });
/// assert_eq!(doc.as_mapping().unwrap().keys().next().unwrap(), "name");
///
/// let blob = value!(vec![0u8, 1, 2]);
/// assert_eq!(blob, Value::Bytes(vec![0, 1, 2]));
/// ```
#[macro_export]
macro_rules! value {
    (null) => {
        $crate::Value::Null
    };

    (true) => {
        $crate::Value::Bool(true)
    };

    (false) => {
        $crate::Value::Bool(false)
    };

    ([]) => {
        $crate::Value::Sequence(vec![])
    };

    ([ $($elem:tt),* $(,)? ]) => {
        $crate::Value::Sequence(vec![$($crate::value!($elem)),*])
    };

    ({}) => {
        $crate::Value::Mapping($crate::Mapping::new())
    };

    ({ $($key:literal : $value:tt),* $(,)? }) => {{
        let mut mapping = $crate::Mapping::new();
        $(
            mapping.insert($key.to_string(), $crate::value!($value));
        )*
        $crate::Value::Mapping(mapping)
    }};

    ($other:expr) => {
        $crate::Value::from($other)
    };
}

#[cfg(test)]
mod tests {
    use crate::{Mapping, Value};

    #[test]
    fn test_value_macro_primitives() {
        assert_eq!(value!(null), Value::Null);
        assert_eq!(value!(true), Value::Bool(true));
        assert_eq!(value!(42), Value::Int(42));
        assert_eq!(value!(3.5), Value::Float(3.5));
        assert_eq!(value!(1.0), Value::Float(1.0));
        assert_eq!(value!("hello"), Value::Text("hello".to_string()));
    }

    #[test]
    fn test_value_macro_nesting_keeps_order() {
        assert_eq!(value!({}), Value::Mapping(Mapping::new()));
        assert_eq!(value!([]), Value::Sequence(vec![]));

        let doc = value!({"z": [1, {"y": null}], "a": false});
        let map = doc.as_mapping().unwrap();
        assert_eq!(map.keys().collect::<Vec<_>>(), ["z", "a"]);

        let mut inner = Mapping::new();
        inner.insert("y".to_string(), Value::Null);
        assert_eq!(
            map.get("z"),
            Some(&Value::Sequence(vec![Value::Int(1), Value::Mapping(inner)]))
        );
    }
}
