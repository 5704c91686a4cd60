use super::ParseError;
use serde_json::Value;

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonParser;

/// One step of a [`JsonParser::extract_value`] path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

impl JsonParser {
    pub fn parse_json(&self, content: &str) -> Result<Value, ParseError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Follows `path` through objects (keys) and arrays (indices).
    /// Returns `None` as soon as a step does not apply.
    pub fn extract_value<'a>(&self, value: &'a Value, path: &[PathSegment]) -> Option<&'a Value> {
        path.iter().try_fold(value, |current, segment| match (current, segment) {
            (Value::Object(map), PathSegment::Key(key)) => map.get(key),
            (Value::Array(items), PathSegment::Index(index)) => items.get(*index),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "data": {
                "records": [
                    {"date": "2024-05-01", "general": {"temperature": {"low": 24, "high": 33}}},
                    {"date": "2024-05-02"}
                ]
            }
        })
    }

    #[test]
    fn test_extract_value_follows_keys_and_indices() {
        let value = sample();
        let path: Vec<PathSegment> = vec![
            "data".into(),
            "records".into(),
            0usize.into(),
            "general".into(),
            "temperature".into(),
            "high".into(),
        ];
        assert_eq!(JsonParser.extract_value(&value, &path), Some(&json!(33)));
    }

    #[test]
    fn test_extract_value_empty_path_is_root() {
        let value = sample();
        assert_eq!(JsonParser.extract_value(&value, &[]), Some(&value));
    }

    #[test]
    fn test_extract_value_missing() {
        let value = sample();
        let out_of_range: Vec<PathSegment> = vec!["data".into(), "records".into(), 5usize.into()];
        let index_on_object: Vec<PathSegment> = vec!["data".into(), 0usize.into()];
        let key_on_array: Vec<PathSegment> = vec!["data".into(), "records".into(), "date".into()];

        assert_eq!(JsonParser.extract_value(&value, &out_of_range), None);
        assert_eq!(JsonParser.extract_value(&value, &index_on_object), None);
        assert_eq!(JsonParser.extract_value(&value, &key_on_array), None);
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        for input in ["", "{", "{\"a\": }", "[1, 2", "nope"] {
            let result = JsonParser.parse_json(input);
            assert!(
                matches!(result, Err(ParseError::Json(_))),
                "expected error for {:?}",
                input
            );
        }
    }

    fn arb_json() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| json!(n)),
            any::<u64>().prop_map(|n| json!(n)),
            "[ -~]{0,12}".prop_map(Value::String),
        ];
        leaf.prop_recursive(4, 32, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
                prop::collection::hash_map("[a-z]{1,6}", inner, 0..6)
                    .prop_map(|map| Value::Object(map.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn test_parse_serialize_round_trip(value in arb_json()) {
            let serialized = serde_json::to_string(&value).unwrap();
            let parsed = JsonParser.parse_json(&serialized).unwrap();
            prop_assert_eq!(parsed, value);
        }
    }
}
