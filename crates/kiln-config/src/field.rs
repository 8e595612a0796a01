//! Shape validation over `serde_json` values
//!
//! Every property lookup yields a [`Field`], so callers handle "missing" and
//! "wrong type" uniformly instead of repeating type checks at each level.

use serde_json::{Map, Value};

/// Outcome of looking up one property
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Field<T> {
    Present(T),
    Absent,
    Malformed(String),
}

/// Read-only view over a JSON object that knows its own property path
#[derive(Debug, Clone)]
pub(crate) struct ObjectReader<'a> {
    object: &'a Map<String, Value>,
    path: Option<String>,
}

impl<'a> ObjectReader<'a> {
    pub(crate) fn root(value: &'a Value) -> Field<ObjectReader<'a>> {
        match value {
            Value::Object(object) => Field::Present(Self { object, path: None }),
            other => Field::Malformed(format!("expected an object, found {}", kind(other))),
        }
    }

    /// Dotted path of a property inside this object, e.g. `java.sources`
    pub(crate) fn property_path(&self, name: &str) -> String {
        match &self.path {
            Some(path) => format!("{}.{}", path, name),
            None => name.to_string(),
        }
    }

    pub(crate) fn value(&self, name: &str) -> Option<&'a Value> {
        self.object.get(name)
    }

    pub(crate) fn string(&self, name: &str) -> Field<String> {
        match self.value(name) {
            None => Field::Absent,
            Some(value) => as_string(value),
        }
    }

    pub(crate) fn number(&self, name: &str) -> Field<f64> {
        match self.value(name) {
            None => Field::Absent,
            Some(Value::Number(number)) => match number.as_f64() {
                Some(n) => Field::Present(n),
                None => Field::Malformed("expected a finite number".to_string()),
            },
            Some(other) => Field::Malformed(format!("expected a number, found {}", kind(other))),
        }
    }

    pub(crate) fn object(&self, name: &str) -> Field<ObjectReader<'a>> {
        match self.value(name) {
            None => Field::Absent,
            Some(value) => nested(value, self.property_path(name)),
        }
    }

    pub(crate) fn array(&self, name: &str) -> Field<&'a Vec<Value>> {
        match self.value(name) {
            None => Field::Absent,
            Some(Value::Array(items)) => Field::Present(items),
            Some(other) => Field::Malformed(format!("expected an array, found {}", kind(other))),
        }
    }
}

/// Interpret an arbitrary value as an object reader rooted at `path`
pub(crate) fn nested(value: &Value, path: String) -> Field<ObjectReader<'_>> {
    match value {
        Value::Object(object) => Field::Present(ObjectReader {
            object,
            path: Some(path),
        }),
        other => Field::Malformed(format!("expected an object, found {}", kind(other))),
    }
}

pub(crate) fn as_string(value: &Value) -> Field<String> {
    match value {
        Value::String(s) => Field::Present(s.clone()),
        other => Field::Malformed(format!("expected a string, found {}", kind(other))),
    }
}

/// Human-readable JSON type name for diagnostics
pub(crate) fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_root_must_be_object() {
        assert!(matches!(ObjectReader::root(&json!({})), Field::Present(_)));
        assert!(matches!(
            ObjectReader::root(&json!([1])),
            Field::Malformed(reason) if reason == "expected an object, found an array"
        ));
    }

    #[test]
    fn test_string_field_states() {
        let doc = json!({ "a": "x", "b": 5 });
        let Field::Present(reader) = ObjectReader::root(&doc) else {
            panic!("root should be an object");
        };
        assert_eq!(reader.string("a"), Field::Present("x".to_string()));
        assert_eq!(reader.string("missing"), Field::Absent);
        assert_eq!(
            reader.string("b"),
            Field::Malformed("expected a string, found a number".to_string())
        );
    }

    #[test]
    fn test_nested_property_path() {
        let doc = json!({ "java": { "sources": {} } });
        let Field::Present(root) = ObjectReader::root(&doc) else {
            panic!("root should be an object");
        };
        let Field::Present(java) = root.object("java") else {
            panic!("java should be an object");
        };
        assert_eq!(java.property_path("sources"), "java.sources");
        assert_eq!(root.property_path("publisher"), "publisher");
    }
}
