use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One data row. Opaque to the exporter except for what columns pull out of it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    /// Resolve a dot path such as `author.name`.
    ///
    /// When a segment lands on an array, the rest of the path is applied to
    /// every element and the results are flattened into one array, so a
    /// "has many" relation yields a list-valued state. Numeric segments index
    /// into arrays directly.
    pub fn get(&self, path: &str) -> Option<Value> {
        if let Some(value) = self.0.get(path) {
            return Some(value.clone());
        }

        let mut segments = path.split('.');
        let first = segments.next()?;
        let rest: Vec<&str> = segments.collect();
        let root = self.0.get(first)?;

        lookup(root, &rest)
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

fn lookup(value: &Value, path: &[&str]) -> Option<Value> {
    let Some((segment, rest)) = path.split_first() else {
        return Some(value.clone());
    };

    match value {
        Value::Object(map) => map.get(*segment).and_then(|inner| lookup(inner, rest)),
        Value::Array(items) => {
            if let Ok(position) = segment.parse::<usize>() {
                return items.get(position).and_then(|inner| lookup(inner, rest));
            }

            let mut collected = Vec::new();
            for item in items {
                match lookup(item, path) {
                    Some(Value::Array(nested)) => collected.extend(nested),
                    Some(Value::Null) | None => {}
                    Some(other) => collected.push(other),
                }
            }
            Some(Value::Array(collected))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_top_level_field() {
        let record = record(json!({"id": 7, "name": "Ada"}));
        assert_eq!(record.get("name"), Some(json!("Ada")));
        assert_eq!(record.get("missing"), None);
    }

    #[test]
    fn test_nested_path() {
        let record = record(json!({"author": {"name": "Grace", "address": {"city": "Arlington"}}}));
        assert_eq!(record.get("author.name"), Some(json!("Grace")));
        assert_eq!(record.get("author.address.city"), Some(json!("Arlington")));
        assert_eq!(record.get("author.email"), None);
    }

    #[test]
    fn test_path_through_array_collects_values() {
        let record = record(json!({
            "tags": [{"name": "a"}, {"name": "b"}, {"label": "no name"}, {"name": "c"}]
        }));
        assert_eq!(record.get("tags.name"), Some(json!(["a", "b", "c"])));
    }

    #[test]
    fn test_numeric_segment_indexes_array() {
        let record = record(json!({"tags": [{"name": "first"}, {"name": "second"}]}));
        assert_eq!(record.get("tags.1.name"), Some(json!("second")));
        assert_eq!(record.get("tags.5.name"), None);
    }

    #[test]
    fn test_literal_dotted_key_wins() {
        let record = record(json!({"meta.count": 3, "meta": {"count": 4}}));
        assert_eq!(record.get("meta.count"), Some(json!(3)));
    }
}
