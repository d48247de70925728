//! Raw request parameters as seen by store API routes.

use std::collections::HashMap;

use serde_json::{Map, Value};

/// Query string and JSON body of a request, before any typed parsing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestParameters {
    query: HashMap<String, String>,
    body: Map<String, Value>,
}

impl RequestParameters {
    pub fn new(query: HashMap<String, String>, body: Map<String, Value>) -> Self {
        Self { query, body }
    }

    /// Parameters carried only in the query string.
    pub fn from_query<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            query: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            body: Map::new(),
        }
    }

    /// Read a flag permissively; the query string wins over the body.
    ///
    /// `true`, `1`, `"1"`, `"true"`, `"on"` and `"yes"` (case-insensitive,
    /// trimmed) are true. Any other present value is false. An absent or
    /// `null` value yields `default`.
    pub fn boolean(&self, key: &str, default: bool) -> bool {
        if let Some(raw) = self.query.get(key) {
            return truthy_str(raw);
        }

        match self.body.get(key) {
            None | Some(Value::Null) => default,
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64() == Some(1.0),
            Some(Value::String(s)) => truthy_str(s),
            Some(_) => false,
        }
    }
}

fn truthy_str(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "on" | "yes"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(value: Value) -> RequestParameters {
        let Value::Object(map) = value else {
            panic!("body must be an object");
        };
        RequestParameters::new(HashMap::new(), map)
    }

    #[test]
    fn test_query_values() {
        for raw in ["1", "true", "TRUE", " yes ", "on"] {
            let params = RequestParameters::from_query([("onlyAvailable", raw)]);
            assert!(params.boolean("onlyAvailable", false), "{raw:?} should be true");
        }
        for raw in ["0", "false", "off", "no", "", "2", "maybe"] {
            let params = RequestParameters::from_query([("onlyAvailable", raw)]);
            assert!(!params.boolean("onlyAvailable", true), "{raw:?} should be false");
        }
    }

    #[test]
    fn test_absent_uses_default() {
        let params = RequestParameters::default();
        assert!(!params.boolean("onlyAvailable", false));
        assert!(params.boolean("onlyAvailable", true));

        assert!(!body(json!({"onlyAvailable": null})).boolean("onlyAvailable", false));
    }

    #[test]
    fn test_body_values() {
        assert!(body(json!({"onlyAvailable": true})).boolean("onlyAvailable", false));
        assert!(body(json!({"onlyAvailable": 1})).boolean("onlyAvailable", false));
        assert!(body(json!({"onlyAvailable": "on"})).boolean("onlyAvailable", false));
        assert!(!body(json!({"onlyAvailable": 0})).boolean("onlyAvailable", false));
        assert!(!body(json!({"onlyAvailable": [true]})).boolean("onlyAvailable", false));
    }

    #[test]
    fn test_query_wins_over_body() {
        let mut query = HashMap::new();
        query.insert("onlyAvailable".to_string(), "0".to_string());
        let Value::Object(map) = json!({"onlyAvailable": true}) else {
            unreachable!()
        };

        let params = RequestParameters::new(query, map);
        assert!(!params.boolean("onlyAvailable", false));
    }
}
