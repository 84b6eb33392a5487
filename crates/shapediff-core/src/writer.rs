//! Tree back to JSON.

use crate::tree::{NodeId, Token, Tree};
use crate::value::{format_date, format_time_span, Scalar};
use serde_json::{Map, Number, Value};

impl Tree {
    /// The subtree at `node` as a [`serde_json::Value`], in document order.
    ///
    /// Dates render as RFC 3339 strings, durations as `[-][d.]hh:mm:ss`, GUIDs
    /// hyphenated. A property renders as a one-entry object. Non-finite floats,
    /// which JSON cannot carry, become `null`.
    pub fn to_json_value(&self, node: NodeId) -> Value {
        match self.token(node) {
            Token::Object(_) => {
                let map: Map<String, Value> = self
                    .properties(node)
                    .map(|(name, value)| (name.to_string(), self.to_json_value(value)))
                    .collect();
                Value::Object(map)
            }
            Token::Array(array) => {
                Value::Array(array.items().iter().map(|&item| self.to_json_value(item)).collect())
            }
            Token::Property(p) => {
                let mut map = Map::new();
                map.insert(p.name().to_string(), self.to_json_value(p.value()));
                Value::Object(map)
            }
            Token::Value(scalar) => scalar_to_json(scalar),
        }
    }

    /// Compact JSON text of the subtree at `node`.
    pub fn to_json_string(&self, node: NodeId) -> String {
        self.to_json_value(node).to_string()
    }

    /// Indented JSON text of the subtree at `node`.
    pub fn to_json_pretty(&self, node: NodeId) -> String {
        let value = self.to_json_value(node);
        serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
    }
}

fn scalar_to_json(scalar: &Scalar) -> Value {
    match scalar {
        Scalar::Null => Value::Null,
        Scalar::Boolean(b) => Value::Bool(*b),
        Scalar::Integer(i) => integer_to_json(*i),
        Scalar::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
        Scalar::String(s) | Scalar::Uri(s) | Scalar::Comment(s) => Value::String(s.clone()),
        Scalar::Date(d) => Value::String(format_date(d)),
        Scalar::Guid(g) => Value::String(g.hyphenated().to_string()),
        Scalar::TimeSpan(t) => Value::String(format_time_span(t)),
    }
}

fn integer_to_json(i: i128) -> Value {
    if let Ok(small) = i64::try_from(i) {
        Value::Number(small.into())
    } else if let Ok(large) = u64::try_from(i) {
        Value::Number(large.into())
    } else {
        Number::from_f64(i as f64).map_or(Value::Null, Value::Number)
    }
}
