use crate::error::FormatError;
use crate::tree::{NodeId, Tree};
use crate::value::Scalar;
use chrono::DateTime;
use serde_json::Value;

/// Parse JSON text into a tree.
///
/// Strings holding an RFC 3339 timestamp become [`Scalar::Date`] values; every
/// other JSON node maps onto the token of the same shape. A repeated object
/// key keeps its first position and its last value.
pub fn from_json(text: &str) -> Result<Tree, FormatError> {
    let value: Value = serde_json::from_str(text).map_err(FormatError::Json)?;
    Ok(from_json_value(&value))
}

/// Build a tree from an already parsed [`serde_json::Value`].
pub fn from_json_value(value: &Value) -> Tree {
    let mut tree = Tree::new();
    let root = build(&mut tree, value);
    tree.adopt_root(root);
    tree
}

fn build(tree: &mut Tree, value: &Value) -> NodeId {
    match value {
        Value::Null => tree.add_value(Scalar::Null),
        Value::Bool(b) => tree.add_value(*b),
        Value::Number(n) => tree.add_value(Scalar::from_json_number(n)),
        Value::String(s) => tree.add_value(infer_string(s)),
        Value::Array(items) => {
            let array = tree.add_array();
            for item in items {
                let child = build(tree, item);
                tree.attach_item(array, child);
            }
            array
        }
        Value::Object(map) => {
            let object = tree.add_object();
            for (name, item) in map {
                let child = build(tree, item);
                tree.attach_property(object, name.clone(), child);
            }
            object
        }
    }
}

fn infer_string(text: &str) -> Scalar {
    match DateTime::parse_from_rfc3339(text) {
        Ok(date) => Scalar::Date(date),
        Err(_) => Scalar::String(text.to_string()),
    }
}
