//! Attribute trees: the recursive named values the server attaches to a node.
//!
//! Dotted names such as `exif.primary.model` address nested trees; they are
//! never flat keys containing dots.

use serde_json::Number;
use std::collections::BTreeMap;

/// One attribute value: a scalar leaf, a list, or a nested tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    List(Vec<Value>),
    Nested(AttributeTree),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Number(n) => n.as_u64(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_tree(&self) -> Option<&AttributeTree> {
        match self {
            Value::Nested(tree) => Some(tree),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Value::Number(n.clone()),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Nested(tree) => tree.to_json(),
        }
    }
}

impl From<&serde_json::Value> for Value {
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => Value::Number(n.clone()),
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => Value::List(items.iter().map(Value::from).collect()),
            serde_json::Value::Object(_) => Value::Nested(AttributeTree::from_json(value)),
        }
    }
}

/// Mapping from attribute name to value, built from a server JSON object.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttributeTree {
    entries: BTreeMap<String, Value>,
}

impl AttributeTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from a JSON object. Anything that is not an object
    /// (including `null` when attributes were not requested) yields an
    /// empty tree.
    pub fn from_json(value: &serde_json::Value) -> Self {
        let entries = match value.as_object() {
            Some(map) => map
                .iter()
                .map(|(name, value)| (name.clone(), Value::from(value)))
                .collect(),
            None => BTreeMap::new(),
        };
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.entries.insert(name.into(), value)
    }

    /// Look up a dotted name by walking nested trees.
    pub fn get(&self, dotted: &str) -> Option<&Value> {
        let segments: Vec<&str> = dotted.split('.').collect();
        self.get_path(&segments)
    }

    /// Look up a value by explicit path segments.
    pub fn get_path(&self, segments: &[&str]) -> Option<&Value> {
        let (first, rest) = segments.split_first()?;
        let value = self.entries.get(*first)?;
        if rest.is_empty() {
            return Some(value);
        }
        value.as_tree()?.get_path(rest)
    }

    pub fn get_str(&self, dotted: &str) -> Option<&str> {
        self.get(dotted).and_then(Value::as_str)
    }

    pub fn get_f64(&self, dotted: &str) -> Option<f64> {
        self.get(dotted).and_then(Value::as_f64)
    }

    pub fn get_u64(&self, dotted: &str) -> Option<u64> {
        self.get(dotted).and_then(Value::as_u64)
    }

    pub fn get_bool(&self, dotted: &str) -> Option<bool> {
        self.get(dotted).and_then(Value::as_bool)
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.entries
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}
