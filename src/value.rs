//! Linked Data document model.
//!
//! A [`Document`] is a JSON object whose values are restricted to the shapes
//! the canonicalizer understands: strings, integers, booleans, arrays and
//! nested objects. JSON `null` and non-integer numbers are rejected when
//! deserializing.

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// `@context` keyword.
pub const AT_CONTEXT: &str = "@context";
/// `@graph` keyword.
pub const AT_GRAPH: &str = "@graph";
/// `@id` keyword.
pub const AT_ID: &str = "@id";
/// `@language` keyword.
pub const AT_LANGUAGE: &str = "@language";
/// `@type` keyword.
pub const AT_TYPE: &str = "@type";
/// `@value` keyword.
pub const AT_VALUE: &str = "@value";
/// `@vocab` keyword.
pub const AT_VOCAB: &str = "@vocab";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Boolean(bool),
    Integer(i64),
    String(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Literal(Literal),
    Array(Vec<Value>),
    Object(Document),
}

/// Mapping from property names to values.
///
/// Entries are kept sorted by key, so two documents with the same entries
/// compare (and serialize) identically regardless of insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(BTreeMap<String, Value>);

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.0.get_mut(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> btree_map::Keys<String, Value> {
        self.0.keys()
    }

    pub fn iter(&self) -> btree_map::Iter<String, Value> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromStr for Document {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_json(s)
    }
}

impl TryFrom<serde_json::Value> for Document {
    type Error = Error;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        Ok(serde_json::from_value(value)?)
    }
}

impl From<BTreeMap<String, Value>> for Document {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for Document {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Literal(Literal::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Document> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Iterate over the value, treating a non-array value as a one-element
    /// array.
    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        match self {
            Self::Array(items) => items.iter(),
            other => std::slice::from_ref(other).iter(),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Literal(Literal::String(s.to_owned()))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Literal(Literal::String(s))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Literal(Literal::Integer(i))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Literal(Literal::Boolean(b))
    }
}

impl From<Document> for Value {
    fn from(object: Document) -> Self {
        Self::Object(object)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::Array(items)
    }
}
