//! The schema-less character record.
//!
//! A [`Record`] is what the extraction engine produces and what enrichers
//! mutate: a bag of scalar fields plus named, ordered lists of items. Nothing
//! about its shape is fixed; every key may be absent, so the accessors here
//! make the difference between "absent", "present but empty" and "present"
//! explicit instead of handing out raw maps.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::value_objects::parse_lenient_int;

// =============================================================================
// Values
// =============================================================================

/// A field value: plain text, or structure captured from a document subtree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Empty text, or a structure with nothing in it.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Text(s) => s.is_empty(),
            Value::List(items) => items.is_empty(),
            Value::Map(map) => map.is_empty(),
        }
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Value::Map(map)
    }
}

/// Whether a key holds something usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence<'a> {
    /// The key was never set.
    Absent,
    /// The key is set to empty text or an empty structure.
    Empty,
    /// The key holds a non-empty value.
    Present(&'a Value),
}

impl<'a> Presence<'a> {
    fn of(value: Option<&'a Value>) -> Self {
        match value {
            None => Presence::Absent,
            Some(v) if v.is_empty() => Presence::Empty,
            Some(v) => Presence::Present(v),
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Presence::Present(_))
    }
}

// =============================================================================
// List items
// =============================================================================

/// One entry of a record list (a class, a weapon, a skill...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Item(BTreeMap<String, Value>);

impl Item {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Text of a field; `None` when absent or structured.
    pub fn text(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_text)
    }

    /// Text of a field, treating absent and empty alike.
    pub fn non_empty_text(&self, field: &str) -> Option<&str> {
        self.text(field).filter(|s| !s.is_empty())
    }

    pub fn presence(&self, field: &str) -> Presence<'_> {
        Presence::of(self.0.get(field))
    }

    /// Integer value of a field: `Some(default)` when absent, `None` when not a number.
    pub fn int_or(&self, field: &str, default: i64) -> Option<i64> {
        match self.0.get(field) {
            None => Some(default),
            Some(value) => value.as_text().and_then(parse_lenient_int),
        }
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(field.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Item {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

// =============================================================================
// Record
// =============================================================================

/// Generic extracted character data: scalar fields plus named lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    scalars: BTreeMap<String, Value>,
    lists: BTreeMap<String, Vec<Item>>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scalar(&self, key: &str) -> Option<&Value> {
        self.scalars.get(key)
    }

    /// Text of a scalar; `None` when absent or structured.
    pub fn scalar_text(&self, key: &str) -> Option<&str> {
        self.scalars.get(key).and_then(Value::as_text)
    }

    pub fn presence(&self, key: &str) -> Presence<'_> {
        Presence::of(self.scalars.get(key))
    }

    /// Integer value of a scalar: `Some(default)` when absent, `None` when not a number.
    pub fn scalar_int_or(&self, key: &str, default: i64) -> Option<i64> {
        match self.scalars.get(key) {
            None => Some(default),
            Some(value) => value.as_text().and_then(parse_lenient_int),
        }
    }

    pub fn set_scalar(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.scalars.insert(key.into(), value.into());
    }

    pub fn scalars(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.scalars.iter()
    }

    /// Items of a list, empty when the list was never set.
    pub fn list(&self, name: &str) -> &[Item] {
        self.lists.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_list(&self, name: &str) -> bool {
        self.lists.contains_key(name)
    }

    pub fn list_mut(&mut self, name: &str) -> Option<&mut Vec<Item>> {
        self.lists.get_mut(name)
    }

    /// Mutable list, created empty when missing.
    pub fn list_entry(&mut self, name: impl Into<String>) -> &mut Vec<Item> {
        self.lists.entry(name.into()).or_default()
    }

    pub fn set_list(&mut self, name: impl Into<String>, items: Vec<Item>) {
        self.lists.insert(name.into(), items);
    }

    pub fn lists(&self) -> impl Iterator<Item = (&String, &Vec<Item>)> {
        self.lists.iter()
    }
}
