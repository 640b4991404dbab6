use std::collections::HashMap;

use crate::convert::Value;

/// The external write interface the parser populates.
///
/// The parser addresses storage by the spec's field name and never reads values back; it only
/// asks [`Sink::is_set`] when the host wants to distinguish "defaulted" from "parsed".
/// Scalar fields use [`Sink::write`] (a second write overwrites the first); aggregate fields
/// use [`Sink::append`], and the implementation instantiates the container lazily.
pub trait Sink {
    /// Store a scalar value, replacing any previous one (last-write-wins).
    fn write(&mut self, field: &str, value: Value);

    /// Append one element to an aggregate field, creating the container on first use.
    fn append(&mut self, field: &str, value: Value);

    /// Whether any value has been stored under `field` during this parse.
    fn is_set(&self, field: &str) -> bool;
}

/// What a [`ValueMap`] holds for one field.
#[derive(Debug, Clone, PartialEq)]
pub enum Captured {
    Single(Value),
    Many(Vec<Value>),
}

/// A ready-made [`Sink`] keyed by field name.
///
/// Useful when the host has no typed configuration struct (tests, scripting shims, tooling
/// that inspects arguments generically).
///
/// ### Example
/// ```
/// use argot::{Sink, Value, ValueMap};
///
/// let mut map = ValueMap::default();
/// map.write("count", Value::Int(3));
/// map.append("files", Value::Str("a.txt".to_string()));
/// assert!(map.is_set("count"));
/// assert_eq!(map.scalar("count"), Some(&Value::Int(3)));
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValueMap {
    entries: HashMap<String, Captured>,
}

impl ValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// The scalar stored under `field`, if any.
    pub fn scalar(&self, field: &str) -> Option<&Value> {
        match self.entries.get(field) {
            Some(Captured::Single(value)) => Some(value),
            _ => None,
        }
    }

    /// The sequence stored under `field`, if any.
    pub fn sequence(&self, field: &str) -> Option<&[Value]> {
        match self.entries.get(field) {
            Some(Captured::Many(values)) => Some(values.as_slice()),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl Sink for ValueMap {
    fn write(&mut self, field: &str, value: Value) {
        self.entries
            .insert(field.to_string(), Captured::Single(value));
    }

    fn append(&mut self, field: &str, value: Value) {
        match self
            .entries
            .entry(field.to_string())
            .or_insert_with(|| Captured::Many(Vec::default()))
        {
            Captured::Many(values) => values.push(value),
            // A scalar write raced an append under the same field; the aggregate shape wins.
            slot @ Captured::Single(_) => {
                *slot = Captured::Many(vec![value]);
            }
        }
    }

    fn is_set(&self, field: &str) -> bool {
        self.entries.contains_key(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_overwrites() {
        let mut map = ValueMap::new();
        map.write("count", Value::Int(1));
        map.write("count", Value::Int(2));

        assert_eq!(map.scalar("count"), Some(&Value::Int(2)));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn append_lazily_instantiates() {
        let mut map = ValueMap::new();
        assert!(!map.is_set("files"));

        map.append("files", Value::Str("a".to_string()));
        map.append("files", Value::Str("b".to_string()));

        assert_eq!(
            map.sequence("files"),
            Some(&[Value::Str("a".to_string()), Value::Str("b".to_string())][..])
        );
    }

    #[test]
    fn shapes_do_not_alias() {
        let mut map = ValueMap::new();
        map.write("count", Value::Int(1));

        assert_eq!(map.sequence("count"), None);
        assert_eq!(map.scalar("missing"), None);
    }
}
