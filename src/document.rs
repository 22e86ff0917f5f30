//! The flat mapping a BFlat byte stream encodes to and decodes from.
//!
//! A [`Document`] is an insertion-ordered map from tag name to [`Value`].
//! Tag names are opaque byte strings; the codec never requires them to be
//! UTF-8. Order is part of the data model: records are emitted in the order
//! entries were inserted, and decoding preserves the order of each name's
//! first appearance.

use std::fmt;

use indexmap::map::Entry;
use indexmap::IndexMap;
use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::value::Value;

/// A flat, insertion-ordered mapping from tag name to [`Value`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Document {
    entries: IndexMap<Vec<u8>, Value>,
}

impl Document {
    pub fn new() -> Document {
        Document {
            entries: IndexMap::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Document {
        Document {
            entries: IndexMap::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, name: impl AsRef<[u8]>) -> bool {
        self.entries.contains_key(name.as_ref())
    }

    pub fn get(&self, name: impl AsRef<[u8]>) -> Option<&Value> {
        self.entries.get(name.as_ref())
    }

    /// Set a tag to a value, replacing any existing value. An existing tag
    /// keeps its position in the document; a new one goes to the end.
    pub fn insert(&mut self, name: impl Into<Vec<u8>>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(name.into(), value.into())
    }

    /// Add one record's worth of data under a tag, combining with whatever
    /// is already there.
    ///
    /// A fresh tag just takes the value. A repeated tag promotes its
    /// existing value to a sequence (a scalar becomes a one-element list)
    /// and then appends: an incoming scalar as one element, an incoming
    /// sequence element by element. The result may mix element types even
    /// though each encoded record was homogeneous.
    pub fn combine(&mut self, name: impl Into<Vec<u8>>, value: Value) {
        match self.entries.entry(name.into()) {
            Entry::Vacant(entry) => {
                entry.insert(value);
            }
            Entry::Occupied(mut entry) => {
                let slot = entry.get_mut();
                if !slot.is_array() {
                    let first = std::mem::take(slot);
                    *slot = Value::Array(vec![first]);
                }
                let Some(list) = slot.as_array_mut() else {
                    unreachable!()
                };
                match value {
                    Value::Array(elems) => list.extend(elems),
                    scalar => list.push(scalar),
                }
            }
        }
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &Value)> {
        self.entries.iter().map(|(name, value)| (name.as_slice(), value))
    }

    /// Iterate tag names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &[u8]> {
        self.entries.keys().map(|name| name.as_slice())
    }

    /// Iterate values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.values()
    }
}

impl<K: Into<Vec<u8>>, V: Into<Value>> Extend<(K, V)> for Document {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (name, value) in iter {
            self.insert(name, value);
        }
    }
}

impl<K: Into<Vec<u8>>, V: Into<Value>> FromIterator<(K, V)> for Document {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Document {
        let mut doc = Document::new();
        doc.extend(iter);
        doc
    }
}

impl IntoIterator for Document {
    type Item = (Vec<u8>, Value);
    type IntoIter = indexmap::map::IntoIter<Vec<u8>, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = (&'a Vec<u8>, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, Vec<u8>, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(serde_bytes::Bytes::new(name), value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct DocVisitor;
        impl<'de> Visitor<'de> for DocVisitor {
            type Value = Document;

            fn expecting(&self, fmt: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
                write!(fmt, "a flat map of scalars and scalar sequences")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut doc = Document::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, value)) =
                    access.next_entry::<serde_bytes::ByteBuf, Value>()?
                {
                    doc.insert(name.into_vec(), value);
                }
                Ok(doc)
            }
        }

        deserializer.deserialize_map(DocVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insertion_order() {
        let mut doc = Document::new();
        doc.insert("zeta", 1);
        doc.insert("alpha", 2);
        doc.insert("mid", 3);
        let names: Vec<&[u8]> = doc.keys().collect();
        assert_eq!(names, [&b"zeta"[..], b"alpha", b"mid"]);

        // Replacing keeps the original slot.
        doc.insert("alpha", 9);
        let names: Vec<&[u8]> = doc.keys().collect();
        assert_eq!(names, [&b"zeta"[..], b"alpha", b"mid"]);
        assert_eq!(doc.get("alpha"), Some(&Value::Int(9)));
    }

    #[test]
    fn combine_scalar_then_scalar() {
        let mut doc = Document::new();
        doc.combine("foo", Value::Int(1));
        doc.combine("foo", Value::Str("bar".to_string()));
        assert_eq!(
            doc.get("foo"),
            Some(&Value::Array(vec![
                Value::Int(1),
                Value::Str("bar".to_string())
            ]))
        );
    }

    #[test]
    fn combine_scalar_then_array() {
        let mut doc = Document::new();
        doc.combine("foo", Value::Int(1));
        doc.combine("foo", Value::Array(vec![Value::F64(1.2), Value::F64(2.3)]));
        assert_eq!(
            doc.get("foo"),
            Some(&Value::Array(vec![
                Value::Int(1),
                Value::F64(1.2),
                Value::F64(2.3)
            ]))
        );
    }

    #[test]
    fn combine_array_then_scalar() {
        let mut doc = Document::new();
        doc.combine("foo", Value::Array(vec![Value::F64(1.2)]));
        doc.combine("foo", Value::Int(1));
        assert_eq!(
            doc.get("foo"),
            Some(&Value::Array(vec![Value::F64(1.2), Value::Int(1)]))
        );
    }

    #[test]
    fn combine_first_occurrence_is_plain_insert() {
        let mut doc = Document::new();
        doc.combine("solo", Value::Int(7));
        assert_eq!(doc.get("solo"), Some(&Value::Int(7)));
        doc.combine("list", Value::Array(vec![Value::Int(1), Value::Int(2)]));
        assert_eq!(
            doc.get("list"),
            Some(&Value::Array(vec![Value::Int(1), Value::Int(2)]))
        );
    }

    #[test]
    fn from_iterator() {
        let doc: Document = [("a", 1i32), ("b", 2)].into_iter().collect();
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.get("b"), Some(&Value::Int(2)));
    }

    #[test]
    fn deserialize_from_json() {
        let doc: Document =
            serde_json::from_str(r#"{"foo": 1, "bar": [1.5, -2.5], "name": "x"}"#).unwrap();
        assert_eq!(doc.get("foo"), Some(&Value::Int(1)));
        assert_eq!(
            doc.get("bar"),
            Some(&Value::Array(vec![Value::F64(1.5), Value::F64(-2.5)]))
        );
        assert_eq!(doc.get("name"), Some(&Value::Str("x".to_string())));
        let names: Vec<&[u8]> = doc.keys().collect();
        assert_eq!(names, [&b"foo"[..], b"bar", b"name"]);
    }
}
