//! Message payloads
//!
//! A payload is empty, text, an ordered byte sequence, or a typed key/value
//! map. The variants mirror the text, bytes and map message bodies used by the
//! request/reply and rate tutorials.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A typed value stored in a [`Payload::Map`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MapValue {
    Bool(bool),
    Int(i64),
    Double(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl MapValue {
    /// Numeric view of the value; integers widen to `f64`
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MapValue::Double(v) => Some(*v),
            MapValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            MapValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            MapValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            MapValue::Text(v) => Some(v),
            _ => None,
        }
    }

    fn approximate_size(&self) -> usize {
        match self {
            MapValue::Text(v) => v.len(),
            MapValue::Bytes(v) => v.len(),
            _ => std::mem::size_of::<f64>(),
        }
    }
}

impl From<bool> for MapValue {
    fn from(value: bool) -> Self {
        MapValue::Bool(value)
    }
}

impl From<i64> for MapValue {
    fn from(value: i64) -> Self {
        MapValue::Int(value)
    }
}

impl From<f64> for MapValue {
    fn from(value: f64) -> Self {
        MapValue::Double(value)
    }
}

impl From<&str> for MapValue {
    fn from(value: &str) -> Self {
        MapValue::Text(value.to_string())
    }
}

impl From<String> for MapValue {
    fn from(value: String) -> Self {
        MapValue::Text(value)
    }
}

/// Message body
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Payload {
    #[default]
    Empty,
    Text(String),
    Bytes(Vec<u8>),
    Map(BTreeMap<String, MapValue>),
}

impl Payload {
    /// Build a map payload from key/value pairs
    pub fn map<K, V, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<MapValue>,
    {
        Payload::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Bytes payload holding one big-endian `f64`
    pub fn from_f64(value: f64) -> Self {
        Payload::Bytes(value.to_be_bytes().to_vec())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Payload::Empty => true,
            Payload::Text(text) => text.is_empty(),
            Payload::Bytes(bytes) => bytes.is_empty(),
            Payload::Map(map) => map.is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Payload::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, MapValue>> {
        match self {
            Payload::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a map entry
    pub fn get(&self, key: &str) -> Option<&MapValue> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// Read a big-endian `f64` from the start of a bytes payload
    pub fn read_f64(&self) -> Option<f64> {
        let bytes = self.as_bytes()?;
        let head: [u8; 8] = bytes.get(..8)?.try_into().ok()?;
        Some(f64::from_be_bytes(head))
    }

    pub(crate) fn approximate_size(&self) -> usize {
        match self {
            Payload::Empty => 0,
            Payload::Text(text) => text.len(),
            Payload::Bytes(bytes) => bytes.len(),
            Payload::Map(map) => map
                .iter()
                .map(|(k, v)| k.len() + v.approximate_size())
                .sum(),
        }
    }
}

impl From<&str> for Payload {
    fn from(value: &str) -> Self {
        Payload::Text(value.to_string())
    }
}

impl From<String> for Payload {
    fn from(value: String) -> Self {
        Payload::Text(value)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(value: Vec<u8>) -> Self {
        Payload::Bytes(value)
    }
}
