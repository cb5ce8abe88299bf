//! Typed attribute bags.
//!
//! An [`AttributeBag`] is the unit of data exchanged with the policy
//! backend: a string keyed map of typed [`Value`]s describing the request,
//! the response and the environment. Bags are built by layering several
//! sources on top of each other with [`AttributeBag::merge`], then encoded
//! once with [`AttributeBag::serialize`] for the transport.

use std::collections::BTreeMap;
use std::time::{Duration, SystemTime};

use bytes::Bytes;
use serde::{Deserialize, Serialize};

pub(crate) mod codec;
pub mod names;

/// A single attribute value.
///
/// The set of kinds is closed and mirrors the Mixer attribute wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// UTF-8 string.
    #[serde(rename = "string_value")]
    String(String),
    /// Signed 64-bit integer.
    #[serde(rename = "int64_value")]
    Int64(i64),
    /// Double precision float.
    #[serde(rename = "double_value")]
    Double(f64),
    /// Boolean.
    #[serde(rename = "bool_value")]
    Bool(bool),
    /// Opaque bytes, e.g. an IP address.
    #[serde(rename = "bytes_value")]
    Bytes(Bytes),
    /// Point in time.
    #[serde(rename = "timestamp_value")]
    Timestamp(SystemTime),
    /// Span of time.
    #[serde(rename = "duration_value")]
    Duration(Duration),
    /// Nested string to string map, e.g. request headers.
    #[serde(rename = "string_map_value")]
    StringMap(BTreeMap<String, String>),
    /// List of strings.
    #[serde(rename = "string_list_value")]
    StringList(Vec<String>),
}

impl Value {
    /// Returns the string payload, if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer payload, if this is an int64 value.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the boolean payload, if this is a bool value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<Bytes> for Value {
    fn from(v: Bytes) -> Self {
        Value::Bytes(v)
    }
}

impl From<SystemTime> for Value {
    fn from(v: SystemTime) -> Self {
        Value::Timestamp(v)
    }
}

impl From<Duration> for Value {
    fn from(v: Duration) -> Self {
        Value::Duration(v)
    }
}

impl From<BTreeMap<String, String>> for Value {
    fn from(v: BTreeMap<String, String>) -> Self {
        Value::StringMap(v)
    }
}

impl From<Vec<String>> for Value {
    fn from(v: Vec<String>) -> Self {
        Value::StringList(v)
    }
}

/// How [`AttributeBag::merge`] treats keys already present in the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// Incoming values replace existing ones.
    Override,
    /// Existing values are preserved; only missing keys are added.
    KeepExisting,
}

/// A string keyed map of typed attribute values.
///
/// Keys are kept ordered so that encoding is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeBag {
    #[serde(default)]
    attributes: BTreeMap<String, Value>,
}

impl AttributeBag {
    /// Creates an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `value` under `name`, replacing any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Builder style variant of [`AttributeBag::set`].
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Returns the value stored under `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Returns the string stored under `name`, if it is a string value.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// Returns true if `name` is present.
    pub fn contains(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Removes and returns the value stored under `name`.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.attributes.remove(name)
    }

    /// Number of attributes in the bag.
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Returns true if the bag holds no attributes.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Iterates over the attributes in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Copies every attribute of `other` into this bag.
    ///
    /// With [`MergePolicy::Override`] the values of `other` win on key
    /// collisions; with [`MergePolicy::KeepExisting`] the values already in
    /// `self` win.
    pub fn merge(&mut self, other: &AttributeBag, policy: MergePolicy) {
        for (name, value) in &other.attributes {
            match policy {
                MergePolicy::Override => {
                    self.attributes.insert(name.clone(), value.clone());
                }
                MergePolicy::KeepExisting => {
                    self.attributes
                        .entry(name.clone())
                        .or_insert_with(|| value.clone());
                }
            }
        }
    }

    /// Encodes the bag to the Mixer attribute wire format.
    ///
    /// Encoding is deterministic: equal bags produce equal bytes.
    pub fn serialize(&self) -> Bytes {
        codec::encode(self)
    }

    /// Decodes a bag previously produced by [`AttributeBag::serialize`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`](crate::Error::Parse) if `bytes` is not a
    /// valid attribute message, or
    /// [`Error::InvalidValue`](crate::Error::InvalidValue) if an entry has
    /// no value or an out-of-range time.
    pub fn deserialize(bytes: &[u8]) -> crate::Result<Self> {
        codec::decode(bytes)
    }
}

impl<K, V> FromIterator<(K, V)> for AttributeBag
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut bag = AttributeBag::new();
        bag.extend(iter);
        bag
    }
}

impl<K, V> Extend<(K, V)> for AttributeBag
where
    K: Into<String>,
    V: Into<Value>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.set(k, v);
        }
    }
}
