//! Raw event payloads
//!
//! A [`RawEvent`] is the opaque record a host hands across the boundary:
//! named fields whose presence and shape vary by event kind and by host.
//! The decoder is its only reader. Every accessor here degrades to the
//! type's default when a field is absent or has the wrong shape.

use serde_json::{Map, Value};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawEvent {
    fields: Map<String, Value>,
}

impl RawEvent {
    /// An empty payload, as produced by synthetic dispatch
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an arbitrary value; anything other than an object yields an empty payload
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(fields) => Self { fields },
            other => {
                tracing::trace!(payload = %other, "non-object payload treated as empty");
                Self::default()
            }
        }
    }

    /// Builder-style field insertion
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn bool_or_default(&self, name: &str) -> bool {
        self.read(name, Value::as_bool).unwrap_or_default()
    }

    pub fn f64_or_default(&self, name: &str) -> f64 {
        self.read(name, Value::as_f64)
            .filter(|n| n.is_finite())
            .unwrap_or_default()
    }

    /// Integral read; hosts that marshal every number as a double are accepted
    pub fn i64_or_default(&self, name: &str) -> i64 {
        self.read(name, |v| {
            v.as_i64()
                .or_else(|| v.as_f64().filter(|n| n.is_finite()).map(|n| n as i64))
        })
        .unwrap_or_default()
    }

    pub fn u64_or_default(&self, name: &str) -> u64 {
        self.read(name, |v| {
            v.as_u64().or_else(|| {
                v.as_f64()
                    .filter(|n| n.is_finite() && *n >= 0.0)
                    .map(|n| n as u64)
            })
        })
        .unwrap_or_default()
    }

    pub fn string_or_default(&self, name: &str) -> String {
        self.read(name, |v| v.as_str().map(str::to_owned))
            .unwrap_or_default()
    }

    /// Nested record; empty when absent so the caller decodes its defaults
    pub fn object_or_default(&self, name: &str) -> RawEvent {
        self.read(name, |v| v.as_object().cloned())
            .map(|fields| RawEvent { fields })
            .unwrap_or_default()
    }

    /// Array of nested records; non-object elements become empty records
    pub fn objects_or_default(&self, name: &str) -> Vec<RawEvent> {
        self.read(name, Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .map(|item| RawEvent::from_value(item.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Array of strings; non-string elements are skipped
    pub fn strings_or_default(&self, name: &str) -> Vec<String> {
        self.read(name, Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.as_str().map(str::to_owned))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn read<'a, T>(
        &'a self,
        name: &str,
        extract: impl FnOnce(&'a Value) -> Option<T>,
    ) -> Option<T> {
        let value = self.fields.get(name).and_then(extract);
        if value.is_none() {
            tracing::trace!(field = name, "payload field missing or mistyped, using default");
        }
        value
    }
}

impl From<Value> for RawEvent {
    fn from(value: Value) -> Self {
        Self::from_value(value)
    }
}

impl From<Map<String, Value>> for RawEvent {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}
