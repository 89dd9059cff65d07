//! Dynamic record values
//!
//! A [`Record`] maps wire keys to [`Value`]s. Unset fields are simply absent
//! from the map; there is no null placeholder for a field.

use crate::schema::{FieldType, PrimitiveKind};
use std::collections::BTreeMap;

/// A dynamically-typed field value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Only appears as a list element or map entry; never stored as a field
    Null,
    String(String),
    Integer(i64),
    Double(f64),
    Boolean(bool),
    /// Epoch seconds
    Timestamp(f64),
    Record(Record),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(d) | Value::Timestamp(d) => Some(*d),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Whether this value can be written under `field_type`
    ///
    /// Only the outer shape is checked; list elements and map entries are
    /// checked as they are written. Doubles and timestamps accept only their
    /// own variant, since a parse always yields that variant back.
    pub fn conforms_to(&self, field_type: &FieldType) -> bool {
        match (field_type, self) {
            (FieldType::Primitive(kind), value) => match (kind, value) {
                (PrimitiveKind::String, Value::String(_)) => true,
                (PrimitiveKind::Integer, Value::Integer(i)) => i32::try_from(*i).is_ok(),
                (PrimitiveKind::Long, Value::Integer(_)) => true,
                (PrimitiveKind::Double, Value::Double(d)) => d.is_finite(),
                (PrimitiveKind::Boolean, Value::Boolean(_)) => true,
                (PrimitiveKind::Timestamp, Value::Timestamp(t)) => t.is_finite(),
                _ => false,
            },
            (FieldType::Record(_), Value::Record(_)) => true,
            (FieldType::List(_), Value::List(_)) => true,
            (FieldType::Map(_), Value::Map(_)) => true,
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value.into())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<Record> for Value {
    fn from(value: Record) -> Self {
        Value::Record(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<BTreeMap<String, T>> for Value {
    fn from(entries: BTreeMap<String, T>) -> Self {
        Value::Map(entries.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// A record instance: wire key -> value, unset fields absent
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field (builder style)
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Set a field, returning the previous value
    ///
    /// Setting [`Value::Null`] unsets the field.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let name = name.into();
        match value.into() {
            Value::Null => self.fields.remove(&name),
            value => self.fields.insert(name, value),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Set fields in wire-key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (name, value) in iter {
            record.set(name, value);
        }
        record
    }
}
