//! Schema-driven deserialization
//!
//! [`RecordSeed`] is a [`serde::de::DeserializeSeed`] that reads a JSON
//! object into a [`Record`], dispatching on wire keys through the schema.
//!
//! Decoding is lenient: a value whose shape does not fit its declared type
//! leaves the field absent, and keys unknown to the schema are skipped. Only
//! errors raised by the underlying tokenizer propagate.

use findings_mapper_common::{FieldType, PrimitiveKind, Record, RecordSchema, SchemaRegistry, Value};
use serde::de::{self, DeserializeSeed, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use std::collections::BTreeMap;
use std::fmt;

/// Reads one record; yields `None` when the input is not a JSON object
#[derive(Debug, Clone, Copy)]
pub struct RecordSeed<'a> {
    schema: &'a RecordSchema,
    registry: &'a SchemaRegistry,
}

impl<'a> RecordSeed<'a> {
    pub fn new(schema: &'a RecordSchema, registry: &'a SchemaRegistry) -> Self {
        Self { schema, registry }
    }
}

impl<'de> DeserializeSeed<'de> for RecordSeed<'_> {
    type Value = Option<Record>;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        let visitor = ValueVisitor {
            expect: Expect::Record(self.schema),
            registry: self.registry,
        };
        Ok(match deserializer.deserialize_any(visitor)? {
            Some(Value::Record(record)) => Some(record),
            _ => None,
        })
    }
}

/// Reads one value of a declared type
struct ValueSeed<'a> {
    field_type: &'a FieldType,
    registry: &'a SchemaRegistry,
}

impl<'de> DeserializeSeed<'de> for ValueSeed<'_> {
    type Value = Option<Value>;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        let expect = match self.field_type {
            FieldType::Primitive(kind) => Expect::Primitive(*kind),
            FieldType::Record(name) => self
                .registry
                .get(name)
                .map_or(Expect::Nothing, Expect::Record),
            FieldType::List(element) => Expect::List(element),
            FieldType::Map(element) => Expect::Map(element),
        };
        deserializer.deserialize_any(ValueVisitor {
            expect,
            registry: self.registry,
        })
    }
}

#[derive(Clone, Copy)]
enum Expect<'a> {
    Primitive(PrimitiveKind),
    Record(&'a RecordSchema),
    List(&'a FieldType),
    Map(&'a FieldType),
    /// Consume and discard
    Nothing,
}

struct ValueVisitor<'a> {
    expect: Expect<'a>,
    registry: &'a SchemaRegistry,
}

impl ValueVisitor<'_> {
    fn seed<'b>(&'b self, field_type: &'b FieldType) -> ValueSeed<'b> {
        ValueSeed {
            field_type,
            registry: self.registry,
        }
    }

    fn primitive(&self) -> Option<PrimitiveKind> {
        match self.expect {
            Expect::Primitive(kind) => Some(kind),
            _ => None,
        }
    }
}

impl<'de> Visitor<'de> for ValueVisitor<'_> {
    type Value = Option<Value>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("any JSON value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
        Ok(match self.primitive() {
            Some(PrimitiveKind::Boolean) => Some(Value::Boolean(v)),
            Some(PrimitiveKind::String) => Some(Value::String(v.to_string())),
            _ => None,
        })
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(self.primitive().and_then(|kind| from_i64(kind, v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(self.primitive().and_then(|kind| match i64::try_from(v) {
            Ok(i) => from_i64(kind, i),
            Err(_) => match kind {
                PrimitiveKind::Double => Some(Value::Double(v as f64)),
                PrimitiveKind::Timestamp => Some(Value::Timestamp(v as f64)),
                PrimitiveKind::String => Some(Value::String(v.to_string())),
                _ => None,
            },
        }))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(self.primitive().and_then(|kind| from_f64(kind, v)))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(self.primitive().and_then(|kind| from_str(kind, v)))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(match self.primitive() {
            Some(PrimitiveKind::String) => Some(Value::String(v)),
            Some(kind) => from_str(kind, &v),
            None => None,
        })
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(self)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let Expect::List(element) = self.expect else {
            while seq.next_element::<IgnoredAny>()?.is_some() {}
            return Ok(None);
        };

        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element_seed(self.seed(element))? {
            // Keep the position; the serializer skips nulls
            items.push(item.unwrap_or(Value::Null));
        }
        Ok(Some(Value::List(items)))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        match self.expect {
            Expect::Record(schema) => {
                let mut record = Record::new();
                while let Some(key) = map.next_key::<String>()? {
                    match schema.get_field(&key) {
                        Some(field) => {
                            let value = map.next_value_seed(self.seed(&field.field_type))?;
                            // A repeated key overrides, and an undecodable repeat unsets
                            record.set(key, value.unwrap_or(Value::Null));
                        }
                        None => {
                            map.next_value::<IgnoredAny>()?;
                        }
                    }
                }
                Ok(Some(Value::Record(record)))
            }
            Expect::Map(element) => {
                let mut entries = BTreeMap::new();
                while let Some(key) = map.next_key::<String>()? {
                    let value = map.next_value_seed(self.seed(element))?;
                    entries.insert(key, value.unwrap_or(Value::Null));
                }
                Ok(Some(Value::Map(entries)))
            }
            _ => {
                while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
                Ok(None)
            }
        }
    }
}

fn from_i64(kind: PrimitiveKind, v: i64) -> Option<Value> {
    match kind {
        PrimitiveKind::Integer => i32::try_from(v).ok().map(|_| Value::Integer(v)),
        PrimitiveKind::Long => Some(Value::Integer(v)),
        PrimitiveKind::Double => Some(Value::Double(v as f64)),
        PrimitiveKind::Timestamp => Some(Value::Timestamp(v as f64)),
        PrimitiveKind::String => Some(Value::String(v.to_string())),
        PrimitiveKind::Boolean => None,
    }
}

fn from_f64(kind: PrimitiveKind, v: f64) -> Option<Value> {
    if !v.is_finite() {
        return None;
    }
    match kind {
        PrimitiveKind::Double => Some(Value::Double(v)),
        PrimitiveKind::Timestamp => Some(Value::Timestamp(v)),
        PrimitiveKind::String => Some(Value::String(v.to_string())),
        PrimitiveKind::Integer | PrimitiveKind::Long => {
            // Integral doubles such as `3.0` are accepted; `i64::MAX as f64`
            // rounds up past the range, hence the strict upper bound.
            if v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64 {
                from_i64(kind, v as i64)
            } else {
                None
            }
        }
        PrimitiveKind::Boolean => None,
    }
}

fn from_str(kind: PrimitiveKind, v: &str) -> Option<Value> {
    match kind {
        PrimitiveKind::String => Some(Value::String(v.to_string())),
        PrimitiveKind::Integer | PrimitiveKind::Long => {
            v.trim().parse::<i64>().ok().and_then(|i| from_i64(kind, i))
        }
        PrimitiveKind::Double | PrimitiveKind::Timestamp => {
            v.trim().parse::<f64>().ok().and_then(|d| from_f64(kind, d))
        }
        PrimitiveKind::Boolean => match v.trim() {
            "true" => Some(Value::Boolean(true)),
            "false" => Some(Value::Boolean(false)),
            _ => None,
        },
    }
}
