//! Schema-driven serialization
//!
//! [`RecordSerializer`] implements [`serde::Serialize`], so a record can be
//! written to any serde serializer (a `serde_json::Value`, a string, or a
//! stream) in schema field order without an intermediate tree.

use findings_mapper_common::{
    FieldType, PrimitiveKind, Record, RecordSchema, SchemaRegistry, Value,
};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

/// A record paired with its schema, ready to be serialized
#[derive(Debug, Clone, Copy)]
pub struct RecordSerializer<'a> {
    record: &'a Record,
    schema: &'a RecordSchema,
    registry: &'a SchemaRegistry,
}

impl<'a> RecordSerializer<'a> {
    pub fn new(record: &'a Record, schema: &'a RecordSchema, registry: &'a SchemaRegistry) -> Self {
        Self {
            record,
            schema,
            registry,
        }
    }
}

impl Serialize for RecordSerializer<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // Unset and mistyped fields are never written, not even as null.
        let present: Vec<_> = self
            .schema
            .fields
            .iter()
            .filter_map(|field| {
                self.record
                    .get(&field.name)
                    .filter(|value| writable(value, &field.field_type, self.registry))
                    .map(|value| (field, value))
            })
            .collect();

        let mut map = serializer.serialize_map(Some(present.len()))?;
        for (field, value) in present {
            map.serialize_entry(
                &field.name,
                &TypedValue {
                    value,
                    field_type: &field.field_type,
                    registry: self.registry,
                },
            )?;
        }
        map.end()
    }
}

/// A value encoded according to its declared type
struct TypedValue<'a> {
    value: &'a Value,
    field_type: &'a FieldType,
    registry: &'a SchemaRegistry,
}

impl<'a> TypedValue<'a> {
    fn nested(&self, value: &'a Value, field_type: &'a FieldType) -> Self {
        Self {
            value,
            field_type,
            registry: self.registry,
        }
    }
}

impl Serialize for TypedValue<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match (self.field_type, self.value) {
            // Always f64, so integral values keep their `.0` on a rewrite
            (FieldType::Primitive(_), Value::Double(d) | Value::Timestamp(d)) => {
                serializer.serialize_f64(*d)
            }
            (FieldType::Primitive(_), Value::String(s)) => serializer.serialize_str(s),
            (FieldType::Primitive(_), Value::Integer(i)) => serializer.serialize_i64(*i),
            (FieldType::Primitive(_), Value::Boolean(b)) => serializer.serialize_bool(*b),
            (FieldType::Record(name), Value::Record(record)) => match self.registry.get(name) {
                Some(schema) => {
                    RecordSerializer::new(record, schema, self.registry).serialize(serializer)
                }
                None => serializer.serialize_map(Some(0))?.end(),
            },
            (FieldType::List(element), Value::List(items)) => {
                let items: Vec<_> = items
                    .iter()
                    .filter(|item| writable(item, element, self.registry))
                    .collect();
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(&self.nested(item, element))?;
                }
                seq.end()
            }
            (FieldType::Map(element), Value::Map(entries)) => {
                let entries: Vec<_> = entries
                    .iter()
                    .filter(|(_, value)| writable(value, element, self.registry))
                    .collect();
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, &self.nested(value, element))?;
                }
                map.end()
            }
            // Callers filter through `writable` first
            _ => serializer.serialize_unit(),
        }
    }
}

/// Whether `value` is written at all under `field_type`
///
/// Nulls, shape mismatches and records without a schema are skipped.
pub(crate) fn writable(value: &Value, field_type: &FieldType, registry: &SchemaRegistry) -> bool {
    if !value.conforms_to(field_type) {
        return false;
    }
    match field_type {
        FieldType::Record(name) => registry.contains(name),
        _ => true,
    }
}

/// Describe the type expected by a primitive kind, for diagnostics
pub(crate) fn describe(kind: PrimitiveKind) -> &'static str {
    match kind {
        PrimitiveKind::String => "a string",
        PrimitiveKind::Integer => "a 32-bit integer",
        PrimitiveKind::Long => "an integer",
        PrimitiveKind::Double => "a finite double",
        PrimitiveKind::Boolean => "a boolean",
        PrimitiveKind::Timestamp => "a timestamp in epoch seconds",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn registry() -> SchemaRegistry {
        SchemaRegistry::new(vec![
            RecordSchema::new("Rule")
                .field("Priority", FieldType::integer())
                .field("RuleId", FieldType::string()),
            RecordSchema::new("RuleSet")
                .field("Name", FieldType::string())
                .field("Rules", FieldType::list(FieldType::record("Rule")))
                .field("Labels", FieldType::map(FieldType::string())),
        ])
        .unwrap()
    }

    fn severity_registry() -> SchemaRegistry {
        SchemaRegistry::new(vec![RecordSchema::new("Severity")
            .field("Product", FieldType::double())
            .field("SeenAt", FieldType::timestamp())])
        .unwrap()
    }

    fn to_json(record: &Record, type_name: &str) -> String {
        let registry = registry();
        let schema = registry.get(type_name).unwrap();
        serde_json::to_string(&RecordSerializer::new(record, schema, &registry)).unwrap()
    }

    #[test]
    fn test_schema_order_not_insertion_order() {
        let record = Record::new().with("RuleId", "r1").with("Priority", 1);
        assert_eq!(to_json(&record, "Rule"), r#"{"Priority":1,"RuleId":"r1"}"#);
    }

    #[test]
    fn test_null_list_elements_skipped() {
        let rules = Value::List(vec![
            Value::from(Record::new().with("RuleId", "a")),
            Value::Null,
            Value::from(Record::new().with("RuleId", "b")),
        ]);
        let record = Record::new().with("Rules", rules);
        assert_eq!(
            to_json(&record, "RuleSet"),
            r#"{"Rules":[{"RuleId":"a"},{"RuleId":"b"}]}"#
        );
    }

    #[test]
    fn test_null_map_values_skipped() {
        let mut labels = BTreeMap::new();
        labels.insert("env".to_string(), Value::from("prod"));
        labels.insert("owner".to_string(), Value::Null);
        let record = Record::new().with("Labels", labels);
        assert_eq!(to_json(&record, "RuleSet"), r#"{"Labels":{"env":"prod"}}"#);
    }

    #[test]
    fn test_mistyped_values_skipped() {
        let record = Record::new()
            .with("Name", true)
            .with("Rules", vec![Value::from("not a rule")])
            .with("Labels", "not a map");
        assert_eq!(to_json(&record, "RuleSet"), r#"{"Rules":[]}"#);
    }

    #[test]
    fn test_explicit_empty_record_emitted() {
        let record = Record::new().with("Rules", vec![Record::new()]);
        assert_eq!(to_json(&record, "RuleSet"), r#"{"Rules":[{}]}"#);
    }

    #[test]
    fn test_double_fields_always_written_as_doubles() {
        let registry = severity_registry();
        let record = Record::new()
            .with("Product", 3.0)
            .with("SeenAt", Value::Timestamp(1_700_000_000.0));
        let schema = registry.get("Severity").unwrap();
        let json =
            serde_json::to_string(&RecordSerializer::new(&record, schema, &registry)).unwrap();
        assert_eq!(json, r#"{"Product":3.0,"SeenAt":1700000000.0}"#);
    }

    #[test]
    fn test_non_canonical_numbers_skipped() {
        let registry = severity_registry();
        let record = Record::new()
            .with("Product", 3)
            .with("SeenAt", Value::Double(5.0));
        let schema = registry.get("Severity").unwrap();
        let json =
            serde_json::to_string(&RecordSerializer::new(&record, schema, &registry)).unwrap();
        assert_eq!(json, "{}");
    }

    #[test]
    fn test_integer_range_enforced() {
        let record = Record::new().with("Priority", i64::from(i32::MAX) + 1);
        assert_eq!(to_json(&record, "Rule"), "{}");
    }
}
