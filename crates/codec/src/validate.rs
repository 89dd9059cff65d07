//! Record validation
//!
//! Serialization silently drops values it cannot write. [`validate`] reports
//! those values up front, for callers that build records by hand.

use crate::serializer::describe;
use findings_mapper_common::{FieldType, Record, RecordSchema, SchemaRegistry, Value};
use std::fmt;

/// A value that would be dropped on serialization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Location, e.g. `Rules[1].Priority`
    pub path: String,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Walk `record` against `schema` and collect every value that would be dropped
///
/// Null list elements and map values are not violations; skipping them is
/// the documented behavior.
pub fn validate(
    record: &Record,
    schema: &RecordSchema,
    registry: &SchemaRegistry,
) -> Vec<Violation> {
    let mut violations = Vec::new();
    check_record(record, schema, registry, "", &mut violations);
    violations
}

fn check_record(
    record: &Record,
    schema: &RecordSchema,
    registry: &SchemaRegistry,
    prefix: &str,
    out: &mut Vec<Violation>,
) {
    for (name, value) in record.iter() {
        let path = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", prefix, name)
        };
        match schema.get_field(name) {
            Some(field) => check_value(value, &field.field_type, registry, &path, out),
            None => out.push(Violation {
                path,
                message: format!("not a field of '{}'", schema.name),
            }),
        }
    }
}

fn check_value(
    value: &Value,
    field_type: &FieldType,
    registry: &SchemaRegistry,
    path: &str,
    out: &mut Vec<Violation>,
) {
    if !value.conforms_to(field_type) {
        out.push(Violation {
            path: path.to_string(),
            message: format!("expected {}", expected(field_type)),
        });
        return;
    }

    match (field_type, value) {
        (FieldType::Record(name), Value::Record(record)) => match registry.get(name) {
            Some(schema) => check_record(record, schema, registry, path, out),
            None => out.push(Violation {
                path: path.to_string(),
                message: format!("unknown record type '{}'", name),
            }),
        },
        (FieldType::List(element), Value::List(items)) => {
            for (i, item) in items.iter().enumerate() {
                if !item.is_null() {
                    check_value(item, element, registry, &format!("{}[{}]", path, i), out);
                }
            }
        }
        (FieldType::Map(element), Value::Map(entries)) => {
            for (key, item) in entries {
                if !item.is_null() {
                    check_value(item, element, registry, &format!("{}.{}", path, key), out);
                }
            }
        }
        _ => {}
    }
}

fn expected(field_type: &FieldType) -> String {
    match field_type {
        FieldType::Primitive(kind) => describe(*kind).to_string(),
        FieldType::Record(name) => format!("a '{}' record", name),
        FieldType::List(_) => format!("a list ({})", field_type),
        FieldType::Map(_) => format!("a map ({})", field_type),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> SchemaRegistry {
        SchemaRegistry::new(vec![
            RecordSchema::new("Rule")
                .field("Priority", FieldType::integer())
                .field("RuleId", FieldType::string()),
            RecordSchema::new("RuleSet")
                .field("Rules", FieldType::list(FieldType::record("Rule")))
                .field("Labels", FieldType::map(FieldType::string())),
        ])
        .unwrap()
    }

    #[test]
    fn test_valid_record() {
        let registry = registry();
        let record = Record::new().with(
            "Rules",
            vec![Value::from(Record::new().with("Priority", 1)), Value::Null],
        );
        assert!(validate(&record, registry.get("RuleSet").unwrap(), &registry).is_empty());
    }

    #[test]
    fn test_nested_violations_have_paths() {
        let registry = registry();
        let record = Record::new()
            .with(
                "Rules",
                vec![
                    Record::new().with("Priority", 1),
                    Record::new().with("Priority", "high").with("Extra", 1),
                ],
            )
            .with("Labels", "env=prod");

        let violations = validate(&record, registry.get("RuleSet").unwrap(), &registry);
        let rendered: Vec<String> = violations.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec![
                "Labels: expected a map (Map<String, String>)",
                "Rules[1].Extra: not a field of 'Rule'",
                "Rules[1].Priority: expected a 32-bit integer",
            ]
        );
    }
}
