//! Record schemas
//!
//! A [`RecordSchema`] is an ordered list of wire keys with their semantic
//! types. Schemas are collected in a [`SchemaRegistry`], which resolves
//! record references (including recursive ones) by name.
//!
//! Field types are written as type expressions in catalogs:
//! `String`, `Integer`, `Long`, `Double`, `Boolean`, `Timestamp`,
//! `List<T>`, `Map<String, T>`, or any other identifier as a record reference.

use crate::{MapperError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// Primitive wire kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveKind {
    /// UTF-8 string, emitted as-is
    String,
    /// 32-bit signed integer
    Integer,
    /// 64-bit signed integer
    Long,
    /// Finite double
    Double,
    Boolean,
    /// Epoch seconds, emitted as a JSON number
    Timestamp,
}

impl PrimitiveKind {
    /// Type expression name of this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveKind::String => "String",
            PrimitiveKind::Integer => "Integer",
            PrimitiveKind::Long => "Long",
            PrimitiveKind::Double => "Double",
            PrimitiveKind::Boolean => "Boolean",
            PrimitiveKind::Timestamp => "Timestamp",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "String" => Some(PrimitiveKind::String),
            "Integer" => Some(PrimitiveKind::Integer),
            "Long" => Some(PrimitiveKind::Long),
            "Double" => Some(PrimitiveKind::Double),
            "Boolean" => Some(PrimitiveKind::Boolean),
            "Timestamp" => Some(PrimitiveKind::Timestamp),
            _ => None,
        }
    }
}

/// Semantic type of a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FieldType {
    Primitive(PrimitiveKind),
    /// Reference to a record schema by name
    Record(String),
    List(Box<FieldType>),
    /// Map with string keys
    Map(Box<FieldType>),
}

impl FieldType {
    pub fn string() -> Self {
        FieldType::Primitive(PrimitiveKind::String)
    }

    pub fn integer() -> Self {
        FieldType::Primitive(PrimitiveKind::Integer)
    }

    pub fn long() -> Self {
        FieldType::Primitive(PrimitiveKind::Long)
    }

    pub fn double() -> Self {
        FieldType::Primitive(PrimitiveKind::Double)
    }

    pub fn boolean() -> Self {
        FieldType::Primitive(PrimitiveKind::Boolean)
    }

    pub fn timestamp() -> Self {
        FieldType::Primitive(PrimitiveKind::Timestamp)
    }

    pub fn record(name: impl Into<String>) -> Self {
        FieldType::Record(name.into())
    }

    pub fn list(element: FieldType) -> Self {
        FieldType::List(Box::new(element))
    }

    pub fn map(value: FieldType) -> Self {
        FieldType::Map(Box::new(value))
    }

    /// Name of the record this type ultimately refers to, looking through
    /// lists and maps
    pub fn referenced_record(&self) -> Option<&str> {
        match self {
            FieldType::Primitive(_) => None,
            FieldType::Record(name) => Some(name),
            FieldType::List(inner) | FieldType::Map(inner) => inner.referenced_record(),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Primitive(kind) => f.write_str(kind.as_str()),
            FieldType::Record(name) => f.write_str(name),
            FieldType::List(inner) => write!(f, "List<{}>", inner),
            FieldType::Map(inner) => write!(f, "Map<String, {}>", inner),
        }
    }
}

impl FromStr for FieldType {
    type Err = MapperError;

    /// Parse a type expression
    ///
    /// # Examples
    /// ```
    /// use findings_mapper_common::FieldType;
    ///
    /// assert_eq!("String".parse::<FieldType>().unwrap(), FieldType::string());
    /// assert_eq!(
    ///     "List<Rule>".parse::<FieldType>().unwrap(),
    ///     FieldType::list(FieldType::record("Rule"))
    /// );
    /// ```
    fn from_str(expr: &str) -> Result<Self> {
        let expr = expr.trim();

        if let Some(inner) = strip_generic(expr, "List") {
            return Ok(FieldType::list(inner.parse()?));
        }

        if let Some(inner) = strip_generic(expr, "Map") {
            let (key, value) = split_top_level(inner).ok_or_else(|| {
                MapperError::Parse(format!("Map type needs a key and a value: '{}'", expr))
            })?;
            if key.trim() != "String" {
                return Err(MapperError::Parse(format!(
                    "Map keys must be String, found '{}'",
                    key.trim()
                )));
            }
            return Ok(FieldType::map(value.parse()?));
        }

        if let Some(kind) = PrimitiveKind::from_name(expr) {
            return Ok(FieldType::Primitive(kind));
        }

        if is_identifier(expr) {
            Ok(FieldType::Record(expr.to_string()))
        } else {
            Err(MapperError::Parse(format!(
                "Invalid type expression: '{}'",
                expr
            )))
        }
    }
}

impl TryFrom<String> for FieldType {
    type Error = MapperError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<FieldType> for String {
    fn from(value: FieldType) -> Self {
        value.to_string()
    }
}

/// `List<T>` -> `T`
fn strip_generic<'a>(expr: &'a str, name: &str) -> Option<&'a str> {
    expr.strip_prefix(name)
        .map(str::trim_start)
        .and_then(|s| s.strip_prefix('<'))
        .and_then(|s| s.strip_suffix('>'))
}

/// Split `K, V` at the first comma outside angle brackets
fn split_top_level(inner: &str) -> Option<(&str, &str)> {
    let mut depth = 0usize;
    for (i, ch) in inner.char_indices() {
        match ch {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => return Some((&inner[..i], &inner[i + 1..])),
            _ => {}
        }
    }
    None
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// One field of a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    /// Wire key (exact, case-sensitive)
    pub name: String,

    /// Semantic type
    #[serde(rename = "type")]
    pub field_type: FieldType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FieldSchema {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Named, ordered list of fields
///
/// Field order is the serialization order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSchema {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub fields: Vec<FieldSchema>,
}

impl RecordSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields: Vec::new(),
        }
    }

    /// Append a field (builder style)
    pub fn field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.push(FieldSchema::new(name, field_type));
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Look up a field by exact wire key
    pub fn get_field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Validated collection of record schemas
///
/// Every record reference resolves and field names are unique within a
/// record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<RecordSchema>", into = "Vec<RecordSchema>")]
pub struct SchemaRegistry {
    records: BTreeMap<String, RecordSchema>,
}

impl SchemaRegistry {
    /// Build and validate a registry
    pub fn new(records: impl IntoIterator<Item = RecordSchema>) -> Result<Self> {
        let mut map = BTreeMap::new();
        for record in records {
            let name = record.name.clone();
            if map.insert(name.clone(), record).is_some() {
                return Err(MapperError::Schema(format!(
                    "Duplicate record type '{}'",
                    name
                )));
            }
        }

        let registry = Self { records: map };
        registry.validate()?;
        Ok(registry)
    }

    fn validate(&self) -> Result<()> {
        for record in self.records.values() {
            let mut seen = HashSet::new();
            for field in &record.fields {
                if !seen.insert(field.name.as_str()) {
                    return Err(MapperError::Schema(format!(
                        "Duplicate field '{}' in record '{}'",
                        field.name, record.name
                    )));
                }
                if let Some(target) = field.field_type.referenced_record() {
                    if !self.records.contains_key(target) {
                        return Err(MapperError::Schema(format!(
                            "Field '{}.{}' refers to unknown record type '{}'",
                            record.name, field.name, target
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&RecordSchema> {
        self.records.get(name)
    }

    /// Like [`get`](Self::get), but an unknown name is a schema error
    pub fn require(&self, name: &str) -> Result<&RecordSchema> {
        self.get(name)
            .ok_or_else(|| MapperError::Schema(format!("Unknown record type '{}'", name)))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.records.contains_key(name)
    }

    /// Records in name order
    pub fn records(&self) -> impl Iterator<Item = &RecordSchema> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl TryFrom<Vec<RecordSchema>> for SchemaRegistry {
    type Error = MapperError;

    fn try_from(records: Vec<RecordSchema>) -> Result<Self> {
        Self::new(records)
    }
}

impl From<SchemaRegistry> for Vec<RecordSchema> {
    fn from(registry: SchemaRegistry) -> Self {
        registry.records.into_values().collect()
    }
}
