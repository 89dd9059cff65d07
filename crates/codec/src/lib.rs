//! Schema-driven JSON codec
//!
//! This crate maps [`Record`] instances to JSON objects and back, driven by
//! the record schemas of a [`SchemaRegistry`]. One generic engine handles
//! every record type, including nested records, lists and string-keyed maps.
//!
//! It also lays operation inputs onto transport-agnostic request envelopes
//! and classifies responses into output records or service errors.
//!
//! ## Wire rules
//! - Fields are written in schema order; unset fields are never written.
//! - Null list elements and map values are skipped on write.
//! - Keys unknown to the schema are read and discarded.
//! - A value whose shape does not fit its declared type decodes as absent.
//! - Only invalid JSON syntax is an error ([`MapperError::MalformedWireData`]).

mod deserializer;
mod request;
mod response;
mod serializer;
mod validate;

pub use deserializer::RecordSeed;
pub use request::{RequestEnvelope, RequestMarshaller, JSON_CONTENT_TYPE};
pub use response::{ResponseUnmarshaller, ServiceError, ServiceErrorKind};
pub use serializer::RecordSerializer;
pub use validate::{validate, Violation};

use findings_mapper_common::{MapperError, Record, RecordSchema, Result, SchemaRegistry};
use serde::de::DeserializeSeed;
use std::io;

/// Generic codec for every record type of a registry
///
/// The codec holds no state besides the borrowed registry, so it is cheap to
/// copy and safe to share across threads.
#[derive(Debug, Clone, Copy)]
pub struct TypedObjectCodec<'r> {
    registry: &'r SchemaRegistry,
}

impl<'r> TypedObjectCodec<'r> {
    pub fn new(registry: &'r SchemaRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'r SchemaRegistry {
        self.registry
    }

    /// Schema of a record type; unknown names are schema errors
    pub fn schema(&self, type_name: &str) -> Result<&'r RecordSchema> {
        self.registry.require(type_name)
    }

    /// Pair a record with its schema for use with any serde serializer
    pub fn serializer<'a>(
        &'a self,
        record: &'a Record,
        type_name: &str,
    ) -> Result<RecordSerializer<'a>> {
        Ok(RecordSerializer::new(
            record,
            self.schema(type_name)?,
            self.registry,
        ))
    }

    /// Serialize a record into a JSON object value
    pub fn serialize(&self, record: &Record, type_name: &str) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self.serializer(record, type_name)?)?)
    }

    /// Serialize a record into compact JSON text
    pub fn to_string(&self, record: &Record, type_name: &str) -> Result<String> {
        Ok(serde_json::to_string(&self.serializer(record, type_name)?)?)
    }

    pub fn to_string_pretty(&self, record: &Record, type_name: &str) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.serializer(record, type_name)?)?)
    }

    pub fn to_vec(&self, record: &Record, type_name: &str) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.serializer(record, type_name)?)?)
    }

    /// Stream a record into `writer`
    pub fn to_writer<W: io::Write>(
        &self,
        writer: W,
        record: &Record,
        type_name: &str,
    ) -> Result<()> {
        serde_json::to_writer(writer, &self.serializer(record, type_name)?)?;
        Ok(())
    }

    /// Parse a JSON value tree
    ///
    /// Returns `Ok(None)` when `json` is not an object.
    pub fn parse(&self, json: &serde_json::Value, type_name: &str) -> Result<Option<Record>> {
        RecordSeed::new(self.schema(type_name)?, self.registry)
            .deserialize(json)
            .map_err(MapperError::MalformedWireData)
    }

    /// Parse JSON text without building an intermediate tree
    pub fn parse_str(&self, json: &str, type_name: &str) -> Result<Option<Record>> {
        let seed = RecordSeed::new(self.schema(type_name)?, self.registry);
        let mut deserializer = serde_json::Deserializer::from_str(json);
        parse_with(seed, &mut deserializer)
    }

    pub fn parse_slice(&self, json: &[u8], type_name: &str) -> Result<Option<Record>> {
        let seed = RecordSeed::new(self.schema(type_name)?, self.registry);
        let mut deserializer = serde_json::Deserializer::from_slice(json);
        parse_with(seed, &mut deserializer)
    }

    /// Parse JSON from a reader; the reader is only used during this call
    pub fn parse_reader<R: io::Read>(&self, reader: R, type_name: &str) -> Result<Option<Record>> {
        let seed = RecordSeed::new(self.schema(type_name)?, self.registry);
        let mut deserializer = serde_json::Deserializer::from_reader(reader);
        parse_with(seed, &mut deserializer)
    }

    /// Report values of `record` that serialization would drop
    pub fn validate(&self, record: &Record, type_name: &str) -> Result<Vec<Violation>> {
        Ok(validate(record, self.schema(type_name)?, self.registry))
    }
}

fn parse_with<'de, R: serde_json::de::Read<'de>>(
    seed: RecordSeed<'_>,
    deserializer: &mut serde_json::Deserializer<R>,
) -> Result<Option<Record>> {
    let record = seed
        .deserialize(&mut *deserializer)
        .map_err(MapperError::MalformedWireData)?;
    // Trailing garbage after the object is malformed input
    deserializer.end().map_err(MapperError::MalformedWireData)?;
    Ok(record)
}
