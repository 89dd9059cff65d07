//! Common types for the findings mapper
//!
//! This crate contains the record schema model, the dynamic value model,
//! operation bindings, schema catalogs and the shared error type used by
//! the parser, codec and CLI components.

mod catalog;
mod operation;
mod schema;
mod value;

pub use catalog::{SchemaCatalog, DEFAULT_REGION};
pub use operation::{HeaderBinding, HttpMethod, OperationBinding, QueryBinding};
pub use schema::{FieldSchema, FieldType, PrimitiveKind, RecordSchema, SchemaRegistry};
pub use value::{Record, Value};

use thiserror::Error;

/// Errors that can occur while loading schemas or mapping payloads
#[derive(Error, Debug)]
pub enum MapperError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Schema error: {0}")]
    Schema(String),

    /// Invalid or truncated JSON reported by the tokenizer
    #[error("Malformed wire data: {0}")]
    MalformedWireData(#[source] serde_json::Error),

    #[error("Missing value for URI label '{0}'")]
    MissingLabel(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type for mapper operations
pub type Result<T> = std::result::Result<T, MapperError>;
