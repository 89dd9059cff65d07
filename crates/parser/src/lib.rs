//! Model import for schema catalogs
//!
//! Service models are converted into a [`SchemaCatalog`]: one record schema
//! per structure shape and one operation binding per operation.
//!
//! ## Supported formats
//! - Smithy JSON AST, as published in the AWS api-models repository

pub mod smithy;

pub use smithy::SmithyParser;

use findings_mapper_common::{Result, SchemaCatalog};
use std::path::Path;

/// Import a Smithy JSON model file into a catalog
pub fn import_smithy(path: &Path) -> Result<SchemaCatalog> {
    SmithyParser::from_file(path)?.parse()
}
