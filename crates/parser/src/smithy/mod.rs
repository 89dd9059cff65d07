//! Smithy specification parser
//!
//! Parses AWS Smithy JSON AST format into a [`SchemaCatalog`].
//!
//! Smithy specs are available at: https://github.com/aws/api-models-aws
//!
//! ## Format
//! Smithy JSON AST contains:
//! - Service definitions with operations
//! - Shape definitions (structures, operations, simple types, collections)
//! - Traits (documentation, HTTP bindings, JSON names)
//!
//! ## Usage
//! ```rust,ignore
//! use findings_mapper_parser::smithy::SmithyParser;
//!
//! let parser = SmithyParser::from_file("securityhub/2018-10-26/securityhub-2018-10-26.json")?;
//! let catalog = parser.parse()?;
//! ```
//!
//! [`SchemaCatalog`]: findings_mapper_common::SchemaCatalog

mod converter;
mod parser;
mod types;

pub use parser::SmithyParser;
pub use types::*;
