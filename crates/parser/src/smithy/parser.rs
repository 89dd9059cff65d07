//! Smithy spec file parser

use super::types::SmithyModel;
use findings_mapper_common::{MapperError, Result, SchemaCatalog};
use std::fs;
use std::path::Path;

/// Smithy specification parser
///
/// Reads and parses Smithy JSON AST files from the AWS api-models-aws repository
pub struct SmithyParser {
    /// Loaded Smithy model
    model: SmithyModel,

    /// Catalog service name; derived from the model when unset
    service_name: Option<String>,
}

impl SmithyParser {
    /// Load Smithy model from file path
    ///
    /// # Example
    /// ```rust,ignore
    /// let parser = SmithyParser::from_file(
    ///     "api-models-aws/securityhub/2018-10-26/securityhub-2018-10-26.json",
    /// )?;
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            MapperError::Parse(format!(
                "Failed to read Smithy file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_json(&content)
    }

    /// Parse Smithy model from JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let model: SmithyModel = serde_json::from_str(json)
            .map_err(|e| MapperError::Parse(format!("Failed to parse Smithy JSON: {}", e)))?;

        Ok(Self {
            model,
            service_name: None,
        })
    }

    /// Override the service name written to the catalog
    pub fn with_service_name(mut self, service_name: impl Into<String>) -> Self {
        self.service_name = Some(service_name.into());
        self
    }

    /// Convert the model into a validated catalog
    pub fn parse(&self) -> Result<SchemaCatalog> {
        let catalog = super::converter::convert_smithy_to_catalog(
            &self.model,
            self.service_name.as_deref(),
        )?;

        tracing::debug!(
            service = %catalog.service,
            shapes = self.model.shapes.len(),
            records = catalog.records.len(),
            operations = catalog.operations.len(),
            "imported Smithy model"
        );
        Ok(catalog)
    }
}
