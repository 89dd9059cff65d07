//! Schema catalogs
//!
//! A catalog bundles the record schemas and operation bindings of one
//! service. Catalogs are loaded from YAML or JSON files instead of being
//! hardcoded in Rust.

use crate::{MapperError, OperationBinding, Result, SchemaRegistry};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

const SECURITY_HUB_SAMPLE: &str = include_str!("../catalogs/securityhub.yaml");

/// Region used when neither the caller nor the catalog names one
pub const DEFAULT_REGION: &str = "us-east-1";

/// Root structure of a catalog file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaCatalog {
    /// Service identifier (e.g., "securityhub")
    pub service: String,

    /// API version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Endpoint host prefix; defaults to the service identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_prefix: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_region: Option<String>,

    /// Record schemas, validated on load
    #[serde(default)]
    pub records: SchemaRegistry,

    #[serde(default)]
    pub operations: Vec<OperationBinding>,
}

impl SchemaCatalog {
    /// Load a catalog file; `.json` files are read as JSON, anything else as YAML
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            MapperError::Parse(format!("Failed to read catalog file {:?}: {}", path, e))
        })?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let catalog = if is_json {
            Self::from_json_str(&content)?
        } else {
            Self::from_yaml_str(&content)?
        };

        tracing::debug!(
            path = %path.display(),
            service = %catalog.service,
            records = catalog.records.len(),
            operations = catalog.operations.len(),
            "loaded schema catalog"
        );
        Ok(catalog)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let catalog: Self = serde_yaml::from_str(content)
            .map_err(|e| MapperError::Parse(format!("Failed to parse catalog YAML: {}", e)))?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let catalog: Self = serde_json::from_str(content)
            .map_err(|e| MapperError::Parse(format!("Failed to parse catalog JSON: {}", e)))?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Bundled sample of Security Hub shapes and operations
    pub fn security_hub_sample() -> Result<Self> {
        Self::from_yaml_str(SECURITY_HUB_SAMPLE)
    }

    /// Check that operations refer to known records and bind existing fields
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for op in &self.operations {
            if !names.insert(op.name.as_str()) {
                return Err(MapperError::Schema(format!(
                    "Duplicate operation '{}'",
                    op.name
                )));
            }

            if let Some(output) = &op.output {
                self.records.require(output)?;
            }

            let bound: Vec<&str> = op
                .labels()
                .into_iter()
                .chain(op.query.iter().map(|q| q.field.as_str()))
                .chain(op.headers.iter().map(|h| h.field.as_str()))
                .collect();

            match &op.input {
                Some(input) => {
                    let record = self.records.require(input)?;
                    if let Some(missing) = bound.iter().find(|f| record.get_field(f).is_none()) {
                        return Err(MapperError::Schema(format!(
                            "Operation '{}' binds unknown field '{}' of '{}'",
                            op.name, missing, input
                        )));
                    }
                }
                None if !bound.is_empty() => {
                    return Err(MapperError::Schema(format!(
                        "Operation '{}' binds fields but has no input record",
                        op.name
                    )));
                }
                None => {}
            }
        }
        Ok(())
    }

    pub fn operation(&self, name: &str) -> Option<&OperationBinding> {
        self.operations.iter().find(|op| op.name == name)
    }

    /// Endpoint host, e.g. `securityhub.us-east-1.amazonaws.com`
    pub fn endpoint(&self, region: Option<&str>) -> String {
        let prefix = self.endpoint_prefix.as_deref().unwrap_or(&self.service);
        let region = region
            .or(self.default_region.as_deref())
            .unwrap_or(DEFAULT_REGION);
        format!("{}.{}.amazonaws.com", prefix, region)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FieldType;
    use std::io::Write;

    const MEMBERS_YAML: &str = r#"
service: securityhub
records:
  - name: AccountDetails
    fields:
      - name: AccountId
        type: String
      - name: Email
        type: String
  - name: CreateMembersRequest
    fields:
      - name: AccountDetails
        type: List<AccountDetails>
operations:
  - name: CreateMembers
    uri: /members
    input: CreateMembersRequest
"#;

    #[test]
    fn test_from_yaml_str() {
        let catalog = SchemaCatalog::from_yaml_str(MEMBERS_YAML).unwrap();
        assert_eq!(catalog.service, "securityhub");
        assert_eq!(catalog.records.len(), 2);

        let details = catalog.records.get("CreateMembersRequest").unwrap();
        assert_eq!(
            details.fields[0].field_type,
            FieldType::list(FieldType::record("AccountDetails"))
        );
        assert!(catalog.operation("CreateMembers").is_some());
    }

    #[test]
    fn test_unknown_output_rejected() {
        let yaml = format!("{}    output: CreateMembersResponse\n", MEMBERS_YAML);
        let err = SchemaCatalog::from_yaml_str(&yaml).unwrap_err();
        assert!(err.to_string().contains("CreateMembersResponse"));
    }

    #[test]
    fn test_unknown_bound_field_rejected() {
        let yaml = format!(
            "{}    query:\n      - param: maxResults\n        field: MaxResults\n",
            MEMBERS_YAML
        );
        let err = SchemaCatalog::from_yaml_str(&yaml).unwrap_err();
        assert!(matches!(err, MapperError::Schema(_)));
    }

    #[test]
    fn test_dangling_reference_is_parse_error() {
        let yaml = r#"
service: example
records:
  - name: RuleSet
    fields:
      - name: Rules
        type: List<Rule>
"#;
        assert!(SchemaCatalog::from_yaml_str(yaml).is_err());
    }

    #[test]
    fn test_yaml_round_trip() {
        let catalog = SchemaCatalog::from_yaml_str(MEMBERS_YAML).unwrap();
        let yaml = catalog.to_yaml_string().unwrap();
        assert_eq!(SchemaCatalog::from_yaml_str(&yaml).unwrap(), catalog);
    }

    #[test]
    fn test_load_json_and_yaml_files() {
        let catalog = SchemaCatalog::from_yaml_str(MEMBERS_YAML).unwrap();

        let mut yaml_file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        yaml_file.write_all(MEMBERS_YAML.as_bytes()).unwrap();
        assert_eq!(SchemaCatalog::load(yaml_file.path()).unwrap(), catalog);

        let mut json_file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        json_file
            .write_all(serde_json::to_string(&catalog).unwrap().as_bytes())
            .unwrap();
        assert_eq!(SchemaCatalog::load(json_file.path()).unwrap(), catalog);
    }

    #[test]
    fn test_load_missing_file() {
        let err = SchemaCatalog::load(Path::new("/nonexistent/catalog.yaml")).unwrap_err();
        assert!(matches!(err, MapperError::Parse(_)));
    }

    #[test]
    fn test_endpoint() {
        let mut catalog = SchemaCatalog::from_yaml_str(MEMBERS_YAML).unwrap();
        assert_eq!(catalog.endpoint(None), "securityhub.us-east-1.amazonaws.com");
        assert_eq!(
            catalog.endpoint(Some("eu-west-1")),
            "securityhub.eu-west-1.amazonaws.com"
        );

        catalog.default_region = Some("ap-south-1".to_string());
        catalog.endpoint_prefix = Some("hub".to_string());
        assert_eq!(catalog.endpoint(None), "hub.ap-south-1.amazonaws.com");
    }

    #[test]
    fn test_security_hub_sample() {
        let catalog = SchemaCatalog::security_hub_sample().unwrap();
        assert_eq!(catalog.service, "securityhub");
        assert!(catalog.records.contains("AwsSecurityFinding"));
        assert!(catalog.operation("GetFindings").is_some());
    }
}
