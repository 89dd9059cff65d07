//! Smithy JSON AST type definitions
//!
//! These types represent the structure of Smithy JSON files.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Trait values keyed by trait shape id
pub type Traits = BTreeMap<String, serde_json::Value>;

/// Root Smithy model document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmithyModel {
    /// Smithy version (e.g., "2.0")
    pub smithy: String,

    /// Shape definitions (operations, structures, services, etc.)
    #[serde(default)]
    pub shapes: BTreeMap<String, Shape>,
}

/// A Smithy shape (can be service, operation, structure, etc.)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Shape {
    /// Service definition
    Service {
        /// API version
        #[serde(default)]
        version: Option<String>,

        /// Operations exposed by this service
        #[serde(default)]
        operations: Vec<ShapeReference>,

        /// Resources managed by this service
        #[serde(default)]
        resources: Vec<ShapeReference>,

        #[serde(default)]
        traits: Traits,
    },

    /// Operation definition
    Operation {
        /// Input shape
        #[serde(default)]
        input: Option<ShapeReference>,

        /// Output shape
        #[serde(default)]
        output: Option<ShapeReference>,

        #[serde(default)]
        traits: Traits,
    },

    /// Structure definition (input/output and data types)
    Structure {
        /// Member fields, ordered by member name
        #[serde(default)]
        members: BTreeMap<String, Member>,

        #[serde(default)]
        traits: Traits,
    },

    /// Tagged union; mapped like a structure with at most one member set
    Union {
        #[serde(default)]
        members: BTreeMap<String, Member>,

        #[serde(default)]
        traits: Traits,
    },

    String {
        #[serde(default)]
        traits: Traits,
    },

    /// String enumeration (Smithy 2.0)
    Enum {
        #[serde(default)]
        traits: Traits,
    },

    /// Integer enumeration (Smithy 2.0)
    #[serde(rename = "intEnum")]
    IntEnum {
        #[serde(default)]
        traits: Traits,
    },

    /// Binary data, base64 text on the wire
    Blob {
        #[serde(default)]
        traits: Traits,
    },

    Byte {
        #[serde(default)]
        traits: Traits,
    },

    Short {
        #[serde(default)]
        traits: Traits,
    },

    Integer {
        #[serde(default)]
        traits: Traits,
    },

    Long {
        #[serde(default)]
        traits: Traits,
    },

    #[serde(rename = "bigInteger")]
    BigInteger {
        #[serde(default)]
        traits: Traits,
    },

    Float {
        #[serde(default)]
        traits: Traits,
    },

    Double {
        #[serde(default)]
        traits: Traits,
    },

    #[serde(rename = "bigDecimal")]
    BigDecimal {
        #[serde(default)]
        traits: Traits,
    },

    Boolean {
        #[serde(default)]
        traits: Traits,
    },

    Timestamp {
        #[serde(default)]
        traits: Traits,
    },

    /// List type
    List {
        /// Member type
        member: ShapeReference,

        #[serde(default)]
        traits: Traits,
    },

    /// Set type (Smithy 1.0), a list on the wire
    Set {
        member: ShapeReference,

        #[serde(default)]
        traits: Traits,
    },

    /// Map type
    Map {
        /// Key type
        key: ShapeReference,

        /// Value type
        value: ShapeReference,

        #[serde(default)]
        traits: Traits,
    },

    /// Resource definition (e.g., an action target)
    Resource {
        #[serde(default)]
        create: Option<ShapeReference>,

        #[serde(default)]
        read: Option<ShapeReference>,

        #[serde(default)]
        update: Option<ShapeReference>,

        #[serde(default)]
        delete: Option<ShapeReference>,

        #[serde(default)]
        list: Option<ShapeReference>,

        #[serde(default)]
        put: Option<ShapeReference>,

        /// Instance operations
        #[serde(default)]
        operations: Vec<ShapeReference>,

        #[serde(default, rename = "collectionOperations")]
        collection_operations: Vec<ShapeReference>,

        /// Child resources
        #[serde(default)]
        resources: Vec<ShapeReference>,

        #[serde(default)]
        traits: Traits,
    },

    /// Fallback for other shape types (document, member, ...)
    #[serde(other)]
    Other,
}

/// Reference to another shape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShapeReference {
    /// Target shape ID (e.g., "com.amazonaws.securityhub#AwsSecurityFinding")
    pub target: String,
}

/// Structure member definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    /// Target shape for this member
    pub target: String,

    #[serde(default)]
    pub traits: Traits,
}

impl Member {
    /// Wire key of the member: `jsonName` if present, else the member name
    pub fn wire_name<'a>(&'a self, member_name: &'a str) -> &'a str {
        self.traits
            .get(traits::JSON_NAME)
            .and_then(|v| v.as_str())
            .unwrap_or(member_name)
    }

    pub fn documentation(&self) -> Option<String> {
        documentation(&self.traits)
    }
}

impl SmithyModel {
    /// Find the service shape in the model
    ///
    /// Shape ids are ordered, so the first service by id wins when a model
    /// declares several.
    pub fn find_service(&self) -> Option<(&String, &Shape)> {
        self.shapes
            .iter()
            .find(|(_, shape)| matches!(shape, Shape::Service { .. }))
    }

    /// Get a shape by its ID
    pub fn get_shape(&self, shape_id: &str) -> Option<&Shape> {
        self.shapes.get(shape_id)
    }

    /// Extract service name from shape ID
    /// e.g., "com.amazonaws.securityhub#SecurityHub" -> "securityhub"
    pub fn extract_service_name(shape_id: &str) -> String {
        shape_name(shape_id).to_lowercase()
    }
}

/// Local name of a shape id
/// e.g., "com.amazonaws.securityhub#Severity" -> "Severity"
pub fn shape_name(shape_id: &str) -> &str {
    shape_id.rsplit('#').next().unwrap_or(shape_id)
}

/// Documentation trait of a shape or member
pub fn documentation(traits: &Traits) -> Option<String> {
    traits
        .get(traits::DOCUMENTATION)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

/// Common Smithy trait names
pub mod traits {
    pub const DOCUMENTATION: &str = "smithy.api#documentation";
    pub const HTTP: &str = "smithy.api#http";
    pub const HTTP_LABEL: &str = "smithy.api#httpLabel";
    pub const HTTP_QUERY: &str = "smithy.api#httpQuery";
    pub const HTTP_HEADER: &str = "smithy.api#httpHeader";
    pub const JSON_NAME: &str = "smithy.api#jsonName";
    pub const AWS_SERVICE: &str = "aws.api#service";
}
