//! Operation bindings
//!
//! Describe how an operation's input record is laid onto an HTTP request:
//! method, URI template, and which fields travel as labels, query parameters
//! or headers instead of the JSON body.

use serde::{Deserialize, Serialize};
use std::fmt;

/// HTTP method of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    #[default]
    Post,
    Put,
    Patch,
    Delete,
    Head,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
        }
    }

    /// Parse a method name, case-insensitively
    pub fn parse(method: &str) -> Option<Self> {
        match method.to_ascii_uppercase().as_str() {
            "GET" => Some(HttpMethod::Get),
            "POST" => Some(HttpMethod::Post),
            "PUT" => Some(HttpMethod::Put),
            "PATCH" => Some(HttpMethod::Patch),
            "DELETE" => Some(HttpMethod::Delete),
            "HEAD" => Some(HttpMethod::Head),
            _ => None,
        }
    }

    /// GET, HEAD and DELETE requests carry no JSON body
    pub fn has_body(&self) -> bool {
        !matches!(self, HttpMethod::Get | HttpMethod::Head | HttpMethod::Delete)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field sent as a query parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryBinding {
    /// Query parameter name
    pub param: String,
    /// Input field wire key
    pub field: String,
}

/// Field sent as a request header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderBinding {
    pub header: String,
    pub field: String,
}

/// Request/response layout of one API operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationBinding {
    /// Operation name (e.g., "GetFindings")
    pub name: String,

    #[serde(default)]
    pub method: HttpMethod,

    /// URI template with `{Label}` / `{Label+}` placeholders
    #[serde(default = "default_uri")]
    pub uri: String,

    /// Input record type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,

    /// Output record type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub query: Vec<QueryBinding>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<HeaderBinding>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn default_uri() -> String {
    "/".to_string()
}

impl OperationBinding {
    pub fn new(name: impl Into<String>, method: HttpMethod, uri: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            method,
            uri: uri.into(),
            input: None,
            output: None,
            query: Vec::new(),
            headers: Vec::new(),
            description: None,
        }
    }

    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.input = Some(input.into());
        self
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }

    pub fn with_query(mut self, param: impl Into<String>, field: impl Into<String>) -> Self {
        self.query.push(QueryBinding {
            param: param.into(),
            field: field.into(),
        });
        self
    }

    pub fn with_header(mut self, header: impl Into<String>, field: impl Into<String>) -> Self {
        self.headers.push(HeaderBinding {
            header: header.into(),
            field: field.into(),
        });
        self
    }

    /// Field names referenced by `{Label}` placeholders in the URI
    ///
    /// A greedy `{Label+}` yields `Label`.
    pub fn labels(&self) -> Vec<&str> {
        let mut labels = Vec::new();
        let mut rest = self.uri.as_str();
        while let Some(start) = rest.find('{') {
            let after = &rest[start + 1..];
            match after.find('}') {
                Some(end) => {
                    labels.push(after[..end].trim_end_matches('+'));
                    rest = &after[end + 1..];
                }
                None => break,
            }
        }
        labels
    }

    /// Whether a field travels outside the JSON body
    pub fn is_bound(&self, field: &str) -> bool {
        self.labels().contains(&field)
            || self.query.iter().any(|q| q.field == field)
            || self.headers.iter().any(|h| h.field == field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        let op = OperationBinding::new(
            "DeleteActionTarget",
            HttpMethod::Delete,
            "/actionTargets/{ActionTargetArn+}",
        );
        assert_eq!(op.labels(), vec!["ActionTargetArn"]);

        let op = OperationBinding::new("Get", HttpMethod::Get, "/a/{First}/b/{Second}");
        assert_eq!(op.labels(), vec!["First", "Second"]);

        let op = OperationBinding::new("Plain", HttpMethod::Post, "/findings");
        assert!(op.labels().is_empty());
    }

    #[test]
    fn test_is_bound() {
        let op = OperationBinding::new("ListInvitations", HttpMethod::Get, "/invitations")
            .with_query("MaxResults", "MaxResults")
            .with_query("NextToken", "NextToken");
        assert!(op.is_bound("MaxResults"));
        assert!(!op.is_bound("Filters"));
    }

    #[test]
    fn test_method_body_and_parse() {
        assert!(HttpMethod::Post.has_body());
        assert!(HttpMethod::Patch.has_body());
        assert!(!HttpMethod::Get.has_body());
        assert!(!HttpMethod::Delete.has_body());
        assert_eq!(HttpMethod::parse("patch"), Some(HttpMethod::Patch));
        assert_eq!(HttpMethod::parse("TRACE"), None);
    }

    #[test]
    fn test_binding_yaml_defaults() {
        let op: OperationBinding = serde_yaml::from_str("name: CreateMembers\n").unwrap();
        assert_eq!(op.method, HttpMethod::Post);
        assert_eq!(op.uri, "/");
        assert!(op.input.is_none());
        assert!(op.query.is_empty());
    }
}
