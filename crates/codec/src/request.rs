//! Request marshalling
//!
//! Lays an operation's input record onto a [`RequestEnvelope`]: URI labels
//! and query parameters for bound fields, a JSON body for the rest. Sending
//! the envelope (signing, retries, pagination) is left to the transport.

use crate::TypedObjectCodec;
use findings_mapper_common::{
    HttpMethod, MapperError, OperationBinding, Record, Result, SchemaCatalog, Value,
};
use std::collections::BTreeMap;

/// Content type of JSON request bodies
pub const JSON_CONTENT_TYPE: &str = "application/x-amz-json-1.1";

/// Transport-agnostic outgoing request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestEnvelope {
    pub method: HttpMethod,
    /// Endpoint host, e.g. `securityhub.us-east-1.amazonaws.com`
    pub host: String,
    /// Percent-encoded path
    pub path: String,
    /// Query parameters in binding order (not yet encoded)
    pub query: Vec<(String, String)>,
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
}

impl RequestEnvelope {
    /// Path plus encoded query string
    pub fn uri(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let query: Vec<String> = self
            .query
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect();
        format!("{}?{}", self.path, query.join("&"))
    }
}

/// Builds request envelopes for the operations of a catalog
pub struct RequestMarshaller<'c> {
    catalog: &'c SchemaCatalog,
    region: Option<String>,
}

impl<'c> RequestMarshaller<'c> {
    pub fn new(catalog: &'c SchemaCatalog) -> Self {
        Self {
            catalog,
            region: None,
        }
    }

    /// Target a region other than the catalog default
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Marshall the input of a named operation
    pub fn marshall(&self, operation: &str, input: &Record) -> Result<RequestEnvelope> {
        let binding = self.catalog.operation(operation).ok_or_else(|| {
            MapperError::Schema(format!("Unknown operation '{}'", operation))
        })?;
        self.marshall_binding(binding, input)
    }

    pub fn marshall_binding(
        &self,
        binding: &OperationBinding,
        input: &Record,
    ) -> Result<RequestEnvelope> {
        let codec = TypedObjectCodec::new(&self.catalog.records);

        let path = expand_uri(&binding.uri, input)?;

        let mut query = Vec::new();
        for q in &binding.query {
            match input.get(&q.field) {
                Some(Value::List(items)) => {
                    query.extend(
                        items
                            .iter()
                            .filter_map(scalar_to_string)
                            .map(|v| (q.param.clone(), v)),
                    );
                }
                Some(value) => {
                    if let Some(v) = scalar_to_string(value) {
                        query.push((q.param.clone(), v));
                    }
                }
                None => {}
            }
        }

        let mut headers = BTreeMap::new();
        for h in &binding.headers {
            if let Some(v) = input.get(&h.field).and_then(scalar_to_string) {
                headers.insert(h.header.clone(), v);
            }
        }

        let body = if binding.method.has_body() {
            let body = match &binding.input {
                Some(input_type) => {
                    let unbound: Record = input
                        .iter()
                        .filter(|(name, _)| !binding.is_bound(name))
                        .map(|(name, value)| (name, value.clone()))
                        .collect();
                    codec.to_string(&unbound, input_type)?
                }
                None => "{}".to_string(),
            };
            headers.insert("Content-Type".to_string(), JSON_CONTENT_TYPE.to_string());
            Some(body)
        } else {
            None
        };

        let envelope = RequestEnvelope {
            method: binding.method,
            host: self.catalog.endpoint(self.region.as_deref()),
            path,
            query,
            headers,
            body,
        };

        tracing::debug!(
            operation = %binding.name,
            method = %envelope.method,
            uri = %envelope.uri(),
            "marshalled request"
        );
        Ok(envelope)
    }
}

/// Substitute `{Label}` and greedy `{Label+}` placeholders
fn expand_uri(template: &str, input: &Record) -> Result<String> {
    let mut path = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        path.push_str(&rest[..start]);

        let label = &rest[start + 1..start + len];
        let (field, greedy) = match label.strip_suffix('+') {
            Some(field) => (field, true),
            None => (label, false),
        };

        let value = input
            .get(field)
            .and_then(scalar_to_string)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| MapperError::MissingLabel(field.to_string()))?;

        if greedy {
            let segments: Vec<_> = value.split('/').map(urlencoding::encode).collect();
            path.push_str(&segments.join("/"));
        } else {
            path.push_str(&urlencoding::encode(&value));
        }

        rest = &rest[start + len + 1..];
    }

    path.push_str(rest);
    Ok(path)
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Integer(i) => Some(i.to_string()),
        Value::Double(d) | Value::Timestamp(d) if d.is_finite() => Some(d.to_string()),
        Value::Boolean(b) => Some(b.to_string()),
        _ => None,
    }
}
