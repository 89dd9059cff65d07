//! Response unmarshalling
//!
//! Successful responses are parsed into the operation's output record.
//! Error responses become a [`ServiceError`] classified by error code.

use crate::TypedObjectCodec;
use findings_mapper_common::{MapperError, OperationBinding, Record, Result, SchemaCatalog};
use thiserror::Error;

/// Exceptions declared by the Security Hub API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceErrorKind {
    AccessDenied,
    Internal,
    InvalidAccess,
    InvalidInput,
    LimitExceeded,
    ResourceConflict,
    ResourceNotFound,
    Unknown,
}

impl ServiceErrorKind {
    /// Classify a bare error code such as `InvalidInputException`
    pub fn from_code(code: &str) -> Self {
        match code {
            "AccessDeniedException" => ServiceErrorKind::AccessDenied,
            "InternalException" => ServiceErrorKind::Internal,
            "InvalidAccessException" => ServiceErrorKind::InvalidAccess,
            "InvalidInputException" => ServiceErrorKind::InvalidInput,
            "LimitExceededException" => ServiceErrorKind::LimitExceeded,
            "ResourceConflictException" => ServiceErrorKind::ResourceConflict,
            "ResourceNotFoundException" => ServiceErrorKind::ResourceNotFound,
            _ => ServiceErrorKind::Unknown,
        }
    }
}

/// Error reported by the service in a non-2xx response
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "{} (HTTP {status}): {}",
    .code.as_deref().unwrap_or("UnknownError"),
    .message.as_deref().unwrap_or("no message")
)]
pub struct ServiceError {
    pub kind: ServiceErrorKind,
    pub code: Option<String>,
    pub message: Option<String>,
    pub status: u16,
}

/// Turns raw responses into output records or service errors
pub struct ResponseUnmarshaller<'c> {
    catalog: &'c SchemaCatalog,
}

impl<'c> ResponseUnmarshaller<'c> {
    pub fn new(catalog: &'c SchemaCatalog) -> Self {
        Self { catalog }
    }

    /// Unmarshall the response of a named operation
    ///
    /// The outer result fails only on malformed success bodies or unknown
    /// operations; a service-side failure is the inner `Err`.
    pub fn unmarshall<H: AsRef<str>, V: AsRef<str>>(
        &self,
        operation: &str,
        status: u16,
        headers: &[(H, V)],
        body: &[u8],
    ) -> Result<std::result::Result<Record, ServiceError>> {
        let binding = self.catalog.operation(operation).ok_or_else(|| {
            MapperError::Schema(format!("Unknown operation '{}'", operation))
        })?;
        self.unmarshall_binding(binding, status, headers, body)
    }

    pub fn unmarshall_binding<H: AsRef<str>, V: AsRef<str>>(
        &self,
        binding: &OperationBinding,
        status: u16,
        headers: &[(H, V)],
        body: &[u8],
    ) -> Result<std::result::Result<Record, ServiceError>> {
        if !(200..300).contains(&status) {
            let error = parse_error(status, headers, body);
            tracing::debug!(
                operation = %binding.name,
                status,
                code = error.code.as_deref().unwrap_or("-"),
                "service returned an error"
            );
            return Ok(Err(error));
        }

        let output = match &binding.output {
            Some(output) if !is_blank(body) => {
                TypedObjectCodec::new(&self.catalog.records)
                    .parse_slice(body, output)?
                    .unwrap_or_default()
            }
            _ => Record::new(),
        };
        Ok(Ok(output))
    }
}

fn is_blank(body: &[u8]) -> bool {
    body.iter().all(u8::is_ascii_whitespace)
}

fn parse_error<H: AsRef<str>, V: AsRef<str>>(
    status: u16,
    headers: &[(H, V)],
    body: &[u8],
) -> ServiceError {
    // Error bodies are best effort; an unreadable one still yields an error
    let document: Option<serde_json::Value> = serde_json::from_slice(body).ok();
    let field = |names: &[&str]| -> Option<String> {
        let object = document.as_ref()?.as_object()?;
        names
            .iter()
            .find_map(|name| object.get(*name).and_then(|v| v.as_str()))
            .map(str::to_string)
    };

    let header_code = headers
        .iter()
        .find(|(name, _)| name.as_ref().eq_ignore_ascii_case("x-amzn-ErrorType"))
        .map(|(_, value)| value.as_ref().to_string());

    let code = header_code
        .or_else(|| field(&["__type", "code", "Code"]))
        .map(|raw| sanitize_code(&raw))
        .filter(|code| !code.is_empty());
    let message = field(&["message", "Message", "errorMessage"]);

    ServiceError {
        kind: code
            .as_deref()
            .map_or(ServiceErrorKind::Unknown, ServiceErrorKind::from_code),
        code,
        message,
        status,
    }
}

/// `aws.protocols#InvalidInputException:http://...` -> `InvalidInputException`
fn sanitize_code(raw: &str) -> String {
    let without_suffix = raw.split(':').next().unwrap_or(raw);
    without_suffix
        .rsplit('#')
        .next()
        .unwrap_or(without_suffix)
        .trim()
        .to_string()
}
