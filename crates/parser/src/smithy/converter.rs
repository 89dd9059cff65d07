//! Converts a Smithy model to a schema catalog

use super::types::{
    documentation, shape_name, traits, Member, Shape, ShapeReference, SmithyModel, Traits,
};
use findings_mapper_common::{
    FieldSchema, FieldType, HttpMethod, MapperError, OperationBinding, RecordSchema, Result,
    SchemaCatalog, SchemaRegistry,
};
use std::collections::{BTreeMap, BTreeSet};

/// Deepest list/map nesting followed before falling back to String
const MAX_TYPE_DEPTH: usize = 32;

const UNIT: &str = "smithy.api#Unit";

/// Convert Smithy model to SchemaCatalog
pub fn convert_smithy_to_catalog(
    model: &SmithyModel,
    service_name: Option<&str>,
) -> Result<SchemaCatalog> {
    // Find service shape
    let (service_id, service_shape) = model.find_service().ok_or_else(|| {
        MapperError::Parse("No service shape found in Smithy model".to_string())
    })?;

    let (version, service_traits) = match service_shape {
        Shape::Service {
            version, traits, ..
        } => (version.clone(), Some(traits)),
        _ => (None, None),
    };

    let endpoint_prefix = service_traits
        .and_then(|t| t.get(traits::AWS_SERVICE))
        .and_then(|aws| aws.get("endpointPrefix"))
        .and_then(|v| v.as_str())
        .map(str::to_string);

    let service = service_name
        .map(str::to_string)
        .or_else(|| endpoint_prefix.clone())
        .unwrap_or_else(|| SmithyModel::extract_service_name(service_id));

    let records = SchemaRegistry::new(extract_records(model))?;

    let mut operations = Vec::new();
    for op_id in reachable_operations(model, service_shape) {
        if let Some(binding) = build_operation(model, &op_id)? {
            operations.push(binding);
        }
    }

    let catalog = SchemaCatalog {
        service,
        version,
        endpoint_prefix,
        default_region: None,
        records,
        operations,
    };
    catalog.validate()?;
    Ok(catalog)
}

/// One record schema per structure or union shape
fn extract_records(model: &SmithyModel) -> Vec<RecordSchema> {
    model
        .shapes
        .iter()
        .filter_map(|(shape_id, shape)| match shape {
            Shape::Structure { members, traits } | Shape::Union { members, traits } => {
                Some(build_record(model, shape_id, members, traits))
            }
            _ => None,
        })
        .collect()
}

fn build_record(
    model: &SmithyModel,
    shape_id: &str,
    members: &BTreeMap<String, Member>,
    shape_traits: &Traits,
) -> RecordSchema {
    let mut record = RecordSchema::new(shape_name(shape_id));
    record.description = documentation(shape_traits);

    for (member_name, member) in members {
        let mut field = FieldSchema::new(
            member.wire_name(member_name),
            convert_smithy_type_to_field_type(model, &member.target),
        );
        field.description = member.documentation();
        record.fields.push(field);
    }

    record
}

/// Operation ids bound to the service, directly or through its resources
fn reachable_operations(model: &SmithyModel, service_shape: &Shape) -> BTreeSet<String> {
    let mut operations = BTreeSet::new();
    let mut visited = BTreeSet::new();

    let mut pending: Vec<&ShapeReference> = match service_shape {
        Shape::Service {
            operations: ops,
            resources,
            ..
        } => {
            operations.extend(ops.iter().map(|r| r.target.clone()));
            resources.iter().collect()
        }
        _ => Vec::new(),
    };

    while let Some(resource_ref) = pending.pop() {
        if !visited.insert(resource_ref.target.as_str()) {
            continue;
        }
        if let Some(Shape::Resource {
            create,
            read,
            update,
            delete,
            list,
            put,
            operations: ops,
            collection_operations,
            resources,
            ..
        }) = model.get_shape(&resource_ref.target)
        {
            let lifecycle = [create, read, update, delete, list, put];
            operations.extend(
                lifecycle
                    .into_iter()
                    .flatten()
                    .chain(ops)
                    .chain(collection_operations)
                    .map(|r| r.target.clone()),
            );
            pending.extend(resources);
        }
    }

    operations
}

/// Build the binding of one operation; non-operation targets are skipped
fn build_operation(model: &SmithyModel, op_id: &str) -> Result<Option<OperationBinding>> {
    let Some(Shape::Operation {
        input,
        output,
        traits: op_traits,
        ..
    }) = model.get_shape(op_id)
    else {
        tracing::debug!(target_shape = %op_id, "skipping unresolved operation");
        return Ok(None);
    };

    let name = shape_name(op_id);
    let (method, uri) = extract_http(name, op_traits)?;
    let mut binding = OperationBinding::new(name, method, uri);
    binding.description = documentation(op_traits);

    if let Some(output) = structure_name(model, output.as_ref()) {
        binding = binding.with_output(output);
    }

    let input_members = match input.as_ref().and_then(|r| model.get_shape(&r.target)) {
        Some(Shape::Structure { members, .. }) => Some(members),
        _ => None,
    };
    if let Some(input) = structure_name(model, input.as_ref()) {
        binding = binding.with_input(input);
    }

    for (member_name, member) in input_members.into_iter().flatten() {
        let wire = member.wire_name(member_name);

        if let Some(param) = trait_str(&member.traits, traits::HTTP_QUERY) {
            binding = binding.with_query(param, wire);
        }
        if let Some(header) = trait_str(&member.traits, traits::HTTP_HEADER) {
            binding = binding.with_header(header, wire);
        }
        if member.traits.contains_key(traits::HTTP_LABEL) && wire != member_name.as_str() {
            // Labels name record fields, which use the wire key
            binding.uri = binding
                .uri
                .replace(&format!("{{{}}}", member_name), &format!("{{{}}}", wire))
                .replace(&format!("{{{}+}}", member_name), &format!("{{{}+}}", wire));
        }
    }

    Ok(Some(binding))
}

/// Method and URI from the `http` trait; `POST /` without one
fn extract_http(op_name: &str, op_traits: &Traits) -> Result<(HttpMethod, String)> {
    let Some(http) = op_traits.get(traits::HTTP) else {
        return Ok((HttpMethod::Post, "/".to_string()));
    };

    let method = match http.get("method").and_then(|m| m.as_str()) {
        Some(m) => HttpMethod::parse(m).ok_or_else(|| {
            MapperError::Parse(format!(
                "Operation '{}' uses unsupported HTTP method '{}'",
                op_name, m
            ))
        })?,
        None => HttpMethod::Post,
    };
    let uri = http
        .get("uri")
        .and_then(|u| u.as_str())
        .unwrap_or("/")
        .to_string();

    Ok((method, uri))
}

/// Record name of an operation input/output, if it targets a structure
fn structure_name(model: &SmithyModel, reference: Option<&ShapeReference>) -> Option<String> {
    let target = &reference?.target;
    if target == UNIT {
        return None;
    }
    match model.get_shape(target) {
        Some(Shape::Structure { .. }) => Some(shape_name(target).to_string()),
        _ => None,
    }
}

fn trait_str<'a>(member_traits: &'a Traits, name: &str) -> Option<&'a str> {
    member_traits.get(name).and_then(|v| v.as_str())
}

/// Convert Smithy type to FieldType
fn convert_smithy_type_to_field_type(model: &SmithyModel, shape_id: &str) -> FieldType {
    resolve_type(model, shape_id, 0)
}

fn resolve_type(model: &SmithyModel, shape_id: &str, depth: usize) -> FieldType {
    if depth > MAX_TYPE_DEPTH {
        return FieldType::string();
    }

    if let Some(local) = shape_id.strip_prefix("smithy.api#") {
        return prelude_type(local);
    }

    match model.get_shape(shape_id) {
        Some(
            Shape::Byte { .. }
            | Shape::Short { .. }
            | Shape::Integer { .. }
            | Shape::IntEnum { .. },
        ) => FieldType::integer(),
        Some(Shape::Long { .. } | Shape::BigInteger { .. }) => FieldType::long(),
        Some(Shape::Float { .. } | Shape::Double { .. } | Shape::BigDecimal { .. }) => {
            FieldType::double()
        }
        Some(Shape::Boolean { .. }) => FieldType::boolean(),
        Some(Shape::Timestamp { .. }) => FieldType::timestamp(),
        Some(Shape::List { member, .. } | Shape::Set { member, .. }) => {
            FieldType::list(resolve_type(model, &member.target, depth + 1))
        }
        // Non-string keys still travel as JSON object keys
        Some(Shape::Map { value, .. }) => {
            FieldType::map(resolve_type(model, &value.target, depth + 1))
        }
        Some(Shape::Structure { .. } | Shape::Union { .. }) => {
            FieldType::record(shape_name(shape_id))
        }
        _ => FieldType::string(), // Default fallback
    }
}

/// Types of the `smithy.api` prelude shapes
fn prelude_type(local: &str) -> FieldType {
    match local {
        "Byte" | "PrimitiveByte" | "Short" | "PrimitiveShort" | "Integer" | "PrimitiveInteger" => {
            FieldType::integer()
        }
        "Long" | "PrimitiveLong" | "BigInteger" => FieldType::long(),
        "Float" | "PrimitiveFloat" | "Double" | "PrimitiveDouble" | "BigDecimal" => {
            FieldType::double()
        }
        "Boolean" | "PrimitiveBoolean" => FieldType::boolean(),
        "Timestamp" => FieldType::timestamp(),
        _ => FieldType::string(),
    }
}
