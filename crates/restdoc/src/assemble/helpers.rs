//! Shared JSON construction helpers used by both document versions.

use std::collections::HashSet;

use restdoc_core::{DataShape, ResponseDeclaration, SecurityRequirement};
use serde_json::{json, Map, Value};

use super::resolve::Operation;
use crate::schema::ComponentTable;

/// Schema object for `shape`, with named shapes as `$ref`s under `ref_prefix`.
pub(crate) fn schema_value(shape: &DataShape, ref_prefix: &str) -> Value {
    match shape {
        DataShape::Primitive(kind) => {
            let (ty, format) = kind.schema_type();
            let mut schema = Map::new();
            schema.insert("type".into(), json!(ty));
            if let Some(format) = format {
                schema.insert("format".into(), json!(format));
            }
            Value::Object(schema)
        }
        DataShape::Array(element) => json!({
            "type": "array",
            "items": schema_value(element, ref_prefix),
        }),
        DataShape::Object(fields) => {
            let mut properties = Map::new();
            let mut required = Vec::new();
            for field in fields {
                let mut property = schema_value(&field.shape, ref_prefix);
                // `$ref` siblings are ignored by 2.0 and 3.0 readers.
                if let (Some(description), None) = (&field.description, field.shape.reference())
                {
                    if let Some(obj) = property.as_object_mut() {
                        obj.insert("description".into(), json!(description));
                    }
                }
                properties.insert(field.name.clone(), property);
                if field.required {
                    required.push(json!(field.name));
                }
            }
            let mut schema = Map::new();
            schema.insert("type".into(), json!("object"));
            if !required.is_empty() {
                schema.insert("required".into(), Value::Array(required));
            }
            schema.insert("properties".into(), Value::Object(properties));
            Value::Object(schema)
        }
        DataShape::EnumRef { name, .. } | DataShape::ObjectRef(name) => {
            json!({ "$ref": format!("{ref_prefix}{name}") })
        }
    }
}

/// Component section body: one schema per table entry, ordered by name.
pub(crate) fn component_schemas(components: &ComponentTable, ref_prefix: &str) -> Map<String, Value> {
    components
        .iter()
        .map(|(name, shape)| {
            let mut schema = match shape {
                DataShape::EnumRef { values, .. } => json!({ "type": "string", "enum": values }),
                other => schema_value(other, ref_prefix),
            };
            if let (Some(description), Some(obj)) =
                (components.description(name), schema.as_object_mut())
            {
                obj.insert("description".into(), json!(description));
            }
            (name.to_string(), schema)
        })
        .collect()
}

/// Response description, falling back to the status code's reason phrase.
pub(crate) fn response_description(response: &ResponseDeclaration) -> String {
    if let Some(text) = response.description_text() {
        return text.to_string();
    }
    http::StatusCode::from_u16(response.status())
        .ok()
        .and_then(|code| code.canonical_reason())
        .unwrap_or("Response")
        .to_string()
}

/// Operation-level `security` array.
pub(crate) fn security_requirements(requirements: &[SecurityRequirement]) -> Value {
    Value::Array(
        requirements
            .iter()
            .map(|req| {
                let mut entry = Map::new();
                entry.insert(req.scheme.clone(), json!(req.scopes));
                Value::Object(entry)
            })
            .collect(),
    )
}

/// Tags in first-appearance order.
pub(crate) fn tag_order(operations: &[&Operation<'_>]) -> Vec<String> {
    let mut seen = HashSet::new();
    operations
        .iter()
        .flat_map(|op| op.decl.tags())
        .filter(|tag| seen.insert(tag.as_str()))
        .cloned()
        .collect()
}

/// Operations grouped by their first tag, groups in `tags` order, then
/// registration order within a group. Untagged operations come last.
pub(crate) fn group_by_tag<'o, 'a>(
    operations: &[&'o Operation<'a>],
    tags: &[String],
) -> Vec<&'o Operation<'a>> {
    let mut ordered = operations.to_vec();
    ordered.sort_by_key(|op| {
        op.decl
            .tags()
            .first()
            .and_then(|first| tags.iter().position(|t| t == first))
            .unwrap_or(usize::MAX)
    });
    ordered
}

/// Top-level `tags` array.
pub(crate) fn tags_value(tags: &[String]) -> Value {
    Value::Array(tags.iter().map(|name| json!({ "name": name })).collect())
}

/// Insert `operation` under `paths[path][method]`, creating the path item
/// on first use.
pub(crate) fn insert_operation(
    paths: &mut Map<String, Value>,
    path: String,
    method: &str,
    operation: Map<String, Value>,
) {
    let item = paths.entry(path).or_insert_with(|| json!({}));
    if let Some(obj) = item.as_object_mut() {
        obj.insert(method.to_string(), Value::Object(operation));
    }
}

/// Fields shared by every operation regardless of document version, in
/// the order readers expect them.
pub(crate) fn operation_head(op: &Operation<'_>) -> Map<String, Value> {
    let decl = op.decl;
    let mut operation = Map::new();
    if !decl.tags().is_empty() {
        operation.insert("tags".into(), json!(decl.tags()));
    }
    if let Some(summary) = decl.summary() {
        operation.insert("summary".into(), json!(summary));
    }
    if let Some(description) = decl.description() {
        operation.insert("description".into(), json!(description));
    }
    operation.insert("operationId".into(), json!(decl.operation_id()));
    operation
}

/// Fields appended after `responses`. Requirements rejected by `renderable`
/// are left out of `security`.
pub(crate) fn operation_tail(
    op: &Operation<'_>,
    operation: &mut Map<String, Value>,
    renderable: impl Fn(&SecurityRequirement) -> bool,
) {
    let decl = op.decl;
    if decl.is_deprecated() {
        operation.insert("deprecated".into(), json!(true));
    }
    let security: Vec<SecurityRequirement> = decl
        .security()
        .iter()
        .filter(|req| renderable(req))
        .cloned()
        .collect();
    if !security.is_empty() {
        operation.insert("security".into(), security_requirements(&security));
    }
    operation.insert("x-visibility".into(), json!(decl.visibility().as_str()));
}
