//! Swagger 2.0 rendering.

use restdoc_core::{
    DataShape, ParameterDeclaration, ParameterLocation, PrimitiveKind, RequestBodyDeclaration,
    SecurityRequirement, SecurityScheme, SecuritySchemeKind, ShapeField,
};
use serde_json::{json, Map, Value};

use super::helpers::{
    component_schemas, group_by_tag, insert_operation, operation_head, operation_tail,
    response_description, schema_value, tag_order, tags_value,
};
use super::resolve::Operation;
use super::{Origin, RenderContext};
use crate::schema::ComponentTable;
use crate::settings::DocumentSettings;

/// `$ref` prefix for 2.0 definitions.
pub(crate) const REF_PREFIX: &str = "#/definitions/";

/// Render a 2.0 document for `operations`.
pub(crate) fn render(ctx: &RenderContext<'_>, operations: &[&Operation<'_>]) -> Value {
    let settings = ctx.settings;
    let tags = tag_order(operations);

    let mut doc = Map::new();
    doc.insert("swagger".into(), json!("2.0"));
    doc.insert("info".into(), super::info(settings));

    doc.extend(server_fields(settings, ctx.servers));
    if !tags.is_empty() {
        doc.insert("tags".into(), tags_value(&tags));
    }

    let mut paths = Map::new();
    for op in group_by_tag(operations, &tags) {
        insert_operation(
            &mut paths,
            op.decl.path(),
            op.decl.method().as_str(),
            operation(ctx, op),
        );
    }
    doc.insert("paths".into(), Value::Object(paths));

    let definitions = component_schemas(ctx.components, REF_PREFIX);
    if !definitions.is_empty() {
        doc.insert("definitions".into(), Value::Object(definitions));
    }

    let security: Map<String, Value> = settings
        .security_schemes
        .iter()
        .filter_map(|scheme| Some((scheme.name.clone(), security_definition(scheme)?)))
        .collect();
    if !security.is_empty() {
        doc.insert("securityDefinitions".into(), Value::Object(security));
    }

    Value::Object(doc)
}

/// `host`, `basePath` and `schemes` for `servers`. The first server supplies
/// the host and path prefix; every server contributes its scheme.
pub(crate) fn server_fields(settings: &DocumentSettings, servers: &[Origin]) -> Map<String, Value> {
    let mut fields = Map::new();
    let first = servers.first();
    if let Some(origin) = first {
        fields.insert("host".into(), json!(origin.host));
    }
    let base_path = format!(
        "{}{}",
        first.map_or("", |o| o.path.as_str()),
        settings.base_path()
    );
    fields.insert(
        "basePath".into(),
        json!(if base_path.is_empty() { "/" } else { base_path.as_str() }),
    );
    let mut schemes: Vec<&str> = Vec::new();
    for origin in servers {
        if !schemes.contains(&origin.scheme.as_str()) {
            schemes.push(&origin.scheme);
        }
    }
    if !schemes.is_empty() {
        fields.insert("schemes".into(), json!(schemes));
    }
    fields
}

fn operation(ctx: &RenderContext<'_>, op: &Operation<'_>) -> Map<String, Value> {
    let decl = op.decl;
    let mut operation = operation_head(op);

    if let Some(body) = decl.request_body() {
        operation.insert("consumes".into(), json!([body.content_type()]));
    }
    let mut produces: Vec<&str> = Vec::new();
    for (response, _) in &op.responses {
        if let Some((content_type, _)) = response.body() {
            if !produces.contains(&content_type) {
                produces.push(content_type);
            }
        }
    }
    if !produces.is_empty() {
        operation.insert("produces".into(), json!(produces));
    }

    let mut parameters: Vec<Value> = op
        .params
        .iter()
        .filter_map(|(param, shape)| parameter(param, shape))
        .collect();
    if let (Some(body), Some(shape)) = (decl.request_body(), &op.body) {
        if is_form(body.content_type()) {
            parameters.extend(form_parameters(body, shape, ctx.components));
        } else {
            let mut entry = Map::new();
            entry.insert("in".into(), json!("body"));
            entry.insert("name".into(), json!("body"));
            if let Some(description) = body.description_text() {
                entry.insert("description".into(), json!(description));
            }
            entry.insert("required".into(), json!(body.is_required()));
            entry.insert("schema".into(), schema_value(shape, REF_PREFIX));
            parameters.push(Value::Object(entry));
        }
    }
    if !parameters.is_empty() {
        operation.insert("parameters".into(), Value::Array(parameters));
    }

    let mut responses = Map::new();
    for (response, shape) in &op.responses {
        let mut entry = Map::new();
        entry.insert("description".into(), json!(response_description(response)));
        if let Some(shape) = shape {
            entry.insert("schema".into(), schema_value(shape, REF_PREFIX));
        }
        responses.insert(response.status().to_string(), Value::Object(entry));
    }
    if responses.is_empty() {
        responses.insert("default".into(), json!({ "description": "Response" }));
    }
    operation.insert("responses".into(), Value::Object(responses));

    operation_tail(op, &mut operation, |req| expressible(ctx, req));
    operation
}

/// Whether `req` points at a scheme that has a 2.0 security definition.
fn expressible(ctx: &RenderContext<'_>, req: &SecurityRequirement) -> bool {
    let expressible = ctx
        .settings
        .security_scheme(&req.scheme)
        .is_some_and(|scheme| !matches!(scheme.kind, SecuritySchemeKind::OpenIdConnect { .. }));
    if !expressible {
        tracing::debug!(scheme = %req.scheme, "security requirement omitted from 2.0 document");
    }
    expressible
}

fn is_form(content_type: &str) -> bool {
    let media = content_type.split(';').next().unwrap_or_default().trim();
    media.eq_ignore_ascii_case("application/x-www-form-urlencoded")
        || media.eq_ignore_ascii_case("multipart/form-data")
}

/// Form payloads travel as one `formData` parameter per structure field.
/// A body that is not a structure becomes a single parameter named `body`.
fn form_parameters(
    body: &RequestBodyDeclaration,
    shape: &DataShape,
    components: &ComponentTable,
) -> Vec<Value> {
    let fields = match shape {
        DataShape::Object(fields) => Some(fields),
        DataShape::ObjectRef(name) => match components.get(name) {
            Some(DataShape::Object(fields)) => Some(fields),
            _ => None,
        },
        _ => None,
    };
    match fields {
        Some(fields) => fields.iter().map(form_field).collect(),
        None => {
            let field = ShapeField {
                name: "body".to_string(),
                shape: shape.clone(),
                required: body.is_required(),
                description: body.description_text().map(str::to_string),
            };
            vec![form_field(&field)]
        }
    }
}

fn form_field(field: &ShapeField) -> Value {
    let mut entry = Map::new();
    entry.insert("name".into(), json!(field.name));
    entry.insert("in".into(), json!("formData"));
    if let Some(description) = &field.description {
        entry.insert("description".into(), json!(description));
    }
    entry.insert("required".into(), json!(field.required));
    if field.shape == DataShape::Primitive(PrimitiveKind::Binary) {
        entry.insert("type".into(), json!("file"));
    } else {
        entry.extend(inline_type(&field.shape));
        if matches!(field.shape, DataShape::Array(_)) {
            entry.insert("collectionFormat".into(), json!("multi"));
        }
    }
    Value::Object(entry)
}

/// Non-body parameter. 2.0 has no cookie parameters; those are left out.
fn parameter(param: &ParameterDeclaration, shape: &DataShape) -> Option<Value> {
    if param.location() == ParameterLocation::Cookie {
        tracing::debug!(parameter = param.name(), "cookie parameter omitted from 2.0 document");
        return None;
    }
    let mut entry = Map::new();
    entry.insert("name".into(), json!(param.name()));
    entry.insert("in".into(), json!(param.location().as_str()));
    if let Some(description) = param.description_text() {
        entry.insert("description".into(), json!(description));
    }
    entry.insert("required".into(), json!(param.is_required()));
    entry.extend(inline_type(shape));
    if matches!(shape, DataShape::Array(_)) {
        let format = if param.is_exploded() && param.location() == ParameterLocation::Query {
            "multi"
        } else {
            "csv"
        };
        entry.insert("collectionFormat".into(), json!(format));
    }
    Some(Value::Object(entry))
}

/// 2.0 non-body parameters carry their type inline; references are
/// expanded and structures degrade to strings.
fn inline_type(shape: &DataShape) -> Map<String, Value> {
    match shape {
        DataShape::Primitive(_) => match schema_value(shape, REF_PREFIX) {
            Value::Object(map) => map,
            _ => Map::new(),
        },
        DataShape::EnumRef { values, .. } => {
            let mut map = Map::new();
            map.insert("type".into(), json!("string"));
            map.insert("enum".into(), json!(values));
            map
        }
        DataShape::Array(element) => {
            let mut map = Map::new();
            map.insert("type".into(), json!("array"));
            map.insert("items".into(), Value::Object(inline_type(element)));
            map
        }
        DataShape::Object(_) | DataShape::ObjectRef(_) => {
            let mut map = Map::new();
            map.insert("type".into(), json!("string"));
            map
        }
    }
}

fn security_definition(scheme: &SecurityScheme) -> Option<Value> {
    let mut entry = match &scheme.kind {
        SecuritySchemeKind::ApiKey {
            parameter_name,
            location,
        } => json!({ "type": "apiKey", "name": parameter_name, "in": location.as_str() }),
        SecuritySchemeKind::Http { scheme: http, .. } if http.eq_ignore_ascii_case("basic") => {
            json!({ "type": "basic" })
        }
        // Bearer and other HTTP schemes travel in the Authorization header.
        SecuritySchemeKind::Http { .. } => {
            json!({ "type": "apiKey", "name": "Authorization", "in": "header" })
        }
        SecuritySchemeKind::Oauth2 { flows } => {
            let (key, flow) = flows.configured().into_iter().next()?;
            let flow_name = match key {
                "clientCredentials" => "application",
                "authorizationCode" => "accessCode",
                other => other,
            };
            let mut map = Map::new();
            map.insert("type".into(), json!("oauth2"));
            map.insert("flow".into(), json!(flow_name));
            if let Some(url) = &flow.authorization_url {
                map.insert("authorizationUrl".into(), json!(url));
            }
            if let Some(url) = &flow.token_url {
                map.insert("tokenUrl".into(), json!(url));
            }
            map.insert("scopes".into(), json!(flow.scopes));
            Value::Object(map)
        }
        SecuritySchemeKind::OpenIdConnect { .. } => {
            tracing::debug!(scheme = %scheme.name, "OpenID Connect scheme omitted from 2.0 document");
            return None;
        }
    };
    if let (Some(description), Some(obj)) = (&scheme.description, entry.as_object_mut()) {
        obj.insert("description".into(), json!(description));
    }
    Some(entry)
}
