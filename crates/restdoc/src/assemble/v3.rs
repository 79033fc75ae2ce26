//! OpenAPI 3.0 rendering.

use restdoc_core::{
    DataShape, ParameterDeclaration, ParameterLocation, SecurityScheme, SecuritySchemeKind,
};
use serde_json::{json, Map, Value};

use super::helpers::{
    component_schemas, group_by_tag, insert_operation, operation_head, operation_tail,
    response_description, schema_value, tag_order, tags_value,
};
use super::resolve::Operation;
use super::{Origin, RenderContext};
use crate::settings::DocumentSettings;

/// `$ref` prefix for 3.0 component schemas.
pub(crate) const REF_PREFIX: &str = "#/components/schemas/";

/// Render a 3.0 document for `operations`.
pub(crate) fn render(ctx: &RenderContext<'_>, operations: &[&Operation<'_>]) -> Value {
    let settings = ctx.settings;
    let tags = tag_order(operations);

    let mut doc = Map::new();
    doc.insert("openapi".into(), json!("3.0.1"));
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
            operation(op),
        );
    }
    doc.insert("paths".into(), Value::Object(paths));

    let mut components = Map::new();
    let schemas = component_schemas(ctx.components, REF_PREFIX);
    if !schemas.is_empty() {
        components.insert("schemas".into(), Value::Object(schemas));
    }
    let security: Map<String, Value> = settings
        .security_schemes
        .iter()
        .map(|scheme| (scheme.name.clone(), security_scheme(scheme)))
        .collect();
    if !security.is_empty() {
        components.insert("securitySchemes".into(), Value::Object(security));
    }
    if !components.is_empty() {
        doc.insert("components".into(), Value::Object(components));
    }

    Value::Object(doc)
}

/// `servers` array; a relative base path stands in when there are none.
pub(crate) fn server_fields(settings: &DocumentSettings, servers: &[Origin]) -> Map<String, Value> {
    let base_path = settings.base_path();
    let servers: Vec<Value> = if servers.is_empty() {
        let url = if base_path.is_empty() { "/" } else { base_path.as_str() };
        vec![json!({ "url": url })]
    } else {
        servers
            .iter()
            .map(|origin| json!({ "url": format!("{origin}{base_path}") }))
            .collect()
    };
    let mut fields = Map::new();
    fields.insert("servers".into(), Value::Array(servers));
    fields
}

fn operation(op: &Operation<'_>) -> Map<String, Value> {
    let decl = op.decl;
    let mut operation = operation_head(op);

    let parameters: Vec<Value> = op
        .params
        .iter()
        .map(|(param, shape)| parameter(param, shape))
        .collect();
    if !parameters.is_empty() {
        operation.insert("parameters".into(), Value::Array(parameters));
    }

    if let (Some(body), Some(shape)) = (decl.request_body(), &op.body) {
        let mut entry = Map::new();
        if let Some(description) = body.description_text() {
            entry.insert("description".into(), json!(description));
        }
        entry.insert("content".into(), content(body.content_type(), shape));
        entry.insert("required".into(), json!(body.is_required()));
        operation.insert("requestBody".into(), Value::Object(entry));
    }

    let mut responses = Map::new();
    for (response, shape) in &op.responses {
        let mut entry = Map::new();
        entry.insert("description".into(), json!(response_description(response)));
        if let (Some((content_type, _)), Some(shape)) = (response.body(), shape) {
            entry.insert("content".into(), content(content_type, shape));
        }
        responses.insert(response.status().to_string(), Value::Object(entry));
    }
    if responses.is_empty() {
        responses.insert("default".into(), json!({ "description": "Response" }));
    }
    operation.insert("responses".into(), Value::Object(responses));

    operation_tail(op, &mut operation, |_| true);
    operation
}

/// `content` map with a single media type.
fn content(content_type: &str, shape: &DataShape) -> Value {
    let mut media = Map::new();
    media.insert(
        content_type.to_string(),
        json!({ "schema": schema_value(shape, REF_PREFIX) }),
    );
    Value::Object(media)
}

fn parameter(param: &ParameterDeclaration, shape: &DataShape) -> Value {
    let mut entry = Map::new();
    entry.insert("name".into(), json!(param.name()));
    entry.insert("in".into(), json!(param.location().as_str()));
    if let Some(description) = param.description_text() {
        entry.insert("description".into(), json!(description));
    }
    entry.insert("required".into(), json!(param.is_required()));
    if matches!(shape, DataShape::Array(_)) {
        let style = match param.location() {
            ParameterLocation::Query | ParameterLocation::Cookie => "form",
            ParameterLocation::Path | ParameterLocation::Header => "simple",
        };
        entry.insert("style".into(), json!(style));
        entry.insert("explode".into(), json!(param.is_exploded()));
    }
    entry.insert("schema".into(), schema_value(shape, REF_PREFIX));
    Value::Object(entry)
}

fn security_scheme(scheme: &SecurityScheme) -> Value {
    let mut entry = Map::new();
    match &scheme.kind {
        SecuritySchemeKind::ApiKey {
            parameter_name,
            location,
        } => {
            entry.insert("type".into(), json!("apiKey"));
            entry.insert("name".into(), json!(parameter_name));
            entry.insert("in".into(), json!(location.as_str()));
        }
        SecuritySchemeKind::Http {
            scheme: http,
            bearer_format,
        } => {
            entry.insert("type".into(), json!("http"));
            entry.insert("scheme".into(), json!(http));
            if let Some(format) = bearer_format {
                entry.insert("bearerFormat".into(), json!(format));
            }
        }
        SecuritySchemeKind::Oauth2 { flows } => {
            entry.insert("type".into(), json!("oauth2"));
            let flows: Map<String, Value> = flows
                .configured()
                .into_iter()
                .map(|(key, flow)| {
                    let mut map = Map::new();
                    if let Some(url) = &flow.authorization_url {
                        map.insert("authorizationUrl".into(), json!(url));
                    }
                    if let Some(url) = &flow.token_url {
                        map.insert("tokenUrl".into(), json!(url));
                    }
                    if let Some(url) = &flow.refresh_url {
                        map.insert("refreshUrl".into(), json!(url));
                    }
                    map.insert("scopes".into(), json!(flow.scopes));
                    (key.to_string(), Value::Object(map))
                })
                .collect();
            entry.insert("flows".into(), Value::Object(flows));
        }
        SecuritySchemeKind::OpenIdConnect { url } => {
            entry.insert("type".into(), json!("openIdConnect"));
            entry.insert("openIdConnectUrl".into(), json!(url));
        }
    }
    if let Some(description) = &scheme.description {
        entry.insert("description".into(), json!(description));
    }
    Value::Object(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use restdoc_core::{OAuthFlow, OAuthFlows};

    #[test]
    fn oauth2_lists_every_flow() {
        let flows = OAuthFlows {
            implicit: Some(
                OAuthFlow::with_authorization_url("https://petstore.example.com/oauth/dialog")
                    .scope("write:pets", "modify pets in your account")
                    .scope("read:pets", "read your pets"),
            ),
            ..OAuthFlows::default()
        };
        let scheme = security_scheme(&SecurityScheme::oauth2("petstore_auth", flows));
        assert_eq!(
            scheme,
            json!({
                "type": "oauth2",
                "flows": {
                    "implicit": {
                        "authorizationUrl": "https://petstore.example.com/oauth/dialog",
                        "scopes": {
                            "read:pets": "read your pets",
                            "write:pets": "modify pets in your account",
                        },
                    },
                },
            })
        );
    }

    #[test]
    fn bearer_scheme_keeps_format() {
        let scheme = SecurityScheme {
            name: "bearer_auth".into(),
            description: None,
            kind: SecuritySchemeKind::Http {
                scheme: "bearer".into(),
                bearer_format: Some("JWT".into()),
            },
        };
        assert_eq!(
            security_scheme(&scheme),
            json!({ "type": "http", "scheme": "bearer", "bearerFormat": "JWT" })
        );
    }

    #[test]
    fn array_query_parameter_has_style() {
        let param = ParameterDeclaration::query("status", "list<string>").explode(true);
        let shape = DataShape::Array(Box::new(DataShape::Primitive(
            restdoc_core::PrimitiveKind::String,
        )));
        let value = parameter(&param, &shape);
        assert_eq!(value["style"], "form");
        assert_eq!(value["explode"], true);
        assert_eq!(value["schema"]["type"], "array");
    }
}
