//! Document assembly: registry + component table + settings → document.
//!
//! [`assemble`] validates every endpoint, synthesizes all descriptors, and
//! renders two views of the result for the configured version:
//!
//! - the **served** view, without endpoints and parameters below
//!   [`DocumentSettings::min_visibility`] and without component schemas that
//!   no remaining operation can reach
//! - the **internal** view, with everything
//!
//! JSON and YAML renderings of the served view are produced once, so every
//! caller of the same snapshot receives identical bytes.

mod helpers;
mod prune;
mod resolve;
mod servers;
mod v2;
mod v3;

use std::fmt;
use std::str::FromStr;

use serde_json::{json, Map, Value};

use crate::error::Result;
use crate::registry::Endpoints;
use crate::schema::{ComponentTable, TypeCatalog};
use crate::settings::{DocumentSettings, SpecVersion};

pub use servers::Origin;

/// Inputs shared by both version renderers.
pub(crate) struct RenderContext<'a> {
    pub settings: &'a DocumentSettings,
    pub servers: &'a [Origin],
    pub components: &'a ComponentTable,
}

/// Serialization format of a rendered document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    /// `application/json`.
    #[default]
    Json,
    /// `application/yaml`.
    Yaml,
}

impl DocumentFormat {
    /// `Content-Type` header value.
    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Yaml => "application/yaml",
        }
    }

    /// File extension without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
        }
    }
}

impl FromStr for DocumentFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            other => Err(format!("unknown document format '{other}', expected json or yaml")),
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Immutable snapshot of an assembled document.
#[derive(Debug, Clone)]
pub struct AssembledDocument {
    version: SpecVersion,
    served: Value,
    internal: Value,
    json: Vec<u8>,
    yaml: String,
}

impl AssembledDocument {
    /// Format generation of the document.
    #[must_use]
    pub fn version(&self) -> SpecVersion {
        self.version
    }

    /// Filtered view handed to callers.
    #[must_use]
    pub fn served(&self) -> &Value {
        &self.served
    }

    /// Unfiltered view, including every endpoint, parameter and component.
    #[must_use]
    pub fn internal(&self) -> &Value {
        &self.internal
    }

    /// Pretty-printed JSON of the served view.
    #[must_use]
    pub fn json(&self) -> &[u8] {
        &self.json
    }

    /// YAML of the served view.
    #[must_use]
    pub fn yaml(&self) -> &str {
        &self.yaml
    }

    /// Copy of this document advertising the servers for a request from
    /// `requesting`, without assembling again.
    ///
    /// `settings` must be the settings this document was assembled with.
    ///
    /// # Errors
    ///
    /// Returns serialization failures.
    pub fn for_requesting(
        &self,
        settings: &DocumentSettings,
        requesting: &Origin,
    ) -> Result<Self> {
        let servers = servers::advertised_servers(settings, Some(requesting));
        let fields = match self.version {
            SpecVersion::V2 => v2::server_fields(settings, &servers),
            SpecVersion::V3 => v3::server_fields(settings, &servers),
        };
        Self::from_views(
            self.version,
            splice_server_fields(&self.served, &fields),
            splice_server_fields(&self.internal, &fields),
        )
    }

    fn from_views(version: SpecVersion, served: Value, internal: Value) -> Result<Self> {
        let json = serde_json::to_vec_pretty(&served)?;
        let yaml = serde_yaml_ng::to_string(&served)?;
        Ok(Self {
            version,
            served,
            internal,
            json,
            yaml,
        })
    }

    /// Served view in `format`.
    #[must_use]
    pub fn render(&self, format: DocumentFormat) -> &[u8] {
        match format {
            DocumentFormat::Json => &self.json,
            DocumentFormat::Yaml => self.yaml.as_bytes(),
        }
    }
}

/// Validate endpoints against settings and synthesize every descriptor,
/// without rendering.
///
/// Call at startup so that registration defects stop the process before
/// anything is served.
///
/// # Errors
///
/// Returns the first registration error found: duplicate or mismatched
/// parameters, unknown security schemes, unsupported or conflicting shapes.
pub fn validate(
    settings: &DocumentSettings,
    endpoints: &Endpoints,
    catalog: &TypeCatalog,
) -> Result<()> {
    settings.validate()?;
    resolve::resolve(settings, endpoints, catalog).map(|_| ())
}

/// Assemble the document for a request from `requesting`.
///
/// `requesting` is the base URL the document was fetched from; pass `None`
/// when there is no request (rendering offline) or when the settings do
/// not list the requesting host.
///
/// # Errors
///
/// Returns the same errors as [`validate`], plus serialization failures.
pub fn assemble(
    settings: &DocumentSettings,
    endpoints: &Endpoints,
    catalog: &TypeCatalog,
    requesting: Option<&Origin>,
) -> Result<AssembledDocument> {
    let (operations, components) = resolve::resolve(settings, endpoints, catalog)?;
    let servers = servers::advertised_servers(settings, requesting);
    let ctx = RenderContext {
        settings,
        servers: &servers,
        components: &components,
    };

    let min = settings.min_visibility;
    let all: Vec<&resolve::Operation<'_>> = operations.iter().collect();
    let filtered: Vec<resolve::Operation<'_>> = operations
        .iter()
        .filter(|op| op.is_served(min))
        .map(|op| op.filtered(min))
        .collect();
    let served_ops: Vec<&resolve::Operation<'_>> = filtered.iter().collect();

    let (internal, mut served) = match settings.version {
        SpecVersion::V2 => (v2::render(&ctx, &all), v2::render(&ctx, &served_ops)),
        SpecVersion::V3 => (v3::render(&ctx, &all), v3::render(&ctx, &served_ops)),
    };
    let pruned = match settings.version {
        SpecVersion::V2 => prune::prune_unreachable(&mut served, "/definitions", v2::REF_PREFIX),
        SpecVersion::V3 => {
            prune::prune_unreachable(&mut served, "/components/schemas", v3::REF_PREFIX)
        }
    };

    let document = AssembledDocument::from_views(settings.version, served, internal)?;

    tracing::info!(
        version = settings.version.document_version(),
        operations = operations.len(),
        served = filtered.len(),
        components = components.len(),
        pruned,
        "document assembled"
    );

    Ok(document)
}

/// Root keys that depend on the advertised servers.
const SERVER_KEYS: [&str; 4] = ["host", "basePath", "schemes", "servers"];

/// `doc` with its server keys replaced by `fields`, placed right after
/// `info` as the renderers place them.
fn splice_server_fields(doc: &Value, fields: &Map<String, Value>) -> Value {
    let Value::Object(root) = doc else {
        return doc.clone();
    };
    let mut spliced = Map::new();
    for (key, value) in root {
        if SERVER_KEYS.contains(&key.as_str()) {
            continue;
        }
        spliced.insert(key.clone(), value.clone());
        if key == "info" {
            spliced.extend(fields.clone());
        }
    }
    Value::Object(spliced)
}

/// `info` object.
fn info(settings: &DocumentSettings) -> Value {
    let mut info = Map::new();
    info.insert("title".into(), json!(settings.doc_title));
    if let Some(description) = &settings.doc_description {
        info.insert("description".into(), json!(description));
    }
    info.insert("version".into(), json!(settings.doc_version));
    Value::Object(info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::EndpointRegistry;
    use pretty_assertions::assert_eq;
    use restdoc_core::{
        ApiKeyLocation, EndpointDeclaration, EnumDef, HttpMethod, ParameterDeclaration,
        ResponseDeclaration, SecurityRequirement, SecurityScheme, StructDef, Visibility,
    };

    fn catalog() -> TypeCatalog {
        let mut catalog = TypeCatalog::new();
        catalog
            .define(
                StructDef::new("Pet")
                    .required_field("id", "int64")
                    .required_field("name", "string")
                    .field("status", "PetStatus"),
            )
            .unwrap();
        catalog
            .define(EnumDef::new("PetStatus", ["Available", "Pending", "Sold"]))
            .unwrap();
        catalog
            .define(StructDef::new("Order").field("petId", "int64"))
            .unwrap();
        catalog
    }

    fn endpoints() -> Endpoints {
        let mut registry = EndpointRegistry::new();
        registry
            .register(
                EndpointDeclaration::builder("getPetById", HttpMethod::Get, "pet/{petId}")
                    .tag("pet")
                    .summary("Finds pet by ID")
                    .parameter(ParameterDeclaration::path("petId", "int64"))
                    .response(ResponseDeclaration::with_body(200, "application/json", "Pet"))
                    .response(ResponseDeclaration::without_body(404))
                    .build(),
            )
            .unwrap();
        registry
            .register(
                EndpointDeclaration::builder("placeOrder", HttpMethod::Post, "store/order")
                    .tag("store")
                    .visibility(Visibility::Internal)
                    .response(ResponseDeclaration::with_body(200, "application/json", "Order"))
                    .build(),
            )
            .unwrap();
        registry.freeze()
    }

    #[test]
    fn v2_root_fields() {
        let settings = DocumentSettings::new("Swagger Petstore", "1.0.0");
        let doc = assemble(&settings, &endpoints(), &catalog(), None).unwrap();
        let served = doc.served();
        assert_eq!(served["swagger"], "2.0");
        assert_eq!(served["info"]["title"], "Swagger Petstore");
        assert_eq!(served["basePath"], "/api");
        assert!(served.get("host").is_none());
        assert!(served.get("openapi").is_none());
        assert_eq!(
            served["paths"]["/pet/{petId}"]["get"]["responses"]["200"]["schema"]["$ref"],
            "#/definitions/Pet"
        );
        assert_eq!(
            served["paths"]["/pet/{petId}"]["get"]["responses"]["404"]["description"],
            "Not Found"
        );
        assert_eq!(served["definitions"]["PetStatus"]["enum"], json!(["Available", "Pending", "Sold"]));
    }

    #[test]
    fn v3_root_fields() {
        let mut settings = DocumentSettings::new("Swagger Petstore", "1.0.0");
        settings.version = SpecVersion::V3;
        let requesting = Origin::new("http", "localhost:7071");
        let doc = assemble(&settings, &endpoints(), &catalog(), Some(&requesting)).unwrap();
        let served = doc.served();
        assert_eq!(served["openapi"], "3.0.1");
        assert!(served.get("swagger").is_none());
        assert_eq!(served["servers"], json!([{ "url": "http://localhost:7071/api" }]));
        assert_eq!(
            served["paths"]["/pet/{petId}"]["get"]["responses"]["200"]["content"]
                ["application/json"]["schema"]["$ref"],
            "#/components/schemas/Pet"
        );
        assert_eq!(served["paths"]["/pet/{petId}"]["get"]["x-visibility"], "important");
    }

    #[test]
    fn served_view_filters_and_prunes_internal_view_keeps_all() {
        let mut settings = DocumentSettings::default();
        settings.min_visibility = Visibility::Important;
        let doc = assemble(&settings, &endpoints(), &catalog(), None).unwrap();

        assert!(doc.served()["paths"].get("/store/order").is_none());
        assert!(doc.served()["definitions"].get("Order").is_none());
        assert!(doc.served()["definitions"].get("Pet").is_some());

        assert!(doc.internal()["paths"].get("/store/order").is_some());
        assert!(doc.internal()["definitions"].get("Order").is_some());
    }

    #[test]
    fn v2_security_lists_only_defined_schemes() {
        let mut settings = DocumentSettings::default();
        settings.security_schemes = vec![
            SecurityScheme::open_id_connect("oidc", "https://id.example.com/.well-known"),
            SecurityScheme::api_key("api_key", "api_key", ApiKeyLocation::Header),
        ];
        let mut registry = EndpointRegistry::new();
        registry
            .register(
                EndpointDeclaration::builder("getInventory", HttpMethod::Get, "store/inventory")
                    .security(SecurityRequirement::new("oidc"))
                    .security(SecurityRequirement::new("api_key"))
                    .build(),
            )
            .unwrap();
        registry
            .register(
                EndpointDeclaration::builder("getOrder", HttpMethod::Get, "store/order")
                    .security(SecurityRequirement::new("oidc"))
                    .build(),
            )
            .unwrap();
        let doc = assemble(&settings, &registry.freeze(), &TypeCatalog::new(), None).unwrap();
        let served = doc.served();

        assert!(served["securityDefinitions"].get("oidc").is_none());
        assert_eq!(
            served["paths"]["/store/inventory"]["get"]["security"],
            json!([{ "api_key": [] }])
        );
        assert!(served["paths"]["/store/order"]["get"].get("security").is_none());

        settings.version = SpecVersion::V3;
        let doc = assemble(&settings, &registry_with_oidc(), &TypeCatalog::new(), None).unwrap();
        assert_eq!(
            doc.served()["paths"]["/store/order"]["get"]["security"],
            json!([{ "oidc": [] }])
        );
    }

    fn registry_with_oidc() -> Endpoints {
        let mut registry = EndpointRegistry::new();
        registry
            .register(
                EndpointDeclaration::builder("getOrder", HttpMethod::Get, "store/order")
                    .security(SecurityRequirement::new("oidc"))
                    .build(),
            )
            .unwrap();
        registry.freeze()
    }

    #[test]
    fn requesting_host_is_spliced_without_reassembly() {
        let settings = DocumentSettings {
            host_names: vec!["petstore.example.com".into()],
            ..DocumentSettings::default()
        };
        let template = assemble(&settings, &endpoints(), &catalog(), None).unwrap();
        let requesting = Origin::new("http", "localhost:7071");
        let spliced = template.for_requesting(&settings, &requesting).unwrap();
        let direct = assemble(&settings, &endpoints(), &catalog(), Some(&requesting)).unwrap();

        assert_eq!(spliced.served()["host"], "localhost:7071");
        assert_eq!(spliced.served()["schemes"], json!(["http"]));
        assert_eq!(spliced.json(), direct.json());
        assert_eq!(spliced.yaml(), direct.yaml());
        assert_eq!(spliced.internal(), direct.internal());
        let keys: Vec<&String> = spliced.served().as_object().unwrap().keys().collect();
        assert_eq!(&keys[..4], &["swagger", "info", "host", "basePath"]);
    }

    #[test]
    fn v3_servers_are_spliced() {
        let mut settings = DocumentSettings::default();
        settings.version = SpecVersion::V3;
        let template = assemble(&settings, &endpoints(), &catalog(), None).unwrap();
        assert_eq!(template.served()["servers"], json!([{ "url": "/api" }]));

        let spliced = template
            .for_requesting(&settings, &Origin::new("https", "api.example.com"))
            .unwrap();
        assert_eq!(
            spliced.served()["servers"],
            json!([{ "url": "https://api.example.com/api" }])
        );
    }

    #[test]
    fn renderings_are_byte_stable() {
        let settings = DocumentSettings::default();
        let first = assemble(&settings, &endpoints(), &catalog(), None).unwrap();
        let second = assemble(&settings, &endpoints(), &catalog(), None).unwrap();
        assert_eq!(first.json(), second.json());
        assert_eq!(first.yaml(), second.yaml());
        assert_eq!(first.render(DocumentFormat::Yaml), first.yaml().as_bytes());
    }

    #[test]
    fn validate_reports_registration_errors() {
        let mut registry = EndpointRegistry::new();
        registry
            .register(
                EndpointDeclaration::builder("getOwner", HttpMethod::Get, "owner")
                    .response(ResponseDeclaration::with_body(200, "application/json", "Owner"))
                    .build(),
            )
            .unwrap();
        let err = validate(&DocumentSettings::default(), &registry.freeze(), &catalog()).unwrap_err();
        assert!(matches!(err, crate::Error::UnsupportedShape { .. }));
    }

    #[test]
    fn format_parses_and_displays() {
        assert_eq!("YML".parse::<DocumentFormat>().unwrap(), DocumentFormat::Yaml);
        assert!("xml".parse::<DocumentFormat>().is_err());
        assert_eq!(DocumentFormat::Json.to_string(), "json");
        assert_eq!(DocumentFormat::Yaml.content_type(), "application/yaml");
    }
}
