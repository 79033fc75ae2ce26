//! Per-endpoint declarations.
//!
//! An [`EndpointDeclaration`] is the value-object replacement for attribute
//! annotations on handler functions: it is built once (via
//! [`EndpointDeclaration::builder`] or deserialized from a manifest) and is
//! read-only afterwards.

use serde::{Deserialize, Deserializer, Serialize};

use crate::shape::TypeDescriptor;

/// HTTP verbs an operation can be declared on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `PUT`
    Put,
    /// `POST`
    Post,
    /// `DELETE`
    Delete,
    /// `OPTIONS`
    Options,
    /// `HEAD`
    Head,
    /// `PATCH`
    Patch,
    /// `TRACE`
    Trace,
}

impl HttpMethod {
    /// Lowercase method key as used under a path item.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Put => "put",
            Self::Post => "post",
            Self::Delete => "delete",
            Self::Options => "options",
            Self::Head => "head",
            Self::Patch => "patch",
            Self::Trace => "trace",
        }
    }
}

/// Importance tier of an endpoint or parameter.
///
/// Ordered from least to most prominent: `Internal < Advanced < Important`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Hidden from end users.
    Internal,
    /// Shown on request.
    Advanced,
    /// Always shown.
    #[default]
    Important,
}

impl Visibility {
    /// Lowercase keyword used in the `x-visibility` extension.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Internal => "internal",
            Self::Advanced => "advanced",
            Self::Important => "important",
        }
    }
}

/// Where a parameter is carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterLocation {
    /// Route template segment.
    Path,
    /// Query string.
    Query,
    /// Request header.
    Header,
    /// Cookie.
    Cookie,
}

impl ParameterLocation {
    /// Location keyword used in documents.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Header => "header",
            Self::Cookie => "cookie",
        }
    }
}

/// A declared operation parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterDeclaration {
    name: String,
    #[serde(rename = "in")]
    location: ParameterLocation,
    #[serde(default)]
    required: bool,
    #[serde(rename = "type")]
    ty: TypeDescriptor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default)]
    explode: bool,
    #[serde(default)]
    visibility: Visibility,
}

impl ParameterDeclaration {
    fn new(name: impl Into<String>, location: ParameterLocation, ty: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            location,
            required: location == ParameterLocation::Path,
            ty,
            summary: None,
            description: None,
            explode: false,
            visibility: Visibility::default(),
        }
    }

    /// Path parameter (always required).
    #[must_use]
    pub fn path(name: impl Into<String>, ty: impl Into<TypeDescriptor>) -> Self {
        Self::new(name, ParameterLocation::Path, ty.into())
    }

    /// Optional query parameter.
    #[must_use]
    pub fn query(name: impl Into<String>, ty: impl Into<TypeDescriptor>) -> Self {
        Self::new(name, ParameterLocation::Query, ty.into())
    }

    /// Optional header parameter.
    #[must_use]
    pub fn header(name: impl Into<String>, ty: impl Into<TypeDescriptor>) -> Self {
        Self::new(name, ParameterLocation::Header, ty.into())
    }

    /// Optional cookie parameter.
    #[must_use]
    pub fn cookie(name: impl Into<String>, ty: impl Into<TypeDescriptor>) -> Self {
        Self::new(name, ParameterLocation::Cookie, ty.into())
    }

    /// Mark as required or optional. Path parameters stay required.
    #[must_use]
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Set the summary.
    #[must_use]
    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Set the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Array values are sent as repeated parameters (`?s=a&s=b`) instead of
    /// a comma-separated list.
    #[must_use]
    pub fn explode(mut self, explode: bool) -> Self {
        self.explode = explode;
        self
    }

    /// Set the visibility tier.
    #[must_use]
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameter location.
    #[must_use]
    pub fn location(&self) -> ParameterLocation {
        self.location
    }

    /// Whether the parameter must be supplied. Always `true` for path
    /// parameters.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required || self.location == ParameterLocation::Path
    }

    /// Declared type.
    #[must_use]
    pub fn ty(&self) -> &TypeDescriptor {
        &self.ty
    }

    /// Description, falling back to the summary.
    #[must_use]
    pub fn description_text(&self) -> Option<&str> {
        self.description.as_deref().or(self.summary.as_deref())
    }

    /// Whether array values explode into repeated parameters.
    #[must_use]
    pub fn is_exploded(&self) -> bool {
        self.explode
    }

    /// Visibility tier.
    #[must_use]
    pub fn visibility_tier(&self) -> Visibility {
        self.visibility
    }
}

fn default_content_type() -> String {
    "application/json".to_string()
}

/// A declared request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequestBodyDeclaration {
    #[serde(default = "default_content_type")]
    content_type: String,
    #[serde(rename = "type")]
    ty: TypeDescriptor,
    #[serde(default)]
    required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl RequestBodyDeclaration {
    /// Optional body of `ty` with the given content type.
    #[must_use]
    pub fn new(content_type: impl Into<String>, ty: impl Into<TypeDescriptor>) -> Self {
        Self {
            content_type: content_type.into(),
            ty: ty.into(),
            required: false,
            description: None,
        }
    }

    /// `application/json` body of `ty`.
    #[must_use]
    pub fn json(ty: impl Into<TypeDescriptor>) -> Self {
        Self::new(default_content_type(), ty)
    }

    /// Mark as required or optional.
    #[must_use]
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Set the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Media type.
    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Declared type.
    #[must_use]
    pub fn ty(&self) -> &TypeDescriptor {
        &self.ty
    }

    /// Whether a body must be supplied.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Description.
    #[must_use]
    pub fn description_text(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// A declared response, with or without a body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResponseDeclaration {
    status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content_type: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    ty: Option<TypeDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl ResponseDeclaration {
    /// Response carrying a body of `ty`.
    #[must_use]
    pub fn with_body(
        status: u16,
        content_type: impl Into<String>,
        ty: impl Into<TypeDescriptor>,
    ) -> Self {
        Self {
            status,
            content_type: Some(content_type.into()),
            ty: Some(ty.into()),
            summary: None,
            description: None,
        }
    }

    /// Response without a body.
    #[must_use]
    pub fn without_body(status: u16) -> Self {
        Self {
            status,
            content_type: None,
            ty: None,
            summary: None,
            description: None,
        }
    }

    /// Set the summary.
    #[must_use]
    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Set the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// HTTP status code.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Body media type and type, when the response has a body.
    #[must_use]
    pub fn body(&self) -> Option<(&str, &TypeDescriptor)> {
        let ty = self.ty.as_ref()?;
        let content_type = self.content_type.as_deref().unwrap_or("application/json");
        Some((content_type, ty))
    }

    /// Description, falling back to the summary.
    #[must_use]
    pub fn description_text(&self) -> Option<&str> {
        self.description.as_deref().or(self.summary.as_deref())
    }
}

/// A reference to a security scheme, with required scopes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SecurityRequirement {
    /// Scheme name; must exist in the settings' scheme table.
    pub scheme: String,
    /// Required scopes (OAuth2 / OpenID Connect only).
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl SecurityRequirement {
    /// Requirement without scopes.
    #[must_use]
    pub fn new(scheme: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            scopes: Vec::new(),
        }
    }

    /// Requirement with scopes.
    #[must_use]
    pub fn with_scopes<I, S>(scheme: impl Into<String>, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            scheme: scheme.into(),
            scopes: scopes.into_iter().map(Into::into).collect(),
        }
    }
}

/// Everything documented about one operation.
///
/// Fields are private: once built the declaration cannot change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EndpointDeclaration {
    operation_id: String,
    method: HttpMethod,
    route: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_tags")]
    tags: Vec<String>,
    #[serde(default)]
    visibility: Visibility,
    #[serde(default)]
    deprecated: bool,
    #[serde(default)]
    parameters: Vec<ParameterDeclaration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    request_body: Option<RequestBodyDeclaration>,
    #[serde(default)]
    responses: Vec<ResponseDeclaration>,
    #[serde(default)]
    security: Vec<SecurityRequirement>,
}

/// Tags are a set: keep first occurrence, drop repeats.
fn dedup_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        if !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

fn deserialize_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Vec::<String>::deserialize(deserializer).map(dedup_tags)
}

impl EndpointDeclaration {
    /// Start declaring an operation.
    ///
    /// # Example
    ///
    /// ```
    /// use restdoc_core::{EndpointDeclaration, HttpMethod, ParameterDeclaration, ResponseDeclaration};
    ///
    /// let decl = EndpointDeclaration::builder("getPetById", HttpMethod::Get, "pet/{petId}")
    ///     .tag("pet")
    ///     .parameter(ParameterDeclaration::path("petId", "int64"))
    ///     .response(ResponseDeclaration::with_body(200, "application/json", "Pet"))
    ///     .build();
    /// assert_eq!(decl.operation_id(), "getPetById");
    /// ```
    #[must_use]
    pub fn builder(
        operation_id: impl Into<String>,
        method: HttpMethod,
        route: impl Into<String>,
    ) -> EndpointBuilder {
        EndpointBuilder {
            decl: Self {
                operation_id: operation_id.into(),
                method,
                route: route.into(),
                summary: None,
                description: None,
                tags: Vec::new(),
                visibility: Visibility::default(),
                deprecated: false,
                parameters: Vec::new(),
                request_body: None,
                responses: Vec::new(),
                security: Vec::new(),
            },
        }
    }

    /// Unique operation id.
    #[must_use]
    pub fn operation_id(&self) -> &str {
        &self.operation_id
    }

    /// HTTP verb.
    #[must_use]
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// Route template as declared (e.g. `pet/{petId}`).
    #[must_use]
    pub fn route(&self) -> &str {
        &self.route
    }

    /// Route template with exactly one leading slash.
    #[must_use]
    pub fn path(&self) -> String {
        format!("/{}", self.route.trim_start_matches('/'))
    }

    /// Named placeholders of the route template, in order.
    #[must_use]
    pub fn route_placeholders(&self) -> Vec<&str> {
        let mut names = Vec::new();
        let mut rest = self.route.as_str();
        while let Some(start) = rest.find('{') {
            let Some(len) = rest[start..].find('}') else {
                break;
            };
            let name = &rest[start + 1..start + len];
            // `{*rest}` catch-alls name the parameter without the star.
            names.push(name.trim_start_matches('*'));
            rest = &rest[start + len + 1..];
        }
        names
    }

    /// Summary line.
    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    /// Longer description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Tags, de-duplicated, in declaration order.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Visibility tier.
    #[must_use]
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Whether the operation is deprecated.
    #[must_use]
    pub fn is_deprecated(&self) -> bool {
        self.deprecated
    }

    /// Declared parameters.
    #[must_use]
    pub fn parameters(&self) -> &[ParameterDeclaration] {
        &self.parameters
    }

    /// Declared request body.
    #[must_use]
    pub fn request_body(&self) -> Option<&RequestBodyDeclaration> {
        self.request_body.as_ref()
    }

    /// Declared responses, in declaration order.
    #[must_use]
    pub fn responses(&self) -> &[ResponseDeclaration] {
        &self.responses
    }

    /// Security requirements (alternatives).
    #[must_use]
    pub fn security(&self) -> &[SecurityRequirement] {
        &self.security
    }
}

/// Builder returned by [`EndpointDeclaration::builder`].
#[derive(Debug, Clone)]
#[must_use]
pub struct EndpointBuilder {
    decl: EndpointDeclaration,
}

impl EndpointBuilder {
    /// Set the summary line.
    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.decl.summary = Some(summary.into());
        self
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.decl.description = Some(description.into());
        self
    }

    /// Add a tag. Repeated tags are ignored.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        if !self.decl.tags.contains(&tag) {
            self.decl.tags.push(tag);
        }
        self
    }

    /// Set the visibility tier.
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.decl.visibility = visibility;
        self
    }

    /// Mark as deprecated.
    pub fn deprecated(mut self, deprecated: bool) -> Self {
        self.decl.deprecated = deprecated;
        self
    }

    /// Add a parameter.
    pub fn parameter(mut self, parameter: ParameterDeclaration) -> Self {
        self.decl.parameters.push(parameter);
        self
    }

    /// Set the request body.
    pub fn request_body(mut self, body: RequestBodyDeclaration) -> Self {
        self.decl.request_body = Some(body);
        self
    }

    /// Append a response.
    pub fn response(mut self, response: ResponseDeclaration) -> Self {
        self.decl.responses.push(response);
        self
    }

    /// Add a security requirement.
    pub fn security(mut self, requirement: SecurityRequirement) -> Self {
        self.decl.security.push(requirement);
        self
    }

    /// Finish the declaration.
    #[must_use]
    pub fn build(self) -> EndpointDeclaration {
        self.decl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn get_pet_by_id() -> EndpointDeclaration {
        EndpointDeclaration::builder("getPetById", HttpMethod::Get, "pet/{petId}")
            .tag("pet")
            .tag("pet")
            .summary("Find pet by ID")
            .parameter(ParameterDeclaration::path("petId", "int64"))
            .response(ResponseDeclaration::with_body(200, "application/json", "Pet"))
            .response(ResponseDeclaration::without_body(404).summary("Pet not found"))
            .security(SecurityRequirement::new("api_key"))
            .build()
    }

    #[test]
    fn builder_dedups_tags() {
        assert_eq!(get_pet_by_id().tags(), &["pet".to_string()]);
    }

    #[test]
    fn path_parameters_are_always_required() {
        let p = ParameterDeclaration::path("petId", "int64").required(false);
        assert!(p.is_required());
        let q = ParameterDeclaration::query("status", "string");
        assert!(!q.is_required());
    }

    #[test]
    fn path_has_single_leading_slash() {
        assert_eq!(get_pet_by_id().path(), "/pet/{petId}");
        let rooted = EndpointDeclaration::builder("x", HttpMethod::Get, "//a").build();
        assert_eq!(rooted.path(), "/a");
    }

    #[test]
    fn route_placeholders_in_order() {
        let decl =
            EndpointDeclaration::builder("x", HttpMethod::Get, "store/{storeId}/pet/{petId}")
                .build();
        assert_eq!(decl.route_placeholders(), vec!["storeId", "petId"]);
    }

    #[test]
    fn response_body_defaults_to_json() {
        let yaml = "status: 200\ntype: Pet\n";
        let resp: ResponseDeclaration = serde_yaml_ng::from_str(yaml).unwrap();
        let (content_type, ty) = resp.body().unwrap();
        assert_eq!(content_type, "application/json");
        assert_eq!(ty, &TypeDescriptor::named("Pet"));
        assert!(ResponseDeclaration::without_body(204).body().is_none());
    }

    #[test]
    fn deserialize_matches_builder() {
        let yaml = r"
operation_id: getPetById
method: get
route: pet/{petId}
summary: Find pet by ID
tags: [pet, pet]
parameters:
  - { name: petId, in: path, required: true, type: int64 }
responses:
  - { status: 200, content_type: application/json, type: Pet }
  - { status: 404, summary: Pet not found }
security:
  - scheme: api_key
";
        let parsed: EndpointDeclaration = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(parsed, get_pet_by_id());
    }

    #[test]
    fn visibility_ordering() {
        assert!(Visibility::Internal < Visibility::Advanced);
        assert!(Visibility::Advanced < Visibility::Important);
        assert_eq!(Visibility::default(), Visibility::Important);
    }
}
