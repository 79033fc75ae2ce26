//! Security scheme definitions referenced by endpoint security requirements.
//!
//! ```yaml
//! - name: api_key
//!   type: api_key
//!   parameter_name: api_key
//!   in: header
//! - name: petstore_auth
//!   type: oauth2
//!   flows:
//!     implicit:
//!       authorization_url: http://petstore.swagger.io/oauth/dialog
//!       scopes:
//!         "write:pets": modify pets in your account
//!         "read:pets": read your pets
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A named security scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityScheme {
    /// Scheme name that requirements refer to.
    pub name: String,
    /// Optional human description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Scheme kind and its parameters.
    #[serde(flatten)]
    pub kind: SecuritySchemeKind,
}

impl SecurityScheme {
    /// API key passed in a header, query parameter or cookie.
    #[must_use]
    pub fn api_key(
        name: impl Into<String>,
        parameter_name: impl Into<String>,
        location: ApiKeyLocation,
    ) -> Self {
        Self {
            name: name.into(),
            description: None,
            kind: SecuritySchemeKind::ApiKey {
                parameter_name: parameter_name.into(),
                location,
            },
        }
    }

    /// OAuth2 with the given flows.
    #[must_use]
    pub fn oauth2(name: impl Into<String>, flows: OAuthFlows) -> Self {
        Self {
            name: name.into(),
            description: None,
            kind: SecuritySchemeKind::Oauth2 { flows },
        }
    }

    /// HTTP authentication (`basic`, `bearer`, ...).
    #[must_use]
    pub fn http(name: impl Into<String>, scheme: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            kind: SecuritySchemeKind::Http {
                scheme: scheme.into(),
                bearer_format: None,
            },
        }
    }

    /// OpenID Connect discovery.
    #[must_use]
    pub fn open_id_connect(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            kind: SecuritySchemeKind::OpenIdConnect { url: url.into() },
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Security scheme kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SecuritySchemeKind {
    /// API key.
    ApiKey {
        /// Header, query or cookie name carrying the key.
        parameter_name: String,
        /// Where the key is carried.
        #[serde(rename = "in")]
        location: ApiKeyLocation,
    },
    /// OAuth2.
    Oauth2 {
        /// Supported flows.
        flows: OAuthFlows,
    },
    /// OpenID Connect.
    OpenIdConnect {
        /// Discovery document URL.
        url: String,
    },
    /// HTTP authentication.
    Http {
        /// Authorization scheme (`basic`, `bearer`).
        scheme: String,
        /// Bearer token format hint (e.g. `JWT`).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        bearer_format: Option<String>,
    },
}

/// Where an API key is carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiKeyLocation {
    /// Request header.
    Header,
    /// Query string parameter.
    Query,
    /// Cookie.
    Cookie,
}

impl ApiKeyLocation {
    /// Location keyword used in documents.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Query => "query",
            Self::Cookie => "cookie",
        }
    }
}

/// The OAuth2 flows a scheme supports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OAuthFlows {
    /// Implicit grant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implicit: Option<OAuthFlow>,
    /// Resource owner password grant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<OAuthFlow>,
    /// Client credentials grant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_credentials: Option<OAuthFlow>,
    /// Authorization code grant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_code: Option<OAuthFlow>,
}

impl OAuthFlows {
    /// Flows paired with their document keyword, in a fixed order.
    #[must_use]
    pub fn configured(&self) -> Vec<(&'static str, &OAuthFlow)> {
        [
            ("implicit", self.implicit.as_ref()),
            ("password", self.password.as_ref()),
            ("clientCredentials", self.client_credentials.as_ref()),
            ("authorizationCode", self.authorization_code.as_ref()),
        ]
        .into_iter()
        .filter_map(|(key, flow)| flow.map(|f| (key, f)))
        .collect()
    }
}

/// A single OAuth2 flow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OAuthFlow {
    /// Authorization endpoint (implicit, authorization code).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_url: Option<String>,
    /// Token endpoint (password, client credentials, authorization code).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_url: Option<String>,
    /// Refresh endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_url: Option<String>,
    /// Scope name → description. Sorted by name.
    pub scopes: BTreeMap<String, String>,
}

impl OAuthFlow {
    /// Implicit-style flow with an authorization URL.
    #[must_use]
    pub fn with_authorization_url(url: impl Into<String>) -> Self {
        Self {
            authorization_url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Add a scope.
    #[must_use]
    pub fn scope(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.scopes.insert(name.into(), description.into());
        self
    }
}
