//! Process-wide document settings, loaded once at startup.
//!
//! Settings come from a YAML file, from `OPENAPI_*` environment variables, or
//! both (environment wins). They are passed explicitly to the assembler and
//! server; nothing in this crate reads the environment on its own.
//!
//! # File format
//!
//! ```yaml
//! version: v3
//! doc_title: Swagger Petstore
//! doc_version: 1.0.0
//! host_names: "petstore.example.com, backup.example.com"
//! force_https: true
//! api_key: s3cret
//! auth_level:
//!   document: anonymous
//!   ui: function
//! security_schemes:
//!   - { name: api_key, type: api_key, parameter_name: api_key, in: header }
//! ```
//!
//! # Environment
//!
//! | Variable                          | Field                     |
//! |-----------------------------------|---------------------------|
//! | `OPENAPI_VERSION`                 | `version` (`v2` / `v3`)   |
//! | `OPENAPI_DOC_VERSION`             | `doc_version`             |
//! | `OPENAPI_DOC_TITLE`               | `doc_title`               |
//! | `OPENAPI_DOC_DESCRIPTION`         | `doc_description`         |
//! | `OPENAPI_HOST_NAMES`              | `host_names` (comma list) |
//! | `OPENAPI_EXCLUDE_REQUESTING_HOST` | `exclude_requesting_host` |
//! | `OPENAPI_FORCE_HTTPS`             | `force_https`             |
//! | `OPENAPI_FORCE_HTTP`              | `force_http`              |
//! | `OPENAPI_HIDE_SWAGGER_UI`         | `hide_swagger_ui`         |
//! | `OPENAPI_HIDE_DOCUMENT`           | `hide_document`           |
//! | `OPENAPI_API_KEY`                 | `api_key`                 |
//! | `OPENAPI_API_KEY_HEADER`          | `api_key_header`          |
//! | `OPENAPI_API_KEY_QUERY`           | `api_key_query`           |
//! | `OPENAPI_AUTH_LEVEL_DOCUMENT`     | `auth_level.document`     |
//! | `OPENAPI_AUTH_LEVEL_UI`           | `auth_level.ui`           |
//! | `OPENAPI_BACKEND_PROXY_URL`       | `backend_proxy_url`       |
//! | `OPENAPI_ROUTE_PREFIX`            | `route_prefix`            |
//! | `OPENAPI_MIN_VISIBILITY`          | `min_visibility`          |

use std::path::Path;
use std::str::FromStr;

use restdoc_core::{SecurityScheme, Visibility};
use serde::{Deserialize, Deserializer};

use crate::assemble::Origin;
use crate::error::{Error, Result};

/// Prefix shared by all settings environment variables.
pub const ENV_PREFIX: &str = "OPENAPI_";

/// Document format generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecVersion {
    /// Swagger 2.0.
    #[default]
    V2,
    /// OpenAPI 3.0.
    V3,
}

impl SpecVersion {
    /// Version string written into the document root.
    #[must_use]
    pub const fn document_version(self) -> &'static str {
        match self {
            Self::V2 => "2.0",
            Self::V3 => "3.0.1",
        }
    }
}

impl FromStr for SpecVersion {
    type Err = &'static str;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v2" | "2" | "2.0" => Ok(Self::V2),
            "v3" | "3" | "3.0" => Ok(Self::V3),
            _ => Err("expected v2 or v3"),
        }
    }
}

/// Caller privilege tier granted by the host.
///
/// Ordered from least to most privileged.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AuthLevel {
    /// No credentials.
    #[default]
    Anonymous,
    /// Authenticated user.
    User,
    /// Function-scoped key.
    Function,
    /// Host-wide system key.
    System,
    /// Administrative key.
    Admin,
}

impl FromStr for AuthLevel {
    type Err = &'static str;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anonymous" => Ok(Self::Anonymous),
            "user" => Ok(Self::User),
            "function" => Ok(Self::Function),
            "system" => Ok(Self::System),
            "admin" => Ok(Self::Admin),
            _ => Err("expected anonymous, user, function, system or admin"),
        }
    }
}

/// Minimum caller levels for the document and the viewer page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AuthLevelSettings {
    /// Required to fetch the document.
    pub document: AuthLevel,
    /// Required to open the viewer.
    pub ui: AuthLevel,
}

/// Document metadata and serving policy.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct DocumentSettings {
    /// Format generation of the served document.
    pub version: SpecVersion,
    /// API version (`info.version`).
    pub doc_version: String,
    /// API title (`info.title`).
    pub doc_title: String,
    /// API description (`info.description`).
    pub doc_description: Option<String>,
    /// Extra host names (with optional port) listed as servers.
    #[serde(deserialize_with = "deserialize_host_names")]
    pub host_names: Vec<String>,
    /// Do not list the host the document was requested from.
    pub exclude_requesting_host: bool,
    /// Reject plaintext requests and advertise only `https` servers.
    pub force_https: bool,
    /// Advertise only `http` servers.
    pub force_http: bool,
    /// Return 404 for the viewer page.
    pub hide_swagger_ui: bool,
    /// Return 404 for the document, regardless of credentials.
    pub hide_document: bool,
    /// Key required to fetch the document or the viewer.
    pub api_key: Option<String>,
    /// Header carrying the API key.
    pub api_key_header: String,
    /// Query parameter carrying the API key.
    pub api_key_query: String,
    /// Minimum caller levels.
    pub auth_level: AuthLevelSettings,
    /// Public URL that fronts the API; replaces the requesting host.
    pub backend_proxy_url: Option<String>,
    /// Path prefix shared by all routes (`api` → `/api/pet`).
    pub route_prefix: String,
    /// Endpoints and parameters below this tier are left out of the
    /// served document.
    pub min_visibility: Visibility,
    /// Security schemes that endpoint requirements may reference.
    pub security_schemes: Vec<SecurityScheme>,
}

impl Default for DocumentSettings {
    fn default() -> Self {
        Self {
            version: SpecVersion::default(),
            doc_version: "1.0.0".to_string(),
            doc_title: "API Document".to_string(),
            doc_description: None,
            host_names: Vec::new(),
            exclude_requesting_host: false,
            force_https: false,
            force_http: false,
            hide_swagger_ui: false,
            hide_document: false,
            api_key: None,
            api_key_header: "x-api-key".to_string(),
            api_key_query: "code".to_string(),
            auth_level: AuthLevelSettings::default(),
            backend_proxy_url: None,
            route_prefix: "api".to_string(),
            min_visibility: Visibility::Internal,
            security_schemes: Vec::new(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum HostNames {
    Delimited(String),
    List(Vec<String>),
}

fn split_host_names(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(|h| h.trim_end_matches('/').to_string())
        .collect()
}

fn deserialize_host_names<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match HostNames::deserialize(deserializer)? {
        HostNames::Delimited(raw) => split_host_names(&raw),
        HostNames::List(list) => split_host_names(&list.join(",")),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(Error::InvalidSetting {
            key: key.to_string(),
            value: value.to_string(),
            reason: "expected a boolean",
        }),
    }
}

fn parse_with<T: FromStr<Err = &'static str>>(key: &str, value: &str) -> Result<T> {
    value.parse().map_err(|reason| Error::InvalidSetting {
        key: key.to_string(),
        value: value.to_string(),
        reason,
    })
}

fn parse_visibility(key: &str, value: &str) -> Result<Visibility> {
    match value.trim().to_ascii_lowercase().as_str() {
        "internal" => Ok(Visibility::Internal),
        "advanced" => Ok(Visibility::Advanced),
        "important" => Ok(Visibility::Important),
        _ => Err(Error::InvalidSetting {
            key: key.to_string(),
            value: value.to_string(),
            reason: "expected internal, advanced or important",
        }),
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl DocumentSettings {
    /// Default settings with a title and API version.
    #[must_use]
    pub fn new(title: impl Into<String>, doc_version: impl Into<String>) -> Self {
        Self {
            doc_title: title.into(),
            doc_version: doc_version.into(),
            ..Self::default()
        }
    }

    /// Load settings from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or fails
    /// [`validate`](Self::validate).
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Self = serde_yaml_ng::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Defaults overlaid with the current process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a recognized variable holds an invalid value.
    pub fn from_env() -> Result<Self> {
        Self::default().with_env(std::env::vars())
    }

    /// Overlay `OPENAPI_*` variables onto these settings.
    ///
    /// Unknown `OPENAPI_*` variables are ignored; empty values leave the
    /// field unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if a recognized variable holds an invalid value, or
    /// if the result fails [`validate`](Self::validate).
    pub fn with_env<I>(mut self, vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            let Some(name) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            if value.trim().is_empty() {
                continue;
            }
            match name {
                "VERSION" => self.version = parse_with(&key, &value)?,
                "DOC_VERSION" => self.doc_version = value.trim().to_string(),
                "DOC_TITLE" => self.doc_title = value.trim().to_string(),
                "DOC_DESCRIPTION" => self.doc_description = non_empty(&value),
                "HOST_NAMES" => self.host_names = split_host_names(&value),
                "EXCLUDE_REQUESTING_HOST" => {
                    self.exclude_requesting_host = parse_bool(&key, &value)?;
                }
                "FORCE_HTTPS" => self.force_https = parse_bool(&key, &value)?,
                "FORCE_HTTP" => self.force_http = parse_bool(&key, &value)?,
                "HIDE_SWAGGER_UI" => self.hide_swagger_ui = parse_bool(&key, &value)?,
                "HIDE_DOCUMENT" => self.hide_document = parse_bool(&key, &value)?,
                "API_KEY" => self.api_key = non_empty(&value),
                "API_KEY_HEADER" => self.api_key_header = value.trim().to_ascii_lowercase(),
                "API_KEY_QUERY" => self.api_key_query = value.trim().to_string(),
                "AUTH_LEVEL_DOCUMENT" => self.auth_level.document = parse_with(&key, &value)?,
                "AUTH_LEVEL_UI" => self.auth_level.ui = parse_with(&key, &value)?,
                "BACKEND_PROXY_URL" => self.backend_proxy_url = non_empty(&value),
                "ROUTE_PREFIX" => self.route_prefix = value.trim().to_string(),
                "MIN_VISIBILITY" => self.min_visibility = parse_visibility(&key, &value)?,
                _ => tracing::debug!(variable = %key, "ignoring unknown settings variable"),
            }
        }
        self.validate()?;
        Ok(self)
    }

    /// Check cross-field consistency.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSetting`] when `force_https` and `force_http`
    /// are both set, when the proxy URL is not absolute, or when two security
    /// schemes share a name.
    pub fn validate(&self) -> Result<()> {
        if self.force_https && self.force_http {
            return Err(Error::InvalidSetting {
                key: "force_http".to_string(),
                value: "true".to_string(),
                reason: "conflicts with force_https",
            });
        }
        if let Some(url) = &self.backend_proxy_url {
            if Origin::parse(url).is_none() {
                return Err(Error::InvalidSetting {
                    key: "backend_proxy_url".to_string(),
                    value: url.clone(),
                    reason: "expected an absolute URL such as https://host/path",
                });
            }
        }
        for (i, scheme) in self.security_schemes.iter().enumerate() {
            if self.security_schemes[..i]
                .iter()
                .any(|s| s.name == scheme.name)
            {
                return Err(Error::InvalidSetting {
                    key: "security_schemes".to_string(),
                    value: scheme.name.clone(),
                    reason: "duplicate security scheme name",
                });
            }
        }
        Ok(())
    }

    /// Look up a security scheme by name.
    #[must_use]
    pub fn security_scheme(&self, name: &str) -> Option<&SecurityScheme> {
        self.security_schemes.iter().find(|s| s.name == name)
    }

    /// Whether documents differ by the host they were requested from.
    ///
    /// False when the requesting host is excluded or replaced by the proxy
    /// URL, in which case one snapshot serves every caller.
    #[must_use]
    pub fn uses_requesting_host(&self) -> bool {
        !self.exclude_requesting_host && self.backend_proxy_url.is_none()
    }

    /// URL scheme to advertise for a request that arrived over `requested`.
    #[must_use]
    pub fn advertised_scheme<'a>(&self, requested: &'a str) -> &'a str {
        if self.force_https {
            "https"
        } else if self.force_http {
            "http"
        } else {
            requested
        }
    }

    /// `/prefix` form of [`route_prefix`](Self::route_prefix), or empty.
    #[must_use]
    pub fn base_path(&self) -> String {
        let trimmed = self.route_prefix.trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{trimmed}")
        }
    }
}
