//! Document request: the parts of an HTTP request that serving depends on.

use axum::http::header::HOST;
use axum::http::{request::Parts, HeaderMap, HeaderName, HeaderValue};
use restdoc::{AuthLevel, DocumentSettings, Origin};

/// Header set by TLS-terminating proxies with the original request scheme.
pub const FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Host-agnostic view of a request for a document or the viewer.
///
/// Built from axum request parts by [`router`](crate::router), or by hand
/// when serving through another HTTP stack:
///
/// ```
/// use axum::http::{HeaderName, HeaderValue};
/// use restdoc::AuthLevel;
/// use restdoc_server::DocumentRequest;
///
/// let request = DocumentRequest::new("http")
///     .host("localhost:7071")
///     .header(HeaderName::from_static("x-forwarded-proto"), HeaderValue::from_static("https"))
///     .auth_level(AuthLevel::Function);
/// assert!(!request.is_plaintext());
/// ```
#[derive(Debug, Clone, Default)]
pub struct DocumentRequest {
    scheme: String,
    host: Option<String>,
    headers: HeaderMap,
    query: Option<String>,
    auth_level: AuthLevel,
}

impl DocumentRequest {
    /// Request that arrived over `scheme` (`http` or `https`).
    #[must_use]
    pub fn new(scheme: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into().to_ascii_lowercase(),
            ..Self::default()
        }
    }

    /// Capture scheme, host, headers, query and granted [`AuthLevel`] from
    /// request parts.
    ///
    /// Server-side URIs rarely carry a scheme; `http` is assumed unless the
    /// URI says otherwise or a proxy reports one through
    /// [`FORWARDED_PROTO`].
    #[must_use]
    pub fn from_parts(parts: &Parts) -> Self {
        let host = parts
            .headers
            .get(HOST)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .or_else(|| parts.uri.authority().map(ToString::to_string));

        Self {
            scheme: parts.uri.scheme_str().unwrap_or("http").to_ascii_lowercase(),
            host,
            headers: parts.headers.clone(),
            query: parts.uri.query().map(str::to_string),
            auth_level: parts
                .extensions
                .get::<AuthLevel>()
                .copied()
                .unwrap_or_default(),
        }
    }

    /// Set the `Host` the request was addressed to.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Add a request header.
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Set the raw query string (without `?`).
    #[must_use]
    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Set the privilege tier the host granted the caller.
    #[must_use]
    pub fn auth_level(mut self, level: AuthLevel) -> Self {
        self.auth_level = level;
        self
    }

    /// Privilege tier the host granted the caller.
    #[must_use]
    pub fn granted_level(&self) -> AuthLevel {
        self.auth_level
    }

    /// Scheme the client used: the first [`FORWARDED_PROTO`] entry when
    /// present, otherwise the transport scheme.
    #[must_use]
    pub fn effective_scheme(&self) -> String {
        self.header_value(FORWARDED_PROTO)
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map_or_else(|| self.scheme.clone(), str::to_ascii_lowercase)
    }

    /// Whether the client did not use TLS.
    #[must_use]
    pub fn is_plaintext(&self) -> bool {
        self.effective_scheme() != "https"
    }

    /// Base URL the request was addressed to, if the host is known.
    #[must_use]
    pub fn origin(&self) -> Option<Origin> {
        self.host
            .as_deref()
            .filter(|h| !h.is_empty())
            .map(|host| Origin::new(self.effective_scheme(), host))
    }

    /// First value of header `name`, if it is valid text.
    #[must_use]
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Raw value of query parameter `name`.
    #[must_use]
    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query.as_deref()?.split('&').find_map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (key == name).then_some(value)
        })
    }

    /// API key from the configured header, else the configured query
    /// parameter.
    pub(crate) fn presented_key(&self, settings: &DocumentSettings) -> Option<&str> {
        self.header_value(&settings.api_key_header)
            .or_else(|| self.query_value(&settings.api_key_query))
    }
}
