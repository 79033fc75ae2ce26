//! Server list computation: requesting host, proxy URL, configured host names.

use std::fmt;

use crate::settings::DocumentSettings;

/// Scheme, host and optional path prefix of a base URL.
///
/// Used both for the host a document was requested from and for every
/// server the document advertises.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Origin {
    /// `http` or `https` (lowercase).
    pub scheme: String,
    /// Host name with optional port.
    pub host: String,
    /// Path prefix without trailing slash (empty for none).
    pub path: String,
}

impl Origin {
    /// Origin without a path prefix.
    #[must_use]
    pub fn new(scheme: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into().to_ascii_lowercase(),
            host: host.into(),
            path: String::new(),
        }
    }

    /// Parse an absolute URL such as `https://gw.example.com/petstore`.
    ///
    /// Returns `None` when the URL has no scheme or no host.
    #[must_use]
    pub fn parse(url: &str) -> Option<Self> {
        let (scheme, rest) = url.trim().split_once("://")?;
        if scheme.is_empty() {
            return None;
        }
        let (host, path) = match rest.find('/') {
            Some(idx) => rest.split_at(idx),
            None => (rest, ""),
        };
        if host.is_empty() {
            return None;
        }
        Some(Self {
            scheme: scheme.to_ascii_lowercase(),
            host: host.to_string(),
            path: path.trim_end_matches('/').to_string(),
        })
    }

    /// Origin for a configured host name, which may or may not carry a
    /// scheme of its own.
    fn from_host_name(name: &str, default_scheme: &str) -> Self {
        Self::parse(name).unwrap_or_else(|| Self::new(default_scheme, name.trim_end_matches('/')))
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}{}", self.scheme, self.host, self.path)
    }
}

/// Servers advertised by a document built for a request from `requesting`.
///
/// Order: proxy URL (or the requesting host), then configured host names.
/// Scheme pins from settings are applied to every entry; duplicates are
/// dropped keeping the first occurrence.
pub(crate) fn advertised_servers(
    settings: &DocumentSettings,
    requesting: Option<&Origin>,
) -> Vec<Origin> {
    let primary = match settings.backend_proxy_url.as_deref() {
        Some(url) => Origin::parse(url),
        None if settings.exclude_requesting_host => None,
        None => requesting.cloned(),
    };
    let default_scheme = requesting.map_or("https", |o| o.scheme.as_str());

    let mut servers: Vec<Origin> = Vec::with_capacity(settings.host_names.len() + 1);
    let candidates = primary.into_iter().chain(
        settings
            .host_names
            .iter()
            .map(|name| Origin::from_host_name(name, default_scheme)),
    );
    for mut origin in candidates {
        origin.scheme = settings.advertised_scheme(&origin.scheme).to_string();
        if !servers.contains(&origin) {
            servers.push(origin);
        }
    }
    servers
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn urls(servers: &[Origin]) -> Vec<String> {
        servers.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn parse_splits_path() {
        let origin = Origin::parse("HTTPS://gw.example.com:8443/petstore/").unwrap();
        assert_eq!(origin.scheme, "https");
        assert_eq!(origin.host, "gw.example.com:8443");
        assert_eq!(origin.path, "/petstore");
        assert!(Origin::parse("gw.example.com").is_none());
        assert!(Origin::parse("https:///nohost").is_none());
    }

    #[test]
    fn requesting_host_comes_first() {
        let mut settings = DocumentSettings::default();
        settings.host_names = vec!["backup.example.com".into()];
        let requesting = Origin::new("http", "localhost:7071");
        let servers = advertised_servers(&settings, Some(&requesting));
        assert_eq!(
            urls(&servers),
            vec!["http://localhost:7071", "http://backup.example.com"]
        );
    }

    #[test]
    fn excluded_requesting_host_is_dropped() {
        let mut settings = DocumentSettings::default();
        settings.exclude_requesting_host = true;
        settings.host_names = vec!["https://api.example.com".into()];
        let requesting = Origin::new("http", "localhost:7071");
        let servers = advertised_servers(&settings, Some(&requesting));
        assert_eq!(urls(&servers), vec!["https://api.example.com"]);
    }

    #[test]
    fn proxy_replaces_requesting_host() {
        let mut settings = DocumentSettings::default();
        settings.backend_proxy_url = Some("https://gw.example.com/petstore".into());
        let requesting = Origin::new("http", "10.0.0.4:8080");
        let servers = advertised_servers(&settings, Some(&requesting));
        assert_eq!(urls(&servers), vec!["https://gw.example.com/petstore"]);
    }

    #[test]
    fn force_https_pins_every_scheme_and_dedups() {
        let mut settings = DocumentSettings::default();
        settings.force_https = true;
        settings.host_names = vec!["http://localhost:7071".into(), "localhost:7071".into()];
        let requesting = Origin::new("http", "localhost:7071");
        let servers = advertised_servers(&settings, Some(&requesting));
        assert_eq!(urls(&servers), vec!["https://localhost:7071"]);
    }
}
