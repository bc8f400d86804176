//! Base URL validation and request URL construction
//!
//! An [`Endpoint`] is the only way the rest of the crate learns where the
//! server lives, so every URL built here can assume a normalized base ending
//! in exactly one `/`.

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;

/// Map service type used by the layer and query endpoints
pub const MAP_SERVER: &str = "MapServer";

/// Error type for endpoint validation
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EndpointError {
    #[error("Invalid URL format: {0}")]
    Malformed(String),

    #[error("Unsupported URL scheme '{0}'. Only http and https are allowed")]
    UnsupportedScheme(String),

    #[error("URL must not contain a query string or fragment: {0}")]
    QueryOrFragment(String),
}

/// Validated, normalized base URL of an ArcGIS REST server
///
/// Always absolute, `http` or `https`, without query string or fragment, and
/// terminated by a single `/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Endpoint(String);

fn endpoint_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?x)
            ^(?i:https?)://
            (?:[^\s/?\#@:]+(?::[^\s/?\#@]*)?@)?     # optional user:pass
            (?:
                \d{1,3}(?:\.\d{1,3}){3}             # IPv4
                | (?i:localhost)
                | (?:[a-zA-Z0-9-]+\.)+[a-zA-Z]{2,}  # domain
            )
            (?::\d{2,5})?                           # port
            (?:/[^\s/?\#]*)*$                       # path
            ",
        )
        .expect("endpoint pattern is a valid regex")
    })
}

/// Validate a raw base URL and normalize it into an [`Endpoint`]
///
/// Trailing separators collapse to one. A trailing `services` segment is
/// dropped because every request appends it, so both
/// `https://host/arcgis/rest/` and `https://host/arcgis/rest/services` produce
/// the same endpoint.
pub fn validate_endpoint(raw: &str) -> Result<Endpoint, EndpointError> {
    let url = raw.trim();

    if url.is_empty() {
        return Err(EndpointError::Malformed("empty URL".to_string()));
    }

    if let Some((scheme, _)) = url.split_once("://") {
        let scheme = scheme.to_ascii_lowercase();
        if scheme != "http" && scheme != "https" {
            return Err(EndpointError::UnsupportedScheme(scheme));
        }
    }

    if url.contains('?') || url.contains('#') {
        return Err(EndpointError::QueryOrFragment(url.to_string()));
    }

    if !endpoint_pattern().is_match(url) {
        return Err(EndpointError::Malformed(url.to_string()));
    }

    let mut normalized = url.trim_end_matches('/');

    // Only strip `services` when it is a path segment, never the host.
    let path_start = normalized
        .find("://")
        .and_then(|i| normalized[i + 3..].find('/').map(|j| i + 3 + j));
    if let Some(start) = path_start {
        if let Some(stripped) = normalized.strip_suffix("/services") {
            if stripped.len() >= start {
                normalized = stripped.trim_end_matches('/');
            }
        }
    }

    Ok(Endpoint(format!("{normalized}/")))
}

impl Endpoint {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// URL of a folder listing; `/` (or an empty path) is the services root
    pub fn services_url(&self, folder_path: &str) -> String {
        let folder = folder_path.trim_matches('/');
        if folder.is_empty() {
            format!("{}services", self.0)
        } else {
            format!("{}services/{folder}", self.0)
        }
    }

    /// URL of one service's descriptor document, e.g. `.../services/Roads/MapServer`
    pub fn service_url(&self, service: &str, service_type: &str) -> String {
        format!(
            "{}services/{}/{service_type}",
            self.0,
            service.trim_matches('/')
        )
    }

    /// URL of the query operation of one map layer
    pub fn layer_query_url(&self, service: &str, layer_id: u32) -> String {
        format!("{}/{layer_id}/query", self.service_url(service, MAP_SERVER))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
