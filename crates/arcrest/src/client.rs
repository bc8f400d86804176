//! HTTP transport for ArcGIS REST requests
//!
//! Everything that talks to the network goes through [`JsonFetcher`], so the
//! drivers in this crate can be exercised against canned responses.

use crate::prelude::*;
use arcrest_core::endpoint::{validate_endpoint, Endpoint};
use arcrest_core::error::{remote_error, FetchError};
use serde_json::Value;
use std::time::Duration;

/// Query string of a request: `(name, value)` pairs
pub type QueryParams<'a> = [(&'a str, String)];

/// The fetch-JSON capability
///
/// Implementations issue a single GET request and return the decoded body.
/// Non-2xx responses and ArcGIS error envelopes are reported as
/// [`FetchError::Status`]. No retries.
#[allow(async_fn_in_trait)]
pub trait JsonFetcher {
    async fn fetch(&self, url: &str, query: &QueryParams<'_>) -> Result<Value, FetchError>;
}

/// [`JsonFetcher`] backed by `reqwest`
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a fetcher whose requests each time out after `timeout`
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("arcrest/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| eyre!("Failed to build HTTP client: {}", e))?;

        Ok(Self { client })
    }
}

impl JsonFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, query: &QueryParams<'_>) -> Result<Value, FetchError> {
        log::debug!("GET {} {:?}", url, query);

        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            log::debug!("GET {} returned {}", url, status);
            return Err(FetchError::status(status.as_u16()));
        }

        let value: Value = response.json().await.map_err(|e| {
            if e.is_decode() {
                FetchError::Decode(e.to_string())
            } else {
                FetchError::Transport(e.to_string())
            }
        })?;

        match remote_error(&value) {
            Some(err) => Err(err),
            None => Ok(value),
        }
    }
}

/// Connection settings resolved from the global CLI options
#[derive(Debug, Clone)]
pub struct ArcgisConfig {
    pub endpoint: Endpoint,
    pub timeout: Duration,
}

impl ArcgisConfig {
    /// Validate `--url`/`ARCGIS_URL` and resolve the request timeout
    pub fn from_global(global: &crate::Global) -> Result<Self, Error> {
        let raw = global.url.as_deref().ok_or_else(|| {
            Error::Config("server URL not set. Pass --url or set ARCGIS_URL".to_string())
        })?;

        Ok(Self {
            endpoint: validate_endpoint(raw)?,
            timeout: Duration::from_secs(global.timeout),
        })
    }

    pub fn fetcher(&self) -> Result<HttpFetcher> {
        HttpFetcher::new(self.timeout)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn global(url: Option<&str>) -> crate::Global {
        crate::Global {
            url: url.map(str::to_string),
            timeout: 5,
            verbose: false,
        }
    }

    #[test]
    fn test_config_from_global() {
        let config =
            ArcgisConfig::from_global(&global(Some("https://example.com/arcgis/rest/services")))
                .unwrap();

        assert_eq!(config.endpoint.as_str(), "https://example.com/arcgis/rest/");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_config_requires_url() {
        let err = ArcgisConfig::from_global(&global(None)).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert_eq!(err.kind(), None);
    }

    #[test]
    fn test_config_rejects_decorated_url() {
        let err =
            ArcgisConfig::from_global(&global(Some("https://example.com/arcgis?f=json"))).unwrap_err();
        assert_eq!(
            err.kind(),
            Some(arcrest_core::error::FailureKind::EndpointInvalid)
        );
    }

    #[test]
    fn test_http_fetcher_builds() {
        assert!(HttpFetcher::new(Duration::from_secs(1)).is_ok());
    }
}
