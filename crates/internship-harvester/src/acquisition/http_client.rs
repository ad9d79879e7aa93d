//! Page fetches over an async reqwest client.
//!
//! One GET per page, fixed header set, client-wide timeout. No retries and no
//! backoff: a failed request is reported to the caller, which skips the page.

use crate::config::HarvestConfig;
use crate::error::{HarvestError, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

/// Response from an HTTP GET request.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

impl HttpResponse {
    /// Only a plain 200 counts as a usable listing page.
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Source of listing page markup.
///
/// `Err` means a transport-level failure (DNS, connect, timeout, body read).
/// Non-200 statuses are returned as `Ok` so the caller can record them.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> anyhow::Result<HttpResponse>;
}

/// reqwest-backed fetcher used by the binary.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    /// Build a client carrying the configured header set and timeout.
    pub fn new(config: &HarvestConfig) -> Result<Self> {
        let headers = header_map(&config.headers)?;

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .default_headers(headers)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpClient {
    async fn fetch(&self, url: &str) -> anyhow::Result<HttpResponse> {
        let r = self.client.get(url).send().await?;

        let status = r.status().as_u16();
        let body = r.text().await?;

        Ok(HttpResponse { status, body })
    }
}

fn header_map(headers: &[(String, String)]) -> Result<HeaderMap> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| HarvestError::Config(format!("header name `{name}`: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| HarvestError::Config(format!("header value for `{name}`: {e}")))?;
        map.insert(name, value);
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_client_creation() {
        let client = HttpClient::new(&HarvestConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_header_map_rejects_bad_name() {
        let headers = vec![("Bad Header".to_string(), "x".to_string())];
        assert!(matches!(
            header_map(&headers),
            Err(HarvestError::Config(_))
        ));
    }

    #[test]
    fn test_only_200_is_ok() {
        let mut resp = HttpResponse {
            status: 200,
            body: String::new(),
        };
        assert!(resp.is_ok());
        resp.status = 204;
        assert!(!resp.is_ok());
    }
}
