pub mod endpoints;

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;

use crate::error::{GeckoError, Result};

const API_KEY_HEADER: &str = "x-cg-demo-api-key";

/// Raw body of a non-JSON resource (icons).
#[derive(Debug, Clone)]
pub struct RawResource {
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// HTTP client wrapper for the CoinGecko REST API.
#[derive(Debug, Clone)]
pub struct GeckoHttpClient {
    client: Client,
    base_url: String,
}

impl GeckoHttpClient {
    /// Build a client whose every request fails with [`GeckoError::Timeout`]
    /// after `timeout`.
    pub fn new(base_url: &str, timeout: Duration, api_key: Option<&str>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(key) = api_key {
            let value = HeaderValue::from_str(key)
                .map_err(|e| GeckoError::Config(format!("invalid api key: {e}")))?;
            headers.insert(API_KEY_HEADER, value);
        }

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| GeckoError::Config(format!("failed to build http client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL with `segments` appended. Each segment is percent-encoded, so
    /// an asset id can never add path components or a query string.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| GeckoError::Config(format!("invalid base url {}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| GeckoError::Config(format!("base url cannot take a path: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GET a JSON resource at `segments` below the base URL.
    ///
    /// The body is read in full before decoding so that a malformed payload
    /// maps to [`GeckoError::Decode`] rather than a transport error.
    pub async fn get<T: DeserializeOwned>(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<T> {
        let url = self.endpoint(segments)?;
        let resp = self.client.get(url).query(query).send().await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(GeckoError::Http {
                status,
                message: body,
            });
        }

        let body = resp.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// GET an absolute URL and return the raw body.
    pub async fn get_raw(&self, url: &str) -> Result<RawResource> {
        let resp = self.client.get(url).send().await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(GeckoError::Http {
                status,
                message: body,
            });
        }

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = resp.bytes().await?.to_vec();

        Ok(RawResource {
            content_type,
            bytes,
        })
    }
}
