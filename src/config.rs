//! Client configuration shared by the async and blocking clients.

use crate::{request::RequestMetadata, Error, Result};
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue, Method};
use std::time::Duration;
use url::Url;

/// Production endpoint used when no base URL is configured.
pub const DEFAULT_BASE_URL: &str = "https://api.ultracontext.ai";

/// Per-call timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Resolved configuration for a client.
///
/// Built by [`ClientBuilder`](crate::ClientBuilder); immutable afterwards.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub(crate) base_url: Url,
    pub(crate) api_key: Option<String>,
    pub(crate) timeout: Duration,
    pub(crate) extra_headers: HeaderMap,
}

impl ClientConfig {
    pub(crate) fn new(
        base_url: Url,
        api_key: Option<String>,
        timeout: Duration,
        extra_headers: HeaderMap,
    ) -> Result<Self> {
        if base_url.cannot_be_a_base() {
            return Err(Error::ConfigurationError(format!(
                "Base URL cannot carry a path: {}",
                base_url
            )));
        }

        Ok(Self {
            base_url,
            api_key,
            timeout,
            extra_headers,
        })
    }

    /// The base URL requests are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The per-call timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Headers sent with every request.
    ///
    /// Extra headers go in first. `Content-Type: application/json` is then
    /// always set, and `Authorization: Bearer <key>` when an API key is
    /// configured, so neither can be replaced by an extra header.
    pub fn headers(&self) -> Result<HeaderMap> {
        let mut headers = self.extra_headers.clone();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(key) = self.api_key.as_deref().filter(|key| !key.is_empty()) {
            let mut value = HeaderValue::try_from(format!("Bearer {}", key)).map_err(|e| {
                Error::ConfigurationError(format!("Invalid API key header value: {}", e))
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        Ok(headers)
    }

    /// The request URL without query string, e.g. `https://host/v1/contexts/ctx_1`.
    pub fn url_for(&self, request: &RequestMetadata) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.set_query(None);
        url.set_fragment(None);
        url.path_segments_mut()
            .map_err(|_| {
                Error::ConfigurationError(format!("Base URL cannot carry a path: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(&request.segments);
        Ok(url)
    }

    /// Resolves a request against this configuration.
    ///
    /// Both clients send exactly what this returns.
    pub fn prepare(&self, request: &RequestMetadata) -> Result<PreparedRequest> {
        Ok(PreparedRequest {
            method: request.method.clone(),
            url: self.url_for(request)?,
            full_url: self.request_url(request)?,
            headers: self.headers()?,
            body: request.encode_body()?,
            timeout: self.timeout,
        })
    }

    /// The full request URL, including query parameters.
    pub(crate) fn request_url(&self, request: &RequestMetadata) -> Result<Url> {
        let mut url = self.url_for(request)?;
        if !request.query_params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &request.query_params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }
}

/// A request resolved against a [`ClientConfig`], ready for a transport.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    pub method: Method,
    /// URL without query string, reported in responses and errors.
    pub url: Url,
    /// URL with query string, the one actually requested.
    pub full_url: Url,
    pub headers: HeaderMap,
    /// Encoded JSON body; `None` sends no body.
    pub body: Option<Vec<u8>>,
    pub timeout: Duration,
}
