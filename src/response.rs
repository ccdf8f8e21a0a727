//! Response interpretation and the [`Response`] wrapper.
//!
//! [`interpret`] is the single place where a status code and body become a
//! typed value or an [`Error`]. Both clients read the body to a string first
//! and then call it, so success, "no content" and failure are classified the
//! same way regardless of execution model.

use crate::{Error, Result};
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// A successful response from the context service.
///
/// Holds the decoded data together with the raw body, status, headers and
/// timing of the exchange.
///
/// # Examples
///
/// ```no_run
/// use ultracontext::{Client, CreateContext};
///
/// # async fn example() -> Result<(), ultracontext::Error> {
/// let client = Client::builder().api_key("uc_live_123").build()?;
///
/// let response = client.create(CreateContext::new()).await?;
/// println!("Status {} in {:?}", response.status, response.latency);
/// println!("Raw body: {}", response.raw_body);
///
/// if let Some(created) = response.into_data() {
///     println!("Created {}", created.id);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Response<T> {
    /// The decoded response data.
    pub data: T,

    /// The raw response body. Empty for 204 responses.
    pub raw_body: String,

    /// The HTTP status code of the response.
    pub status: StatusCode,

    /// The response headers.
    pub headers: HeaderMap,

    /// The request URL, without query string.
    pub url: String,

    /// Time from sending the request until the body was read.
    pub latency: Duration,
}

impl<T> Response<T> {
    pub fn new(
        data: T,
        raw_body: String,
        status: StatusCode,
        headers: HeaderMap,
        url: String,
        latency: Duration,
    ) -> Self {
        Self {
            data,
            raw_body,
            status,
            headers,
            url,
            latency,
        }
    }

    /// Maps the response data to a different type, keeping the metadata.
    ///
    /// # Examples
    ///
    /// ```
    /// # use ultracontext::Response;
    /// # use http::{HeaderMap, StatusCode};
    /// # use std::time::Duration;
    /// let response = Response::new(
    ///     42,
    ///     "42".to_string(),
    ///     StatusCode::OK,
    ///     HeaderMap::new(),
    ///     "https://api.ultracontext.ai/contexts".to_string(),
    ///     Duration::from_millis(100),
    /// );
    ///
    /// let string_response = response.map(|n| n.to_string());
    /// assert_eq!(string_response.data, "42");
    /// ```
    pub fn map<U, F>(self, f: F) -> Response<U>
    where
        F: FnOnce(T) -> U,
    {
        Response {
            data: f(self.data),
            raw_body: self.raw_body,
            status: self.status,
            headers: self.headers,
            url: self.url,
            latency: self.latency,
        }
    }

    /// Returns `true` if the service sent no body.
    pub fn is_empty(&self) -> bool {
        self.status == StatusCode::NO_CONTENT || self.raw_body.is_empty()
    }

    /// Returns a header value by name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    /// Discards the metadata and returns the data.
    pub fn into_data(self) -> T {
        self.data
    }
}

impl<T> std::ops::Deref for Response<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

/// Classifies a completed exchange.
///
/// - non-2xx: [`Error::HttpError`] carrying the raw body verbatim.
/// - 204 or empty body: decoded from JSON `null`, without parsing the body.
///   The clients request `Option<_>` for every operation, so this is `None`.
/// - otherwise: the body is parsed as JSON into `T`.
pub fn interpret<T>(
    status: StatusCode,
    url: String,
    headers: HeaderMap,
    raw_body: String,
    latency: Duration,
) -> Result<Response<T>>
where
    T: DeserializeOwned,
{
    tracing::info!(
        status = status.as_u16(),
        latency_ms = latency.as_millis(),
        url = %url,
        "Received HTTP response"
    );

    if !status.is_success() {
        if status.is_server_error() {
            tracing::warn!(
                status = status.as_u16(),
                response = %raw_body,
                "Server error (5xx)"
            );
        } else {
            tracing::error!(
                status = status.as_u16(),
                response = %raw_body,
                "Request rejected"
            );
        }

        return Err(Error::HttpError {
            status,
            url,
            raw_response: raw_body,
            headers,
        });
    }

    let decoded = if status == StatusCode::NO_CONTENT || raw_body.is_empty() {
        serde_json::from_value::<T>(Value::Null)
    } else {
        serde_json::from_str::<T>(&raw_body)
    };

    match decoded {
        Ok(data) => Ok(Response::new(data, raw_body, status, headers, url, latency)),
        Err(e) => {
            tracing::error!(
                error = %e,
                raw_response = %raw_body,
                "Failed to deserialize response"
            );

            Err(Error::DeserializationFailed {
                raw_response: raw_body,
                serde_error: e.to_string(),
                status,
            })
        }
    }
}
