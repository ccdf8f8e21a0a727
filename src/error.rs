//! Error types for context API calls.
//!
//! Two families of failure exist. Local and transport failures (connection
//! refused, timeout, a malformed success body) never carry a status code.
//! Service failures (any non-2xx response) carry the status, the request URL
//! and the raw response body exactly as the service sent it.

use http::{HeaderMap, StatusCode};

/// The error type for every client operation.
///
/// The client does not interpret status codes. A 404 and a 409 both arrive as
/// [`Error::HttpError`]; branch on [`Error::status`] to tell them apart.
///
/// # Examples
///
/// ```no_run
/// use ultracontext::{Client, Error, GetContext};
///
/// # async fn example() -> Result<(), Error> {
/// let client = Client::builder().api_key("uc_live_123").build()?;
///
/// match client.get("ctx_missing", GetContext::new()).await {
///     Ok(response) => {
///         let count = response.data.as_ref().map_or(0, |context| context.data.len());
///         println!("{} messages", count);
///     }
///     Err(Error::HttpError { status, url, raw_response, .. }) if status.as_u16() == 404 => {
///         eprintln!("{} does not exist: {}", url, raw_response);
///     }
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A network-level error occurred (connection failed, DNS lookup failed, etc.).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The request/response round trip exceeded the configured timeout.
    #[error("Request timed out")]
    Timeout,

    /// A success response body could not be decoded into the expected type.
    ///
    /// Covers both invalid JSON and JSON that does not fit the result type.
    #[error("Failed to deserialize response (status {status}): {serde_error}")]
    DeserializationFailed {
        /// The raw response body that failed to deserialize
        raw_response: String,
        /// The serde error message
        serde_error: String,
        /// The HTTP status code
        status: StatusCode,
    },

    /// The service returned a non-2xx HTTP status code.
    #[error("HTTP error {status}: {raw_response}")]
    HttpError {
        /// The HTTP status code
        status: StatusCode,
        /// The request URL, without query string
        url: String,
        /// The raw response body, verbatim
        raw_response: String,
        /// The response headers
        headers: HeaderMap,
    },

    /// Invalid configuration was provided, such as a bad header value.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Failed to serialize the request body.
    #[error("Failed to serialize request: {0}")]
    SerializationFailed(String),

    /// An invalid URL was provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl Error {
    /// Classifies a transport failure, separating timeouts from other
    /// network errors.
    pub(crate) fn transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout
        } else {
            Error::Network(err)
        }
    }

    /// Returns the HTTP status code if this error has one.
    ///
    /// # Examples
    ///
    /// ```
    /// use ultracontext::Error;
    /// use http::StatusCode;
    ///
    /// let err = Error::HttpError {
    ///     status: StatusCode::CONFLICT,
    ///     url: "https://api.ultracontext.ai/contexts/ctx_1".to_string(),
    ///     raw_response: r#"{"error":"version conflict"}"#.to_string(),
    ///     headers: http::HeaderMap::new(),
    /// };
    ///
    /// assert_eq!(err.status(), Some(StatusCode::CONFLICT));
    /// assert_eq!(Error::Timeout.status(), None);
    /// ```
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::HttpError { status, .. } => Some(*status),
            Error::DeserializationFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the raw response body if this error has one.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Error::HttpError { raw_response, .. } => Some(raw_response),
            Error::DeserializationFailed { raw_response, .. } => Some(raw_response),
            _ => None,
        }
    }

    /// Returns the request URL of a service error.
    pub fn url(&self) -> Option<&str> {
        match self {
            Error::HttpError { url, .. } => Some(url),
            _ => None,
        }
    }

    /// Returns `true` if the call failed because the timeout elapsed.
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Timeout => true,
            Error::Network(e) => e.is_timeout(),
            _ => false,
        }
    }
}

/// A specialized `Result` type for context API calls.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_expose_service_error_details() {
        let err = Error::HttpError {
            status: StatusCode::NOT_FOUND,
            url: "http://localhost/contexts/ctx_1".to_string(),
            raw_response: "not json <html>".to_string(),
            headers: HeaderMap::new(),
        };

        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
        assert_eq!(err.raw_response(), Some("not json <html>"));
        assert_eq!(err.url(), Some("http://localhost/contexts/ctx_1"));
        assert!(!err.is_timeout());
        assert_eq!(err.to_string(), "HTTP error 404 Not Found: not json <html>");
    }

    #[test]
    fn local_errors_have_no_status() {
        let err = Error::ConfigurationError("bad header".to_string());
        assert_eq!(err.status(), None);
        assert_eq!(err.raw_response(), None);
        assert_eq!(err.url(), None);

        assert!(Error::Timeout.is_timeout());
    }
}
