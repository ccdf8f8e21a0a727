//! Async client for the context API.
//!
//! [`Client`] is the non-blocking entry point. Each method is a single await
//! on one HTTP exchange; nothing is spawned in the background. Use
//! [`ClientBuilder`] to configure it, or to build a
//! [`BlockingClient`](crate::BlockingClient) with the same settings.
//!
//! Every operation yields `Response<Option<_>>`: the data is `None` when the
//! service answers 204 or with an empty body.

use crate::{
    blocking::BlockingClient,
    config::{ClientConfig, PreparedRequest, DEFAULT_BASE_URL, DEFAULT_TIMEOUT},
    request::{
        CreateContext, GetContext, GetRequest, ListContexts, MessageBatch, MessageRefs, Metadata,
        Operation, RequestMetadata, UpdateRequest,
    },
    response::interpret,
    types::{
        AppendResponse, CreateContextResponse, DeleteResponse, GetContextResponse, GetResult,
        ListContextsResponse, UpdateResponse,
    },
    Error, Response, Result,
};
use http::{HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Instant;
use url::Url;

/// An async client for the context API.
///
/// Cheap to clone; clones share one connection pool.
///
/// # Examples
///
/// ```no_run
/// use ultracontext::{Client, CreateContext, GetContext, MessageUpdate};
/// use serde_json::json;
///
/// # async fn example() -> Result<(), ultracontext::Error> {
/// let client = Client::builder().api_key("uc_live_123").build()?;
///
/// let Some(ctx) = client.create(CreateContext::new()).await?.into_data() else {
///     return Ok(());
/// };
/// client.append(&ctx.id, json!({"role": "user", "content": "hi"})).await?;
/// client
///     .update(&ctx.id, MessageUpdate::index(-1).set("content", "hello"))
///     .await?;
///
/// let current = client.get(&ctx.id, GetContext::new().history(true)).await?;
/// if let Some(context) = &current.data {
///     println!("{} messages at version {:?}", context.data.len(), context.version);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    config: ClientConfig,
}

impl Client {
    /// Creates a new `ClientBuilder` for configuring a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Creates a context, or forks one when `params` names a source.
    pub async fn create(
        &self,
        params: CreateContext,
    ) -> Result<Response<Option<CreateContextResponse>>> {
        self.execute(Operation::Create(params)).await
    }

    /// Lists contexts.
    pub async fn list(
        &self,
        params: ListContexts,
    ) -> Result<Response<Option<ListContextsResponse>>> {
        self.execute(Operation::Get(GetRequest::List(params))).await
    }

    /// Fetches one context, optionally as of a version, index or timestamp.
    pub async fn get(
        &self,
        context_id: impl Into<String>,
        query: GetContext,
    ) -> Result<Response<Option<GetContextResponse>>> {
        let request = GetRequest::One {
            context_id: context_id.into(),
            query,
        };
        self.execute(Operation::Get(request)).await
    }

    /// Runs either shape of get and tags the result accordingly.
    pub async fn fetch(&self, request: GetRequest) -> Result<Response<Option<GetResult>>> {
        match request {
            GetRequest::List(_) => Ok(self
                .execute::<Option<ListContextsResponse>>(Operation::Get(request))
                .await?
                .map(|data| data.map(GetResult::List))),
            GetRequest::One { .. } => Ok(self
                .execute::<Option<GetContextResponse>>(Operation::Get(request))
                .await?
                .map(|data| data.map(GetResult::Context))),
        }
    }

    /// Appends one message or a list of messages.
    pub async fn append(
        &self,
        context_id: impl Into<String>,
        messages: impl Into<MessageBatch>,
    ) -> Result<Response<Option<AppendResponse>>> {
        self.execute(Operation::Append {
            context_id: context_id.into(),
            messages: messages.into(),
        })
        .await
    }

    /// Updates one message, or a batch of messages.
    pub async fn update(
        &self,
        context_id: impl Into<String>,
        request: impl Into<UpdateRequest>,
    ) -> Result<Response<Option<UpdateResponse>>> {
        self.execute(Operation::Update {
            context_id: context_id.into(),
            request: request.into(),
        })
        .await
    }

    /// Deletes messages by id or index.
    pub async fn delete(
        &self,
        context_id: impl Into<String>,
        ids: impl Into<MessageRefs>,
        metadata: Option<Metadata>,
    ) -> Result<Response<Option<DeleteResponse>>> {
        self.execute(Operation::Delete {
            context_id: context_id.into(),
            ids: ids.into(),
            metadata,
        })
        .await
    }

    /// Shapes and sends an operation.
    pub async fn execute<T>(&self, operation: Operation) -> Result<Response<T>>
    where
        T: DeserializeOwned,
    {
        self.call(operation.into_request()).await
    }

    /// Sends a prepared request and interprets the response.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use ultracontext::{Client, request::RequestMetadata};
    /// use http::Method;
    ///
    /// # async fn example() -> Result<(), ultracontext::Error> {
    /// let client = Client::builder().build()?;
    ///
    /// let metadata = RequestMetadata::new(Method::GET, ["contexts"]).with_query_param("limit", 5);
    /// let response = client.call::<serde_json::Value>(metadata).await?;
    /// println!("{}", response.raw_body);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn call<T>(&self, request: RequestMetadata) -> Result<Response<T>>
    where
        T: DeserializeOwned,
    {
        let prepared = self.inner.config.prepare(&request)?;
        let start_time = Instant::now();

        let response = self.send(&prepared).await.map_err(|e| {
            tracing::warn!(
                error = %e,
                method = %prepared.method,
                url = %prepared.url,
                "Request failed"
            );
            Error::transport(e)
        })?;

        let status = response.status();
        let headers = response.headers().clone();
        let raw_body = response.text().await.map_err(Error::transport)?;

        interpret(
            status,
            prepared.url.to_string(),
            headers,
            raw_body,
            start_time.elapsed(),
        )
    }

    async fn send(&self, prepared: &PreparedRequest) -> reqwest::Result<reqwest::Response> {
        tracing::debug!(
            method = %prepared.method,
            url = %prepared.full_url,
            "Executing HTTP request"
        );

        let mut request = self
            .inner
            .http_client
            .request(prepared.method.clone(), prepared.full_url.clone())
            .headers(prepared.headers.clone())
            .timeout(prepared.timeout);

        if let Some(body) = &prepared.body {
            request = request.body(body.clone());
        }

        request.send().await
    }
}

/// Builder for [`Client`] and [`BlockingClient`].
///
/// # Examples
///
/// ```no_run
/// use ultracontext::ClientBuilder;
/// use std::time::Duration;
///
/// # fn example() -> Result<(), ultracontext::Error> {
/// let client = ClientBuilder::new()
///     .api_key("uc_live_123")
///     .base_url("https://staging.example.com/v1")?
///     .timeout(Duration::from_secs(10))
///     .default_header("X-Request-Source", "worker")?
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    api_key: Option<String>,
    base_url: Option<Url>,
    default_headers: HeaderMap,
    timeout: std::time::Duration,
}

impl ClientBuilder {
    /// Creates a new `ClientBuilder` with default settings.
    pub fn new() -> Self {
        Self {
            api_key: None,
            base_url: None,
            default_headers: HeaderMap::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets the API key sent as `Authorization: Bearer <key>`.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Overrides the production base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn base_url(mut self, url: impl AsRef<str>) -> Result<Self> {
        self.base_url = Some(Url::parse(url.as_ref())?);
        Ok(self)
    }

    /// Adds a header sent with every request.
    ///
    /// `Content-Type` and, when an API key is set, `Authorization` always
    /// take the client's own values.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn default_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header value: {}", e)))?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    /// Sets the timeout for a whole request/response round trip.
    ///
    /// A zero duration falls back to [`DEFAULT_TIMEOUT`].
    pub fn timeout(mut self, timeout: std::time::Duration) -> Self {
        self.timeout = if timeout.is_zero() {
            DEFAULT_TIMEOUT
        } else {
            timeout
        };
        self
    }

    fn into_config(self) -> Result<ClientConfig> {
        let base_url = match self.base_url {
            Some(url) => url,
            None => Url::parse(DEFAULT_BASE_URL)?,
        };

        ClientConfig::new(base_url, self.api_key, self.timeout, self.default_headers)
    }

    /// Builds the async [`Client`].
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be constructed.
    pub fn build(self) -> Result<Client> {
        let config = self.into_config()?;

        let http_client = reqwest::Client::builder().build().map_err(|e| {
            Error::ConfigurationError(format!("Failed to build HTTP client: {}", e))
        })?;

        Ok(Client {
            inner: Arc::new(ClientInner {
                http_client,
                config,
            }),
        })
    }

    /// Builds a [`BlockingClient`] with the same settings.
    ///
    /// Must not be called from inside an async runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be constructed.
    pub fn build_blocking(self) -> Result<BlockingClient> {
        BlockingClient::from_config(self.into_config()?)
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
