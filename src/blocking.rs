//! Blocking client for the context API.
//!
//! Same operations and wire format as [`Client`](crate::Client); each call
//! holds the calling thread until the response body has been read.

use crate::{
    config::{ClientConfig, PreparedRequest},
    request::{
        CreateContext, GetContext, GetRequest, ListContexts, MessageBatch, MessageRefs, Metadata,
        Operation, RequestMetadata, UpdateRequest,
    },
    response::interpret,
    types::{
        AppendResponse, CreateContextResponse, DeleteResponse, GetContextResponse, GetResult,
        ListContextsResponse, UpdateResponse,
    },
    ClientBuilder, Error, Response, Result,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Instant;

/// A blocking client for the context API.
///
/// Built with [`ClientBuilder::build_blocking`]. It wraps
/// `reqwest::blocking::Client`, which runs its own internal runtime, so it
/// must be created, used and dropped outside of any async runtime.
///
/// # Examples
///
/// ```no_run
/// use ultracontext::{BlockingClient, ListContexts};
///
/// # fn example() -> Result<(), ultracontext::Error> {
/// let client = BlockingClient::builder().api_key("uc_live_123").build_blocking()?;
///
/// if let Some(listed) = client.list(ListContexts::new().limit(5))?.into_data() {
///     for ctx in &listed.data {
///         println!("{}", ctx.id);
///     }
/// }
///
/// client.delete("ctx_1", ["msg_1", "msg_2"], None)?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct BlockingClient {
    inner: Arc<BlockingInner>,
}

struct BlockingInner {
    http_client: reqwest::blocking::Client,
    config: ClientConfig,
}

impl BlockingClient {
    /// Creates a new `ClientBuilder`; finish it with
    /// [`build_blocking`](ClientBuilder::build_blocking).
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub(crate) fn from_config(config: ClientConfig) -> Result<Self> {
        let http_client = reqwest::blocking::Client::builder().build().map_err(|e| {
            Error::ConfigurationError(format!("Failed to build HTTP client: {}", e))
        })?;

        Ok(Self {
            inner: Arc::new(BlockingInner {
                http_client,
                config,
            }),
        })
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Creates a context, or forks one when `params` names a source.
    pub fn create(
        &self,
        params: CreateContext,
    ) -> Result<Response<Option<CreateContextResponse>>> {
        self.execute(Operation::Create(params))
    }

    /// Lists contexts.
    pub fn list(&self, params: ListContexts) -> Result<Response<Option<ListContextsResponse>>> {
        self.execute(Operation::Get(GetRequest::List(params)))
    }

    /// Fetches one context, optionally as of a version, index or timestamp.
    pub fn get(
        &self,
        context_id: impl Into<String>,
        query: GetContext,
    ) -> Result<Response<Option<GetContextResponse>>> {
        self.execute(Operation::Get(GetRequest::One {
            context_id: context_id.into(),
            query,
        }))
    }

    /// Runs either shape of get and tags the result accordingly.
    pub fn fetch(&self, request: GetRequest) -> Result<Response<Option<GetResult>>> {
        match request {
            GetRequest::List(_) => Ok(self
                .execute::<Option<ListContextsResponse>>(Operation::Get(request))?
                .map(|data| data.map(GetResult::List))),
            GetRequest::One { .. } => Ok(self
                .execute::<Option<GetContextResponse>>(Operation::Get(request))?
                .map(|data| data.map(GetResult::Context))),
        }
    }

    /// Appends one message or a list of messages.
    pub fn append(
        &self,
        context_id: impl Into<String>,
        messages: impl Into<MessageBatch>,
    ) -> Result<Response<Option<AppendResponse>>> {
        self.execute(Operation::Append {
            context_id: context_id.into(),
            messages: messages.into(),
        })
    }

    /// Updates one message, or a batch of messages.
    pub fn update(
        &self,
        context_id: impl Into<String>,
        request: impl Into<UpdateRequest>,
    ) -> Result<Response<Option<UpdateResponse>>> {
        self.execute(Operation::Update {
            context_id: context_id.into(),
            request: request.into(),
        })
    }

    /// Deletes messages by id or index.
    pub fn delete(
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
    }

    /// Shapes and sends an operation.
    pub fn execute<T>(&self, operation: Operation) -> Result<Response<T>>
    where
        T: DeserializeOwned,
    {
        self.call(operation.into_request())
    }

    /// Sends a prepared request and interprets the response.
    pub fn call<T>(&self, request: RequestMetadata) -> Result<Response<T>>
    where
        T: DeserializeOwned,
    {
        let prepared = self.inner.config.prepare(&request)?;
        let start_time = Instant::now();

        let response = self.send(&prepared).map_err(|e| {
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
        let raw_body = response.text().map_err(Error::transport)?;

        interpret(
            status,
            prepared.url.to_string(),
            headers,
            raw_body,
            start_time.elapsed(),
        )
    }

    fn send(&self, prepared: &PreparedRequest) -> reqwest::Result<reqwest::blocking::Response> {
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

        request.send()
    }
}
