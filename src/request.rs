//! Request shaping: every logical operation becomes a [`RequestMetadata`].
//!
//! Nothing in this module touches the network. Both [`Client`](crate::Client)
//! and [`BlockingClient`](crate::BlockingClient) hand an [`Operation`] to
//! [`Operation::into_request`] and only differ in how they send the result,
//! so the two shells cannot drift apart on the wire.
//!
//! # Omission rules
//!
//! Optional arguments are dropped when unset, never sent as `null`:
//!
//! | Argument                                    | Omitted when            |
//! |---------------------------------------------|-------------------------|
//! | create `from`/`version`/`at`/`before`/`metadata` | `None`            |
//! | get `version`/`at`/`before`/`history`        | `None` (`Some(false)` is sent) |
//! | list `limit`                                 | `None` or `Some(0)`     |
//! | update/delete `metadata`                     | `None` or empty object  |

use http::Method;
use serde_json::{Map, Value};

/// Caller-supplied annotation attached to a context or to a mutation.
pub type Metadata = Map<String, Value>;

const CONTEXTS: &str = "contexts";

/// The wire form of a single call: method, path, query and JSON body.
///
/// The path is kept as raw segments so context ids are percent-encoded when
/// the URL is assembled. Query pairs keep insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestMetadata {
    /// The HTTP method (GET, POST, etc.).
    pub method: Method,

    /// Path segments relative to the base URL.
    pub segments: Vec<String>,

    /// Query parameters, in the order they are sent.
    pub query_params: Vec<(String, String)>,

    /// JSON body. `None` means no body at all, not an empty object.
    pub body: Option<Value>,
}

impl RequestMetadata {
    /// Creates a new `RequestMetadata` with the given method and path segments.
    pub fn new<I, S>(method: Method, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            method,
            segments: segments.into_iter().map(Into::into).collect(),
            query_params: Vec::new(),
            body: None,
        }
    }

    /// Adds a query parameter to the request.
    pub fn with_query_param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query_params.push((key.into(), value.to_string()));
        self
    }

    /// Adds a query parameter only when a value is present.
    pub fn with_optional_query_param<V: ToString>(
        self,
        key: impl Into<String>,
        value: Option<V>,
    ) -> Self {
        match value {
            Some(value) => self.with_query_param(key, value),
            None => self,
        }
    }

    /// Sets the JSON body.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// The path as it appears after the base URL, e.g. `/contexts/ctx_1`.
    pub fn path(&self) -> String {
        let mut path = String::new();
        for segment in &self.segments {
            path.push('/');
            path.push_str(segment);
        }
        path
    }

    /// Serializes the body to the exact bytes put on the wire.
    pub fn encode_body(&self) -> crate::Result<Option<Vec<u8>>> {
        self.body
            .as_ref()
            .map(|body| {
                serde_json::to_vec(body).map_err(|e| crate::Error::SerializationFailed(e.to_string()))
            })
            .transpose()
    }
}

/// Arguments for creating a context, or forking one from an existing context.
///
/// # Examples
///
/// ```
/// use ultracontext::CreateContext;
///
/// let fresh = CreateContext::new();
/// let fork = CreateContext::fork("ctx_123").version(4);
/// assert!(fresh.body().is_none());
/// assert_eq!(fork.body().unwrap()["from"], "ctx_123");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateContext {
    /// Source context to fork from.
    pub from: Option<String>,
    /// Fork from this version of the source.
    pub version: Option<u64>,
    /// Fork messages `0..=at` of the source.
    pub at: Option<i64>,
    /// Fork the state as it was before this timestamp.
    pub before: Option<String>,
    /// Metadata for the new context.
    pub metadata: Option<Metadata>,
}

impl CreateContext {
    /// An empty context with no fork source.
    pub fn new() -> Self {
        Self::default()
    }

    /// A context forked from `source`.
    pub fn fork(source: impl Into<String>) -> Self {
        Self {
            from: Some(source.into()),
            ..Self::default()
        }
    }

    pub fn version(mut self, version: u64) -> Self {
        self.version = Some(version);
        self
    }

    pub fn at(mut self, index: i64) -> Self {
        self.at = Some(index);
        self
    }

    pub fn before(mut self, timestamp: impl Into<String>) -> Self {
        self.before = Some(timestamp.into());
        self
    }

    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// The request body, or `None` when no field is set.
    pub fn body(&self) -> Option<Value> {
        let mut body = Map::new();
        insert_some(&mut body, "from", self.from.clone());
        insert_some(&mut body, "version", self.version);
        insert_some(&mut body, "at", self.at);
        insert_some(&mut body, "before", self.before.clone());
        insert_some(&mut body, "metadata", self.metadata.clone());

        if body.is_empty() {
            None
        } else {
            Some(Value::Object(body))
        }
    }
}

/// Arguments for listing contexts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListContexts {
    /// Page size. The service defaults to 20 when omitted.
    pub limit: Option<u32>,
}

impl ListContexts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Addressing options for fetching a single context.
///
/// Each option is passed through verbatim; the service decides how they
/// combine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetContext {
    pub version: Option<u64>,
    pub at: Option<i64>,
    pub before: Option<String>,
    /// Include version history. `Some(false)` is sent as `history=false`.
    pub history: Option<bool>,
}

impl GetContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn version(mut self, version: u64) -> Self {
        self.version = Some(version);
        self
    }

    pub fn at(mut self, index: i64) -> Self {
        self.at = Some(index);
        self
    }

    pub fn before(mut self, timestamp: impl Into<String>) -> Self {
        self.before = Some(timestamp.into());
        self
    }

    pub fn history(mut self, history: bool) -> Self {
        self.history = Some(history);
        self
    }
}

/// The two shapes of a get: the whole collection, or one context.
#[derive(Debug, Clone, PartialEq)]
pub enum GetRequest {
    List(ListContexts),
    One { context_id: String, query: GetContext },
}

impl GetRequest {
    /// Picks the mode from whether a context id was given.
    pub fn new(context_id: Option<String>, query: GetContext, list: ListContexts) -> Self {
        match context_id {
            Some(context_id) => GetRequest::One { context_id, query },
            None => GetRequest::List(list),
        }
    }

    fn into_request(self) -> RequestMetadata {
        match self {
            GetRequest::List(list) => RequestMetadata::new(Method::GET, [CONTEXTS])
                .with_optional_query_param("limit", list.limit.filter(|limit| *limit != 0)),
            GetRequest::One { context_id, query } => {
                RequestMetadata::new(Method::GET, [CONTEXTS.to_string(), context_id])
                    .with_optional_query_param("version", query.version)
                    .with_optional_query_param("at", query.at)
                    .with_optional_query_param("before", query.before)
                    .with_optional_query_param("history", query.history)
            }
        }
    }
}

/// Messages to append. Always sent as a JSON array.
///
/// A single object and a one-element list produce the same body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageBatch(pub Vec<Value>);

impl From<Value> for MessageBatch {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) => MessageBatch(items),
            other => MessageBatch(vec![other]),
        }
    }
}

impl From<Vec<Value>> for MessageBatch {
    fn from(items: Vec<Value>) -> Self {
        MessageBatch(items)
    }
}

impl From<Map<String, Value>> for MessageBatch {
    fn from(message: Map<String, Value>) -> Self {
        MessageBatch(vec![Value::Object(message)])
    }
}

impl From<Vec<Map<String, Value>>> for MessageBatch {
    fn from(messages: Vec<Map<String, Value>>) -> Self {
        MessageBatch(messages.into_iter().map(Value::Object).collect())
    }
}

/// A message addressed by service-assigned id or by position.
///
/// Index `-1` addresses the last message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageRef {
    Id(String),
    Index(i64),
}

impl From<&str> for MessageRef {
    fn from(id: &str) -> Self {
        MessageRef::Id(id.to_string())
    }
}

impl From<String> for MessageRef {
    fn from(id: String) -> Self {
        MessageRef::Id(id)
    }
}

impl From<i64> for MessageRef {
    fn from(index: i64) -> Self {
        MessageRef::Index(index)
    }
}

impl From<i32> for MessageRef {
    fn from(index: i32) -> Self {
        MessageRef::Index(index.into())
    }
}

impl From<MessageRef> for Value {
    fn from(target: MessageRef) -> Self {
        match target {
            MessageRef::Id(id) => Value::String(id),
            MessageRef::Index(index) => Value::from(index),
        }
    }
}

/// One or more message references. Always sent as a list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageRefs(pub Vec<MessageRef>);

impl From<MessageRef> for MessageRefs {
    fn from(target: MessageRef) -> Self {
        MessageRefs(vec![target])
    }
}

impl From<&str> for MessageRefs {
    fn from(id: &str) -> Self {
        MessageRef::from(id).into()
    }
}

impl From<String> for MessageRefs {
    fn from(id: String) -> Self {
        MessageRef::from(id).into()
    }
}

impl From<i64> for MessageRefs {
    fn from(index: i64) -> Self {
        MessageRef::from(index).into()
    }
}

impl From<i32> for MessageRefs {
    fn from(index: i32) -> Self {
        MessageRef::from(index).into()
    }
}

impl<T: Into<MessageRef>> From<Vec<T>> for MessageRefs {
    fn from(targets: Vec<T>) -> Self {
        MessageRefs(targets.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<MessageRef>, const N: usize> From<[T; N]> for MessageRefs {
    fn from(targets: [T; N]) -> Self {
        MessageRefs(targets.into_iter().map(Into::into).collect())
    }
}

/// Changes to a single message, addressed by id, index, both or neither.
///
/// The service resolves the target; an update with no `id` or `index` is
/// sent as-is and any rejection comes back as an HTTP error.
///
/// # Examples
///
/// ```
/// use ultracontext::MessageUpdate;
/// use serde_json::json;
///
/// let update = MessageUpdate::id("msg_1").set("content", "edited");
/// assert_eq!(update.body(), json!({"id": "msg_1", "content": "edited"}));
///
/// let untargeted = MessageUpdate::new().set("content", "edited");
/// assert_eq!(untargeted.body(), json!({"content": "edited"}));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageUpdate {
    pub id: Option<String>,
    pub index: Option<i64>,
    pub fields: Map<String, Value>,
    pub metadata: Option<Metadata>,
}

impl MessageUpdate {
    /// An update with no target yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Targets the message with this id.
    pub fn id(id: impl Into<String>) -> Self {
        Self::new().target(MessageRef::Id(id.into()))
    }

    /// Targets the message at this index; `-1` is the last message.
    pub fn index(index: i64) -> Self {
        Self::new().target(MessageRef::Index(index))
    }

    /// Sets the `id` or `index` key, keeping the other one if already set.
    pub fn target(mut self, target: impl Into<MessageRef>) -> Self {
        match target.into() {
            MessageRef::Id(id) => self.id = Some(id),
            MessageRef::Index(index) => self.index = Some(index),
        }
        self
    }

    /// Sets one field on the message.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Version metadata for the audit trail.
    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// The fields merged with whichever of `id` and `index` are set.
    pub fn merged(&self) -> Map<String, Value> {
        let mut merged = self.fields.clone();
        if let Some(id) = &self.id {
            merged.insert("id".to_string(), Value::String(id.clone()));
        }
        if let Some(index) = self.index {
            merged.insert("index".to_string(), Value::from(index));
        }
        merged
    }

    /// The request body.
    ///
    /// Without metadata the merged fields are sent flat. With metadata they
    /// are wrapped as a one-entry batch: `{"updates": [...], "metadata": ...}`.
    pub fn body(&self) -> Value {
        let merged = Value::Object(self.merged());
        match non_empty(self.metadata.clone()) {
            Some(metadata) => batch_body(vec![merged], Some(metadata)),
            None => merged,
        }
    }
}

/// Several message updates applied as one version.
///
/// Each entry is sent as given; it is expected to carry `id` or `index`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchUpdate {
    pub updates: Vec<Value>,
    pub metadata: Option<Metadata>,
}

impl BatchUpdate {
    pub fn new(updates: impl IntoIterator<Item = Value>) -> Self {
        Self {
            updates: updates.into_iter().collect(),
            metadata: None,
        }
    }

    /// Adds a single-message update to the batch.
    pub fn push(mut self, update: MessageUpdate) -> Self {
        self.updates.push(Value::Object(update.merged()));
        self
    }

    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn body(&self) -> Value {
        batch_body(self.updates.clone(), non_empty(self.metadata.clone()))
    }
}

/// The two shapes of an update.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateRequest {
    Single(MessageUpdate),
    Batch(BatchUpdate),
}

impl UpdateRequest {
    pub fn body(&self) -> Value {
        match self {
            UpdateRequest::Single(update) => update.body(),
            UpdateRequest::Batch(batch) => batch.body(),
        }
    }
}

impl From<MessageUpdate> for UpdateRequest {
    fn from(update: MessageUpdate) -> Self {
        UpdateRequest::Single(update)
    }
}

impl From<BatchUpdate> for UpdateRequest {
    fn from(batch: BatchUpdate) -> Self {
        UpdateRequest::Batch(batch)
    }
}

/// Every call the client can make, as data.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Create(CreateContext),
    Get(GetRequest),
    Append {
        context_id: String,
        messages: MessageBatch,
    },
    Update {
        context_id: String,
        request: UpdateRequest,
    },
    Delete {
        context_id: String,
        ids: MessageRefs,
        metadata: Option<Metadata>,
    },
}

impl Operation {
    /// Shapes the operation into its wire request.
    pub fn into_request(self) -> RequestMetadata {
        match self {
            Operation::Create(create) => {
                let request = RequestMetadata::new(Method::POST, [CONTEXTS]);
                match create.body() {
                    Some(body) => request.with_body(body),
                    None => request,
                }
            }
            Operation::Get(get) => get.into_request(),
            Operation::Append {
                context_id,
                messages,
            } => RequestMetadata::new(Method::POST, [CONTEXTS.to_string(), context_id])
                .with_body(Value::Array(messages.0)),
            Operation::Update {
                context_id,
                request,
            } => RequestMetadata::new(Method::PATCH, [CONTEXTS.to_string(), context_id])
                .with_body(request.body()),
            Operation::Delete {
                context_id,
                ids,
                metadata,
            } => {
                let mut body = Map::new();
                body.insert(
                    "ids".to_string(),
                    Value::Array(ids.0.into_iter().map(Value::from).collect()),
                );
                insert_some(&mut body, "metadata", non_empty(metadata));
                RequestMetadata::new(Method::DELETE, [CONTEXTS.to_string(), context_id])
                    .with_body(Value::Object(body))
            }
        }
    }
}

fn batch_body(updates: Vec<Value>, metadata: Option<Metadata>) -> Value {
    let mut body = Map::new();
    body.insert("updates".to_string(), Value::Array(updates));
    insert_some(&mut body, "metadata", metadata);
    Value::Object(body)
}

fn insert_some<V: Into<Value>>(body: &mut Map<String, Value>, key: &str, value: Option<V>) {
    if let Some(value) = value {
        body.insert(key.to_string(), value.into());
    }
}

// Mutation metadata is only sent when it has at least one key.
fn non_empty(metadata: Option<Metadata>) -> Option<Metadata> {
    metadata.filter(|m| !m.is_empty())
}
