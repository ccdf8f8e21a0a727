//! Records returned by the context service.
//!
//! Decoding is lenient. Fields the client does not model are kept in the
//! flattened `extra` map, and optional fields default when absent, so a
//! service that adds fields does not break existing callers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::request::Metadata;

/// A context as listed by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Context {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One entry in a context's message sequence.
///
/// `id` and `index` are assigned by the service. Everything else is the
/// caller's own content and is not validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<i64>,
    #[serde(flatten)]
    pub content: Map<String, Value>,
}

impl Message {
    /// Returns a content field by name.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.content.get(name)
    }
}

/// A snapshot marker in a context's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Version {
    pub version: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateContextResponse {
    pub id: String,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListContextsResponse {
    #[serde(default)]
    pub data: Vec<Context>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetContextResponse {
    #[serde(default)]
    pub data: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    /// Present when the context was fetched with `history=true`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub versions: Option<Vec<Version>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Result of a mutation: the affected messages and the version it produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationResponse {
    #[serde(default)]
    pub data: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

pub type AppendResponse = MutationResponse;
pub type UpdateResponse = MutationResponse;
pub type DeleteResponse = MutationResponse;

/// Result of the overloaded get.
#[derive(Debug, Clone, PartialEq)]
pub enum GetResult {
    List(ListContextsResponse),
    Context(GetContextResponse),
}
