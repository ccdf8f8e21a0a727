//! # UltraContext - typed client for the versioned context API
//!
//! A context is a remote, append-only ledger of messages. Every mutation
//! produces a new version, and any context can be read or forked as of a
//! version, a message index or a timestamp. This crate turns typed calls into
//! HTTP requests against that API and turns responses back into typed
//! results or structured errors. It keeps no local state.
//!
//! Two clients expose the same operations with the same wire format:
//! [`Client`] is async, [`BlockingClient`] blocks the calling thread. Both
//! shape requests through [`request::Operation`] and classify responses with
//! [`interpret`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use ultracontext::{BatchUpdate, Client, CreateContext, GetContext, MessageUpdate};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ultracontext::Error> {
//!     let client = Client::builder().api_key("uc_live_123").build()?;
//!
//!     // Create a context and add two messages
//!     let Some(ctx) = client.create(CreateContext::new()).await?.into_data() else {
//!         return Ok(());
//!     };
//!     client
//!         .append(
//!             &ctx.id,
//!             json!([
//!                 {"role": "user", "content": "What is 2 + 2?"},
//!                 {"role": "assistant", "content": "5"}
//!             ]),
//!         )
//!         .await?;
//!
//!     // Fix the answer, recording who did it
//!     let mut audit = serde_json::Map::new();
//!     audit.insert("by".to_string(), json!("reviewer"));
//!     client
//!         .update(
//!             &ctx.id,
//!             MessageUpdate::index(-1).set("content", "4").metadata(audit),
//!         )
//!         .await?;
//!
//!     // Fork the context as it was before the fix
//!     let fork = client.create(CreateContext::fork(&ctx.id).version(1)).await?;
//!
//!     if let Some(fork) = fork.into_data() {
//!         let current = client.get(&fork.id, GetContext::new().history(true)).await?;
//!         if let Some(context) = current.into_data() {
//!             println!("{} messages", context.data.len());
//!         }
//!     }
//!
//!     client
//!         .update(&ctx.id, BatchUpdate::new(vec![json!({"index": 0, "content": "2 + 2?"})]))
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Every operation returns [`Response`] wrapping an `Option`: a 204 or an
//! empty 2xx body is `None` rather than an error.
//!
//! Non-2xx responses surface as [`Error::HttpError`] with the status code,
//! request URL and raw response body. Transport failures and timeouts have
//! their own variants. Nothing is retried.
//!
//! ```no_run
//! use ultracontext::{Client, Error, GetContext};
//!
//! # async fn example() -> Result<(), Error> {
//! # let client = Client::builder().build()?;
//! match client.get("ctx_123", GetContext::new()).await {
//!     Ok(response) => match response.into_data() {
//!         Some(context) => println!("Version {:?}", context.version),
//!         None => println!("No content"),
//!     },
//!     Err(Error::HttpError { status, raw_response, .. }) => {
//!         eprintln!("HTTP error {}: {}", status, raw_response);
//!     }
//!     Err(Error::Timeout) => eprintln!("Timed out"),
//!     Err(e) => eprintln!("Other error: {}", e),
//! }
//! # Ok(())
//! # }
//! ```

pub mod blocking;
mod client;
pub mod config;
mod error;
pub mod request;
mod response;
pub mod types;

pub use blocking::BlockingClient;
pub use client::{Client, ClientBuilder};
pub use config::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use error::{Error, Result};
pub use request::{
    BatchUpdate, CreateContext, GetContext, GetRequest, ListContexts, MessageBatch, MessageRef,
    MessageRefs, MessageUpdate, Metadata, Operation, UpdateRequest,
};
pub use response::{interpret, Response};
pub use types::{
    AppendResponse, Context, CreateContextResponse, DeleteResponse, GetContextResponse, GetResult,
    ListContextsResponse, Message, MutationResponse, UpdateResponse, Version,
};
