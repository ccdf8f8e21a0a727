//! Basic walkthrough of the context lifecycle.
//!
//! This example shows how to:
//! - Create a context and append messages
//! - Edit a message with audit metadata
//! - Fork a context from an earlier version
//! - Read a context with its version history
//!
//! Run with: `ULTRACONTEXT_API_KEY=... cargo run --example basic_usage`

use serde_json::json;
use ultracontext::{Client, CreateContext, Error, GetContext, ListContexts, MessageUpdate};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("ultracontext=debug,basic_usage=info")
        .init();

    let mut builder = Client::builder();
    if let Ok(key) = std::env::var("ULTRACONTEXT_API_KEY") {
        builder = builder.api_key(key);
    }
    let client = builder.build()?;

    println!("=== Create and append ===");
    let Some(ctx) = client.create(CreateContext::new()).await?.into_data() else {
        println!("Service returned no context");
        return Ok(());
    };
    println!("Context: {}", ctx.id);

    let appended = client
        .append(
            &ctx.id,
            json!([
                {"role": "user", "content": "Summarize the meeting"},
                {"role": "assistant", "content": "The meeting covered the roadmap."}
            ]),
        )
        .await?;
    println!(
        "Now at version {:?}",
        appended.data.as_ref().and_then(|m| m.version)
    );
    println!();

    println!("=== Edit with audit metadata ===");
    let mut audit = serde_json::Map::new();
    audit.insert("editor".to_string(), json!("basic_usage"));
    let updated = client
        .update(
            &ctx.id,
            MessageUpdate::index(-1)
                .set("content", "The meeting covered the Q3 roadmap.")
                .metadata(audit),
        )
        .await?;
    println!(
        "Now at version {:?}",
        updated.data.as_ref().and_then(|m| m.version)
    );
    println!();

    println!("=== Fork before the edit ===");
    let fork = client
        .create(CreateContext::fork(&ctx.id).version(1))
        .await?;
    if let Some(fork) = fork.into_data() {
        let forked = client.get(&fork.id, GetContext::new().history(true)).await?;
        println!("Request latency: {:?}", forked.latency);
        for message in forked.iter().flat_map(|context| &context.data) {
            println!("  [{:?}] {:?}", message.index, message.field("content"));
        }
    }
    println!();

    println!("=== Recent contexts ===");
    let listed = client.list(ListContexts::new().limit(5)).await?;
    for context in listed.iter().flat_map(|listed| &listed.data) {
        println!("  {}", context.id);
    }

    Ok(())
}
