//! Example demonstrating error handling.
//!
//! This example shows how to:
//! - Branch on the status code of a service error
//! - Read the raw error body the service returned
//! - Tell timeouts apart from service errors
//! - Use the blocking client from synchronous code
//!
//! Run with: `cargo run --example error_handling`

use std::time::Duration;
use ultracontext::{BlockingClient, Error, GetContext, ListContexts};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("ultracontext=info")
        .init();

    let client = BlockingClient::builder()
        .api_key(std::env::var("ULTRACONTEXT_API_KEY").unwrap_or_default())
        .build_blocking()?;

    println!("=== Example 1: Handling service errors ===");
    match client.get("ctx_does_not_exist", GetContext::new()) {
        Ok(response) => println!("Unexpected success: {:?}", response.data),
        Err(Error::HttpError {
            status,
            url,
            raw_response,
            headers,
        }) => {
            println!("HTTP Error!");
            println!("  Status: {}", status);
            println!("  URL: {}", url);
            println!("  Not found: {}", status.as_u16() == 404);
            println!("  Raw response: {}", raw_response);
            println!("  Content-Type: {:?}", headers.get("content-type"));
        }
        Err(e) => println!("Other error: {}", e),
    }
    println!();

    println!("=== Example 2: Timeouts ===");
    let impatient = BlockingClient::builder()
        .timeout(Duration::from_millis(1))
        .build_blocking()?;

    match impatient.list(ListContexts::new()) {
        Ok(_) => println!("Answered within 1ms"),
        Err(e) if e.is_timeout() => {
            println!("Timed out; no status available: {:?}", e.status());
        }
        Err(e) => println!("Other error: {}", e),
    }

    Ok(())
}
