//! Simple SDK Example
//!
//! Queues a slugify task, then polls its output file once.
//!
//! # Usage
//!
//! 1. Put your API key in `secrets.json`:
//!    ```json
//!    { "BYTE_GENIE_KEY": "..." }
//!    ```
//!
//! 2. Run this example:
//!    ```bash
//!    cargo run --example simple
//!    ```

use bytegenie_sdk::{ByteGenieClient, ClientConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("ByteGenie SDK - Simple Example");
    println!("================================\n");

    // 1. Create client (async task mode by default)
    println!("1. Creating client...");
    let client = ByteGenieClient::new(ClientConfig::default())?;
    if client.api_key().is_empty() {
        println!("   ⚠ No BYTE_GENIE_KEY found in secrets.json\n");
    } else {
        println!("   ✓ Credentials loaded\n");
    }

    // 2. Queue a task
    println!("2. Queuing slugify task...");
    let resp = client.slugify("Hello World", None).await;
    if let Some(error) = resp.error() {
        println!("   ✗ Request failed: {}", error);
        return Ok(());
    }
    println!("   ✓ Status: {}", resp.status());
    if let Some(output_file) = resp.output_file() {
        println!("     - Output file: {}", output_file);
    }
    println!();

    // 3. Wait a bit for processing
    println!("3. Waiting 5 seconds...");
    tokio::time::sleep(tokio::time::Duration::from_secs(5)).await;
    println!("   ✓ Done\n");

    // 4. Read output
    println!("4. Reading output...");
    match resp.output(&client).await {
        Some(data) => println!("   ✓ Output: {}", data),
        None => println!("   ⚠ Output not ready yet"),
    }

    println!("\n✓ Example completed successfully!");

    Ok(())
}
