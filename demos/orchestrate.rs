//! Runs one web-automation workflow through the agent tool and prints the result.
//!
//! Run with:
//! ```bash
//! EMERGENCE_API_KEY=... cargo run --example orchestrate -- "Find the cheapest flight from SFO to JFK"
//! ```
//!
//! Set `RUST_LOG=emergence=debug` to watch each poll.

use emergence::{Client, ToolRegistry, WorkflowTool, TOOL_NAME};
use serde_json::json;
use std::error::Error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("emergence=info".parse()?),
        )
        .init();

    let prompt = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    let prompt = if prompt.trim().is_empty() {
        "Find the top story on Hacker News and summarize it in one sentence".to_string()
    } else {
        prompt
    };

    let client = Client::from_env()?;
    let tool = WorkflowTool::new(&client);
    let registry = ToolRegistry::new().register_workflow_tool(&tool);

    println!("=== Tool definition ===");
    for def in registry.definitions() {
        println!("{}", serde_json::to_string_pretty(&def)?);
    }
    println!();

    println!("=== Running: {prompt} ===");
    let text = registry.execute(TOOL_NAME, json!({ "prompt": prompt })).await;
    println!("{text}");

    Ok(())
}
