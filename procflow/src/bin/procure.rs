//! Demo driver for the procurement pipeline.
//!
//! Reads newline-delimited requests from `demos/test_requests.txt` (falling
//! back to one sample request if the file is absent), runs each through the
//! compiled pipeline, and prints the trace and final fields.

use procflow::prelude::*;
use std::fs;
use tracing_subscriber::EnvFilter;

const REQUESTS_PATH: &str = "demos/test_requests.txt";
const FALLBACK_REQUEST: &str = "Order 3 laptops";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = WorkflowConfig::default();
    let graph = procurement_graph(&config)?;
    let pipeline = CompiledPipeline::compile(&graph)?;

    for request in load_requests(REQUESTS_PATH) {
        // A failed line is reported and the remaining lines still run.
        if let Err(err) = run_one(&pipeline, &request).await {
            eprintln!("request '{request}' failed: {err}");
        }
    }

    Ok(())
}

/// Loads requests, one per line, skipping blanks. A missing or unreadable
/// file yields the hardcoded sample instead of failing the process.
fn load_requests(path: &str) -> Vec<String> {
    match fs::read_to_string(path) {
        Ok(contents) => {
            let lines: Vec<String> = contents
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(ToString::to_string)
                .collect();
            if lines.is_empty() {
                vec![FALLBACK_REQUEST.to_string()]
            } else {
                lines
            }
        }
        Err(_) => vec![FALLBACK_REQUEST.to_string()],
    }
}

async fn run_one(pipeline: &CompiledPipeline, request: &str) -> Result<(), PipelineError> {
    let initial = State::new()
        .with_field("original_request", request)
        .with_field(
            "logs",
            serde_json::json!([format!("Received request: {request}")]),
        );

    let final_state = pipeline.invoke(&initial).await?;

    println!("\n=== Procurement Workflow Trace ===");
    for log in final_state.string_list("logs") {
        println!("- {log}");
    }
    for entry in final_state.trace() {
        let keys: Vec<&str> = entry.fragment.iter().map(|(k, _)| k.as_str()).collect();
        println!("- stage '{}' produced: {}", entry.stage, keys.join(", "));
    }

    println!("\n=== Final Outcome ===");
    println!("Item: {}", final_state.get_str("item").unwrap_or("?"));
    println!("Quantity: {}", final_state.get_i64("quantity").unwrap_or(0));
    println!("Supplier: {}", final_state.get_str("supplier").unwrap_or("?"));
    println!("Approved: {}", final_state.get_bool("approved").unwrap_or(false));
    println!("Reason: {}", final_state.get_str("reason").unwrap_or("?"));

    Ok(())
}
