//! End-to-end tests for the procurement pipeline.

use crate::config::WorkflowConfig;
use crate::pipeline::CompiledPipeline;
use crate::stages::{procurement_graph, UNKNOWN_SUPPLIER};
use crate::state::State;
use pretty_assertions::assert_eq;
use serde_json::json;

fn compiled() -> CompiledPipeline {
    let graph = procurement_graph(&WorkflowConfig::default()).unwrap();
    CompiledPipeline::compile(&graph).unwrap()
}

fn initial_state(request: &str) -> State {
    State::new()
        .with_field("original_request", request)
        .with_field("logs", json!([format!("Received request: {request}")]))
}

#[tokio::test]
async fn small_laptop_order_is_auto_approved() {
    let pipeline = compiled();
    let final_state = pipeline
        .invoke(&initial_state("Order 3 laptops"))
        .await
        .unwrap();

    assert_eq!(final_state.get_str("item"), Some("laptop"));
    assert_eq!(final_state.get_i64("quantity"), Some(3));
    assert_eq!(final_state.get_str("supplier"), Some("Acme Computers"));
    assert_eq!(final_state.get_bool("approved"), Some(true));
}

#[tokio::test]
async fn bulk_chair_order_is_denied_with_threshold_reason() {
    let pipeline = compiled();
    let final_state = pipeline
        .invoke(&initial_state("Order 10 chairs"))
        .await
        .unwrap();

    assert_eq!(final_state.get_i64("quantity"), Some(10));
    assert_eq!(final_state.get_str("supplier"), Some("OfficeCo"));
    assert_eq!(final_state.get_bool("approved"), Some(false));
    let reason = final_state.get_str("reason").unwrap();
    assert!(reason.contains("threshold"));
}

#[tokio::test]
async fn trace_lists_the_three_stages_in_order() {
    let pipeline = compiled();
    let final_state = pipeline
        .invoke(&initial_state("Order 2 mice"))
        .await
        .unwrap();

    let stages: Vec<&str> = final_state
        .trace()
        .iter()
        .map(|entry| entry.stage.as_str())
        .collect();
    assert_eq!(stages, vec!["intake", "supplier", "approval"]);
}

#[tokio::test]
async fn logs_accumulate_across_stages() {
    let pipeline = compiled();
    let final_state = pipeline
        .invoke(&initial_state("Order 4 desks"))
        .await
        .unwrap();

    let logs = final_state.string_list("logs");
    assert_eq!(logs.len(), 4); // seed + one per stage
    assert!(logs[0].starts_with("Received request"));
    assert!(logs[1].starts_with("Intake parsed"));
    assert!(logs[2].starts_with("Supplier selected"));
    assert!(logs[3].starts_with("Approval decision"));
}

#[tokio::test]
async fn caller_state_is_untouched_by_a_full_run() {
    let pipeline = compiled();
    let initial = initial_state("Order 3 laptops");
    let saved = initial.clone();

    let _ = pipeline.invoke(&initial).await.unwrap();
    assert_eq!(initial, saved);
}

#[tokio::test]
async fn missing_request_field_fails_naming_the_intake_stage() {
    let pipeline = compiled();
    let err = pipeline.invoke(&State::new()).await.unwrap_err();
    assert_eq!(err.failing_stage(), Some("intake"));
}

#[tokio::test]
async fn unknown_item_still_flows_through_the_policy() {
    let pipeline = compiled();
    let final_state = pipeline
        .invoke(&initial_state("Order 2 submarines"))
        .await
        .unwrap();

    assert_eq!(final_state.get_str("supplier"), Some(UNKNOWN_SUPPLIER));
    assert_eq!(final_state.get_bool("approved"), Some(true));
}

#[tokio::test]
async fn one_compiled_pipeline_serves_concurrent_invocations() {
    let pipeline = std::sync::Arc::new(compiled());

    let mut handles = Vec::new();
    for request in ["Order 3 laptops", "Order 10 chairs", "Order 1 monitor"] {
        let pipeline = pipeline.clone();
        handles.push(tokio::spawn(async move {
            pipeline.invoke(&initial_state(request)).await
        }));
    }

    for handle in handles {
        let final_state = handle.await.unwrap().unwrap();
        assert_eq!(final_state.trace().len(), 3);
    }
}
