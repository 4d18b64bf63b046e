use serde_json::json;
use stepcore::{ExecutionContext, NodeError, NodeInput, NodeSpec, RequestContext};
use stepnodes::NodeKind;
use uuid::Uuid;

fn context(input: serde_json::Value) -> ExecutionContext {
    ExecutionContext::new(input.as_object().cloned().unwrap_or_default())
}

#[tokio::test]
async fn parameters_node_marks_input_processed() {
    let node = NodeSpec::new("n1", "parameters");
    let ctx = context(json!({"x": 1}));
    let request = RequestContext::default();

    let kind = NodeKind::resolve(&node.node_type).unwrap();
    let output = kind
        .execute(NodeInput::new(Uuid::now_v7(), &node, &ctx, &request))
        .await
        .unwrap();

    assert_eq!(output, json!({"processed": true, "x": 1}));
}

#[tokio::test]
async fn condition_reads_earlier_results() {
    let mut ctx = context(json!({}));
    ctx.record("fetch", json!({"status": 404})).unwrap();
    let request = RequestContext::default();

    let node = NodeSpec::new("check", "condition")
        .with_data("field", "fetch.result.status")
        .with_data("equals", 200);

    let output = NodeKind::resolve("condition")
        .unwrap()
        .execute(NodeInput::new(Uuid::now_v7(), &node, &ctx, &request))
        .await
        .unwrap();

    assert_eq!(output["branch"], "false");
    assert_eq!(output["value"], 404);
}

#[test]
fn catalog_lists_unique_types() {
    let catalog = NodeKind::catalog();
    let mut types: Vec<_> = catalog.iter().map(|info| info.node_type).collect();
    types.sort();
    types.dedup();
    assert_eq!(types.len(), catalog.len());
    assert!(matches!(
        NodeKind::resolve("Parameters"),
        Err(NodeError::UnknownNodeType(_))
    ));
}
