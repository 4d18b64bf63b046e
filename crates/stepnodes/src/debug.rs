use async_trait::async_trait;
use serde_json::{json, Value};
use stepcore::{NodeError, NodeHandler, NodeInput};

pub(crate) const NODE_TYPE: &str = "debug.log";

/// Simple debug node that logs its inputs
pub struct DebugNode;

#[async_trait]
impl NodeHandler for DebugNode {
    fn node_type(&self) -> &'static str {
        NODE_TYPE
    }

    async fn execute(&self, input: NodeInput<'_>) -> Result<Value, NodeError> {
        let message = input.config_str("message").unwrap_or("(no message)");

        tracing::info!(
            execution_id = %input.execution_id,
            node_id = %input.node.id,
            "DEBUG: {}",
            message
        );

        // Also log all inputs for visibility
        for (key, value) in &input.inputs {
            tracing::info!(node_id = %input.node.id, "  {}: {}", key, value);
        }

        Ok(json!({
            "message": message,
            "inputs": input.inputs,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stepcore::{ExecutionContext, NodeSpec, RequestContext};
    use uuid::Uuid;

    #[tokio::test]
    async fn echoes_message_and_inputs() {
        let node = NodeSpec::new("log", NODE_TYPE).with_data("message", "hello");
        let ctx = ExecutionContext::default();
        let request = RequestContext::default();
        let mut inputs = stepcore::JsonMap::new();
        inputs.insert("n1".into(), json!({"processed": true}));

        let output = DebugNode
            .execute(NodeInput::new(Uuid::now_v7(), &node, &ctx, &request).with_inputs(inputs))
            .await
            .unwrap();

        assert_eq!(output["message"], "hello");
        assert_eq!(output["inputs"]["n1"]["processed"], true);
    }
}
