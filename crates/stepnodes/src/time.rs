use async_trait::async_trait;
use serde_json::{json, Value};
use stepcore::{NodeError, NodeHandler, NodeInput};
use tokio::time::{sleep, Duration};

pub(crate) const NODE_TYPE: &str = "time.delay";

const DEFAULT_DELAY_MS: u64 = 1000;

/// Delay execution for a specified duration
pub struct DelayNode;

#[async_trait]
impl NodeHandler for DelayNode {
    fn node_type(&self) -> &'static str {
        NODE_TYPE
    }

    async fn execute(&self, input: NodeInput<'_>) -> Result<Value, NodeError> {
        let delay_ms = input.config_u64("delay_ms").unwrap_or(DEFAULT_DELAY_MS);

        tracing::debug!(node_id = %input.node.id, "Delaying for {}ms", delay_ms);

        tokio::select! {
            _ = input.cancellation.cancelled() => Err(NodeError::Cancelled),
            _ = sleep(Duration::from_millis(delay_ms)) => Ok(json!({
                "delayedMs": delay_ms,
                "inputs": input.inputs,
            })),
        }
    }
}
