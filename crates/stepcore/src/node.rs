use crate::{ExecutionContext, ExecutionId, JsonMap, NodeError, NodeSpec, RequestContext};
use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

/// Core trait that every node type implements
#[async_trait]
pub trait NodeHandler: Send + Sync {
    /// Type tag matched against `NodeSpec::node_type` (e.g. "parameters")
    fn node_type(&self) -> &'static str;

    /// Execute the node. The returned value is recorded as the node's result.
    async fn execute(&self, input: NodeInput<'_>) -> Result<Value, NodeError>;
}

/// Everything a node sees while it runs
pub struct NodeInput<'a> {
    pub execution_id: ExecutionId,

    pub node: &'a NodeSpec,

    /// Results of upstream nodes, keyed by target handle or source node id
    pub inputs: JsonMap,

    /// Results recorded so far in this execution
    pub context: &'a ExecutionContext,

    /// Metadata of the request that started the execution
    pub request: &'a RequestContext,

    /// Cancellation signal for long-running work
    pub cancellation: CancellationToken,
}

impl<'a> NodeInput<'a> {
    pub fn new(
        execution_id: ExecutionId,
        node: &'a NodeSpec,
        context: &'a ExecutionContext,
        request: &'a RequestContext,
    ) -> Self {
        Self {
            execution_id,
            node,
            inputs: JsonMap::new(),
            context,
            request,
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_inputs(mut self, inputs: JsonMap) -> Self {
        self.inputs = inputs;
        self
    }

    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// Get a configuration value from the node's `data`
    pub fn config(&self, name: &str) -> Option<&Value> {
        self.node.data.get(name)
    }

    /// Get required config or return error
    pub fn require_config(&self, name: &str) -> Result<&Value, NodeError> {
        self.config(name)
            .ok_or_else(|| NodeError::Configuration(format!("Missing config: {}", name)))
    }

    pub fn config_str(&self, name: &str) -> Option<&str> {
        self.config(name).and_then(Value::as_str)
    }

    pub fn config_u64(&self, name: &str) -> Option<u64> {
        self.config(name).and_then(Value::as_u64)
    }

    /// Get required upstream input or return error
    pub fn require_input(&self, name: &str) -> Result<&Value, NodeError> {
        self.inputs
            .get(name)
            .ok_or_else(|| NodeError::MissingInput(name.to_string()))
    }
}
