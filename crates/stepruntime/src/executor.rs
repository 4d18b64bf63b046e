use crate::emitter::UpdateEmitter;
use crate::graph::edge_taken;
use chrono::Utc;
use serde_json::Value;
use std::time::{Duration, Instant};
use stepcore::{
    ErrorInfo, ExecutionContext, ExecutionId, JsonMap, NodeError, NodeInput, NodeSpec,
    RequestContext, UpdateKind, Workflow,
};
use stepnodes::NodeKind;
use tokio_util::sync::CancellationToken;

/// Runs a single node and reports its lifecycle
#[derive(Clone)]
pub struct NodeExecutor {
    emitter: UpdateEmitter,
    node_timeout: Option<Duration>,
}

impl NodeExecutor {
    /// `node_timeout` of `None` lets nodes run until they finish or are cancelled
    pub fn new(emitter: UpdateEmitter, node_timeout: Option<Duration>) -> Self {
        Self {
            emitter,
            node_timeout,
        }
    }

    /// Run `node` and record its output in `context`.
    ///
    /// Emits `node_started`, then exactly one of `node_completed` or
    /// `node_failed`. A node that already has a result is not run again;
    /// its recorded result is returned and nothing is emitted.
    pub async fn process_node(
        &self,
        execution_id: ExecutionId,
        workflow: &Workflow,
        node: &NodeSpec,
        context: &mut ExecutionContext,
        request: &RequestContext,
        cancellation: &CancellationToken,
    ) -> Result<Value, NodeError> {
        if let Some(existing) = context.result(&node.id) {
            tracing::debug!(%execution_id, node_id = %node.id, "Node already completed, reusing result");
            return Ok(existing.result.clone());
        }

        self.emitter.emit(
            execution_id,
            UpdateKind::NodeStarted {
                node_id: node.id.clone(),
                node_type: node.node_type.clone(),
                timestamp: Utc::now(),
            },
        );

        let start = Instant::now();
        let outcome = self
            .invoke(execution_id, workflow, node, context, request, cancellation)
            .await
            .and_then(|output| {
                context
                    .record(node.id.clone(), output.clone())
                    .map_err(|e| NodeError::ExecutionFailed(e.to_string()))?;
                Ok(output)
            });
        let duration_ms = start.elapsed().as_millis() as u64;

        match &outcome {
            Ok(output) => {
                tracing::info!(%execution_id, node_id = %node.id, "Node completed in {}ms", duration_ms);
                self.emitter.emit(
                    execution_id,
                    UpdateKind::NodeCompleted {
                        node_id: node.id.clone(),
                        node_type: node.node_type.clone(),
                        output: output.clone(),
                        duration_ms,
                        timestamp: Utc::now(),
                    },
                );
            }
            Err(e) => {
                tracing::error!(%execution_id, node_id = %node.id, "Node failed: {}", e);
                self.emitter.emit(
                    execution_id,
                    UpdateKind::NodeFailed {
                        node_id: node.id.clone(),
                        node_type: node.node_type.clone(),
                        error: ErrorInfo::from(e),
                        timestamp: Utc::now(),
                    },
                );
            }
        }

        outcome
    }

    async fn invoke(
        &self,
        execution_id: ExecutionId,
        workflow: &Workflow,
        node: &NodeSpec,
        context: &ExecutionContext,
        request: &RequestContext,
        cancellation: &CancellationToken,
    ) -> Result<Value, NodeError> {
        let kind = NodeKind::resolve(&node.node_type)?;

        let input = NodeInput::new(execution_id, node, context, request)
            .with_inputs(collect_inputs(workflow, &node.id, context))
            .with_cancellation(cancellation.child_token());

        let run = async {
            match self.node_timeout {
                Some(limit) => tokio::time::timeout(limit, kind.execute(input))
                    .await
                    .unwrap_or(Err(NodeError::Timeout {
                        millis: limit.as_millis() as u64,
                    })),
                None => kind.execute(input).await,
            }
        };

        tokio::select! {
            _ = cancellation.cancelled() => Err(NodeError::Cancelled),
            result = run => result,
        }
    }
}

/// Collect inputs for a node from its predecessors.
///
/// Each taken incoming edge contributes the source's result, keyed by the
/// edge's target handle or, without one, by the source node id.
fn collect_inputs(workflow: &Workflow, node_id: &str, context: &ExecutionContext) -> JsonMap {
    workflow
        .incoming(node_id)
        .filter(|edge| edge_taken(edge, context))
        .filter_map(|edge| {
            let source = context.result(&edge.source)?;
            let key = edge.target_handle.clone().unwrap_or_else(|| edge.source.clone());
            Some((key, source.result.clone()))
        })
        .collect()
}
