use crate::dispatch::HandoffPayload;
use crate::emitter::UpdateEmitter;
use crate::executor::NodeExecutor;
use crate::graph::ExecutionPlan;
use crate::store::ExecutionStore;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use stepcore::{ErrorInfo, ExecutionContext, ExecutionId, NodeError, UpdateKind};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;

/// In-process step engine.
///
/// Pulls handoff payloads off the dispatcher queue and drives each
/// execution through its nodes one at a time.
#[derive(Clone)]
pub struct StepEngine {
    executor: NodeExecutor,
    emitter: UpdateEmitter,
    store: ExecutionStore,
    limiter: Arc<Semaphore>,
}

impl StepEngine {
    pub fn new(
        executor: NodeExecutor,
        emitter: UpdateEmitter,
        store: ExecutionStore,
        max_concurrent_executions: usize,
    ) -> Self {
        Self {
            executor,
            emitter,
            store,
            limiter: Arc::new(Semaphore::new(max_concurrent_executions.max(1))),
        }
    }

    /// Start the worker loop. It ends when every dispatcher is dropped.
    pub fn spawn(self, mut queue: mpsc::Receiver<HandoffPayload>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(payload) = queue.recv().await {
                let permit = match self.limiter.clone().acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => break,
                };
                let engine = self.clone();
                tokio::spawn(async move {
                    engine.run(payload).await;
                    drop(permit);
                });
            }
            tracing::info!("Step engine stopped");
        })
    }

    /// Drive one execution to a terminal state
    pub async fn run(&self, payload: HandoffPayload) {
        let HandoffPayload {
            execution_id,
            workflow,
            initial_input,
            request_context,
        } = payload;

        let Some(cancellation) = self.store.mark_running(execution_id) else {
            tracing::warn!(%execution_id, "Execution is not waiting to start, ignoring handoff");
            return;
        };

        tracing::info!(%execution_id, nodes = workflow.nodes.len(), "Starting workflow execution");

        let start = Instant::now();
        let mut context = ExecutionContext::new(initial_input);

        let plan = match ExecutionPlan::build(&workflow) {
            Ok(plan) => plan,
            Err(e) => {
                let error = ErrorInfo {
                    kind: "INVALID_STRUCTURE".to_string(),
                    message: e.to_string(),
                };
                self.fail(execution_id, None, error, context, start);
                return;
            }
        };

        for &index in plan.order() {
            let node = &workflow.nodes[index];

            if cancellation.is_cancelled() {
                let error = ErrorInfo::from(&NodeError::Cancelled);
                self.fail(execution_id, None, error, context, start);
                return;
            }

            if !plan.is_active(&workflow, &node.id, &context) {
                tracing::debug!(%execution_id, node_id = %node.id, "Skipping node on untaken branch");
                continue;
            }

            if let Err(e) = self
                .executor
                .process_node(
                    execution_id,
                    &workflow,
                    node,
                    &mut context,
                    &request_context,
                    &cancellation,
                )
                .await
            {
                self.fail(execution_id, Some(node.id.clone()), ErrorInfo::from(&e), context, start);
                return;
            }
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        let nodes_completed = context.len();
        tracing::info!(%execution_id, "Workflow completed: {} nodes in {}ms", nodes_completed, duration_ms);

        self.store.mark_succeeded(execution_id, context);
        self.emitter.emit(
            execution_id,
            UpdateKind::ExecutionCompleted {
                nodes_completed,
                duration_ms,
                timestamp: Utc::now(),
            },
        );
    }

    fn fail(
        &self,
        execution_id: ExecutionId,
        node_id: Option<String>,
        error: ErrorInfo,
        context: ExecutionContext,
        start: Instant,
    ) {
        let duration_ms = start.elapsed().as_millis() as u64;
        tracing::error!(%execution_id, "Workflow failed after {}ms: {}", duration_ms, error.message);

        self.store.mark_failed(execution_id, error.clone(), context);
        self.emitter.emit(
            execution_id,
            UpdateKind::ExecutionFailed {
                node_id,
                error,
                duration_ms,
                timestamp: Utc::now(),
            },
        );
    }
}
