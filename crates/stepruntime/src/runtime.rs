use crate::dispatch::ChannelDispatcher;
use crate::{
    ExecutionStore, NodeExecutor, RuntimeConfig, StepEngine, UpdateEmitter, WorkflowTrigger,
};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use stepcore::ExecutionId;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Main runtime: trigger, step engine, update emitter and execution store
/// wired together.
pub struct StepRuntime {
    trigger: WorkflowTrigger,
    emitter: UpdateEmitter,
    store: ExecutionStore,
    engine: JoinHandle<()>,
    sweeper: JoinHandle<()>,
}

impl StepRuntime {
    /// Create the runtime and spawn its engine. Must be called inside a
    /// Tokio runtime.
    pub fn start(config: RuntimeConfig, websocket_base_url: impl Into<String>) -> Self {
        let emitter = UpdateEmitter::new(config.event_log_capacity, config.live_channel_capacity);
        let store = ExecutionStore::new();
        let executor = NodeExecutor::new(emitter.clone(), config.node_timeout());

        let (sender, queue) = mpsc::channel(config.queue_capacity.max(1));
        let engine = StepEngine::new(
            executor,
            emitter.clone(),
            store.clone(),
            config.max_concurrent_executions,
        )
        .spawn(queue);

        let trigger = WorkflowTrigger::new(
            Arc::new(ChannelDispatcher::new(sender)),
            store.clone(),
            websocket_base_url,
        );

        let sweeper = spawn_sweeper(
            store.clone(),
            emitter.clone(),
            config.completed_retention(),
            config.sweep_interval(),
        );

        tracing::info!(
            max_concurrent_executions = config.max_concurrent_executions,
            node_timeout_ms = config.node_timeout_ms,
            completed_retention_ms = config.completed_retention_ms,
            "Step runtime started"
        );

        Self {
            trigger,
            emitter,
            store,
            engine,
            sweeper,
        }
    }

    pub fn trigger(&self) -> &WorkflowTrigger {
        &self.trigger
    }

    pub fn emitter(&self) -> &UpdateEmitter {
        &self.emitter
    }

    pub fn store(&self) -> &ExecutionStore {
        &self.store
    }

    /// Signal cancellation to a running execution
    pub fn cancel(&self, execution_id: ExecutionId) -> bool {
        let cancelled = self.store.cancel(execution_id);
        if cancelled {
            tracing::info!(%execution_id, "Cancellation requested");
        }
        cancelled
    }

    pub fn is_engine_running(&self) -> bool {
        !self.engine.is_finished()
    }
}

impl Drop for StepRuntime {
    fn drop(&mut self) {
        self.engine.abort();
        self.sweeper.abort();
    }
}

/// Periodically evict finished executions older than `retention`, together
/// with their event logs.
fn spawn_sweeper(
    store: ExecutionStore,
    emitter: UpdateEmitter,
    retention: Duration,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let retention = chrono::Duration::from_std(retention).ok();
        let mut ticker = tokio::time::interval(interval);
        // The terminal event is emitted just after the record is finished,
        // so logs of the previous sweep are forgotten once more.
        let mut previous: Vec<ExecutionId> = Vec::new();
        loop {
            ticker.tick().await;

            let Some(cutoff) = retention.and_then(|r| Utc::now().checked_sub_signed(r)) else {
                continue;
            };
            let evicted = store.evict_finished(cutoff);
            for execution_id in previous.iter().chain(&evicted) {
                emitter.forget(*execution_id);
            }
            if !evicted.is_empty() {
                tracing::debug!(count = evicted.len(), "Evicted finished executions");
            }
            previous = evicted;
        }
    })
}
