use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the runtime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Handoff payloads that may wait for the engine before submissions fail
    pub queue_capacity: usize,
    pub max_concurrent_executions: usize,
    /// Upper bound on a single node's run time; 0 disables the limit
    pub node_timeout_ms: u64,
    /// Events kept per execution for replay
    pub event_log_capacity: usize,
    pub live_channel_capacity: usize,
    /// How long a finished execution stays queryable before it is evicted
    pub completed_retention_ms: u64,
    /// How often finished executions are swept
    pub sweep_interval_ms: u64,
}

impl RuntimeConfig {
    pub fn node_timeout(&self) -> Option<Duration> {
        (self.node_timeout_ms > 0).then(|| Duration::from_millis(self.node_timeout_ms))
    }

    pub fn completed_retention(&self) -> Duration {
        Duration::from_millis(self.completed_retention_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms.max(1))
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
            max_concurrent_executions: 64,
            node_timeout_ms: 30_000,
            event_log_capacity: 1000,
            live_channel_capacity: 256,
            completed_retention_ms: 3_600_000,
            sweep_interval_ms: 60_000,
        }
    }
}
