//! Live-update events pushed to clients watching an execution.

use crate::{ExecutionId, NodeError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One lifecycle notification, as sent over the live-update channel:
/// `{"event": ..., "data": {...}, "executionId": ..., "sequence": n}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEvent {
    #[serde(flatten)]
    pub kind: UpdateKind,
    pub execution_id: ExecutionId,
    /// Per-execution sequence number, starting at 1
    pub sequence: u64,
}

impl UpdateEvent {
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// True for the last event an execution emits
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.kind,
            UpdateKind::ExecutionCompleted { .. } | UpdateKind::ExecutionFailed { .. }
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum UpdateKind {
    #[serde(rename_all = "camelCase")]
    NodeStarted {
        node_id: String,
        node_type: String,
        timestamp: DateTime<Utc>,
    },
    #[serde(rename_all = "camelCase")]
    NodeCompleted {
        node_id: String,
        node_type: String,
        output: serde_json::Value,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },
    #[serde(rename_all = "camelCase")]
    NodeFailed {
        node_id: String,
        node_type: String,
        error: ErrorInfo,
        timestamp: DateTime<Utc>,
    },
    #[serde(rename_all = "camelCase")]
    ExecutionCompleted {
        nodes_completed: usize,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },
    #[serde(rename_all = "camelCase")]
    ExecutionFailed {
        #[serde(skip_serializing_if = "Option::is_none")]
        node_id: Option<String>,
        error: ErrorInfo,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },
}

impl UpdateKind {
    pub fn name(&self) -> &'static str {
        match self {
            UpdateKind::NodeStarted { .. } => "node_started",
            UpdateKind::NodeCompleted { .. } => "node_completed",
            UpdateKind::NodeFailed { .. } => "node_failed",
            UpdateKind::ExecutionCompleted { .. } => "execution_completed",
            UpdateKind::ExecutionFailed { .. } => "execution_failed",
        }
    }

    /// Node id the event refers to, if any
    pub fn node_id(&self) -> Option<&str> {
        match self {
            UpdateKind::NodeStarted { node_id, .. }
            | UpdateKind::NodeCompleted { node_id, .. }
            | UpdateKind::NodeFailed { node_id, .. } => Some(node_id),
            UpdateKind::ExecutionFailed { node_id, .. } => node_id.as_deref(),
            UpdateKind::ExecutionCompleted { .. } => None,
        }
    }
}

/// Error kind and message as reported to clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorInfo {
    pub kind: String,
    pub message: String,
}

impl From<&NodeError> for ErrorInfo {
    fn from(err: &NodeError) -> Self {
        Self {
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}
