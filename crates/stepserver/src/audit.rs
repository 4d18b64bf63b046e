//! Non-blocking audit trail.
//!
//! Handlers push records onto an unbounded channel; a background task
//! writes them under the `audit` tracing target.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    Success,
    Rejected,
    Failure,
}

impl fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AuditOutcome::Success => "success",
            AuditOutcome::Rejected => "rejected",
            AuditOutcome::Failure => "failure",
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    pub user: String,
    pub action: &'static str,
    pub outcome: AuditOutcome,
    pub detail: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone)]
pub struct AuditLog {
    sender: mpsc::UnboundedSender<AuditRecord>,
}

impl AuditLog {
    /// Create an audit log drained by a background task
    pub fn spawn() -> Self {
        let (log, mut receiver) = Self::channel();
        tokio::spawn(async move {
            while let Some(record) = receiver.recv().await {
                tracing::info!(
                    target: "audit",
                    user = %record.user,
                    action = record.action,
                    outcome = %record.outcome,
                    timestamp = %record.timestamp,
                    "{}",
                    record.detail
                );
            }
        });
        log
    }

    /// Create an audit log whose records are handed to the caller
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<AuditRecord>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    pub fn record(
        &self,
        user: impl Into<String>,
        action: &'static str,
        outcome: AuditOutcome,
        detail: impl Into<String>,
    ) {
        let record = AuditRecord {
            user: user.into(),
            action,
            outcome,
            detail: detail.into(),
            timestamp: Utc::now(),
        };
        if self.sender.send(record).is_err() {
            tracing::warn!("Audit log is closed, record dropped");
        }
    }
}
