use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use stepcore::{ErrorInfo, ExecutionContext, ExecutionId, ExecutionStatus};
use tokio_util::sync::CancellationToken;

/// Status of one execution, as returned by polling queries
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRecord {
    pub execution_id: ExecutionId,
    pub status: ExecutionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    /// Final context, set once the execution is terminal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<ExecutionContext>,
    #[serde(skip)]
    cancellation: CancellationToken,
}

/// In-memory directory of executions keyed by id
#[derive(Clone, Default)]
pub struct ExecutionStore {
    records: Arc<DashMap<ExecutionId, ExecutionRecord>>,
}

impl ExecutionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly submitted execution as `started`
    pub fn register(&self, execution_id: ExecutionId) {
        let now = Utc::now();
        self.records.insert(
            execution_id,
            ExecutionRecord {
                execution_id,
                status: ExecutionStatus::Started,
                created_at: now,
                updated_at: now,
                error: None,
                context: None,
                cancellation: CancellationToken::new(),
            },
        );
    }

    pub fn remove(&self, execution_id: ExecutionId) -> Option<ExecutionRecord> {
        self.records.remove(&execution_id).map(|(_, record)| record)
    }

    pub fn get(&self, execution_id: ExecutionId) -> Option<ExecutionRecord> {
        self.records.get(&execution_id).map(|r| r.clone())
    }

    pub fn contains(&self, execution_id: ExecutionId) -> bool {
        self.records.contains_key(&execution_id)
    }

    /// Move a `started` execution to `running`, returning its cancellation token
    pub fn mark_running(&self, execution_id: ExecutionId) -> Option<CancellationToken> {
        let mut record = self.records.get_mut(&execution_id)?;
        if record.status != ExecutionStatus::Started {
            return None;
        }
        record.status = ExecutionStatus::Running;
        record.updated_at = Utc::now();
        Some(record.cancellation.clone())
    }

    pub fn mark_succeeded(&self, execution_id: ExecutionId, context: ExecutionContext) {
        self.finish(execution_id, ExecutionStatus::Succeeded, None, context);
    }

    pub fn mark_failed(&self, execution_id: ExecutionId, error: ErrorInfo, context: ExecutionContext) {
        self.finish(execution_id, ExecutionStatus::Failed, Some(error), context);
    }

    fn finish(
        &self,
        execution_id: ExecutionId,
        status: ExecutionStatus,
        error: Option<ErrorInfo>,
        context: ExecutionContext,
    ) {
        if let Some(mut record) = self.records.get_mut(&execution_id) {
            record.status = status;
            record.updated_at = Utc::now();
            record.error = error;
            record.context = Some(context);
        }
    }

    /// Signal cancellation. Returns false if the execution is unknown or
    /// already finished.
    pub fn cancel(&self, execution_id: ExecutionId) -> bool {
        match self.records.get(&execution_id) {
            Some(record) if !record.status.is_terminal() => {
                record.cancellation.cancel();
                true
            }
            _ => false,
        }
    }

    /// Remove finished executions last updated before `cutoff`, returning
    /// their ids. Running executions are never evicted.
    pub fn evict_finished(&self, cutoff: DateTime<Utc>) -> Vec<ExecutionId> {
        let mut evicted = Vec::new();
        self.records.retain(|execution_id, record| {
            let expired = record.status.is_terminal() && record.updated_at <= cutoff;
            if expired {
                evicted.push(*execution_id);
            }
            !expired
        });
        evicted
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn lifecycle() {
        let store = ExecutionStore::new();
        let id = Uuid::now_v7();
        store.register(id);
        assert_eq!(store.get(id).unwrap().status, ExecutionStatus::Started);

        let token = store.mark_running(id).unwrap();
        assert!(store.mark_running(id).is_none());
        assert!(store.cancel(id));
        assert!(token.is_cancelled());

        store.mark_failed(
            id,
            ErrorInfo {
                kind: "CANCELLED".into(),
                message: "Cancelled".into(),
            },
            ExecutionContext::default(),
        );
        let record = store.get(id).unwrap();
        assert_eq!(record.status, ExecutionStatus::Failed);
        assert!(record.context.is_some());
        assert!(!store.cancel(id));
    }

    #[test]
    fn evicts_only_finished_records() {
        let store = ExecutionStore::new();
        let (done, running, waiting) = (Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7());
        for id in [done, running, waiting] {
            store.register(id);
        }
        store.mark_running(done);
        store.mark_succeeded(done, ExecutionContext::default());
        store.mark_running(running);

        let cutoff = Utc::now();
        assert!(store.evict_finished(cutoff - chrono::Duration::hours(1)).is_empty());

        assert_eq!(store.evict_finished(cutoff), vec![done]);
        assert!(store.get(done).is_none());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn unknown_executions() {
        let store = ExecutionStore::new();
        let id = Uuid::now_v7();
        assert!(store.get(id).is_none());
        assert!(store.mark_running(id).is_none());
        assert!(!store.cancel(id));
    }
}
