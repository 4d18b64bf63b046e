use crate::dispatch::{Dispatcher, HandoffPayload};
use crate::id::next_execution_id;
use crate::store::ExecutionStore;
use crate::validator::validate_submission;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use stepcore::{ExecutionId, ExecutionStatus, RequestContext};
use thiserror::Error;

/// Why a submission was refused
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubmitError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    WorkflowNotFound(String),

    #[error("{0}")]
    InvalidStructure(String),

    #[error("{0}")]
    Internal(String),
}

impl SubmitError {
    /// Error code reported to clients
    pub fn code(&self) -> &'static str {
        match self {
            SubmitError::InvalidInput(_) => "INVALID_INPUT",
            SubmitError::WorkflowNotFound(_) => "WORKFLOW_NOT_FOUND",
            SubmitError::InvalidStructure(_) => "INVALID_STRUCTURE",
            SubmitError::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    pub fn is_client_error(&self) -> bool {
        !matches!(self, SubmitError::Internal(_))
    }
}

/// Handle returned to the submitter
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TriggerResponse {
    pub execution_id: ExecutionId,
    pub status: ExecutionStatus,
    pub websocket_url: String,
}

/// Validates submissions and hands them to the step engine without waiting
#[derive(Clone)]
pub struct WorkflowTrigger {
    dispatcher: Arc<dyn Dispatcher>,
    store: ExecutionStore,
    websocket_base_url: String,
}

impl WorkflowTrigger {
    pub fn new(
        dispatcher: Arc<dyn Dispatcher>,
        store: ExecutionStore,
        websocket_base_url: impl Into<String>,
    ) -> Self {
        Self {
            dispatcher,
            store,
            websocket_base_url: websocket_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Start a workflow from a raw `{input, workflow}` body
    pub fn start_workflow(
        &self,
        body: &Value,
        request_context: RequestContext,
    ) -> Result<TriggerResponse, SubmitError> {
        let submission = validate_submission(body)?;
        let execution_id = next_execution_id();

        self.store.register(execution_id);

        let payload = HandoffPayload {
            execution_id,
            workflow: submission.workflow,
            initial_input: submission.input,
            request_context,
        };

        if let Err(e) = self.dispatcher.dispatch(payload) {
            self.store.remove(execution_id);
            tracing::error!(%execution_id, "Failed to hand off execution: {}", e);
            return Err(SubmitError::Internal(format!("failed to start execution: {}", e)));
        }

        tracing::info!(%execution_id, "Execution handed off");

        Ok(TriggerResponse {
            execution_id,
            status: ExecutionStatus::Started,
            websocket_url: self.websocket_url(execution_id),
        })
    }

    /// Live-update channel address for an execution
    pub fn websocket_url(&self, execution_id: ExecutionId) -> String {
        format!("{}/{}/events", self.websocket_base_url, execution_id)
    }
}
