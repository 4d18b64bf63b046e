use serde::{Deserialize, Serialize};
use stepcore::{ExecutionId, JsonMap, RequestContext, Workflow};
use thiserror::Error;
use tokio::sync::mpsc;

/// Everything the step engine needs to run one execution
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HandoffPayload {
    pub execution_id: ExecutionId,
    pub workflow: Workflow,
    pub initial_input: JsonMap,
    pub request_context: RequestContext,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DispatchError {
    #[error("execution queue is full")]
    QueueFull,

    #[error("step engine is not running")]
    EngineStopped,
}

/// One-way handoff to a step engine.
///
/// Implementations must not wait for the execution to finish; a successful
/// return only means the payload was accepted.
pub trait Dispatcher: Send + Sync {
    fn dispatch(&self, payload: HandoffPayload) -> Result<(), DispatchError>;
}

/// Dispatcher feeding the in-process engine through a bounded queue
#[derive(Clone)]
pub struct ChannelDispatcher {
    sender: mpsc::Sender<HandoffPayload>,
}

impl ChannelDispatcher {
    pub fn new(sender: mpsc::Sender<HandoffPayload>) -> Self {
        Self { sender }
    }
}

impl Dispatcher for ChannelDispatcher {
    fn dispatch(&self, payload: HandoffPayload) -> Result<(), DispatchError> {
        self.sender.try_send(payload).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DispatchError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => DispatchError::EngineStopped,
        })
    }
}
