//! Core abstractions for stepflow
//!
//! This crate provides the workflow graph, the execution context, the
//! live-update event model and the node handler seam. It has no runtime
//! dependencies.

mod context;
mod error;
pub mod events;
mod execution;
mod node;
mod workflow;

pub use context::{ExecutionContext, NodeResult, RequestContext, INPUT_KEY};
pub use error::{ContextError, NodeError, WorkflowError};
pub use events::{ErrorInfo, UpdateEvent, UpdateKind};
pub use execution::{ExecutionId, ExecutionStatus};
pub use node::{NodeHandler, NodeInput};
pub use workflow::{Edge, NodeSpec, Position, Workflow};

/// JSON object map used for inputs, params and node outputs
pub type JsonMap = serde_json::Map<String, serde_json::Value>;
