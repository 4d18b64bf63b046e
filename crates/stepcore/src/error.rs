use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NodeError {
    #[error("Missing required input: {0}")]
    MissingInput(String),

    #[error("Invalid input type for '{field}': expected {expected}, got {actual}")]
    InvalidInputType {
        field: String,
        expected: String,
        actual: String,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    #[error("Timeout after {millis}ms")]
    Timeout { millis: u64 },

    #[error("Cancelled")]
    Cancelled,
}

impl NodeError {
    /// Stable identifier reported in `node_failed` payloads
    pub fn kind(&self) -> &'static str {
        match self {
            NodeError::MissingInput(_) => "MISSING_INPUT",
            NodeError::InvalidInputType { .. } => "INVALID_INPUT_TYPE",
            NodeError::Configuration(_) => "INVALID_CONFIG",
            NodeError::ExecutionFailed(_) => "EXECUTION_FAILED",
            NodeError::UnknownNodeType(_) => "UNKNOWN_NODE_TYPE",
            NodeError::Timeout { .. } => "TIMEOUT",
            NodeError::Cancelled => "CANCELLED",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WorkflowError {
    #[error("Workflow has no nodes")]
    Empty,

    #[error("Duplicate node id: {0}")]
    DuplicateNode(String),

    #[error("Node id '{0}' is reserved")]
    ReservedNodeId(String),

    #[error("Edge references unknown node: source={from}, target={to}")]
    InvalidEdge { from: String, to: String },

    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Cyclic dependency detected")]
    CyclicDependency,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ContextError {
    #[error("Result for node '{0}' is already recorded")]
    AlreadyRecorded(String),
}
