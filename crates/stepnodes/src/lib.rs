//! Standard node library
//!
//! Every node type stepflow can run is a variant of [`NodeKind`]. Resolving
//! an unknown type tag is an error rather than a silent fallback.

mod condition;
mod debug;
mod http;
mod parameters;
mod path;
mod time;

pub use condition::ConditionNode;
pub use debug::DebugNode;
pub use http::HttpRequestNode;
pub use parameters::ParametersNode;
pub use path::lookup_path;
pub use time::DelayNode;

use serde::Serialize;
use serde_json::Value;
use stepcore::{NodeError, NodeHandler, NodeInput};

/// Tagged union over the known node types
pub enum NodeKind {
    Parameters(ParametersNode),
    Condition(ConditionNode),
    Delay(DelayNode),
    Debug(DebugNode),
    HttpRequest(HttpRequestNode),
}

impl NodeKind {
    /// Resolve a node type tag to its handler
    pub fn resolve(node_type: &str) -> Result<Self, NodeError> {
        match node_type {
            parameters::NODE_TYPE => Ok(NodeKind::Parameters(ParametersNode)),
            condition::NODE_TYPE => Ok(NodeKind::Condition(ConditionNode)),
            time::NODE_TYPE => Ok(NodeKind::Delay(DelayNode)),
            debug::NODE_TYPE => Ok(NodeKind::Debug(DebugNode)),
            http::NODE_TYPE => Ok(NodeKind::HttpRequest(HttpRequestNode::new())),
            other => Err(NodeError::UnknownNodeType(other.to_string())),
        }
    }

    fn handler(&self) -> &dyn NodeHandler {
        match self {
            NodeKind::Parameters(node) => node,
            NodeKind::Condition(node) => node,
            NodeKind::Delay(node) => node,
            NodeKind::Debug(node) => node,
            NodeKind::HttpRequest(node) => node,
        }
    }

    pub fn node_type(&self) -> &'static str {
        self.handler().node_type()
    }

    pub async fn execute(&self, input: NodeInput<'_>) -> Result<Value, NodeError> {
        self.handler().execute(input).await
    }

    /// Description of every node type, for listings
    pub fn catalog() -> Vec<NodeTypeInfo> {
        vec![
            NodeTypeInfo {
                node_type: parameters::NODE_TYPE,
                category: "input",
                description: "Expose the execution input (plus configured defaults) as the node result",
            },
            NodeTypeInfo {
                node_type: condition::NODE_TYPE,
                category: "flow",
                description: "Select the 'true' or 'false' branch by testing a context value",
            },
            NodeTypeInfo {
                node_type: time::NODE_TYPE,
                category: "time",
                description: "Delay execution for specified milliseconds",
            },
            NodeTypeInfo {
                node_type: debug::NODE_TYPE,
                category: "debug",
                description: "Logs input values for debugging",
            },
            NodeTypeInfo {
                node_type: http::NODE_TYPE,
                category: "http",
                description: "Make HTTP requests",
            },
        ]
    }
}

/// Metadata about a node type
#[derive(Debug, Clone, Serialize)]
pub struct NodeTypeInfo {
    #[serde(rename = "type")]
    pub node_type: &'static str,
    pub category: &'static str,
    pub description: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_every_catalog_entry() {
        for info in NodeKind::catalog() {
            let kind = NodeKind::resolve(info.node_type).unwrap();
            assert_eq!(kind.node_type(), info.node_type);
        }
    }

    #[test]
    fn unknown_type_is_an_error() {
        match NodeKind::resolve("email.send") {
            Err(NodeError::UnknownNodeType(t)) => assert_eq!(t, "email.send"),
            _ => panic!("expected UnknownNodeType"),
        }
    }
}
