use crate::context::INPUT_KEY;
use crate::WorkflowError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Complete workflow definition: a directed graph of nodes and edges
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Workflow {
    pub nodes: Vec<NodeSpec>,
    pub edges: Vec<Edge>,
}

impl Workflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: NodeSpec) -> String {
        let id = node.id.clone();
        self.nodes.push(node);
        id
    }

    /// Connect `source` to `target`, optionally through named handles
    pub fn connect(
        &mut self,
        source: impl Into<String>,
        source_handle: Option<&str>,
        target: impl Into<String>,
        target_handle: Option<&str>,
    ) {
        self.edges.push(Edge {
            id: None,
            source: source.into(),
            target: target.into(),
            source_handle: source_handle.map(str::to_string),
            target_handle: target_handle.map(str::to_string),
        });
    }

    /// Edges arriving at `node_id`
    pub fn incoming<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.target == node_id)
    }

    /// Edges leaving `node_id`
    pub fn outgoing<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.source == node_id)
    }

    /// Check structural invariants. Acyclicity is checked by the planner.
    pub fn validate(&self) -> Result<(), WorkflowError> {
        if self.nodes.is_empty() {
            return Err(WorkflowError::Empty);
        }

        let mut ids = HashSet::with_capacity(self.nodes.len());
        for node in &self.nodes {
            if node.id == INPUT_KEY {
                return Err(WorkflowError::ReservedNodeId(node.id.clone()));
            }
            if !ids.insert(node.id.as_str()) {
                return Err(WorkflowError::DuplicateNode(node.id.clone()));
            }
        }

        for edge in &self.edges {
            if !ids.contains(edge.source.as_str()) || !ids.contains(edge.target.as_str()) {
                return Err(WorkflowError::InvalidEdge {
                    from: edge.source.clone(),
                    to: edge.target.clone(),
                });
            }
        }

        Ok(())
    }
}

/// Node specification in a workflow
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeSpec {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    /// Type-specific configuration
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

impl NodeSpec {
    pub fn new(id: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            data: serde_json::Value::Null,
            position: None,
        }
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        if !self.data.is_object() {
            self.data = serde_json::Value::Object(Default::default());
        }
        if let Some(map) = self.data.as_object_mut() {
            map.insert(key.into(), value.into());
        }
        self
    }

    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = Some(Position { x, y });
        self
    }
}

/// Directed connection between two node handles
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,
}

/// Node position in visual editor
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_editor_shape() {
        let workflow: Workflow = serde_json::from_value(json!({
            "nodes": [
                {"id": "n1", "type": "parameters", "position": {"x": 10.0, "y": 20.0}},
                {"id": "n2", "type": "debug.log", "data": {"message": "hi"}}
            ],
            "edges": [
                {"id": "e1", "source": "n1", "target": "n2", "sourceHandle": "out", "targetHandle": "in"}
            ]
        }))
        .unwrap();

        assert_eq!(workflow.nodes[0].node_type, "parameters");
        assert!(workflow.nodes[0].data.is_null());
        assert_eq!(workflow.edges[0].source_handle.as_deref(), Some("out"));
        assert_eq!(workflow.incoming("n2").count(), 1);
        assert_eq!(workflow.outgoing("n2").count(), 0);
        assert!(workflow.validate().is_ok());
    }

    #[test]
    fn rejects_dangling_edge() {
        let mut workflow = Workflow::new();
        workflow.add_node(NodeSpec::new("a", "parameters"));
        workflow.connect("a", None, "missing", None);

        assert_eq!(
            workflow.validate(),
            Err(WorkflowError::InvalidEdge {
                from: "a".into(),
                to: "missing".into()
            })
        );
    }

    #[test]
    fn rejects_duplicate_and_reserved_ids() {
        let mut workflow = Workflow::new();
        workflow.add_node(NodeSpec::new("a", "parameters"));
        workflow.add_node(NodeSpec::new("a", "debug.log"));
        assert_eq!(workflow.validate(), Err(WorkflowError::DuplicateNode("a".into())));

        let mut workflow = Workflow::new();
        workflow.add_node(NodeSpec::new("input", "parameters"));
        assert_eq!(
            workflow.validate(),
            Err(WorkflowError::ReservedNodeId("input".into()))
        );

        assert_eq!(Workflow::new().validate(), Err(WorkflowError::Empty));
    }

    #[test]
    fn with_data_builds_object() {
        let node = NodeSpec::new("d", "time.delay").with_data("delay_ms", 5);
        assert_eq!(node.data, json!({"delay_ms": 5}));
    }
}
