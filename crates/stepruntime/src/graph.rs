use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use stepcore::{Edge, ExecutionContext, Workflow, WorkflowError};

/// Field a node result uses to pick which outgoing handle fires
const BRANCH_FIELD: &str = "branch";

/// Order in which the step engine visits a workflow's nodes
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    /// Indices into `Workflow::nodes`, topologically sorted
    order: Vec<usize>,
}

impl ExecutionPlan {
    /// Build a plan from a workflow, rejecting cycles
    pub fn build(workflow: &Workflow) -> Result<Self, WorkflowError> {
        let mut graph: DiGraph<usize, ()> = DiGraph::new();
        let mut node_to_index: HashMap<&str, NodeIndex> = HashMap::new();

        for (position, node) in workflow.nodes.iter().enumerate() {
            let idx = graph.add_node(position);
            node_to_index.insert(node.id.as_str(), idx);
        }

        for edge in &workflow.edges {
            let from_idx = node_to_index
                .get(edge.source.as_str())
                .ok_or_else(|| WorkflowError::NodeNotFound(edge.source.clone()))?;
            let to_idx = node_to_index
                .get(edge.target.as_str())
                .ok_or_else(|| WorkflowError::NodeNotFound(edge.target.clone()))?;

            graph.add_edge(*from_idx, *to_idx, ());
        }

        let sorted = toposort(&graph, None).map_err(|_| WorkflowError::CyclicDependency)?;

        Ok(Self {
            order: sorted.into_iter().map(|idx| graph[idx]).collect(),
        })
    }

    /// Node positions in execution order
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Whether `node_id` should run given the results recorded so far.
    ///
    /// Entry nodes always run. Other nodes run when at least one incoming
    /// edge is taken.
    pub fn is_active(&self, workflow: &Workflow, node_id: &str, context: &ExecutionContext) -> bool {
        let mut incoming = workflow.incoming(node_id).peekable();
        if incoming.peek().is_none() {
            return true;
        }
        incoming.any(|edge| edge_taken(edge, context))
    }
}

/// An edge is taken once its source has a result, unless that result names
/// a different branch than the edge's source handle.
pub fn edge_taken(edge: &Edge, context: &ExecutionContext) -> bool {
    let Some(source) = context.result(&edge.source) else {
        return false;
    };

    match (&edge.source_handle, source.result.get(BRANCH_FIELD)) {
        (Some(handle), Some(serde_json::Value::String(branch))) => handle == branch,
        _ => true,
    }
}
