use crate::{ContextError, JsonMap};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Key under which the initial input lives in the flat context view
pub const INPUT_KEY: &str = "input";

/// Accumulating result store for one execution, keyed by node id.
///
/// Results are append-only: once a node's result is recorded it is never
/// replaced or removed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExecutionContext {
    input: JsonMap,
    #[serde(flatten)]
    results: BTreeMap<String, NodeResult>,
}

/// Output of a completed node as stored in the context
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeResult {
    pub result: Value,
}

impl ExecutionContext {
    pub fn new(input: JsonMap) -> Self {
        Self {
            input,
            results: BTreeMap::new(),
        }
    }

    pub fn input(&self) -> &JsonMap {
        &self.input
    }

    pub fn result(&self, node_id: &str) -> Option<&NodeResult> {
        self.results.get(node_id)
    }

    /// Number of recorded node results
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Record a node's output under `context[node_id] = {result: output}`
    pub fn record(&mut self, node_id: impl Into<String>, output: Value) -> Result<&NodeResult, ContextError> {
        use std::collections::btree_map::Entry;

        match self.results.entry(node_id.into()) {
            Entry::Occupied(entry) => Err(ContextError::AlreadyRecorded(entry.key().clone())),
            Entry::Vacant(entry) => Ok(entry.insert(NodeResult { result: output })),
        }
    }

    /// Flat JSON view: `{"input": {...}, "<node id>": {"result": ...}}`
    pub fn as_value(&self) -> Value {
        let mut map = JsonMap::with_capacity(self.results.len() + 1);
        map.insert(INPUT_KEY.to_string(), Value::Object(self.input.clone()));
        for (node_id, result) in &self.results {
            let mut entry = JsonMap::new();
            entry.insert("result".to_string(), result.result.clone());
            map.insert(node_id.clone(), Value::Object(entry));
        }
        Value::Object(map)
    }
}

/// Request metadata carried from the submitting request into every node
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RequestContext {
    #[serde(default)]
    pub params: JsonMap,
    #[serde(default)]
    pub headers: JsonMap,
    #[serde(default)]
    pub body: Value,
}
