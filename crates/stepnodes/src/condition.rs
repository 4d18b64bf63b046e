use crate::path::lookup_path;
use async_trait::async_trait;
use serde_json::{json, Value};
use stepcore::{NodeError, NodeHandler, NodeInput};

pub(crate) const NODE_TYPE: &str = "condition";

/// Branching node.
///
/// Looks up `data.field` (a dotted path into the flat context view, e.g.
/// `input.x` or `n1.result.status`) and compares it with `data.equals`.
/// Without `equals` the value is tested for truthiness. The result carries
/// `branch: "true" | "false"`, which selects the outgoing edges whose
/// `sourceHandle` matches.
pub struct ConditionNode;

#[async_trait]
impl NodeHandler for ConditionNode {
    fn node_type(&self) -> &'static str {
        NODE_TYPE
    }

    async fn execute(&self, input: NodeInput<'_>) -> Result<Value, NodeError> {
        let field = input
            .require_config("field")?
            .as_str()
            .ok_or_else(|| NodeError::Configuration("'field' must be a string".to_string()))?;

        let view = input.context.as_value();
        let value = lookup_path(&view, field).cloned().unwrap_or(Value::Null);

        let matched = match input.config("equals") {
            Some(expected) => &value == expected,
            None => is_truthy(&value),
        };

        Ok(json!({
            "branch": if matched { "true" } else { "false" },
            "value": value,
        }))
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(_) => true,
    }
}
