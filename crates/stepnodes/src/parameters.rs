use async_trait::async_trait;
use serde_json::Value;
use stepcore::{JsonMap, NodeError, NodeHandler, NodeInput};

pub(crate) const NODE_TYPE: &str = "parameters";

/// Publishes the execution input as this node's result.
///
/// Output is `{processed: true}` merged with `data.values` and then the
/// execution input; input fields win over configured values.
pub struct ParametersNode;

#[async_trait]
impl NodeHandler for ParametersNode {
    fn node_type(&self) -> &'static str {
        NODE_TYPE
    }

    async fn execute(&self, input: NodeInput<'_>) -> Result<Value, NodeError> {
        let mut output = JsonMap::new();
        output.insert("processed".to_string(), Value::Bool(true));

        match input.config("values") {
            None | Some(Value::Null) => {}
            Some(Value::Object(values)) => {
                output.extend(values.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            Some(_) => {
                return Err(NodeError::Configuration(
                    "'values' must be an object".to_string(),
                ))
            }
        }

        output.extend(
            input
                .context
                .input()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );

        Ok(Value::Object(output))
    }
}
