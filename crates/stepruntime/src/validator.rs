use crate::graph::ExecutionPlan;
use crate::trigger::SubmitError;
use serde_json::Value;
use stepcore::{JsonMap, Workflow};

/// A submission that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub input: JsonMap,
    pub workflow: Workflow,
}

/// Check a submitted `{input, workflow: {nodes, edges}}` body.
///
/// The input shape is checked before the workflow, then presence of
/// `nodes` and `edges`, then the graph structure.
pub fn validate_submission(body: &Value) -> Result<Submission, SubmitError> {
    let input = match body.get("input") {
        Some(Value::Object(map)) => map.clone(),
        Some(Value::Array(_)) => {
            return Err(SubmitError::InvalidInput(
                "input must be an object, not an array".to_string(),
            ))
        }
        Some(_) => return Err(SubmitError::InvalidInput("input must be an object".to_string())),
        None => return Err(SubmitError::InvalidInput("input is required".to_string())),
    };

    let raw = body
        .get("workflow")
        .filter(|w| w.is_object())
        .ok_or_else(|| SubmitError::WorkflowNotFound("workflow is required".to_string()))?;

    for field in ["nodes", "edges"] {
        if !raw.get(field).is_some_and(Value::is_array) {
            return Err(SubmitError::WorkflowNotFound(format!(
                "workflow.{} must be an array",
                field
            )));
        }
    }

    let workflow: Workflow = serde_json::from_value(raw.clone())
        .map_err(|e| SubmitError::InvalidStructure(e.to_string()))?;
    workflow
        .validate()
        .map_err(|e| SubmitError::InvalidStructure(e.to_string()))?;
    ExecutionPlan::build(&workflow).map_err(|e| SubmitError::InvalidStructure(e.to_string()))?;

    Ok(Submission { input, workflow })
}
