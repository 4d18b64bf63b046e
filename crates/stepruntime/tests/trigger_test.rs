use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use stepcore::{ExecutionStatus, RequestContext};
use stepruntime::{
    DispatchError, Dispatcher, ExecutionStore, HandoffPayload, SubmitError, WorkflowTrigger,
};

/// Dispatcher that remembers what it was handed
#[derive(Default)]
struct RecordingDispatcher {
    payloads: Mutex<Vec<HandoffPayload>>,
}

impl Dispatcher for RecordingDispatcher {
    fn dispatch(&self, payload: HandoffPayload) -> Result<(), DispatchError> {
        self.payloads.lock().unwrap().push(payload);
        Ok(())
    }
}

struct FailingDispatcher;

impl Dispatcher for FailingDispatcher {
    fn dispatch(&self, _payload: HandoffPayload) -> Result<(), DispatchError> {
        Err(DispatchError::EngineStopped)
    }
}

fn single_node_body() -> Value {
    json!({
        "input": {"x": 1},
        "workflow": {"nodes": [{"id": "n1", "type": "parameters"}], "edges": []}
    })
}

fn trigger_with(dispatcher: Arc<dyn Dispatcher>, store: ExecutionStore) -> WorkflowTrigger {
    WorkflowTrigger::new(dispatcher, store, "ws://localhost:3000/api/executions/")
}

#[test]
fn hands_off_valid_submission() {
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let store = ExecutionStore::new();
    let trigger = trigger_with(dispatcher.clone(), store.clone());

    let request = RequestContext {
        headers: json!({"x-user-id": "u1"}).as_object().cloned().unwrap(),
        ..Default::default()
    };
    let response = trigger.start_workflow(&single_node_body(), request.clone()).unwrap();

    assert_eq!(response.status, ExecutionStatus::Started);
    assert_eq!(
        response.websocket_url,
        format!("ws://localhost:3000/api/executions/{}/events", response.execution_id)
    );
    assert_eq!(
        store.get(response.execution_id).unwrap().status,
        ExecutionStatus::Started
    );

    let payloads = dispatcher.payloads.lock().unwrap();
    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0].execution_id, response.execution_id);
    assert_eq!(payloads[0].initial_input.get("x"), Some(&json!(1)));
    assert_eq!(payloads[0].workflow.nodes[0].id, "n1");
    assert_eq!(payloads[0].request_context, request);

    let body = serde_json::to_value(&response).unwrap();
    assert_eq!(body["status"], "started");
    assert!(body["executionId"].is_string());
    assert!(body["websocketUrl"].is_string());
}

#[test]
fn invalid_submissions_never_reach_the_engine() {
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let store = ExecutionStore::new();
    let trigger = trigger_with(dispatcher.clone(), store.clone());

    let err = trigger
        .start_workflow(
            &json!({"input": [1, 2], "workflow": {"nodes": [], "edges": []}}),
            RequestContext::default(),
        )
        .unwrap_err();
    assert_eq!(err.code(), "INVALID_INPUT");

    let err = trigger
        .start_workflow(
            &json!({"input": {}, "workflow": {"nodes": []}}),
            RequestContext::default(),
        )
        .unwrap_err();
    assert_eq!(err.code(), "WORKFLOW_NOT_FOUND");

    assert!(dispatcher.payloads.lock().unwrap().is_empty());
    assert!(store.is_empty());
}

#[test]
fn failed_handoff_is_internal_and_leaves_no_record() {
    let store = ExecutionStore::new();
    let trigger = trigger_with(Arc::new(FailingDispatcher), store.clone());

    let err = trigger
        .start_workflow(&single_node_body(), RequestContext::default())
        .unwrap_err();

    assert!(matches!(err, SubmitError::Internal(_)));
    assert_eq!(err.code(), "INTERNAL_SERVER_ERROR");
    assert!(!err.is_client_error());
    assert!(store.is_empty());
}

#[test]
fn execution_ids_are_unique_across_rapid_submissions() {
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let trigger = trigger_with(dispatcher, ExecutionStore::new());

    let ids: HashSet<_> = (0..500)
        .map(|_| {
            trigger
                .start_workflow(&single_node_body(), RequestContext::default())
                .unwrap()
                .execution_id
        })
        .collect();

    assert_eq!(ids.len(), 500);
}
