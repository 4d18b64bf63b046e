use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use stepruntime::{RuntimeConfig, StepRuntime};
use stepserver::{AppState, AuditLog, AuditOutcome, AuditRecord, ErrorResponse};
use tokio::sync::mpsc::UnboundedReceiver;

const WS_BASE: &str = "ws://localhost:3000/api/executions";

fn state() -> (web::Data<AppState>, UnboundedReceiver<AuditRecord>) {
    let runtime = StepRuntime::start(RuntimeConfig::default(), WS_BASE);
    let (audit, records) = AuditLog::channel();
    (
        web::Data::new(AppState::new(Arc::new(runtime), audit)),
        records,
    )
}

fn example_submission() -> Value {
    json!({
        "input": {"x": 1},
        "workflow": {
            "nodes": [{"id": "n1", "type": "parameters"}],
            "edges": []
        }
    })
}

#[actix_web::test]
async fn health_reports_healthy() {
    let (data, _records) = state();
    let app = test::init_service(App::new().app_data(data).configure(stepserver::configure)).await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "healthy");
}

#[actix_web::test]
async fn accepted_submission_returns_handle() {
    let (data, _records) = state();
    let app = test::init_service(App::new().app_data(data).configure(stepserver::configure)).await;

    let req = test::TestRequest::post()
        .uri("/api/workflows/execute")
        .set_json(example_submission())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::ACCEPTED);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "started");
    let execution_id = body["executionId"].as_str().unwrap();
    assert_eq!(
        body["websocketUrl"].as_str().unwrap(),
        format!("{}/{}/events", WS_BASE, execution_id)
    );
}

#[actix_web::test]
async fn array_input_is_rejected() {
    let (data, _records) = state();
    let app = test::init_service(App::new().app_data(data).configure(stepserver::configure)).await;

    let req = test::TestRequest::post()
        .uri("/api/workflows/execute")
        .set_json(json!({
            "input": [1, 2],
            "workflow": {"nodes": [{"id": "n1", "type": "parameters"}], "edges": []}
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: ErrorResponse = test::read_body_json(resp).await;
    assert_eq!(body.error, "INVALID_INPUT");
}

#[actix_web::test]
async fn missing_workflow_is_rejected() {
    let (data, _records) = state();
    let app = test::init_service(App::new().app_data(data).configure(stepserver::configure)).await;

    let req = test::TestRequest::post()
        .uri("/api/workflows/execute")
        .set_json(json!({"input": {}}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: ErrorResponse = test::read_body_json(resp).await;
    assert_eq!(body.error, "WORKFLOW_NOT_FOUND");
}

#[actix_web::test]
async fn malformed_json_is_invalid_input() {
    let (data, _records) = state();
    let app = test::init_service(App::new().app_data(data).configure(stepserver::configure)).await;

    let req = test::TestRequest::post()
        .uri("/api/workflows/execute")
        .insert_header(("content-type", "application/json"))
        .set_payload("{\"input\": ")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: ErrorResponse = test::read_body_json(resp).await;
    assert_eq!(body.error, "INVALID_INPUT");
}

#[actix_web::test]
async fn every_submission_is_audited() {
    let (data, mut records) = state();
    let app = test::init_service(App::new().app_data(data).configure(stepserver::configure)).await;

    let req = test::TestRequest::post()
        .uri("/api/workflows/execute")
        .insert_header(("x-user-id", "alice"))
        .set_json(example_submission())
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::post()
        .uri("/api/workflows/execute")
        .set_json(json!({"input": 5}))
        .to_request();
    test::call_service(&app, req).await;

    let accepted = records.recv().await.unwrap();
    assert_eq!(accepted.user, "alice");
    assert_eq!(accepted.action, "start_workflow");
    assert_eq!(accepted.outcome, AuditOutcome::Success);

    let rejected = records.recv().await.unwrap();
    assert_eq!(rejected.user, "anonymous");
    assert_eq!(rejected.outcome, AuditOutcome::Rejected);
    assert!(rejected.detail.starts_with("INVALID_INPUT"));
}

#[actix_web::test]
async fn unknown_execution_is_not_found() {
    let (data, _records) = state();
    let app = test::init_service(App::new().app_data(data).configure(stepserver::configure)).await;

    let uri = format!("/api/executions/{}", uuid::Uuid::now_v7());
    let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let body: ErrorResponse = test::read_body_json(resp).await;
    assert_eq!(body.error, "EXECUTION_NOT_FOUND");
}

#[actix_web::test]
async fn finished_execution_can_be_polled() {
    let (data, _records) = state();
    let app = test::init_service(
        App::new()
            .app_data(data.clone())
            .configure(stepserver::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/workflows/execute")
        .set_json(example_submission())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let execution_id = body["executionId"].as_str().unwrap().to_string();

    let uri = format!("/api/executions/{}", execution_id);
    let mut record = Value::Null;
    for _ in 0..100 {
        let req = test::TestRequest::get().uri(&uri).to_request();
        record = test::call_and_read_body_json(&app, req).await;
        if record["status"] == "succeeded" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert_eq!(record["status"], "succeeded");
    assert_eq!(record["context"]["n1"]["result"], json!({"processed": true, "x": 1}));

    let req = test::TestRequest::get()
        .uri(&format!("/api/executions/{}/history?since=1", execution_id))
        .to_request();
    let history: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    let names: Vec<&str> = history
        .iter()
        .map(|e| e["event"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["node_completed", "execution_completed"]);

    // Cancelling a finished execution conflicts
    let req = test::TestRequest::delete().uri(&uri).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn node_catalog_lists_builtin_types() {
    let (data, _records) = state();
    let app = test::init_service(App::new().app_data(data).configure(stepserver::configure)).await;

    let req = test::TestRequest::get().uri("/api/nodes").to_request();
    let catalog: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    let types: Vec<&str> = catalog
        .iter()
        .map(|n| n["type"].as_str().unwrap())
        .collect();

    for expected in ["parameters", "condition", "time.delay", "debug.log", "http.request"] {
        assert!(types.contains(&expected), "missing {}", expected);
    }
}

#[actix_web::test]
async fn delete_cancels_a_running_execution() {
    let (data, _records) = state();
    let app = test::init_service(App::new().app_data(data).configure(stepserver::configure)).await;

    let req = test::TestRequest::post()
        .uri("/api/workflows/execute")
        .set_json(json!({
            "input": {},
            "workflow": {
                "nodes": [{"id": "wait", "type": "time.delay", "data": {"delay_ms": 60000}}],
                "edges": []
            }
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let execution_id = body["executionId"].as_str().unwrap().to_string();
    let uri = format!("/api/executions/{}", execution_id);

    let resp = test::call_service(&app, test::TestRequest::delete().uri(&uri).to_request()).await;
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["executionId"], execution_id.as_str());

    let mut record = Value::Null;
    for _ in 0..100 {
        let req = test::TestRequest::get().uri(&uri).to_request();
        record = test::call_and_read_body_json(&app, req).await;
        if record["status"] == "failed" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert_eq!(record["status"], "failed");
    assert_eq!(record["error"]["kind"], "CANCELLED");
}
