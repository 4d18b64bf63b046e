use crate::audit::AuditOutcome;
use crate::error::ApiError;
use crate::AppState;
use actix_web::{delete, get, post, web, HttpRequest, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use stepcore::{JsonMap, RequestContext};
use stepnodes::NodeKind;
use stepruntime::SubmitError;
use tracing::{error, info, warn};
use uuid::Uuid;

const START_WORKFLOW: &str = "start_workflow";
const USER_HEADER: &str = "x-user-id";

#[derive(Debug, Deserialize)]
pub(crate) struct SinceQuery {
    #[serde(default)]
    pub since: u64,
}

/// Health check endpoint
#[get("/health")]
pub(crate) async fn health_check(data: web::Data<AppState>) -> impl Responder {
    let engine_running = data.runtime.is_engine_running();
    let body = serde_json::json!({
        "status": if engine_running { "healthy" } else { "degraded" },
        "version": env!("CARGO_PKG_VERSION"),
        "service": "stepflow"
    });

    if engine_running {
        HttpResponse::Ok().json(body)
    } else {
        HttpResponse::ServiceUnavailable().json(body)
    }
}

/// Submit a workflow for execution
#[post("/api/workflows/execute")]
pub(crate) async fn start_workflow(
    req: HttpRequest,
    body: web::Bytes,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let user = user_id(&req);

    let payload: Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            let err = SubmitError::InvalidInput(format!("Request body is not valid JSON: {}", e));
            data.audit
                .record(user, START_WORKFLOW, AuditOutcome::Rejected, err.to_string());
            return Err(err.into());
        }
    };

    let request_context = request_context(&req, &payload);

    match data.runtime.trigger().start_workflow(&payload, request_context) {
        Ok(response) => {
            info!(execution_id = %response.execution_id, %user, "Workflow started");
            data.audit.record(
                user,
                START_WORKFLOW,
                AuditOutcome::Success,
                format!("execution {}", response.execution_id),
            );
            Ok(HttpResponse::Accepted().json(response))
        }
        Err(e) => {
            let outcome = if e.is_client_error() {
                warn!(%user, "Workflow submission rejected: {}", e);
                AuditOutcome::Rejected
            } else {
                error!(%user, "Workflow submission failed: {}", e);
                AuditOutcome::Failure
            };
            data.audit
                .record(user, START_WORKFLOW, outcome, format!("{}: {}", e.code(), e));
            Err(e.into())
        }
    }
}

/// Current status of an execution
#[get("/api/executions/{id}")]
pub(crate) async fn get_execution(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let execution_id = path.into_inner();

    data.runtime
        .store()
        .get(execution_id)
        .map(|record| HttpResponse::Ok().json(record))
        .ok_or(ApiError::ExecutionNotFound(execution_id))
}

/// Request cancellation of a running execution
#[delete("/api/executions/{id}")]
pub(crate) async fn cancel_execution(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let execution_id = path.into_inner();

    if data.runtime.cancel(execution_id) {
        Ok(HttpResponse::Accepted().json(serde_json::json!({
            "executionId": execution_id,
            "message": "Cancellation requested"
        })))
    } else if data.runtime.store().contains(execution_id) {
        Err(ApiError::ExecutionFinished(execution_id))
    } else {
        Err(ApiError::ExecutionNotFound(execution_id))
    }
}

/// Logged updates after `since`, for clients that cannot hold a WebSocket
#[get("/api/executions/{id}/history")]
pub(crate) async fn execution_history(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
    query: web::Query<SinceQuery>,
) -> Result<HttpResponse, ApiError> {
    let execution_id = path.into_inner();

    if !data.runtime.store().contains(execution_id) {
        return Err(ApiError::ExecutionNotFound(execution_id));
    }

    let events = data.runtime.emitter().history(execution_id, query.since);
    Ok(HttpResponse::Ok().json(events))
}

/// List available node types
#[get("/api/nodes")]
pub(crate) async fn list_node_types() -> impl Responder {
    HttpResponse::Ok().json(NodeKind::catalog())
}

fn user_id(req: &HttpRequest) -> String {
    req.headers()
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .unwrap_or("anonymous")
        .to_string()
}

/// Build the request metadata handed to the step engine
fn request_context(req: &HttpRequest, body: &Value) -> RequestContext {
    let params: JsonMap = web::Query::<HashMap<String, String>>::from_query(req.query_string())
        .map(|query| {
            query
                .into_inner()
                .into_iter()
                .map(|(k, v)| (k, Value::String(v)))
                .collect()
        })
        .unwrap_or_default();

    let headers: JsonMap = req
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.to_string(), Value::String(v.to_string())))
        })
        .collect();

    RequestContext {
        params,
        headers,
        body: body.clone(),
    }
}
