//! HTTP and WebSocket surface for stepflow
//!
//! Submissions arrive on `POST /api/workflows/execute` and are answered with
//! `202 Accepted` as soon as the step engine has the payload. Progress is
//! pushed over `GET /api/executions/{id}/events` (WebSocket) or polled with
//! `GET /api/executions/{id}`.

mod audit;
mod config;
mod error;
mod routes;
mod ws;

pub use audit::{AuditLog, AuditOutcome, AuditRecord};
pub use config::{ConfigError, ServerConfig, CONFIG_ENV};
pub use error::{ApiError, ErrorResponse};

use actix_web::web;
use std::sync::Arc;
use stepruntime::StepRuntime;

/// Application state shared across handlers
pub struct AppState {
    pub runtime: Arc<StepRuntime>,
    pub audit: AuditLog,
}

impl AppState {
    pub fn new(runtime: Arc<StepRuntime>, audit: AuditLog) -> Self {
        Self { runtime, audit }
    }
}

/// Register every route on an actix `App`
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(routes::health_check)
        .service(routes::start_workflow)
        .service(routes::execution_history)
        .service(ws::execution_events)
        .service(routes::get_execution)
        .service(routes::cancel_execution)
        .service(routes::list_node_types);
}
