//! Workflow execution runtime
//!
//! This crate accepts workflow submissions, hands them off to the step
//! engine, runs nodes one at a time and publishes their lifecycle events to
//! live subscribers.

mod config;
mod dispatch;
mod emitter;
mod engine;
mod executor;
mod graph;
mod id;
mod runtime;
mod store;
mod trigger;
mod validator;

pub use config::RuntimeConfig;
pub use dispatch::{ChannelDispatcher, DispatchError, Dispatcher, HandoffPayload};
pub use emitter::{Subscription, UpdateEmitter};
pub use engine::StepEngine;
pub use executor::NodeExecutor;
pub use graph::{edge_taken, ExecutionPlan};
pub use id::next_execution_id;
pub use runtime::StepRuntime;
pub use store::{ExecutionRecord, ExecutionStore};
pub use trigger::{SubmitError, TriggerResponse, WorkflowTrigger};
pub use validator::{validate_submission, Submission};
