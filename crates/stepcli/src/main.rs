use anyhow::{bail, Context as _, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::path::PathBuf;
use stepcore::{NodeSpec, RequestContext, UpdateKind, Workflow};
use stepnodes::NodeKind;
use stepruntime::{ExecutionPlan, RuntimeConfig, StepRuntime};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stepflow")]
#[command(about = "Stepflow workflow CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a workflow file
    Run {
        /// Path to workflow JSON file
        #[arg(short, long)]
        file: PathBuf,

        /// Input data as JSON object
        #[arg(short, long)]
        input: Option<String>,

        /// Show verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Validate a workflow file
    Validate {
        /// Path to workflow JSON file
        file: PathBuf,
    },

    /// List available node types
    Nodes,

    /// Create a new example workflow
    Init {
        /// Output file path
        #[arg(short, long, default_value = "workflow.json")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            file,
            input,
            verbose,
        } => {
            let level = if verbose { "debug" } else { "info" };
            tracing_subscriber::fmt()
                .with_env_filter(
                    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
                )
                .init();

            run_workflow(file, input).await?;
        }

        Commands::Validate { file } => {
            validate_workflow(file)?;
        }

        Commands::Nodes => {
            list_nodes();
        }

        Commands::Init { output } => {
            create_example_workflow(output)?;
        }
    }

    Ok(())
}

fn load_workflow(file: &PathBuf) -> Result<Workflow> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not a workflow", file.display()))
}

async fn run_workflow(file: PathBuf, input: Option<String>) -> Result<()> {
    println!("Loading workflow from: {}", file.display());

    let workflow = load_workflow(&file)?;
    println!("   Nodes: {}", workflow.nodes.len());
    println!("   Edges: {}", workflow.edges.len());
    println!();

    let input: Value = match input {
        Some(text) => serde_json::from_str(&text).context("Input is not valid JSON")?,
        None => json!({}),
    };

    let runtime = StepRuntime::start(RuntimeConfig::default(), "ws://localhost/api/executions");
    let submission = json!({ "input": input, "workflow": workflow });

    let response = runtime
        .trigger()
        .start_workflow(&submission, RequestContext::default())
        .map_err(|e| anyhow::anyhow!("{}: {}", e.code(), e))?;
    let execution_id = response.execution_id;

    println!("Execution {}", execution_id);

    let mut subscription = runtime.emitter().subscribe(execution_id, 0);
    while let Some(event) = subscription.next().await {
        match &event.kind {
            UpdateKind::NodeStarted {
                node_id, node_type, ..
            } => {
                println!("  [{}] Starting node: {} ({})", event.sequence, node_id, node_type);
            }
            UpdateKind::NodeCompleted {
                node_id,
                duration_ms,
                ..
            } => {
                println!("  [{}] Node {} completed in {}ms", event.sequence, node_id, duration_ms);
            }
            UpdateKind::NodeFailed { node_id, error, .. } => {
                println!(
                    "  [{}] Node {} failed: {} ({})",
                    event.sequence, node_id, error.message, error.kind
                );
            }
            UpdateKind::ExecutionCompleted {
                nodes_completed,
                duration_ms,
                ..
            } => {
                println!(
                    "Workflow completed: {} nodes in {}ms",
                    nodes_completed, duration_ms
                );
            }
            UpdateKind::ExecutionFailed {
                error, duration_ms, ..
            } => {
                println!("Workflow failed after {}ms: {}", duration_ms, error.message);
            }
        }
        if event.is_terminal() {
            break;
        }
    }

    let record = runtime
        .store()
        .get(execution_id)
        .context("Execution record disappeared")?;

    if let Some(context) = &record.context {
        println!();
        println!("Context:");
        println!("{}", serde_json::to_string_pretty(context)?);
    }

    if record.status.is_terminal() && record.error.is_some() {
        bail!("execution {} {}", execution_id, record.status);
    }

    Ok(())
}

fn validate_workflow(file: PathBuf) -> Result<()> {
    println!("Validating workflow: {}", file.display());

    let workflow = load_workflow(&file)?;
    workflow.validate()?;
    let plan = ExecutionPlan::build(&workflow)?;

    for node in &workflow.nodes {
        if NodeKind::resolve(&node.node_type).is_err() {
            println!("   warning: node {} has unknown type {}", node.id, node.node_type);
        }
    }

    let order: Vec<&str> = plan
        .order()
        .iter()
        .map(|&index| workflow.nodes[index].id.as_str())
        .collect();

    println!("Workflow is valid:");
    println!("   Nodes: {}", workflow.nodes.len());
    println!("   Edges: {}", workflow.edges.len());
    println!("   Order: {}", order.join(" -> "));

    Ok(())
}

fn list_nodes() {
    println!("Available Node Types:");
    println!();

    for info in NodeKind::catalog() {
        println!("  - {} ({})", info.node_type, info.category);
        println!("    {}", info.description);
    }
}

fn create_example_workflow(output: PathBuf) -> Result<()> {
    let mut workflow = Workflow::new();

    let params = workflow.add_node(
        NodeSpec::new("params", "parameters")
            .with_data("values", json!({"threshold": 10}))
            .with_position(100.0, 100.0),
    );

    let check = workflow.add_node(
        NodeSpec::new("check", "condition")
            .with_data("field", "params.result.enabled")
            .with_data("equals", true)
            .with_position(300.0, 100.0),
    );

    let on = workflow.add_node(
        NodeSpec::new("enabled", "debug.log")
            .with_data("message", "Feature enabled")
            .with_position(500.0, 50.0),
    );

    let off = workflow.add_node(
        NodeSpec::new("disabled", "debug.log")
            .with_data("message", "Feature disabled")
            .with_position(500.0, 150.0),
    );

    workflow.connect(params, None, check.clone(), None);
    workflow.connect(check.clone(), Some("true"), on, None);
    workflow.connect(check, Some("false"), off, None);

    let json = serde_json::to_string_pretty(&workflow)?;
    std::fs::write(&output, json)?;

    println!("Created example workflow: {}", output.display());
    println!();
    println!("Run it with:");
    println!(
        "  stepflow run --file {} --input '{{\"enabled\": true}}'",
        output.display()
    );

    Ok(())
}
