use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use std::sync::Arc;
use stepruntime::StepRuntime;
use stepserver::{AppState, AuditLog, ServerConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting stepflow server");

    let config = ServerConfig::load()?;

    let runtime = StepRuntime::start(config.runtime.clone(), config.websocket_base_url.clone());

    let app_state = web::Data::new(AppState::new(Arc::new(runtime), AuditLog::spawn()));

    info!("Server starting on http://{}", config.bind_address);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(app_state.clone())
            .wrap(cors)
            .wrap(actix_web::middleware::Logger::default())
            .configure(stepserver::configure)
    })
    .bind(&config.bind_address)?
    .run()
    .await?;

    Ok(())
}
