use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;

use ecg_model_api::{
    configure, logging, ApiConfig, AppState, OnnxClassifier, CLASS_LABELS, INPUT_SIZE,
};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = ApiConfig::from_env()?;
    logging::setup_logging(&config)?;

    tracing::info!(
        environment = config.environment.as_str(),
        config = ?config,
        "Loaded configuration"
    );

    tracing::info!(path = %config.model_path.display(), "Loading model");
    let classifier = OnnxClassifier::load(&config.model_path, INPUT_SIZE, CLASS_LABELS.len())
        .context("model could not be loaded")?;
    tracing::info!(classes = ?CLASS_LABELS, "Model loaded successfully");

    let state = web::Data::new(AppState::new(Arc::new(classifier)));

    let mut server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header();

        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .wrap(cors)
            .configure(configure)
    });
    if let Some(workers) = config.workers {
        server = server.workers(workers);
    }

    tracing::info!(address = %config.bind_address, "Server running");
    server
        .bind(config.bind_address)
        .with_context(|| format!("failed to bind {}", config.bind_address))?
        .run()
        .await?;

    Ok(())
}
