mod config;
mod db;
mod error;
mod model;
mod notify;
mod pipeline;
mod routes;
mod storage;

use actix_cors::Cors;
use actix_web::{App, HttpServer, web};
use config::Config;
use db::sightings::SightingsLog;
use model::classifier::OnnxClassifier;
use notify::{ActuatorChannel, Dispatcher, EmailChannel};
use pipeline::Pipeline;
use routes::configure_routes;
use std::sync::Arc;
use storage::image_store::ImageStore;

fn startup_error(message: String) -> std::io::Error {
    log::error!("{message}");
    std::io::Error::other(message)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    dotenv::dotenv().ok();

    let config = Config::from_env()
        .map_err(|e| startup_error(format!("Configuration error: {e}")))?;

    let classifier = OnnxClassifier::load(&config.model_path, &config.labels_path, config.top_k)
        .map_err(|e| startup_error(format!("Model loading failed: {e}")))?;
    log::info!(
        "Loaded model {} with {} classes",
        config.model_path.display(),
        classifier.class_count()
    );
    let classifier: Arc<dyn model::classifier::Classifier> = Arc::new(classifier);

    let email = EmailChannel::from_config(&config)
        .map_err(|e| startup_error(format!("Email channel setup failed: {e}")))?;
    let actuator = ActuatorChannel::new(config.actuator_url.clone(), config.notify_timeout)
        .map_err(|e| startup_error(format!("Actuator channel setup failed: {e}")))?;

    let store = ImageStore::new(
        config.upload_folder.clone(),
        config.allowed_extensions.clone(),
    );
    let sightings = SightingsLog::new(config.sightings_log.clone());

    let pipeline = web::Data::new(Pipeline::new(
        store,
        classifier,
        Dispatcher::new(email, actuator),
        sightings,
    ));

    let bind_address = format!("0.0.0.0:{}", config.port);
    log::info!("Starting server on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec![
                        actix_web::http::header::ACCEPT,
                        actix_web::http::header::CONTENT_TYPE,
                    ])
                    .max_age(3600),
            )
            .app_data(pipeline.clone())
            .configure(configure_routes)
    })
    .bind(&bind_address)?
    .run()
    .await
}
