mod config;
mod db;
mod model;
mod routes;
mod storage;

use std::sync::Arc;

use actix_cors::Cors;
use actix_multipart::form::MultipartFormConfig;
use actix_web::{App, HttpServer, middleware, web};
use reqwest::Client as HttpClient;

use config::AppConfig;
use db::feedback_repository::FeedbackRepository;
use model::{Classifier, Predictor};
use routes::configure_routes;
use storage::storage_service::StorageService;

// Fundus photos from phone cameras run large; keep uploads in memory anyway
// so no request ever touches a shared scratch file.
const UPLOAD_LIMIT: usize = 25 * 1024 * 1024;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    dotenv::dotenv().ok();

    let app_config = AppConfig::from_env().map_err(|e| {
        log::error!("configuration error: {e}");
        std::io::Error::other(e.to_string())
    })?;

    let predictor = Predictor::load(&app_config.model_dir).map_err(|e| {
        log::error!("failed to load models from {:?}: {e}", app_config.model_dir);
        std::io::Error::other(format!("model loading failed: {e}"))
    })?;
    log::info!("models loaded from {}", app_config.model_dir.display());
    let classifier: web::Data<dyn Classifier> =
        web::Data::from(Arc::new(predictor) as Arc<dyn Classifier>);

    let http_client = HttpClient::new();
    let storage_service = StorageService::new(
        http_client.clone(),
        app_config.supabase_url.clone(),
        app_config.supabase_service_key.clone(),
    );
    let feedback_repo = FeedbackRepository::new(
        http_client,
        app_config.supabase_url.clone(),
        app_config.supabase_service_key.clone(),
    );

    let bind_address = format!("0.0.0.0:{}", app_config.port);
    log::info!("Starting server on {}", bind_address);

    let static_dir = app_config.static_dir.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec![
                        actix_web::http::header::AUTHORIZATION,
                        actix_web::http::header::ACCEPT,
                        actix_web::http::header::CONTENT_TYPE,
                    ])
                    .max_age(3600),
            )
            .app_data(
                MultipartFormConfig::default()
                    .total_limit(UPLOAD_LIMIT)
                    .memory_limit(UPLOAD_LIMIT),
            )
            .app_data(classifier.clone())
            .app_data(web::Data::new(storage_service.clone()))
            .app_data(web::Data::new(feedback_repo.clone()))
            .configure(|cfg| configure_routes(cfg, static_dir.clone()))
    })
    .bind(&bind_address)?
    .run()
    .await
}
