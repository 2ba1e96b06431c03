mod config;
mod db;
mod error;
mod middleware;
mod models;
mod routes;
mod services;
mod utils;

use actix_web::{middleware::Logger, web, App, HttpServer};
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::services::email_service::build_email_sender;
use crate::services::s3_service::S3Service;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")),
        )
        .init();

    let config = AppConfig::from_env().map_err(|e| std::io::Error::other(e.to_string()))?;

    tracing::info!("Connecting to database...");
    let db = db::establish_connection(&config.database_url)
        .await
        .map_err(|e| std::io::Error::other(format!("Failed to connect to database: {}", e)))?;
    tracing::info!("Database connected");

    let s3 = web::Data::new(S3Service::new(config.s3.clone()));
    let mailer = web::Data::from(build_email_sender(&config.mail));
    let db = web::Data::new(db);
    let bind = (config.server.host.clone(), config.server.port);
    let config = web::Data::new(config);

    tracing::info!(host = %bind.0, port = bind.1, "Starting server");

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(db.clone())
            .app_data(config.clone())
            .app_data(s3.clone())
            .app_data(mailer.clone())
            .configure(routes::configure_routes)
    })
        .bind(bind)?
        .run()
        .await
}
