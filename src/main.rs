mod config;
mod db;
mod errors;
mod handlers;
mod models;
mod services;
mod utils;

use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use actix_web_httpauth::middleware::HttpAuthentication;
use actix_web_prom::PrometheusMetricsBuilder;
use dotenv::dotenv;
use env_logger::Env;
use log::{error, info, warn};
use std::collections::HashMap;
use std::io;
use std::sync::Arc;

use crate::config::Config;
use crate::db::{MemoryRepository, PgRepository, Repository};
use crate::handlers::auth::KnownUsernames;
use crate::services::activity::ActivityService;
use crate::utils::jwt::JwtKeys;

const KNOWN_USERNAMES_CAPACITY: u64 = 10_000;

/// Route table shared by the server and the handler tests.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    let auth = HttpAuthentication::bearer(crate::utils::jwt::validator);

    cfg.service(
        web::resource("/api/register/")
            .route(web::post().to(handlers::auth::register)),
    )
    .service(
        web::resource("/api/login/")
            .route(web::post().to(handlers::auth::login)),
    )
    .service(
        web::resource("/api/activities/")
            .wrap(auth.clone())
            .route(web::get().to(handlers::activity::list_activities))
            .route(web::post().to(handlers::activity::create_activity)),
    )
    .service(
        web::resource("/api/activities/week/{date}/")
            .wrap(auth.clone())
            .route(web::get().to(handlers::activity::weekly_activities)),
    )
    .service(
        web::resource("/api/activities/month/{date}/")
            .wrap(auth.clone())
            .route(web::get().to(handlers::activity::monthly_activities)),
    )
    .service(
        web::resource("/api/activities/{date}/")
            .wrap(auth.clone())
            .route(web::get().to(handlers::activity::activities_by_date)),
    )
    .service(
        web::resource("/api/carbon-footprint/")
            .wrap(auth)
            .route(web::get().to(handlers::footprint::carbon_footprint)),
    )
    // No auth: the leaderboard is public.
    .service(
        web::resource("/api/leaderboard/")
            .route(web::get().to(handlers::footprint::leaderboard)),
    );
}

async fn open_repository(config: &Config) -> io::Result<Arc<dyn Repository>> {
    match &config.database_url {
        Some(url) => {
            let repo = PgRepository::connect(url, config.database_max_connections)
                .await
                .map_err(|e| {
                    error!("Failed to connect to the database: {}", e);
                    io::Error::new(io::ErrorKind::Other, e)
                })?;
            repo.migrate().await.map_err(|e| {
                error!("Failed to run migrations: {}", e);
                io::Error::new(io::ErrorKind::Other, e)
            })?;
            Ok(Arc::new(repo))
        }
        None => {
            warn!("DATABASE_URL not set, activities are kept in memory only");
            Ok(Arc::new(MemoryRepository::new()))
        }
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = Config::from_env().map_err(|e| {
        error!("Invalid configuration: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e)
    })?;

    let service = web::Data::new(ActivityService::new(open_repository(&config).await?));
    let jwt_keys = web::Data::new(JwtKeys::new(&config.jwt_secret));
    let known_usernames = web::Data::new(KnownUsernames::new(KNOWN_USERNAMES_CAPACITY));

    let mut labels = HashMap::new();
    labels.insert("app".to_string(), "carbon_tracker".to_string());
    let prometheus = PrometheusMetricsBuilder::new("api")
        .endpoint("/metrics")
        .const_labels(labels)
        .build()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;

    info!("Starting server at {} with {} workers", config.bind_address, config.workers);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(prometheus.clone())
            .app_data(service.clone())
            .app_data(jwt_keys.clone())
            .app_data(known_usernames.clone())
            .app_data(web::JsonConfig::default().error_handler(errors::json_error_handler))
            .configure(configure_routes)
    })
    .workers(config.workers)
    .bind(&config.bind_address)?
    .run()
    .await
}
