mod config;
mod documents;
mod error;
mod identity;
mod services;
mod storage;
#[cfg(test)]
mod test_support;

use crate::config::Settings;
use actix_web::{web, App, HttpServer};
use env_logger::Env;
use log::{error, info};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let settings = Settings::load().map_err(|e| {
        error!("Invalid configuration: {}", e);
        std::io::Error::other(e)
    })?;

    // Create the schema up front so a broken database fails the start, not the first request.
    storage::open(&settings.storage.database_path).map_err(|e| {
        error!(
            "Cannot open database {}: {}",
            settings.storage.database_path.display(),
            e
        );
        std::io::Error::other(e)
    })?;

    let host = settings.server.host.clone();
    let port = settings.server.port;
    info!("Server running at http://{}:{}", host, port);

    let settings = web::Data::new(settings);
    HttpServer::new(move || {
        App::new()
            .app_data(settings.clone())
            .app_data(web::JsonConfig::default().limit(64 * 1024))
            .service(services::requests::configure_routes())
            .service(services::reports::configure_routes())
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
