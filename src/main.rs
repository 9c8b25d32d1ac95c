use std::io;

use actix_web::middleware::Logger;
use actix_web::{App, HttpServer};
use chrono::Duration;
use env_logger::Env;

use estoque_api::auth::TokenService;
use estoque_api::config::Config;
use estoque_api::uploads::UploadStore;
use estoque_api::{configure, db, AppServices};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok(); // Load environment variables from .env file
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = Config::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let database = db::connect(&config)
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::ConnectionRefused, e))?;

    let services = AppServices::mongo(
        &database,
        TokenService::new(&config.jwt_secret, Duration::hours(config.token_ttl_hours)),
        UploadStore::new(&config.upload_dir),
    );

    log::info!("Listening on {}", config.bind_addr);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .configure(|cfg| configure(cfg, &services))
    })
    .bind(&config.bind_addr)?
    .run()
    .await
}
