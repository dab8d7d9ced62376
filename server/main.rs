mod config;
mod error;
mod handlers;
mod mock_routes;
mod store;

use actix_files::Files;
use actix_web::{middleware, web, App, HttpServer};
use env_logger::Env;

use config::ServerConfig;
use store::MarkerStore;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = ServerConfig::from_env();
    let store = MarkerStore::connect(&config.database_url)
        .await
        .map_err(std::io::Error::other)?;
    let store = web::Data::new(store);

    log::info!(
        "Starting server on {}:{} (static files from {})",
        config.bind_addr,
        config.port,
        config.static_dir
    );

    let static_dir = config.static_dir.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Compress::default())
            .wrap(middleware::Logger::default())
            .app_data(store.clone())
            .configure(handlers::configure)
            .service(Files::new("/", &static_dir).index_file("index.html"))
    })
    .bind((config.bind_addr.as_str(), config.port))?
    .run()
    .await
}
