use std::io;

use actix_web::{middleware::Logger, App, HttpServer};

use e_com_catalog::config::Config;
use e_com_catalog::handlers;
use e_com_catalog::store::StoreHandle;
use e_com_catalog::AppState;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok(); // Load environment variables from .env file
    env_logger::init();

    let config = Config::from_env().map_err(|e| {
        log::error!("Invalid configuration: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e)
    })?;

    let store = StoreHandle::open(&config).await.map_err(|e| {
        log::error!("Failed to open the store: {}", e);
        io::Error::new(io::ErrorKind::Other, e)
    })?;

    let state = AppState::new(&config, &store);
    let admin_secret = config.admin_secret.clone();

    log::info!("Server is running on port: {}", config.port);
    log::info!("Startup date {}", chrono::Local::now().format("%m-%d-%y_%H%M%S"));
    log::info!("APP_ENV = {}", config.environment.as_str());

    let result = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(state.catalog.clone())
            .app_data(state.accounts.clone())
            .app_data(state.environment.clone())
            .configure(handlers::configure(admin_secret.clone()))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await;

    store.close().await;
    result
}
