//Third-party-dependencies
use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use env_logger::Env;
use log::{error, info};
use std::sync::Arc;

// Crate imports:
use timegate_service::config::Config;
use timegate_service::routes;
use timegate_service::state::AppState;
use timegate_service::utils::auth_middleware::Authentication;
use timegate_service::utils::clock::SystemClock;
use timegate_service::utils::directory_storage::JsonFileDirectory;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = Config::from_env();

    let directory = JsonFileDirectory::open(&config.directory_path).map_err(|e| {
        error!("❌ Could not open team directory: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    })?;

    let state = web::Data::new(AppState::new(Arc::new(directory), Arc::new(SystemClock), &config));

    let address = config.bind_address.clone();
    info!("🚀 Server started at {}", address);

    HttpServer::new(move || {
        let cors = match &config.cors_allowed_origin {
            Some(origin) => Cors::default()
                .allowed_origin(origin)
                .allow_any_method()
                .allow_any_header(),
            None => Cors::permissive(),
        };

        App::new()
            .wrap(Authentication::new(config.jwt_secret.clone()))
            .wrap(cors)
            .app_data(state.clone())
            .configure(routes::init_routes)
    })
        .bind(address)?
        .run()
        .await
}
