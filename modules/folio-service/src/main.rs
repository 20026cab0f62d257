//! Folio Service: standalone binary serving the folio HTTP API.
//!
//! Every folio is one CSV file in the data directory.
//! Default: http://127.0.0.1:8081/

mod config;
mod middleware;
mod routes;

use config::Config;
use folio_store::FolioStore;
use routes::AppState;
use std::sync::Arc;
use std::time::Instant;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = std::fs::create_dir_all(&config.data_dir) {
        log::error!(
            "Failed to create data directory {}: {}",
            config.data_dir.display(),
            e
        );
        std::process::exit(1);
    }

    log::info!("Loading folios from: {}", config.data_dir.display());
    let store = match FolioStore::load(&config.data_dir) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            log::error!("Failed to load folios: {}", e);
            std::process::exit(1);
        }
    };
    log::info!("Loaded {} folios", store.len());

    let state = Arc::new(AppState {
        store,
        auth_token: config.auth_token.clone(),
        start_time: Instant::now(),
    });

    let app = routes::app(state);

    let addr = format!("{}:{}", config.bind_addr, config.port);
    log::info!("Folio Service listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");

    axum::serve(
        listener,
        axum::ServiceExt::<axum::extract::Request>::into_make_service(app),
    )
    .await
    .expect("Server error");
}
