//! Folio SMS: standalone binary bridging text messages to the folio service.
//!
//! Twilio posts inbound messages to the webhook; replies go back through the
//! Twilio REST API. Only the configured client number is served.
//! Default: http://127.0.0.1:8080/

mod commands;
mod config;
mod routes;
mod twilio;

use config::Config;
use folio_client::AppendedClient;
use routes::AppState;
use std::sync::Arc;
use twilio::TwilioClient;

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
    log::info!("Loaded config successfully");

    if config.webhook_url.is_none() {
        log::warn!("SMS_WEBHOOK_URL not set, inbound signatures will not be checked");
    }

    let api = AppendedClient::new(&config.appended_token, &config.appended_url);
    let twilio = TwilioClient::new(
        &config.account_sid,
        &config.auth_token,
        &config.twilio_number,
    );
    let port = config.port;

    let state = Arc::new(AppState {
        config,
        api: Box::new(api),
        twilio,
    });

    let app = routes::router(state);

    let addr = format!("0.0.0.0:{}", port);
    log::info!("Folio SMS listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");

    axum::serve(listener, app).await.expect("Server error");
}
