//! Inbound SMS webhook.

use crate::commands::{self, FolioApi};
use crate::config::Config;
use crate::twilio::{self, TwilioClient};
use axum::extract::{Form, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use std::sync::Arc;

pub struct AppState {
    pub config: Config,
    pub api: Box<dyn FolioApi>,
    pub twilio: TwilioClient,
}

const EMPTY_TWIML: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response></Response>";

fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new().route("/", post(inbound)).with_state(state)
}

// POST /
pub async fn inbound(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(params): Form<Vec<(String, String)>>,
) -> Response {
    if let Some(url) = &state.config.webhook_url {
        let signature = headers
            .get("x-twilio-signature")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if !twilio::verify_signature(&state.config.auth_token, url, &params, signature) {
            log::warn!("Rejected inbound SMS with invalid signature");
            return StatusCode::FORBIDDEN.into_response();
        }
    }

    let (Some(body), Some(from)) = (param(&params, "Body"), param(&params, "From")) else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    if from != state.config.client_number {
        log::info!("Incoming text from invalid number {}", from);
        return twiml();
    }

    let reply = commands::respond(body, state.api.as_ref()).await;
    match state.twilio.send_sms(&state.config.client_number, &reply).await {
        Ok(()) => log::info!("Replied to SMS"),
        Err(e) => log::error!("Failed to send SMS reply: {}", e),
    }

    twiml()
}

fn twiml() -> Response {
    ([(header::CONTENT_TYPE, "text/xml")], EMPTY_TWIML).into_response()
}
