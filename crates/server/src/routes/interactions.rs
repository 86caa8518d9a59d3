//! Discord interactions endpoint.
//!
//! Every request is verified against the application public key before the
//! body is parsed. Deferred work is spawned after the acknowledgement is
//! built, so the response never waits on the automation endpoint.

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::post,
};
use tracing::{debug, instrument};

use crate::discord::{Interaction, InteractionResponse, SIGNATURE_HEADER, TIMESTAMP_HEADER};
use crate::error::AppError;
use crate::state::AppState;

/// Create interaction routes.
pub fn router() -> Router<AppState> {
    Router::new().route("/interactions", post(handle_interaction))
}

/// Handle a Discord interaction webhook.
#[instrument(skip(state, headers, body))]
async fn handle_interaction(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<InteractionResponse>, AppError> {
    let signature = header_str(&headers, SIGNATURE_HEADER);
    let timestamp = header_str(&headers, TIMESTAMP_HEADER);

    state
        .verifier()
        .verify(signature, timestamp, &body)
        .map_err(|e| AppError::SignatureInvalid(e.to_string()))?;

    let interaction: Interaction = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid interaction payload: {e}")))?;

    let ack = state.interactions().acknowledge(&interaction)?;

    if let Some(job) = ack.deferred {
        debug!("Spawning deferred log job");
        let service = state.interactions().clone();
        tokio::spawn(async move {
            service.run_deferred(job).await;
        });
    }

    Ok(Json(ack.response))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
