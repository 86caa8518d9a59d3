//! Poll trigger endpoint.
//!
//! Called by a scheduler. The body is optional; an empty body polls with no
//! tracked messages.

use axum::{Json, Router, body::Bytes, extract::State, routing::get};
use tracing::instrument;

use crate::error::AppError;
use crate::services::{PollOutcome, PollRequest};
use crate::state::AppState;

/// Create poll routes.
pub fn router() -> Router<AppState> {
    Router::new().route("/poll", get(handle_poll).post(handle_poll))
}

/// Run one poll cycle and report what was forwarded.
#[instrument(skip(state, body))]
async fn handle_poll(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PollOutcome>, AppError> {
    let request = parse_request(&body)?;
    let outcome = state.poll().run(request).await?;
    Ok(Json(outcome))
}

fn parse_request(body: &[u8]) -> Result<PollRequest, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(PollRequest::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::BadRequest(format!("Invalid poll request: {e}")))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use task_relay_core::MessageId;
    use tower::ServiceExt;

    use super::*;
    use crate::routes::{app, test_support};

    #[test]
    fn test_parse_request() {
        assert!(parse_request(b"").expect("empty").uncompleted_ids.is_empty());
        assert!(parse_request(b" \n").expect("blank").uncompleted_ids.is_empty());
        assert_eq!(
            parse_request(br#"{"uncompletedIds":["7"]}"#)
                .expect("ids")
                .uncompleted_ids,
            vec![MessageId::new(7)]
        );
        assert!(matches!(
            parse_request(b"{\"uncompletedIds\": 3}"),
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_discord_is_server_error() {
        let app = app(test_support::state(
            "http://127.0.0.1:9",
            "http://127.0.0.1:9/exec",
        ));

        let response = app
            .oneshot(Request::builder().uri("/poll").body(Body::empty()).expect("request"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
