//! Integration tests for the task relay.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p task-relay-integration-tests
//! ```
//!
//! Discord and the automation webhook are both served by one `httpmock`
//! server: Discord under `/api/v10`, the webhook at `/exec`.
//!
//! # Test Categories
//!
//! - `interactions` - Signed interaction requests through the router
//! - `poll_relay` - Poll cycles from Discord fetch to webhook POST

use std::collections::HashMap;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, Response};
use ed25519_dalek::{Signer, SigningKey};
use httpmock::MockServer;
use task_relay_server::config::RelayConfig;
use task_relay_server::routes;
use task_relay_server::state::AppState;

/// Path prefix Discord calls are served under.
pub const DISCORD_PREFIX: &str = "/api/v10";

/// Path the automation webhook is served at.
pub const WEBHOOK_PATH: &str = "/exec";

/// Channel the relay polls in tests.
pub const CHANNEL_ID: &str = "55";

/// Guild used for nickname lookups in tests.
pub const GUILD_ID: &str = "9";

/// Timestamp header value used for signed requests.
pub const TIMESTAMP: &str = "1714521600";

/// A relay app wired to a mock server.
pub struct TestRelay {
    pub server: MockServer,
    pub app: Router,
    pub signing_key: SigningKey,
}

impl TestRelay {
    /// Start a mock server and build the app against it.
    ///
    /// `extra` overrides or adds environment entries.
    ///
    /// # Panics
    ///
    /// Panics if the configuration or state cannot be built.
    #[must_use]
    pub fn start(extra: &[(&str, &str)]) -> Self {
        let server = MockServer::start();
        let signing_key = SigningKey::from_bytes(&[17; 32]);

        let mut vars: HashMap<String, String> = HashMap::from([
            ("DISCORD_BOT_TOKEN".into(), "MTIzNDU2Nzg5.Gq1xYz.k3Rl9vQwEa7Tb2".into()),
            (
                "DISCORD_PUBLIC_KEY".into(),
                hex::encode(signing_key.verifying_key().to_bytes()),
            ),
            ("DISCORD_CHANNEL_ID".into(), CHANNEL_ID.into()),
            ("DISCORD_GUILD_ID".into(), GUILD_ID.into()),
            ("DISCORD_API_BASE".into(), server.url(DISCORD_PREFIX)),
            ("GAS_WEBHOOK_URL".into(), server.url(WEBHOOK_PATH)),
        ]);
        for (key, value) in extra {
            vars.insert((*key).to_string(), (*value).to_string());
        }

        let config = RelayConfig::from_lookup(|key| vars.get(key).cloned())
            .expect("test configuration");
        let app = routes::app(AppState::new(config).expect("test state"));

        Self {
            server,
            app,
            signing_key,
        }
    }

    /// Hex signature over `TIMESTAMP || body`.
    #[must_use]
    pub fn sign(&self, body: &str) -> String {
        let message = format!("{TIMESTAMP}{body}");
        hex::encode(self.signing_key.sign(message.as_bytes()).to_bytes())
    }

    /// A `POST /interactions` request carrying `signature`.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built.
    #[must_use]
    pub fn interaction_request(body: &str, signature: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/interactions")
            .header("content-type", "application/json")
            .header("X-Signature-Ed25519", signature)
            .header("X-Signature-Timestamp", TIMESTAMP)
            .body(Body::from(body.to_string()))
            .expect("interaction request")
    }

    /// A `POST /poll` request with a JSON body.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built.
    #[must_use]
    pub fn poll_request(body: &serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/poll")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("poll request")
    }

    /// Discord path for a REST resource.
    #[must_use]
    pub fn discord_path(path: &str) -> String {
        format!("{DISCORD_PREFIX}{path}")
    }
}

/// Collect a response body as text.
///
/// # Panics
///
/// Panics if the body cannot be read or is not UTF-8.
pub async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("response body");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

/// A Discord message object.
#[must_use]
pub fn message_json(
    id: &str,
    content: &str,
    mentions: &[&str],
    reactions: &[&str],
) -> serde_json::Value {
    let mentions: Vec<_> = mentions
        .iter()
        .map(|id| serde_json::json!({"id": id, "username": format!("user{id}")}))
        .collect();
    let reactions: Vec<_> = reactions
        .iter()
        .map(|name| serde_json::json!({"count": 1, "me": false, "emoji": {"id": null, "name": name}}))
        .collect();
    serde_json::json!({
        "id": id,
        "channel_id": CHANNEL_ID,
        "timestamp": "2024-05-01T00:30:00+00:00",
        "content": content,
        "author": {"id": "1", "username": "lead"},
        "mentions": mentions,
        "reactions": reactions
    })
}
