//! Poll cycles from Discord fetch to webhook POST.

use httpmock::Method::{GET, POST};
use serde_json::json;
use tower::ServiceExt;

use task_relay_integration_tests::{
    CHANNEL_ID, GUILD_ID, TestRelay, WEBHOOK_PATH, body_text, message_json,
};

fn messages_path() -> String {
    TestRelay::discord_path(&format!("/channels/{CHANNEL_ID}/messages"))
}

fn member_path(user: &str) -> String {
    TestRelay::discord_path(&format!("/guilds/{GUILD_ID}/members/{user}"))
}

#[tokio::test(flavor = "multi_thread")]
async fn test_completed_task_is_forwarded_as_new() {
    let relay = TestRelay::start(&[]);

    let fetch = relay.server.mock(|when, then| {
        when.method(GET)
            .path(messages_path())
            .query_param("limit", "100");
        then.status(200).json_body(json!([
            message_json("1302", "<@42>finish report", &["42"], &["👍"]),
            message_json("1301", "おはようございます", &[], &[])
        ]));
    });
    let member = relay.server.mock(|when, then| {
        when.method(GET).path(member_path("42"));
        then.status(200)
            .json_body(json!({"nick": "Aki", "user": {"id": "42", "username": "aki_s"}}));
    });
    let forward = relay.server.mock(|when, then| {
        when.method(POST).path(WEBHOOK_PATH).json_body(json!({
            "newTasks": [{
                "messageId": "1302",
                "timestamp": "2024-05-01T00:30:00Z",
                "name": "Aki",
                "task": "finish report",
                "completed": true
            }],
            "updatedTasks": []
        }));
        then.status(200).body("ok");
    });

    let response = relay
        .app
        .oneshot(TestRelay::poll_request(&json!({})))
        .await
        .expect("response");

    assert_eq!(response.status(), 200);
    let body: serde_json::Value =
        serde_json::from_str(&body_text(response).await).expect("json body");
    assert_eq!(body["newTasks"], 1);
    assert_eq!(body["updatedTasks"], 0);
    assert_eq!(body["forwarded"], true);
    assert_eq!(body["cursor"], "1302");

    fetch.assert();
    member.assert();
    forward.assert();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_tracked_completion_is_forwarded_as_update() {
    let relay = TestRelay::start(&[]);

    relay.server.mock(|when, then| {
        when.method(GET)
            .path(messages_path())
            .query_param_missing("after");
        then.status(200).json_body(json!([
            message_json("1250", "<@7> 議事録お願いします", &["7"], &[]),
            message_json("1200", "<@7> 会議室予約", &["7"], &["✅"])
        ]));
    });
    relay.server.mock(|when, then| {
        when.method(GET).path(member_path("7"));
        then.status(200).json_body(json!({
            "nick": null,
            "user": {"id": "7", "username": "ren_k", "global_name": "Ren"}
        }));
    });
    let forward = relay.server.mock(|when, then| {
        when.method(POST).path(WEBHOOK_PATH).json_body(json!({
            "newTasks": [{
                "messageId": "1250",
                "timestamp": "2024-05-01T00:30:00Z",
                "name": "Ren",
                "task": "議事録",
                "completed": false
            }],
            "updatedTasks": [{
                "messageId": "1200",
                "timestamp": "2024-05-01T00:30:00Z",
                "name": "Ren",
                "task": "会議室予約",
                "completed": true
            }]
        }));
        then.status(200);
    });

    let response = relay
        .app
        .oneshot(TestRelay::poll_request(&json!({"uncompletedIds": ["1200"]})))
        .await
        .expect("response");

    assert_eq!(response.status(), 200);
    forward.assert();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_flat_payload_format() {
    let relay = TestRelay::start(&[("RELAY_PAYLOAD_FORMAT", "flat")]);

    relay.server.mock(|when, then| {
        when.method(GET).path(messages_path());
        then.status(200)
            .json_body(json!([message_json("1400", "<@42> buy milk", &["42"], &[])]));
    });
    relay.server.mock(|when, then| {
        when.method(GET).path(member_path("42"));
        then.status(200)
            .json_body(json!({"nick": "Aki", "user": {"id": "42", "username": "aki_s"}}));
    });
    let forward = relay.server.mock(|when, then| {
        when.method(POST).path(WEBHOOK_PATH).json_body(json!([{
            "messageId": "1400",
            "timestamp": "2024-05-01T00:30:00Z",
            "name": "Aki",
            "task": "buy milk",
            "completed": false
        }]));
        then.status(200);
    });

    let response = relay
        .app
        .oneshot(TestRelay::poll_request(&json!({})))
        .await
        .expect("response");

    assert_eq!(response.status(), 200);
    forward.assert();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_automation_failure_is_server_error() {
    let relay = TestRelay::start(&[]);

    relay.server.mock(|when, then| {
        when.method(GET).path(messages_path());
        then.status(200)
            .json_body(json!([message_json("1500", "<@42> buy milk", &["42"], &[])]));
    });
    relay.server.mock(|when, then| {
        when.method(GET).path(member_path("42"));
        then.status(200)
            .json_body(json!({"nick": "Aki", "user": {"id": "42", "username": "aki_s"}}));
    });
    relay.server.mock(|when, then| {
        when.method(POST).path(WEBHOOK_PATH);
        then.status(500).body("Exception: sheet not found");
    });

    let response = relay
        .app
        .oneshot(TestRelay::poll_request(&json!({})))
        .await
        .expect("response");

    assert_eq!(response.status(), 500);
    let body = body_text(response).await;
    assert!(body.contains("Failed to forward tasks"));
    assert!(!body.contains("sheet not found"), "upstream body must not leak");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_discord_failure_is_server_error() {
    let relay = TestRelay::start(&[]);

    relay.server.mock(|when, then| {
        when.method(GET).path(messages_path());
        then.status(403)
            .json_body(json!({"message": "Missing Access", "code": 50001}));
    });
    let forward = relay.server.mock(|when, then| {
        when.method(POST).path(WEBHOOK_PATH);
        then.status(200);
    });

    let response = relay
        .app
        .oneshot(TestRelay::poll_request(&json!({})))
        .await
        .expect("response");

    assert_eq!(response.status(), 500);
    assert!(body_text(response).await.contains("Failed to fetch messages"));
    forward.assert_calls(0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_failed_member_lookup_drops_only_that_user() {
    let relay = TestRelay::start(&[]);

    relay.server.mock(|when, then| {
        when.method(GET).path(messages_path());
        then.status(200).json_body(json!([message_json(
            "1600",
            "<@1> first\n<@2> second\n<@3> third",
            &["1", "2", "3"],
            &[]
        )]));
    });
    for (user, nick) in [("1", "Aki"), ("3", "Mio")] {
        relay.server.mock(|when, then| {
            when.method(GET).path(member_path(user));
            then.status(200)
                .json_body(json!({"nick": nick, "user": {"id": user, "username": "x"}}));
        });
    }
    relay.server.mock(|when, then| {
        when.method(GET).path(member_path("2"));
        then.status(404)
            .json_body(json!({"message": "Unknown Member", "code": 10007}));
    });
    let forward = relay.server.mock(|when, then| {
        when.method(POST)
            .path(WEBHOOK_PATH)
            .body_includes("\"Aki\"")
            .body_includes("\"Mio\"")
            .body_excludes("second");
        then.status(200);
    });

    let response = relay
        .app
        .oneshot(TestRelay::poll_request(&json!({})))
        .await
        .expect("response");

    assert_eq!(response.status(), 200);
    forward.assert();
}
