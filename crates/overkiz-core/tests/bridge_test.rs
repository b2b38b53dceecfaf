// Integration tests for the Bridge lifecycle and dispatcher using wiremock.

use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use overkiz_core::{Bridge, BridgeConfig, CoreError, VendorEndpoint};

// ── Helpers ─────────────────────────────────────────────────────────

fn bridge_for(server: &MockServer) -> Bridge {
    bridge_with_interval(server, Duration::ZERO)
}

fn bridge_with_interval(server: &MockServer, refresh_interval: Duration) -> Bridge {
    let endpoint = VendorEndpoint::Local {
        api_url: server.uri().parse().expect("mock server URI"),
        token: SecretString::from("test-token".to_owned()),
    };
    let mut config = BridgeConfig::new(endpoint);
    config.timeout = Duration::from_secs(5);
    config.refresh_interval = refresh_interval;
    Bridge::new(config)
}

fn shutter(label: &str, url: &str) -> serde_json::Value {
    json!({
        "label": label,
        "deviceURL": url,
        "definition": { "uiClass": "RollerShutter" }
    })
}

// ── Dispatch ────────────────────────────────────────────────────────

#[tokio::test]
async fn dispatch_with_no_matching_devices_makes_no_vendor_call() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/setup/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "label": "Hallway light", "deviceURL": "io://gw/9", "definition": { "uiClass": "Light" } }
        ])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/exec/apply"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let bridge = bridge_for(&server);
    bridge.connect().await.expect("connect");

    let accepted = bridge.dispatch("close", "RollerShutter").await.expect("dispatch");
    assert_eq!(accepted, 0);
}

#[tokio::test]
async fn dispatch_builds_one_batch_with_one_command_per_device() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/setup/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            shutter("Kitchen", "io://gw/1"),
            { "label": "Hallway light", "deviceURL": "io://gw/9", "definition": { "uiClass": "Light" } },
            shutter("Bedroom", "io://gw/2"),
            shutter("Attic", "io://gw/3"),
        ])))
        .mount(&server)
        .await;

    let expected = json!({
        "label": "openRollerShutters",
        "actions": [
            { "deviceURL": "io://gw/1", "commands": [{ "name": "open" }] },
            { "deviceURL": "io://gw/2", "commands": [{ "name": "open" }] },
            { "deviceURL": "io://gw/3", "commands": [{ "name": "open" }] },
        ]
    });

    Mock::given(method("POST"))
        .and(path("/exec/apply"))
        .and(body_json(&expected))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "execId": "exec-1" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let bridge = bridge_for(&server);
    bridge.connect().await.expect("connect");

    let accepted = bridge.dispatch("open", "RollerShutter").await.expect("dispatch");
    assert_eq!(accepted, 3);
}

#[tokio::test]
async fn dispatch_surfaces_vendor_rejection() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/setup/devices"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([shutter("Kitchen", "io://gw/1")])),
        )
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/exec/apply"))
        .respond_with(ResponseTemplate::new(500).set_body_string("execution queue full"))
        .mount(&server)
        .await;

    let bridge = bridge_for(&server);
    bridge.connect().await.expect("connect");

    let err = bridge.dispatch("close", "RollerShutter").await.expect_err("rejection");
    match err {
        CoreError::SubmitRejected { message } => {
            assert!(message.contains("execution queue full"), "message: {message}");
        }
        other => panic!("expected SubmitRejected, got {other:?}"),
    }
}

// ── Cache refresh ───────────────────────────────────────────────────

#[tokio::test]
async fn failed_refresh_retains_previous_snapshot() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/setup/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            shutter("Kitchen", "io://gw/1"),
            shutter("Bedroom", "io://gw/2"),
        ])))
        .mount(&server)
        .await;

    let bridge = bridge_for(&server);
    bridge.connect().await.expect("connect");
    assert_eq!(bridge.devices(None).len(), 2);

    // The vendor starts failing; the cache must keep serving the last
    // good snapshot and the error must not reach readers.
    server.reset().await;
    Mock::given(method("GET"))
        .and(path("/setup/devices"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let err = bridge.refresh().await.expect_err("refresh failure");
    assert!(matches!(err, CoreError::FetchFailed { .. }));

    let devices = bridge.devices(Some("RollerShutter"));
    assert_eq!(devices.len(), 2);
    assert_eq!(devices[0].label, "Kitchen");
}

#[tokio::test]
async fn initial_load_failure_is_not_fatal() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/setup/devices"))
        .respond_with(ResponseTemplate::new(503).set_body_string("starting up"))
        .mount(&server)
        .await;

    let bridge = bridge_for(&server);
    // connect() succeeds -- the cache starts empty and recovers later.
    bridge.connect().await.expect("connect");
    assert!(bridge.devices(None).is_empty());

    server.reset().await;
    Mock::given(method("GET"))
        .and(path("/setup/devices"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([shutter("Kitchen", "io://gw/1")])),
        )
        .mount(&server)
        .await;

    bridge.refresh().await.expect("recovery refresh");
    assert_eq!(bridge.devices(None).len(), 1);
}

// ── Background refresh loop ─────────────────────────────────────────

#[tokio::test]
async fn refresh_loop_ticks_and_stops_on_shutdown() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/setup/devices"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([shutter("Kitchen", "io://gw/1")])),
        )
        .mount(&server)
        .await;

    let bridge = bridge_with_interval(&server, Duration::from_millis(50));
    bridge.connect().await.expect("connect");

    // Initial load plus at least one interval tick.
    tokio::time::sleep(Duration::from_millis(220)).await;
    bridge.shutdown().await;

    let before = server.received_requests().await.unwrap_or_default().len();
    assert!(before >= 2, "expected periodic refreshes, saw {before}");

    // No more vendor calls once the task has been joined.
    tokio::time::sleep(Duration::from_millis(200)).await;
    let after = server.received_requests().await.unwrap_or_default().len();
    assert_eq!(before, after);
}
