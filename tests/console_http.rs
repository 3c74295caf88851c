use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use legal_console::build_router;
use legal_console::catalog::PROMPT;
use legal_console::config::{Config, ConsoleTiming, DemoSettings};
use legal_console::logger::{LogLevel, Logger};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn test_config(demo_enabled: bool, timing: ConsoleTiming) -> Arc<Config> {
    Arc::new(Config {
        port: 0,
        max_payload_bytes: 2048,
        max_sessions: 8,
        session_ttl: Duration::from_secs(600),
        max_input_chars: 64,
        timing,
        demo: DemoSettings {
            enabled: demo_enabled,
            ..DemoSettings::default()
        },
        allowed_origins: vec!["http://client.test".to_string()],
        allow_all_origins: false,
    })
}

fn router(demo_enabled: bool) -> Router {
    router_with_timing(demo_enabled, ConsoleTiming::instant())
}

fn router_with_timing(demo_enabled: bool, timing: ConsoleTiming) -> Router {
    let logger = Logger::new("test".to_string()).with_min_level(LogLevel::Error);
    build_router(test_config(demo_enabled, timing), logger).unwrap()
}

fn command_lines(snapshot: &Value) -> Vec<String> {
    snapshot["lines"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|line| line["kind"] == "command")
        .filter_map(|line| line["text"].as_str())
        .map(|text| text.to_string())
        .collect()
}

async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

async fn send_json(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, bytes) = send(router, method, uri, body).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn create_session(router: &Router) -> String {
    let (status, body) = send_json(router, Method::POST, "/sessions", None).await;
    assert_eq!(status, StatusCode::CREATED);
    body["sessionId"].as_str().unwrap().to_string()
}

async fn wait_for_history(router: &Router, id: &str, expected: u64) -> Value {
    for _ in 0..200 {
        let (_, snapshot) = send_json(router, Method::GET, &format!("/sessions/{id}"), None).await;
        let lines = snapshot["lines"].as_array().unwrap();
        let settled = lines.iter().all(|line| line["kind"] != "loading")
            && lines.last().is_some_and(|line| line["kind"] == "blank");
        if snapshot["historyLength"] == expected && settled {
            return snapshot;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("session {id} never reached {expected} history entries");
}

#[tokio::test]
async fn info_lists_commands_and_quick_actions() {
    let router = router(false);
    let (status, info) = send_json(&router, Method::GET, "/info", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(info["prompt"], "gość@kancelaria:~$");
    let statics: Vec<&str> = info["staticCommands"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|value| value.as_str())
        .collect();
    assert!(statics.contains(&"help"));
    assert!(statics.contains(&"clear"));
    assert!(
        info["quickCommands"]
            .as_array()
            .unwrap()
            .iter()
            .any(|quick| quick["id"] == "search-rodo")
    );
}

#[tokio::test]
async fn new_session_shows_the_welcome_banner() {
    let router = router(false);
    let (status, body) = send_json(&router, Method::POST, "/sessions", None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["snapshot"]["lines"][0]["kind"], "system");
    assert_eq!(body["snapshot"]["lines"][0]["text"], "👋 Cześć!");
    assert_eq!(body["snapshot"]["historyLength"], 0);
}

#[tokio::test]
async fn typed_command_is_dispatched_and_rendered() {
    let router = router(false);
    let id = create_session(&router).await;
    let events = format!("/sessions/{id}/events");

    let (status, body) = send_json(
        &router,
        Method::POST,
        &events,
        Some(json!({ "type": "input", "value": "ISAP.find('dane')" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["input"], "ISAP.find('dane')");

    let (status, body) = send_json(
        &router,
        Method::POST,
        &events,
        Some(json!({ "type": "key", "key": "enter" })),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["snapshot"]["input"], "");
    assert_eq!(
        command_lines(&body["snapshot"]),
        vec![format!("{PROMPT} ISAP.find('dane')")]
    );

    let snapshot = wait_for_history(&router, &id, 1).await;
    let results: Vec<&str> = snapshot["lines"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|line| line["kind"] == "result")
        .filter_map(|line| line["text"].as_str())
        .collect();
    assert!(results.contains(&"Znaleziono akty prawne dla: \"dane\""));

    let (status, html) = send(&router, Method::GET, &format!("/sessions/{id}/render"), None).await;
    assert_eq!(status, StatusCode::OK);
    let html = String::from_utf8(html).unwrap();
    assert!(html.contains("console-line--result"));
}

#[tokio::test]
async fn markup_typed_by_visitor_is_escaped_in_render() {
    let router = router(false);
    let id = create_session(&router).await;
    let events = format!("/sessions/{id}/events");
    send_json(
        &router,
        Method::POST,
        &events,
        Some(json!({ "type": "input", "value": "<img src=x onerror=alert(1)>" })),
    )
    .await;
    send_json(&router, Method::POST, &events, Some(json!({ "type": "run" }))).await;
    wait_for_history(&router, &id, 1).await;

    let (_, html) = send(&router, Method::GET, &format!("/sessions/{id}/render"), None).await;
    let html = String::from_utf8(html).unwrap();
    assert!(!html.contains("<img src=x"));
    assert!(html.contains("&lt;img"));
}

#[tokio::test]
async fn easter_egg_overlay_can_be_dismissed() {
    let router = router(false);
    let id = create_session(&router).await;
    let events = format!("/sessions/{id}/events");
    send_json(
        &router,
        Method::POST,
        &events,
        Some(json!({ "type": "input", "value": "cats.show('Pimpek')" })),
    )
    .await;
    send_json(&router, Method::POST, &events, Some(json!({ "type": "key", "key": "enter" }))).await;
    let snapshot = wait_for_history(&router, &id, 1).await;
    assert_eq!(snapshot["overlay"]["egg"], "pimpek");

    let (status, body) = send_json(
        &router,
        Method::POST,
        &events,
        Some(json!({ "type": "overlayBackdrop" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["overlay"].is_null());
}

#[tokio::test]
async fn history_keys_recall_previous_commands() {
    let router = router(false);
    let id = create_session(&router).await;
    let events = format!("/sessions/{id}/events");
    send_json(
        &router,
        Method::POST,
        &events,
        Some(json!({ "type": "quickCommand", "id": "help" })),
    )
    .await;
    wait_for_history(&router, &id, 1).await;
    send_json(
        &router,
        Method::POST,
        &events,
        Some(json!({ "type": "input", "value": "kontakt" })),
    )
    .await;
    send_json(&router, Method::POST, &events, Some(json!({ "type": "key", "key": "enter" }))).await;
    wait_for_history(&router, &id, 2).await;

    let (_, body) = send_json(
        &router,
        Method::POST,
        &events,
        Some(json!({ "type": "key", "key": "arrowUp" })),
    )
    .await;
    assert_eq!(body["input"], "kontakt");
    assert_eq!(body["historyCursor"], 1);

    let (_, body) = send_json(
        &router,
        Method::POST,
        &events,
        Some(json!({ "type": "key", "key": "arrowUp" })),
    )
    .await;
    assert_eq!(body["input"], "help");

    let (_, body) = send_json(
        &router,
        Method::POST,
        &events,
        Some(json!({ "type": "key", "key": "arrowDown" })),
    )
    .await;
    assert_eq!(body["input"], "kontakt");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn back_to_back_submissions_run_in_arrival_order() {
    let timing = ConsoleTiming {
        static_delay: Duration::from_millis(15),
        unknown_delay: Duration::ZERO,
        loading_min: Duration::from_millis(5),
        loading_max: Duration::from_millis(5),
    };
    let router = router_with_timing(false, timing);
    for _ in 0..20 {
        let id = create_session(&router).await;
        let events = format!("/sessions/{id}/events");
        let (status, _) = send_json(
            &router,
            Method::POST,
            &events,
            Some(json!({ "type": "quickCommand", "id": "help" })),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        send_json(
            &router,
            Method::POST,
            &events,
            Some(json!({ "type": "input", "value": "whoami" })),
        )
        .await;
        let (status, _) = send_json(&router, Method::POST, &events, Some(json!({ "type": "run" }))).await;
        assert_eq!(status, StatusCode::ACCEPTED);

        let snapshot = wait_for_history(&router, &id, 2).await;
        assert_eq!(
            command_lines(&snapshot),
            vec![format!("{PROMPT} help"), format!("{PROMPT} whoami")]
        );
        let help_end = snapshot["lines"]
            .as_array()
            .unwrap()
            .iter()
            .position(|line| line["text"] == format!("{PROMPT} whoami"))
            .unwrap();
        assert_eq!(snapshot["lines"][help_end - 1]["kind"], "blank");
    }
}

#[tokio::test]
async fn blank_submission_is_not_queued() {
    let router = router(false);
    let id = create_session(&router).await;
    let (status, body) = send_json(
        &router,
        Method::POST,
        &format!("/sessions/{id}/events"),
        Some(json!({ "type": "key", "key": "enter" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["historyLength"], 0);
}

#[tokio::test]
async fn invalid_requests_are_rejected() {
    let router = router(false);
    let id = create_session(&router).await;
    let events = format!("/sessions/{id}/events");

    let (status, _) = send_json(
        &router,
        Method::POST,
        &events,
        Some(json!({ "type": "input", "value": "x".repeat(65) })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = send_json(
        &router,
        Method::POST,
        &events,
        Some(json!({ "type": "quickCommand", "id": "missing" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "Unknown quick command \"missing\"");

    let (status, _) = send_json(&router, Method::POST, &events, Some(json!({ "type": "dance" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send_json(&router, Method::GET, "/sessions/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleted_session_is_gone() {
    let router = router(false);
    let id = create_session(&router).await;
    let (status, _) = send(&router, Method::DELETE, &format!("/sessions/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, body) = send_json(&router, Method::GET, &format!("/sessions/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Session not found");
}

#[tokio::test(start_paused = true)]
async fn demo_player_runs_when_visitor_stays_idle() {
    let router = router(true);
    let id = create_session(&router).await;
    tokio::time::sleep(Duration::from_secs(10)).await;
    let (_, snapshot) = send_json(&router, Method::GET, &format!("/sessions/{id}"), None).await;
    assert_eq!(snapshot["historyLength"], 1);
    assert!(
        snapshot["lines"]
            .as_array()
            .unwrap()
            .iter()
            .any(|line| line["kind"] == "command"
                && line["text"]
                    .as_str()
                    .is_some_and(|text| text.ends_with("ISAP.find('ochrona danych osobowych')")))
    );
}
