use std::sync::Arc;

use serde_json::{Value, json};
use shared::bookings::InMemoryBookingStore;
use shared::llm::TextGenerationError;

use super::{AppState, router};
use crate::test_support::{FlightScript, ScriptedGenerator, test_agent};

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn start(state: AppState) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("test listener should bind");
        let bind_addr = listener
            .local_addr()
            .expect("test listener local address should exist");
        let app = router(state);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("test server should run");
        });

        Self {
            base_url: format!("http://{bind_addr}"),
            handle,
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn app_state(generator: ScriptedGenerator, flights: FlightScript) -> AppState {
    AppState {
        agent: test_agent(Arc::new(generator), flights),
        bookings: Arc::new(InMemoryBookingStore::new()),
    }
}

#[tokio::test]
async fn new_session_mints_distinct_tokens() {
    let server = TestServer::start(app_state(
        ScriptedGenerator::replies(&[]),
        FlightScript::Offers(Vec::new()),
    ))
    .await;
    let client = reqwest::Client::new();

    let first: Value = client
        .get(format!("{}/new-session", server.base_url))
        .send()
        .await
        .expect("new-session request should succeed")
        .json()
        .await
        .expect("new-session response should be JSON");
    let second: Value = client
        .get(format!("{}/new-session", server.base_url))
        .send()
        .await
        .expect("new-session request should succeed")
        .json()
        .await
        .expect("new-session response should be JSON");

    let first_token = first["session_token"].as_str().expect("token present");
    let second_token = second["session_token"].as_str().expect("token present");
    assert!(!first_token.is_empty());
    assert_ne!(first_token, second_token);
}

#[tokio::test]
async fn memory_for_fresh_token_is_empty_not_an_error() {
    let server = TestServer::start(app_state(
        ScriptedGenerator::replies(&[]),
        FlightScript::Offers(Vec::new()),
    ))
    .await;

    let response = reqwest::Client::new()
        .get(format!(
            "{}/memory?session_token=never-used",
            server.base_url
        ))
        .send()
        .await
        .expect("memory request should succeed");
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let body: Value = response.json().await.expect("memory response should be JSON");
    assert_eq!(body["session_token"], "never-used");
    assert_eq!(body["memory"], json!([]));
}

#[tokio::test]
async fn chat_mints_a_token_and_persists_the_turn() {
    let server = TestServer::start(app_state(
        ScriptedGenerator::replies(&["Hello! Where would you like to travel?"]),
        FlightScript::Offers(Vec::new()),
    ))
    .await;
    let client = reqwest::Client::new();

    let body: Value = client
        .post(format!("{}/chat", server.base_url))
        .json(&json!({ "message": "hi" }))
        .send()
        .await
        .expect("chat request should succeed")
        .json()
        .await
        .expect("chat response should be JSON");

    assert_eq!(body["response"], "Hello! Where would you like to travel?");
    assert_eq!(body["route_decision"], "general");
    let token = body["session_token"].as_str().expect("token minted");
    assert!(!token.is_empty());

    let memory: Value = client
        .get(format!(
            "{}/memory?session_token={token}",
            server.base_url
        ))
        .send()
        .await
        .expect("memory request should succeed")
        .json()
        .await
        .expect("memory response should be JSON");
    let entries = memory["memory"].as_array().expect("memory array");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["role"], "user");
    assert_eq!(entries[1]["role"], "assistant");
}

#[tokio::test]
async fn chat_failure_yields_generic_apology_envelope() {
    let server = TestServer::start(app_state(
        ScriptedGenerator::new(vec![Err(TextGenerationError::ProviderFailure(
            "unreachable".to_string(),
        ))]),
        FlightScript::Offers(Vec::new()),
    ))
    .await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/chat", server.base_url))
        .json(&json!({ "message": "hi", "session_token": "s1" }))
        .send()
        .await
        .expect("chat request should succeed");
    assert_eq!(response.status(), reqwest::StatusCode::BAD_GATEWAY);

    let body: Value = response.json().await.expect("error body should be JSON");
    assert_eq!(body["code"], "turn_failed");
    assert!(body["message"].as_str().expect("message present").contains("Sorry"));

    // A fatal turn never reaches the memory state.
    let memory: Value = client
        .get(format!("{}/memory?session_token=s1", server.base_url))
        .send()
        .await
        .expect("memory request should succeed")
        .json()
        .await
        .expect("memory response should be JSON");
    assert_eq!(memory["memory"], json!([]));
}

#[tokio::test]
async fn stream_emits_word_chunks_then_done_sentinel() {
    let server = TestServer::start(app_state(
        ScriptedGenerator::replies(&["Hello there friend"]),
        FlightScript::Offers(Vec::new()),
    ))
    .await;

    let body = reqwest::Client::new()
        .get(format!(
            "{}/stream?message=hi&session_token=s1",
            server.base_url
        ))
        .send()
        .await
        .expect("stream request should succeed")
        .text()
        .await
        .expect("stream should terminate");

    let data_lines: Vec<&str> = body
        .lines()
        .filter_map(|line| line.strip_prefix("data: "))
        .collect();
    assert_eq!(data_lines.last(), Some(&"[DONE]"));

    let reply: String = data_lines[..data_lines.len() - 1].concat();
    assert_eq!(reply, "Hello there friend");
}

#[tokio::test]
async fn booking_lifecycle_over_http() {
    let server = TestServer::start(app_state(
        ScriptedGenerator::replies(&[]),
        FlightScript::Offers(Vec::new()),
    ))
    .await;
    let client = reqwest::Client::new();

    let create_response = client
        .post(format!("{}/bookings", server.base_url))
        .json(&json!({
            "passenger": { "name": "Asha Rao", "email": "asha@example.com" },
            "flight": {
                "number": "AI123",
                "airline": "Air India",
                "departure_city": "DEL",
                "arrival_city": "BOM",
                "departure_date": "2026-03-10",
                "departure_time": "09:15",
                "arrival_time": "11:25"
            },
            "passengers": { "adults": 1 },
            "pricing": { "total_price": "5430.00", "currency": "INR" }
        }))
        .send()
        .await
        .expect("create request should succeed");
    assert_eq!(create_response.status(), reqwest::StatusCode::CREATED);
    let created: Value = create_response.json().await.expect("created booking JSON");
    let booking_id = created["booking_id"].as_str().expect("booking id");
    assert!(booking_id.starts_with("BK"));
    assert_eq!(created["status"], "CONFIRMED");

    let fetched: Value = client
        .get(format!("{}/bookings/{booking_id}", server.base_url))
        .send()
        .await
        .expect("get request should succeed")
        .json()
        .await
        .expect("fetched booking JSON");
    assert_eq!(fetched["booking_id"], booking_id);

    let listed: Value = client
        .get(format!(
            "{}/bookings?email=asha@example.com",
            server.base_url
        ))
        .send()
        .await
        .expect("list request should succeed")
        .json()
        .await
        .expect("list response JSON");
    assert_eq!(listed["count"], 1);

    let cancelled: Value = client
        .post(format!(
            "{}/bookings/{booking_id}/cancel",
            server.base_url
        ))
        .json(&json!({ "reason": "plans changed" }))
        .send()
        .await
        .expect("cancel request should succeed")
        .json()
        .await
        .expect("cancelled booking JSON");
    assert_eq!(cancelled["status"], "CANCELLED");
    assert_eq!(cancelled["cancellation_reason"], "plans changed");

    let missing = client
        .get(format!("{}/bookings/BKDOESNOTEXIST", server.base_url))
        .send()
        .await
        .expect("get request should succeed");
    assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);
}
