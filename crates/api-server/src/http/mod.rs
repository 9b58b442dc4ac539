use std::convert::Infallible;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, Sse};
use axum::routing::{get, post};
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use shared::bookings::BookingStore;
use shared::models::{SearchParameters, Turn};
use tracing::error;
use uuid::Uuid;

use crate::agent::{Agent, TURN_FAILURE_RESPONSE};

mod bookings;

#[cfg(test)]
mod tests;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) agent: Arc<Agent>,
    pub(crate) bookings: Arc<dyn BookingStore>,
}

pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/chat", post(chat))
        .route("/stream", get(stream))
        .route("/memory", get(memory))
        .route("/new-session", get(new_session))
        .route("/bookings", post(bookings::create).get(bookings::list))
        .route("/bookings/{booking_id}", get(bookings::get))
        .route("/bookings/{booking_id}/cancel", post(bookings::cancel))
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub(crate) struct HealthResponse<'a> {
    status: &'a str,
}

async fn healthz() -> Json<HealthResponse<'static>> {
    Json(HealthResponse { status: "ok" })
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatRequest {
    message: String,
    session_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatResponse {
    response: String,
    session_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    route_decision: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    search_params: Option<SearchParameters>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ranked_offers: Option<Vec<Value>>,
}

async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, Json<Value>)> {
    let session_token = resolve_session_token(request.session_token);

    match state.agent.run_turn(&session_token, &request.message).await {
        Ok(turn) => Ok(Json(ChatResponse {
            response: turn.response,
            session_token,
            route_decision: turn
                .route_decision
                .map(|decision| decision.as_str().to_string()),
            search_params: turn.search_params,
            ranked_offers: turn.ranked_offers,
        })),
        Err(err) => {
            error!(session_token = session_token.as_str(), "chat turn failed: {err}");
            Err((
                StatusCode::BAD_GATEWAY,
                Json(json!({
                    "code": "turn_failed",
                    "message": TURN_FAILURE_RESPONSE,
                })),
            ))
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct StreamParams {
    message: String,
    session_token: Option<String>,
}

/// Server-sent-event stream of the turn's final response in word-sized
/// chunks, terminated by a literal `[DONE]` event.
async fn stream(
    State(state): State<AppState>,
    Query(params): Query<StreamParams>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let session_token = resolve_session_token(params.session_token);
    let chunks = Arc::clone(&state.agent).stream_response(session_token, params.message);

    let stream = futures::stream::unfold(Some(chunks), |receiver| async move {
        let mut receiver = receiver?;
        match receiver.recv().await {
            Some(chunk) => Some((Ok(Event::default().data(chunk)), Some(receiver))),
            None => Some((Ok(Event::default().data("[DONE]")), None)),
        }
    });

    Sse::new(stream)
}

#[derive(Debug, Deserialize)]
pub(crate) struct MemoryParams {
    session_token: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct MemoryResponse {
    session_token: String,
    memory: Vec<Turn>,
}

async fn memory(
    State(state): State<AppState>,
    Query(params): Query<MemoryParams>,
) -> Json<MemoryResponse> {
    let memory = state.agent.memory(&params.session_token).await;
    Json(MemoryResponse {
        session_token: params.session_token,
        memory,
    })
}

#[derive(Debug, Serialize)]
pub(crate) struct NewSessionResponse {
    session_token: String,
}

async fn new_session() -> Json<NewSessionResponse> {
    Json(NewSessionResponse {
        session_token: mint_session_token(),
    })
}

fn mint_session_token() -> String {
    Uuid::new_v4().to_string()
}

fn resolve_session_token(provided: Option<String>) -> String {
    provided
        .and_then(|token| {
            let trimmed = token.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
        .unwrap_or_else(mint_session_token)
}
