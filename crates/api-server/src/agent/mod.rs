use std::collections::HashMap;
use std::sync::Arc;

use shared::flights::FlightSearch;
use shared::llm::{TextGenerationError, TextGenerator};
use shared::models::{RouteDecision, Turn};
use thiserror::Error;
use tokio::sync::{Mutex, mpsc};
use tracing::{error, info};

mod respond;
mod research;
mod route;
pub mod session;
pub mod state;


use self::session::{SessionStore, TurnArtifacts};
pub use self::state::{GraphNode, NodeUpdate, TurnState};

pub const TURN_FAILURE_RESPONSE: &str =
    "Sorry, something went wrong while handling your message. Please try again.";

/// Fatal-to-turn failures. These propagate out of the turn before the
/// memory state runs, so no memory entries are recorded for the exchange.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error("routing failed: {0}")]
    Routing(#[from] TextGenerationError),
}

/// One observable state transition of the session graph, emitted in
/// execution order when a turn runs in streaming mode.
#[derive(Debug, Clone)]
pub enum GraphEvent {
    Node { node: GraphNode, update: NodeUpdate },
    Failed { message: String },
}

#[derive(Debug, Clone)]
pub struct CurrencySettings {
    pub rate: f64,
    pub tag: String,
}

/// The session graph: route -> (research -> respond)? -> memory. States
/// execute strictly sequentially within a turn; concurrency exists only
/// across sessions, and turns against the same token serialize on a
/// per-token lock.
pub struct Agent {
    generator: Arc<dyn TextGenerator>,
    flights: Arc<dyn FlightSearch>,
    sessions: Arc<dyn SessionStore>,
    currency: CurrencySettings,
    turn_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Agent {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        flights: Arc<dyn FlightSearch>,
        sessions: Arc<dyn SessionStore>,
        currency: CurrencySettings,
    ) -> Self {
        Self {
            generator,
            flights,
            sessions,
            currency,
            turn_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Runs one turn to completion and returns the fully assembled state.
    pub async fn run_turn(&self, token: &str, query: &str) -> Result<TurnState, TurnError> {
        self.execute_turn(token, query, None).await
    }

    /// Runs one turn as a background task, emitting one event per
    /// completed state transition in execution order.
    pub fn stream_turn(self: Arc<Self>, token: String, query: String) -> mpsc::Receiver<GraphEvent> {
        let (events_tx, events_rx) = mpsc::channel(16);
        let agent = self;
        tokio::spawn(async move {
            if let Err(err) = agent.execute_turn(&token, &query, Some(&events_tx)).await {
                error!(session_token = token.as_str(), "turn failed: {err}");
                let _ = events_tx
                    .send(GraphEvent::Failed {
                        message: TURN_FAILURE_RESPONSE.to_string(),
                    })
                    .await;
            }
        });
        events_rx
    }

    /// Runs one turn and streams the final response text in word-sized
    /// chunks. The terminal text comes from the respond state, or from
    /// the route state when a general turn short-circuits the graph.
    pub fn stream_response(self: Arc<Self>, token: String, query: String) -> mpsc::Receiver<String> {
        let (chunks_tx, chunks_rx) = mpsc::channel(32);
        let mut events = self.stream_turn(token, query);
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                let text = match event {
                    GraphEvent::Node {
                        node: GraphNode::Respond,
                        update,
                    } => update.response,
                    GraphEvent::Node {
                        node: GraphNode::Route,
                        update,
                    } => match update.route_decision {
                        Some(RouteDecision::Research) | Some(RouteDecision::Booking) => None,
                        _ => update.response,
                    },
                    GraphEvent::Node { .. } => None,
                    GraphEvent::Failed { message } => Some(message),
                };

                if let Some(text) = text {
                    for chunk in word_chunks(&text) {
                        if chunks_tx.send(chunk).await.is_err() {
                            return;
                        }
                    }
                }
            }
        });
        chunks_rx
    }

    pub async fn memory(&self, token: &str) -> Vec<Turn> {
        self.sessions.get(token).await.memory
    }

    async fn execute_turn(
        &self,
        token: &str,
        query: &str,
        events: Option<&mpsc::Sender<GraphEvent>>,
    ) -> Result<TurnState, TurnError> {
        let lock = self.turn_lock(token).await;
        let _guard = lock.lock().await;

        info!(session_token = token, "turn started");
        let snapshot = self.sessions.get(token).await;
        let mut state = TurnState::new(query, snapshot.memory);

        let update = route::run_route(self.generator.as_ref(), &state).await?;
        self.advance(&mut state, GraphNode::Route, update, events).await;

        if state.route_decision == Some(RouteDecision::Research) {
            let update = research::run_research(
                self.generator.as_ref(),
                self.flights.as_ref(),
                self.currency.rate,
                &self.currency.tag,
                &state,
            )
            .await;
            self.advance(&mut state, GraphNode::Research, update, events).await;

            let update = respond::run_respond(self.generator.as_ref(), &state).await;
            self.advance(&mut state, GraphNode::Respond, update, events).await;
        }

        let user_turn = Turn::user(query);
        let assistant_turn = Turn::assistant(state.response.clone());
        self.sessions
            .append_turn(
                token,
                user_turn.clone(),
                assistant_turn.clone(),
                TurnArtifacts {
                    route_decision: state.route_decision,
                    search_params: state.search_params.clone(),
                    ranked_offers: state.ranked_offers.clone(),
                    response: state.response.clone(),
                },
            )
            .await;
        let update = NodeUpdate {
            memory: vec![user_turn, assistant_turn],
            ..NodeUpdate::default()
        };
        self.advance(&mut state, GraphNode::Memory, update, events).await;

        info!(
            session_token = token,
            decision = state
                .route_decision
                .map(|decision| decision.as_str())
                .unwrap_or("none"),
            "turn completed"
        );
        Ok(state)
    }

    async fn advance(
        &self,
        state: &mut TurnState,
        node: GraphNode,
        update: NodeUpdate,
        events: Option<&mpsc::Sender<GraphEvent>>,
    ) {
        state.apply(&update);
        if let Some(sender) = events {
            let _ = sender.send(GraphEvent::Node { node, update }).await;
        }
    }

    async fn turn_lock(&self, token: &str) -> Arc<Mutex<()>> {
        let mut locks = self.turn_locks.lock().await;
        locks
            .entry(token.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

/// Splits text into word chunks, each carrying a single trailing space
/// except the last, so concatenation reconstructs the text.
pub(crate) fn word_chunks(text: &str) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let last_index = words.len().saturating_sub(1);
    words
        .iter()
        .enumerate()
        .map(|(index, word)| {
            if index < last_index {
                format!("{word} ")
            } else {
                (*word).to_string()
            }
        })
        .collect()
}
