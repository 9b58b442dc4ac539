use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use shared::models::{RouteDecision, SearchParameters, Turn};
use tokio::sync::RwLock;
use tracing::info;

/// A session's accumulated memory plus the most recent computed fields.
/// A token that has never been used maps to the default snapshot rather
/// than an error.
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    pub memory: Vec<Turn>,
    pub last_route_decision: Option<RouteDecision>,
    pub last_search_params: Option<SearchParameters>,
    pub last_ranked_offers: Option<Vec<Value>>,
    pub last_response: Option<String>,
}

/// Computed fields committed alongside a turn's memory entries.
#[derive(Debug, Clone, Default)]
pub struct TurnArtifacts {
    pub route_decision: Option<RouteDecision>,
    pub search_params: Option<SearchParameters>,
    pub ranked_offers: Option<Vec<Value>>,
    pub response: String,
}

/// Session store keyed by opaque session token. The in-memory map is the
/// default backend with process-lifetime retention and no eviction; a
/// bounded or persistent backend slots in behind the same trait.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, token: &str) -> SessionSnapshot;

    /// Appends one completed turn: the user entry, then the assistant
    /// entry, together with the turn's computed fields, in one atomic
    /// update.
    async fn append_turn(&self, token: &str, user: Turn, assistant: Turn, last: TurnArtifacts);
}

#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, SessionSnapshot>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, token: &str) -> SessionSnapshot {
        let sessions = self.sessions.read().await;
        sessions.get(token).cloned().unwrap_or_default()
    }

    async fn append_turn(&self, token: &str, user: Turn, assistant: Turn, last: TurnArtifacts) {
        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(token.to_string()).or_default();
        session.memory.push(user);
        session.memory.push(assistant);
        session.last_route_decision = last.route_decision;
        session.last_search_params = last.search_params;
        session.last_ranked_offers = last.ranked_offers;
        session.last_response = Some(last.response);
        info!(
            session_token = token,
            memory_len = session.memory.len(),
            "session turn committed"
        );
    }
}
