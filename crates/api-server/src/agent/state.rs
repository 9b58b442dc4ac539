use serde::Serialize;
use serde_json::Value;
use shared::models::{RouteDecision, SearchParameters, Turn};

/// States of the session graph, in execution order. `Route` always runs
/// first and `Memory` always runs last; `Research` and `Respond` only run
/// when the route decision asks for a flight search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphNode {
    Route,
    Research,
    Respond,
    Memory,
}

impl GraphNode {
    pub fn label(&self) -> &'static str {
        match self {
            GraphNode::Route => "route",
            GraphNode::Research => "research",
            GraphNode::Respond => "respond",
            GraphNode::Memory => "memory",
        }
    }
}

/// Accumulated per-turn state. Starts from the session's memory snapshot
/// and absorbs one `NodeUpdate` per executed node.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TurnState {
    pub query: String,
    pub memory: Vec<Turn>,
    pub response: String,
    pub route_decision: Option<RouteDecision>,
    pub search_params: Option<SearchParameters>,
    pub ranked_offers: Option<Vec<Value>>,
}

/// Partial state update returned by a node. Scalar fields overwrite the
/// accumulated state when present; `memory` entries are appended.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NodeUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_decision: Option<RouteDecision>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_params: Option<SearchParameters>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ranked_offers: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub memory: Vec<Turn>,
}

impl TurnState {
    pub fn new(query: impl Into<String>, memory: Vec<Turn>) -> Self {
        Self {
            query: query.into(),
            memory,
            ..Self::default()
        }
    }

    pub fn apply(&mut self, update: &NodeUpdate) {
        if let Some(response) = &update.response {
            self.response = response.clone();
        }
        if let Some(decision) = update.route_decision {
            self.route_decision = Some(decision);
        }
        if let Some(params) = &update.search_params {
            self.search_params = Some(params.clone());
        }
        if let Some(offers) = &update.ranked_offers {
            self.ranked_offers = Some(offers.clone());
        }
        self.memory.extend(update.memory.iter().cloned());
    }
}
