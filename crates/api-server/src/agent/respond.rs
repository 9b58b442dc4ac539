use shared::llm::TextGenerator;
use shared::prompts;
use tracing::{info, warn};

use super::state::{NodeUpdate, TurnState};

const NO_MATCH_RESPONSE: &str = "Sorry, I couldn't find any flights matching your criteria. \
    Please try different dates or destinations.";

/// Respond node: turns ranked offers into prose. A fallback response set
/// upstream passes through unchanged; a formatting-model failure is
/// recovered locally with a deterministic listing instead of losing the
/// result.
pub(super) async fn run_respond(generator: &dyn TextGenerator, state: &TurnState) -> NodeUpdate {
    let ranked = state.ranked_offers.as_deref().unwrap_or(&[]);

    if ranked.is_empty() {
        let response = if state.response.is_empty() {
            NO_MATCH_RESPONSE.to_string()
        } else {
            info!("respond node passing through upstream response");
            state.response.clone()
        };
        return NodeUpdate {
            response: Some(response),
            ..NodeUpdate::default()
        };
    }

    let params_json = state
        .search_params
        .as_ref()
        .and_then(|params| serde_json::to_string_pretty(params).ok())
        .unwrap_or_else(|| "{}".to_string());
    let offers_json = serde_json::to_string_pretty(ranked).unwrap_or_else(|_| "[]".to_string());
    let prompt = prompts::format_response_prompt(&params_json, &offers_json);

    match generator.generate(&prompt).await {
        Ok(text) => NodeUpdate {
            response: Some(text.trim().to_string()),
            ..NodeUpdate::default()
        },
        Err(err) => {
            warn!("response formatting failed, using machine-formatted listing: {err}");
            NodeUpdate {
                response: Some(format!("Found {} flights: {offers_json}", ranked.len())),
                ..NodeUpdate::default()
            }
        }
    }
}
