use shared::llm::{TextGenerationError, TextGenerator};
use shared::models::{RouteDecision, Turn};
use shared::prompts;
use tracing::info;

use super::state::{NodeUpdate, TurnState};

/// Route node: one generation call that classifies the query and, for
/// general turns, doubles as the user-facing reply. A generator failure
/// here is fatal for the whole turn.
pub(super) async fn run_route(
    generator: &dyn TextGenerator,
    state: &TurnState,
) -> Result<NodeUpdate, TextGenerationError> {
    let transcript = render_transcript(&state.memory);
    let prompt = prompts::route_prompt(&state.query, &transcript);

    let raw = generator.generate(&prompt).await?;
    let reply = raw.trim().to_string();
    let decision = RouteDecision::classify(&reply);
    info!(
        decision = decision.as_str(),
        memory_len = state.memory.len(),
        "route node classified query"
    );

    Ok(NodeUpdate {
        response: Some(reply),
        route_decision: Some(decision),
        ..NodeUpdate::default()
    })
}

/// Renders memory for prompt embedding. An empty history is surfaced to
/// the model as an explicit marker, never as an empty string.
pub(super) fn render_transcript(memory: &[Turn]) -> String {
    if memory.is_empty() {
        return "No previous conversation.".to_string();
    }

    memory
        .iter()
        .map(|turn| format!("{}: {}", turn.role.as_str(), turn.content))
        .collect::<Vec<_>>()
        .join("\n")
}
