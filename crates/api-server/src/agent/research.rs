use chrono::Utc;
use serde_json::Value;
use shared::flights::{FlightSearch, FlightSearchError, convert_offer_prices};
use shared::llm::{TextGenerationError, TextGenerator, extract_json_payload};
use shared::models::SearchParameters;
use shared::prompts;
use thiserror::Error;
use tracing::{error, info, warn};

use super::route::render_transcript;
use super::state::{NodeUpdate, TurnState};

const RESEARCH_FAILURE_RESPONSE: &str = "Sorry, I encountered an error while searching for \
    flights. Please try again with your travel details.";

#[derive(Debug, Error)]
enum ResearchError {
    #[error("parameter extraction failed: {0}")]
    Extraction(#[from] TextGenerationError),
    #[error("parameter extraction returned unparseable output: {0}")]
    ExtractionParse(#[from] serde_json::Error),
    #[error(transparent)]
    FlightLookup(#[from] FlightSearchError),
}

/// Research node: extract parameters, search flights, normalize currency,
/// rank. Internal failures never escape; they collapse into an apology
/// update so the turn still completes.
pub(super) async fn run_research(
    generator: &dyn TextGenerator,
    flights: &dyn FlightSearch,
    currency_rate: f64,
    currency_tag: &str,
    state: &TurnState,
) -> NodeUpdate {
    match research_pipeline(generator, flights, currency_rate, currency_tag, state).await {
        Ok(update) => update,
        Err(err) => {
            error!("research node failed: {err}");
            NodeUpdate {
                search_params: Some(SearchParameters::default()),
                ranked_offers: Some(Vec::new()),
                response: Some(RESEARCH_FAILURE_RESPONSE.to_string()),
                ..NodeUpdate::default()
            }
        }
    }
}

async fn research_pipeline(
    generator: &dyn TextGenerator,
    flights: &dyn FlightSearch,
    currency_rate: f64,
    currency_tag: &str,
    state: &TurnState,
) -> Result<NodeUpdate, ResearchError> {
    let params = extract_search_parameters(generator, state).await?;
    info!(
        origin = params.origin.as_str(),
        destination = params.destination.as_str(),
        departure_date = params.departure_date.as_str(),
        "search parameters extracted"
    );

    let missing = missing_required_fields(&params);
    if !missing.is_empty() {
        warn!(missing = %missing.join(", "), "search parameters incomplete");
        return Ok(NodeUpdate {
            search_params: Some(params),
            ranked_offers: Some(Vec::new()),
            response: Some(format!(
                "I need a few more details to search flights. Please provide: {}.",
                missing.join(", ")
            )),
            ..NodeUpdate::default()
        });
    }

    let mut offers = flights.search_offers(&params).await?;
    info!(offer_count = offers.len(), "flight offers retrieved");

    convert_offer_prices(&mut offers, currency_rate, currency_tag);

    let ranked = rank_offers(generator, state, &offers).await;

    Ok(NodeUpdate {
        search_params: Some(params),
        ranked_offers: Some(ranked),
        ..NodeUpdate::default()
    })
}

async fn extract_search_parameters(
    generator: &dyn TextGenerator,
    state: &TurnState,
) -> Result<SearchParameters, ResearchError> {
    let transcript = render_transcript(&state.memory);
    let today = Utc::now().date_naive().to_string();
    let prompt = prompts::search_parameters_prompt(&state.query, &transcript, &today);

    let raw = generator.generate(&prompt).await?;
    let payload = extract_json_payload(&raw);
    Ok(serde_json::from_str::<SearchParameters>(payload)?)
}

fn missing_required_fields(params: &SearchParameters) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if params.origin.trim().is_empty() {
        missing.push("departure city");
    }
    if params.destination.trim().is_empty() {
        missing.push("destination city");
    }
    if params.departure_date.trim().is_empty() {
        missing.push("travel date");
    }
    missing
}

/// Ranking is an enhancement, not a correctness requirement: when the
/// model's output cannot be parsed as a sequence, the currency-converted
/// input list is returned unchanged.
async fn rank_offers(
    generator: &dyn TextGenerator,
    state: &TurnState,
    offers: &[Value],
) -> Vec<Value> {
    if offers.is_empty() {
        return Vec::new();
    }

    let transcript = render_transcript(&state.memory);
    let offers_json =
        serde_json::to_string_pretty(offers).unwrap_or_else(|_| "[]".to_string());
    let prompt = prompts::rank_offers_prompt(&state.query, &transcript, &offers_json);

    let raw = match generator.generate(&prompt).await {
        Ok(raw) => raw,
        Err(err) => {
            warn!("offer ranking request failed, keeping original order: {err}");
            return offers.to_vec();
        }
    };

    match serde_json::from_str::<Value>(extract_json_payload(&raw)) {
        Ok(Value::Array(ranked)) => ranked,
        Ok(_) => {
            warn!("offer ranking output was not a sequence, keeping original order");
            offers.to_vec()
        }
        Err(err) => {
            warn!("offer ranking output was unparseable, keeping original order: {err}");
            offers.to_vec()
        }
    }
}
