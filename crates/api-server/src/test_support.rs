use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use shared::flights::{FlightSearch, FlightSearchError, FlightSearchFuture};
use shared::llm::{GenerateFuture, TextGenerationError, TextGenerator};
use shared::models::SearchParameters;

use crate::agent::session::InMemorySessionStore;
use crate::agent::{Agent, CurrencySettings};

/// Text generator that replays a scripted sequence of results and keeps
/// every prompt it was asked to complete.
pub(crate) struct ScriptedGenerator {
    responses: Mutex<VecDeque<Result<String, TextGenerationError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub(crate) fn new(responses: Vec<Result<String, TextGenerationError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn replies(responses: &[&str]) -> Self {
        Self::new(responses.iter().map(|text| Ok((*text).to_string())).collect())
    }

    pub(crate) fn seen_prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompt log lock").clone()
    }

    pub(crate) fn remaining(&self) -> usize {
        self.responses.lock().expect("scripted responses lock").len()
    }
}

impl TextGenerator for ScriptedGenerator {
    fn generate<'a>(&'a self, prompt: &'a str) -> GenerateFuture<'a> {
        self.prompts
            .lock()
            .expect("prompt log lock")
            .push(prompt.to_string());
        let next = self
            .responses
            .lock()
            .expect("scripted responses lock")
            .pop_front();
        Box::pin(async move {
            next.unwrap_or_else(|| {
                Err(TextGenerationError::ProviderFailure(
                    "script exhausted".to_string(),
                ))
            })
        })
    }
}

pub(crate) enum FlightScript {
    Offers(Vec<Value>),
    TransportError,
}

pub(crate) struct ScriptedFlightSearch {
    script: FlightScript,
}

impl ScriptedFlightSearch {
    pub(crate) fn new(script: FlightScript) -> Self {
        Self { script }
    }
}

impl FlightSearch for ScriptedFlightSearch {
    fn search_offers<'a>(&'a self, _params: &'a SearchParameters) -> FlightSearchFuture<'a> {
        Box::pin(async move {
            match &self.script {
                FlightScript::Offers(offers) => Ok(offers.clone()),
                FlightScript::TransportError => Err(FlightSearchError::Transport(
                    "scripted transport failure".to_string(),
                )),
            }
        })
    }
}

pub(crate) fn test_agent(
    generator: Arc<ScriptedGenerator>,
    flights: FlightScript,
) -> Arc<Agent> {
    Arc::new(Agent::new(
        generator,
        Arc::new(ScriptedFlightSearch::new(flights)),
        Arc::new(InMemorySessionStore::new()),
        CurrencySettings {
            rate: 107.37,
            tag: "INR".to_string(),
        },
    ))
}
