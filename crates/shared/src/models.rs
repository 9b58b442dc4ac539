use serde::{Deserialize, Serialize};

/// One entry of a session's conversation memory. Entries are append-only;
/// a completed turn always contributes a user entry followed by an
/// assistant entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Assistant => "assistant",
        }
    }
}

/// Structured flight search parameters extracted from free text. The
/// string fields may come back empty from the extraction model; callers
/// validate them before searching.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParameters {
    #[serde(default)]
    pub origin: String,
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub departure_date: String,
    #[serde(default = "default_adults")]
    pub adults: u32,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

fn default_adults() -> u32 {
    1
}

fn default_max_results() -> u32 {
    5
}

/// Three-way classification of a user message that drives the session
/// graph's branch after the route state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteDecision {
    Research,
    Booking,
    General,
}

impl RouteDecision {
    /// Classifies raw model output by case-insensitive substring
    /// containment. "research" wins over "booking"; anything else is a
    /// general conversational turn whose text doubles as the reply.
    pub fn classify(model_output: &str) -> Self {
        let normalized = model_output.trim().to_ascii_lowercase();
        if normalized.contains("research") {
            RouteDecision::Research
        } else if normalized.contains("booking") {
            RouteDecision::Booking
        } else {
            RouteDecision::General
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RouteDecision::Research => "research",
            RouteDecision::Booking => "booking",
            RouteDecision::General => "general",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{RouteDecision, SearchParameters};

    #[test]
    fn classify_matches_research_case_insensitively() {
        assert_eq!(
            RouteDecision::classify("  Research\n"),
            RouteDecision::Research
        );
        assert_eq!(
            RouteDecision::classify("I will start RESEARCHING now"),
            RouteDecision::Research
        );
    }

    #[test]
    fn classify_prefers_research_over_booking() {
        assert_eq!(
            RouteDecision::classify("booking requires research first"),
            RouteDecision::Research
        );
    }

    #[test]
    fn classify_falls_through_to_general() {
        assert_eq!(
            RouteDecision::classify("Hello! Where would you like to travel?"),
            RouteDecision::General
        );
        assert_eq!(RouteDecision::classify("Booking"), RouteDecision::Booking);
    }

    #[test]
    fn search_parameters_default_passenger_counts() {
        let params: SearchParameters =
            serde_json::from_str(r#"{"origin":"DEL","destination":"BOM","departure_date":"2026-03-10"}"#)
                .expect("partial parameters should deserialize");
        assert_eq!(params.adults, 1);
        assert_eq!(params.max_results, 5);
    }

    #[test]
    fn search_parameters_tolerate_missing_fields() {
        let params: SearchParameters =
            serde_json::from_str(r#"{"origin":"CCU"}"#).expect("sparse parameters should deserialize");
        assert!(params.destination.is_empty());
        assert!(params.departure_date.is_empty());
    }
}
