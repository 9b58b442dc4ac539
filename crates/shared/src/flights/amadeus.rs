use std::time::{Duration, Instant};

use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::info;

use super::{FlightSearch, FlightSearchError, FlightSearchFuture};
use crate::config::ConfigError;
use crate::config_env::{optional_trimmed_env, parse_u64_env, require_env};
use crate::models::SearchParameters;

const DEFAULT_BASE_URL: &str = "https://test.api.amadeus.com";
const DEFAULT_TIMEOUT_MS: u64 = 15_000;

// Refresh slightly before the provider-reported expiry to avoid racing it.
const TOKEN_EXPIRY_MARGIN_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct AmadeusClientConfig {
    pub base_url: String,
    pub api_key: String,
    pub api_secret: String,
    pub timeout_ms: u64,
}

impl AmadeusClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = optional_trimmed_env("AMADEUS_BASE_URL")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::InvalidConfiguration(
                "AMADEUS_BASE_URL must start with http:// or https://".to_string(),
            ));
        }

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: require_env("AMADEUS_API_KEY")?,
            api_secret: require_env("AMADEUS_API_SECRET")?,
            timeout_ms: parse_u64_env("AMADEUS_TIMEOUT_MS", DEFAULT_TIMEOUT_MS)?,
        })
    }
}

/// Flight data source backed by the Amadeus flight-offers API. Holds an
/// OAuth2 client-credentials token and refreshes it on expiry.
pub struct AmadeusClient {
    client: reqwest::Client,
    config: AmadeusClientConfig,
    token: Mutex<Option<CachedToken>>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl AmadeusClient {
    pub fn new(config: AmadeusClientConfig) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|err| ConfigError::HttpClient(err.to_string()))?;

        Ok(Self {
            client,
            config,
            token: Mutex::new(None),
        })
    }

    async fn bearer_token(&self) -> Result<String, FlightSearchError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.expires_at {
                return Ok(token.access_token.clone());
            }
        }

        let refreshed = self.fetch_token().await?;
        let access_token = refreshed.access_token.clone();
        *cached = Some(refreshed);
        Ok(access_token)
    }

    async fn fetch_token(&self) -> Result<CachedToken, FlightSearchError> {
        let url = format!("{}/v1/security/oauth2/token", self.config.base_url);
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.config.api_key.as_str()),
            ("client_secret", self.config.api_secret.as_str()),
        ];

        let response = self
            .client
            .post(&url)
            .form(&form)
            .send()
            .await
            .map_err(|err| FlightSearchError::Auth(format!("token request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FlightSearchError::Auth(format!(
                "token request rejected with status {}",
                status.as_u16()
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|_| FlightSearchError::Auth("token response was not valid JSON".to_string()))?;

        info!("flight data source access token refreshed");

        let lifetime = token
            .expires_in
            .saturating_sub(TOKEN_EXPIRY_MARGIN_SECS)
            .max(1);
        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(lifetime),
        })
    }

    async fn search(&self, params: &SearchParameters) -> Result<Vec<Value>, FlightSearchError> {
        let token = self.bearer_token().await?;
        let url = format!("{}/v2/shopping/flight-offers", self.config.base_url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .query(&[
                ("originLocationCode", params.origin.as_str()),
                ("destinationLocationCode", params.destination.as_str()),
                ("departureDate", params.departure_date.as_str()),
            ])
            .query(&[("adults", params.adults), ("max", params.max_results)])
            .send()
            .await
            .map_err(|err| FlightSearchError::Transport(format!("offer search failed: {err}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(FlightSearchError::Auth(format!(
                "offer search rejected with status {}",
                status.as_u16()
            )));
        }
        if !status.is_success() {
            return Err(FlightSearchError::Transport(format!(
                "offer search returned status {}",
                status.as_u16()
            )));
        }

        let body: OffersResponse = response.json().await.map_err(|_| {
            FlightSearchError::InvalidPayload("offer response was not valid JSON".to_string())
        })?;

        info!(offer_count = body.data.len(), "flight offers fetched");
        Ok(body.data)
    }
}

impl FlightSearch for AmadeusClient {
    fn search_offers<'a>(&'a self, params: &'a SearchParameters) -> FlightSearchFuture<'a> {
        Box::pin(self.search(params))
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct OffersResponse {
    #[serde(default)]
    data: Vec<Value>,
}
