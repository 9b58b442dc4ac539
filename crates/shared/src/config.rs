use std::env;

use thiserror::Error;

use crate::config_env::{optional_trimmed_env, parse_f64_env};

pub const DEFAULT_CURRENCY_CONVERSION_RATE: f64 = 107.37;
pub const DEFAULT_CURRENCY_TAG: &str = "INR";

/// Process-level settings for the api-server binary. The capability
/// clients (Mistral, Amadeus) load their own configuration from their
/// own modules.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub currency_conversion_rate: f64,
    pub currency_tag: String,
    pub observability: Option<ObservabilityKeys>,
}

/// Optional tracing-export credentials. Absence is not an error; the
/// server runs without the integration.
#[derive(Debug, Clone)]
pub struct ObservabilityKeys {
    pub public_key: String,
    pub secret_key: String,
    pub base_url: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var {0}")]
    MissingVar(String),
    #[error("invalid integer in env var {0}")]
    ParseInt(String),
    #[error("invalid number in env var {0}")]
    ParseFloat(String),
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("failed to build http client: {0}")]
    HttpClient(String),
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let currency_conversion_rate =
            parse_f64_env("CURRENCY_CONVERSION_RATE", DEFAULT_CURRENCY_CONVERSION_RATE)?;
        if currency_conversion_rate <= 0.0 {
            return Err(ConfigError::InvalidConfiguration(
                "CURRENCY_CONVERSION_RATE must be positive".to_string(),
            ));
        }

        Ok(Self {
            bind_addr: env::var("API_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8000".to_string()),
            currency_conversion_rate,
            currency_tag: optional_trimmed_env("CURRENCY_TAG")
                .unwrap_or_else(|| DEFAULT_CURRENCY_TAG.to_string()),
            observability: observability_from_env(),
        })
    }
}

fn observability_from_env() -> Option<ObservabilityKeys> {
    let public_key = optional_trimmed_env("OBSERVABILITY_PUBLIC_KEY")?;
    let secret_key = optional_trimmed_env("OBSERVABILITY_SECRET_KEY")?;
    Some(ObservabilityKeys {
        public_key,
        secret_key,
        base_url: optional_trimmed_env("OBSERVABILITY_BASE_URL"),
    })
}

pub fn load_dotenv() -> Result<(), String> {
    match dotenvy::dotenv() {
        Ok(_) => Ok(()),
        Err(err) if err.not_found() => Ok(()),
        Err(err) => Err(format!("failed to load .env: {err}")),
    }
}
