pub mod amadeus;
pub mod currency;

pub use amadeus::{AmadeusClient, AmadeusClientConfig};
pub use currency::convert_offer_prices;

use std::future::Future;
use std::pin::Pin;

use serde_json::Value;
use thiserror::Error;

use crate::models::SearchParameters;

pub type FlightSearchFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<Value>, FlightSearchError>> + Send + 'a>>;

#[derive(Debug, Error)]
pub enum FlightSearchError {
    #[error("flight data source authentication failed: {0}")]
    Auth(String),
    #[error("flight data source request failed: {0}")]
    Transport(String),
    #[error("flight data source returned an invalid payload: {0}")]
    InvalidPayload(String),
}

/// The flight-data capability: given validated search parameters, return
/// raw flight offers. Offers are opaque records; downstream code only
/// touches their price fields.
pub trait FlightSearch: Send + Sync {
    fn search_offers<'a>(&'a self, params: &'a SearchParameters) -> FlightSearchFuture<'a>;
}
