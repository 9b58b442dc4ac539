use std::net::SocketAddr;
use std::sync::Arc;

use shared::bookings::InMemoryBookingStore;
use shared::config::{AppConfig, load_dotenv};
use shared::flights::{AmadeusClient, AmadeusClientConfig};
use shared::llm::{MistralGateway, MistralGatewayConfig};
use tracing::{error, info, warn};

mod agent;
mod http;
#[cfg(test)]
mod test_support;

use agent::session::InMemorySessionStore;
use agent::{Agent, CurrencySettings};

#[tokio::main]
async fn main() {
    if let Err(err) = load_dotenv() {
        eprintln!("{err}");
        std::process::exit(1);
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "api_server=info,axum=info".to_string()),
        )
        .json()
        .flatten_event(true)
        .with_current_span(true)
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "failed to load app config");
            std::process::exit(1);
        }
    };

    match &config.observability {
        Some(keys) => info!(
            public_key = keys.public_key.as_str(),
            "observability export configured"
        ),
        None => warn!("observability keys absent; running without tracing export"),
    }

    let generator = match MistralGatewayConfig::from_env().and_then(MistralGateway::new) {
        Ok(gateway) => gateway,
        Err(err) => {
            error!(error = %err, "failed to initialize text generation gateway");
            std::process::exit(1);
        }
    };

    let flights = match AmadeusClientConfig::from_env().and_then(AmadeusClient::new) {
        Ok(client) => client,
        Err(err) => {
            error!(error = %err, "failed to initialize flight data client");
            std::process::exit(1);
        }
    };

    let agent = Arc::new(Agent::new(
        Arc::new(generator),
        Arc::new(flights),
        Arc::new(InMemorySessionStore::new()),
        CurrencySettings {
            rate: config.currency_conversion_rate,
            tag: config.currency_tag.clone(),
        },
    ));

    let app = http::router(http::AppState {
        agent,
        bookings: Arc::new(InMemoryBookingStore::new()),
    });

    let addr: SocketAddr = match config.bind_addr.parse() {
        Ok(addr) => addr,
        Err(err) => {
            error!(error = %err, bind_addr = %config.bind_addr, "invalid bind addr");
            std::process::exit(1);
        }
    };

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(error = %err, bind_addr = %addr, "failed to bind api listener");
            std::process::exit(1);
        }
    };

    info!(
        bind_addr = %listener.local_addr().unwrap_or(addr),
        "flight assistant api listening"
    );

    if let Err(err) = axum::serve(listener, app.into_make_service()).await {
        error!(error = %err, "api server failed");
        std::process::exit(1);
    }
}
