//! Backend entry-point: wires the REST API, in-memory store, counter
//! bootstrap, and OpenAPI docs.

use std::net::SocketAddr;
use std::sync::Arc;

use actix_web::web;
use clap::Parser;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};
use url::Url;

use backend::domain::ports::{DocumentStore, FixtureIdentityVerifier, IdentityVerifier};
use backend::domain::{CarrierService, CounterLedger, EntityLifecycle, OwnerId};
use backend::inbound::http::health::HealthState;
use backend::inbound::http::state::HttpState;
use backend::outbound::MemoryDocumentStore;
use backend::server::{ServerConfig, create_server};

/// Command-line options.
#[derive(Debug, Parser)]
#[command(name = "backend", about = "Multi-tenant boat and load REST API")]
struct Cli {
    /// Socket address to bind.
    #[arg(long, default_value = "0.0.0.0:8080")]
    bind: SocketAddr,

    /// Public base URL for pagination links, including the API prefix.
    #[arg(long, default_value = "http://localhost:8080/api/v1/")]
    public_base: Url,

    /// Development bearer tokens as TOKEN=SUBJECT pairs; each token
    /// verifies to the given subject id.
    #[arg(long = "dev-token", value_name = "TOKEN=SUBJECT", value_parser = parse_dev_token)]
    dev_tokens: Vec<(String, OwnerId)>,
}

fn parse_dev_token(raw: &str) -> Result<(String, OwnerId), String> {
    let (token, subject) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected TOKEN=SUBJECT, got `{raw}`"))?;
    let subject = OwnerId::new(subject).map_err(|err| err.to_string())?;
    Ok((token.to_owned(), subject))
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let cli = Cli::parse();
    let config = ServerConfig::new(cli.bind, cli.public_base);

    let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
    let counters = Arc::new(CounterLedger::new(Arc::clone(&store)));
    counters
        .initialize()
        .await
        .map_err(|err| std::io::Error::other(format!("counter bootstrap failed: {err}")))?;

    let mut verifier = FixtureIdentityVerifier::new();
    for (token, subject) in cli.dev_tokens {
        verifier = verifier.with_token(token, subject);
    }
    let identity: Arc<dyn IdentityVerifier> = Arc::new(verifier);

    let http_state = HttpState {
        lifecycle: Arc::new(EntityLifecycle::new(
            Arc::clone(&store),
            Arc::clone(&counters),
        )),
        carriers: Arc::new(CarrierService::new(store)),
        identity,
        public_base: config.public_base().clone(),
    };

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, http_state, &config)?;
    server.await
}
