use flightdesk::bot::FlightBot;
use flightdesk::config::Config;
use flightdesk::error::Result;
use flightdesk::flights::RemoteFlightClient;
use flightdesk::recognizer::CluRecognizer;
use flightdesk::server;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = run().await {
        error!(error = %err, "fatal");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let config = Config::from_env()?;
    let mut builder = FlightBot::builder();

    match config.clu.clone() {
        Some(clu) => {
            info!(project = %clu.project_name, "using CLU intent recognition");
            builder = builder.recognizer(CluRecognizer::new(clu));
        }
        None => info!("no CLU configuration, running without intent recognition"),
    }

    match &config.flight_api {
        Some(api) => {
            info!(endpoint = %api.endpoint, "using remote flight-offers API");
            builder = builder.flights(RemoteFlightClient::new(
                api.endpoint.clone(),
                api.api_key.clone(),
            ));
        }
        None => info!("no flight API configuration, serving fixture offers"),
    }

    server::serve(&config, Arc::new(builder.build())).await
}
