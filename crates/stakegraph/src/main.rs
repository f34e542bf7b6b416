mod ingest;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use stakegraph_lib::config::{Config, StoreConfig};
use stakegraph_lib::network::initialize_network;
use stakegraph_lib::{metrics, CliOptions, EventProcessor, PrometheusExporter, STAKEGRAPH_VERSION};
use stakegraph_staking_client::RpcStakingContract;
use stakegraph_store::{EntityStore, InMemoryStore, PgStore};
use tokio::io::{AsyncBufRead, BufReader};
use tracing::*;
use tracing_subscriber::EnvFilter;

use crate::ingest::apply_event_lines;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    info!(version = STAKEGRAPH_VERSION, "Starting stakegraph");

    info!("Parse options");
    let cli_options = CliOptions::parse();

    info!("Loading configuration file");
    let config = Config::read(&cli_options.config)?;

    let _exporter = if config.prometheus_port != 0 {
        Some(PrometheusExporter::start_default(config.prometheus_port)?)
    } else {
        None
    };

    let store: Arc<dyn EntityStore> = match &config.store {
        StoreConfig::Postgres { url } => {
            info!("Initialize store and running migrations");
            Arc::new(PgStore::new(url).await?)
        }
        StoreConfig::InMemory => {
            warn!("Using an in-memory store; nothing will be persisted");
            Arc::new(InMemoryStore::new())
        }
    };
    info!("Store initialization successful");

    let contract = RpcStakingContract::new(
        config.staking.rpc_url.clone(),
        config.staking.request_timeout(),
        metrics().staking_contract_calls.clone(),
    )?;

    initialize_network(store.as_ref(), config.staking.contract, &config.epochs).await?;
    let mut processor = EventProcessor::new(store, Arc::new(contract), metrics()).await?;

    let input: Box<dyn AsyncBufRead + Unpin> = if cli_options.events_from_stdin() {
        info!("Reading events from stdin");
        Box::new(BufReader::new(tokio::io::stdin()))
    } else {
        info!(path = %cli_options.events, "Reading events from file");
        let file = tokio::fs::File::open(&cli_options.events)
            .await
            .with_context(|| format!("failed to open {}", cli_options.events))?;
        Box::new(BufReader::new(file))
    };

    match apply_event_lines(input, &mut processor).await {
        Ok(stats) => {
            info!(
                applied = stats.applied,
                skipped = stats.skipped,
                cursor = ?processor.cursor(),
                "Finished applying events"
            );
            Ok(())
        }
        Err(err) => {
            error!(err = %format!("{:#}", err), "Stopping");
            Err(err)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
