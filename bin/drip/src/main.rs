mod cli;
mod config_loader;

use anyhow::Context;
use clap::Parser;
use drip_common::utils::logging::init_logging;
use drip_faucet::{FaucetRequest, FaucetService};
use serde_json::json;
use std::path::Path;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Parse CLI
    let args = cli::Cli::parse();

    // 2. Load Config
    let config = config_loader::load_drip_config(args.config.as_deref(), &args)?;

    // 3. Setup Logging
    init_logging(&config.logging).map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    match args.command {
        cli::Commands::ShowConfig => {
            println!("{}", serde_json::to_string_pretty(&config.faucet)?);
        }
        cli::Commands::Run { requests, metrics } => {
            let service = FaucetService::from_settings(&config.faucet)?;
            run_requests(&service, &requests).await?;

            if metrics {
                print!("{}", service.metrics().gather()?);
            }
        }
    }

    Ok(())
}

fn load_requests(path: &Path) -> anyhow::Result<Vec<FaucetRequest>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read requests from {:?}", path))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid request list in {:?}", path))
}

async fn run_requests<A, C>(service: &FaucetService<A, C>, path: &Path) -> anyhow::Result<()>
where
    A: drip_faucet::AssetLedger,
    C: drip_faucet::AccessControl,
{
    let requests = load_requests(path)?;
    info!("Replaying {} requests from {:?}", requests.len(), path);

    let mut rejected = 0usize;
    for (index, request) in requests.into_iter().enumerate() {
        let op = request.operation();
        let line = match service.execute(request).await {
            Ok(executed) => json!({
                "index": index,
                "op": op,
                "ok": true,
                "response": executed.response,
                "events": executed.events,
            }),
            Err(err) => {
                rejected += 1;
                json!({
                    "index": index,
                    "op": op,
                    "ok": false,
                    "error": { "code": err.code(), "category": err.category(), "message": err.to_string() },
                })
            }
        };
        println!("{}", line);
    }

    let status = service.status().await;
    info!(
        rejected,
        balance = %status.balance,
        known_addresses = status.known_addresses,
        "Replay finished"
    );
    Ok(())
}
