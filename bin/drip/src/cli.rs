use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "drip")]
#[command(author, version, about = "Token faucet ledger", long_about = None)]
pub struct Cli {
    /// Path to the configuration file (TOML, YAML or JSON)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Claim amount, overrides the config file
    #[arg(long)]
    pub claim_amount: Option<String>,

    /// Claim frequency in seconds, overrides the config file
    #[arg(long)]
    pub claim_frequency: Option<u64>,

    /// Referral bonus percent, overrides the config file
    #[arg(long)]
    pub referral_bonus_percent: Option<u64>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a JSON array of requests and print one JSON line per outcome
    Run {
        /// File holding the requests
        #[arg(short, long, value_name = "FILE")]
        requests: PathBuf,

        /// Print Prometheus metrics after the last request
        #[arg(long)]
        metrics: bool,
    },
    /// Print the effective faucet settings
    ShowConfig,
}
