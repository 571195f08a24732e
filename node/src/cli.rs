//! # CLI Interface
//!
//! Defines the command-line argument structure for `dr-node` using `clap`
//! derive. Three subcommands: `run`, `simulate` and `version`. Every
//! reserve and server setting can also come from a `DR_*` environment
//! variable.

use alloy_primitives::Address;
use clap::{Args, Parser, Subcommand};
use dr_protocol::config::{
    DEFAULT_API_PORT, DEFAULT_METRICS_PORT, DEFAULT_WITHDRAWAL_FEE_BASE,
    DEFAULT_WITHDRAWAL_FEE_FRACTION,
};

/// Digital Reserve devnet node.
///
/// Hosts one reserve vault over a simulated AMM and lending market and
/// serves it over HTTP, with Prometheus metrics on a separate port.
#[derive(Parser, Debug)]
#[command(
    name = "dr-node",
    about = "Digital Reserve devnet node",
    version,
    propagate_version = true
)]
pub struct DrNodeCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the reserve over HTTP.
    Run(RunArgs),
    /// Run a deposit / withdraw lifecycle against a fresh reserve and print
    /// every record as JSON.
    Simulate(SimulateArgs),
    /// Print version information and exit.
    Version,
}

/// Reserve deployment parameters shared by `run` and `simulate`.
#[derive(Args, Debug, Clone)]
pub struct ReserveArgs {
    /// Owner of the reserve. Defaults to the devnet deployer.
    #[arg(long, env = "DR_OWNER")]
    pub owner: Option<Address>,

    /// Withdrawal fee numerator.
    #[arg(long, env = "DR_FEE_FRACTION", default_value_t = DEFAULT_WITHDRAWAL_FEE_FRACTION)]
    pub fee_fraction: u64,

    /// Withdrawal fee denominator.
    #[arg(long, env = "DR_FEE_BASE", default_value_t = DEFAULT_WITHDRAWAL_FEE_BASE)]
    pub fee_base: u64,

    /// Initial strategy asset, by devnet symbol (USDC, DAI) or address.
    #[arg(long, env = "DR_STRATEGY", default_value = "USDC")]
    pub strategy: String,

    /// Start with deposits switched off.
    #[arg(long, env = "DR_DEPOSITS_DISABLED")]
    pub deposits_disabled: bool,
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub reserve: ReserveArgs,

    /// Port for the REST API.
    #[arg(long, env = "DR_API_PORT", default_value_t = DEFAULT_API_PORT)]
    pub api_port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "DR_METRICS_PORT", default_value_t = DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,

    /// Log output format: `pretty` or `json`.
    #[arg(long, env = "DR_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,
}

/// Arguments for the `simulate` subcommand.
#[derive(Args, Debug)]
pub struct SimulateArgs {
    #[command(flatten)]
    pub reserve: ReserveArgs,

    /// Whole DRC for the bootstrap deposit.
    #[arg(long, default_value_t = 1_000)]
    pub first_deposit: u64,

    /// Whole DRC for the follow-up deposit.
    #[arg(long, default_value_t = 90_000)]
    pub second_deposit: u64,

    /// Whole DRC for the partial withdrawal.
    #[arg(long, default_value_t = 10_000)]
    pub partial_withdrawal: u64,

    /// Log output format: `pretty` or `json`.
    #[arg(long, env = "DR_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,
}
